//! The message codec: header parsing/writing, question handling, EDNS(0),
//! and the record sections. Parsing is driven by a private `MessageParser`
//! that reads into a `Message` value (the "MessageReader" of the design);
//! serialization is driven by a private `MessageWriter` that knows how to
//! compress names into a trie of previously-emitted label suffixes (the
//! "MessageWriter" of the design). Both are exposed to callers only through
//! `Message::from_slice`/`Message::to_vec`, mirroring the teacher's own
//! `MessageParser`-drives-`Message` split.

use crate::bail;
use crate::io::{DNSReadExt, SeekExt};
use crate::name::Name;
use crate::rr::{RRGen, Xfr};
use crate::types::*;
use byteorder::{ReadBytesExt, BE};
use num_traits::{FromPrimitive, ToPrimitive};
use std::collections::HashMap;
use std::io;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;

/// High bits of a length octet that mark "what follows is a 14-bit
/// compression offset" rather than a literal label length.
const POINTER_TAG: u16 = 0xC000;
const MAX_POINTER_OFFSET: u16 = 0x3FFF;

impl Message {
    /// Parses a complete DNS message (header + up to one question + the
    /// three RR sections) from wire bytes.
    pub fn from_slice(buf: &[u8]) -> io::Result<Message> {
        MessageParser::new(buf).parse()
    }

    /// Serializes this message, compressing names in a fresh trie and
    /// capping the result at 512 bytes (the un-negotiated default UDP
    /// payload size) unless an [`Extension`] on the message asked for more.
    pub fn to_vec(&self) -> io::Result<Vec<u8>> {
        let max_size = self
            .extension
            .as_ref()
            .map(|e| e.payload_size as usize)
            .unwrap_or(512)
            .max(512);
        self.to_vec_capped(max_size)
    }

    /// Like [`Message::to_vec`], but with an explicit size cap instead of
    /// one derived from this message's own EDNS extension — the authoritative
    /// server uses this to give TCP responses room beyond the UDP/EDNS limit
    /// a query's [`Extension`] would otherwise imply.
    ///
    /// If a record would push the message past `max_size`, writing stops
    /// there: every RR written so far is discarded, `TC` is set and `AA`
    /// cleared, and the client is left to retry over TCP. This never fails —
    /// a header-plus-question-only response always fits.
    pub fn to_vec_capped(&self, max_size: usize) -> io::Result<Vec<u8>> {
        let mut w = MessageWriter::new(self, max_size)?;
        for (section, r) in self.records() {
            if w
                .put_rr(section, &r.name, r.ttl.as_secs() as u32, &r.rdata, r.class)
                .is_err()
            {
                w.clear_rrs();
                w.tc = true;
                w.aa = false;
                break;
            }
        }
        w.serialize()
    }
}

/// A helper to hold state while parsing is happening.
struct MessageParser<'a> {
    cur: Cursor<&'a [u8]>,
    m: Message,
}

/// A record as read off the wire, tagged with which section it was found
/// in, before being sorted into `Message`'s three `Vec`s.
struct WireRecord {
    section: DNSSection,
    record: Record,
}

impl<'a> MessageParser<'a> {
    fn new(buf: &'a [u8]) -> MessageParser<'a> {
        MessageParser {
            cur: Cursor::new(buf),
            m: Message::default(),
        }
    }

    fn parse(mut self) -> io::Result<Message> {
        self.parse_header()?;

        let qdcount = self.cur.read_u16::<BE>()?;
        let ancount = self.cur.read_u16::<BE>()?;
        let nscount = self.cur.read_u16::<BE>()?;
        let arcount = self.cur.read_u16::<BE>()?;

        if qdcount > 1 {
            bail!(InvalidData, "only a single question is supported, got {}", qdcount);
        }

        if qdcount == 1 {
            let name = self.cur.read_qname()?;
            let r#type = self.cur.read_dns_type()?;
            let class = self.cur.read_dns_class()?;
            self.m.questions.push(Question { name, r#type, class });
        }

        for section in [DNSSection::Answer, DNSSection::Authority, DNSSection::Additional] {
            let count = match section {
                DNSSection::Answer => ancount,
                DNSSection::Authority => nscount,
                DNSSection::Additional => arcount,
            };
            for _ in 0..count {
                if let Some(wr) = self.read_rr(section)? {
                    match wr.section {
                        DNSSection::Answer => self.m.answers.push(wr.record),
                        DNSSection::Authority => self.m.authoritys.push(wr.record),
                        DNSSection::Additional => self.m.additionals.push(wr.record),
                    }
                }
            }
        }

        Ok(self.m)
    }

    fn parse_header(&mut self) -> io::Result<()> {
        self.m.id = self.cur.read_u16::<BE>()?;

        let b = self.cur.read_u8()?;
        self.m.qr = QR::from_bool(0b1000_0000 & b != 0);
        let opcode = (0b0111_1000 & b) >> 3;
        self.m.aa = (0b0000_0100 & b) != 0;
        self.m.tc = (0b0000_0010 & b) != 0;
        self.m.rd = (0b0000_0001 & b) != 0;

        self.m.opcode = match FromPrimitive::from_u8(opcode) {
            Some(t) => t,
            None => bail!(InvalidData, "invalid OpCode({})", opcode),
        };

        let b = self.cur.read_u8()?;
        self.m.ra = (0b1000_0000 & b) != 0;
        self.m.z = (0b0100_0000 & b) != 0;
        self.m.ad = (0b0010_0000 & b) != 0;
        self.m.cd = (0b0001_0000 & b) != 0;
        let rcode = 0b0000_1111 & b;

        self.m.rcode = match FromPrimitive::from_u8(rcode) {
            Some(t) => t,
            None => bail!(InvalidData, "invalid RCode({})", rcode),
        };

        Ok(())
    }

    /// Reads one resource record. Returns `Ok(None)` for an OPT
    /// pseudo-record, which is folded into `self.m.extension` rather than
    /// handed back as an ordinary record — its "class" and "ttl" fields
    /// don't mean class/ttl at all (RFC 6891 §6.1.2).
    fn read_rr(&mut self, section: DNSSection) -> io::Result<Option<WireRecord>> {
        let name = self.cur.read_qname()?;
        // A record's type code is not restricted to the registry's named
        // `DNSType` variants — any code the registry doesn't recognize must
        // still round-trip, as `RRGen::Unknown{type, bytes}`, per §3.
        let raw_type = self.cur.read_u16::<BE>()?;
        let r#type = FromPrimitive::from_u16(raw_type);
        let raw_class = self.cur.read_u16::<BE>()?;
        let raw_ttl = self.cur.read_u32::<BE>()?;
        let rdlength = self.cur.read_u16::<BE>()? as u64;
        let rdata_start = self.cur.stream_position()?;

        if r#type == Some(DNSType::OPT) {
            self.m.extension = Some(Extension {
                payload_size: raw_class,
                extend_rcode: ((raw_ttl >> 24) & 0xFF) as u8,
                version: ((raw_ttl >> 16) & 0xFF) as u8,
                dnssec_ok: (raw_ttl & 0x8000) != 0,
            });
            self.cur.seek(io::SeekFrom::Start(rdata_start + rdlength))?;
            return Ok(None);
        }

        let class = match FromPrimitive::from_u16(raw_class) {
            Some(c) => c,
            None => bail!(InvalidData, "invalid class({})", raw_class),
        };

        let rdata = match r#type {
            Some(t) => {
                let mut rdata = RRGen::blank(t);
                let mut xfr = WireReader {
                    cur: &mut self.cur,
                    rdata_start,
                    rdata_len: rdlength,
                };
                rdata.encode(&mut xfr)?;
                rdata
            }
            // Unrecognized type code: carry the raw rdata bytes through
            // unparsed rather than failing the whole message.
            None => {
                let mut data = vec![0; rdlength as usize];
                self.cur.read_exact(&mut data)?;
                RRGen::Unknown(crate::rr::Unknown { rtype: raw_type, data })
            }
        };

        // Seek precisely to the end of this record's rdata, regardless of
        // whether the variant consumed every byte itself (e.g. `Unknown`
        // always does, but a future short-reading variant should not throw
        // off the next record).
        self.cur.seek(io::SeekFrom::Start(rdata_start + rdlength))?;

        Ok(Some(WireRecord {
            section,
            record: Record {
                name,
                class,
                ttl: std::time::Duration::from_secs(raw_ttl as u64),
                rdata,
            },
        }))
    }
}

/// The wire-read [`Xfr`] visitor: decodes a record's rdata field by field
/// from a cursor bounded to that record's `RDLENGTH`.
struct WireReader<'a, 'c> {
    cur: &'c mut Cursor<&'a [u8]>,
    rdata_start: u64,
    rdata_len: u64,
}

impl<'a, 'c> Xfr for WireReader<'a, 'c> {
    fn xfr_u8(&mut self, v: &mut u8) -> io::Result<()> {
        *v = self.cur.read_u8()?;
        Ok(())
    }

    fn xfr_u16(&mut self, v: &mut u16) -> io::Result<()> {
        *v = self.cur.read_u16::<BE>()?;
        Ok(())
    }

    fn xfr_u32(&mut self, v: &mut u32) -> io::Result<()> {
        *v = self.cur.read_u32::<BE>()?;
        Ok(())
    }

    fn xfr_name(&mut self, v: &mut Name) -> io::Result<()> {
        *v = self.cur.read_qname()?;
        Ok(())
    }

    fn xfr_type(&mut self, v: &mut DNSType) -> io::Result<()> {
        *v = self.cur.read_dns_type()?;
        Ok(())
    }

    fn xfr_txt(&mut self, v: &mut Vec<u8>) -> io::Result<()> {
        let len = self.cur.read_u8()? as usize;
        let mut buf = vec![0; len];
        self.cur.read_exact(&mut buf)?;
        *v = buf;
        Ok(())
    }

    fn xfr_blob(&mut self, v: &mut Vec<u8>) -> io::Result<()> {
        let consumed = self.cur.stream_position()? - self.rdata_start;
        if consumed > self.rdata_len {
            bail!(InvalidData, "record rdata overran its RDLENGTH");
        }
        let remaining = (self.rdata_len - consumed) as usize;
        let mut buf = vec![0; remaining];
        self.cur.read_exact(&mut buf)?;
        *v = buf;
        Ok(())
    }
}

/// Composes a DNS response (or query), compressing names into a trie of
/// previously emitted label suffixes. `no_compress` is set for AXFR bodies,
/// per the design's writer flag that disables compression there.
pub(crate) struct MessageWriter {
    buf: Vec<u8>,
    max_size: usize,
    trie: HashMap<Name, u16>,
    no_compress: bool,

    /// Enforces Answer(0) <= Authority(1) <= Additional(2): a `put_rr`
    /// naming an earlier section than the last one written is rejected.
    section_level: u8,

    ancount: u16,
    nscount: u16,
    arcount: u16,

    /// Buffer length right after the header+question, i.e. the state a
    /// `clear_rrs` truncation restores.
    after_question: usize,
    trie_after_question: HashMap<Name, u16>,

    id: u16,
    rd: bool,
    opcode: OpCode,
    pub tc: bool,
    pub aa: bool,
    rcode: RCode,
    ad: bool,
    cd: bool,
    ra: bool,

    question: Option<Question>,
    extension: Option<Extension>,
    opt_written: bool,
}

fn section_level(s: DNSSection) -> u8 {
    match s {
        DNSSection::Answer => 0,
        DNSSection::Authority => 1,
        DNSSection::Additional => 2,
    }
}

impl MessageWriter {
    pub(crate) fn new(query: &Message, max_size: usize) -> io::Result<MessageWriter> {
        let mut w = MessageWriter {
            buf: vec![0; 12],
            max_size,
            trie: HashMap::new(),
            no_compress: false,
            section_level: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            after_question: 12,
            trie_after_question: HashMap::new(),
            id: query.id,
            rd: query.rd,
            opcode: query.opcode,
            tc: false,
            aa: query.aa,
            rcode: query.rcode,
            ad: query.ad,
            cd: query.cd,
            ra: query.ra,
            question: query.questions.first().cloned(),
            extension: query.extension.clone(),
            opt_written: false,
        };

        if let Some(q) = w.question.clone() {
            w.write_name(&q.name)?;
            w.push_u16(q.r#type.to_u16().unwrap_or(0));
            w.push_u16(q.class.to_u16().unwrap_or(0));
        }

        w.after_question = w.buf.len();
        w.trie_after_question = w.trie.clone();
        Ok(w)
    }

    /// A writer dedicated to AXFR bodies: no question section, no
    /// compression (the "no-compress" flag the design calls for).
    pub(crate) fn new_axfr(max_size: usize) -> MessageWriter {
        MessageWriter {
            buf: vec![0; 12],
            max_size,
            trie: HashMap::new(),
            no_compress: true,
            section_level: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            after_question: 12,
            trie_after_question: HashMap::new(),
            id: 0,
            rd: false,
            opcode: OpCode::Query,
            tc: false,
            aa: true,
            rcode: RCode::NoError,
            ad: false,
            cd: false,
            ra: false,
            question: None,
            extension: None,
            opt_written: true, // AXFR never carries EDNS.
        }
    }

    fn push_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn push_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn push_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Writes `name`, consulting (and updating) the compression trie unless
    /// `no_compress` is set. Only offsets `<= 0x3FFF` are ever recorded or
    /// referenced, since that's all a 14-bit pointer can address.
    fn write_name(&mut self, name: &Name) -> io::Result<()> {
        let labels = name.labels();

        if self.no_compress {
            for label in labels {
                self.push_u8(label.len() as u8);
                self.buf.extend_from_slice(label.as_bytes());
            }
            self.push_u8(0);
            return Ok(());
        }

        // Look for the longest suffix of `name` already in the trie.
        let mut split = labels.len();
        let mut pointer = None;
        while split > 0 {
            let suffix = Name::from(&labels[split - 1..]);
            if let Some(&offset) = self.trie.get(&suffix) {
                pointer = Some(offset);
                break;
            }
            split -= 1;
        }

        for i in 0..split {
            let offset = self.buf.len();
            if offset as u64 <= MAX_POINTER_OFFSET as u64 {
                let suffix = Name::from(&labels[i..]);
                self.trie.entry(suffix).or_insert(offset as u16);
            }
            self.push_u8(labels[i].len() as u8);
            self.buf.extend_from_slice(labels[i].as_bytes());
        }

        match pointer {
            Some(offset) => self.push_u16(POINTER_TAG | offset),
            None => self.push_u8(0),
        }

        Ok(())
    }

    /// Writes `rr` into `section`, rolling back all writer state (buffer
    /// position, compression trie, section counters) if it would overflow
    /// `max_size`.
    pub(crate) fn put_rr(
        &mut self,
        section: DNSSection,
        name: &Name,
        ttl: u32,
        rr: &RRGen,
        class: DNSClass,
    ) -> io::Result<()> {
        let level = section_level(section);
        if level < self.section_level {
            bail!(
                InvalidInput,
                "cannot write a {:?} record after a later section has started",
                section
            );
        }

        let snapshot_len = self.buf.len();
        let snapshot_trie = self.trie.clone();
        let snapshot_section_level = self.section_level;
        let snapshot_counts = (self.ancount, self.nscount, self.arcount);

        match self.try_put_rr(name, ttl, rr, class) {
            Ok(()) => {
                self.section_level = level;
                match section {
                    DNSSection::Answer => self.ancount += 1,
                    DNSSection::Authority => self.nscount += 1,
                    DNSSection::Additional => self.arcount += 1,
                }
                Ok(())
            }
            Err(e) => {
                self.buf.truncate(snapshot_len);
                self.trie = snapshot_trie;
                self.section_level = snapshot_section_level;
                (self.ancount, self.nscount, self.arcount) = snapshot_counts;
                Err(e)
            }
        }
    }

    fn try_put_rr(&mut self, name: &Name, ttl: u32, rr: &RRGen, class: DNSClass) -> io::Result<()> {
        self.write_name(name)?;
        self.push_u16(rr.wire_type_code());
        self.push_u16(class.to_u16().unwrap_or(0));
        self.push_u32(ttl);

        let rdlength_pos = self.buf.len();
        self.push_u16(0); // placeholder, patched below.

        let rdata_start = self.buf.len();
        {
            let mut xfr = WireWriter { w: self };
            let mut rr = rr.clone();
            rr.encode(&mut xfr)?;
        }
        let rdlength = self.buf.len() - rdata_start;

        if self.buf.len() > self.max_size {
            bail!(WriteZero, "message would overflow its {} byte limit", self.max_size);
        }

        let rdlength = u16::try_from(rdlength)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "rdata too large"))?;
        self.buf[rdlength_pos..rdlength_pos + 2].copy_from_slice(&rdlength.to_be_bytes());

        Ok(())
    }

    /// Clears every RR written so far, resetting to the state right after
    /// the header+question — used when a response must be truncated (TC=1)
    /// rather than grown further.
    pub(crate) fn clear_rrs(&mut self) {
        self.buf.truncate(self.after_question);
        self.trie = self.trie_after_question.clone();
        self.section_level = 0;
        self.ancount = 0;
        self.nscount = 0;
        self.arcount = 0;
    }

    /// Appends an OPT pseudo-record with the writer's EDNS state. Goes
    /// through the ordinary overflow path so a too-small response can
    /// still roll back cleanly.
    fn append_opt(&mut self, rcode_high: u8) -> io::Result<()> {
        let e = match &self.extension {
            Some(e) => e.clone(),
            None => return Ok(()),
        };

        let snapshot_len = self.buf.len();
        let snapshot_trie = self.trie.clone();

        self.push_u8(0); // root name
        self.push_u16(DNSType::OPT.to_u16().unwrap_or(41));
        self.push_u16(e.payload_size);

        let ttl = ((rcode_high as u32) << 24)
            | ((e.version as u32) << 16)
            | if e.dnssec_ok { 0x8000 } else { 0 };
        self.push_u32(ttl);
        self.push_u16(0); // rdlength: no options modeled.

        if self.buf.len() > self.max_size {
            self.buf.truncate(snapshot_len);
            self.trie = snapshot_trie;
            bail!(WriteZero, "OPT record would overflow the message");
        }

        self.arcount += 1;
        self.opt_written = true;
        Ok(())
    }

    pub(crate) fn set_rcode(&mut self, rcode: RCode) {
        self.rcode = rcode;
    }

    /// Finalizes the message: appends EDNS (falling back to a truncated
    /// header+question-only response if even the bare OPT doesn't fit),
    /// then writes the 12-byte header in front of everything.
    pub(crate) fn serialize(mut self) -> io::Result<Vec<u8>> {
        if self.extension.is_some() && !self.opt_written {
            let rcode = self.rcode.to_u16().unwrap_or(0);
            let rcode_high = (rcode >> 4) as u8;
            if self.append_opt(rcode_high).is_err() {
                self.clear_rrs();
                self.tc = true;
                self.aa = false;
                // This can't fail: buf is back to header+question only.
                self.append_opt(rcode_high)?;
            }
        }

        let qdcount: u16 = if self.question.is_some() { 1 } else { 0 };

        let mut header = Vec::with_capacity(12);
        header.write_all(&self.id.to_be_bytes())?;

        let rcode = self.rcode.to_u16().unwrap_or(0) as u8;
        let mut b = 0u8;
        b |= 1 << 7; // QR: always a response once serialized this way.
        b |= (self.opcode.to_u8().unwrap_or(0) & 0x0F) << 3;
        if self.aa {
            b |= 1 << 2;
        }
        if self.tc {
            b |= 1 << 1;
        }
        if self.rd {
            b |= 1;
        }
        header.push(b);

        let mut b = 0u8;
        if self.ra {
            b |= 1 << 7;
        }
        if self.ad {
            b |= 1 << 5;
        }
        if self.cd {
            b |= 1 << 4;
        }
        b |= rcode & 0x0F;
        header.push(b);

        header.write_all(&qdcount.to_be_bytes())?;
        header.write_all(&self.ancount.to_be_bytes())?;
        header.write_all(&self.nscount.to_be_bytes())?;
        header.write_all(&self.arcount.to_be_bytes())?;

        self.buf[0..12].copy_from_slice(&header);
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rr::A;
    use std::str::FromStr;

    fn q(name: &str, t: DNSType) -> Message {
        let mut m = Message::default();
        m.add_question(Name::from_str(name).unwrap(), t, DNSClass::Internet);
        m
    }

    #[test]
    fn question_round_trips() {
        let m = q("www.example.com", DNSType::A);
        let bytes = m.to_vec().unwrap();
        let back = Message::from_slice(&bytes).unwrap();
        assert_eq!(back.questions, m.questions);
    }

    #[test]
    fn answer_round_trips() {
        let mut m = q("www.example.com", DNSType::A);
        m.answers.push(Record {
            name: Name::from_str("www.example.com").unwrap(),
            class: DNSClass::Internet,
            ttl: std::time::Duration::from_secs(300),
            rdata: RRGen::A(A {
                addr: u32::from(std::net::Ipv4Addr::new(1, 2, 3, 4)),
            }),
        });

        let bytes = m.to_vec().unwrap();
        let back = Message::from_slice(&bytes).unwrap();
        assert_eq!(back.answers, m.answers);
    }

    #[test]
    fn compression_shrinks_repeated_names() {
        let mut m = q("example.com", DNSType::NS);
        for host in ["ns1", "ns2", "ns3"] {
            m.answers.push(Record {
                name: Name::from_str("example.com").unwrap(),
                class: DNSClass::Internet,
                ttl: std::time::Duration::from_secs(3600),
                rdata: RRGen::NS(crate::rr::Ns {
                    name: Name::from_str(&format!("{}.example.com", host)).unwrap(),
                }),
            });
        }
        let bytes = m.to_vec().unwrap();

        // Without compression this would be much larger: three owner names
        // plus three NS targets, each repeating "example.com".
        assert!(bytes.len() < 140);

        let back = Message::from_slice(&bytes).unwrap();
        assert_eq!(back.answers, m.answers);
    }

    #[test]
    fn truncates_when_oversized() {
        let mut m = q("example.com", DNSType::TXT);
        for _ in 0..400 {
            m.answers.push(Record {
                name: Name::from_str("example.com").unwrap(),
                class: DNSClass::Internet,
                ttl: std::time::Duration::from_secs(3600),
                rdata: RRGen::TXT(crate::rr::Txt {
                    strings: vec![vec![b'x'; 200]],
                }),
            });
        }

        let bytes = m.to_vec().unwrap();
        let back = Message::from_slice(&bytes).unwrap();
        assert!(back.tc);
        assert!(back.answers.is_empty());
    }

    #[test]
    fn edns_round_trips() {
        let mut m = q("example.com", DNSType::A);
        m.extension = Some(Extension {
            payload_size: 4096,
            extend_rcode: 0,
            version: 0,
            dnssec_ok: true,
        });
        let bytes = m.to_vec().unwrap();
        let back = Message::from_slice(&bytes).unwrap();
        let e = back.extension.unwrap();
        assert_eq!(e.payload_size, 4096);
        assert!(e.dnssec_ok);
    }
}
