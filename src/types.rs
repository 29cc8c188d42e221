//! The enum registry: header bitfields and the `DNSType`/`DNSClass`/
//! `DNSSection` vocabulary shared by the codec, zone tree, server and
//! resolver, plus the top-level `Message`/`Question`/`Record`/`Extension`
//! wire structs.
//!
//! Every enum derives `num_derive::{FromPrimitive, ToPrimitive}` for
//! wire-value conversion and `strum_macros::{Display, EnumString}` for
//! presentation-form conversion, exactly as the teacher's own registry does.

use crate::name::Name;
use crate::rr::RRGen;
use num_derive::{FromPrimitive, ToPrimitive};
use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime};
use strum_macros::{Display, EnumString};

/// Query or Response bit.
#[derive(Copy, Clone, Debug, EnumString, PartialEq, Eq)]
pub enum QR {
    Query = 0,
    Response = 1,
}

impl Default for QR {
    fn default() -> Self {
        QR::Query
    }
}

impl QR {
    pub fn from_bool(b: bool) -> QR {
        if b {
            QR::Response
        } else {
            QR::Query
        }
    }

    pub fn to_bool(self) -> bool {
        matches!(self, QR::Response)
    }
}

/// Specifies the kind of query in a message. See RFC 1035 §4.1.1.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u8)]
pub enum OpCode {
    Query = 0,
    IQuery = 1,
    Status = 2,
    Notify = 4,
    Update = 5,
}

impl Default for OpCode {
    fn default() -> Self {
        OpCode::Query
    }
}

/// Response codes. See RFC 1035 §4.1.1 and RFC 6895.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum RCode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NXDomain = 3,
    NotImp = 4,
    Refused = 5,
    YXDomain = 6,
    YXRRSet = 7,
    NXRRSet = 8,
    NotAuth = 9,
    NotZone = 10,

    /// EDNS version of the request not implemented. See RFC 6891 §9.
    BadVers = 16,
}

impl Default for RCode {
    fn default() -> Self {
        RCode::NoError
    }
}

/// Resource record type, e.g. A, CNAME, SOA.
///
/// Every IANA-assigned code the registry is aware of gets a named variant
/// with a working [`RRGen`] implementation except where noted; a handful of
/// codes are recognized (parse to a name, not an error) but never get an
/// `RRGen` synthesized by the server, matching DNSSEC's non-goal status:
/// `NSEC`, `DNSKEY`, `NSEC3`, `CAA` round-trip as `Unknown` regardless of
/// their named variant here.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, ToPrimitive, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum DNSType {
    A = 1,
    NS = 2,
    CNAME = 5,
    SOA = 6,
    PTR = 12,
    MX = 15,
    TXT = 16,
    AAAA = 28,
    SRV = 33,
    NAPTR = 35,
    DS = 43,
    RRSIG = 46,
    NSEC = 47,
    DNSKEY = 48,
    NSEC3 = 50,
    OPT = 41,
    IXFR = 251,
    AXFR = 252,
    ANY = 255,
    CAA = 257,
}

impl Default for DNSType {
    fn default() -> Self {
        DNSType::ANY
    }
}

/// Resource record class, e.g. Internet, Chaos.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, ToPrimitive, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DNSClass {
    #[strum(serialize = "IN")]
    Internet = 1,

    #[strum(serialize = "CH")]
    Chaos = 3,

    None = 254,

    #[strum(serialize = "*")]
    Any = 255,
}

impl Default for DNSClass {
    fn default() -> Self {
        DNSClass::Internet
    }
}

/// Which section of a message a record belongs to, used by
/// `MessageReader::get_rr`/`MessageWriter` to iterate/emit generically
/// rather than through three separately-typed `Vec`s.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum DNSSection {
    Answer,
    Authority,
    Additional,
}

/// A DNS message: the root of every query and response.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: u16,
    pub rd: bool,
    pub tc: bool,
    pub aa: bool,
    pub opcode: OpCode,
    pub qr: QR,
    pub rcode: RCode,
    pub cd: bool,
    pub ad: bool,
    pub z: bool,
    pub ra: bool,

    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authoritys: Vec<Record>,
    pub additionals: Vec<Record>,

    pub extension: Option<Extension>,
    pub stats: Option<Stats>,
}

impl Default for Message {
    fn default() -> Self {
        Message {
            id: 0,
            rd: false,
            tc: false,
            aa: false,
            opcode: OpCode::default(),
            qr: QR::default(),
            rcode: RCode::default(),
            cd: false,
            ad: false,
            z: false,
            ra: false,
            questions: Vec::new(),
            answers: Vec::new(),
            authoritys: Vec::new(),
            additionals: Vec::new(),
            extension: None,
            stats: None,
        }
    }
}

impl Message {
    pub fn add_question(&mut self, name: Name, r#type: DNSType, class: DNSClass) {
        self.questions.push(Question { name, r#type, class });
    }

    /// Iterates every record across answer/authority/additional, tagged by
    /// the section it was found in. Mirrors `DNSMessageReader::getRR`'s
    /// generic section walk so server/resolver code doesn't special-case
    /// three separate `Vec`s.
    pub fn records(&self) -> impl Iterator<Item = (DNSSection, &Record)> {
        self.answers
            .iter()
            .map(|r| (DNSSection::Answer, r))
            .chain(self.authoritys.iter().map(|r| (DNSSection::Authority, r)))
            .chain(
                self.additionals
                    .iter()
                    .map(|r| (DNSSection::Additional, r)),
            )
    }
}

/// A question: the name, type and class being asked about.
#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    pub name: Name,
    pub r#type: DNSType,
    pub class: DNSClass,
}

/// A resource record: name, class, ttl and an opaque rdata generator.
#[derive(Clone, Debug)]
pub struct Record {
    pub name: Name,
    pub class: DNSClass,
    pub ttl: Duration,
    pub rdata: RRGen,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.class == other.class
            && self.ttl == other.ttl
            && self.rdata == other.rdata
    }
}

impl Record {
    pub fn r#type(&self) -> DNSType {
        self.rdata.r#type()
    }
}

/// EDNS(0) pseudo-record. See RFC 6891.
#[derive(Clone, Debug, PartialEq)]
pub struct Extension {
    pub payload_size: u16,
    pub extend_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
}

impl Default for Extension {
    fn default() -> Self {
        Extension {
            payload_size: 4096,
            extend_rcode: 0,
            version: 0,
            dnssec_ok: false,
        }
    }
}

/// Stats about a single request/response exchange, populated by a client
/// (the `dig`-style CLI or the stub resolver facade); never touched by the
/// server or by message parsing itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub start: SystemTime,
    pub duration: Duration,
    pub server: SocketAddr,
    pub request_size: usize,
    pub response_size: usize,
}

pub(crate) struct StatsBuilder {
    start: SystemTime,
    timer: Instant,
    request_size: usize,
}

impl StatsBuilder {
    pub fn start(request_size: usize) -> StatsBuilder {
        StatsBuilder {
            start: SystemTime::now(),
            timer: Instant::now(),
            request_size,
        }
    }

    pub fn end(self, server: SocketAddr, response_size: usize) -> Stats {
        Stats {
            start: self.start,
            duration: self.timer.elapsed(),
            request_size: self.request_size,
            server,
            response_size,
        }
    }
}
