//! The record-type registry: one tagged variant per resource record type,
//! each driven through a common four-way "xfr" visitor (wire-read,
//! wire-write, text-read, text-write) instead of four separate per-type
//! routines. See `reader.rs`/`writer.rs` for the wire-side visitors and
//! `from_str.rs`/`display.rs` for the text-side ones.

use crate::name::Name;
use crate::types::DNSType;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A polymorphic codec visited by every record variant's `encode` routine.
/// The same field sequence is walked whether decoding from wire bytes,
/// encoding to wire bytes, parsing presentation text, or printing it —
/// each `Xfr` implementation decides what "transfer" means for its
/// direction, so adding a record type costs one `encode` method instead of
/// four.
pub trait Xfr {
    fn xfr_u8(&mut self, v: &mut u8) -> io::Result<()>;
    fn xfr_u16(&mut self, v: &mut u16) -> io::Result<()>;
    fn xfr_u32(&mut self, v: &mut u32) -> io::Result<()>;
    fn xfr_name(&mut self, v: &mut Name) -> io::Result<()>;
    fn xfr_type(&mut self, v: &mut DNSType) -> io::Result<()>;
    /// One length-prefixed character-string (max 255 bytes).
    fn xfr_txt(&mut self, v: &mut Vec<u8>) -> io::Result<()>;
    /// Raw bytes running to the end of the record's rdata.
    fn xfr_blob(&mut self, v: &mut Vec<u8>) -> io::Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct A {
    pub addr: u32,
}

impl A {
    pub fn ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.addr)
    }

    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_u32(&mut self.addr)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Aaaa {
    pub addr: [u8; 16],
}

impl Aaaa {
    pub fn ip(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.addr)
    }

    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        let mut v = self.addr.to_vec();
        x.xfr_blob(&mut v)?;
        if v.len() != 16 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "AAAA record must be exactly 16 bytes",
            ));
        }
        self.addr.copy_from_slice(&v);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Ns {
    pub name: Name,
}

impl Ns {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_name(&mut self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Cname {
    pub name: Name,
}

impl Cname {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_name(&mut self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Ptr {
    pub name: Name,
}

impl Ptr {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_name(&mut self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl Soa {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_name(&mut self.mname)?;
        x.xfr_name(&mut self.rname)?;
        x.xfr_u32(&mut self.serial)?;
        x.xfr_u32(&mut self.refresh)?;
        x.xfr_u32(&mut self.retry)?;
        x.xfr_u32(&mut self.expire)?;
        x.xfr_u32(&mut self.minimum)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Mx {
    pub preference: u16,
    pub exchange: Name,
}

impl Mx {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_u16(&mut self.preference)?;
        x.xfr_name(&mut self.exchange)
    }
}

/// Non-empty ordered list of character-strings; the wire form concatenates
/// length-prefixed segments, one per element.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Txt {
    pub strings: Vec<Vec<u8>>,
}

impl Txt {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        if self.strings.is_empty() {
            self.strings.push(Vec::new());
        }
        for s in &mut self.strings {
            x.xfr_txt(s)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Srv {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: Name,
}

impl Srv {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_u16(&mut self.priority)?;
        x.xfr_u16(&mut self.weight)?;
        x.xfr_u16(&mut self.port)?;
        x.xfr_name(&mut self.target)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Naptr {
    pub order: u16,
    pub preference: u16,
    pub flags: Vec<u8>,
    pub services: Vec<u8>,
    pub regexp: Vec<u8>,
    pub replacement: Name,
}

impl Naptr {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_u16(&mut self.order)?;
        x.xfr_u16(&mut self.preference)?;
        x.xfr_txt(&mut self.flags)?;
        x.xfr_txt(&mut self.services)?;
        x.xfr_txt(&mut self.regexp)?;
        x.xfr_name(&mut self.replacement)
    }
}

/// DNSSEC signature record. Round-tripped faithfully but never synthesized
/// by the authoritative server (signing stays a non-goal); only ingested
/// from a zone file or AXFR stream.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Rrsig {
    pub covered_type: DNSType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer: Name,
    pub signature: Vec<u8>,
}

impl Rrsig {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_type(&mut self.covered_type)?;
        x.xfr_u8(&mut self.algorithm)?;
        x.xfr_u8(&mut self.labels)?;
        x.xfr_u32(&mut self.original_ttl)?;
        x.xfr_u32(&mut self.expiration)?;
        x.xfr_u32(&mut self.inception)?;
        x.xfr_u16(&mut self.key_tag)?;
        x.xfr_name(&mut self.signer)?;
        // The signature runs to the end of the record; its length is never
        // itself encoded, only inferred from RDLENGTH.
        x.xfr_blob(&mut self.signature)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Unknown {
    pub rtype: u16,
    pub data: Vec<u8>,
}

impl Unknown {
    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        x.xfr_blob(&mut self.data)
    }
}

/// The RR registry: one variant per supported type, plus `Unknown` for any
/// type code the registry doesn't special-case.
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub enum RRGen {
    A(A),
    AAAA(Aaaa),
    NS(Ns),
    CNAME(Cname),
    PTR(Ptr),
    SOA(Soa),
    MX(Mx),
    TXT(Txt),
    SRV(Srv),
    NAPTR(Naptr),
    RRSIG(Rrsig),
    Unknown(Unknown),
}

impl RRGen {
    /// The wire type code to emit for this record. Unlike [`RRGen::type`],
    /// this never round-trips an `Unknown` variant's code through the
    /// `DNSType` enum (which would lose any code the registry doesn't name),
    /// so a record read as `Unknown{type, bytes}` writes back out under its
    /// original type code.
    pub fn wire_type_code(&self) -> u16 {
        match self {
            RRGen::Unknown(u) => u.rtype,
            other => num_traits::ToPrimitive::to_u16(&other.r#type()).unwrap_or(0),
        }
    }

    pub fn r#type(&self) -> DNSType {
        match self {
            RRGen::A(_) => DNSType::A,
            RRGen::AAAA(_) => DNSType::AAAA,
            RRGen::NS(_) => DNSType::NS,
            RRGen::CNAME(_) => DNSType::CNAME,
            RRGen::PTR(_) => DNSType::PTR,
            RRGen::SOA(_) => DNSType::SOA,
            RRGen::MX(_) => DNSType::MX,
            RRGen::TXT(_) => DNSType::TXT,
            RRGen::SRV(_) => DNSType::SRV,
            RRGen::NAPTR(_) => DNSType::NAPTR,
            RRGen::RRSIG(_) => DNSType::RRSIG,
            RRGen::Unknown(u) => {
                num_traits::FromPrimitive::from_u16(u.rtype).unwrap_or(DNSType::ANY)
            }
        }
    }

    /// Constructs a blank value of the given type, ready to be filled in by
    /// `encode` from any visitor direction.
    pub fn blank(t: DNSType) -> RRGen {
        match t {
            DNSType::A => RRGen::A(A::default()),
            DNSType::AAAA => RRGen::AAAA(Aaaa::default()),
            DNSType::NS => RRGen::NS(Ns::default()),
            DNSType::CNAME => RRGen::CNAME(Cname::default()),
            DNSType::PTR => RRGen::PTR(Ptr::default()),
            DNSType::SOA => RRGen::SOA(Soa::default()),
            DNSType::MX => RRGen::MX(Mx::default()),
            DNSType::TXT => RRGen::TXT(Txt::default()),
            DNSType::SRV => RRGen::SRV(Srv::default()),
            DNSType::NAPTR => RRGen::NAPTR(Naptr::default()),
            DNSType::RRSIG => RRGen::RRSIG(Rrsig::default()),
            other => RRGen::Unknown(Unknown {
                rtype: num_traits::ToPrimitive::to_u16(&other).unwrap_or(0),
                data: Vec::new(),
            }),
        }
    }

    pub fn encode<X: Xfr>(&mut self, x: &mut X) -> io::Result<()> {
        match self {
            RRGen::A(v) => v.encode(x),
            RRGen::AAAA(v) => v.encode(x),
            RRGen::NS(v) => v.encode(x),
            RRGen::CNAME(v) => v.encode(x),
            RRGen::PTR(v) => v.encode(x),
            RRGen::SOA(v) => v.encode(x),
            RRGen::MX(v) => v.encode(x),
            RRGen::TXT(v) => v.encode(x),
            RRGen::SRV(v) => v.encode(x),
            RRGen::NAPTR(v) => v.encode(x),
            RRGen::RRSIG(v) => v.encode(x),
            RRGen::Unknown(v) => v.encode(x),
        }
    }
}
