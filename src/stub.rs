//! A stub-resolver facade over [`crate::resolver::Resolver`]: the kind of
//! small, synchronous, C-style API a local `getaddrinfo`-alike would wrap.
//! Error codes follow the original design rather than idiomatic `Result`
//! nesting, since callers across an FFI boundary need a flat integer.

use crate::errors::ResolveError;
use crate::name::Name;
use crate::resolver::Resolver;
use crate::rr::RRGen;
use crate::types::DNSType;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// `0` on success; everything else mirrors a `getaddrinfo`-style failure
/// code rather than the richer [`ResolveError`] it was derived from.
pub type ErrorCode = u32;

pub const OK: ErrorCode = 0;
pub const TIMEOUT: ErrorCode = 1;
pub const SERVER_FAILURE: ErrorCode = 2;
pub const NX_DOMAIN: ErrorCode = 3;
pub const UNKNOWN: ErrorCode = 4;

fn error_code(e: &ResolveError) -> ErrorCode {
    match e {
        ResolveError::NxDomain => NX_DOMAIN,
        ResolveError::NoData => NX_DOMAIN,
        ResolveError::TooManyQueries => SERVER_FAILURE,
        ResolveError::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => TIMEOUT,
        ResolveError::Io(io) if io.kind() == std::io::ErrorKind::WouldBlock => TIMEOUT,
        ResolveError::Io(_) => SERVER_FAILURE,
    }
}

/// One resolved record plus the TTL it should be cached for.
pub struct Answer<T> {
    pub value: T,
    pub ttl: Duration,
}

/// A resolution context. Creating one is cheap (it owns no sockets of its
/// own); it exists mainly to mirror the create/destroy lifecycle a C stub
/// resolver API exposes and to hold the query budget across calls.
pub struct StubResolver {
    resolver: Resolver,
}

impl Default for StubResolver {
    fn default() -> Self {
        StubResolver::new()
    }
}

impl StubResolver {
    pub fn new() -> StubResolver {
        StubResolver {
            resolver: Resolver::new(),
        }
    }

    pub fn with_query_cap(cap: u32) -> StubResolver {
        StubResolver {
            resolver: Resolver::with_query_cap(cap),
        }
    }

    /// Looks up every A/AAAA address for `name`. Returns the minimum TTL
    /// across both record sets it found, mirroring how a cache would need
    /// to expire the whole answer at once.
    pub fn lookup_ips(&self, name: &str) -> Result<Vec<Answer<IpAddr>>, ErrorCode> {
        let qname = Name::from_str(name).map_err(|_| UNKNOWN)?;

        let mut out = Vec::new();
        let tries: [(DNSType, fn(&RRGen) -> Option<IpAddr>); 2] = [
            (DNSType::A, (|r: &RRGen| match r {
                RRGen::A(a) => Some(IpAddr::V4(a.ip())),
                _ => None,
            }) as fn(&RRGen) -> Option<IpAddr>),
            (DNSType::AAAA, (|r: &RRGen| match r {
                RRGen::AAAA(a) => Some(IpAddr::V6(a.ip())),
                _ => None,
            }) as fn(&RRGen) -> Option<IpAddr>),
        ];
        for (qtype, wrap) in tries {
            match self.resolver.resolve(&qname, qtype) {
                Ok(resolved) => {
                    for rr in &resolved.answer.answers {
                        if let Some(ip) = wrap(&rr.rdata) {
                            out.push(Answer { value: ip, ttl: rr.ttl });
                        }
                    }
                }
                Err(ResolveError::NxDomain) | Err(ResolveError::NoData) => continue,
                Err(e) => return Err(error_code(&e)),
            }
        }

        if out.is_empty() {
            return Err(NX_DOMAIN);
        }
        Ok(out)
    }

    pub fn lookup_mx(&self, name: &str) -> Result<Vec<Answer<(u16, Name)>>, ErrorCode> {
        let qname = Name::from_str(name).map_err(|_| UNKNOWN)?;
        let resolved = self
            .resolver
            .resolve(&qname, DNSType::MX)
            .map_err(|e| error_code(&e))?;

        let out: Vec<Answer<(u16, Name)>> = resolved
            .answer
            .answers
            .iter()
            .filter_map(|rr| match &rr.rdata {
                RRGen::MX(mx) => Some(Answer {
                    value: (mx.preference, mx.exchange.clone()),
                    ttl: rr.ttl,
                }),
                _ => None,
            })
            .collect();

        if out.is_empty() {
            return Err(NX_DOMAIN);
        }
        Ok(out)
    }

    pub fn lookup_txt(&self, name: &str) -> Result<Vec<Answer<Vec<Vec<u8>>>>, ErrorCode> {
        let qname = Name::from_str(name).map_err(|_| UNKNOWN)?;
        let resolved = self
            .resolver
            .resolve(&qname, DNSType::TXT)
            .map_err(|e| error_code(&e))?;

        let out: Vec<Answer<Vec<Vec<u8>>>> = resolved
            .answer
            .answers
            .iter()
            .filter_map(|rr| match &rr.rdata {
                RRGen::TXT(txt) => Some(Answer {
                    value: txt.strings.clone(),
                    ttl: rr.ttl,
                }),
                _ => None,
            })
            .collect();

        if out.is_empty() {
            return Err(NX_DOMAIN);
        }
        Ok(out)
    }
}
