//! The iterative resolver: walks the DNS hierarchy from the root, following
//! referrals, glue, and CNAME chains, per RFC 1034 §5.3.3 and RFC 1035 §7.
//! Unlike the authoritative server, this never trusts a single answer —
//! every step re-derives the next server set from what was actually
//! returned.

use crate::clients::{TcpClient, UdpClient};
use crate::errors::ResolveError;
use crate::name::Name;
use crate::rr::RRGen;
use crate::types::*;
use log::{debug, trace, warn};
use rand::prelude::SliceRandom;
use std::cell::Cell;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Caps the total number of queries a single [`Resolver::resolve`] call may
/// send, across every referral and CNAME hop — the `d_maxqueries` of the
/// original design, guarding against referral loops between misconfigured
/// servers.
pub const DEFAULT_QUERY_CAP: u32 = 300;

const MAX_REFERRAL_DEPTH: usize = 30;
const MAX_CNAME_DEPTH: usize = 10;
const MAX_ATTEMPTS_PER_SERVER: usize = 4;
const UDP_TIMEOUT: Duration = Duration::from_secs(1);

/// IPv4 addresses of the 13 root servers, compiled in since this resolver
/// never primes itself from a `named.root` hints file.
pub const ROOT_HINTS: &[Ipv4Addr] = &[
    Ipv4Addr::new(198, 41, 0, 4),     // a.root-servers.net
    Ipv4Addr::new(199, 9, 14, 201),   // b.root-servers.net
    Ipv4Addr::new(192, 33, 4, 12),    // c.root-servers.net
    Ipv4Addr::new(199, 7, 91, 13),    // d.root-servers.net
    Ipv4Addr::new(192, 203, 230, 10), // e.root-servers.net
    Ipv4Addr::new(192, 5, 5, 241),    // f.root-servers.net
    Ipv4Addr::new(192, 112, 36, 4),   // g.root-servers.net
    Ipv4Addr::new(198, 97, 190, 53),  // h.root-servers.net
    Ipv4Addr::new(192, 36, 148, 17),  // i.root-servers.net
    Ipv4Addr::new(192, 58, 128, 30),  // j.root-servers.net
    Ipv4Addr::new(193, 0, 14, 129),   // k.root-servers.net
    Ipv4Addr::new(199, 7, 83, 42),    // l.root-servers.net
    Ipv4Addr::new(202, 12, 27, 33),   // m.root-servers.net
];

fn root_servers() -> Vec<IpAddr> {
    ROOT_HINTS.iter().map(|a| IpAddr::V4(*a)).collect()
}

/// The outcome of a full resolution: the terminal answer plus every CNAME
/// hopped through to reach it, oldest first.
pub struct Resolved {
    pub answer: Message,
    pub chain: Vec<Record>,
    pub queries: u32,
}

/// Per-resolution state threaded through every recursive step: just the
/// shared query budget.
struct Context {
    queries: Cell<u32>,
    cap: u32,
}

impl Context {
    fn charge(&self) -> Result<(), ResolveError> {
        let n = self.queries.get() + 1;
        if n > self.cap {
            return Err(ResolveError::TooManyQueries);
        }
        self.queries.set(n);
        Ok(())
    }
}

pub struct Resolver {
    cap: u32,
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver {
            cap: DEFAULT_QUERY_CAP,
        }
    }
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver::default()
    }

    pub fn with_query_cap(cap: u32) -> Resolver {
        Resolver { cap }
    }

    /// Resolves `qname`/`qtype` iteratively from the root.
    pub fn resolve(&self, qname: &Name, qtype: DNSType) -> Result<Resolved, ResolveError> {
        self.resolve_with_roots(qname, qtype, &root_servers())
    }

    /// Like [`Resolver::resolve`], but starting from `roots` instead of the
    /// compiled-in [`ROOT_HINTS`] — lets tests point the resolver at a
    /// synthetic, loopback-hosted topology instead of the real internet.
    pub fn resolve_with_roots(
        &self,
        qname: &Name,
        qtype: DNSType,
        roots: &[IpAddr],
    ) -> Result<Resolved, ResolveError> {
        let ctx = Context {
            queries: Cell::new(0),
            cap: self.cap,
        };

        let mut name = qname.clone();
        let mut chain = Vec::new();

        for _ in 0..MAX_CNAME_DEPTH {
            let msg = resolve_at(&ctx, &name, qtype, roots, MAX_REFERRAL_DEPTH, roots)?;

            let cname = msg
                .answers
                .iter()
                .find(|r| r.name == name && r.r#type() == DNSType::CNAME)
                .cloned();

            match cname {
                Some(rr) if qtype != DNSType::CNAME => {
                    name = match &rr.rdata {
                        RRGen::CNAME(c) => c.name.clone(),
                        _ => unreachable!("CNAME record with non-CNAME rdata"),
                    };
                    chain.push(rr);
                    continue;
                }
                _ => {
                    return Ok(Resolved {
                        answer: msg,
                        chain,
                        queries: ctx.queries.get(),
                    });
                }
            }
        }

        Err(ResolveError::NoData)
    }
}

/// Resolves `qname`/`qtype` using `servers`, following one referral chain to
/// progressively more specific servers. Does not itself follow CNAMEs —
/// [`Resolver::resolve`] restarts resolution for the alias target instead,
/// matching how a real iterative resolver treats an alias as a fresh lookup.
fn resolve_at(
    ctx: &Context,
    qname: &Name,
    qtype: DNSType,
    servers: &[IpAddr],
    depth: usize,
    roots: &[IpAddr],
) -> Result<Message, ResolveError> {
    if depth == 0 {
        return Err(ResolveError::TooManyQueries);
    }

    let mut servers = servers.to_vec();
    servers.shuffle(&mut rand::thread_rng());

    let mut last_err = None;

    for server in &servers {
        ctx.charge()?;
        let addr = SocketAddr::new(*server, 53);

        let msg = match get_response(addr, qname, qtype) {
            Ok(m) => m,
            Err(e) => {
                debug!("{} did not answer for {} {}: {}", addr, qname, qtype, e);
                last_err = Some(e);
                continue;
            }
        };

        if msg.rcode == RCode::NXDomain {
            return Err(ResolveError::NxDomain);
        }
        if msg.rcode != RCode::NoError {
            last_err = Some(ResolveError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("{} returned {}", addr, msg.rcode),
            )));
            continue;
        }

        let answered = msg
            .answers
            .iter()
            .any(|r| r.name == *qname && (r.r#type() == qtype || r.r#type() == DNSType::CNAME));
        let nodata = msg.answers.is_empty()
            && msg.authoritys.iter().any(|r| r.r#type() == DNSType::SOA);

        if msg.aa || answered || nodata {
            return Ok(msg);
        }

        match next_servers(ctx, &msg, depth, roots) {
            Some(next) if !next.is_empty() => {
                trace!("referred from {} toward {} servers for {}", addr, next.len(), qname);
                return resolve_at(ctx, qname, qtype, &next, depth - 1, roots);
            }
            _ => {
                last_err = Some(ResolveError::NoData);
                continue;
            }
        }
    }

    Err(last_err.unwrap_or(ResolveError::NoData))
}

/// Picks out the in-bailiwick glue addresses for one nameserver name from a
/// referral's additional section: an address only counts as glue if its
/// owner name actually falls under the zone being delegated, so a malicious
/// or misconfigured parent can't plant addresses for names outside its own
/// authority.
fn bailiwick_glue(additionals: &[Record], ns_name: &Name, zone: &Name) -> Vec<IpAddr> {
    if !ns_name.is_part_of(zone) {
        return Vec::new();
    }
    additionals
        .iter()
        .filter(|a| a.name == *ns_name)
        .filter_map(|a| match &a.rdata {
            RRGen::A(a) => Some(IpAddr::V4(a.ip())),
            RRGen::AAAA(a) => Some(IpAddr::V6(a.ip())),
            _ => None,
        })
        .collect()
}

/// Extracts the next, more specific server set from a referral response:
/// in-bailiwick glue is trusted directly; anything else sends the resolver
/// off to look the nameserver's address up on its own, starting again from
/// `roots`.
fn next_servers(ctx: &Context, msg: &Message, depth: usize, roots: &[IpAddr]) -> Option<Vec<IpAddr>> {
    let ns_records: Vec<&Record> = msg
        .authoritys
        .iter()
        .filter(|r| r.r#type() == DNSType::NS)
        .collect();
    if ns_records.is_empty() {
        return None;
    }
    let zone = ns_records[0].name.clone();

    let mut out = Vec::new();
    for rr in &ns_records {
        let ns_name = match &rr.rdata {
            RRGen::NS(ns) => ns.name.clone(),
            _ => continue,
        };

        let glue = bailiwick_glue(&msg.additionals, &ns_name, &zone);
        if !glue.is_empty() {
            out.extend(glue);
            continue;
        }

        // Glueless delegation: resolve the nameserver's own address first.
        if let Ok(resolved) = resolve_at(ctx, &ns_name, DNSType::A, roots, depth.saturating_sub(1), roots) {
            for a in &resolved.answers {
                if let RRGen::A(a) = &a.rdata {
                    out.push(IpAddr::V4(a.ip()));
                }
            }
        }
    }

    Some(out)
}

/// A single query/response exchange with one server: EDNS first, falling
/// back to a plain query on FORMERR, retrying over TCP when the UDP answer
/// is truncated, and discarding any reply that doesn't match the query's id.
fn get_response(server: SocketAddr, qname: &Name, qtype: DNSType) -> Result<Message, ResolveError> {
    let mut use_edns = true;
    let mut last_err = None;

    for _ in 0..MAX_ATTEMPTS_PER_SERVER {
        let mut query = Message::default();
        query.id = rand::random();
        query.rd = false;
        query.add_question(qname.clone(), qtype, DNSClass::Internet);
        if use_edns {
            query.extension = Some(Extension {
                payload_size: 4096,
                ..Default::default()
            });
        }

        let udp = UdpClient::with_timeout(server, UDP_TIMEOUT).map_err(ResolveError::Io)?;
        let resp = match udp.exchange(&query) {
            Ok(m) => m,
            Err(e) => {
                last_err = Some(ResolveError::Io(e));
                continue;
            }
        };

        if resp.id != query.id || resp.qr != QR::Response {
            last_err = Some(ResolveError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "response id/QR did not match the query",
            )));
            continue;
        }

        if resp.rcode == RCode::FormErr && use_edns {
            warn!("{} rejected EDNS for {} {}, retrying plainly", server, qname, qtype);
            use_edns = false;
            continue;
        }

        if resp.tc {
            let tcp = TcpClient::new(server).map_err(ResolveError::Io)?;
            return tcp.exchange(&query).map_err(ResolveError::Io);
        }

        return Ok(resp);
    }

    Err(last_err.unwrap_or(ResolveError::NoData))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rr::A;
    use std::str::FromStr;

    fn a_record(name: &str, addr: Ipv4Addr) -> Record {
        Record {
            name: Name::from_str(name).unwrap(),
            class: DNSClass::Internet,
            ttl: Duration::from_secs(3600),
            rdata: RRGen::A(A { addr: u32::from(addr) }),
        }
    }

    #[test]
    fn glue_in_bailiwick_is_accepted() {
        let zone = Name::from_str("nl").unwrap();
        let ns_name = Name::from_str("ns1.nl").unwrap();
        let additionals = vec![a_record("ns1.nl", Ipv4Addr::new(1, 2, 3, 4))];

        let glue = bailiwick_glue(&additionals, &ns_name, &zone);
        assert_eq!(glue, vec![IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))]);
    }

    #[test]
    fn glue_out_of_bailiwick_is_rejected() {
        // A parent for "nl" has no business vouching for an address under a
        // completely different, unrelated zone.
        let zone = Name::from_str("nl").unwrap();
        let ns_name = Name::from_str("ns1.example.com").unwrap();
        let additionals = vec![a_record("ns1.example.com", Ipv4Addr::new(9, 9, 9, 9))];

        let glue = bailiwick_glue(&additionals, &ns_name, &zone);
        assert!(glue.is_empty());
    }

    #[test]
    fn glue_only_matches_the_requested_owner_name() {
        let zone = Name::from_str("nl").unwrap();
        let ns_name = Name::from_str("ns1.nl").unwrap();
        let additionals = vec![a_record("ns2.nl", Ipv4Addr::new(5, 5, 5, 5))];

        let glue = bailiwick_glue(&additionals, &ns_name, &zone);
        assert!(glue.is_empty());
    }

    #[test]
    fn query_budget_is_enforced() {
        let ctx = Context {
            queries: Cell::new(0),
            cap: 2,
        };
        assert!(ctx.charge().is_ok());
        assert!(ctx.charge().is_ok());
        assert!(matches!(ctx.charge(), Err(ResolveError::TooManyQueries)));
    }
}
