//! Implements `Display` for the wire types, so they print in `dig` style.
// Refer to https://github.com/tigeli/bind-utils/blob/master/bin/dig/dig.c for reference.

use crate::rr::RRGen;
use crate::types::{Message, Question, Record, Stats};
use chrono::prelude::*;
use std::fmt;

/// Displays this message in a format resembling `dig` output.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_header(f)?;

        // ;; OPT PSEUDOSECTION:
        // ; EDNS: version: 0, flags:; udp: 512
        if let Some(e) = &self.extension {
            writeln!(f, ";; OPT PSEUDOSECTION:")?;
            writeln!(
                f,
                "; EDNS: version: {version}, flags:{dnssec}; udp: {payload_size}",
                version = e.version,
                dnssec = if e.dnssec_ok { " do" } else { "" },
                payload_size = e.payload_size,
            )?;
        }

        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.questions {
            question.fmt(f)?;
        }
        writeln!(f)?;

        if !self.answers.is_empty() {
            writeln!(f, "; ANSWER SECTION:")?;
            for answer in &self.answers {
                answer.fmt(f)?;
            }
            writeln!(f)?;
        }

        if !self.authoritys.is_empty() {
            writeln!(f, "; AUTHORITY SECTION:")?;
            for rr in &self.authoritys {
                rr.fmt(f)?;
            }
            writeln!(f)?;
        }

        if !self.additionals.is_empty() {
            writeln!(f, "; ADDITIONAL SECTION:")?;
            for rr in &self.additionals {
                rr.fmt(f)?;
            }
            writeln!(f)?;
        }

        if let Some(stats) = &self.stats {
            stats.fmt(f)?;
        }

        writeln!(f)
    }
}

impl Message {
    fn fmt_header(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {opcode}, status: {rcode}, id: {id}",
            opcode = self.opcode,
            rcode = self.rcode,
            id = self.id,
        )?;

        let mut flags = String::new();

        if self.qr.to_bool() {
            flags.push_str(" qr")
        }
        if self.aa {
            flags.push_str(" aa")
        }
        if self.tc {
            flags.push_str(" tc")
        }
        if self.rd {
            flags.push_str(" rd")
        }
        if self.ra {
            flags.push_str(" ra")
        }
        if self.ad {
            flags.push_str(" ad")
        }
        if self.cd {
            flags.push_str(" cd")
        }

        let ar_count = self.additionals.len() as u16 + self.extension.is_some() as u16;

        writeln!(
            f,
            ";; flags:{flags}; QUERY: {qd_count}, ANSWER: {an_count}, AUTHORITY: {ns_count}, ADDITIONAL: {ar_count}",
            flags = flags,
            qd_count = self.questions.len(),
            an_count = self.answers.len(),
            ns_count = self.authoritys.len(),
            ar_count = ar_count,
        )?;

        writeln!(f)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, ";; Query time: {} msec", self.duration.as_millis())?;
        writeln!(f, ";; SERVER: {}", self.server)?;

        let start: chrono::DateTime<Local> = self.start.into();
        // ;; WHEN: Sat Jun 12 12:14:21 PDT 2021
        writeln!(f, ";; WHEN: {}", start.format("%a %b %-d %H:%M:%S %z %-Y"))?;
        writeln!(
            f,
            ";; MSG SIZE sent: {} rcvd: {}",
            self.request_size, self.response_size
        )
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "; {name:<18}      {class:4} {type:6}",
            name = self.name,
            class = self.class,
            r#type = self.r#type,
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{name:<20} {ttl:>4} {class:4} {type:6} {rdata}",
            name = self.name,
            ttl = self.ttl.as_secs(),
            class = self.class,
            r#type = self.r#type(),
            rdata = self.rdata,
        )
    }
}

impl fmt::Display for RRGen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RRGen::A(a) => a.ip().fmt(f),
            RRGen::AAAA(aaaa) => aaaa.ip().fmt(f),

            RRGen::NS(ns) => ns.name.fmt(f),
            RRGen::CNAME(cname) => cname.name.fmt(f),
            RRGen::PTR(ptr) => ptr.name.fmt(f),

            RRGen::SOA(soa) => {
                // "ns1.google.com. dns-admin.google.com. 376337657 900 900 1800 60"
                write!(
                    f,
                    "{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}",
                    mname = soa.mname,
                    rname = soa.rname,
                    serial = soa.serial,
                    refresh = soa.refresh,
                    retry = soa.retry,
                    expire = soa.expire,
                    minimum = soa.minimum,
                )
            }

            RRGen::MX(mx) => {
                // "10 aspmx.l.google.com."
                write!(f, "{} {}", mx.preference, mx.exchange)
            }

            RRGen::TXT(txt) => {
                let output = txt
                    .strings
                    .iter()
                    .map(|s| match std::str::from_utf8(s) {
                        Ok(s) => s.replace('"', "\\\""),
                        Err(_) => "invalid".to_string(),
                    })
                    .map(|s| format!("\"{}\"", s))
                    .collect::<Vec<String>>()
                    .join(" ");

                write!(f, "{}", output)
            }

            RRGen::SRV(srv) => {
                // "5 0 389 ldap.google.com."
                write!(f, "{} {} {} {}", srv.priority, srv.weight, srv.port, srv.target)
            }

            RRGen::NAPTR(naptr) => {
                write!(
                    f,
                    "{order} {preference} \"{flags}\" \"{services}\" \"{regexp}\" {replacement}",
                    order = naptr.order,
                    preference = naptr.preference,
                    flags = String::from_utf8_lossy(&naptr.flags),
                    services = String::from_utf8_lossy(&naptr.services),
                    regexp = String::from_utf8_lossy(&naptr.regexp),
                    replacement = naptr.replacement,
                )
            }

            RRGen::RRSIG(rrsig) => {
                write!(
                    f,
                    "{covered} {algorithm} {labels} {ttl} {expiration} {inception} {tag} {signer} <sig>",
                    covered = rrsig.covered_type,
                    algorithm = rrsig.algorithm,
                    labels = rrsig.labels,
                    ttl = rrsig.original_ttl,
                    expiration = rrsig.expiration,
                    inception = rrsig.inception,
                    tag = rrsig.key_tag,
                    signer = rrsig.signer,
                )
            }

            RRGen::Unknown(u) => write!(f, "TYPE{} \\# {}", u.rtype, u.data.len()),
        }
    }
}
