// Iterative resolver CLI, with two unrelated faces picked apart by argument
// count (mirroring the original `tres` binary):
//
//   resolve <name> <type>       single-shot lookup, printed to stdout
//   resolve <addr[:port]>       recursive resolver server over UDP
use std::env;
use std::net::{UdpSocket, SocketAddr};
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;

use log::{error, warn};
use tdns::errors::ResolveError;
use tdns::resolver::Resolver;
use tdns::types::*;
use tdns::Name;

fn usage() -> ! {
    eprintln!("usage: resolve <name> <type>");
    eprintln!("       resolve <addr[:port]>");
    process::exit(1);
}

fn single_shot(name: &str, r#type: &str) {
    let qname = Name::from_str(name).unwrap_or_else(|e| {
        eprintln!("invalid name '{}': {}", name, e);
        usage();
    });
    let qtype = DNSType::from_str(&r#type.to_uppercase()).unwrap_or_else(|_| {
        eprintln!("unknown record type '{}'", r#type);
        usage();
    });

    let resolver = Resolver::new();
    match resolver.resolve(&qname, qtype) {
        Ok(resolved) => {
            for rr in &resolved.chain {
                println!("{} {} {} {}", rr.name, rr.ttl.as_secs(), rr.r#type(), rr.rdata);
            }
            for rr in &resolved.answer.answers {
                println!("{} {} {} {}", rr.name, rr.ttl.as_secs(), rr.r#type(), rr.rdata);
            }
            println!("Used {} queries", resolved.queries);
        }
        Err(ResolveError::NxDomain) => {
            println!("{}: name does not exist", name);
            process::exit(1);
        }
        Err(ResolveError::NoData) => {
            println!("{}: name does not have the requested type", name);
            process::exit(1);
        }
        Err(ResolveError::TooManyQueries) => {
            println!("{}: exceeded the maximum number of queries", name);
            process::exit(1);
        }
        Err(ResolveError::Io(e)) => {
            println!("{}: {}", name, e);
            process::exit(1);
        }
    }
}

/// Turns a resolution outcome into a response `Message` answering `query`,
/// the way the authoritative server turns a zone lookup into one.
fn build_response(query: &Message, resolver: &Resolver) -> Message {
    let mut resp = Message::default();
    resp.id = query.id;
    resp.rd = query.rd;
    resp.opcode = query.opcode;
    resp.qr = QR::Response;
    resp.ra = true;

    let question = match query.questions.first() {
        Some(q) => q.clone(),
        None => {
            resp.rcode = RCode::FormErr;
            return resp;
        }
    };
    resp.add_question(question.name.clone(), question.r#type, question.class);

    if query.opcode != OpCode::Query || question.class != DNSClass::Internet {
        resp.rcode = RCode::NotImp;
        return resp;
    }

    match resolver.resolve(&question.name, question.r#type) {
        Ok(resolved) => {
            resp.answers.extend(resolved.chain);
            resp.answers.extend(resolved.answer.answers);
        }
        Err(ResolveError::NxDomain) => resp.rcode = RCode::NXDomain,
        Err(ResolveError::NoData) => {}
        Err(ResolveError::TooManyQueries) | Err(ResolveError::Io(_)) => {
            resp.rcode = RCode::ServFail;
        }
    }

    resp
}

fn serve(addr: &str) {
    let addr = if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{}:53", addr)
    };

    let socket = UdpSocket::bind(&addr).unwrap_or_else(|e| {
        eprintln!("failed to bind {}: {}", addr, e);
        process::exit(1);
    });
    let socket = Arc::new(socket);
    let resolver = Arc::new(Resolver::new());

    println!("resolver listening on udp://{}", addr);

    let mut buf = [0u8; 4096];
    loop {
        let (len, peer): (usize, SocketAddr) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) => {
                warn!("recv failed: {}", e);
                continue;
            }
        };
        let data = buf[..len].to_vec();
        let socket = Arc::clone(&socket);
        let resolver = Arc::clone(&resolver);

        thread::spawn(move || {
            let query = match Message::from_slice(&data) {
                Ok(q) => q,
                Err(e) => {
                    warn!("dropping malformed query from {}: {}", peer, e);
                    return;
                }
            };
            if query.qr == QR::Response {
                return;
            }

            let resp = build_response(&query, &resolver);
            match resp.to_vec() {
                Ok(bytes) => {
                    if let Err(e) = socket.send_to(&bytes, peer) {
                        warn!("failed to send response to {}: {}", peer, e);
                    }
                }
                Err(e) => error!("failed to encode response for {}: {}", peer, e),
            }
        });
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.len() {
        1 => serve(&args[0]),
        2 => single_shot(&args[0], &args[1]),
        _ => usage(),
    }
}
