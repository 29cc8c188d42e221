// Simple dig-style command line: dig {name} {type} {addr[:port]}
use std::env;
use std::net::ToSocketAddrs;
use std::process;
use std::str::FromStr;

use tdns::clients::{Exchanger, TcpClient, UdpClient};
use tdns::types::*;
use tdns::{util, Name};

struct Args {
    name: Name,
    r#type: DNSType,
    server: String,
    tcp: bool,
}

fn usage() -> ! {
    eprintln!("usage: dig [+tcp] <name> <type> <addr[:port]>");
    process::exit(1);
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Args {
    let mut tcp = false;
    let mut positional = Vec::new();

    for arg in args.by_ref() {
        match arg.as_str() {
            "+tcp" => tcp = true,
            "+udp" => tcp = false,
            _ => positional.push(arg),
        }
    }

    if positional.len() != 3 {
        usage();
    }

    let name = match Name::from_str(&positional[0]) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("invalid name '{}': {}", positional[0], e);
            usage();
        }
    };

    let r#type = match DNSType::from_str(&positional[1].to_uppercase()) {
        Ok(t) => t,
        Err(_) => {
            eprintln!("unknown record type '{}'", positional[1]);
            usage();
        }
    };

    Args {
        name,
        r#type,
        server: positional[2].clone(),
        tcp,
    }
}

fn server_addr(server: &str) -> std::net::SocketAddr {
    match server.to_socket_addrs() {
        Ok(mut addrs) => addrs.next().expect("resolved to no addresses"),
        Err(_) => (server, 53u16)
            .to_socket_addrs()
            .unwrap_or_else(|e| {
                eprintln!("failed to parse server address '{}': {}", server, e);
                process::exit(1);
            })
            .next()
            .expect("resolved to no addresses"),
    }
}

fn main() {
    env_logger::init();

    let args = parse_args(env::args().skip(1));
    let addr = server_addr(&args.server);

    let mut query = Message::default();
    query.rd = true;
    query.add_question(args.name, args.r#type, DNSClass::Internet);
    query.extension = Some(Extension {
        payload_size: 4096,
        ..Default::default()
    });

    println!("query:");
    util::hexdump(&query.to_vec().expect("failed to encode the query"));
    println!();
    println!("{}", query);

    let resp = if args.tcp {
        TcpClient::new(addr)
            .expect("failed to set up TCP client")
            .exchange(&query)
    } else {
        UdpClient::new(addr)
            .expect("failed to set up UDP client")
            .exchange(&query)
    };

    match resp {
        Ok(resp) => {
            println!("response:");
            println!("{}", resp);
        }
        Err(e) => {
            eprintln!("could not exchange message: {}", e);
            process::exit(1);
        }
    }
}
