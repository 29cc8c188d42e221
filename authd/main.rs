// Authoritative nameserver: authd <zonefile> <addr[:port]> [addr[:port] ...]
//
// Loads one zone file and serves it over both UDP and TCP on every listed
// address, one thread per transport per address (plus the per-datagram and
// per-connection threads `AuthServer` spawns itself).
use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;

use log::error;
use tdns::server::AuthServer;
use tdns::zone::load_zones;

fn usage() -> ! {
    eprintln!("usage: authd <zonefile> <addr[:port]> [addr[:port] ...]");
    process::exit(1);
}

/// Appends the default DNS port if `addr` looks like a bare IPv4 address
/// with no port of its own.
fn with_default_port(addr: &str) -> String {
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{}:53", addr)
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        usage();
    }

    let zonefile = Path::new(&args[0]);
    let zones = load_zones(zonefile).unwrap_or_else(|e| {
        eprintln!("failed to load zone file '{}': {}", zonefile.display(), e);
        process::exit(1);
    });

    let server = Arc::new(AuthServer::new(zones));

    let mut handles = Vec::new();
    for addr in &args[1..] {
        let addr = with_default_port(addr);

        let udp_server = Arc::clone(&server);
        let udp_addr = addr.clone();
        handles.push(std::thread::spawn(move || {
            if let Err(e) = udp_server.serve_udp(&udp_addr) {
                error!("udp listener on {} exited: {}", udp_addr, e);
                process::exit(1);
            }
        }));

        let tcp_server = Arc::clone(&server);
        let tcp_addr = addr.clone();
        handles.push(std::thread::spawn(move || {
            if let Err(e) = tcp_server.serve_tcp(&tcp_addr) {
                error!("tcp listener on {} exited: {}", tcp_addr, e);
                process::exit(1);
            }
        }));
    }

    for h in handles {
        let _ = h.join();
    }
}
