//! tdns is a small, didactic DNS stack: a wire-format codec, an authoritative
//! nameserver, and an iterative resolver, built to teach how the pieces of
//! RFC 1034/1035 fit together rather than to be the fastest or most complete
//! implementation around.
//!
//! # Features
//! * Parsing and generating the common record types:
//!   * A, AAAA, CNAME, MX, NS, SOA, PTR, TXT, SRV, NAPTR, and RRSIG.
//! * Extension Mechanisms for DNS ([EDNS(0)]).
//! * An authoritative server that loads a simple zone-file format and serves
//!   it over UDP and TCP, including AXFR.
//! * An iterative resolver that walks the hierarchy from the root, and a
//!   small stub-resolver facade over it.
//! * A sample `dig`-style command line client.
//!
//! # Usage (low-level library)
//!
//! ```rust
//! use tdns::types::*;
//! use tdns::Name;
//! use std::net::UdpSocket;
//! use std::str::FromStr;
//! use std::time::Duration;
//!
//! fn udp_example() -> std::io::Result<()> {
//!     // A DNS Message can be easily constructed.
//!     let mut m = Message::default();
//!     m.add_question(Name::from_str("bramp.net").unwrap(), DNSType::A, DNSClass::Internet);
//!     m.extension = Some(Extension {   // Optionally add an EDNS extension
//!         payload_size: 4096,          // which supports a larger payload size.
//!         ..Default::default()
//!     });
//!
//!     // Setup a UDP socket for sending to a DNS server.
//!     let socket = UdpSocket::bind("0.0.0.0:0")?;
//!     socket.set_read_timeout(Some(Duration::new(5, 0)))?;
//!     socket.connect("8.8.8.8:53")?; // Google's Public DNS Servers
//!
//!     // Encode the DNS Message as a Vec<u8>.
//!     let question = m.to_vec()?;
//!
//!     // Send to the server.
//!     socket.send(&question)?;
//!
//!     // Wait for a response from the DNS server.
//!     let mut resp = [0; 4096];
//!     let len = socket.recv(&mut resp)?;
//!
//!     // Take the response bytes and turn it into another DNS Message.
//!     let answer = Message::from_slice(&resp[0..len])?;
//!
//!     // Now do something with `answer`, in this case print it!
//!     println!("DNS Response:\n{}", answer);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Usage (cli)
//!
//! ```shell
//! $ cargo run -p dig -- bramp.net A 8.8.8.8
//! $ cargo run -p authd -- zones/example.zone 127.0.0.1:5300
//! $ cargo run -p resolve -- bramp.net A
//! $ cargo run -p resolve -- 127.0.0.1:5300
//! ```
//!
//! # Testing
//!
//! ```shell
//! $ cargo test --all
//! ```
//!
//! ## Fuzzing
//!
//! ```shell
//! $ cargo fuzz run from_slice
//! ```
//!
//! ## Reference
//!
//! * [rfc1034]: DOMAIN NAMES - CONCEPTS AND FACILITIES
//! * [rfc1035]: DOMAIN NAMES - IMPLEMENTATION AND SPECIFICATION
//! * [rfc6891]: Extension Mechanisms for DNS (EDNS(0))
//! * [IANA Domain Name System (DNS) Parameters](https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml)
//!
//! [EDNS(0)]: https://en.wikipedia.org/wiki/Extension_Mechanisms_for_DNS
//! [rfc1034]: https://datatracker.ietf.org/doc/html/rfc1034
//! [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
//! [rfc6891]: https://datatracker.ietf.org/doc/html/rfc6891

pub mod clients;
mod display;
mod dns;
pub mod errors;
mod from_str;
mod io;
pub mod name;
pub mod resolver;
pub mod rr;
pub mod server;
pub mod stub;
pub mod types;
pub mod util;
pub mod zone;

#[macro_use]
extern crate num_derive;

#[macro_use]
extern crate lazy_static;

// Pull up the various types that should be on the front page of the docs.
#[doc(inline)]
pub use crate::types::*;

#[doc(inline)]
pub use crate::rr::RRGen;

#[doc(inline)]
pub use crate::name::{Label, Name};

pub use crate::errors::ParseError;
