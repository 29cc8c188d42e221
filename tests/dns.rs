//! End-to-end codec tests against `Message::to_vec`/`Message::from_slice`.
//! No sockets involved: these exercise the wire format in isolation.

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

use tdns::rr::{Cname, Mx, Ns, Soa, Txt, A};
use tdns::types::*;
use tdns::{Name, RRGen};

fn record(name: &str, ttl: u64, rdata: RRGen) -> Record {
    Record {
        name: Name::from_str(name).unwrap(),
        class: DNSClass::Internet,
        ttl: Duration::from_secs(ttl),
        rdata,
    }
}

#[test]
fn question_round_trips_through_the_wire() {
    let mut m = Message::default();
    m.id = 0x1234;
    m.rd = true;
    m.add_question(Name::from_str("bramp.net").unwrap(), DNSType::A, DNSClass::Internet);

    let bytes = m.to_vec().unwrap();
    let back = Message::from_slice(&bytes).unwrap();

    assert_eq!(back.id, 0x1234);
    assert!(back.rd);
    assert_eq!(back.questions.len(), 1);
    assert_eq!(back.questions[0].name, Name::from_str("bramp.net").unwrap());
    assert_eq!(back.questions[0].r#type, DNSType::A);
}

#[test]
fn mixed_rrset_round_trips_with_correct_types() {
    let mut m = Message::default();
    m.qr = QR::Response;
    m.aa = true;
    m.add_question(Name::from_str("example.com").unwrap(), DNSType::ANY, DNSClass::Internet);

    m.answers.push(record(
        "example.com",
        300,
        RRGen::A(A { addr: u32::from(Ipv4Addr::new(93, 184, 216, 34)) }),
    ));
    m.answers.push(record(
        "example.com",
        300,
        RRGen::NS(Ns { name: Name::from_str("a.iana-servers.net").unwrap() }),
    ));
    m.answers.push(record(
        "example.com",
        300,
        RRGen::MX(Mx { preference: 10, exchange: Name::from_str("mail.example.com").unwrap() }),
    ));
    m.answers.push(record(
        "example.com",
        300,
        RRGen::TXT(Txt { strings: vec![b"hello world".to_vec()] }),
    ));

    let bytes = m.to_vec().unwrap();
    let back = Message::from_slice(&bytes).unwrap();

    assert_eq!(back.answers.len(), 4);
    assert_eq!(back.answers[0].r#type(), DNSType::A);
    assert_eq!(back.answers[1].r#type(), DNSType::NS);
    assert_eq!(back.answers[2].r#type(), DNSType::MX);
    assert_eq!(back.answers[3].r#type(), DNSType::TXT);

    match &back.answers[3].rdata {
        RRGen::TXT(txt) => assert_eq!(txt.strings, vec![b"hello world".to_vec()]),
        other => panic!("unexpected rdata: {:?}", other),
    }
}

#[test]
fn name_compression_keeps_repeated_owners_small() {
    let mut m = Message::default();
    m.add_question(Name::from_str("www.example.com").unwrap(), DNSType::A, DNSClass::Internet);

    // Every answer shares the question's owner name; without compression
    // this would re-encode "www.example.com" in full four more times.
    for _ in 0..5 {
        m.answers.push(record(
            "www.example.com",
            300,
            RRGen::A(A { addr: u32::from(Ipv4Addr::new(1, 2, 3, 4)) }),
        ));
    }

    let bytes = m.to_vec().unwrap();
    assert!(bytes.len() < 140, "expected compression to keep this small, got {} bytes", bytes.len());

    let back = Message::from_slice(&bytes).unwrap();
    assert_eq!(back.answers.len(), 5);
    for rr in &back.answers {
        assert_eq!(rr.name, Name::from_str("www.example.com").unwrap());
    }
}

#[test]
fn cname_chain_preserves_order() {
    let mut m = Message::default();
    m.qr = QR::Response;
    m.add_question(Name::from_str("www.example.com").unwrap(), DNSType::A, DNSClass::Internet);

    m.answers.push(record(
        "www.example.com",
        300,
        RRGen::CNAME(Cname { name: Name::from_str("example.com").unwrap() }),
    ));
    m.answers.push(record(
        "example.com",
        300,
        RRGen::A(A { addr: u32::from(Ipv4Addr::new(5, 6, 7, 8)) }),
    ));

    let bytes = m.to_vec().unwrap();
    let back = Message::from_slice(&bytes).unwrap();

    assert_eq!(back.answers[0].r#type(), DNSType::CNAME);
    assert_eq!(back.answers[1].r#type(), DNSType::A);
}

#[test]
fn soa_authority_round_trips() {
    let mut m = Message::default();
    m.rcode = RCode::NXDomain;
    m.add_question(Name::from_str("nope.example.com").unwrap(), DNSType::A, DNSClass::Internet);
    m.authoritys.push(record(
        "example.com",
        3600,
        RRGen::SOA(Soa {
            mname: Name::from_str("ns1.example.com").unwrap(),
            rname: Name::from_str("hostmaster.example.com").unwrap(),
            serial: 2024010100,
            refresh: 7200,
            retry: 3600,
            expire: 1209600,
            minimum: 3600,
        }),
    ));

    let bytes = m.to_vec().unwrap();
    let back = Message::from_slice(&bytes).unwrap();

    assert_eq!(back.rcode, RCode::NXDomain);
    assert_eq!(back.authoritys.len(), 1);
    match &back.authoritys[0].rdata {
        RRGen::SOA(soa) => assert_eq!(soa.serial, 2024010100),
        other => panic!("unexpected rdata: {:?}", other),
    }
}

#[test]
fn edns_extension_round_trips() {
    let mut m = Message::default();
    m.add_question(Name::from_str("example.com").unwrap(), DNSType::A, DNSClass::Internet);
    m.extension = Some(Extension {
        payload_size: 4096,
        ..Default::default()
    });

    let bytes = m.to_vec().unwrap();
    let back = Message::from_slice(&bytes).unwrap();

    let ext = back.extension.expect("EDNS extension should round-trip");
    assert_eq!(ext.payload_size, 4096);
}

#[test]
fn truncated_or_garbage_input_is_rejected() {
    // Too short to even contain a header.
    assert!(Message::from_slice(&[0u8; 4]).is_err());

    // A header claiming one question but no question bytes follow.
    let mut header = vec![0u8; 12];
    header[4] = 0x00;
    header[5] = 0x01; // QDCOUNT = 1
    assert!(Message::from_slice(&header).is_err());
}
