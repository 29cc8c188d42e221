//! Integration tests for the iterative resolver's query-budget enforcement.
//!
//! A full root-to-leaf referral walk needs a real nameserver listening on
//! port 53, which in turn needs a privilege a test runner doesn't have, so
//! these stick to behaviour `Resolver` guarantees before it ever touches a
//! socket: the query budget is checked before the first query is sent, and
//! an empty server set fails without pretending to have tried.

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use tdns::errors::ResolveError;
use tdns::resolver::Resolver;
use tdns::{DNSType, Name};

#[test]
fn zero_query_budget_fails_before_any_query_is_sent() {
    let resolver = Resolver::with_query_cap(0);
    let qname = Name::from_str("example.com").unwrap();
    let roots = vec![IpAddr::V4(Ipv4Addr::LOCALHOST)];

    let err = resolver
        .resolve_with_roots(&qname, DNSType::A, &roots)
        .expect_err("a zero query budget must not allow even one query");

    assert!(matches!(err, ResolveError::TooManyQueries));
}

#[test]
fn no_roots_fails_without_network_access() {
    let resolver = Resolver::new();
    let qname = Name::from_str("example.com").unwrap();

    let err = resolver
        .resolve_with_roots(&qname, DNSType::A, &[])
        .expect_err("an empty server set can't resolve anything");

    assert!(matches!(err, ResolveError::NoData));
}
