//! Error types shared across the codec, zone tree, server and resolver.

use thiserror::Error;

/// Constructs an `io::Error` of the given `ErrorKind`, formatted like `format!`.
///
/// Used at the message-codec boundary so that malformed wire data surfaces as
/// an ordinary `io::Result` error the caller can propagate with `?`, the same
/// way reads and writes do.
#[macro_export]
macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {
        // Construct the I/O error.
        return Err(
            ::std::io::Error::new(::std::io::ErrorKind::$kind, format!($($arg)*))
        )
    };
}

/// Errors raised while parsing presentation-form (text) records or names.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    #[error(transparent)]
    AddrParse(#[from] std::net::AddrParseError),
}

/// Shorthand for returning a [`ParseError::Message`].
#[macro_export]
macro_rules! parse_error {
    ($($arg:tt)*) => {
        Err($crate::errors::ParseError::Message(format!($($arg)*)))
    };
}

/// Errors raised while loading or ingesting zone data.
///
/// These are "policy violations at ingest" per the zone tree's invariants: a
/// malformed zone file is a fatal load error, not something that should ever
/// reach a client as a DNS response.
#[derive(Error, Debug)]
pub enum ZoneError {
    #[error("label '{0}' is longer than 63 bytes")]
    LabelTooLong(String),

    #[error("name is longer than 255 bytes on the wire")]
    NameTooLong,

    #[error("cannot add a CNAME at a node that already has other records")]
    CnameConflict,

    #[error("cannot add a {0:?} record at a node that already has a CNAME")]
    CnameSibling(crate::types::DNSType),

    #[error("zone '{0}' has no SOA record")]
    MissingSoa(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Terminal outcomes of an iterative resolution, per RFC 1034 §5.3.3.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The queried name does not exist anywhere in the chain of authority.
    #[error("nxdomain")]
    NxDomain,

    /// The name exists, but not the requested type (and no CNAME was found).
    #[error("nodata")]
    NoData,

    /// The per-resolution query budget (`d_maxqueries` in the original) was exhausted.
    #[error("too many queries sent while resolving")]
    TooManyQueries,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
