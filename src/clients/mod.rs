//! Thin transport clients: one struct per wire transport, each exposing the
//! same `exchange(&Message) -> io::Result<Message>` shape through the
//! [`Exchanger`] trait so callers (the resolver, the `dig`-style binary)
//! don't need to care which one they're holding.

mod tcp;
mod udp;

pub use self::tcp::TcpClient;
pub use self::udp::UdpClient;

use crate::types::Message;
use std::io;

/// A transport capable of sending a [`Message`] and waiting for the reply.
pub trait Exchanger {
    fn exchange(&self, query: &Message) -> io::Result<Message>;
}

impl Exchanger for UdpClient {
    fn exchange(&self, query: &Message) -> io::Result<Message> {
        UdpClient::exchange(self, query)
    }
}

impl Exchanger for TcpClient {
    fn exchange(&self, query: &Message) -> io::Result<Message> {
        TcpClient::exchange(self, query)
    }
}
