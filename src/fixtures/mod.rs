//! Sibling fixtures: plain TCP and UDP endpoints.

pub mod tcp_echo;
pub mod udp;

pub use tcp_echo::{send_message, TcpEchoServer};
pub use udp::{open_socket, send_datagram, stamp_message, Delivery};
