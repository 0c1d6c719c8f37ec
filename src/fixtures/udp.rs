//! UDP datagram sender for unicast, broadcast and multicast receivers.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// Multicast TTL used when none is given.
pub const DEFAULT_MULTICAST_TTL: u32 = 1;

/// How a datagram is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Unicast,
    Broadcast,
    Multicast { ttl: u32 },
}

impl FromStr for Delivery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unicast" => Ok(Delivery::Unicast),
            "broadcast" => Ok(Delivery::Broadcast),
            "multicast" => Ok(Delivery::Multicast {
                ttl: DEFAULT_MULTICAST_TTL,
            }),
            _ => Err(format!("Unknown delivery mode: {}", s)),
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Unicast => f.write_str("unicast"),
            Delivery::Broadcast => f.write_str("broadcast"),
            Delivery::Multicast { ttl } => write!(f, "multicast (ttl {})", ttl),
        }
    }
}

/// `[YYYY-MM-DD HH:MM:SS] <message>`
pub fn stamp_message<Tz: TimeZone>(message: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("[{}] {}", at.format("%Y-%m-%d %H:%M:%S"), message)
}

/// Unspecified local address of the same family as `target`.
fn local_bind_addr(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}

/// Open a UDP socket able to reach `target` the way `delivery` asks.
///
/// Broadcast is IPv4 only. Multicast requires a multicast `target`; the TTL
/// becomes `IP_MULTICAST_TTL` on IPv4 and `IPV6_MULTICAST_HOPS` on IPv6.
pub fn open_socket(target: SocketAddr, delivery: Delivery) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(target), Type::DGRAM, Some(Protocol::UDP))
        .context("Failed to create UDP socket")?;

    match (delivery, target.ip()) {
        (Delivery::Unicast, _) => {}
        (Delivery::Broadcast, IpAddr::V4(_)) => {
            socket
                .set_broadcast(true)
                .context("Failed to enable broadcast")?;
        }
        (Delivery::Broadcast, IpAddr::V6(_)) => {
            bail!("Broadcast is IPv4 only; use multicast for IPv6")
        }
        (Delivery::Multicast { ttl }, IpAddr::V4(ip)) => {
            if !ip.is_multicast() {
                bail!("{} is not a multicast address", ip);
            }
            socket
                .set_multicast_ttl_v4(ttl)
                .context("Failed to set multicast TTL")?;
        }
        (Delivery::Multicast { ttl }, IpAddr::V6(ip)) => {
            if !ip.is_multicast() {
                bail!("{} is not a multicast address", ip);
            }
            socket
                .set_multicast_hops_v6(ttl)
                .context("Failed to set multicast hop limit")?;
        }
    }

    socket
        .bind(&SockAddr::from(local_bind_addr(&target)))
        .context("Failed to bind UDP socket")?;
    Ok(socket.into())
}

/// Send `payload` as a single datagram to `target`.
///
/// Returns the number of bytes sent.
pub fn send_datagram(target: SocketAddr, delivery: Delivery, payload: &[u8]) -> Result<usize> {
    let socket = open_socket(target, delivery)?;
    let sent = socket
        .send_to(payload, target)
        .with_context(|| format!("Failed to send datagram to {}", target))?;
    log::info!("{} sent to {} ({} bytes)", delivery, target, sent);
    Ok(sent)
}
