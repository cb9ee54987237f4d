// Copyright 2025
//! # mcastwatch
//!
//! Joins an IPv4 multicast group on a named network interface and reports, for
//! every datagram received, the sender, the packet's original destination and
//! the local interface it arrived on.
//!
//! The destination and interface are not available from a plain receive on a
//! wildcard-bound socket; they are recovered from `IP_PKTINFO` ancillary data
//! the kernel attaches to each message (see [`receiver`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::io;
//! use std::net::Ipv4Addr;
//! use mcastwatch::{iface, open_socket, Listener, Membership, Reporter, SocketConfig};
//!
//! let ifindex = iface::index_of("eth0").expect("eth0 not found");
//!
//! let socket = open_socket(&SocketConfig {
//!     bind_addr: Ipv4Addr::UNSPECIFIED,
//!     port: 2000,
//!     multicast_if: None,
//! })
//! .expect("Failed to open socket");
//!
//! Membership::new(Ipv4Addr::new(224, 0, 0, 9), ifindex)
//!     .expect("not a multicast address")
//!     .join(&socket)
//!     .expect("Failed to join group");
//!
//! Listener::new(socket, Reporter::new("mcastwatch", io::stdout())).run();
//! ```

// IP_PKTINFO recovery and join-by-index are Linux socket surface.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("unsupported platform");

pub mod error;
pub mod iface;
pub mod listener;
pub mod membership;
pub mod receiver;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use nix::sys::socket::{setsockopt, sockopt};
use socket2::{Domain, Protocol, Socket, Type};

pub use error::ListenError;
pub use listener::{Listener, Reporter};
pub use membership::Membership;
pub use receiver::{recv_from_to, Datagram};

/// Local socket configuration for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConfig {
    /// Local address to bind; usually the wildcard address.
    pub bind_addr: Ipv4Addr,
    /// Local port to bind.
    pub port: u16,
    /// Outgoing multicast interface address, if sending is anticipated. This is
    /// independent of the join interface, which is named by index.
    pub multicast_if: Option<Ipv4Addr>,
}

/// Create, configure and bind the datagram socket a listener needs.
///
/// `SO_REUSEADDR` and `IP_PKTINFO` delivery are enabled best-effort: a failure
/// to set either is logged and tolerated, at the cost of degraded behavior
/// (without packet-info the receiver cannot recover destination or interface).
/// The bind itself is fatal.
pub fn open_socket(config: &SocketConfig) -> Result<UdpSocket, ListenError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("could not enable SO_REUSEADDR: {e}");
    }

    if let Err(e) = setsockopt(&socket, sockopt::Ipv4PacketInfo, &true) {
        log::warn!(
            "could not enable IP_PKTINFO delivery: {e}; \
             destination and interface recovery will degrade"
        );
    }

    if let Some(iface_addr) = config.multicast_if {
        if let Err(e) = socket.set_multicast_if_v4(&iface_addr) {
            log::warn!("could not set multicast send interface {iface_addr}: {e}");
        }
    }

    let bind = SocketAddr::V4(SocketAddrV4::new(config.bind_addr, config.port));
    socket.bind(&bind.into())?;

    Ok(socket.into())
}
