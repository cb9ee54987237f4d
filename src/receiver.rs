// Copyright 2025
//! # Ancillary-Aware Receiver
//!
//! A single receive that recovers what a plain `recv_from` loses.
//!
//! On an unconnected socket bound to a wildcard address, a plain receive yields
//! only the payload and the sender: the original destination address and the
//! receiving interface are gone by the time user space sees the packet. Both can
//! be recovered from the `IP_PKTINFO` control message the kernel attaches to each
//! datagram once packet-info delivery has been enabled on the socket (see
//! [`crate::open_socket`]).
//!
//! Packet-info carries the destination *address* but never the destination
//! *port*, so the port is taken from the socket's own bound address instead.

use std::io::IoSliceMut;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::os::unix::io::AsRawFd;

use nix::sys::socket::{recvmsg, ControlMessageOwned, MsgFlags, SockaddrIn};

use crate::error::ListenError;

/// Control-buffer headroom per receive: one packet-info record plus kernel
/// framing, sized generously.
pub const CONTROL_CAPACITY: usize = 1024;

/// One received datagram with its recovered origin and destination.
///
/// Ephemeral: built fresh per receive, reported, then dropped. `ifindex` is
/// `None` whenever the kernel did not attach packet-info to the message; the
/// reporting path substitutes a placeholder rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram {
    /// Payload byte count; zero-length datagrams are valid.
    pub len: usize,
    /// Sender address and port.
    pub from: SocketAddrV4,
    /// Recovered destination. The address comes from packet-info when present,
    /// otherwise from the socket's bound address; the port always comes from the
    /// socket's bound address.
    pub to: SocketAddrV4,
    /// Inbound interface index, when packet-info was attached.
    pub ifindex: Option<u32>,
}

/// Receive one datagram, recovering sender, destination and inbound interface.
///
/// Blocks until a datagram arrives. The destination endpoint is pre-filled from
/// the socket's bound address; if that query fails the destination degrades to
/// `0.0.0.0:0` rather than failing the receive. The control-message chain is then
/// scanned for the first IP packet-info entry, which overwrites the destination
/// address and supplies the interface index. A chain without packet-info is not
/// an error, and neither is one that cannot be decoded (e.g. truncated control
/// data): the caller gets partial information either way.
///
/// A receive failure is returned unretried, carrying its errno cause; retry
/// policy belongs to the caller.
pub fn recv_from_to(socket: &UdpSocket, buf: &mut [u8]) -> Result<Datagram, ListenError> {
    recv_with_control(socket, buf, CONTROL_CAPACITY)
}

fn recv_with_control(
    socket: &UdpSocket,
    buf: &mut [u8],
    control_capacity: usize,
) -> Result<Datagram, ListenError> {
    let mut to = match socket.local_addr() {
        Ok(SocketAddr::V4(addr)) => addr,
        _ => SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
    };

    let mut iov = [IoSliceMut::new(buf)];
    let mut control = Vec::with_capacity(control_capacity);

    let msg = recvmsg::<SockaddrIn>(
        socket.as_raw_fd(),
        &mut iov,
        Some(&mut control),
        MsgFlags::empty(),
    )
    .map_err(|e| ListenError::sys("recvmsg", e))?;

    let from = msg
        .address
        .map(|sa| SocketAddrV4::new(sa.ip(), sa.port()))
        .unwrap_or_else(|| SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));

    let mut ifindex = None;
    match msg.cmsgs() {
        Ok(cmsgs) => {
            for cmsg in cmsgs {
                // Only one packet-info record is expected per datagram; first
                // match wins.
                if let ControlMessageOwned::Ipv4PacketInfo(pi) = cmsg {
                    to.set_ip(Ipv4Addr::from(u32::from_be(pi.ipi_addr.s_addr)));
                    ifindex = Some(pi.ipi_ifindex as u32);
                    break;
                }
            }
        }
        // Undecodable control data counts as absent packet-info; the datagram
        // itself was received and still gets reported.
        Err(e) => log::debug!("could not decode control messages: {e}"),
    }

    Ok(Datagram {
        len: msg.bytes,
        from,
        to,
        ifindex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iface;
    use crate::{open_socket, SocketConfig};
    use std::time::Duration;

    fn pktinfo_socket() -> (UdpSocket, SocketAddrV4) {
        let config = SocketConfig {
            bind_addr: Ipv4Addr::LOCALHOST,
            port: 0,
            multicast_if: None,
        };
        let socket = open_socket(&config).expect("Failed to open socket");
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("Failed to set read timeout");
        let addr = match socket.local_addr().expect("Failed to query bound address") {
            SocketAddr::V4(v4) => v4,
            other => panic!("unexpected bound address {other}"),
        };
        (socket, addr)
    }

    #[test]
    fn test_recover_destination_and_interface() {
        let (receiver, addr) = pktinfo_socket();

        let sender = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind sender");
        sender.send_to(b"hello", addr).expect("Failed to send");

        let mut buf = vec![0u8; 2048];
        let dgram = recv_from_to(&receiver, &mut buf).expect("Failed to receive");

        assert_eq!(dgram.len, 5);
        assert_eq!(
            SocketAddr::V4(dgram.from),
            sender.local_addr().expect("Failed to query sender address")
        );
        assert_eq!(dgram.to, addr);

        // Loopback traffic arrives on lo, and the index must resolve back to it.
        let ifindex = dgram.ifindex.expect("No packet-info attached");
        let lookup = iface::name_of(ifindex, 100).expect("Failed to resolve index");
        assert_eq!(lookup.as_str(), "lo");
    }

    #[test]
    fn test_zero_length_datagram() {
        let (receiver, addr) = pktinfo_socket();

        let sender = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind sender");
        sender.send_to(&[], addr).expect("Failed to send");

        let mut buf = vec![0u8; 64];
        let dgram = recv_from_to(&receiver, &mut buf).expect("Failed to receive");

        assert_eq!(dgram.len, 0);
        assert_eq!(dgram.to, addr);
        assert_eq!(*dgram.from.ip(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_degrades_on_truncated_control_data() {
        // Packet-info delivery is enabled, but the control buffer is too small
        // to hold the record. Whether the kernel truncates it away or leaves
        // undecodable control data, the datagram must still come back with the
        // pre-filled destination and an unknown interface, not an error.
        let (receiver, addr) = pktinfo_socket();

        let sender = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind sender");
        sender.send_to(b"short", addr).expect("Failed to send");

        let mut buf = vec![0u8; 64];
        let dgram = recv_with_control(&receiver, &mut buf, 1).expect("Failed to receive");

        assert_eq!(dgram.len, 5);
        assert_eq!(dgram.to, addr);
        assert_eq!(dgram.ifindex, None);
    }

    #[test]
    fn test_degrades_without_pktinfo() {
        // A socket that never enabled packet-info delivery still receives; the
        // destination falls back to the bound address and the interface stays
        // unknown.
        let receiver = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind receiver");
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("Failed to set read timeout");
        let addr = match receiver.local_addr().expect("Failed to query bound address") {
            SocketAddr::V4(v4) => v4,
            other => panic!("unexpected bound address {other}"),
        };

        let sender = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind sender");
        sender.send_to(b"plain", addr).expect("Failed to send");

        let mut buf = vec![0u8; 64];
        let dgram = recv_from_to(&receiver, &mut buf).expect("Failed to receive");

        assert_eq!(dgram.len, 5);
        assert_eq!(dgram.to, addr);
        assert_eq!(dgram.ifindex, None);
    }
}
