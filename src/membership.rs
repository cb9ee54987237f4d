// Copyright 2025
//! # Membership Manager
//!
//! Builds and issues the "join multicast group on interface X" request.
//!
//! A membership is created once at startup and held for the lifetime of the
//! socket; there is no leave/rejoin and exactly one group per run. The join names
//! the interface by kernel index, not by address, so multi-homed hosts join on
//! exactly the interface the operator asked for.

use std::net::{Ipv4Addr, UdpSocket};

use socket2::{InterfaceIndexOrAddress, SockRef};

use crate::error::ListenError;

/// A single multicast group membership: group address plus join interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    group: Ipv4Addr,
    ifindex: u32,
}

impl Membership {
    /// Describe a membership, rejecting non-multicast group addresses up front.
    pub fn new(group: Ipv4Addr, ifindex: u32) -> Result<Self, ListenError> {
        if !group.is_multicast() {
            return Err(ListenError::NotMulticast(group));
        }
        Ok(Membership { group, ifindex })
    }

    /// The group address this membership names.
    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    /// The index of the interface the join is issued on.
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Issue the join against an open, already-bound socket.
    ///
    /// Must be called exactly once, after the socket is bound and before the read
    /// loop starts; joining an unbound socket is outside the contract. Failure
    /// (interface without multicast support, duplicate membership) is fatal to the
    /// caller: a silent non-join would hang with no received traffic and no
    /// diagnostic.
    pub fn join(&self, socket: &UdpSocket) -> Result<(), ListenError> {
        SockRef::from(socket)
            .join_multicast_v4_n(&self.group, &InterfaceIndexOrAddress::Index(self.ifindex))?;
        Ok(())
    }
}
