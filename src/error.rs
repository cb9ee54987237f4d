// Copyright 2025
//! Error taxonomy for the listener.
//!
//! Setup errors (interface resolution, bind, join) are fatal and bubble up to the
//! binary; receive errors are returned to the read loop, which reports them and
//! keeps going. System-call failures keep their errno so diagnostics can print the
//! numeric cause alongside the description.

use std::io;
use std::net::Ipv4Addr;

use nix::errno::Errno;
use thiserror::Error;

/// Errors produced by socket setup, interface resolution and the receive path.
#[derive(Debug, Error)]
pub enum ListenError {
    /// A socket-level operation failed (create, bind, join, sockopt).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A raw system call failed; carries the errno-style cause.
    #[error("{op} failed: errno={errno}: {desc}")]
    Sys {
        op: &'static str,
        errno: i32,
        desc: &'static str,
    },

    /// No active interface has this name.
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    /// No active interface has this index.
    #[error("no interface with index {0}")]
    IndexNotFound(u32),

    /// The group address given to the membership manager is not multicast.
    #[error("not a multicast address: {0}")]
    NotMulticast(Ipv4Addr),

    /// Name buffer capacity too small to hold even a one-byte name plus terminator.
    #[error("name buffer capacity {0} too small")]
    NameCapacity(usize),
}

impl ListenError {
    pub(crate) fn sys(op: &'static str, err: Errno) -> Self {
        ListenError::Sys {
            op,
            errno: err as i32,
            desc: err.desc(),
        }
    }
}
