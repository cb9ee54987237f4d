// Copyright 2025
//! # Read Loop
//!
//! Drives the receiver forever and reports one line per datagram.
//!
//! Receive errors are transient here: a single malformed control message must not
//! kill a long-running listener, so failures are logged with their errno cause
//! and the loop keeps going. The loop never terminates on its own; only external
//! process termination ends it.

use std::io::Write;
use std::net::UdpSocket;

use crate::error::ListenError;
use crate::iface::{self, NameLookup};
use crate::receiver::{recv_from_to, Datagram};

/// Payload buffer size, reused across iterations.
const RECV_BUFFER_SIZE: usize = 10000;

/// Byte budget for display-side interface name resolution.
const IFNAME_CAPACITY: usize = 100;

/// Printed when the inbound interface cannot be resolved.
const IFNAME_PLACEHOLDER: &str = "ifname?";

/// Writes report lines for received datagrams.
///
/// The program name used as the line prefix is explicit configuration, passed in
/// by the caller rather than read from process-wide state.
pub struct Reporter<W: Write> {
    prog: String,
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(prog: impl Into<String>, out: W) -> Self {
        Reporter {
            prog: prog.into(),
            out,
        }
    }

    /// The configured program name.
    pub fn prog(&self) -> &str {
        &self.prog
    }

    /// Emit one report line for a received datagram.
    pub fn datagram(&mut self, dgram: &Datagram, ifname: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", format_report(&self.prog, dgram, ifname))?;
        self.out.flush()
    }
}

/// Format one report line.
///
/// An unknown inbound interface is printed as `ifindex=-1`, matching the
/// sentinel convention of the placeholder name.
pub fn format_report(prog: &str, dgram: &Datagram, ifname: &str) -> String {
    let ifindex = dgram.ifindex.map(i64::from).unwrap_or(-1);
    format!(
        "{}: read {} bytes from {} to {} on {} ifindex={}",
        prog, dgram.len, dgram.from, dgram.to, ifname, ifindex
    )
}

/// The top-level driver: receiver plus reporter plus a reusable payload buffer.
pub struct Listener<W: Write> {
    socket: UdpSocket,
    reporter: Reporter<W>,
    buf: Vec<u8>,
}

impl<W: Write> Listener<W> {
    pub fn new(socket: UdpSocket, reporter: Reporter<W>) -> Self {
        Listener {
            socket,
            reporter,
            buf: vec![0u8; RECV_BUFFER_SIZE],
        }
    }

    /// Receive and report exactly one datagram.
    ///
    /// Interface resolution misses are tolerated with a placeholder; only the
    /// receive itself (or a failed write to the report sink) surfaces as an
    /// error.
    pub fn poll_once(&mut self) -> Result<(), ListenError> {
        let dgram = recv_from_to(&self.socket, &mut self.buf)?;

        let lookup = dgram
            .ifindex
            .and_then(|index| iface::name_of(index, IFNAME_CAPACITY).ok());
        let ifname = match &lookup {
            Some(NameLookup::Full(name)) | Some(NameLookup::Truncated(name)) => name.as_str(),
            None => IFNAME_PLACEHOLDER,
        };

        self.reporter.datagram(&dgram, ifname)?;
        Ok(())
    }

    /// Run forever, reporting each datagram and logging receive errors.
    pub fn run(&mut self) -> ! {
        loop {
            if let Err(e) = self.poll_once() {
                log::error!("{}: {}", self.reporter.prog(), e);
            }
        }
    }
}
