// Copyright 2025
//! Command-line driver: parse arguments, set up the socket, join the group and
//! hand control to the read loop. Setup failures exit non-zero with their cause;
//! once the loop starts, only external termination ends the process.

use std::io;
use std::net::Ipv4Addr;

use anyhow::Context;
use clap::Parser;

use mcastwatch::{iface, open_socket, Listener, Membership, Reporter, SocketConfig};

const PROG: &str = "mcastwatch";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Joins an IPv4 multicast group and reports source, destination and \
             inbound interface for every datagram",
    after_help = "Example:\n  mcastwatch eth2 1.0.0.2 224.0.0.9 0.0.0.0 2000"
)]
struct Args {
    /// Interface to join the group on, by name
    #[arg(value_name = "interface")]
    interface: String,

    /// Interface address used for outgoing multicast traffic
    #[arg(value_name = "multicast_if_addr")]
    multicast_if_addr: Ipv4Addr,

    /// Multicast group address to join
    #[arg(value_name = "group")]
    group: Ipv4Addr,

    /// Local address to bind
    #[arg(value_name = "bind_addr")]
    bind_addr: Ipv4Addr,

    /// Local port to bind
    #[arg(value_name = "port")]
    port: u16,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut log_builder = env_logger::Builder::from_default_env();
    log_builder.filter_level(if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
    log_builder.init();

    // Resolve the join interface before any socket exists, so a bad interface
    // name fails fast with nothing to clean up.
    let ifindex = iface::index_of(&args.interface)
        .with_context(|| format!("could not find interface: {}", args.interface))?;
    log::debug!("interface {} has index {}", args.interface, ifindex);

    // The join is driven by the interface name; the multicast-if address only
    // selects the outgoing interface and may legitimately name a different one.
    log::debug!(
        "joining via {} (index {}), sending via {}",
        args.interface,
        ifindex,
        args.multicast_if_addr
    );

    let socket = open_socket(&SocketConfig {
        bind_addr: args.bind_addr,
        port: args.port,
        multicast_if: Some(args.multicast_if_addr),
    })
    .with_context(|| format!("could not bind socket to {}:{}", args.bind_addr, args.port))?;

    let membership = Membership::new(args.group, ifindex)
        .with_context(|| format!("bad group address: {}", args.group))?;
    membership
        .join(&socket)
        .with_context(|| format!("could not join group {} on {}", args.group, args.interface))?;

    println!("{PROG}: joined, reading...");

    Listener::new(socket, Reporter::new(PROG, io::stdout())).run()
}
