//! Sibling network fixtures behind subcommands:
//!
//! ```text
//! fixtures tcp-server <ip> <port>
//! fixtures tcp-client <ip> <port> [message]
//! fixtures udp-send <unicast|broadcast|multicast> <ip> <port> [message] [--ttl n]
//! fixtures http-echo [--host h] [--port p]
//! ```

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::process;

use anyhow::{bail, Context, Result};
use chrono::Local;

use multipart_fixture_server::args::{parse_args, OptionSpec, ParsedArgs};
use multipart_fixture_server::config::DEFAULT_CHUNK_SIZE;
use multipart_fixture_server::fixtures::tcp_echo::DEFAULT_MESSAGE;
use multipart_fixture_server::fixtures::udp::DEFAULT_MULTICAST_TTL;
use multipart_fixture_server::fixtures::{
    send_datagram, send_message, stamp_message, Delivery, TcpEchoServer,
};
use multipart_fixture_server::{EchoRouter, Server};

const ECHO_DEFAULT_HOST: &str = "127.0.0.1";
const ECHO_DEFAULT_PORT: u16 = 50010;

const FIXTURE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::single("ttl", &["t"]),
    OptionSpec::single("host", &["H"]),
    OptionSpec::single("port", &["p"]),
];

const USAGE: &str = "Usage:
  fixtures tcp-server <ip> <port>
  fixtures tcp-client <ip> <port> [message]
  fixtures udp-send <unicast|broadcast|multicast> <ip> <port> [message] [--ttl n]
  fixtures http-echo [--host h] [--port p]";

fn socket_addr(ip: &str, port: &str) -> Result<SocketAddr> {
    let ip: IpAddr = ip.parse().with_context(|| format!("Invalid IP address '{}'", ip))?;
    let port: u16 = port.parse().with_context(|| format!("Invalid port '{}'", port))?;
    Ok(SocketAddr::new(ip, port))
}

fn target(positionals: &[String]) -> Result<SocketAddr> {
    match positionals {
        [ip, port, ..] => socket_addr(ip, port),
        _ => bail!("Expected <ip> <port>\n{}", USAGE),
    }
}

fn run(parsed: &ParsedArgs) -> Result<()> {
    let (command, rest) = match parsed.positionals().split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => bail!("{}", USAGE),
    };

    match command {
        "tcp-server" => {
            let server = TcpEchoServer::start(target(rest)?)?;
            server.wait();
        }
        "tcp-client" => {
            let message = rest.get(2).map_or(DEFAULT_MESSAGE, |m| m.as_str());
            let reply = send_message(target(rest)?, message)?;
            println!("Received: {}", reply);
        }
        "udp-send" => {
            let (mode, addr) = match rest.split_first() {
                Some((mode, addr)) => (mode, addr),
                None => bail!("Expected a delivery mode\n{}", USAGE),
            };
            let mut delivery: Delivery = mode.parse().map_err(anyhow::Error::msg)?;
            if let Delivery::Multicast { ttl } = &mut delivery {
                *ttl = match parsed.get("ttl") {
                    Some(value) => value
                        .parse()
                        .with_context(|| format!("Invalid TTL '{}'", value))?,
                    None => DEFAULT_MULTICAST_TTL,
                };
            }
            let message = addr.get(2).map_or("Hello UDP!", |m| m.as_str());
            let payload = stamp_message(message, &Local::now());
            send_datagram(target(addr)?, delivery, payload.as_bytes())?;
            println!("Sent: {}", payload);
        }
        "http-echo" => {
            let host = parsed.get("host").unwrap_or(ECHO_DEFAULT_HOST);
            let port = match parsed.get("port") {
                Some(value) => value
                    .parse::<u16>()
                    .with_context(|| format!("Invalid port '{}'", value))?,
                None => ECHO_DEFAULT_PORT,
            };
            let addr = socket_addr(host, &port.to_string())?;
            let server = Server::start(addr, EchoRouter, DEFAULT_CHUNK_SIZE)?;
            log::info!("Serving HTTP echo on {}", server.addr());
            server.wait();
        }
        other => bail!("Unknown fixture '{}'\n{}", other, USAGE),
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let parsed = match parse_args(&args, FIXTURE_OPTIONS) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            process::exit(2);
        }
    };

    if let Err(e) = run(&parsed) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
