//! TCP echo fixture: answers every message with a timestamped acknowledgment.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};

/// Bytes read from a client per receive call.
pub const RECV_BUFFER_SIZE: usize = 1024;

pub const DEFAULT_MESSAGE: &str = "Hello, TCP Server!";

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// `Message received at HH:MM:SS.`
pub fn ack_message<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Message received at {}.", at.format("%H:%M:%S"))
}

/// A running echo server.
#[derive(Debug)]
pub struct TcpEchoServer {
    addr: SocketAddr,
    shutdown_flag: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TcpEchoServer {
    pub fn start<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let listener = TcpListener::bind(&addr).context("Failed to bind to address")?;
        let local_addr = listener
            .local_addr()
            .context("Failed to get local address")?;
        listener
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown_flag);
        let thread_handle = thread::spawn(move || Self::run_accept_loop(listener, shutdown_clone));

        log::info!("TCP server started at {}", local_addr);

        Ok(TcpEchoServer {
            addr: local_addr,
            shutdown_flag,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            log::info!("TCP server stopped");
        }
    }

    /// Block the calling thread until the server stops.
    pub fn wait(mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    fn run_accept_loop(listener: TcpListener, shutdown_flag: Arc<AtomicBool>) {
        while !shutdown_flag.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    log::info!("Client connected: {}", peer_addr);
                    thread::spawn(move || {
                        if let Err(e) = Self::serve_client(stream, peer_addr) {
                            log::warn!("Error while communicating with {}: {:#}", peer_addr, e);
                        }
                    });
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
    }

    fn serve_client(mut stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        stream.set_nonblocking(false)?;
        let mut buffer = [0u8; RECV_BUFFER_SIZE];

        loop {
            let n = stream.read(&mut buffer).context("Failed to read")?;
            if n == 0 {
                log::info!("Client disconnected: {}", peer_addr);
                return Ok(());
            }

            log::info!(
                "Received from {}: {}",
                peer_addr,
                String::from_utf8_lossy(&buffer[..n])
            );

            stream
                .write_all(ack_message(&Local::now()).as_bytes())
                .context("Failed to send acknowledgment")?;
        }
    }
}

impl Drop for TcpEchoServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Connect, send one message, and return the single reply.
pub fn send_message<A: ToSocketAddrs>(addr: A, message: &str) -> Result<String> {
    let mut stream = TcpStream::connect(addr).context("Failed to connect")?;
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    log::info!("Connected to {}", stream.peer_addr()?);

    stream
        .write_all(message.as_bytes())
        .context("Failed to send message")?;
    log::info!("Sent: {}", message);

    let mut buffer = [0u8; RECV_BUFFER_SIZE];
    let n = stream.read(&mut buffer).context("Failed to read reply")?;
    Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
}
