//! HTTP server streaming responses in bounded-size chunks.

use std::io::{self, BufReader};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{ServerConfig, DEFAULT_CHUNK_SIZE};
use crate::handlers::{Handler, MultipartRouter};
use crate::http::{parse_request, HttpMethod, HttpResponse};

/// How long to wait for in-flight requests to complete during shutdown.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(50);

/// How often to poll for new connections in non-blocking accept loop.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const PERSISTENT_CONNECTION_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of incoming connections for the accept loop.
///
/// Must not block; `WouldBlock` means nothing is pending.
trait Accept: Send + 'static {
    fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

impl Accept for TcpListener {
    fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self)
    }
}

/// A running HTTP server that can be gracefully shut down.
#[derive(Debug)]
pub struct Server {
    /// The address the server is bound to
    addr: SocketAddr,
    /// Shutdown flag shared with the server thread
    shutdown_flag: Arc<AtomicBool>,
    /// Handle to the server thread (None after shutdown)
    thread_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Start serving `handler` on `addr`.
    ///
    /// Response bodies are written in pieces of at most `chunk_size` bytes.
    /// Fails if the address cannot be bound.
    pub fn start<A, H>(addr: A, handler: H, chunk_size: usize) -> Result<Self>
    where
        A: ToSocketAddrs,
        H: Handler,
    {
        let listener = TcpListener::bind(&addr).context("Failed to bind to address")?;

        let local_addr = listener
            .local_addr()
            .context("Failed to get local address")?;

        listener
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;

        let server = Self::spawn(listener, local_addr, handler, chunk_size);
        log::info!("Server listening on {}", local_addr);
        Ok(server)
    }

    /// Run the accept loop for `listener` on its own thread.
    fn spawn<L: Accept, H: Handler>(
        listener: L,
        addr: SocketAddr,
        handler: H,
        chunk_size: usize,
    ) -> Self {
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let shutdown_clone = Arc::clone(&shutdown_flag);
        let handler = Arc::new(handler);
        let thread_handle = thread::spawn(move || {
            Self::run_accept_loop(listener, handler, chunk_size, shutdown_clone);
        });

        Server {
            addr,
            shutdown_flag,
            thread_handle: Some(thread_handle),
        }
    }

    /// Start the multipart server described by `config`.
    pub fn start_multipart(config: &ServerConfig) -> Result<Self> {
        let router = MultipartRouter::new(Arc::clone(&config.parts));
        let server = Self::start(config.bind_addr(), router, config.chunk_size)?;
        log::info!(
            "Serving multipart response on http://{}/ with {} part(s)",
            server.addr(),
            config.parts.len()
        );
        Ok(server)
    }

    /// Start a server that binds to an OS-assigned free port.
    ///
    /// Useful for testing when you need dynamic port allocation.
    pub fn start_with_dynamic_port<H: Handler>(handler: H) -> Result<Self> {
        Self::start("127.0.0.1:0", handler, DEFAULT_CHUNK_SIZE)
    }

    /// Get the address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the port number the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Initiate graceful shutdown and wait for the server to stop.
    ///
    /// This sets the shutdown flag and waits for the accept loop to exit.
    /// Safe to call multiple times.
    pub fn shutdown(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            thread::sleep(SHUTDOWN_GRACE_PERIOD);
            let _ = handle.join();
        }
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Block the calling thread until the server stops.
    pub fn wait(mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    /// The main accept loop - runs in a separate thread.
    ///
    /// Only a shutdown request ends it. Accept failures such as running out
    /// of file descriptors are logged and retried after a short pause.
    fn run_accept_loop<L: Accept, H: Handler>(
        listener: L,
        handler: Arc<H>,
        chunk_size: usize,
        shutdown_flag: Arc<AtomicBool>,
    ) {
        loop {
            if shutdown_flag.load(Ordering::SeqCst) {
                log::debug!("Server shutdown requested");
                break;
            }

            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    log::debug!("Accepted connection from {}", peer_addr);
                    let handler = Arc::clone(&handler);
                    thread::spawn(move || {
                        Self::handle_connection(stream, peer_addr, &*handler, chunk_size);
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
        log::debug!("Server accept loop terminated");
    }

    fn handle_connection<H: Handler>(
        stream: TcpStream,
        peer_addr: SocketAddr,
        handler: &H,
        chunk_size: usize,
    ) {
        match Self::process_requests(stream, peer_addr, handler, chunk_size) {
            Ok(()) => log::debug!("Connection from {} closed", peer_addr),
            Err(e) => log::warn!("Connection from {} aborted: {:#}", peer_addr, e),
        }
    }

    fn process_requests<H: Handler>(
        mut stream: TcpStream,
        peer_addr: SocketAddr,
        handler: &H,
        chunk_size: usize,
    ) -> Result<()> {
        // Accepted sockets may inherit non-blocking mode from the listener.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(PERSISTENT_CONNECTION_READ_TIMEOUT))?;
        let local_addr = stream.local_addr().context("Failed to get local address")?;
        let mut reader = BufReader::new(stream.try_clone().context("Failed to clone stream")?);

        loop {
            let request = match parse_request(&mut reader) {
                Ok(Some(request)) => request
                    .with_peer_addr(peer_addr)
                    .with_local_addr(local_addr),
                Ok(None) => break,
                Err(e) if is_idle_timeout(&e) => {
                    log::debug!("Idle connection from {} timed out", peer_addr);
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    log::debug!("Bad request from {}: {}", peer_addr, e);
                    let mut response = HttpResponse::bad_request();
                    response.headers.insert("Connection", "close");
                    // The connection is closed either way.
                    let _ = response.write_chunked(&mut stream, chunk_size, true);
                    break;
                }
                Err(e) => return Err(e).context("Failed to read request"),
            };

            log::debug!("{} {} from {}", request.method, request.uri, peer_addr);
            let keep_alive = request.keep_alive();
            let mut response = handler.handle(&request);
            if !keep_alive {
                response.headers.insert("Connection", "close");
            }

            let include_body = request.method != HttpMethod::Head;
            let sent = response
                .write_chunked(&mut stream, chunk_size, include_body)
                .with_context(|| {
                    format!(
                        "Client went away while streaming {} bytes for {}",
                        response.body.len(),
                        request.uri
                    )
                })?;
            log::debug!("Sent {} {} ({} body bytes)", response.status, request.uri, sent);

            if !keep_alive {
                break;
            }
        }
        Ok(())
    }
}

fn is_idle_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}
