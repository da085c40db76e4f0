use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use tracing::{debug, info, warn};

/// Headers accepted per request before `may_minihttp` rejects it
pub const MAX_REQUEST_HEADERS: usize = 32;

/// Thin wrapper that starts a `may_minihttp` server for a service
pub struct HttpServer<T>(pub T);

/// Handle to a running server
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts TCP connections (up to ~250ms)
    ///
    /// # Errors
    ///
    /// `TimedOut` if nothing answers in time.
    pub fn wait_ready(&self) -> io::Result<()> {
        self.wait_ready_for(Duration::from_millis(250))
    }

    /// Same as [`wait_ready`](Self::wait_ready) with an explicit deadline
    ///
    /// # Errors
    ///
    /// `TimedOut` if nothing answers before `timeout` elapses.
    pub fn wait_ready_for(&self, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if TcpStream::connect(self.addr).is_ok() {
                debug!(addr = %self.addr, "Server ready");
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept loop and wait for it to finish
    pub fn stop(self) {
        // SAFETY: cancelling a coroutine we own; the accept loop holds no
        // state that outlives it.
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            warn!(addr = %self.addr, "Accept loop panicked during shutdown");
        }
        info!(addr = %self.addr, "Server stopped");
    }

    /// Block until the server exits on its own
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the accept loop panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start accepting connections
    ///
    /// # Errors
    ///
    /// Fails if the address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let handle = HttpServerWithHeaders::<_, MAX_REQUEST_HEADERS>(self.0).start(addr)?;
        info!(addr = %addr, "Server listening");
        Ok(ServerHandle { addr, handle })
    }
}
