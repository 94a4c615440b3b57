//! TCP listener and fixed worker pool.
//!
//! A single accept loop hands each connection to one of a small, fixed set
//! of worker threads over a **bounded** channel. When every worker is busy
//! and the queue is full, the accept loop blocks — explicit backpressure
//! instead of an unbounded backlog.
//!
//! Request interpretation is pluggable: the server only frames lines and
//! delegates each one to a [`RequestHandler`]. [`StoreProtocol`] is the
//! handler that maps a minimal text protocol onto the store contract.

mod protocol;

pub use protocol::StoreProtocol;

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use log::{info, warn};

use crate::common::config::HANDOFF_QUEUE_DEPTH;
use crate::common::Result;

/// Interprets requests on behalf of the server.
///
/// The server owns connection framing (one request per line); the handler
/// owns everything inside the line. Handlers run store operations to
/// completion before replying, so no lock is ever held across socket I/O.
pub trait RequestHandler: Send + Sync + 'static {
    /// Interpret one request line and produce the reply body, without the
    /// trailing newline.
    fn handle(&self, request: &str) -> String;
}

/// Blocking TCP server with a fixed worker pool.
///
/// # Scheduling
/// One worker serves one connection at a time, looping read-dispatch-write
/// until the client disconnects. `pool_size` workers bound the number of
/// concurrently served clients; further accepted connections wait in the
/// bounded hand-off queue, and beyond that the accept loop itself blocks.
///
/// # Usage
/// ```no_run
/// use std::sync::Arc;
/// use rosterdb::common::config::DEFAULT_POOL_SIZE;
/// use rosterdb::server::{StoreProtocol, TcpServer};
/// use rosterdb::EmployeeStore;
///
/// let store = Arc::new(EmployeeStore::new("roster.snapshot"));
/// let handler = Arc::new(StoreProtocol::new(store));
/// let server = TcpServer::bind("127.0.0.1:4700", handler, DEFAULT_POOL_SIZE)?;
/// server.run()?; // serves until the listener fails
/// # Ok::<(), rosterdb::Error>(())
/// ```
pub struct TcpServer {
    listener: TcpListener,
    handoff: Sender<TcpStream>,
    workers: Vec<JoinHandle<()>>,
}

impl TcpServer {
    /// Bind the listener and start `pool_size` worker threads.
    ///
    /// The workers idle on the hand-off channel until [`run`](Self::run)
    /// starts accepting.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn bind(
        addr: impl ToSocketAddrs,
        handler: Arc<dyn RequestHandler>,
        pool_size: usize,
    ) -> Result<Self> {
        assert!(pool_size > 0, "pool_size must be > 0");

        let listener = TcpListener::bind(addr)?;
        let (handoff, queue) = channel::bounded::<TcpStream>(HANDOFF_QUEUE_DEPTH);

        let mut workers = Vec::with_capacity(pool_size);
        for worker_id in 0..pool_size {
            let queue = queue.clone();
            let handler = Arc::clone(&handler);
            let worker = thread::Builder::new()
                .name(format!("rosterdb-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, queue, handler))?;
            workers.push(worker);
        }

        Ok(Self {
            listener,
            handoff,
            workers,
        })
    }

    /// The address the listener is bound to.
    ///
    /// Useful when binding to port 0 and asking the OS for a free port.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of worker threads.
    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    /// Accept connections until the listener fails.
    ///
    /// Each accepted socket is sent into the bounded hand-off channel; the
    /// send blocks while the pool and the queue are both saturated.
    pub fn run(&self) -> Result<()> {
        info!("listening on {}", self.local_addr()?);

        loop {
            let (stream, peer) = self.listener.accept()?;
            if self.handoff.send(stream).is_err() {
                // All workers are gone; nothing can serve this socket.
                warn!("worker pool shut down, dropping connection from {peer}");
                return Ok(());
            }
        }
    }
}

/// One worker: serve queued connections until the channel disconnects.
fn worker_loop(worker_id: usize, queue: Receiver<TcpStream>, handler: Arc<dyn RequestHandler>) {
    info!("worker {worker_id} started");
    for stream in queue {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        if let Err(err) = serve_connection(stream, handler.as_ref()) {
            warn!("worker {worker_id}: connection from {peer} ended with error: {err}");
        }
    }
}

/// Read-dispatch-write loop for one connection.
///
/// Returns `Ok(())` on clean disconnect (EOF). Blank lines are ignored.
fn serve_connection(stream: TcpStream, handler: &dyn RequestHandler) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(()); // EOF
        }
        let request = line.trim_end_matches(['\r', '\n']);
        if request.is_empty() {
            continue;
        }

        let reply = handler.handle(request);
        writer.write_all(reply.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes requests back uppercased.
    struct Shout;

    impl RequestHandler for Shout {
        fn handle(&self, request: &str) -> String {
            request.to_uppercase()
        }
    }

    fn start_server(pool_size: usize) -> (Arc<TcpServer>, SocketAddr) {
        let server = Arc::new(
            TcpServer::bind("127.0.0.1:0", Arc::new(Shout), pool_size).unwrap(),
        );
        let addr = server.local_addr().unwrap();
        let runner = Arc::clone(&server);
        thread::spawn(move || {
            let _ = runner.run();
        });
        (server, addr)
    }

    fn request(stream: &mut TcpStream, line: &str) -> String {
        stream.write_all(line.as_bytes()).unwrap();
        stream.write_all(b"\n").unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut reply = String::new();
        reader.read_line(&mut reply).unwrap();
        reply.trim_end().to_string()
    }

    #[test]
    fn test_request_reply_round_trip() {
        let (_server, addr) = start_server(2);
        let mut stream = TcpStream::connect(addr).unwrap();

        assert_eq!(request(&mut stream, "hello"), "HELLO");
        assert_eq!(request(&mut stream, "again"), "AGAIN");
    }

    #[test]
    fn test_more_clients_than_workers() {
        let (_server, addr) = start_server(1);

        // Sequential sessions reuse the single worker after each disconnect
        for i in 0..4 {
            let mut stream = TcpStream::connect(addr).unwrap();
            let msg = format!("client-{i}");
            assert_eq!(request(&mut stream, &msg), msg.to_uppercase());
            drop(stream); // frees the worker for the next client
        }
    }

    #[test]
    fn test_pool_size_reported() {
        let (server, _addr) = start_server(3);
        assert_eq!(server.pool_size(), 3);
    }
}
