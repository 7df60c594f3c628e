// src/connection.rs

//! Client/server connections: a two-way, session-oriented pairing of channels.
//!
//! A client opens a session with a request. The server answers every request
//! with either [`reply`](Server::reply), which keeps the session open for
//! another request from the same client, or
//! [`reply_and_close`](Server::reply_and_close), which ends it. A [`Client`]
//! can be cloned; clones compete for sessions, and while one holds a session
//! the others block on their opening request.
//!
//! Dropping a client in the middle of a session frees the session for other
//! clones without telling the server. The next request the server receives
//! then opens a new session; [`Server::opened_session`] tells the two cases
//! apart.
//!
//! ```
//! use fibre_csp::connection;
//! use std::thread;
//!
//! let (client, server) = connection::new::<u32, u32>();
//! let worker = thread::spawn(move || {
//!   let n = server.request().unwrap();
//!   server.reply_and_close(n * n).unwrap();
//! });
//! assert_eq!(client.call(12).unwrap(), 144);
//! worker.join().unwrap();
//! ```

use crate::alt::{AltHandle, Guard};
use crate::buffer::Buffer;
use crate::channel::{ChannelBuilder, Receiver, Sender, SharedReceiver, SharedSender};
use crate::error::{ConnectionError, PoisonError};
use crate::internal::claim::Claim;
use crate::poison::Poisonable;

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

/// A client's request and whether it opens a new session.
#[derive(Debug)]
struct Request<T> {
  data: T,
  opening: bool,
}

/// A server's answer and whether the session stays open after it.
#[derive(Debug)]
struct Reply<T> {
  data: T,
  open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientPhase {
  Idle,
  Requested,
  Open,
}

impl ClientPhase {
  fn describe(self) -> &'static str {
    match self {
      ClientPhase::Idle => "closed",
      ClientPhase::Requested => "awaiting a reply",
      ClientPhase::Open => "open",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerPhase {
  Closed,
  Requested,
  Open,
}

impl ServerPhase {
  fn describe(self) -> &'static str {
    match self {
      ServerPhase::Closed => "closed",
      ServerPhase::Requested => "awaiting a reply",
      ServerPhase::Open => "open",
    }
  }
}

/// Creates a connection.
pub fn new<Req, Resp>() -> (Client<Req, Resp>, Server<Req, Resp>)
where
  Req: Send + 'static,
  Resp: Send + 'static,
{
  let (req_tx, req_rx) = ChannelBuilder::<Request<Req>>::new().store(Buffer::single()).any2one();
  let (resp_tx, resp_rx) = ChannelBuilder::<Reply<Resp>>::new().store(Buffer::single()).one2any();
  (
    Client {
      session: Arc::new(Claim::new()),
      phase: Cell::new(ClientPhase::Idle),
      requests: req_tx,
      replies: resp_rx,
    },
    Server {
      requests: req_rx,
      replies: resp_tx,
      phase: Cell::new(ServerPhase::Closed),
      opened: Cell::new(false),
    },
  )
}

/// The client end of a connection.
///
/// Dropping a client that holds a session releases the session to other
/// clones; the server is not notified.
pub struct Client<Req: Send + 'static, Resp: Send + 'static> {
  session: Arc<Claim>,
  phase: Cell<ClientPhase>,
  requests: SharedSender<Request<Req>>,
  replies: SharedReceiver<Reply<Resp>>,
}

impl<Req: Send + 'static, Resp: Send + 'static> Clone for Client<Req, Resp> {
  /// The clone shares the connection but not the session of this handle.
  fn clone(&self) -> Self {
    Self {
      session: Arc::clone(&self.session),
      phase: Cell::new(ClientPhase::Idle),
      requests: self.requests.clone(),
      replies: self.replies.clone(),
    }
  }
}

impl<Req: Send + 'static, Resp: Send + 'static> fmt::Debug for Client<Req, Resp> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Client").field("phase", &self.phase.get()).finish()
  }
}

impl<Req: Send + 'static, Resp: Send + 'static> Client<Req, Resp> {
  /// Sends a request, opening a session first if this handle has none.
  ///
  /// # Errors
  ///
  /// `OutOfOrder` if the previous request has not been answered yet;
  /// `Poisoned` if the connection is poisoned, which also ends the session.
  pub fn request(&self, data: Req) -> Result<(), ConnectionError> {
    let opening = match self.phase.get() {
      ClientPhase::Requested => return Err(self.out_of_order("request")),
      ClientPhase::Idle => {
        self.session.claim();
        true
      }
      ClientPhase::Open => false,
    };
    self.phase.set(ClientPhase::Requested);
    self
      .requests
      .write(Request { data, opening })
      .map_err(|e| self.abandon(e))
  }

  /// Receives the server's answer to the last request.
  pub fn reply(&self) -> Result<Resp, ConnectionError> {
    if self.phase.get() != ClientPhase::Requested {
      return Err(self.out_of_order("reply"));
    }
    let reply = self.replies.read().map_err(|e| self.abandon(e))?;
    if reply.open {
      self.phase.set(ClientPhase::Open);
    } else {
      self.end_session();
    }
    Ok(reply.data)
  }

  /// [`request`](Self::request) followed by [`reply`](Self::reply).
  pub fn call(&self, data: Req) -> Result<Resp, ConnectionError> {
    self.request(data)?;
    self.reply()
  }

  /// `true` while this handle holds a session.
  pub fn is_open(&self) -> bool {
    self.phase.get() != ClientPhase::Idle
  }

  pub fn poison(&self, strength: u32) {
    self.requests.poison(strength);
    self.replies.poison(strength);
  }

  fn out_of_order(&self, operation: &'static str) -> ConnectionError {
    ConnectionError::OutOfOrder {
      operation,
      state: self.phase.get().describe(),
    }
  }

  fn abandon(&self, error: PoisonError) -> ConnectionError {
    self.end_session();
    error.into()
  }

  fn end_session(&self) {
    if self.phase.replace(ClientPhase::Idle) != ClientPhase::Idle {
      self.session.release();
    }
  }
}

impl<Req: Send + 'static, Resp: Send + 'static> Drop for Client<Req, Resp> {
  fn drop(&mut self) {
    self.end_session();
  }
}

impl<Req: Send + 'static, Resp: Send + 'static> Poisonable for Client<Req, Resp> {
  fn poison(&self, strength: u32) {
    Client::poison(self, strength);
  }
}

/// The server end of a connection.
///
/// As a [`Guard`] it is ready when a client request is waiting.
pub struct Server<Req: Send + 'static, Resp: Send + 'static> {
  requests: Receiver<Request<Req>>,
  replies: Sender<Reply<Resp>>,
  phase: Cell<ServerPhase>,
  /// Whether the last request received opened a session.
  opened: Cell<bool>,
}

impl<Req: Send + 'static, Resp: Send + 'static> fmt::Debug for Server<Req, Resp> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Server")
      .field("phase", &self.phase.get())
      .field("opened", &self.opened.get())
      .finish()
  }
}

impl<Req: Send + 'static, Resp: Send + 'static> Server<Req, Resp> {
  /// Receives the next request of the current session, or the opening
  /// request of a new one.
  pub fn request(&self) -> Result<Req, ConnectionError> {
    if self.phase.get() == ServerPhase::Requested {
      return Err(self.out_of_order("request"));
    }
    let request = self.requests.read()?;
    if request.opening && self.phase.get() == ServerPhase::Open {
      tracing::debug!("client dropped its session; next request opens a new one");
    }
    self.opened.set(request.opening);
    self.phase.set(ServerPhase::Requested);
    Ok(request.data)
  }

  /// `true` if the request last received opened a new session rather than
  /// continuing the current one.
  pub fn opened_session(&self) -> bool {
    self.opened.get()
  }

  /// Answers the pending request and keeps the session open.
  pub fn reply(&self, data: Resp) -> Result<(), ConnectionError> {
    self.answer("reply", data, true)
  }

  /// Answers the pending request and ends the session.
  pub fn reply_and_close(&self, data: Resp) -> Result<(), ConnectionError> {
    self.answer("reply_and_close", data, false)
  }

  /// `true` while a session is in progress. Stays `true` after a client
  /// drops its session until the next request or `reply_and_close`.
  pub fn is_open(&self) -> bool {
    self.phase.get() != ServerPhase::Closed
  }

  pub fn poison(&self, strength: u32) {
    self.requests.poison(strength);
    self.replies.poison(strength);
  }

  fn answer(&self, operation: &'static str, data: Resp, open: bool) -> Result<(), ConnectionError> {
    if self.phase.get() != ServerPhase::Requested {
      return Err(self.out_of_order(operation));
    }
    self.replies.write(Reply { data, open })?;
    self.phase.set(if open { ServerPhase::Open } else { ServerPhase::Closed });
    Ok(())
  }

  fn out_of_order(&self, operation: &'static str) -> ConnectionError {
    ConnectionError::OutOfOrder {
      operation,
      state: self.phase.get().describe(),
    }
  }
}

impl<Req: Send + 'static, Resp: Send + 'static> Guard for Server<Req, Resp> {
  fn enable(&self, alt: &AltHandle) -> bool {
    self.requests.enable(alt)
  }

  fn disable(&self) -> bool {
    self.requests.disable()
  }
}

impl<Req: Send + 'static, Resp: Send + 'static> Poisonable for Server<Req, Resp> {
  fn poison(&self, strength: u32) {
    Server::poison(self, strength);
  }
}
