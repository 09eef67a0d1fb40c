//! Client Session
//!
//! Owns one transport and runs request/response round trips over it.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::BytesMut;

use crate::config::Config;
use crate::error::{Result, WireError};
use crate::protocol::{read_reply, write_command, Command, Reply};

/// Initial capacity of the reply buffer
const INITIAL_BUFFER_SIZE: usize = 4 * 1024;

/// A blocking client session
///
/// One command is in flight at a time. The session keeps a growing read
/// buffer so replies split across several socket reads are reassembled.
pub struct Session<T: Read + Write = TcpStream> {
    /// Underlying transport
    transport: T,

    /// Received bytes not yet decoded
    buffer: BytesMut,

    /// Buffered bytes allowed while waiting for one frame
    max_reply_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl Session<TcpStream> {
    /// Connect to `config.address` and authenticate if a credential is set
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = open_stream(config)?;

        // Disable Nagle's algorithm; every request is a single small write
        stream.set_nodelay(true)?;
        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| config.address.clone());
        tracing::debug!("Connected to {}", peer_addr);

        Self::handshake_with_peer(stream, config, peer_addr)
    }
}

impl<T: Read + Write> Session<T> {
    /// Wrap an already-open transport and authenticate if a credential is set
    pub fn handshake(transport: T, config: &Config) -> Result<Self> {
        Self::handshake_with_peer(transport, config, config.address.clone())
    }

    fn handshake_with_peer(transport: T, config: &Config, peer_addr: String) -> Result<Self> {
        let mut session = Self {
            transport,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            max_reply_size: config.max_reply_size,
            peer_addr,
        };

        if let Some(secret) = config.credential.as_deref() {
            session.authenticate(config.username.as_deref(), secret)?;
        }
        Ok(session)
    }

    /// Send AUTH and check the reply
    ///
    /// A Status reply is success. An Error reply is a denial. Any other reply
    /// type is reported separately, and codec failures stay protocol errors.
    pub fn authenticate(&mut self, username: Option<&str>, secret: &str) -> Result<()> {
        tracing::debug!("Authenticating with {}", self.peer_addr);

        match &self.execute(&Command::auth(username, secret))? {
            Reply::Status(_) => {
                tracing::debug!("Authenticated with {}", self.peer_addr);
                Ok(())
            }
            Reply::Error { message, .. } => {
                tracing::warn!("AUTH rejected by {}: {}", self.peer_addr, message);
                Err(WireError::AuthDenied(message.clone()))
            }
            other => {
                tracing::warn!(
                    "AUTH to {} answered with a {} reply",
                    self.peer_addr,
                    other.type_name()
                );
                Err(WireError::UnexpectedAuthReply(other.type_name()))
            }
        }
    }

    /// Send one command and wait for its reply
    ///
    /// A server error reply is returned as `Ok(Reply::Error { .. })`.
    /// On any failure the buffered bytes are discarded, so the next command
    /// reads fresh data from the transport.
    pub fn execute(&mut self, command: &Command) -> Result<Reply> {
        tracing::debug!("Sending {} to {}", command.name(), self.peer_addr);

        let result = write_command(&mut self.transport, command)
            .and_then(|()| read_reply(&mut self.transport, &mut self.buffer, self.max_reply_size));
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(
                    "Discarding {} buffered bytes from {} after error: {}",
                    self.buffer.len(),
                    self.peer_addr,
                    e
                );
                self.buffer.clear();
                return Err(e);
            }
        };

        tracing::trace!(
            "Received {} reply from {} ({} bytes left buffered)",
            reply.type_name(),
            self.peer_addr,
            self.buffer.len()
        );
        Ok(reply)
    }

    /// Build a command from `args` and execute it
    pub fn call<I, A>(&mut self, args: I) -> Result<Reply>
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        let command = Command::new(args)?;
        self.execute(&command)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

/// Resolve the configured address and connect to the first reachable one
fn open_stream(config: &Config) -> Result<TcpStream> {
    let addrs: Vec<_> = config
        .address
        .to_socket_addrs()
        .map_err(|e| WireError::Config(format!("invalid address {:?}: {}", config.address, e)))?
        .collect();

    if addrs.is_empty() {
        return Err(WireError::Config(format!(
            "address {:?} did not resolve",
            config.address
        )));
    }

    let mut last_err = None;
    for addr in addrs {
        let attempt = if config.connect_timeout_ms > 0 {
            TcpStream::connect_timeout(&addr, Duration::from_millis(config.connect_timeout_ms))
        } else {
            TcpStream::connect(addr)
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    // addrs was non-empty, so at least one attempt failed
    Err(last_err.map(WireError::Io).unwrap_or(WireError::ConnectionClosed))
}
