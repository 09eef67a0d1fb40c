//! Tests for the client Session
//!
//! These tests verify:
//! - Command round trips over an in-memory transport
//! - Reassembly of replies split across many reads
//! - AUTH handshake outcomes
//! - EOF and size-limit handling

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use kvwire::protocol::{encode_reply, Command, Reply};
use kvwire::{Config, ProtocolError, Session, WireError};

// =============================================================================
// Helper Functions
// =============================================================================

/// Transport that hands out scripted chunks and records everything written
#[derive(Default)]
struct ScriptedTransport {
    incoming: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    reads: usize,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    /// Queue `bytes`, delivered `chunk` bytes per read
    fn reply_in_chunks(mut self, bytes: &[u8], chunk: usize) -> Self {
        for piece in bytes.chunks(chunk) {
            self.incoming.push_back(piece.to_vec());
        }
        self
    }

    fn reply(self, bytes: &[u8]) -> Self {
        let len = bytes.len().max(1);
        self.reply_in_chunks(bytes, len)
    }

    fn interrupt(mut self) -> Self {
        // An empty chunk marks an interrupted read
        self.incoming.push_back(Vec::new());
        self
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let Some(mut chunk) = self.incoming.pop_front() else {
            return Ok(0);
        };
        if chunk.is_empty() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            let rest = chunk.split_off(n);
            self.incoming.push_front(rest);
        }
        Ok(n)
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn no_auth() -> Config {
    Config::default()
}

fn with_auth(secret: &str) -> Config {
    Config::builder().credential(secret).build()
}

fn bulk(s: &str) -> Reply {
    Reply::Bulk(Some(s.as_bytes().to_vec()))
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_execute_writes_command_and_returns_reply() {
    let transport = ScriptedTransport::new().reply(b"+OK\r\n");
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let reply = session.call(vec!["SET", "k", "v"]).unwrap();

    assert_eq!(reply, Reply::Status("OK".to_string()));
    assert_eq!(
        session.get_ref().written,
        b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n"
    );
}

#[test]
fn test_no_auth_without_credential() {
    let transport = ScriptedTransport::new();
    let session = Session::handshake(transport, &no_auth()).unwrap();
    assert!(session.get_ref().written.is_empty());
}

#[test]
fn test_server_error_reply_is_ok() {
    let transport = ScriptedTransport::new().reply(b"-ERR unknown command 'NOPE'\r\n");
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let reply = session.call(vec!["NOPE"]).unwrap();

    assert!(reply.is_error());
    assert_eq!(reply.to_string(), "(error) ERR unknown command 'NOPE'");
}

#[test]
fn test_empty_command_rejected_before_write() {
    let transport = ScriptedTransport::new();
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let result = session.call(Vec::<String>::new());

    assert!(matches!(
        result,
        Err(WireError::Protocol(ProtocolError::InvalidCommand))
    ));
    assert!(session.get_ref().written.is_empty());
}

// =============================================================================
// Resumable Read Tests
// =============================================================================

#[test]
fn test_reply_split_into_single_bytes() {
    let expected = Reply::Array(Some(vec![
        bulk("foo"),
        Reply::Array(Some(vec![Reply::Integer(1), Reply::Bulk(None)])),
        Reply::Status("done".to_string()),
    ]));
    let wire = encode_reply(&expected);
    let transport = ScriptedTransport::new().reply_in_chunks(&wire, 1);
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let reply = session.call(vec!["WHATEVER"]).unwrap();

    assert_eq!(reply, expected);
    assert_eq!(session.get_ref().reads, wire.len());
}

#[test]
fn test_bulk_larger_than_one_read_chunk() {
    let payload = vec![b'x'; 10_000];
    let expected = Reply::Bulk(Some(payload));
    let transport = ScriptedTransport::new().reply(&encode_reply(&expected));
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let reply = session.call(vec!["GET", "big"]).unwrap();

    assert_eq!(reply, expected);
}

#[test]
fn test_interrupted_read_is_retried() {
    let transport = ScriptedTransport::new()
        .reply(b"$5\r\nhel")
        .interrupt()
        .reply(b"lo\r\n");
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    assert_eq!(session.call(vec!["GET", "k"]).unwrap(), bulk("hello"));
}

#[test]
fn test_large_array_read_in_growing_chunks() {
    let items: Vec<Reply> = (0..100_000).map(Reply::Integer).collect();
    let expected = Reply::Array(Some(items));
    let wire = encode_reply(&expected);
    let transport = ScriptedTransport::new().reply(&wire);
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let reply = session.call(vec!["LRANGE", "l", "0", "-1"]).unwrap();

    assert!(reply == expected);
    // Fixed 1 KiB reads would take wire.len() / 1024 calls
    assert!(wire.len() / 1024 > 700);
    assert!(session.get_ref().reads < 40, "reads: {}", session.get_ref().reads);
}

#[test]
fn test_leftover_bytes_serve_next_command() {
    // Both replies arrive in one read
    let transport = ScriptedTransport::new().reply(b":1\r\n:2\r\n");
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    assert_eq!(session.call(vec!["INCR", "a"]).unwrap(), Reply::Integer(1));
    assert_eq!(session.call(vec!["INCR", "a"]).unwrap(), Reply::Integer(2));
    assert_eq!(session.get_ref().reads, 1);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_eof_before_reply_is_connection_closed() {
    let transport = ScriptedTransport::new();
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let result = session.call(vec!["PING"]);

    assert!(matches!(result, Err(WireError::ConnectionClosed)));
}

#[test]
fn test_eof_mid_frame_is_truncated() {
    let transport = ScriptedTransport::new().reply(b"$10\r\nabc");
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let result = session.call(vec!["GET", "k"]);

    assert!(matches!(
        result,
        Err(WireError::Protocol(ProtocolError::TruncatedFrame))
    ));
}

#[test]
fn test_protocol_violation_surfaces() {
    let transport = ScriptedTransport::new().reply(b"?what\r\n");
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let result = session.call(vec!["PING"]);

    assert!(matches!(
        result,
        Err(WireError::Protocol(ProtocolError::UnknownReplyType(b'?')))
    ));
}

#[test]
fn test_reply_size_limit() {
    let transport = ScriptedTransport::new().reply(b"$100000\r\nabcdefgh");
    let config = Config::builder().max_reply_size(8).build();
    let mut session = Session::handshake(transport, &config).unwrap();

    let result = session.call(vec!["GET", "k"]);

    assert!(matches!(result, Err(WireError::ReplyTooLarge { limit: 8 })));
}

#[test]
fn test_session_recovers_after_protocol_error() {
    let transport = ScriptedTransport::new().reply(b"?bad\r\n").reply(b"+PONG\r\n");
    let mut session = Session::handshake(transport, &no_auth()).unwrap();

    let first = session.call(vec!["PING"]);
    assert!(matches!(
        first,
        Err(WireError::Protocol(ProtocolError::UnknownReplyType(b'?')))
    ));

    let second = session.call(vec!["PING"]).unwrap();
    assert_eq!(second, Reply::Status("PONG".to_string()));
}

#[test]
fn test_session_recovers_after_reply_too_large() {
    let transport = ScriptedTransport::new().reply(b"$1000\r\na").reply(b"+PONG\r\n");
    let config = Config::builder().max_reply_size(8).build();
    let mut session = Session::handshake(transport, &config).unwrap();

    let first = session.call(vec!["GET", "k"]);
    assert!(matches!(first, Err(WireError::ReplyTooLarge { limit: 8 })));

    let second = session.call(vec!["PING"]).unwrap();
    assert_eq!(second, Reply::Status("PONG".to_string()));
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[test]
fn test_auth_success() {
    let transport = ScriptedTransport::new().reply(b"+OK\r\n").reply(b"+PONG\r\n");
    let mut session = Session::handshake(transport, &with_auth("admin")).unwrap();

    let reply = session.call(vec!["PING"]).unwrap();

    assert_eq!(reply, Reply::Status("PONG".to_string()));
    let mut expected = Command::auth(None, "admin").encode();
    expected.extend_from_slice(b"*1\r\n$4\r\nPING\r\n");
    assert_eq!(session.get_ref().written, expected);
}

#[test]
fn test_auth_with_username() {
    let transport = ScriptedTransport::new().reply(b"+OK\r\n");
    let config = Config::builder().username("bob").credential("pw").build();
    let session = Session::handshake(transport, &config).unwrap();

    assert_eq!(
        session.get_ref().written,
        b"*3\r\n$4\r\nAUTH\r\n$3\r\nbob\r\n$2\r\npw\r\n"
    );
}

#[test]
fn test_auth_denied() {
    let transport = ScriptedTransport::new().reply(b"-WRONGPASS invalid username-password pair\r\n");

    let result = Session::handshake(transport, &with_auth("bad"));

    match result {
        Err(WireError::AuthDenied(message)) => {
            assert_eq!(message, "WRONGPASS invalid username-password pair");
        }
        Err(e) => panic!("Expected AuthDenied, got {}", e),
        Ok(_) => panic!("Expected AuthDenied, got a session"),
    }
}

#[test]
fn test_auth_unexpected_reply_type() {
    let transport = ScriptedTransport::new().reply(b":1\r\n");

    let result = Session::handshake(transport, &with_auth("admin"));

    assert!(matches!(result, Err(WireError::UnexpectedAuthReply("integer"))));
}

#[test]
fn test_auth_garbage_is_protocol_error_not_denial() {
    let transport = ScriptedTransport::new().reply(b"%1\r\n");

    let result = Session::handshake(transport, &with_auth("admin"));

    assert!(matches!(
        result,
        Err(WireError::Protocol(ProtocolError::UnknownReplyType(b'%')))
    ));
}

#[test]
fn test_auth_reply_split_across_reads() {
    let transport = ScriptedTransport::new().reply_in_chunks(b"+OK\r\n", 2);
    assert!(Session::handshake(transport, &with_auth("admin")).is_ok());
}
