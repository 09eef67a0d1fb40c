//! Protocol codec
//!
//! Encoding and decoding functions for the RESP wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! An array of bulk strings, one per argument:
//! ```text
//! *<argc>\r\n
//! $<len(arg0)>\r\n<arg0>\r\n
//! $<len(arg1)>\r\n<arg1>\r\n
//! ...
//! ```
//!
//! ### Reply Format
//! The first byte selects the reply type:
//! ```text
//! ┌──────┬──────────────────────────────┬─────────────────────────┐
//! │ Byte │ Frame                        │ Null form               │
//! ├──────┼──────────────────────────────┼─────────────────────────┤
//! │  +   │ +<text>\r\n                  │                         │
//! │  -   │ -<text>\r\n                  │                         │
//! │  :   │ :<int>\r\n                   │                         │
//! │  $   │ $<len>\r\n<payload>\r\n      │ $-1\r\n                 │
//! │  *   │ *<count>\r\n<count frames>   │ *-1\r\n                 │
//! └──────┴──────────────────────────────┴─────────────────────────┘
//! ```
//!
//! The pure functions here never touch a socket. [`read_reply`] and
//! [`write_command`] are thin stream helpers on top of them.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{ProtocolError, Result, WireError};
use super::{Command, Reply};

/// Field terminator
pub const CRLF: &[u8; 2] = b"\r\n";

/// Smallest read requested from the transport
pub const READ_CHUNK_SIZE: usize = 1024;

/// Largest single read requested from the transport
pub const MAX_READ_CHUNK_SIZE: usize = 64 * 1024;

const STATUS: u8 = b'+';
const ERROR: u8 = b'-';
const INTEGER: u8 = b':';
const BULK: u8 = b'$';
const ARRAY: u8 = b'*';

/// Smallest possible frame (`+\r\n`), used to bound array preallocation
const MIN_FRAME_SIZE: usize = 3;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode an argument list as a request frame
///
/// Lengths are raw byte lengths, so arguments may contain CR/LF or any
/// other bytes.
pub fn encode_command<A: AsRef<[u8]>>(args: &[A]) -> std::result::Result<Vec<u8>, ProtocolError> {
    if args.is_empty() {
        return Err(ProtocolError::InvalidCommand);
    }
    Ok(write_bulk_array(args))
}

pub(crate) fn write_bulk_array<A: AsRef<[u8]>>(args: &[A]) -> Vec<u8> {
    let payload: usize = args.iter().map(|a| a.as_ref().len() + 16).sum();
    let mut out = Vec::with_capacity(16 + payload);

    put_header(&mut out, ARRAY, args.len() as i64);
    for arg in args {
        put_bulk(&mut out, arg.as_ref());
    }
    out
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Result of decoding one frame header
enum Frame {
    /// A complete scalar (or null / empty array) reply
    Done(Reply),

    /// An array header announcing this many sub-frames (always > 0)
    Array(usize),
}

/// An array whose elements are still being decoded
struct PendingArray {
    expected: usize,
    items: Vec<Reply>,
}

/// Decode one reply from the front of `buf`
///
/// Returns the reply and the number of bytes it occupied. Bytes after the
/// frame are left alone, so callers can decode back-to-back frames by
/// slicing past `consumed`.
///
/// `TruncatedFrame` means the buffer holds a valid prefix of a frame; the
/// caller should append more bytes and decode again from the same start.
///
/// Nested arrays are walked with an explicit stack rather than recursion,
/// so depth is limited by the buffer, not the thread stack.
pub fn decode_reply(buf: &[u8]) -> std::result::Result<(Reply, usize), ProtocolError> {
    let mut pending: Vec<PendingArray> = Vec::new();
    let mut offset = 0;

    loop {
        let (frame, used) = decode_frame(&buf[offset..])?;
        offset += used;

        let mut reply = match frame {
            Frame::Done(reply) => reply,
            Frame::Array(expected) => {
                let capacity = expected.min((buf.len() - offset) / MIN_FRAME_SIZE);
                pending.push(PendingArray {
                    expected,
                    items: Vec::with_capacity(capacity),
                });
                continue;
            }
        };

        // Fold the finished reply into its parents, closing every array
        // that is now full.
        loop {
            let Some(parent) = pending.last_mut() else {
                return Ok((reply, offset));
            };
            parent.items.push(reply);
            if parent.items.len() < parent.expected {
                break;
            }
            let items = std::mem::take(&mut parent.items);
            pending.pop();
            reply = Reply::Array(Some(items));
        }
    }
}

/// Decode the frame starting at `buf[0]`, without descending into arrays
fn decode_frame(buf: &[u8]) -> std::result::Result<(Frame, usize), ProtocolError> {
    let Some(&tag) = buf.first() else {
        return Err(ProtocolError::TruncatedFrame);
    };

    match tag {
        STATUS => {
            let (line, used) = read_line(buf)?;
            let text = String::from_utf8_lossy(line).into_owned();
            Ok((Frame::Done(Reply::Status(text)), used))
        }
        ERROR => {
            let (line, used) = read_line(buf)?;
            let message = String::from_utf8_lossy(line).into_owned();
            Ok((Frame::Done(Reply::error(message)), used))
        }
        INTEGER => {
            let (line, used) = read_line(buf)?;
            let value = parse_integer(line)?;
            Ok((Frame::Done(Reply::Integer(value)), used))
        }
        BULK => {
            let (line, header_len) = read_line(buf)?;
            let Some(len) = parse_length(line)? else {
                return Ok((Frame::Done(Reply::Bulk(None)), header_len));
            };

            let payload_end = header_len
                .checked_add(len)
                .ok_or(ProtocolError::TruncatedFrame)?;
            let frame_end = payload_end
                .checked_add(CRLF.len())
                .ok_or(ProtocolError::TruncatedFrame)?;
            if buf.len() < frame_end {
                return Err(ProtocolError::TruncatedFrame);
            }
            if &buf[payload_end..frame_end] != CRLF {
                return Err(ProtocolError::MissingTerminator);
            }

            let payload = buf[header_len..payload_end].to_vec();
            Ok((Frame::Done(Reply::Bulk(Some(payload))), frame_end))
        }
        ARRAY => {
            let (line, header_len) = read_line(buf)?;
            let frame = match parse_length(line)? {
                None => Frame::Done(Reply::Array(None)),
                Some(0) => Frame::Done(Reply::Array(Some(Vec::new()))),
                Some(count) => Frame::Array(count),
            };
            Ok((frame, header_len))
        }
        other => Err(ProtocolError::UnknownReplyType(other)),
    }
}

/// Bytes between the type byte and the first CRLF, plus the line's total size
fn read_line(buf: &[u8]) -> std::result::Result<(&[u8], usize), ProtocolError> {
    let body = &buf[1..];
    let end = body
        .windows(CRLF.len())
        .position(|w| w == CRLF)
        .ok_or(ProtocolError::TruncatedFrame)?;
    Ok((&body[..end], 1 + end + CRLF.len()))
}

fn parse_integer(line: &[u8]) -> std::result::Result<i64, ProtocolError> {
    parse_decimal(line)
        .ok_or_else(|| ProtocolError::MalformedInteger(String::from_utf8_lossy(line).into_owned()))
}

/// Parse a bulk length or array count; `-1` is the null marker
fn parse_length(line: &[u8]) -> std::result::Result<Option<usize>, ProtocolError> {
    let malformed = || ProtocolError::MalformedLength(String::from_utf8_lossy(line).into_owned());

    match parse_decimal(line).ok_or_else(malformed)? {
        -1 => Ok(None),
        v if v < 0 => Err(malformed()),
        v => usize::try_from(v).map(Some).map_err(|_| malformed()),
    }
}

/// Base-10 `i64` with an optional leading `-` only
fn parse_decimal(line: &[u8]) -> Option<i64> {
    if line.first() == Some(&b'+') {
        return None;
    }
    std::str::from_utf8(line).ok()?.parse().ok()
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Serialize a reply in the server direction
///
/// Status and error text must not contain CR or LF.
pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    let mut out = Vec::new();
    let mut open = vec![std::slice::from_ref(reply).iter()];

    while let Some(iter) = open.last_mut() {
        let Some(item) = iter.next() else {
            open.pop();
            continue;
        };
        match item {
            Reply::Status(text) => put_line(&mut out, STATUS, text.as_bytes()),
            Reply::Error { message, .. } => put_line(&mut out, ERROR, message.as_bytes()),
            Reply::Integer(value) => put_header(&mut out, INTEGER, *value),
            Reply::Bulk(None) => put_header(&mut out, BULK, -1),
            Reply::Bulk(Some(bytes)) => put_bulk(&mut out, bytes),
            Reply::Array(None) => put_header(&mut out, ARRAY, -1),
            Reply::Array(Some(items)) => {
                put_header(&mut out, ARRAY, items.len() as i64);
                open.push(items.iter());
            }
        }
    }
    out
}

fn put_line(out: &mut Vec<u8>, tag: u8, line: &[u8]) {
    out.put_u8(tag);
    out.put_slice(line);
    out.put_slice(CRLF);
}

fn put_header(out: &mut Vec<u8>, tag: u8, value: i64) {
    put_line(out, tag, value.to_string().as_bytes());
}

fn put_bulk(out: &mut Vec<u8>, bytes: &[u8]) {
    put_header(out, BULK, bytes.len() as i64);
    out.put_slice(bytes);
    out.put_slice(CRLF);
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&command.encode())?;
    writer.flush()?;
    Ok(())
}

/// Tracks how much of a partially received frame is already known complete
///
/// Sub-frames that were fully scanned are not looked at again when more
/// bytes arrive, so reading a large reply costs time linear in its size.
#[derive(Default)]
struct FrameScanner {
    /// Start of the first sub-frame not yet seen complete
    offset: usize,

    /// Sub-frames still owed to each open array, innermost last
    open: Vec<usize>,
}

impl FrameScanner {
    /// Length of the complete frame at the front of `buf`, if it has arrived
    fn scan(&mut self, buf: &[u8]) -> std::result::Result<Option<usize>, ProtocolError> {
        loop {
            let (frame, used) = match decode_frame(&buf[self.offset..]) {
                Ok(decoded) => decoded,
                Err(e) if e.is_incomplete() => return Ok(None),
                Err(e) => return Err(e),
            };
            self.offset += used;

            if let Frame::Array(count) = frame {
                self.open.push(count);
                continue;
            }

            loop {
                let Some(remaining) = self.open.last_mut() else {
                    return Ok(Some(self.offset));
                };
                *remaining -= 1;
                if *remaining > 0 {
                    break;
                }
                self.open.pop();
            }
        }
    }
}

/// Read one complete reply from a stream
///
/// Bytes already in `buffer` are checked first. While the frame is
/// truncated, more bytes are read straight into `buffer`; each read asks
/// for at least as much as is already buffered (up to
/// [`MAX_READ_CHUNK_SIZE`]). Bytes past the decoded frame stay in `buffer`
/// for the next call.
pub fn read_reply<R: Read>(
    reader: &mut R,
    buffer: &mut BytesMut,
    max_reply_size: usize,
) -> Result<Reply> {
    let mut scanner = FrameScanner::default();

    loop {
        if let Some(frame_len) = scanner.scan(&buffer[..])? {
            let (reply, consumed) = decode_reply(&buffer[..frame_len])?;
            buffer.advance(consumed);
            return Ok(reply);
        }

        let start = buffer.len();
        if start >= max_reply_size {
            return Err(WireError::ReplyTooLarge {
                limit: max_reply_size,
            });
        }

        let want = start
            .clamp(READ_CHUNK_SIZE, MAX_READ_CHUNK_SIZE)
            .min(max_reply_size - start);
        buffer.resize(start + want, 0);
        let read = reader.read(&mut buffer[start..]);
        buffer.truncate(start + read.as_ref().map_or(0, |n| *n));

        match read {
            Ok(0) => {
                return Err(if start == 0 {
                    WireError::ConnectionClosed
                } else {
                    WireError::Protocol(ProtocolError::TruncatedFrame)
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
}
