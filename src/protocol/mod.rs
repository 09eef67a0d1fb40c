//! Protocol Module
//!
//! RESP wire protocol: the request encoder and the reply decoder.
//!
//! ## Requests
//! Every command is sent as an array of bulk strings:
//! ```text
//! *3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n
//! ```
//!
//! ## Replies
//! - `+` Status   - `+OK\r\n`
//! - `-` Error    - `-ERR unknown command\r\n`
//! - `:` Integer  - `:1000\r\n`
//! - `$` Bulk     - `$3\r\nfoo\r\n`, null: `$-1\r\n`
//! - `*` Array    - `*2\r\n<frame><frame>`, null: `*-1\r\n`
//!
//! Encoder and decoder are stateless; they borrow their input and return
//! owned values.

mod command;
mod reply;
mod codec;

pub use command::Command;
pub use reply::Reply;
pub use codec::{
    decode_reply, encode_command, encode_reply, read_reply, write_command, CRLF,
    MAX_READ_CHUNK_SIZE, READ_CHUNK_SIZE,
};
