//! Client Module
//!
//! Blocking session on top of the protocol codec.
//!
//! ## Flow
//! - Connect (or wrap an existing transport)
//! - AUTH handshake when a credential is configured
//! - One command at a time: encode, write, read until a full frame decodes

mod session;

pub use session::Session;
