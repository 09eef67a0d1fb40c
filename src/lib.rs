//! # kvwire
//!
//! A small client for RESP key-value servers:
//! - Command encoder (argument list to request frame)
//! - Reply decoder (bytes to a typed [`protocol::Reply`], nested arrays included)
//! - Blocking session with AUTH handshake and resumable reads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       kvwire-cli                             │
//! │                 (args, logging, output)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Session                                 │
//! │           (transport, AUTH, read buffer)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Encoder   │          │   Decoder   │
//!   │  (Command)  │          │   (Reply)   │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ProtocolError, Result, WireError};
pub use config::Config;
pub use client::Session;
pub use protocol::{Command, Reply};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
