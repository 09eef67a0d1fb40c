//! Command definitions
//!
//! A command is the ordered argument list sent to the server, e.g.
//! `["SET", "key", "value"]`. The first argument is the command name.

use crate::error::ProtocolError;
use super::codec::write_bulk_array;

/// A validated, non-empty command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<Vec<u8>>,
}

impl Command {
    /// Build a command from its arguments
    ///
    /// Fails with `InvalidCommand` when `args` is empty.
    pub fn new<I, A>(args: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        let args: Vec<Vec<u8>> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(ProtocolError::InvalidCommand);
        }
        Ok(Self { args })
    }

    /// Build the AUTH handshake command
    ///
    /// With a user name this is the two-argument ACL form.
    pub fn auth(username: Option<&str>, secret: &str) -> Self {
        let mut args = vec![b"AUTH".to_vec()];
        if let Some(user) = username {
            args.push(user.as_bytes().to_vec());
        }
        args.push(secret.as_bytes().to_vec());
        Self { args }
    }

    /// Command name (first argument), upper-cased for display
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.args[0]).to_ascii_uppercase()
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Encode to the request wire format
    pub fn encode(&self) -> Vec<u8> {
        write_bulk_array(&self.args)
    }
}
