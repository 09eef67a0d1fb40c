//! Configuration for kvwire sessions
//!
//! Centralized configuration with sensible defaults. The codec itself is
//! configuration-free; only [`crate::client::Session`] reads this.

/// Connection settings for a client session
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server
    // -------------------------------------------------------------------------
    /// Server address (host:port)
    pub address: String,

    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------
    /// Secret sent with AUTH after connecting. No handshake when `None`.
    pub credential: Option<String>,

    /// ACL user name, sent as `AUTH <username> <credential>` when set
    pub username: Option<String>,

    // -------------------------------------------------------------------------
    // Timeouts (milliseconds, 0 = none)
    // -------------------------------------------------------------------------
    pub connect_timeout_ms: u64,

    pub read_timeout_ms: u64,

    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------------
    /// Upper bound on buffered bytes while waiting for one reply frame
    pub max_reply_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6379".to_string(),
            credential: None,
            username: None,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            max_reply_size: 512 * 1024 * 1024, // 512 MB, the server's bulk limit
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server address (host:port)
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.config.address = addr.into();
        self
    }

    /// Set the AUTH secret
    pub fn credential(mut self, secret: impl Into<String>) -> Self {
        self.config.credential = Some(secret.into());
        self
    }

    /// Set the ACL user name
    pub fn username(mut self, user: impl Into<String>) -> Self {
        self.config.username = Some(user.into());
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the maximum buffered reply size (in bytes)
    pub fn max_reply_size(mut self, bytes: usize) -> Self {
        self.config.max_reply_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
