//! kvwire CLI Client
//!
//! Sends one command to a RESP server and prints the reply.

use std::time::Instant;

use clap::Parser;
use kvwire::{Config, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// kvwire CLI
#[derive(Parser, Debug)]
#[command(name = "kvwire-cli")]
#[command(about = "Send a command to a RESP key-value server")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Password sent with AUTH before the command
    #[arg(short = 'a', long, env = "KVWIRE_AUTH", hide_env_values = true)]
    auth: Option<String>,

    /// ACL user name for AUTH
    #[arg(short, long, requires = "auth")]
    user: Option<String>,

    /// Connect/read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Print elapsed time to stderr
    #[arg(long)]
    timing: bool,

    /// Command and its arguments, e.g. `SET key value`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    // Logs go to stderr; stdout carries only the reply
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,kvwire=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .address(&args.server)
        .connect_timeout_ms(args.timeout_ms)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms);
    if let Some(secret) = &args.auth {
        builder = builder.credential(secret);
    }
    if let Some(user) = &args.user {
        builder = builder.username(user);
    }
    let config = builder.build();

    let started = Instant::now();

    let mut session = match Session::connect(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", config.address, e);
            std::process::exit(1);
        }
    };

    let reply = match session.call(args.command) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", reply);

    if args.timing {
        eprintln!("elapsed: {:?}", started.elapsed());
    }
}
