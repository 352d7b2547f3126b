//! AtlasCache CLI
//!
//! Inspect and manage keys written by AtlasCache in a Redis server.

use std::time::Duration;

use atlascache::{Cache, CacheError, Config, Expiration, RedisStore, Store};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasCache CLI
#[derive(Parser, Debug)]
#[command(name = "atlascache-cli")]
#[command(about = "CLI for keys cached with AtlasCache")]
#[command(version)]
struct Args {
    /// Store URL
    #[arg(short, long, default_value = "redis://127.0.0.1:6379")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List keys matching a glob pattern (scans every key)
    Keys {
        /// Pattern such as `user:*`
        #[arg(default_value = "*")]
        pattern: String,
    },

    /// Show the data kind stored under a key
    Type {
        key: String,
    },

    /// Print a cached string, or a hex dump of undecodable bytes
    Get {
        key: String,
    },

    /// Cache a string
    Set {
        key: String,

        value: String,

        /// TTL in seconds; 0 keeps the key forever
        #[arg(short, long)]
        ttl: Option<u64>,
    },

    /// Delete keys
    Del {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Set a key's TTL in seconds
    Expire {
        key: String,

        seconds: u64,
    },

    /// Show a key's remaining TTL
    Ttl {
        key: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,atlascache=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder().store_url(&args.url).build();

    let cache = match RedisStore::open(&config).and_then(|store| Cache::new(store, config)) {
        Ok(cache) => cache,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", args.url, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cache, args.command) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(cache: &Cache<RedisStore>, command: Commands) -> atlascache::Result<()> {
    match command {
        Commands::Keys { pattern } => {
            for key in cache.keys(&pattern)? {
                println!("{}", key);
            }
        }
        Commands::Type { key } => {
            println!("{}", cache.key_type(&key)?);
        }
        Commands::Get { key } => match cache.get_string(&key) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => println!("(nil)"),
            Err(CacheError::Decode(reason)) | Err(CacheError::UnsupportedType(reason)) => {
                tracing::debug!("Not a cached string: {}", reason);
                match cache.store().get(&key)? {
                    Some(bytes) => println!("{}", hex_dump(&bytes)),
                    None => println!("(nil)"),
                }
            }
            Err(e) => return Err(e),
        },
        Commands::Set { key, value, ttl } => {
            let policy = match ttl {
                None => cache.defaults().string,
                Some(0) => Expiration::Never,
                Some(secs) => Expiration::seconds(secs),
            };
            cache.set_string_with(&key, &value, policy)?;
            println!("OK");
        }
        Commands::Del { keys } => {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            println!("{}", cache.delete_many(&keys)?);
        }
        Commands::Expire { key, seconds } => {
            let updated = cache.expire(&key, Duration::from_secs(seconds))?;
            println!("{}", u8::from(updated));
        }
        Commands::Ttl { key } => match cache.ttl(&key)? {
            Some(remaining) => println!("{}s", remaining.as_secs()),
            None if cache.exists(&key)? => println!("no expiry"),
            None => println!("(nil)"),
        },
    }
    Ok(())
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(row, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            format!("{:08x}  {}", row * 16, hex.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
