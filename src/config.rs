use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::session::SESSION_DURATION;

pub const DEFAULT_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 3000));
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;

/// Server settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: DEFAULT_ADDR,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            session_ttl: SESSION_DURATION,
        }
    }
}

impl Config {
    /// Build the configuration from command line arguments
    ///
    /// Usage: `sheet-editor [ADDR] [MAX_UPLOAD_MB]`. The first element of
    /// `args` is the program name. Missing or unparsable values fall back to
    /// the defaults (`127.0.0.1:3000`, 20 MB).
    ///
    /// # Arguments
    /// * `args` - Command line arguments including the program name
    ///
    /// # Returns
    /// * `Config` - The resulting configuration
    pub fn from_args(args: &[String]) -> Self {
        let mut config = Config::default();

        if let Some(addr) = args.get(1) {
            match addr.parse() {
                Ok(addr) => config.addr = addr,
                Err(_) => log::warn!("invalid address `{}`, using {}", addr, DEFAULT_ADDR),
            }
        }

        if let Some(limit) = args.get(2) {
            match limit.parse::<usize>() {
                Ok(mb) if mb > 0 => config.max_upload_bytes = mb.saturating_mul(1024 * 1024),
                _ => log::warn!(
                    "invalid upload limit `{}`, using {} MB",
                    limit,
                    DEFAULT_MAX_UPLOAD_MB
                ),
            }
        }

        config
    }
}
