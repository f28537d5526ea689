// ── Runtime connection configuration ──
//
// These types describe how to reach one webserver and how aggressively
// to cache it. They never touch config files: the CLI resolves profiles
// and flags, builds a `ClientConfig`, and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::TtlPolicy;

/// On-disk cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// `false` means every read goes to the device.
    pub enabled: bool,
    pub dir: PathBuf,
    pub ttl: TtlPolicy,
}

/// Configuration for talking to a single webserver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout.
    pub timeout: Duration,
    pub cache: CacheSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".into(),
            port: 3000,
            timeout: Duration::from_secs(10),
            cache: CacheSettings {
                enabled: true,
                dir: std::env::temp_dir().join("airzone-cache"),
                ttl: TtlPolicy::default(),
            },
        }
    }
}
