//! Server and demo-application settings.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Listener settings for [`Server`](crate::Server).
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Longest wait for a client to finish sending request headers,
    /// including the idle gap before the next request on a kept-alive
    /// connection. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Longest a handler may take to produce its response before the client
    /// gets `503 Service Unavailable`. `None` waits forever.
    pub write_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            read_timeout: Some(Duration::from_secs(5)),
            write_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Where the demo application reads and writes files.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Uploaded files are saved here under their own names.
    pub upload_dir: PathBuf,
    /// The file served by `GET /download`.
    pub download_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("target/uploads"),
            download_file: PathBuf::from("assets/contoh.txt"),
        }
    }
}
