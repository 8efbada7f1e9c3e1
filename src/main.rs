//! Serves the senda demo application.
//!
//! ```text
//! RUST_LOG=debug senda --addr 0.0.0.0:3000 --upload-dir /tmp/uploads
//! curl 'http://localhost:3000/hello?name=Lev'
//! curl -F file=@assets/contoh.txt http://localhost:3000/upload
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use senda::{AppConfig, Server, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "senda", version, about = "senda demo HTTP application")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "SENDA_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Seconds a client may take to send request headers (0 disables).
    #[arg(long, env = "SENDA_READ_TIMEOUT", default_value_t = 5)]
    read_timeout: u64,

    /// Seconds a handler may take to respond (0 disables).
    #[arg(long, env = "SENDA_WRITE_TIMEOUT", default_value_t = 5)]
    write_timeout: u64,

    /// Directory uploaded files are saved into.
    #[arg(long, env = "SENDA_UPLOAD_DIR", default_value = "target/uploads")]
    upload_dir: PathBuf,

    /// File served by `GET /download`.
    #[arg(long, env = "SENDA_DOWNLOAD_FILE", default_value = "assets/contoh.txt")]
    download_file: PathBuf,
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "senda=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let server = ServerConfig {
        addr: cli.addr,
        read_timeout: seconds(cli.read_timeout),
        write_timeout: seconds(cli.write_timeout),
    };
    let app = AppConfig { upload_dir: cli.upload_dir, download_file: cli.download_file };

    Server::with_config(server).serve(senda::app::router(app)).await?;
    Ok(())
}
