use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Directory holding `site.json` and the `posts/` Markdown bodies.
    #[arg(long, default_value = "content")]
    pub content_dir: PathBuf,

    /// SQLite database path. `SERENDIB_DATABASE_URL` overrides this.
    #[arg(long, default_value = "serendib.db")]
    pub database: PathBuf,

    /// Directory uploaded media is written to and served from.
    #[arg(long, default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Maximum connections in the database pool.
    #[arg(long, default_value_t = 5)]
    pub pool_size: u32,
}
