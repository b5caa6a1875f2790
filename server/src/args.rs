//! Command-line / environment configuration.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Control-plane server relaying commands between farm clients and devices")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "FARMD_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_address: String,

    /// Root directory the static file cache serves `GET /*` from.
    #[arg(long, env = "FARMD_PUBLIC_ROOT", default_value = "./data/public")]
    pub public_root: PathBuf,

    /// Root directory for per-user data. Reserved for future use; not
    /// read by any handler today.
    #[arg(long, env = "FARMD_USER_ROOT", default_value = "./data/usr")]
    pub user_root: PathBuf,

    /// Path to the SQLite identity store.
    #[arg(long, env = "FARMD_DB_PATH", default_value = "./data/local/database.db")]
    pub db_path: PathBuf,
}
