use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "brako-node", about = "BRAKO shipment registry and tracking service")]
pub struct Cli {
    /// Address the HTTP API listens on.
    #[arg(long, env = "BRAKO_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// PostgreSQL connection string. Without it the in-memory store is used.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Use the in-memory store even if a database URL is configured.
    #[arg(long)]
    pub memory: bool,

    /// Maximum pooled database connections.
    #[arg(long, default_value_t = 8)]
    pub pool_size: usize,

    #[arg(long, env = "BRAKO_ADMIN_USER", default_value = "brako")]
    pub admin_user: String,

    /// Hex SHA-256 digest of the admin password.
    #[arg(long, env = "BRAKO_ADMIN_PASSWORD_SHA256")]
    pub admin_password_sha256: String,

    /// Minutes an admin session stays valid after login.
    #[arg(long, default_value_t = 720)]
    pub session_ttl_mins: i64,
}

impl Cli {
    /// The database to connect to, unless `--memory` overrides it.
    pub fn database_url(&self) -> Option<&str> {
        if self.memory {
            None
        } else {
            self.database_url.as_deref()
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_mins.max(1))
    }
}
