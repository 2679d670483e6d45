/// Configuration management for the presale admin server.
/// Handles command-line / environment parsing and the runtime config shared with handlers.
use clap::Parser;
use std::path::PathBuf;

/// Default session lifetime (one hour)
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

/// Upper bound on session lifetime (one year)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 3600;

#[derive(Parser, Debug)]
#[command(name = "Presale Admin Server")]
#[command(about = "Admin backend for a presale website", long_about = None)]
pub struct Config {
    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port (default: 4000)
    #[arg(long, env = "PORT", default_value = "4000")]
    pub port: u16,

    /// SQLite database file path (default: presale.db)
    #[arg(long, env = "DATABASE_PATH", default_value = "presale.db")]
    pub database: PathBuf,

    /// Plaintext admin password hashed by /api/init-admin (min 8 characters)
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Secret used to sign session tokens
    #[arg(
        long,
        env = "JWT_SECRET",
        hide_env_values = true,
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    #[arg(
        long,
        env = "TOKEN_TTL_SECONDS",
        default_value_t = DEFAULT_TOKEN_TTL_SECONDS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECONDS)
    )]
    pub token_ttl_seconds: i64,

    /// Always answer /api/init-admin with 200, even when bootstrap fails
    #[arg(long, env = "LENIENT_INIT_ADMIN")]
    pub lenient_init_admin: bool,

    /// PID file path (optional) - write server PID to this file on startup
    #[arg(long)]
    pub pidfile: Option<PathBuf>,
}

impl Config {
    /// Parse command-line arguments into Config
    pub fn from_args() -> Self {
        Config::parse()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings handed to request handlers
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            admin_password: self.admin_password.clone(),
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_seconds: self.token_ttl_seconds,
            lenient_init_admin: self.lenient_init_admin,
        }
    }
}

/// Runtime settings shared with handlers through `web::Data`
#[derive(Clone)]
pub struct ServerConfig {
    pub admin_password: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub lenient_init_admin: bool,
}

impl ServerConfig {
    pub fn new(admin_password: Option<&str>, jwt_secret: &str) -> Self {
        ServerConfig {
            admin_password: admin_password.map(str::to_string),
            jwt_secret: jwt_secret.to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            lenient_init_admin: false,
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("lenient_init_admin", &self.lenient_init_admin)
            .finish()
    }
}
