//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::rate_limit::RateLimits;
use bcrypt::DEFAULT_COST;
use clap::Parser;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{error, info};
use uuid::Uuid;

const MIN_JWT_SECRET_LENGTH: usize = 32;

const GENERATED_PASSWORD_LENGTH: usize = 24;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Proxy header carrying the client IP. Only use behind a proxy that sets
/// the header itself; otherwise clients can spoof their address.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ClientIpHeader {
    /// Leftmost entry of X-Forwarded-For
    XForwardedFor,
    /// X-Real-Ip value
    XRealIp,
}

/// Client IP extraction strategy derived from `ClientIpHeader`.
#[derive(Clone, Debug)]
pub struct IpExtractor {
    header: ClientIpHeader,
}

impl From<ClientIpHeader> for IpExtractor {
    fn from(header: ClientIpHeader) -> Self {
        Self { header }
    }
}

impl IpExtractor {
    pub fn header_name(&self) -> &'static str {
        match self.header {
            ClientIpHeader::XForwardedFor => "x-forwarded-for",
            ClientIpHeader::XRealIp => "x-real-ip",
        }
    }

    /// Parse the client IP out of the configured header's value.
    pub fn extract(&self, header_value: &str) -> Result<String, &'static str> {
        let candidate = match self.header {
            ClientIpHeader::XForwardedFor => {
                header_value.split(',').next().unwrap_or(header_value)
            }
            ClientIpHeader::XRealIp => header_value,
        };
        candidate
            .trim()
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|_| "IP header does not contain a valid address")
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Clubdesk", about = "Club management backend with JWT authentication")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8642")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "clubdesk.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Header to read the client IP from (requires running behind a proxy)
    #[arg(long, value_enum)]
    pub client_ip_header: Option<ClientIpHeader>,

    /// Create an admin account on startup and print a one-time password
    #[arg(long, requires = "admin_email")]
    pub create_admin: bool,

    /// Email for the admin account created by --create-admin
    #[arg(long)]
    pub admin_email: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Handle the --create-admin flag: create an admin account and print its
/// one-time password.
pub async fn handle_create_admin(db: &Database, email: &str) {
    match db.credentials().find_by_email(email).await {
        Ok(Some(_)) => {
            error!(email = %email, "An account with this email already exists");
            std::process::exit(1);
        }
        Ok(None) => {
            let password = generate_password();
            let password_hash = match bcrypt::hash(&password, DEFAULT_COST) {
                Ok(hash) => hash,
                Err(e) => {
                    error!(error = %e, "Failed to hash admin password");
                    std::process::exit(1);
                }
            };

            let uuid = Uuid::new_v4().to_string();

            match db
                .credentials()
                .create_admin(&uuid, "Administrator", email, &password_hash)
                .await
            {
                Ok(_) => {
                    println!();
                    println!("Admin account created: {}", email);
                    println!("One-time password: {}", password);
                    println!("Change it after the first login.");
                    println!();
                }
                Err(e) => {
                    error!(error = %e, "Failed to create admin account");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to check for existing account");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    client_ip_header: Option<ClientIpHeader>,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        ip_extractor: client_ip_header.map(IpExtractor::from),
        route_policies: None,
        rate_limits: RateLimits::new(),
    }
}
