/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. Loaded once at startup, immutable for
/// the life of the process, and constructible by hand in tests.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `ACCESS_TOKEN_SECRET`: Access-token signing key (required, >= 32 chars)
/// - `REFRESH_TOKEN_SECRET`: Refresh-token signing key (required, >= 32
///   chars, must differ from the access secret)
/// - `ACCESS_TOKEN_TTL_SECS`: Access-token lifetime (default: 3600)
/// - `REFRESH_TOKEN_TTL_DAYS`: Refresh-token lifetime (default: 7)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `UPLOADS_DIR`: Where profile pictures are stored (default: uploads)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use dayplan_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use dayplan_shared::auth::session::SessionConfig;
use dayplan_shared::db::pool::DatabaseConfig as PoolConfig;
use std::env;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub auth: AuthConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; ["*"] means permissive (development)
    pub cors_origins: Vec<String>,

    /// Directory profile pictures are written to and served from
    pub uploads_dir: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Token signing configuration
///
/// The two secrets must be distinct: an access token must never validate
/// where a refresh token is expected, or the other way around.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for access-token signatures
    pub access_secret: String,

    /// Secret for refresh-token signatures
    pub refresh_secret: String,

    /// Access-token lifetime in seconds
    pub access_ttl_secs: i64,

    /// Refresh-token lifetime in days
    pub refresh_ttl_days: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing, secrets are too
    /// short, or the two secrets are equal.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let uploads_dir = env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string());

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let access_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable is required"))?;
        let refresh_secret = env::var("REFRESH_TOKEN_SECRET").map_err(|_| {
            anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable is required")
        })?;

        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            anyhow::bail!("Token secrets must be at least 32 characters long");
        }
        if access_secret == refresh_secret {
            anyhow::bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        let access_ttl_secs = env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<i64>()?;
        let refresh_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                uploads_dir,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            auth: AuthConfig {
                access_secret,
                refresh_secret,
                access_ttl_secs,
                refresh_ttl_days,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// The session manager's view of this configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            access_secret: self.auth.access_secret.clone(),
            refresh_secret: self.auth.refresh_secret.clone(),
            access_ttl: Duration::seconds(self.auth.access_ttl_secs),
            refresh_ttl: Duration::days(self.auth.refresh_ttl_days),
        }
    }

    /// The connection pool's view of this configuration
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..PoolConfig::default()
        }
    }
}
