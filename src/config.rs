//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub paytm: PaytmConfig,
    pub upi: UpiConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

/// Where the JSON collections live
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Admin credentials and token signing
#[derive(Clone)]
pub struct AuthConfig {
    pub admin_email: String,
    pub admin_password: String,
    pub jwt_secret: String,
    pub admin_token_ttl_hours: i64,
    pub customer_token_ttl_hours: i64,
}

// Secrets stay out of Debug output
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_email", &self.admin_email)
            .field("admin_token_ttl_hours", &self.admin_token_ttl_hours)
            .field("customer_token_ttl_hours", &self.customer_token_ttl_hours)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Staging,
    Production,
}

/// Checksum-redirect gateway settings
#[derive(Clone)]
pub struct PaytmConfig {
    pub mid: String,
    pub merchant_key: String,
    pub website: String,
    pub channel_id: String,
    pub industry_type: String,
    pub callback_url: String,
    pub frontend_url: String,
    pub timeout_secs: u64,
    pub environment: Environment,
}

impl std::fmt::Debug for PaytmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaytmConfig")
            .field("mid", &self.mid)
            .field("website", &self.website)
            .field("callback_url", &self.callback_url)
            .field("frontend_url", &self.frontend_url)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Static UPI target shown for manual payments
#[derive(Debug, Clone)]
pub struct UpiConfig {
    pub vpa: String,
    pub payee_name: String,
}

/// Client-side checkout settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// How long a staged gateway order survives before it counts as abandoned
    pub pending_order_ttl_minutes: i64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            pending_order_ttl_minutes: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            paytm: PaytmConfig::from_env()?,
            upi: UpiConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        self.auth.validate()?;
        self.paytm.validate()?;
        self.upi.validate()?;

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("SERVER_PORT", "5000")?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(
                "SERVER_PORT cannot be 0".to_string(),
            ));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(StorageConfig {
            data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("DATA_DIR".to_string()));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(AuthConfig {
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@bambooyardcafe.com".to_string()),
            admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| "Admin@123456".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::MissingVariable("JWT_SECRET".to_string()))?,
            admin_token_ttl_hours: parse_var("ADMIN_TOKEN_TTL_HOURS", "24")?,
            customer_token_ttl_hours: parse_var("CUSTOMER_TOKEN_TTL_HOURS", "168")?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 32 {
            return Err(ConfigError::ValidationFailed(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if !self.admin_email.contains('@') {
            return Err(ConfigError::InvalidValue("ADMIN_EMAIL".to_string()));
        }

        if self.admin_password.is_empty() {
            return Err(ConfigError::InvalidValue("ADMIN_PASSWORD".to_string()));
        }

        if self.admin_token_ttl_hours <= 0 || self.customer_token_ttl_hours <= 0 {
            return Err(ConfigError::ValidationFailed(
                "token TTLs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl PaytmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "staging".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" | "development" => Environment::Staging,
            _ => return Err(ConfigError::InvalidValue("ENVIRONMENT".to_string())),
        };

        Ok(PaytmConfig {
            mid: env::var("PAYTM_MID").unwrap_or_default(),
            merchant_key: env::var("PAYTM_MERCHANT_KEY").unwrap_or_default(),
            website: env::var("PAYTM_WEBSITE").unwrap_or_else(|_| "WEBSTAGING".to_string()),
            channel_id: env::var("PAYTM_CHANNEL_ID").unwrap_or_else(|_| "WEB".to_string()),
            industry_type: env::var("PAYTM_INDUSTRY_TYPE")
                .unwrap_or_else(|_| "Retail".to_string()),
            callback_url: env::var("PAYTM_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api/paytm/callback".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            timeout_secs: parse_var("PAYTM_TIMEOUT_SECS", "30")?,
            environment,
        })
    }

    /// True when both merchant credentials are present
    pub fn is_configured(&self) -> bool {
        !self.mid.is_empty() && !self.merchant_key.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("PAYTM_CALLBACK_URL", &self.callback_url),
            ("FRONTEND_URL", &self.frontend_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be a valid URL",
                    name
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("PAYTM_TIMEOUT_SECS".to_string()));
        }

        // Checksums are AES-128 encrypted with the merchant key
        if !self.merchant_key.is_empty() && self.merchant_key.len() != 16 {
            return Err(ConfigError::InvalidValue(
                "PAYTM_MERCHANT_KEY must be 16 characters".to_string(),
            ));
        }

        if self.environment == Environment::Production && !self.is_configured() {
            return Err(ConfigError::MissingVariable(
                "PAYTM_MID and PAYTM_MERCHANT_KEY are required in production".to_string(),
            ));
        }

        Ok(())
    }
}

impl UpiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(UpiConfig {
            vpa: env::var("UPI_VPA").unwrap_or_else(|_| "bambooyardcafe@paytm".to_string()),
            payee_name: env::var("UPI_PAYEE_NAME")
                .unwrap_or_else(|_| "Bamboo Yard Cafe".to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.vpa.contains('@') {
            return Err(ConfigError::InvalidValue("UPI_VPA".to_string()));
        }
        Ok(())
    }
}

impl CheckoutConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv().ok();
        Ok(CheckoutConfig {
            pending_order_ttl_minutes: parse_var("PENDING_ORDER_TTL_MINUTES", "30")?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pending_order_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "PENDING_ORDER_TTL_MINUTES must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pending_order_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.pending_order_ttl_minutes)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
