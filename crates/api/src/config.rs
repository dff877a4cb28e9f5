//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//! - `AUTH0_DOMAIN` - Auth0 tenant domain (e.g., my-tenant.eu.auth0.com)
//! - `AUTH0_AUDIENCE` - API identifier access tokens must be issued for
//! - `AUTH0_CLIENT_ID` - Machine-to-machine client id (Management API)
//! - `AUTH0_CLIENT_SECRET` - Machine-to-machine client secret
//! - `AUTH0_MANAGEMENT_API_AUDIENCE` - Management API audience
//! - `AUTH0_LOGIN_CLIENT_ID` - Client id used for password and refresh grants
//! - `AUTH0_LOGIN_CLIENT_SECRET` - Client secret for the login client
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` or `API_PORT` - Listen port (default: 8080)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `GRAPHQL_REQUIRE_AUTH` - Require a bearer token for mutations (default: true)
//! - `AUTH0_CONNECTION` - Database connection for new users
//!   (default: Username-Password-Authentication)
//! - `AT_API_KEY` + `AT_USERNAME` - Africa's Talking credentials; SMS is
//!   disabled unless both are set
//! - `AT_SHORTCODE` - Sender id / shortcode for outgoing SMS
//! - `AT_SANDBOX` - Use the sandbox endpoint (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `LOG_FORMAT` - `json` for one JSON object per log line (read by the binary)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default connection used when creating users in Auth0.
pub const DEFAULT_AUTH0_CONNECTION: &str = "Username-Password-Authentication";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
    /// Whether mutations need an authenticated caller
    pub graphql_require_auth: bool,
    /// Identity provider settings
    pub auth0: Auth0Config,
    /// SMS gateway settings; `None` disables order confirmations
    pub sms: Option<SmsConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Auth0 tenant configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct Auth0Config {
    /// Tenant domain without scheme or trailing slash
    pub domain: String,
    /// Audience of the API's access tokens
    pub audience: String,
    /// Management API client id
    pub client_id: String,
    /// Management API client secret
    pub client_secret: SecretString,
    /// Management API audience
    pub management_audience: String,
    /// Login client id (password/refresh grants)
    pub login_client_id: String,
    /// Login client secret
    pub login_client_secret: SecretString,
    /// Database connection new users are created in
    pub connection: String,
}

impl std::fmt::Debug for Auth0Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth0Config")
            .field("domain", &self.domain)
            .field("audience", &self.audience)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("management_audience", &self.management_audience)
            .field("login_client_id", &self.login_client_id)
            .field("login_client_secret", &"[REDACTED]")
            .field("connection", &self.connection)
            .finish()
    }
}

impl Auth0Config {
    /// Base URL of the tenant, e.g. `https://tenant.auth0.com`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }

    /// Expected `iss` claim (note the trailing slash).
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }
}

/// Africa's Talking SMS configuration.
#[derive(Clone)]
pub struct SmsConfig {
    /// Account username (`sandbox` for the sandbox app)
    pub username: String,
    /// API key sent in the `apiKey` header
    pub api_key: SecretString,
    /// Sender id or shortcode
    pub shortcode: Option<String>,
    /// Send through the sandbox endpoint
    pub sandbox: bool,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("username", &self.username)
            .field("api_key", &"[REDACTED]")
            .field("shortcode", &self.shortcode)
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ApiConfig::from_env`].
    pub fn from_source(vars: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(vars);

        let database_url = env.database_url("API_DATABASE_URL")?;
        let host = env
            .or_default("API_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_HOST".to_string(), e.to_string()))?;
        let (port_key, port) = env
            .optional("PORT")
            .map(|p| ("PORT", p))
            .or_else(|| env.optional("API_PORT").map(|p| ("API_PORT", p)))
            .unwrap_or(("API_PORT", "8080".to_string()));
        let port = port
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar(port_key.to_string(), e.to_string()))?;
        let db_max_connections = env
            .or_default("DB_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "DB_MAX_CONNECTIONS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;
        let graphql_require_auth = env.flag("GRAPHQL_REQUIRE_AUTH", true)?;

        let auth0 = Auth0Config::from_env(&env)?;
        let sms = SmsConfig::from_env(&env)?;

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            graphql_require_auth,
            auth0,
            sms,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Auth0Config {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let domain = normalize_domain(&env.required("AUTH0_DOMAIN")?);
        Url::parse(&format!("https://{domain}/"))
            .ok()
            .filter(|url| url.host_str().is_some() && url.path() == "/")
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "AUTH0_DOMAIN".to_string(),
                    format!("expected a tenant host name, got {domain:?}"),
                )
            })?;

        Ok(Self {
            domain,
            audience: env.required("AUTH0_AUDIENCE")?,
            client_id: env.required("AUTH0_CLIENT_ID")?,
            client_secret: env.validated_secret("AUTH0_CLIENT_SECRET")?,
            management_audience: env.required("AUTH0_MANAGEMENT_API_AUDIENCE")?,
            login_client_id: env.required("AUTH0_LOGIN_CLIENT_ID")?,
            login_client_secret: env.validated_secret("AUTH0_LOGIN_CLIENT_SECRET")?,
            connection: env.or_default("AUTH0_CONNECTION", DEFAULT_AUTH0_CONNECTION),
        })
    }
}

impl SmsConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let (Some(username), Some(_)) = (env.optional("AT_USERNAME"), env.optional("AT_API_KEY"))
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            username,
            api_key: env.validated_secret("AT_API_KEY")?,
            shortcode: env.optional("AT_SHORTCODE"),
            sandbox: env.flag("AT_SANDBOX", false)?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup shared by the config sections.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable. Empty values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }

    /// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got {other:?}"),
            )),
        }
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Strip any scheme and trailing slash from a tenant domain.
fn normalize_domain(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the value issued by the provider."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const CLIENT_SECRET: &str = "kP9vQ2xR7mZ4wL8nT3yB6cF1hJ5dG0sA";
    const LOGIN_SECRET: &str = "Zr4Tq8Wm2Yx6Pv0Ns5Lk9Jh3Gf7Dc1Ba";

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/ecomm".to_string()),
            ("AUTH0_DOMAIN", "https://tenant.eu.auth0.com/".to_string()),
            ("AUTH0_AUDIENCE", "https://api.simple-ecomm".to_string()),
            ("AUTH0_CLIENT_ID", "m2m-client".to_string()),
            ("AUTH0_CLIENT_SECRET", CLIENT_SECRET.to_string()),
            (
                "AUTH0_MANAGEMENT_API_AUDIENCE",
                "https://tenant.eu.auth0.com/api/v2/".to_string(),
            ),
            ("AUTH0_LOGIN_CLIENT_ID", "login-client".to_string()),
            ("AUTH0_LOGIN_CLIENT_SECRET", LOGIN_SECRET.to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<ApiConfig, ConfigError> {
        ApiConfig::from_source(&|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.db_max_connections, 10);
        assert!(config.graphql_require_auth);
        assert!(config.sms.is_none());
        assert_eq!(config.auth0.connection, DEFAULT_AUTH0_CONNECTION);
        assert_eq!(config.auth0.domain, "tenant.eu.auth0.com");
        assert_eq!(config.auth0.issuer(), "https://tenant.eu.auth0.com/");
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://localhost/ecomm"
        );
    }

    #[test]
    fn test_api_database_url_wins() {
        let mut vars = base_vars();
        vars.insert("API_DATABASE_URL", "postgres://db/primary".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://db/primary");
    }

    #[test]
    fn test_missing_database_url() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::MissingEnvVar(key)) if key == "DATABASE_URL"
        ));
    }

    #[test]
    fn test_missing_auth0_domain() {
        let mut vars = base_vars();
        vars.insert("AUTH0_DOMAIN", "  ".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::MissingEnvVar(key)) if key == "AUTH0_DOMAIN"
        ));
    }

    #[test]
    fn test_auth0_domain_with_path_rejected() {
        let mut vars = base_vars();
        vars.insert("AUTH0_DOMAIN", "tenant.auth0.com/extra".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "AUTH0_DOMAIN"
        ));
    }

    #[test]
    fn test_port_precedence() {
        let mut vars = base_vars();
        vars.insert("API_PORT", "9000".to_string());
        assert_eq!(load(&vars).unwrap().port, 9000);
        vars.insert("PORT", "7000".to_string());
        assert_eq!(load(&vars).unwrap().port, 7000);
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = base_vars();
        vars.insert("PORT", "http".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "PORT"
        ));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let mut vars = base_vars();
        vars.insert("DB_MAX_CONNECTIONS", "0".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "DB_MAX_CONNECTIONS"
        ));
    }

    #[test]
    fn test_require_auth_flag() {
        let mut vars = base_vars();
        vars.insert("GRAPHQL_REQUIRE_AUTH", "false".to_string());
        assert!(!load(&vars).unwrap().graphql_require_auth);
        vars.insert("GRAPHQL_REQUIRE_AUTH", "maybe".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_sms_enabled_when_both_credentials_present() {
        let mut vars = base_vars();
        vars.insert("AT_USERNAME", "sandbox".to_string());
        assert!(load(&vars).unwrap().sms.is_none());

        vars.insert(
            "AT_API_KEY",
            "atsk_4f9a1c7e2b8d3065af19ce7b42d8e5f1".to_string(),
        );
        vars.insert("AT_SANDBOX", "true".to_string());
        let sms = load(&vars).unwrap().sms.unwrap();
        assert_eq!(sms.username, "sandbox");
        assert!(sms.sandbox);
        assert!(sms.shortcode.is_none());
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let mut vars = base_vars();
        vars.insert("AUTH0_CLIENT_SECRET", "your-client-secret".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InsecureSecret(key, _)) if key == "AUTH0_CLIENT_SECRET"
        ));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(CLIENT_SECRET) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_vars()).unwrap();
        let debug_output = format!("{:?}", config.auth0);

        assert!(debug_output.contains("tenant.eu.auth0.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(CLIENT_SECRET));
        assert!(!debug_output.contains(LOGIN_SECRET));
    }
}
