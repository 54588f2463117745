use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_DATABASE_URL: &str = "sqlite://job_applications.db?mode=rwc";
const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_SENDER: &str = "no-reply@localhost";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
///
/// Built once at process start and handed by reference to the store and notifier
/// constructors.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { var: "APP_PORT" })?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            database: DatabaseConfig::from_env(),
            mail: MailConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Connection settings for the application store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret,
}

impl DatabaseConfig {
    fn from_env() -> Self {
        if let Ok(url) = env::var("DATABASE_URL") {
            return Self { url: Secret::new(url) };
        }

        // Legacy deployments configure MySQL by parts.
        match env::var("DB_HOST") {
            Ok(host) => {
                let user = env::var("DB_USER").unwrap_or_default();
                let password = env::var("DB_PASSWORD").unwrap_or_default();
                let name = env::var("DB_NAME").unwrap_or_default();
                Self {
                    url: Secret::new(mysql_url(&host, &user, &password, &name)),
                }
            }
            Err(_) => Self {
                url: Secret::new(DEFAULT_DATABASE_URL),
            },
        }
    }

    /// URL scheme, which selects the SQL backend.
    pub fn backend(&self) -> &str {
        self.url
            .expose()
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .unwrap_or_default()
    }
}

fn mysql_url(host: &str, user: &str, password: &str, name: &str) -> String {
    let credentials = match (user.is_empty(), password.is_empty()) {
        (true, _) => String::new(),
        (false, true) => format!("{}@", urlencoding::encode(user)),
        (false, false) => format!(
            "{}:{}@",
            urlencoding::encode(user),
            urlencoding::encode(password)
        ),
    };
    format!("mysql://{credentials}{}/{}", host.trim(), name.trim())
}

/// SMTP submission settings for applicant confirmations.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub sender: String,
    pub tls: SmtpTls,
}

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// TLS from the first byte (SMTPS, usually port 465).
    Implicit,
    /// Plain connect upgraded with `STARTTLS`.
    StartTls,
    /// No encryption. Local relays and development only.
    Plain,
}

impl SmtpTls {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "implicit" | "ssl" | "smtps" => Ok(Self::Implicit),
            "starttls" => Ok(Self::StartTls),
            "none" | "plain" => Ok(Self::Plain),
            other => Err(ConfigError::InvalidSmtpTls(other.to_string())),
        }
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let server = env_any(&["SMTP_SERVER", "GMAIL_SERVER"])
            .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string());
        let port = match env_any(&["SMTP_PORT", "GMAIL_PORT"]) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { var: "SMTP_PORT" })?,
            None => DEFAULT_SMTP_PORT,
        };
        let username = env_any(&["SMTP_USERNAME", "GMAIL_USERNAME"]);
        let password = env_any(&["SMTP_PASSWORD", "GMAIL_APP_PASSWORD"]).map(Secret::new);

        if password.is_some() && username.is_none() {
            return Err(ConfigError::IncompleteSmtpCredentials);
        }

        let sender = env_any(&["SMTP_FROM"])
            .or_else(|| username.clone())
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());
        let tls = match env_any(&["SMTP_TLS"]) {
            Some(value) => SmtpTls::parse(&value)?,
            None => SmtpTls::Implicit,
        };

        Ok(Self {
            server,
            port,
            username,
            password,
            sender,
            tls,
        })
    }
}

/// First non-blank value among the given variables.
fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// String wrapper that keeps credentials out of `Debug` output and logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort { var: &'static str },
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidSmtpTls(String),
    IncompleteSmtpCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { var } => write!(f, "{var} must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidSmtpTls(value) => {
                write!(
                    f,
                    "SMTP_TLS must be 'implicit', 'starttls' or 'none', got '{value}'"
                )
            }
            ConfigError::IncompleteSmtpCredentials => {
                write!(f, "SMTP_PASSWORD is set but SMTP_USERNAME is missing")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort { .. }
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::InvalidSmtpTls(_)
            | ConfigError::IncompleteSmtpCredentials => None,
        }
    }
}
