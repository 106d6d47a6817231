use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};

use crate::workflows::notices::{ComposeContext, CsvExport, CsvQuoting, DEFAULT_DATE_FORMAT};

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
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub notices: NoticeConfig,
    pub reports: ReportConfig,
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
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let operator = env::var("NOTICE_OPERATOR").unwrap_or_else(|_| "Current User".to_string());
        let sender_name =
            env::var("NOTICE_SENDER_NAME").unwrap_or_else(|_| "Living Council Member".to_string());
        let date_format =
            env::var("NOTICE_DATE_FORMAT").unwrap_or_else(|_| DEFAULT_DATE_FORMAT.to_string());
        if !is_valid_date_format(&date_format) {
            return Err(ConfigError::InvalidDateFormat { value: date_format });
        }

        let utc_offset = parse_utc_offset(
            &env::var("APP_UTC_OFFSET_MINUTES").unwrap_or_else(|_| "0".to_string()),
        )?;

        let quoting = env::var("REPORT_CSV_QUOTING").unwrap_or_else(|_| "legacy".to_string());
        let csv_quoting = quoting
            .parse::<CsvQuoting>()
            .map_err(|_| ConfigError::InvalidCsvQuoting { value: quoting })?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            notices: NoticeConfig {
                operator,
                sender_name,
                date_format,
                utc_offset,
            },
            reports: ReportConfig {
                csv_quoting,
                utc_offset,
            },
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Identity and locale used when composing notices.
#[derive(Debug, Clone)]
pub struct NoticeConfig {
    pub operator: String,
    pub sender_name: String,
    pub date_format: String,
    pub utc_offset: FixedOffset,
}

impl NoticeConfig {
    pub fn context(&self, now: DateTime<Utc>) -> ComposeContext {
        ComposeContext {
            operator: self.operator.clone(),
            sender_name: self.sender_name.clone(),
            now: now.with_timezone(&self.utc_offset),
            date_format: self.date_format.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub csv_quoting: CsvQuoting,
    pub utc_offset: FixedOffset,
}

impl ReportConfig {
    pub fn csv_export(&self) -> CsvExport {
        CsvExport::new(self.csv_quoting, self.utc_offset)
    }
}

fn is_valid_date_format(format: &str) -> bool {
    !format.trim().is_empty() && StrftimeItems::new(format).all(|item| item != Item::Error)
}

fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ConfigError::InvalidUtcOffset {
            value: value.to_string(),
        })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDateFormat { value: String },
    InvalidUtcOffset { value: String },
    InvalidCsvQuoting { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDateFormat { value } => {
                write!(f, "NOTICE_DATE_FORMAT '{value}' is not a valid strftime pattern")
            }
            ConfigError::InvalidUtcOffset { value } => write!(
                f,
                "APP_UTC_OFFSET_MINUTES '{value}' must be whole minutes within one day of UTC"
            ),
            ConfigError::InvalidCsvQuoting { value } => write!(
                f,
                "REPORT_CSV_QUOTING '{value}' must be 'legacy' or 'rfc4180'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDateFormat { .. }
            | ConfigError::InvalidUtcOffset { .. }
            | ConfigError::InvalidCsvQuoting { .. } => None,
        }
    }
}
