use crate::config::{LogFormat, TelemetryConfig};
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Failure to install the tracing subscriber.
#[derive(Debug)]
pub enum TelemetryError {
    /// `APP_LOG_LEVEL` is not a valid `EnvFilter` directive.
    InvalidFilter { directive: String, source: ParseError },
    /// Another global subscriber was installed first.
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter { directive, source } => {
                write!(f, "APP_LOG_LEVEL '{directive}' is not a valid filter: {source}")
            }
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "a global tracing subscriber is already installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(err.as_ref()),
        }
    }
}

/// Install the global subscriber on stderr. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(TelemetryError::AlreadyInstalled)
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::InvalidFilter {
                directive: config.log_level.clone(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_reports_the_offending_value() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = TelemetryConfig {
            log_level: "job_intake=loud".to_string(),
            log_format: LogFormat::Compact,
        };
        match build_filter(&config) {
            Err(err @ TelemetryError::InvalidFilter { .. }) => {
                assert!(err.to_string().contains("job_intake=loud"));
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
