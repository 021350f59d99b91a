//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use bet_relay::bets::{Bet, BetError, validate_birth_date};
use std::{path::PathBuf, str::FromStr, time::Duration};

/// Default server address when neither a flag nor `CLI_SERVER_ADDRESS` is given.
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:12345";

/// Default maximum number of bets per batch.
pub const DEFAULT_BATCH_MAX_AMOUNT: usize = 100;

/// Default path of the agency's bet records.
pub const DEFAULT_DATA_FILE: &str = "./agency.csv";

/// Values given on the command line. They win over the environment.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub server_address: Option<String>,
    pub id: Option<u8>,
    pub batch_max_amount: Option<usize>,
    pub data_file: Option<PathBuf>,
    pub socket_timeout_ms: Option<u64>,
    pub single_bet: bool,
}

/// Complete client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Agency id sent in every batch
    pub id: u8,
    /// Server `host:port`
    pub server_address: String,
    /// Maximum bets per batch
    pub batch_max_amount: usize,
    /// CSV file with the agency's bets
    pub data_file: PathBuf,
    /// Per read/write socket timeout; `None` blocks forever
    pub socket_timeout: Option<Duration>,
    /// Send one bet taken from the environment instead of the data file
    pub single_bet: bool,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or unparsable
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration, resolving variables through `lookup`.
    pub fn from_lookup<F>(overrides: CliOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let id = match overrides.id {
            Some(id) => id,
            None => parse_var(&lookup, "CLI_ID")?.ok_or_else(|| ConfigError::MissingRequired {
                var: "CLI_ID".to_string(),
                hint: "Set it to the agency number (1-255) or pass --id".to_string(),
            })?,
        };

        let server_address = overrides
            .server_address
            .or_else(|| lookup("CLI_SERVER_ADDRESS"))
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());

        let batch_max_amount = match overrides.batch_max_amount {
            Some(amount) => amount,
            None => parse_var(&lookup, "CLI_BATCH_MAX_AMOUNT")?.unwrap_or(DEFAULT_BATCH_MAX_AMOUNT),
        };

        let data_file = overrides
            .data_file
            .or_else(|| lookup("CLI_DATA_FILE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        let socket_timeout_ms = match overrides.socket_timeout_ms {
            Some(ms) => Some(ms),
            None => parse_var(&lookup, "CLI_SOCKET_TIMEOUT_MS")?,
        };

        Ok(ClientConfig {
            id,
            server_address,
            batch_max_amount,
            data_file,
            socket_timeout: socket_timeout_ms.map(Duration::from_millis),
            single_bet: overrides.single_bet,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id == 0 {
            return Err(ConfigError::Invalid {
                var: "CLI_ID".to_string(),
                reason: "Must be between 1 and 255".to_string(),
            });
        }

        if self.batch_max_amount == 0 {
            return Err(ConfigError::Invalid {
                var: "CLI_BATCH_MAX_AMOUNT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.batch_max_amount > u16::MAX as usize {
            return Err(ConfigError::Invalid {
                var: "CLI_BATCH_MAX_AMOUNT".to_string(),
                reason: format!("Must be at most {}", u16::MAX),
            });
        }

        // A zero timeout is rejected by the socket layer
        if self.socket_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid {
                var: "CLI_SOCKET_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0 (unset it to block forever)".to_string(),
            });
        }

        if !self.server_address.contains(':') {
            return Err(ConfigError::Invalid {
                var: "CLI_SERVER_ADDRESS".to_string(),
                reason: format!("Expected host:port, got {:?}", self.server_address),
            });
        }

        Ok(())
    }
}

/// Build the single bet described by the `CLI_*` bet variables.
pub fn bet_from_env() -> Result<Bet, ConfigError> {
    bet_from_lookup(|key| std::env::var(key).ok())
}

/// Build a single bet, resolving variables through `lookup`.
pub fn bet_from_lookup<F>(lookup: F) -> Result<Bet, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |var: &str| {
        lookup(var).ok_or_else(|| ConfigError::MissingRequired {
            var: var.to_string(),
            hint: "Single-bet mode needs every CLI_* bet variable".to_string(),
        })
    };

    let name = required("CLI_NOMBRE")?;
    let surname = required("CLI_APELLIDO")?;
    let identifier: u32 = parse_var(&lookup, "CLI_DOCUMENTO")?.ok_or_else(|| {
        ConfigError::MissingRequired {
            var: "CLI_DOCUMENTO".to_string(),
            hint: "Single-bet mode needs every CLI_* bet variable".to_string(),
        }
    })?;
    let birth_date = required("CLI_FECHA_NACIMIENTO")?;
    let number: u32 = parse_var(&lookup, "CLI_NUMERO_APOSTADO")?.ok_or_else(|| {
        ConfigError::MissingRequired {
            var: "CLI_NUMERO_APOSTADO".to_string(),
            hint: "Single-bet mode needs every CLI_* bet variable".to_string(),
        }
    })?;

    if validate_birth_date(&birth_date).is_err() {
        return Err(ConfigError::Invalid {
            var: "CLI_FECHA_NACIMIENTO".to_string(),
            reason: "Must be formatted as YYYY-MM-DD".to_string(),
        });
    }

    let bet = Bet::new(name, surname, identifier.to_string(), birth_date, number);
    bet.validate().map_err(|error| {
        let var = match &error {
            BetError::FieldTooLong { field: "name", .. } => "CLI_NOMBRE",
            BetError::FieldTooLong { field: "surname", .. } => "CLI_APELLIDO",
            BetError::FieldTooLong { .. } => "CLI_DOCUMENTO",
            BetError::BirthDate(_) => "CLI_FECHA_NACIMIENTO",
        };
        ConfigError::Invalid {
            var: var.to_string(),
            reason: error.to_string(),
        }
    })?;
    Ok(bet)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an optional variable, rejecting unparsable values
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|e| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("{value:?}: {e}"),
            })
        })
        .transpose()
}
