//! Runtime mode selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable consulted by [`Mode::from_env`].
pub const MODE_ENV_VAR: &str = "DAEDALUS_MODE";

/// Runtime mode.
///
/// The mode controls how much the framework reveals when things go wrong:
/// in `Development` the error boundary exposes error details to the view,
/// in `Production` it renders a generic message. The default is
/// `Production` so an unconfigured deployment never leaks internals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local development. Verbose error reporting.
    Development,
    /// Automated test runs.
    Test,
    /// Production deployment. Generic error reporting.
    #[default]
    Production,
}

impl Mode {
    /// Reads the mode from the `DAEDALUS_MODE` environment variable.
    ///
    /// Returns the default mode when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParseError` if the variable is set to an
    /// unrecognized value.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(MODE_ENV_VAR) {
            Ok(value) => value.parse().map_err(|_| {
                ConfigError::env_parse_error(
                    MODE_ENV_VAR,
                    "expected 'development', 'test', or 'production'",
                )
            }),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Returns `true` in development mode.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::invalid_value(
                "mode",
                format!("unrecognized mode: {s}"),
            )),
        }
    }
}
