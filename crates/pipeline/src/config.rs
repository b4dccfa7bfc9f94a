use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use coldchain_core::geo::Location;
use coldchain_events::PollConfig;
use coldchain_ledger::rpc::DEFAULT_RPC_URL;

use crate::logging::LogFormat;

/// Longest accepted tick interval.
pub const MAX_STEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Upper bound for `POLL_TIMEOUT_MS` and `IDLE_PAUSE_MS`.
pub const MAX_POLL_MS: u64 = 60_000;

/// Upper bound for the second-based timeouts.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} must be set when {context}")]
    Missing {
        var: &'static str,
        context: &'static str,
    },
}

/// Which ledger backend records breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    Simulation,
    Rpc,
}

impl FromStr for LedgerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulation" | "sim" | "mock" => Ok(Self::Simulation),
            "rpc" | "real" => Ok(Self::Rpc),
            other => Err(format!("expected `simulation` or `rpc`, got `{other}`")),
        }
    }
}

/// The simulated pallet.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub pallet_id: String,
    /// Wall-clock time per tick.
    pub step_interval: Duration,
    pub origin: Location,
    pub destination: Location,
    pub ideal_temp: f64,
    pub max_temp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSettings {
    pub mode: LedgerMode,
    pub rpc_url: String,
    pub contract_address: String,
    pub account: Option<String>,
    pub confirmation_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

/// Pipeline configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub simulation: SimulationSettings,
    /// Monitoring agent breach threshold, °C.
    pub alert_threshold: f64,
    pub poll: PollConfig,
    pub ledger: LedgerSettings,
    /// JSON warehouse list; the built-in network is used when unset.
    pub warehouses_file: Option<PathBuf>,
    pub dashboard: DashboardSettings,
    pub log_format: LogFormat,
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default                  |
    /// |------------------------------------|--------------------------|
    /// | `SIMULATION_SPEED`                 | `1` (seconds per tick)   |
    /// | `PALLET_ID`                        | `PALLET_001`             |
    /// | `ORIGIN_LAT` / `ORIGIN_LON`        | `52.5200` / `13.4050`    |
    /// | `DESTINATION_LAT` / `DESTINATION_LON` | `52.3676` / `4.9041`  |
    /// | `IDEAL_TEMP` / `MAX_TEMP`          | `4.0` / `8.0`            |
    /// | `ALERT_THRESHOLD`                  | value of `MAX_TEMP`      |
    /// | `POLL_TIMEOUT_MS` / `IDLE_PAUSE_MS`| `1000` / `100`           |
    /// | `LEDGER_MODE`                      | `simulation`             |
    /// | `BLOCKCHAIN_RPC`                   | `http://127.0.0.1:7545`  |
    /// | `DEPLOYED_CONTRACT_ADDRESS`        | empty                    |
    /// | `LEDGER_ACCOUNT`                   | unset                    |
    /// | `LEDGER_CONFIRMATION_TIMEOUT_SECS` | `30`                     |
    /// | `WAREHOUSES_FILE`                  | unset                    |
    /// | `DASHBOARD_HOST` / `DASHBOARD_PORT`| `0.0.0.0` / `5000`       |
    /// | `REQUEST_TIMEOUT_SECS`             | `30`                     |
    /// | `LOG_FORMAT`                       | `pretty`                 |
    ///
    /// Durations above [`MAX_STEP_INTERVAL`], [`MAX_POLL_MS`] and
    /// [`MAX_TIMEOUT_SECS`] are rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let speed_secs: f64 = env.parse("SIMULATION_SPEED", 1.0)?;
        if !speed_secs.is_finite() || speed_secs <= 0.0 {
            return Err(invalid("SIMULATION_SPEED", speed_secs, "must be a positive number of seconds"));
        }
        let step_interval = Duration::try_from_secs_f64(speed_secs)
            .ok()
            .filter(|interval| *interval <= MAX_STEP_INTERVAL)
            .ok_or_else(|| {
                invalid(
                    "SIMULATION_SPEED",
                    speed_secs,
                    &format!("must not exceed {} seconds", MAX_STEP_INTERVAL.as_secs()),
                )
            })?;

        let max_temp: f64 = env.parse_finite("MAX_TEMP", 8.0)?;
        let simulation = SimulationSettings {
            pallet_id: env.string("PALLET_ID", "PALLET_001"),
            step_interval,
            origin: Location::new(
                env.parse_finite("ORIGIN_LAT", 52.5200)?,
                env.parse_finite("ORIGIN_LON", 13.4050)?,
            ),
            destination: Location::new(
                env.parse_finite("DESTINATION_LAT", 52.3676)?,
                env.parse_finite("DESTINATION_LON", 4.9041)?,
            ),
            ideal_temp: env.parse_finite("IDEAL_TEMP", 4.0)?,
            max_temp,
        };

        let poll = PollConfig {
            poll_timeout: Duration::from_millis(env.bounded("POLL_TIMEOUT_MS", 1000, MAX_POLL_MS)?),
            idle_pause: Duration::from_millis(env.bounded("IDLE_PAUSE_MS", 100, MAX_POLL_MS)?),
        };

        let mode: LedgerMode = env.parse("LEDGER_MODE", LedgerMode::Simulation)?;
        let contract_address = env.string("DEPLOYED_CONTRACT_ADDRESS", "");
        if mode == LedgerMode::Rpc && contract_address.is_empty() {
            return Err(ConfigError::Missing {
                var: "DEPLOYED_CONTRACT_ADDRESS",
                context: "LEDGER_MODE=rpc",
            });
        }
        let ledger = LedgerSettings {
            mode,
            rpc_url: env.string("BLOCKCHAIN_RPC", DEFAULT_RPC_URL),
            contract_address,
            account: env.optional("LEDGER_ACCOUNT"),
            confirmation_timeout: Duration::from_secs(env.bounded(
                "LEDGER_CONFIRMATION_TIMEOUT_SECS",
                30,
                MAX_TIMEOUT_SECS,
            )?),
        };

        let dashboard = DashboardSettings {
            host: env.string("DASHBOARD_HOST", "0.0.0.0"),
            port: env.parse("DASHBOARD_PORT", 5000)?,
            request_timeout_secs: env.bounded("REQUEST_TIMEOUT_SECS", 30, MAX_TIMEOUT_SECS)?,
        };

        Ok(Self {
            alert_threshold: env.parse_finite("ALERT_THRESHOLD", max_temp)?,
            simulation,
            poll,
            ledger,
            warehouses_file: env.optional("WAREHOUSES_FILE").map(PathBuf::from),
            dashboard,
            log_format: env.parse("LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Set, non-blank value of `var`.
    fn optional(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, var: &str, default: &str) -> String {
        self.optional(var).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(var) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Integer in `0..=max`.
    fn bounded(&self, var: &'static str, default: u64, max: u64) -> Result<u64, ConfigError> {
        let value: u64 = self.parse(var, default)?;
        if value > max {
            return Err(invalid(var, value, &format!("must not exceed {max}")));
        }
        Ok(value)
    }

    fn parse_finite(&self, var: &'static str, default: f64) -> Result<f64, ConfigError> {
        let value: f64 = self.parse(var, default)?;
        if !value.is_finite() {
            return Err(invalid(var, value, "must be a finite number"));
        }
        Ok(value)
    }
}

fn invalid(var: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
