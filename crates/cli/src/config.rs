//! Agent configuration from environment variables.

use dlmm_lp_execution::config::{EngineConfig, EngineTiming};
use dlmm_lp_protocols::prelude::{
    DEFAULT_JUPITER_API_URL, DEFAULT_METEORA_API_URL, PUBLIC_MAINNET_RPC,
};
use rust_decimal::Decimal;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("RPC_URL must not be the public mainnet endpoint")]
    PublicRpc,
}

/// Chat alert credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Everything the agent reads from its environment.
#[derive(Clone)]
pub struct AgentConfig {
    /// Keypair in the Solana CLI JSON byte-array format.
    pub wallet_private_key: String,
    pub pool_address: String,
    pub rpc_url: String,
    pub range_fraction: Decimal,
    pub fee_buffer: Decimal,
    pub min_native_balance: Decimal,
    pub poll_interval: Duration,
    pub slippage_bps: u16,
    /// Compute unit price for DLMM transactions, in micro-lamports.
    pub priority_fee: u64,
    pub meteora_api_url: String,
    pub jupiter_api_url: String,
    pub telegram: Option<TelegramConfig>,
    pub database_url: Option<String>,
    pub action_log_dir: PathBuf,
    /// `None` when reports are disabled (`REPORT_INTERVAL_HOURS=0`).
    pub report_interval: Option<Duration>,
}

// Keeps secrets out of logs.
impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("pool_address", &self.pool_address)
            .field("rpc_url", &self.rpc_url)
            .field("range_fraction", &self.range_fraction)
            .field("fee_buffer", &self.fee_buffer)
            .field("min_native_balance", &self.min_native_balance)
            .field("poll_interval", &self.poll_interval)
            .field("slippage_bps", &self.slippage_bps)
            .field("priority_fee", &self.priority_fee)
            .field("telegram", &self.telegram.is_some())
            .field("database", &self.database_url.is_some())
            .field("action_log_dir", &self.action_log_dir)
            .field("report_interval", &self.report_interval)
            .finish_non_exhaustive()
    }
}

impl AgentConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns the first missing or invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let wallet_private_key = required("WALLET_PRIVATE_KEY")?;
        let pool_address = required("POOL_ADDRESS")?;
        let rpc_url = required("RPC_URL")?;
        if rpc_url.trim_end_matches('/') == PUBLIC_MAINNET_RPC {
            return Err(ConfigError::PublicRpc);
        }

        let range_fraction: Decimal =
            parse_or(get("RANGE_PERCENT"), "RANGE_PERCENT", Decimal::new(5, 2))?;
        if range_fraction <= Decimal::ZERO || range_fraction >= Decimal::ONE {
            return Err(invalid("RANGE_PERCENT", range_fraction, "must be between 0 and 1"));
        }
        let fee_buffer: Decimal =
            parse_or(get("SOL_FEE_BUFFER"), "SOL_FEE_BUFFER", Decimal::new(1, 1))?;
        if fee_buffer < Decimal::ZERO {
            return Err(invalid("SOL_FEE_BUFFER", fee_buffer, "must not be negative"));
        }
        let min_native_balance: Decimal =
            parse_or(get("MIN_SOL_BALANCE"), "MIN_SOL_BALANCE", Decimal::new(6, 2))?;
        if min_native_balance < Decimal::ZERO {
            return Err(invalid("MIN_SOL_BALANCE", min_native_balance, "must not be negative"));
        }

        let poll_secs: u64 = parse_or(get("POLL_INTERVAL_SECS"), "POLL_INTERVAL_SECS", 10)?;
        if poll_secs == 0 {
            return Err(invalid("POLL_INTERVAL_SECS", poll_secs, "must be at least 1"));
        }
        let slippage_bps: u16 = parse_or(get("SLIPPAGE_BPS"), "SLIPPAGE_BPS", 100)?;
        if slippage_bps > 10_000 {
            return Err(invalid("SLIPPAGE_BPS", slippage_bps, "must not exceed 10000"));
        }
        let priority_fee: u64 = parse_or(
            get("PRIORITY_FEE_MICROLAMPORTS"),
            "PRIORITY_FEE_MICROLAMPORTS",
            50_000,
        )?;
        let report_hours: u64 =
            parse_or(get("REPORT_INTERVAL_HOURS"), "REPORT_INTERVAL_HOURS", 24)?;

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("TELEGRAM_CHAT_ID")),
            (None, Some(_)) => return Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN")),
        };

        Ok(Self {
            wallet_private_key,
            pool_address,
            rpc_url,
            range_fraction,
            fee_buffer,
            min_native_balance,
            poll_interval: Duration::from_secs(poll_secs),
            slippage_bps,
            priority_fee,
            meteora_api_url: get("METEORA_API_URL")
                .unwrap_or_else(|| DEFAULT_METEORA_API_URL.to_string()),
            jupiter_api_url: get("JUPITER_API_URL")
                .unwrap_or_else(|| DEFAULT_JUPITER_API_URL.to_string()),
            telegram,
            database_url: get("DATABASE_URL"),
            action_log_dir: get("ACTION_LOG_DIR")
                .map_or_else(|| PathBuf::from("./logs"), PathBuf::from),
            report_interval: (report_hours > 0).then(|| Duration::from_secs(report_hours * 3600)),
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            range_fraction: self.range_fraction,
            fee_buffer: self.fee_buffer,
            min_native_balance: self.min_native_balance,
            report_interval: self.report_interval,
            ..EngineConfig::new(self.pool_address.clone())
        }
    }

    pub fn engine_timing(&self) -> EngineTiming {
        EngineTiming::default().with_poll_interval(self.poll_interval)
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn invalid(name: &'static str, value: impl fmt::Display, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
