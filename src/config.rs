//! Configuration management for the request router
//!
//! `RouterConfig` is the explicit parameter object owned by the router and
//! lent to the fee engine and authorization policy at call time. `Settings`
//! loads it, together with the keeper and devnet sections, from TOML files
//! with environment variable substitution.

use crate::error::{RouterError, RouterResult};
use crate::request::RequestKind;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

/// Divisor for every gas-fee multiplier; `MULTIPLIER_DIVISOR` means 1x
pub const MULTIPLIER_DIVISOR: u64 = 10_000_000;

/// Delay thresholds in block heights, shared by both request families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayValues {
    pub min_delay_executor: u64,
    pub min_delay_public: u64,
    pub max_delay: u64,
}

impl DelayValues {
    pub fn validate(&self) -> RouterResult<()> {
        if self.min_delay_executor > self.min_delay_public {
            return Err(RouterError::InvalidConfig(format!(
                "min_delay_executor {} exceeds min_delay_public {}",
                self.min_delay_executor, self.min_delay_public
            )));
        }
        if self.min_delay_public > self.max_delay {
            return Err(RouterError::InvalidConfig(format!(
                "min_delay_public {} exceeds max_delay {}",
                self.min_delay_public, self.max_delay
            )));
        }
        Ok(())
    }
}

/// Estimated gas consumed by executing one request of each family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasLimits {
    pub mint: u64,
    pub burn: u64,
}

impl GasLimits {
    pub fn get(&self, kind: RequestKind) -> u64 {
        match kind {
            RequestKind::Mint => self.mint,
            RequestKind::Burn => self.burn,
        }
    }

    pub fn set(&mut self, kind: RequestKind, limit: u64) -> u64 {
        let slot = match kind {
            RequestKind::Mint => &mut self.mint,
            RequestKind::Burn => &mut self.burn,
        };
        std::mem::replace(slot, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSettings {
    pub estimated_gas_limit: GasLimits,
    /// Scales the minimum fee charged at submission
    pub estimated_gas_fee_multiplier: u64,
    /// Scales the executor's share at settlement
    pub execution_gas_fee_multiplier: u64,
    pub execution_overhead_gas_limit: u64,
    /// Gas stipend forwarded with native-currency payouts
    pub native_transfer_gas_limit: u64,
}

/// Live router parameters, mutated only through the admin surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub executors: HashSet<Address>,
    pub delays: DelayValues,
    pub fees: FeeSettings,
}

impl RouterConfig {
    pub fn new(delays: DelayValues, fees: FeeSettings) -> RouterResult<Self> {
        delays.validate()?;
        Ok(Self {
            executors: HashSet::new(),
            delays,
            fees,
        })
    }

    pub fn with_executors(mut self, executors: impl IntoIterator<Item = Address>) -> Self {
        self.executors.extend(executors);
        self
    }

    pub fn is_executor(&self, account: &Address) -> bool {
        self.executors.contains(account)
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub router: RouterSection,
    pub delays: DelayValues,
    pub fees: FeeSettings,
    pub access: AccessConfig,
    pub keeper: KeeperConfig,
    pub devnet: Option<DevnetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterSection {
    /// Address the router holds custody under
    pub address: Address,
    pub wrapped_native: Address,
    pub stable_token: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    pub executors: Vec<Address>,
    pub governors: Vec<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    pub executor: Address,
    pub fee_receiver: Address,
    pub poll_interval_ms: u64,
}

/// Local in-memory chain used by the binary
#[derive(Debug, Clone, Deserialize)]
pub struct DevnetConfig {
    /// Address the in-memory liquidity engine holds deposits under
    pub engine: Address,
    pub gas_price: u64,
    pub markets: Vec<DevnetMarket>,
    #[serde(default)]
    pub balances: Vec<DevnetBalance>,
    #[serde(default)]
    pub mints: Vec<DevnetMint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevnetMarket {
    pub asset: Address,
    pub share_token: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevnetBalance {
    pub account: Address,
    /// Token address, or `None` for native currency
    pub token: Option<Address>,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevnetMint {
    pub account: Address,
    pub market: Address,
    pub amount: u64,
    pub execution_fee: u64,
}

impl Settings {
    /// Load settings from the file named by `ROUTER_CONFIG`, falling back to
    /// `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var("ROUTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str)?;

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        self.delays.validate()?;

        if self.access.governors.is_empty() {
            anyhow::bail!("At least one governor must be configured");
        }

        if self.fees.estimated_gas_fee_multiplier == 0 {
            tracing::warn!("estimated_gas_fee_multiplier is zero - submissions will be free");
        }

        if !self.access.executors.contains(&self.keeper.executor) {
            tracing::warn!(
                "Keeper executor {} is not a registered executor",
                self.keeper.executor
            );
        }

        Ok(())
    }

    /// Build the router parameter object
    pub fn router_config(&self) -> RouterResult<RouterConfig> {
        Ok(RouterConfig::new(self.delays, self.fees)?
            .with_executors(self.access.executors.iter().copied()))
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[router]
address = "0x1000000000000000000000000000000000000001"
wrapped_native = "0x2000000000000000000000000000000000000002"
stable_token = "0x3000000000000000000000000000000000000003"

[delays]
min_delay_executor = 10
min_delay_public = 3000
max_delay = 6000

[fees]
estimated_gas_fee_multiplier = 10000000
execution_gas_fee_multiplier = 15000000
execution_overhead_gas_limit = 30000
native_transfer_gas_limit = 10000

[fees.estimated_gas_limit]
mint = 1000000
burn = 1000000

[access]
executors = ["${TEST_ROUTER_EXECUTOR}"]
governors = ["0x5000000000000000000000000000000000000005"]

[keeper]
executor = "0x4000000000000000000000000000000000000004"
fee_receiver = "0x4000000000000000000000000000000000000004"
poll_interval_ms = 1000
"#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_load_from_file() {
        env::set_var(
            "TEST_ROUTER_EXECUTOR",
            "0x4000000000000000000000000000000000000004",
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert!(settings.devnet.is_none());

        let config = settings.router_config().unwrap();
        assert_eq!(config.delays.min_delay_public, 3000);
        assert_eq!(config.fees.estimated_gas_limit.get(RequestKind::Burn), 1_000_000);
        assert!(config.is_executor(&settings.keeper.executor));
    }

    #[test]
    fn test_rejects_inverted_delays() {
        let delays = DelayValues {
            min_delay_executor: 10,
            min_delay_public: 5,
            max_delay: 6000,
        };
        assert!(matches!(
            delays.validate(),
            Err(RouterError::InvalidConfig(_))
        ));

        let delays = DelayValues {
            min_delay_executor: 10,
            min_delay_public: 7000,
            max_delay: 6000,
        };
        assert!(delays.validate().is_err());
    }

    #[test]
    fn test_gas_limit_set_returns_previous() {
        let mut limits = GasLimits { mint: 1, burn: 2 };
        assert_eq!(limits.set(RequestKind::Burn, 5), 2);
        assert_eq!(limits.get(RequestKind::Burn), 5);
        assert_eq!(limits.get(RequestKind::Mint), 1);
    }
}
