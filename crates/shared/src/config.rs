//! Application configuration management.
//!
//! Values are layered: `config/default.toml`, then `config/{RUN_MODE}.toml`,
//! then environment variables prefixed with `TALLY__` (for example
//! `TALLY__DATABASE__URL` or `TALLY__LEDGER__RETRY__MAX_ATTEMPTS`).

use std::collections::HashMap;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour: account mapping, retry policy, consolidation paging.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    /// Account codes the voucher rules post to.
    #[serde(default)]
    pub accounts: AccountMapping,
    /// Retry policy for transactions that lose a lock or uniqueness race.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Consolidation paging.
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
}

/// Chart-of-accounts mapping used by the voucher rules.
///
/// Defaults follow the standard PRC enterprise chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccountMapping {
    /// Cash on hand.
    pub cash: String,
    /// Bank deposits.
    pub bank: String,
    /// Main operating revenue.
    pub revenue: String,
    /// Output VAT payable.
    pub tax_payable: String,
    /// Inventory (goods in stock).
    pub inventory: String,
    /// Accounts payable.
    pub accounts_payable: String,
    /// Receivable from sales platforms.
    pub platform_receivable: String,
    /// Platform commission expense.
    pub commission_expense: String,
    /// Member stored-value deposits (a liability).
    pub member_deposit: String,
    /// Suspense account for unreconciled cash movements.
    pub suspense: String,
    /// General expense account for non-inventory purchases.
    pub expense: String,
    /// Payment method name to account code, e.g. `wechat -> 1002`.
    pub payment_methods: HashMap<String, String>,
}

impl Default for AccountMapping {
    fn default() -> Self {
        let payment_methods = [
            ("cash", "1001"),
            ("wechat", "1002"),
            ("alipay", "1002"),
            ("card", "1002"),
            ("bank", "1002"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            cash: "1001".to_string(),
            bank: "1002".to_string(),
            revenue: "6001".to_string(),
            tax_payable: "2221".to_string(),
            inventory: "1405".to_string(),
            accounts_payable: "2202".to_string(),
            platform_receivable: "1122".to_string(),
            commission_expense: "6601".to_string(),
            member_deposit: "2203".to_string(),
            suspense: "2241".to_string(),
            expense: "6602".to_string(),
            payment_methods,
        }
    }
}

impl AccountMapping {
    /// Resolves the account a payment method settles into.
    #[must_use]
    pub fn payment_account(&self, method: &str) -> Option<&str> {
        self.payment_methods
            .get(&method.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Retry policy for serialization failures and lock timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles on each further attempt.
    pub base_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 20,
        }
    }
}

/// Consolidation paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Entities returned per page when `group_by=entity`.
    pub page_size: u64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
