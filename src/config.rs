//! Runtime configuration.
//!
//! Every setting can be given as a command-line flag or through the environment
//! (a `.env` file in the working directory is loaded first by the binary).

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
pub const DEFAULT_NOTIFY_FROM: &str = "GoPass <onboarding@gopass.com>";
/// Applied to every outbound provider call. There is no retry on top of it.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Args, Debug, Clone)]
pub struct PaystackConfig {
    /// Secret key for the bank directory and subaccount provider.
    #[arg(long, env = "PAYSTACK_SECRET_KEY", hide_env_values = true)]
    pub paystack_secret_key: Option<String>,

    #[arg(long, env = "PAYSTACK_BASE_URL", default_value = DEFAULT_PAYSTACK_BASE_URL)]
    pub paystack_base_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct AutomationConfig {
    /// Webhook of the onboarding automation that creates payout subaccounts.
    #[arg(long, env = "ONBOARDING_WEBHOOK_URL")]
    pub onboarding_webhook_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NotifierConfig {
    /// Without a key, activation notices are only logged.
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    #[arg(long, env = "RESEND_BASE_URL", default_value = DEFAULT_RESEND_BASE_URL)]
    pub resend_base_url: String,

    #[arg(long, env = "NOTIFY_FROM", default_value = DEFAULT_NOTIFY_FROM)]
    pub notify_from: String,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYOUT_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Backup file whose organizer records are loaded before the command runs.
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    #[arg(
        long,
        env = "PAYOUT_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS,
        global = true
    )]
    pub http_timeout_secs: u64,

    #[command(flatten)]
    pub paystack: PaystackConfig,

    #[command(flatten)]
    pub automation: AutomationConfig,

    #[command(flatten)]
    pub notifier: NotifierConfig,
}

impl Settings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
