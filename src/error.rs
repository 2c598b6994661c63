use thiserror::Error;

/// Errors produced by the payout-activation workflow.
///
/// The `Display` output of each variant is the reason string handed verbatim to
/// admin and organizer surfaces, so it is phrased for a human reader.
#[derive(Error, Debug)]
pub enum PayoutError {
    /// Input rejected locally before any provider call.
    #[error("Invalid format: {0}")]
    Format(String),
    /// The bank directory says the account does not exist.
    #[error("Account could not be verified: {0}")]
    InvalidAccount(String),
    /// The shared daily verification quota is exhausted.
    #[error("Verification limit reached at {provider}, try again later")]
    RateLimited { provider: String },
    #[error("{provider} is unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },
    #[error("Organizer not found: {0}")]
    NotFound(String),
    /// A locally recorded subaccount id is unknown to the provider.
    #[error("Subaccount {subaccount_id} for {user_id} not found at provider")]
    NotFoundUpstream {
        user_id: String,
        subaccount_id: String,
    },
    /// The provider's subaccount settles to a different account than the local record.
    #[error(
        "Subaccount {subaccount_id} settles to account {upstream_account}, but {user_id} has {local_account} on record"
    )]
    HolderMismatch {
        user_id: String,
        subaccount_id: String,
        local_account: String,
        upstream_account: String,
    },
    #[error("Already activated: {0}")]
    AlreadyActive(String),
    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PayoutError {
    pub fn provider_unavailable(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PayoutError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PayoutError>;
