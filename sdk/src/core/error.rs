//! SDK error types

use solana_client::client_error::ClientError;
use solana_sdk::{program_error::ProgramError, pubkey::Pubkey, transaction::TransactionError};
use thiserror::Error;
use withheld_math::MathError;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Locally detected bad input
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Fee arithmetic rejected its inputs
    #[error("Fee math error: {0}")]
    Math(#[from] MathError),

    /// Client-side fee disagrees with the mint's on-chain fee configuration
    #[error("Fee mismatch: client computed {client}, program expects {program}")]
    FeeMismatch { client: u64, program: u64 },

    /// Caller does not hold the key an operation needs
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A collection path found no withheld fees to move
    #[error("Nothing to collect: {0}")]
    NothingToCollect(String),

    /// The program rejected the instruction sequence
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// Finality could not be observed (network or timeout)
    #[error("Confirmation failed: {0}")]
    ConfirmationFailed(String),

    /// Account bytes do not match the expected layout
    #[error("Failed to deserialize account {address}: {reason}")]
    Deserialization { address: Pubkey, reason: String },

    /// RPC error outside of transaction submission
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    /// Keypair storage error
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification used to decide how a caller reacts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, raised before a transaction is built
    Validation,
    /// The program rejected a submitted transaction
    Submission,
    /// Finality not observed; resubmission may succeed
    Confirmation,
    /// Account data could not be read
    Deserialization,
    /// RPC, filesystem or configuration trouble
    Environment,
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::InvalidParameters(_)
            | SdkError::Math(_)
            | SdkError::FeeMismatch { .. }
            | SdkError::Unauthorized(_)
            | SdkError::NothingToCollect(_) => ErrorKind::Validation,
            SdkError::TransactionRejected(_) => ErrorKind::Submission,
            SdkError::ConfirmationFailed(_) => ErrorKind::Confirmation,
            SdkError::Deserialization { .. } => ErrorKind::Deserialization,
            SdkError::Rpc(_)
            | SdkError::AccountNotFound(_)
            | SdkError::Wallet(_)
            | SdkError::Config(_)
            | SdkError::Io(_) => ErrorKind::Environment,
        }
    }

    /// Only confirmation failures are worth resubmitting
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Confirmation
    }

    pub(crate) fn deserialization(address: &Pubkey, reason: impl ToString) -> Self {
        SdkError::Deserialization {
            address: *address,
            reason: reason.to_string(),
        }
    }
}

/// Instruction builders fail with ProgramError on malformed arguments
impl From<ProgramError> for SdkError {
    fn from(err: ProgramError) -> Self {
        SdkError::InvalidParameters(err.to_string())
    }
}

/// Classify a client error raised while submitting a transaction
///
/// A transaction error (including a failed preflight simulation) means the
/// program saw and rejected the instructions, except for an unknown
/// blockhash: the node has not seen it yet and a resubmission with a fresh
/// one may land. Anything else happened before finality could be observed.
pub fn classify_submission_error(err: ClientError) -> SdkError {
    match err.get_transaction_error() {
        Some(TransactionError::BlockhashNotFound) => {
            SdkError::ConfirmationFailed(format!("blockhash not found ({})", err))
        }
        Some(tx_err) => SdkError::TransactionRejected(format!("{} ({})", tx_err, err)),
        None => SdkError::ConfirmationFailed(err.to_string()),
    }
}

impl From<ClientError> for SdkError {
    fn from(err: ClientError) -> Self {
        SdkError::Rpc(err.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
