//! Error types for the request router

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

/// Main error type for router calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("InsufficientExecutionFee: paid {paid}, required {required}")]
    InsufficientExecutionFee { paid: U256, required: U256 },

    #[error("InvalidAttachedValue: expected {expected}, attached {attached}")]
    InvalidAttachedValue { expected: U256, attached: U256 },

    #[error("ConflictRequest: request {0} is already pending")]
    ConflictRequest(B256),

    #[error("Forbidden")]
    Forbidden,

    #[error("TooEarly: not allowed before height {0}")]
    TooEarly(u64),

    #[error("Expired: request expired at height {0}")]
    Expired(u64),

    #[error("TooLittleReceived: floor {floor}, actual {actual}")]
    TooLittleReceived { floor: U256, actual: U256 },

    #[error("InvalidCaller: expected {0}")]
    InvalidCaller(Address),

    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),

    #[error("InvalidRequest: {0}")]
    InvalidRequest(String),

    #[error("Token: {0}")]
    Token(#[from] TokenError),

    #[error("Engine: {0}")]
    Engine(#[from] EngineError),
}

impl RouterError {
    /// Short error code, used as a metrics label and as the prefix of the
    /// `ExecuteFailed` reason
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::InsufficientExecutionFee { .. } => "InsufficientExecutionFee",
            RouterError::InvalidAttachedValue { .. } => "InvalidAttachedValue",
            RouterError::ConflictRequest(_) => "ConflictRequest",
            RouterError::Forbidden => "Forbidden",
            RouterError::TooEarly(_) => "TooEarly",
            RouterError::Expired(_) => "Expired",
            RouterError::TooLittleReceived { .. } => "TooLittleReceived",
            RouterError::InvalidCaller(_) => "InvalidCaller",
            RouterError::InvalidConfig(_) => "InvalidConfig",
            RouterError::InvalidRequest(_) => "InvalidRequest",
            RouterError::Token(_) => "Token",
            RouterError::Engine(_) => "Engine",
        }
    }

    /// Check if a later attempt at the same call may succeed without any
    /// change to the request itself
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RouterError::TooEarly(_) | RouterError::Token(_) | RouterError::Engine(_)
        )
    }
}

/// Errors raised by token, permit and native-currency collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient allowance for {spender}: have {have}, need {need}")]
    InsufficientAllowance {
        spender: Address,
        have: U256,
        need: U256,
    },

    #[error("insufficient balance of {owner}: have {have}, need {need}")]
    InsufficientBalance {
        owner: Address,
        have: U256,
        need: U256,
    },

    #[error("invalid permit signature")]
    InvalidSignature,

    #[error("permit expired at {0}")]
    PermitExpired(u64),

    #[error("native transfer to {0} rejected")]
    NativeTransferRejected(Address),
}

/// Errors raised by the liquidity engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown market {0}")]
    UnknownMarket(Address),

    #[error("engine reverted: {0}")]
    Reverted(String),
}

/// Result type for router operations
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_starts_with_code() {
        let errors = [
            RouterError::Expired(6001),
            RouterError::TooEarly(3000),
            RouterError::Forbidden,
            RouterError::TooLittleReceived {
                floor: U256::from(10),
                actual: U256::from(9),
            },
            RouterError::Engine(EngineError::Reverted("paused".into())),
        ];
        for err in errors {
            assert!(err.to_string().starts_with(err.code()), "{err}");
        }
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(RouterError::TooEarly(1).is_recoverable());
        assert!(!RouterError::Expired(1).is_recoverable());
        assert!(!RouterError::Forbidden.is_recoverable());
    }
}
