//! Events emitted by the router
//!
//! Lifecycle events carry enough data for an indexer to follow a request
//! from submission to its terminal state; admin events carry old and new
//! values so configuration can be reconstructed off-band.

use crate::config::DelayValues;
use crate::request::{AnyRequest, RequestKind};

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RouterEvent {
    /// Request stored and funds escrowed
    Created {
        id: B256,
        height: u64,
        gas_price: U256,
        request: AnyRequest,
    },

    /// Request cancelled; deposit returned, whole fee paid to `fee_receiver`
    Cancelled {
        kind: RequestKind,
        id: B256,
        canceller: Address,
        deposit_recipient: Address,
        fee_receiver: Address,
        execution_fee: U256,
    },

    /// Request executed by the engine
    Executed {
        kind: RequestKind,
        id: B256,
        executor: Address,
        fee_receiver: Address,
        amount_out: U256,
        stable_leg_out: U256,
        executor_fee: U256,
        submitter_refund: U256,
    },

    /// Execute attempt inside execute-or-cancel failed; a cancel follows
    ExecuteFailed {
        kind: RequestKind,
        id: B256,
        reason: String,
    },

    ExecutorUpdated {
        account: Address,
        was_active: bool,
        is_active: bool,
    },

    DelayValuesUpdated {
        old: DelayValues,
        new: DelayValues,
    },

    EstimatedGasLimitUpdated {
        kind: RequestKind,
        old: u64,
        new: u64,
    },

    ExecutionOverheadGasLimitUpdated {
        old: u64,
        new: u64,
    },

    NativeTransferGasLimitUpdated {
        old: u64,
        new: u64,
    },

    EstimatedGasFeeMultiplierUpdated {
        old: u64,
        new: u64,
    },

    ExecutionGasFeeMultiplierUpdated {
        old: u64,
        new: u64,
    },
}

impl RouterEvent {
    /// Get event name for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            RouterEvent::Created { .. } => "created",
            RouterEvent::Cancelled { .. } => "cancelled",
            RouterEvent::Executed { .. } => "executed",
            RouterEvent::ExecuteFailed { .. } => "execute_failed",
            RouterEvent::ExecutorUpdated { .. } => "executor_updated",
            RouterEvent::DelayValuesUpdated { .. } => "delay_values_updated",
            RouterEvent::EstimatedGasLimitUpdated { .. } => "estimated_gas_limit_updated",
            RouterEvent::ExecutionOverheadGasLimitUpdated { .. } => {
                "execution_overhead_gas_limit_updated"
            }
            RouterEvent::NativeTransferGasLimitUpdated { .. } => "native_transfer_gas_limit_updated",
            RouterEvent::EstimatedGasFeeMultiplierUpdated { .. } => {
                "estimated_gas_fee_multiplier_updated"
            }
            RouterEvent::ExecutionGasFeeMultiplierUpdated { .. } => {
                "execution_gas_fee_multiplier_updated"
            }
        }
    }

    /// Request identity for lifecycle events
    pub fn request_id(&self) -> Option<B256> {
        match self {
            RouterEvent::Created { id, .. }
            | RouterEvent::Cancelled { id, .. }
            | RouterEvent::Executed { id, .. }
            | RouterEvent::ExecuteFailed { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Whether the event ends a request's pending window
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RouterEvent::Cancelled { .. } | RouterEvent::Executed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_event_tag() {
        let event = RouterEvent::ExecuteFailed {
            kind: RequestKind::Burn,
            id: B256::repeat_byte(3),
            reason: "Expired: request expired at height 6100".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "execute_failed");
        assert_eq!(json["kind"], "burn");
        assert_eq!(event.request_id(), Some(B256::repeat_byte(3)));
        assert!(!event.is_terminal());
    }
}
