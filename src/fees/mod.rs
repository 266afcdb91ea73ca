//! Execution fee computation
//!
//! Handles:
//! - Minimum prepaid fee at submission
//! - Executor / submitter split of the prepaid fee at settlement

use crate::config::{FeeSettings, MULTIPLIER_DIVISOR};
use crate::request::RequestKind;

use alloy_primitives::U256;

/// Split of a prepaid fee after execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub to_executor: U256,
    pub to_submitter: U256,
}

/// Fee engine over a borrowed set of fee parameters
pub struct FeeEngine<'a> {
    settings: &'a FeeSettings,
}

impl<'a> FeeEngine<'a> {
    pub fn new(settings: &'a FeeSettings) -> Self {
        Self { settings }
    }

    /// Smallest fee accepted for a request submitted at `gas_price`
    pub fn minimum_fee(&self, kind: RequestKind, gas_price: U256) -> U256 {
        let gas_limit = U256::from(self.settings.estimated_gas_limit.get(kind));
        let multiplier = U256::from(self.settings.estimated_gas_fee_multiplier);
        ceil_div(
            gas_price.saturating_mul(gas_limit).saturating_mul(multiplier),
            U256::from(MULTIPLIER_DIVISOR),
        )
    }

    /// Split a prepaid fee using the configured execution multiplier
    pub fn settle(
        &self,
        execution_fee: U256,
        submitted_gas_price: U256,
        current_gas_price: U256,
    ) -> FeeSplit {
        settle(
            execution_fee,
            submitted_gas_price,
            current_gas_price,
            self.settings.execution_gas_fee_multiplier,
        )
    }

    /// Gas an executor is expected to spend on one request of `kind`
    pub fn execution_gas_budget(&self, kind: RequestKind) -> u64 {
        self.settings
            .estimated_gas_limit
            .get(kind)
            .saturating_add(self.settings.execution_overhead_gas_limit)
    }

    pub fn native_transfer_gas_limit(&self) -> u64 {
        self.settings.native_transfer_gas_limit
    }
}

/// Executor share is the fee scaled by the gas price ratio and the execution
/// multiplier, rounded up and capped at the fee. The submitter gets the rest.
pub fn settle(
    execution_fee: U256,
    submitted_gas_price: U256,
    current_gas_price: U256,
    execution_gas_fee_multiplier: u64,
) -> FeeSplit {
    let denominator = submitted_gas_price.saturating_mul(U256::from(MULTIPLIER_DIVISOR));
    let to_executor = if denominator.is_zero() {
        execution_fee
    } else {
        let scaled = ceil_div(
            execution_fee
                .saturating_mul(current_gas_price)
                .saturating_mul(U256::from(execution_gas_fee_multiplier)),
            denominator,
        );
        scaled.min(execution_fee)
    };

    FeeSplit {
        to_executor,
        to_submitter: execution_fee - to_executor,
    }
}

/// Division rounding up; `divisor` must be non-zero
pub fn ceil_div(value: U256, divisor: U256) -> U256 {
    if value.is_zero() {
        U256::ZERO
    } else {
        (value - U256::from(1)) / divisor + U256::from(1)
    }
}
