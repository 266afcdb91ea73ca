//! Height-gated authorization for executing and cancelling requests
//!
//! Executors act on the short `min_delay_executor` clock, submitters on the
//! long `min_delay_public` clock. Execution is foreclosed once `max_delay`
//! blocks have passed; cancellation never expires.

use crate::config::RouterConfig;
use crate::error::{RouterError, RouterResult};
use crate::state::PendingEntry;

use alloy_primitives::Address;

/// Outcome of an authorization check that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Not yet, but not an error either: the call returns without effect
    Defer,
}

/// Authorization policy over a borrowed router configuration
pub struct AuthorizationPolicy<'a> {
    config: &'a RouterConfig,
}

impl<'a> AuthorizationPolicy<'a> {
    pub fn new(config: &'a RouterConfig) -> Self {
        Self { config }
    }

    /// Executors may cancel once `min_delay_executor` has elapsed and are
    /// deferred before that; the submitter may cancel after `min_delay_public`.
    pub fn can_cancel(
        &self,
        caller: &Address,
        account: &Address,
        entry: &PendingEntry,
        height: u64,
    ) -> RouterResult<Decision> {
        let delays = &self.config.delays;
        let elapsed = entry.elapsed(height);

        if self.config.is_executor(caller) {
            return Ok(if elapsed >= delays.min_delay_executor {
                Decision::Allow
            } else {
                Decision::Defer
            });
        }

        if caller != account {
            return Err(RouterError::Forbidden);
        }

        if elapsed < delays.min_delay_public {
            return Err(RouterError::TooEarly(
                entry.submitted_at.saturating_add(delays.min_delay_public),
            ));
        }

        Ok(Decision::Allow)
    }

    /// Executors may execute immediately; the submitter only after
    /// `min_delay_public`. Nobody may execute past `max_delay`.
    pub fn can_execute(
        &self,
        caller: &Address,
        account: &Address,
        entry: &PendingEntry,
        height: u64,
    ) -> RouterResult<Decision> {
        let delays = &self.config.delays;
        let elapsed = entry.elapsed(height);

        if self.is_expired(entry, height) {
            return Err(RouterError::Expired(
                entry.submitted_at.saturating_add(delays.max_delay),
            ));
        }

        if self.config.is_executor(caller) {
            return Ok(Decision::Allow);
        }

        if caller != account {
            return Err(RouterError::Forbidden);
        }

        if elapsed < delays.min_delay_public {
            return Err(RouterError::TooEarly(
                entry.submitted_at.saturating_add(delays.min_delay_public),
            ));
        }

        Ok(Decision::Allow)
    }

    /// Whether a failed execute-or-cancel should leave the request alone:
    /// not expired, and the executor cancel fallback is not open yet.
    pub fn should_skip(&self, entry: &PendingEntry, height: u64) -> bool {
        !self.is_expired(entry, height)
            && entry.elapsed(height) < self.config.delays.min_delay_executor
    }

    pub fn is_expired(&self, entry: &PendingEntry, height: u64) -> bool {
        entry.elapsed(height) > self.config.delays.max_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DelayValues, FeeSettings, GasLimits, MULTIPLIER_DIVISOR};
    use alloy_primitives::U256;

    const SUBMITTED: u64 = 100;

    fn executor() -> Address {
        Address::repeat_byte(0xee)
    }

    fn account() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn config() -> RouterConfig {
        RouterConfig::new(
            DelayValues {
                min_delay_executor: 10,
                min_delay_public: 3000,
                max_delay: 6000,
            },
            FeeSettings {
                estimated_gas_limit: GasLimits { mint: 1, burn: 1 },
                estimated_gas_fee_multiplier: MULTIPLIER_DIVISOR,
                execution_gas_fee_multiplier: MULTIPLIER_DIVISOR,
                execution_overhead_gas_limit: 0,
                native_transfer_gas_limit: 10_000,
            },
        )
        .unwrap()
        .with_executors([executor()])
    }

    fn entry() -> PendingEntry {
        PendingEntry {
            submitted_at: SUBMITTED,
            gas_price: U256::from(1),
            deposit_token: Address::repeat_byte(0x40),
            deposit_amount: U256::from(1_000),
        }
    }

    #[test]
    fn test_executor_cancel_defers_until_min_delay() {
        let config = config();
        let policy = AuthorizationPolicy::new(&config);

        assert_eq!(
            policy.can_cancel(&executor(), &account(), &entry(), SUBMITTED + 9),
            Ok(Decision::Defer)
        );
        assert_eq!(
            policy.can_cancel(&executor(), &account(), &entry(), SUBMITTED + 10),
            Ok(Decision::Allow)
        );
    }

    #[test]
    fn test_public_cancel_requires_public_delay() {
        let config = config();
        let policy = AuthorizationPolicy::new(&config);

        assert_eq!(
            policy.can_cancel(&account(), &account(), &entry(), SUBMITTED + 2999),
            Err(RouterError::TooEarly(SUBMITTED + 3000))
        );
        assert_eq!(
            policy.can_cancel(&account(), &account(), &entry(), SUBMITTED + 3000),
            Ok(Decision::Allow)
        );
        // Cancellation stays open after expiry
        assert_eq!(
            policy.can_cancel(&account(), &account(), &entry(), SUBMITTED + 9000),
            Ok(Decision::Allow)
        );
    }

    #[test]
    fn test_stranger_is_forbidden() {
        let config = config();
        let policy = AuthorizationPolicy::new(&config);
        let stranger = Address::repeat_byte(0x55);

        assert_eq!(
            policy.can_cancel(&stranger, &account(), &entry(), SUBMITTED + 5000),
            Err(RouterError::Forbidden)
        );
        assert_eq!(
            policy.can_execute(&stranger, &account(), &entry(), SUBMITTED + 5000),
            Err(RouterError::Forbidden)
        );
    }

    #[test]
    fn test_executor_execute_has_no_delay() {
        let config = config();
        let policy = AuthorizationPolicy::new(&config);

        assert_eq!(
            policy.can_execute(&executor(), &account(), &entry(), SUBMITTED),
            Ok(Decision::Allow)
        );
    }

    #[test]
    fn test_execute_expiry_boundary() {
        let config = config();
        let policy = AuthorizationPolicy::new(&config);

        assert_eq!(
            policy.can_execute(&executor(), &account(), &entry(), SUBMITTED + 6000),
            Ok(Decision::Allow)
        );
        assert_eq!(
            policy.can_execute(&executor(), &account(), &entry(), SUBMITTED + 6001),
            Err(RouterError::Expired(SUBMITTED + 6000))
        );
        assert_eq!(
            policy.can_execute(&account(), &account(), &entry(), SUBMITTED + 6001),
            Err(RouterError::Expired(SUBMITTED + 6000))
        );
    }

    #[test]
    fn test_submitter_execute_too_early() {
        let config = config();
        let policy = AuthorizationPolicy::new(&config);

        assert_eq!(
            policy.can_execute(&account(), &account(), &entry(), SUBMITTED + 10),
            Err(RouterError::TooEarly(SUBMITTED + 3000))
        );
        assert_eq!(
            policy.can_execute(&account(), &account(), &entry(), SUBMITTED + 3000),
            Ok(Decision::Allow)
        );
    }

    #[test]
    fn test_should_skip() {
        let config = config();
        let policy = AuthorizationPolicy::new(&config);

        assert!(policy.should_skip(&entry(), SUBMITTED + 9));
        assert!(!policy.should_skip(&entry(), SUBMITTED + 10));
        assert!(!policy.should_skip(&entry(), SUBMITTED + 6001));
    }
}
