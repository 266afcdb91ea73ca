//! Keeper that drives pending requests to a terminal state
//!
//! The keeper follows router events to learn which requests are pending and,
//! on every sweep, calls `execute_or_cancel` for each of them as an executor,
//! oldest first.

use crate::events::RouterEvent;
use crate::fees::FeeEngine;
use crate::ledger::Host;
use crate::metrics;
use crate::request::AnyRequest;
use crate::router::{Context, Outcome, RequestRouter};

use alloy_primitives::{Address, B256, U256};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Pending request as seen by the keeper
#[derive(Debug, Clone)]
pub struct TrackedRequest {
    pub request: AnyRequest,
    pub submitted_at: u64,
}

/// Tally of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub executed: usize,
    pub cancelled: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Keeper {
    executor: Address,
    fee_receiver: Address,
    pending: HashMap<B256, TrackedRequest>,
}

impl Keeper {
    pub fn new(executor: Address, fee_receiver: Address) -> Self {
        Self {
            executor,
            fee_receiver,
            pending: HashMap::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_tracking(&self, id: &B256) -> bool {
        self.pending.contains_key(id)
    }

    /// Update the pending set from a router event
    pub fn observe(&mut self, event: &RouterEvent) {
        match event {
            RouterEvent::Created {
                id,
                height,
                request,
                ..
            } => {
                debug!("Tracking {} request {}", request.kind(), hex::encode(id));
                self.pending.insert(
                    *id,
                    TrackedRequest {
                        request: request.clone(),
                        submitted_at: *height,
                    },
                );
            }

            RouterEvent::Cancelled { id, .. } | RouterEvent::Executed { id, .. } => {
                self.pending.remove(id);
            }

            _ => {}
        }
    }

    /// Run `execute_or_cancel` on every tracked request
    pub fn sweep<H: Host>(
        &mut self,
        router: &mut RequestRouter,
        host: &mut H,
        height: u64,
        gas_price: U256,
    ) -> SweepReport {
        let mut queue: Vec<(B256, TrackedRequest)> = self
            .pending
            .iter()
            .map(|(id, tracked)| (*id, tracked.clone()))
            .collect();
        queue.sort_by_key(|(id, tracked)| (tracked.submitted_at, *id));

        let ctx = Context::new(self.executor, height, gas_price);
        let mut report = SweepReport::default();

        for (id, tracked) in queue {
            let kind = tracked.request.kind();
            debug!(
                "Sweeping {} request {} (gas budget {})",
                kind,
                hex::encode(id),
                FeeEngine::new(&router.config().fees).execution_gas_budget(kind)
            );

            let result = match &tracked.request {
                AnyRequest::Mint(request) => {
                    router.execute_or_cancel(host, &ctx, request, self.fee_receiver)
                }
                AnyRequest::Burn(request) => {
                    router.execute_or_cancel(host, &ctx, request, self.fee_receiver)
                }
            };

            match result {
                Ok(Outcome::Executed { split, .. }) => {
                    report.executed += 1;
                    self.pending.remove(&id);
                    info!(
                        "Executed {} request {}, earned {}",
                        kind,
                        hex::encode(id),
                        split.to_executor
                    );
                }
                Ok(Outcome::Cancelled) => {
                    report.cancelled += 1;
                    self.pending.remove(&id);
                }
                Ok(Outcome::Absent) => {
                    self.pending.remove(&id);
                }
                Ok(Outcome::Skipped) | Ok(Outcome::Deferred) => {
                    report.skipped += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    if e.is_recoverable() {
                        warn!("Retryable error sweeping {}: {}", hex::encode(id), e);
                    } else {
                        error!("Dropping {} after sweep error: {}", hex::encode(id), e);
                        self.pending.remove(&id);
                    }
                }
            }
        }

        metrics::record_keeper_sweep(self.pending.len());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::StaticAuthority;
    use crate::config::{DelayValues, FeeSettings, GasLimits, RouterConfig, MULTIPLIER_DIVISOR};
    use crate::ledger::{MemoryLedger, MemoryMarket, NativeWrapper, Token};
    use crate::request::MintRequest;

    const ROUTER: Address = Address::repeat_byte(0xa0);
    const ASSET: Address = Address::repeat_byte(0x40);
    const SHARE: Address = Address::repeat_byte(0x41);
    const EXECUTOR: Address = Address::repeat_byte(0xe1);
    const USER: Address = Address::repeat_byte(0x11);

    fn setup() -> (RequestRouter, MemoryLedger, Keeper) {
        let config = RouterConfig::new(
            DelayValues {
                min_delay_executor: 10,
                min_delay_public: 3000,
                max_delay: 6000,
            },
            FeeSettings {
                estimated_gas_limit: GasLimits {
                    mint: 1_000,
                    burn: 1_000,
                },
                estimated_gas_fee_multiplier: MULTIPLIER_DIVISOR,
                execution_gas_fee_multiplier: MULTIPLIER_DIVISOR,
                execution_overhead_gas_limit: 0,
                native_transfer_gas_limit: 10_000,
            },
        )
        .unwrap()
        .with_executors([EXECUTOR]);

        let stable = Address::repeat_byte(0x02);
        let router = RequestRouter::new(ROUTER, stable, config, StaticAuthority::default());
        let mut ledger = MemoryLedger::new(
            Address::repeat_byte(0x01),
            stable,
            Address::repeat_byte(0x03),
        );
        ledger.add_market(ASSET, MemoryMarket::new(SHARE));
        ledger.fund_native(USER, U256::from(1_000_000u64));
        ledger.mint_token(ASSET, USER, U256::from(1_000u64));
        ledger.approve(ASSET, USER, ROUTER, U256::MAX);

        (router, ledger, Keeper::new(EXECUTOR, EXECUTOR))
    }

    fn submit(
        router: &mut RequestRouter,
        ledger: &mut MemoryLedger,
        keeper: &mut Keeper,
        amount: u64,
        height: u64,
    ) -> B256 {
        let fee = U256::from(1_000u64);
        let request = MintRequest::mint(USER, ASSET, U256::from(amount), USER, fee);
        let ctx = Context::new(USER, height, U256::from(1)).with_value(fee);
        let id = router.submit_mint(ledger, &ctx, request, None).unwrap();
        for event in router.take_events() {
            keeper.observe(&event);
        }
        id
    }

    #[test]
    fn test_sweep_executes_pending() {
        let (mut router, mut ledger, mut keeper) = setup();
        let first = submit(&mut router, &mut ledger, &mut keeper, 100, 5);
        let second = submit(&mut router, &mut ledger, &mut keeper, 200, 3);
        assert_eq!(keeper.pending_count(), 2);

        let report = keeper.sweep(&mut router, &mut ledger, 6, U256::from(1));
        assert_eq!(
            report,
            SweepReport {
                executed: 2,
                ..Default::default()
            }
        );
        assert_eq!(keeper.pending_count(), 0);
        assert_eq!(router.height_of(&first), None);
        assert_eq!(router.height_of(&second), None);
        assert_eq!(ledger.balance_of(SHARE, USER), U256::from(300));
        assert_eq!(ledger.native_balance(EXECUTOR), U256::from(2_000));
    }

    #[test]
    fn test_sweep_skips_then_cancels_on_engine_failure() {
        let (mut router, mut ledger, mut keeper) = setup();
        let id = submit(&mut router, &mut ledger, &mut keeper, 100, 5);
        ledger.halt_engine("paused");

        let report = keeper.sweep(&mut router, &mut ledger, 6, U256::from(1));
        assert_eq!(report.skipped, 1);
        assert!(keeper.is_tracking(&id));

        let report = keeper.sweep(&mut router, &mut ledger, 15, U256::from(1));
        assert_eq!(report.cancelled, 1);
        assert!(!keeper.is_tracking(&id));
        assert_eq!(ledger.balance_of(ASSET, USER), U256::from(1_000));
    }

    #[test]
    fn test_observe_drops_terminal_requests() {
        let (mut router, mut ledger, mut keeper) = setup();
        let id = submit(&mut router, &mut ledger, &mut keeper, 100, 5);

        let ctx = Context::new(USER, 3005, U256::from(1));
        let request = MintRequest::mint(USER, ASSET, U256::from(100), USER, U256::from(1_000u64));
        router.cancel(&mut ledger, &ctx, &request, USER).unwrap();
        for event in router.take_events() {
            keeper.observe(&event);
        }
        assert!(!keeper.is_tracking(&id));
    }

    #[test]
    fn test_sweep_forgets_requests_settled_elsewhere() {
        let (mut router, mut ledger, mut keeper) = setup();
        submit(&mut router, &mut ledger, &mut keeper, 100, 5);

        // Settled without the keeper seeing the event
        let request = MintRequest::mint(USER, ASSET, U256::from(100), USER, U256::from(1_000u64));
        let ctx = Context::new(EXECUTOR, 6, U256::from(1));
        router.execute(&mut ledger, &ctx, &request, EXECUTOR).unwrap();

        let report = keeper.sweep(&mut router, &mut ledger, 7, U256::from(1));
        assert_eq!(report, SweepReport::default());
        assert_eq!(keeper.pending_count(), 0);
    }
}
