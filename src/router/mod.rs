//! Request router
//!
//! The router:
//! 1. Escrows deposits and prepaid fees on submission
//! 2. Gates execution and cancellation on the authorization policy
//! 3. Hands deposits to the liquidity engine and splits the fee on execution
//! 4. Turns failed keeper executions into cancellations
//!
//! Every public call is all-or-nothing: host state is checkpointed before the
//! call body runs and rolled back on error, together with any events the call
//! buffered. The request store is only touched after every fallible step.

mod admin;
pub mod custody;
mod flow;
mod lifecycle;


pub use custody::{Payout, PermitOutcome};
pub use flow::Flow;

use crate::authority::Authority;
use crate::config::RouterConfig;
use crate::error::RouterResult;
use crate::events::RouterEvent;
use crate::fees::{FeeEngine, FeeSplit};
use crate::ledger::{EngineOutput, Host};
use crate::request::RequestKind;
use crate::state::RequestStore;

use alloy_primitives::{Address, B256, U256};

/// Per-call environment: who calls, with how much native value, at which
/// height and gas price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub caller: Address,
    pub value: U256,
    pub height: u64,
    pub gas_price: U256,
}

impl Context {
    pub fn new(caller: Address, height: u64, gas_price: U256) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            height,
            gas_price,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// What an execute / cancel style call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No such pending request
    Absent,
    /// Policy says not yet; nothing changed
    Deferred,
    /// Execute-or-cancel left a young request alone after a failed attempt
    Skipped,
    Executed { split: FeeSplit, output: EngineOutput },
    Cancelled,
}

impl Outcome {
    /// Whether the request left the store
    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::Executed { .. } | Outcome::Cancelled)
    }
}

/// Delayed-execution router for mint and burn requests
pub struct RequestRouter {
    /// Address custody is held under
    address: Address,
    stable_token: Address,
    config: RouterConfig,
    store: RequestStore,
    authority: Box<dyn Authority + Send + Sync>,
    events: Vec<RouterEvent>,
}

impl RequestRouter {
    pub fn new(
        address: Address,
        stable_token: Address,
        config: RouterConfig,
        authority: impl Authority + Send + Sync + 'static,
    ) -> Self {
        Self {
            address,
            stable_token,
            config,
            store: RequestStore::new(),
            authority: Box::new(authority),
            events: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn store(&self) -> &RequestStore {
        &self.store
    }

    /// Submission height of a pending request
    pub fn height_of(&self, id: &B256) -> Option<u64> {
        self.store.height_of(id)
    }

    pub fn minimum_fee(&self, kind: RequestKind, gas_price: U256) -> U256 {
        FeeEngine::new(&self.config.fees).minimum_fee(kind, gas_price)
    }

    /// Events emitted since the last `take_events`
    pub fn events(&self) -> &[RouterEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<RouterEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run `call` against a host checkpoint; on error roll back the host and
    /// drop the events the call emitted
    fn atomically<H, T>(
        &mut self,
        host: &mut H,
        call: impl FnOnce(&mut Self, &mut H) -> RouterResult<T>,
    ) -> RouterResult<T>
    where
        H: Host,
    {
        let checkpoint = host.checkpoint();
        let emitted = self.events.len();

        match call(self, host) {
            Ok(value) => {
                host.commit(checkpoint);
                Ok(value)
            }
            Err(e) => {
                host.rollback(checkpoint);
                self.events.truncate(emitted);
                Err(e)
            }
        }
    }
}
