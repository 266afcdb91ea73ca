//! Submission, cancellation and execution of requests

use super::custody::{self, pay_native};
use super::{Context, Flow, Outcome, RequestRouter};
use crate::error::{RouterError, RouterResult};
use crate::events::RouterEvent;
use crate::fees::FeeEngine;
use crate::ledger::{EngineOutput, Host, Permit};
use crate::metrics;
use crate::policy::{AuthorizationPolicy, Decision};
use crate::request::{BurnRequest, MintRequest, Request, StableLeg};
use crate::state::PendingEntry;

use alloy_primitives::{Address, B256, U256};
use tracing::{debug, info, warn};

/// Where a submission's deposit comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deposit {
    /// Pulled from the submitter's token balance
    Token,
    /// Attached as native value and wrapped
    Native,
}

impl RequestRouter {
    /// Submit a request, escrowing its deposit and prepaid fee. The attached
    /// value must cover the minimum fee and the declared fee; any surplus is
    /// returned to the caller.
    ///
    /// A supplied permit is applied best-effort: if it does not verify, the
    /// deposit transfer fails on allowance instead.
    pub fn submit<D: Flow, H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: Request<D>,
        permit: Option<Permit>,
    ) -> RouterResult<B256> {
        self.atomically(host, |router, host| {
            router.submit_inner(host, ctx, request, permit.as_ref(), Deposit::Token)
        })
    }

    pub fn submit_mint<H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: MintRequest,
        permit: Option<Permit>,
    ) -> RouterResult<B256> {
        self.submit(host, ctx, request, permit)
    }

    pub fn submit_burn<H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: BurnRequest,
        permit: Option<Permit>,
    ) -> RouterResult<B256> {
        self.submit(host, ctx, request, permit)
    }

    /// Submit a mint into the wrapped-native market paying the deposit in
    /// native currency: attached value is `amount + execution_fee`
    pub fn submit_mint_native<H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: MintRequest,
    ) -> RouterResult<B256> {
        let wrapper = host.wrapper();
        if request.market != wrapper || request.stable != StableLeg::None {
            return Err(RouterError::InvalidRequest(format!(
                "native deposits go to the wrapped-native market {}",
                wrapper
            )));
        }

        self.atomically(host, |router, host| {
            router.submit_inner(host, ctx, request, None, Deposit::Native)
        })
    }

    /// Cancel a pending request. Deposit goes back to its owner, the whole
    /// prepaid fee to `fee_receiver`. Absent requests and executor calls
    /// before `min_delay_executor` are no-ops.
    pub fn cancel<D: Flow, H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: &Request<D>,
        fee_receiver: Address,
    ) -> RouterResult<Outcome> {
        self.atomically(host, |router, host| {
            router.cancel_inner(host, ctx, request, fee_receiver)
        })
    }

    /// Execute a pending request through the liquidity engine and settle the
    /// prepaid fee. Absent requests are a no-op.
    pub fn execute<D: Flow, H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: &Request<D>,
        fee_receiver: Address,
    ) -> RouterResult<Outcome> {
        self.atomically(host, |router, host| {
            router.execute_inner(host, ctx, request, fee_receiver)
        })
    }

    /// Executor-only: try to execute; if that fails, record why and cancel
    /// instead. A failure on a request that is neither expired nor past
    /// `min_delay_executor` leaves it untouched and emits nothing.
    pub fn execute_or_cancel<D: Flow, H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: &Request<D>,
        fee_receiver: Address,
    ) -> RouterResult<Outcome> {
        if !self.config.is_executor(&ctx.caller) {
            return Err(RouterError::Forbidden);
        }

        self.atomically(host, |router, host| {
            let id = request.id();
            let Some(entry) = router.store.entry(&id).copied() else {
                return Ok(Outcome::Absent);
            };

            let err = match router.atomically(host, |router, host| {
                router.execute_inner(host, ctx, request, fee_receiver)
            }) {
                Ok(outcome) => return Ok(outcome),
                Err(e) => e,
            };

            if AuthorizationPolicy::new(&router.config).should_skip(&entry, ctx.height) {
                debug!(
                    "Execute of {} failed before the cancel window opened: {}",
                    hex::encode(id),
                    err
                );
                return Ok(Outcome::Skipped);
            }

            warn!("Execute of {} failed, cancelling: {}", hex::encode(id), err);
            router.events.push(RouterEvent::ExecuteFailed {
                kind: D::KIND,
                id,
                reason: err.to_string(),
            });

            let outcome = router.cancel_inner(host, ctx, request, fee_receiver)?;
            metrics::record_execute_failed(D::KIND, err.code());
            Ok(outcome)
        })
    }

    /// Native currency may only be sent to the router by the wrapper
    pub fn receive_native<H: Host>(&mut self, host: &mut H, ctx: &Context) -> RouterResult<()> {
        let wrapper = host.wrapper();
        if ctx.caller != wrapper {
            return Err(RouterError::InvalidCaller(wrapper));
        }

        self.atomically(host, |router, host| {
            host.transfer_native(ctx.caller, router.address, ctx.value)?;
            Ok(())
        })
    }

    fn submit_inner<D: Flow, H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: Request<D>,
        permit: Option<&Permit>,
        deposit: Deposit,
    ) -> RouterResult<B256> {
        if ctx.caller != request.account {
            return Err(RouterError::Forbidden);
        }

        let native_deposit = match deposit {
            Deposit::Token => U256::ZERO,
            Deposit::Native => request.amount,
        };
        let paid = ctx.value.saturating_sub(native_deposit);
        let required = FeeEngine::new(&self.config.fees).minimum_fee(D::KIND, ctx.gas_price);
        if paid < required {
            return Err(RouterError::InsufficientExecutionFee { paid, required });
        }
        if request.execution_fee < required {
            return Err(RouterError::InsufficientExecutionFee {
                paid: request.execution_fee,
                required,
            });
        }

        // The declared fee is escrowed; anything attached above it goes back
        let expected = request.execution_fee.saturating_add(native_deposit);
        if ctx.value < expected {
            return Err(RouterError::InvalidAttachedValue {
                expected,
                attached: ctx.value,
            });
        }

        let id = request.id();
        if self.store.contains(&id) {
            return Err(RouterError::ConflictRequest(id));
        }

        host.transfer_native(ctx.caller, self.address, ctx.value)?;
        pay_native(
            host,
            self.address,
            ctx.caller,
            ctx.value - expected,
            self.config.fees.native_transfer_gas_limit,
        )?;

        let deposit_token = match deposit {
            Deposit::Native => {
                host.deposit(self.address, native_deposit)?;
                host.wrapper()
            }
            Deposit::Token => {
                let token = D::deposit_token(&request, self.stable_token, host)?;
                custody::pre_authorize(host, token, ctx.caller, self.address, permit, ctx.height);
                host.transfer_from(token, self.address, ctx.caller, self.address, request.amount)?;
                token
            }
        };

        self.store.insert(
            id,
            PendingEntry {
                submitted_at: ctx.height,
                gas_price: ctx.gas_price,
                deposit_token,
                deposit_amount: request.amount,
            },
        )?;

        info!(
            "Created {} request {} for {} at height {} (fee {})",
            D::KIND,
            hex::encode(id),
            request.account,
            ctx.height,
            request.execution_fee
        );
        metrics::record_request_created(D::KIND);
        self.events.push(RouterEvent::Created {
            id,
            height: ctx.height,
            gas_price: ctx.gas_price,
            request: request.into_any(),
        });

        Ok(id)
    }

    fn cancel_inner<D: Flow, H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: &Request<D>,
        fee_receiver: Address,
    ) -> RouterResult<Outcome> {
        let id = request.id();
        let Some(entry) = self.store.entry(&id).copied() else {
            return Ok(Outcome::Absent);
        };

        let policy = AuthorizationPolicy::new(&self.config);
        if policy.can_cancel(&ctx.caller, &request.account, &entry, ctx.height)? == Decision::Defer
        {
            debug!(
                "Cancel of {} by {} deferred at height {}",
                hex::encode(id),
                ctx.caller,
                ctx.height
            );
            return Ok(Outcome::Deferred);
        }

        let recipient = D::deposit_recipient(request);
        host.transfer(entry.deposit_token, self.address, recipient, entry.deposit_amount)?;
        pay_native(
            host,
            self.address,
            fee_receiver,
            request.execution_fee,
            self.config.fees.native_transfer_gas_limit,
        )?;

        self.store.remove(&id);

        info!("Cancelled {} request {} by {}", D::KIND, hex::encode(id), ctx.caller);
        metrics::record_request_cancelled(D::KIND);
        self.events.push(RouterEvent::Cancelled {
            kind: D::KIND,
            id,
            canceller: ctx.caller,
            deposit_recipient: recipient,
            fee_receiver,
            execution_fee: request.execution_fee,
        });

        Ok(Outcome::Cancelled)
    }

    fn execute_inner<D: Flow, H: Host>(
        &mut self,
        host: &mut H,
        ctx: &Context,
        request: &Request<D>,
        fee_receiver: Address,
    ) -> RouterResult<Outcome> {
        let id = request.id();
        let Some(entry) = self.store.entry(&id).copied() else {
            return Ok(Outcome::Absent);
        };

        let policy = AuthorizationPolicy::new(&self.config);
        if policy.can_execute(&ctx.caller, &request.account, &entry, ctx.height)? == Decision::Defer
        {
            return Ok(Outcome::Deferred);
        }

        let engine = host.engine_address();
        host.transfer(entry.deposit_token, self.address, engine, entry.deposit_amount)?;
        let output = D::run_engine(request, host)?;
        check_floors(request, &output)?;

        let fees = FeeEngine::new(&self.config.fees);
        let split = fees.settle(request.execution_fee, entry.gas_price, ctx.gas_price);
        pay_native(
            host,
            self.address,
            fee_receiver,
            split.to_executor,
            fees.native_transfer_gas_limit(),
        )?;
        pay_native(
            host,
            self.address,
            request.account,
            split.to_submitter,
            fees.native_transfer_gas_limit(),
        )?;

        self.store.remove(&id);

        info!(
            "Executed {} request {} by {}: out {}, executor fee {}, refund {}",
            D::KIND,
            hex::encode(id),
            ctx.caller,
            output.amount_out,
            split.to_executor,
            split.to_submitter
        );
        metrics::record_request_executed(D::KIND, split.to_executor);
        self.events.push(RouterEvent::Executed {
            kind: D::KIND,
            id,
            executor: ctx.caller,
            fee_receiver,
            amount_out: output.amount_out,
            stable_leg_out: output.stable_leg_out,
            executor_fee: split.to_executor,
            submitter_refund: split.to_submitter,
        });

        Ok(Outcome::Executed { split, output })
    }
}

/// Slippage floors: `min_out` on the engine's main output, and the stable
/// leg's own floor when the request routes through the stable coin
fn check_floors<D>(request: &Request<D>, output: &EngineOutput) -> RouterResult<()> {
    if output.amount_out < request.min_out {
        return Err(RouterError::TooLittleReceived {
            floor: request.min_out,
            actual: output.amount_out,
        });
    }

    if let StableLeg::Stable { min_out } = request.stable {
        if output.stable_leg_out < min_out {
            return Err(RouterError::TooLittleReceived {
                floor: min_out,
                actual: output.stable_leg_out,
            });
        }
    }

    Ok(())
}
