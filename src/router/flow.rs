//! Direction-specific custody and engine hooks

use crate::error::{EngineError, RouterResult};
use crate::ledger::{EngineOutput, Host};
use crate::request::{Burn, Direction, Mint, Request};

use alloy_primitives::Address;

/// What differs between a mint and a burn once the shared lifecycle is
/// factored out
pub trait Flow: Direction {
    /// Token escrowed by the router while the request is pending. Resolved
    /// once at submission and kept in the pending entry.
    fn deposit_token<H: Host>(
        request: &Request<Self>,
        stable_token: Address,
        host: &H,
    ) -> RouterResult<Address>;

    /// Who gets the deposit back when the request is cancelled
    fn deposit_recipient(request: &Request<Self>) -> Address;

    fn run_engine<H: Host>(request: &Request<Self>, host: &mut H)
        -> Result<EngineOutput, EngineError>;
}

impl Flow for Mint {
    fn deposit_token<H: Host>(
        request: &Request<Self>,
        stable_token: Address,
        _host: &H,
    ) -> RouterResult<Address> {
        Ok(if request.stable.is_stable() {
            stable_token
        } else {
            request.market
        })
    }

    fn deposit_recipient(request: &Request<Self>) -> Address {
        request.account
    }

    fn run_engine<H: Host>(
        request: &Request<Self>,
        host: &mut H,
    ) -> Result<EngineOutput, EngineError> {
        host.mint(
            request.market,
            request.amount,
            request.stable.is_stable(),
            request.receiver,
        )
    }
}

impl Flow for Burn {
    fn deposit_token<H: Host>(
        request: &Request<Self>,
        _stable_token: Address,
        host: &H,
    ) -> RouterResult<Address> {
        Ok(host.share_token(request.market)?)
    }

    fn deposit_recipient(request: &Request<Self>) -> Address {
        request.receiver
    }

    fn run_engine<H: Host>(
        request: &Request<Self>,
        host: &mut H,
    ) -> Result<EngineOutput, EngineError> {
        host.burn(
            request.market,
            request.amount,
            request.stable.is_stable(),
            request.receiver,
        )
    }
}
