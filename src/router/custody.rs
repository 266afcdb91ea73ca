//! Fund movements in and out of router custody

use crate::error::{RouterResult, TokenError};
use crate::ledger::{Host, Permit};

use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

/// Result of the best-effort permit step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermitOutcome {
    Skipped,
    Applied,
    /// The permit was not applied. The submission carries on and the
    /// following transfer fails with the token's own allowance error unless
    /// an allowance already exists.
    Rejected(TokenError),
}

/// Best-effort pre-authorization: apply a signed allowance if one is given,
/// never fail the surrounding call because of it
pub fn pre_authorize<H: Host>(
    host: &mut H,
    token: Address,
    owner: Address,
    spender: Address,
    permit: Option<&Permit>,
    height: u64,
) -> PermitOutcome {
    let Some(permit) = permit else {
        return PermitOutcome::Skipped;
    };

    match host.permit(token, owner, spender, permit, height) {
        Ok(()) => PermitOutcome::Applied,
        Err(e) => {
            debug!("Permit for {} on token {} not applied: {}", owner, token, e);
            PermitOutcome::Rejected(e)
        }
    }
}

/// How a native payout reached its recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payout {
    Zero,
    Native,
    /// The recipient refused native currency and got the wrapped token
    Wrapped,
}

/// Pay native currency out of custody with a bounded gas stipend, falling
/// back to the wrapped token when the recipient rejects the transfer
pub fn pay_native<H: Host>(
    host: &mut H,
    from: Address,
    to: Address,
    amount: U256,
    gas_limit: u64,
) -> RouterResult<Payout> {
    if amount.is_zero() {
        return Ok(Payout::Zero);
    }

    match host.send_native(from, to, amount, gas_limit) {
        Ok(()) => Ok(Payout::Native),
        Err(TokenError::NativeTransferRejected(_)) => {
            warn!("Native payout of {} to {} rejected, sending wrapped", amount, to);
            let wrapped = host.wrapper();
            host.deposit(from, amount)?;
            host.transfer(wrapped, from, to, amount)?;
            Ok(Payout::Wrapped)
        }
        Err(e) => Err(e.into()),
    }
}
