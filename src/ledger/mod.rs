//! Boundary to the ledger the router runs against
//!
//! The router never owns balances. Tokens, permits, native currency and the
//! liquidity engine are reached through these traits, bundled as `Host`.
//! `Journal` gives every router call all-or-nothing semantics over the host.

mod memory;

pub use memory::{MemoryLedger, MemoryMarket, BPS};

use crate::error::{EngineError, TokenError};

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Off-chain signed allowance for `spender` over `value` of the owner's tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub value: U256,
    /// Last block height at which the permit may be applied
    pub deadline: u64,
    pub signature: B256,
}

/// Digest a permit signature must commit to
pub fn permit_digest(
    token: Address,
    owner: Address,
    spender: Address,
    value: U256,
    nonce: u64,
    deadline: u64,
) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(token.into_word());
    hasher.update(owner.into_word());
    hasher.update(spender.into_word());
    hasher.update(value.to_be_bytes::<32>());
    hasher.update(U256::from(nonce).to_be_bytes::<32>());
    hasher.update(U256::from(deadline).to_be_bytes::<32>());
    B256::from_slice(&hasher.finalize())
}

pub trait Token {
    fn balance_of(&self, token: Address, owner: Address) -> U256;

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` against the allowance `from` granted
    /// to `spender`
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;
}

pub trait PermitVerifier {
    fn permit(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        permit: &Permit,
        height: u64,
    ) -> Result<(), TokenError>;
}

/// Native currency and its wrapped token
pub trait NativeWrapper {
    /// Address of the wrapper, which is also the wrapped token
    fn wrapper(&self) -> Address;

    fn native_balance(&self, owner: Address) -> U256;

    /// Value attached to a call, moved before the call body runs
    fn transfer_native(&mut self, from: Address, to: Address, amount: U256)
        -> Result<(), TokenError>;

    /// Outbound payment forwarding at most `gas_limit` gas to the recipient;
    /// recipients may reject it
    fn send_native(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
        gas_limit: u64,
    ) -> Result<(), TokenError>;

    /// Wrap `amount` of the holder's native currency into the wrapped token
    fn deposit(&mut self, holder: Address, amount: U256) -> Result<(), TokenError>;
}

/// Amounts reported by the liquidity engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Mint: shares minted. Burn: underlying released.
    pub amount_out: U256,
    /// Mint: underlying obtained from the stable coin. Burn: stable received.
    /// Zero without a stable leg.
    pub stable_leg_out: U256,
}

/// Pool accounting; deposits are transferred to `engine_address` before
/// `mint` / `burn` is called
pub trait LiquidityEngine {
    fn engine_address(&self) -> Address;

    fn share_token(&self, market: Address) -> Result<Address, EngineError>;

    fn mint(
        &mut self,
        market: Address,
        amount_in: U256,
        pay_with_stable: bool,
        receiver: Address,
    ) -> Result<EngineOutput, EngineError>;

    fn burn(
        &mut self,
        market: Address,
        share_amount: U256,
        receive_stable: bool,
        receiver: Address,
    ) -> Result<EngineOutput, EngineError>;
}

/// Nested checkpoints over host state
pub trait Journal {
    fn checkpoint(&mut self) -> usize;

    /// Restore the state captured by `checkpoint`, discarding later ones
    fn rollback(&mut self, checkpoint: usize);

    /// Keep the current state and drop `checkpoint` and later ones
    fn commit(&mut self, checkpoint: usize);
}

/// Everything the router needs from its environment
pub trait Host: Token + PermitVerifier + NativeWrapper + LiquidityEngine + Journal {}

impl<T> Host for T where T: Token + PermitVerifier + NativeWrapper + LiquidityEngine + Journal {}
