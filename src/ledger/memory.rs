//! In-memory host used by tests and the devnet binary

use super::{
    permit_digest, EngineOutput, Journal, LiquidityEngine, NativeWrapper, Permit, PermitVerifier,
    Token,
};
use crate::error::{EngineError, TokenError};

use alloy_primitives::{Address, U256};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Basis-point denominator for memory market rates
pub const BPS: u64 = 10_000;

/// A pool known to the in-memory engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMarket {
    pub share_token: Address,
    /// Shares minted per unit of underlying, in basis points
    pub share_rate_bps: u64,
    /// Stable units per unit of underlying, in basis points
    pub stable_rate_bps: u64,
}

impl MemoryMarket {
    pub fn new(share_token: Address) -> Self {
        Self {
            share_token,
            share_rate_bps: BPS,
            stable_rate_bps: BPS,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    /// (token, owner) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    /// (token, owner) -> next permit nonce
    permit_nonces: HashMap<(Address, Address), u64>,
    native: HashMap<Address, U256>,
}

/// Balances, allowances, native currency, a wrapper and a fixed-rate engine
#[derive(Debug)]
pub struct MemoryLedger {
    state: LedgerState,
    checkpoints: Vec<LedgerState>,
    wrapper: Address,
    stable_token: Address,
    engine: Address,
    markets: HashMap<Address, MemoryMarket>,
    native_rejecting: HashSet<Address>,
    halted: Option<String>,
}

impl MemoryLedger {
    pub fn new(wrapper: Address, stable_token: Address, engine: Address) -> Self {
        Self {
            state: LedgerState::default(),
            checkpoints: Vec::new(),
            wrapper,
            stable_token,
            engine,
            markets: HashMap::new(),
            native_rejecting: HashSet::new(),
            halted: None,
        }
    }

    pub fn add_market(&mut self, asset: Address, market: MemoryMarket) {
        self.markets.insert(asset, market);
    }

    pub fn market_mut(&mut self, asset: &Address) -> Option<&mut MemoryMarket> {
        self.markets.get_mut(asset)
    }

    pub fn stable_token(&self) -> Address {
        self.stable_token
    }

    /// Credit `amount` of `token` out of thin air
    pub fn mint_token(&mut self, token: Address, owner: Address, amount: U256) {
        *self.state.balances.entry((token, owner)).or_default() += amount;
    }

    pub fn fund_native(&mut self, owner: Address, amount: U256) {
        *self.state.native.entry(owner).or_default() += amount;
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state.allowances.insert((token, owner, spender), amount);
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Produce a valid permit for the owner's next nonce
    pub fn sign_permit(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: u64,
    ) -> Permit {
        let nonce = self.nonce(token, owner);
        Permit {
            value,
            deadline,
            signature: permit_digest(token, owner, spender, value, nonce, deadline),
        }
    }

    /// Make `account` refuse native-currency payments
    pub fn reject_native(&mut self, account: Address) {
        self.native_rejecting.insert(account);
    }

    /// Make every engine call revert with `reason`
    pub fn halt_engine(&mut self, reason: impl Into<String>) {
        self.halted = Some(reason.into());
    }

    pub fn resume_engine(&mut self) {
        self.halted = None;
    }

    fn nonce(&self, token: Address, owner: Address) -> u64 {
        self.state
            .permit_nonces
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    fn debit(&mut self, token: Address, owner: Address, amount: U256) -> Result<(), TokenError> {
        let balance = self.state.balances.entry((token, owner)).or_default();
        if *balance < amount {
            return Err(TokenError::InsufficientBalance {
                owner,
                have: *balance,
                need: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn debit_native(&mut self, owner: Address, amount: U256) -> Result<(), TokenError> {
        let balance = self.state.native.entry(owner).or_default();
        if *balance < amount {
            return Err(TokenError::InsufficientBalance {
                owner,
                have: *balance,
                need: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn market(&self, market: Address) -> Result<MemoryMarket, EngineError> {
        if let Some(reason) = &self.halted {
            return Err(EngineError::Reverted(reason.clone()));
        }
        self.markets
            .get(&market)
            .copied()
            .ok_or(EngineError::UnknownMarket(market))
    }
}

fn scale(amount: U256, numerator: u64, denominator: u64) -> U256 {
    amount * U256::from(numerator) / U256::from(denominator)
}

impl Token for MemoryLedger {
    fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.state
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.debit(token, from, amount)?;
        self.mint_token(token, to, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let allowance = self.allowance(token, from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                spender,
                have: allowance,
                need: amount,
            });
        }
        self.debit(token, from, amount)?;
        self.mint_token(token, to, amount);
        self.approve(token, from, spender, allowance - amount);
        Ok(())
    }
}

impl PermitVerifier for MemoryLedger {
    fn permit(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        permit: &Permit,
        height: u64,
    ) -> Result<(), TokenError> {
        if permit.deadline < height {
            return Err(TokenError::PermitExpired(permit.deadline));
        }
        let nonce = self.nonce(token, owner);
        let expected = permit_digest(token, owner, spender, permit.value, nonce, permit.deadline);
        if permit.signature != expected {
            return Err(TokenError::InvalidSignature);
        }
        self.state.permit_nonces.insert((token, owner), nonce + 1);
        self.approve(token, owner, spender, permit.value);
        Ok(())
    }
}

impl NativeWrapper for MemoryLedger {
    fn wrapper(&self) -> Address {
        self.wrapper
    }

    fn native_balance(&self, owner: Address) -> U256 {
        self.state.native.get(&owner).copied().unwrap_or_default()
    }

    fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.debit_native(from, amount)?;
        self.fund_native(to, amount);
        Ok(())
    }

    fn send_native(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
        gas_limit: u64,
    ) -> Result<(), TokenError> {
        if gas_limit == 0 || self.native_rejecting.contains(&to) {
            return Err(TokenError::NativeTransferRejected(to));
        }
        self.transfer_native(from, to, amount)
    }

    fn deposit(&mut self, holder: Address, amount: U256) -> Result<(), TokenError> {
        self.debit_native(holder, amount)?;
        self.fund_native(self.wrapper, amount);
        self.mint_token(self.wrapper, holder, amount);
        Ok(())
    }
}

impl LiquidityEngine for MemoryLedger {
    fn engine_address(&self) -> Address {
        self.engine
    }

    fn share_token(&self, market: Address) -> Result<Address, EngineError> {
        self.markets
            .get(&market)
            .map(|m| m.share_token)
            .ok_or(EngineError::UnknownMarket(market))
    }

    fn mint(
        &mut self,
        market: Address,
        amount_in: U256,
        pay_with_stable: bool,
        receiver: Address,
    ) -> Result<EngineOutput, EngineError> {
        let pool = self.market(market)?;
        let (underlying, stable_leg_out) = if pay_with_stable {
            let underlying = scale(amount_in, BPS, pool.stable_rate_bps);
            (underlying, underlying)
        } else {
            (amount_in, U256::ZERO)
        };
        let shares = scale(underlying, pool.share_rate_bps, BPS);
        self.mint_token(pool.share_token, receiver, shares);

        debug!("Engine minted {} shares of {} for {}", shares, market, receiver);
        Ok(EngineOutput {
            amount_out: shares,
            stable_leg_out,
        })
    }

    fn burn(
        &mut self,
        market: Address,
        share_amount: U256,
        receive_stable: bool,
        receiver: Address,
    ) -> Result<EngineOutput, EngineError> {
        let pool = self.market(market)?;
        let underlying = scale(share_amount, BPS, pool.share_rate_bps);
        let stable_leg_out = if receive_stable {
            let stable = scale(underlying, pool.stable_rate_bps, BPS);
            self.mint_token(self.stable_token, receiver, stable);
            stable
        } else {
            self.mint_token(market, receiver, underlying);
            U256::ZERO
        };

        debug!("Engine burned {} shares of {} for {}", share_amount, market, receiver);
        Ok(EngineOutput {
            amount_out: underlying,
            stable_leg_out,
        })
    }
}

impl Journal for MemoryLedger {
    fn checkpoint(&mut self) -> usize {
        self.checkpoints.push(self.state.clone());
        self.checkpoints.len() - 1
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.checkpoints.truncate(checkpoint + 1);
        if let Some(saved) = self.checkpoints.pop() {
            self.state = saved;
        }
    }

    fn commit(&mut self, checkpoint: usize) {
        self.checkpoints.truncate(checkpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> MemoryLedger {
        MemoryLedger::new(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Address::repeat_byte(0x03),
        )
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut ledger = ledger();
        let token = Address::repeat_byte(0x10);
        let owner = Address::repeat_byte(0x20);
        let spender = Address::repeat_byte(0x30);

        ledger.mint_token(token, owner, U256::from(100));
        ledger.approve(token, owner, spender, U256::from(60));

        ledger
            .transfer_from(token, spender, owner, spender, U256::from(50))
            .unwrap();
        assert_eq!(ledger.allowance(token, owner, spender), U256::from(10));
        assert_eq!(
            ledger.transfer_from(token, spender, owner, spender, U256::from(20)),
            Err(TokenError::InsufficientAllowance {
                spender,
                have: U256::from(10),
                need: U256::from(20),
            })
        );
    }

    #[test]
    fn test_permit_nonce_and_replay() {
        let mut ledger = ledger();
        let token = Address::repeat_byte(0x10);
        let owner = Address::repeat_byte(0x20);
        let spender = Address::repeat_byte(0x30);

        let permit = ledger.sign_permit(token, owner, spender, U256::from(5), 100);
        ledger.permit(token, owner, spender, &permit, 50).unwrap();
        assert_eq!(ledger.allowance(token, owner, spender), U256::from(5));

        // Nonce advanced, so the same signature no longer verifies
        assert_eq!(
            ledger.permit(token, owner, spender, &permit, 50),
            Err(TokenError::InvalidSignature)
        );

        let late = ledger.sign_permit(token, owner, spender, U256::from(5), 10);
        assert_eq!(
            ledger.permit(token, owner, spender, &late, 11),
            Err(TokenError::PermitExpired(10))
        );
    }

    #[test]
    fn test_nested_checkpoints() {
        let mut ledger = ledger();
        let token = Address::repeat_byte(0x10);
        let owner = Address::repeat_byte(0x20);

        let outer = ledger.checkpoint();
        ledger.mint_token(token, owner, U256::from(1));
        let inner = ledger.checkpoint();
        ledger.mint_token(token, owner, U256::from(2));
        ledger.rollback(inner);
        assert_eq!(ledger.balance_of(token, owner), U256::from(1));
        ledger.commit(outer);
        assert_eq!(ledger.balance_of(token, owner), U256::from(1));

        let again = ledger.checkpoint();
        ledger.mint_token(token, owner, U256::from(5));
        ledger.rollback(again);
        assert_eq!(ledger.balance_of(token, owner), U256::from(1));
    }

    #[test]
    fn test_send_native_rejection() {
        let mut ledger = ledger();
        let from = Address::repeat_byte(0x20);
        let to = Address::repeat_byte(0x30);
        ledger.fund_native(from, U256::from(10));
        ledger.reject_native(to);

        assert_eq!(
            ledger.send_native(from, to, U256::from(5), 10_000),
            Err(TokenError::NativeTransferRejected(to))
        );
        assert_eq!(ledger.native_balance(from), U256::from(10));
    }

    #[test]
    fn test_engine_rates_and_halt() {
        let mut ledger = ledger();
        let asset = Address::repeat_byte(0x40);
        let share = Address::repeat_byte(0x41);
        let receiver = Address::repeat_byte(0x50);
        let mut market = MemoryMarket::new(share);
        market.share_rate_bps = 2 * BPS;
        ledger.add_market(asset, market);

        let out = ledger.mint(asset, U256::from(100), false, receiver).unwrap();
        assert_eq!(out.amount_out, U256::from(200));
        assert_eq!(ledger.balance_of(share, receiver), U256::from(200));

        ledger.halt_engine("paused");
        assert_eq!(
            ledger.burn(asset, U256::from(200), false, receiver),
            Err(EngineError::Reverted("paused".into()))
        );
    }
}
