//! Request bodies for the two liquidity directions
//!
//! A mint and a burn share the same shape, so both are a single
//! `Request<D>` parameterised by a direction marker. The stable-coin leg
//! (`pay with stable` on a mint, `receive stable` on a burn) is a tagged
//! variant carrying its own slippage floor.

mod identity;

pub use identity::request_id;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Request family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Mint,
    Burn,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Mint => "mint",
            RequestKind::Burn => "burn",
        }
    }

    /// Tag mixed into the request identity
    pub(crate) fn tag(&self) -> u8 {
        match self {
            RequestKind::Mint => 1,
            RequestKind::Burn => 2,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction marker for `Request<D>`
pub trait Direction:
    fmt::Debug + Clone + Copy + Default + PartialEq + Eq + Send + Sync + 'static
{
    const KIND: RequestKind;

    fn into_any(request: Request<Self>) -> AnyRequest;
}

/// Deposit underlying (or stable), receive pool shares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mint;

/// Deposit pool shares, receive underlying (or stable)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Burn;

impl Direction for Mint {
    const KIND: RequestKind = RequestKind::Mint;

    fn into_any(request: Request<Self>) -> AnyRequest {
        AnyRequest::Mint(request)
    }
}

impl Direction for Burn {
    const KIND: RequestKind = RequestKind::Burn;

    fn into_any(request: Request<Self>) -> AnyRequest {
        AnyRequest::Burn(request)
    }
}

/// Optional stable-coin leg of a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StableLeg {
    #[default]
    None,
    /// Mint: pay with stable, `min_out` floors the underlying obtained by
    /// burning the stable. Burn: receive stable, `min_out` floors the stable
    /// amount received.
    Stable { min_out: U256 },
}

impl StableLeg {
    pub fn is_stable(&self) -> bool {
        matches!(self, StableLeg::Stable { .. })
    }

    pub fn min_out(&self) -> U256 {
        match self {
            StableLeg::None => U256::ZERO,
            StableLeg::Stable { min_out } => *min_out,
        }
    }
}

/// A liquidity request as submitted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request<D> {
    pub account: Address,
    /// Underlying asset token of the pool
    pub market: Address,
    /// Mint: amount of asset (or stable) in. Burn: share amount.
    pub amount: U256,
    pub receiver: Address,
    pub execution_fee: U256,
    /// Mint: floor on shares minted. Burn: acceptable minimum underlying out.
    pub min_out: U256,
    pub stable: StableLeg,
    #[serde(skip)]
    direction: PhantomData<D>,
}

pub type MintRequest = Request<Mint>;
pub type BurnRequest = Request<Burn>;

impl Request<Mint> {
    pub fn mint(
        account: Address,
        market: Address,
        amount_in: U256,
        receiver: Address,
        execution_fee: U256,
    ) -> Self {
        Self::new(account, market, amount_in, receiver, execution_fee, U256::ZERO)
    }
}

impl Request<Burn> {
    pub fn burn(
        account: Address,
        market: Address,
        share_amount: U256,
        acceptable_min_underlying_out: U256,
        receiver: Address,
        execution_fee: U256,
    ) -> Self {
        Self::new(
            account,
            market,
            share_amount,
            receiver,
            execution_fee,
            acceptable_min_underlying_out,
        )
    }
}

impl<D: Direction> Request<D> {
    fn new(
        account: Address,
        market: Address,
        amount: U256,
        receiver: Address,
        execution_fee: U256,
        min_out: U256,
    ) -> Self {
        Self {
            account,
            market,
            amount,
            receiver,
            execution_fee,
            min_out,
            stable: StableLeg::None,
            direction: PhantomData,
        }
    }

    /// Route the request through the stable coin with the given floor
    pub fn with_stable(mut self, min_out: U256) -> Self {
        self.stable = StableLeg::Stable { min_out };
        self
    }

    pub fn with_min_out(mut self, min_out: U256) -> Self {
        self.min_out = min_out;
        self
    }

    /// Same body with a different prepaid fee, i.e. a distinct identity
    pub fn with_execution_fee(mut self, execution_fee: U256) -> Self {
        self.execution_fee = execution_fee;
        self
    }

    pub fn kind(&self) -> RequestKind {
        D::KIND
    }

    pub fn id(&self) -> B256 {
        request_id(self)
    }

    pub fn into_any(self) -> AnyRequest {
        D::into_any(self)
    }
}

/// Either request family, for event payloads and keeper bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "request", rename_all = "lowercase")]
pub enum AnyRequest {
    Mint(MintRequest),
    Burn(BurnRequest),
}

impl AnyRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            AnyRequest::Mint(_) => RequestKind::Mint,
            AnyRequest::Burn(_) => RequestKind::Burn,
        }
    }

    pub fn id(&self) -> B256 {
        match self {
            AnyRequest::Mint(r) => r.id(),
            AnyRequest::Burn(r) => r.id(),
        }
    }

    pub fn account(&self) -> Address {
        match self {
            AnyRequest::Mint(r) => r.account,
            AnyRequest::Burn(r) => r.account,
        }
    }

    pub fn execution_fee(&self) -> U256 {
        match self {
            AnyRequest::Mint(r) => r.execution_fee,
            AnyRequest::Burn(r) => r.execution_fee,
        }
    }
}

impl From<MintRequest> for AnyRequest {
    fn from(request: MintRequest) -> Self {
        AnyRequest::Mint(request)
    }
}

impl From<BurnRequest> for AnyRequest {
    fn from(request: BurnRequest) -> Self {
        AnyRequest::Burn(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mint() -> MintRequest {
        MintRequest::mint(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            U256::from(100),
            Address::repeat_byte(1),
            U256::from(5_000),
        )
    }

    #[test]
    fn test_stable_leg_defaults_off() {
        let request = sample_mint();
        assert_eq!(request.stable, StableLeg::None);
        assert_eq!(request.stable.min_out(), U256::ZERO);

        let request = request.with_stable(U256::from(90));
        assert!(request.stable.is_stable());
        assert_eq!(request.stable.min_out(), U256::from(90));
    }

    #[test]
    fn test_any_request_round_trips_through_json() {
        let any: AnyRequest = sample_mint().with_stable(U256::from(7)).into();
        let json = serde_json::to_string(&any).unwrap();
        let back: AnyRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, any);
        assert_eq!(back.id(), any.id());
        assert_eq!(back.kind(), RequestKind::Mint);
    }
}
