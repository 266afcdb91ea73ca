//! Content-addressed request identity

use super::{Direction, Request, StableLeg};

use alloy_primitives::{B256, U256};
use sha3::{Digest, Keccak256};

/// Keccak-256 over every field of the request, one 32-byte word each.
///
/// The execution fee is part of the identity: resubmitting the same body with
/// a higher fee creates an independent pending entry.
pub fn request_id<D: Direction>(request: &Request<D>) -> B256 {
    let (stable_flag, stable_min_out) = match request.stable {
        StableLeg::None => (U256::ZERO, U256::ZERO),
        StableLeg::Stable { min_out } => (U256::from(1), min_out),
    };

    let mut hasher = Keccak256::new();
    hasher.update(U256::from(D::KIND.tag()).to_be_bytes::<32>());
    hasher.update(request.account.into_word());
    hasher.update(request.market.into_word());
    hasher.update(request.amount.to_be_bytes::<32>());
    hasher.update(request.receiver.into_word());
    hasher.update(request.execution_fee.to_be_bytes::<32>());
    hasher.update(request.min_out.to_be_bytes::<32>());
    hasher.update(stable_flag.to_be_bytes::<32>());
    hasher.update(stable_min_out.to_be_bytes::<32>());

    B256::from_slice(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use crate::request::{BurnRequest, MintRequest};
    use alloy_primitives::{Address, U256};

    fn body() -> (Address, Address, U256, Address) {
        (
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0xbb),
            U256::from(1_000),
            Address::repeat_byte(0xcc),
        )
    }

    #[test]
    fn test_identity_is_deterministic() {
        let (account, market, amount, receiver) = body();
        let a = MintRequest::mint(account, market, amount, receiver, U256::from(10));
        let b = MintRequest::mint(account, market, amount, receiver, U256::from(10));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_fee_changes_identity() {
        let (account, market, amount, receiver) = body();
        let a = MintRequest::mint(account, market, amount, receiver, U256::from(10));
        let bumped = a.clone().with_execution_fee(U256::from(11));
        assert_ne!(a.id(), bumped.id());
    }

    #[test]
    fn test_direction_and_stable_leg_change_identity() {
        let (account, market, amount, receiver) = body();
        let mint = MintRequest::mint(account, market, amount, receiver, U256::from(10));
        let burn = BurnRequest::burn(account, market, amount, U256::ZERO, receiver, U256::from(10));
        assert_ne!(mint.id(), burn.id());

        let stable = mint.clone().with_stable(U256::ZERO);
        assert_ne!(mint.id(), stable.id());
    }
}
