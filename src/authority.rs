//! Governance capability gating the admin surface

use alloy_primitives::Address;
use std::collections::HashSet;

#[cfg_attr(test, mockall::automock)]
pub trait Authority {
    fn is_governor(&self, account: &Address) -> bool;
}

/// Fixed set of governors, loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticAuthority {
    governors: HashSet<Address>,
}

impl StaticAuthority {
    pub fn new(governors: impl IntoIterator<Item = Address>) -> Self {
        Self {
            governors: governors.into_iter().collect(),
        }
    }
}

impl Authority for StaticAuthority {
    fn is_governor(&self, account: &Address) -> bool {
        self.governors.contains(account)
    }
}
