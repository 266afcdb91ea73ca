//! Delayed-execution request router
//!
//! Users submit mint and burn requests against a liquidity engine together
//! with a prepaid execution fee. Whitelisted executors carry the requests out
//! in a later block, or cancel them once they can no longer execute. The
//! delay between submission and execution is what protects the engine from
//! same-block price manipulation.

pub mod authority;
pub mod config;
pub mod error;
pub mod events;
pub mod fees;
pub mod keeper;
pub mod ledger;
pub mod metrics;
pub mod policy;
pub mod request;
pub mod router;
pub mod state;

pub use authority::{Authority, StaticAuthority};
pub use config::{DelayValues, FeeSettings, GasLimits, RouterConfig, Settings};
pub use error::{RouterError, RouterResult};
pub use events::RouterEvent;
pub use keeper::{Keeper, SweepReport};
pub use request::{AnyRequest, BurnRequest, MintRequest, RequestKind, StableLeg};
pub use router::{Context, Outcome, RequestRouter};
