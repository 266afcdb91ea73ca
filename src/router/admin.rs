//! Governor-gated parameter updates

use super::RequestRouter;
use crate::config::DelayValues;
use crate::error::{RouterError, RouterResult};
use crate::events::RouterEvent;
use crate::request::RequestKind;

use alloy_primitives::Address;
use tracing::info;

impl RequestRouter {
    fn ensure_governor(&self, caller: &Address) -> RouterResult<()> {
        if self.authority.is_governor(caller) {
            Ok(())
        } else {
            Err(RouterError::Forbidden)
        }
    }

    pub fn update_executor(
        &mut self,
        caller: &Address,
        account: Address,
        is_active: bool,
    ) -> RouterResult<()> {
        self.ensure_governor(caller)?;

        let was_active = if is_active {
            !self.config.executors.insert(account)
        } else {
            self.config.executors.remove(&account)
        };

        info!("Executor {} active: {} -> {}", account, was_active, is_active);
        self.events.push(RouterEvent::ExecutorUpdated {
            account,
            was_active,
            is_active,
        });
        Ok(())
    }

    pub fn update_delay_values(&mut self, caller: &Address, delays: DelayValues) -> RouterResult<()> {
        self.ensure_governor(caller)?;
        delays.validate()?;

        let old = std::mem::replace(&mut self.config.delays, delays);
        info!("Delay values updated: {:?} -> {:?}", old, delays);
        self.events.push(RouterEvent::DelayValuesUpdated { old, new: delays });
        Ok(())
    }

    pub fn update_estimated_gas_limit(
        &mut self,
        caller: &Address,
        kind: RequestKind,
        limit: u64,
    ) -> RouterResult<()> {
        self.ensure_governor(caller)?;

        let old = self.config.fees.estimated_gas_limit.set(kind, limit);
        info!("Estimated gas limit for {} updated: {} -> {}", kind, old, limit);
        self.events.push(RouterEvent::EstimatedGasLimitUpdated {
            kind,
            old,
            new: limit,
        });
        Ok(())
    }

    pub fn update_execution_overhead_gas_limit(
        &mut self,
        caller: &Address,
        limit: u64,
    ) -> RouterResult<()> {
        self.ensure_governor(caller)?;

        let old = std::mem::replace(&mut self.config.fees.execution_overhead_gas_limit, limit);
        info!("Execution overhead gas limit updated: {} -> {}", old, limit);
        self.events
            .push(RouterEvent::ExecutionOverheadGasLimitUpdated { old, new: limit });
        Ok(())
    }

    pub fn update_native_transfer_gas_limit(
        &mut self,
        caller: &Address,
        limit: u64,
    ) -> RouterResult<()> {
        self.ensure_governor(caller)?;

        let old = std::mem::replace(&mut self.config.fees.native_transfer_gas_limit, limit);
        info!("Native transfer gas limit updated: {} -> {}", old, limit);
        self.events
            .push(RouterEvent::NativeTransferGasLimitUpdated { old, new: limit });
        Ok(())
    }

    pub fn update_estimated_gas_fee_multiplier(
        &mut self,
        caller: &Address,
        multiplier: u64,
    ) -> RouterResult<()> {
        self.ensure_governor(caller)?;

        let old = std::mem::replace(
            &mut self.config.fees.estimated_gas_fee_multiplier,
            multiplier,
        );
        info!("Estimated gas fee multiplier updated: {} -> {}", old, multiplier);
        self.events.push(RouterEvent::EstimatedGasFeeMultiplierUpdated {
            old,
            new: multiplier,
        });
        Ok(())
    }

    pub fn update_execution_gas_fee_multiplier(
        &mut self,
        caller: &Address,
        multiplier: u64,
    ) -> RouterResult<()> {
        self.ensure_governor(caller)?;

        let old = std::mem::replace(
            &mut self.config.fees.execution_gas_fee_multiplier,
            multiplier,
        );
        info!("Execution gas fee multiplier updated: {} -> {}", old, multiplier);
        self.events.push(RouterEvent::ExecutionGasFeeMultiplierUpdated {
            old,
            new: multiplier,
        });
        Ok(())
    }
}
