use serde::{Deserialize, Serialize};

use crate::errors::AmmError;

// ============================================================================
// TWAP ORACLE
// ============================================================================

/// Bounded-step price tracker embedded in every pool.
///
/// `last_observation` follows `last_price` but may only move by
/// `max_observation_change_per_update` per update, so a single large trade
/// cannot drag the average. `aggregator` integrates observations over slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwapOracle {
    pub last_updated_slot: u64,
    /// Raw spot price at the last update, scaled by PRICE_SCALE
    pub last_price: u128,
    /// Manipulation-resistant tracked price, scaled by PRICE_SCALE
    pub last_observation: u128,
    /// Running sum of `elapsed_slots * last_observation`.
    ///
    /// Wraps modulo 2^128 on overflow. Consumers computing a windowed TWAP
    /// from two snapshots must use wrapping subtraction.
    pub aggregator: u128,
    pub max_observation_change_per_update: u128,
    pub initial_observation: u128,
    /// Slots after creation before updates start aggregating
    #[serde(default)]
    pub start_delay_slots: u64,
    #[serde(default)]
    pub created_at_slot: u64,
}

/// Point-in-time copy of the aggregator, for windowed TWAPs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSnapshot {
    pub slot: u64,
    pub aggregator: u128,
}

impl TwapOracle {
    pub fn new(
        initial_observation: u128,
        max_observation_change_per_update: u128,
        start_delay_slots: u64,
        current_slot: u64,
    ) -> Self {
        Self {
            last_updated_slot: current_slot,
            last_price: initial_observation,
            last_observation: initial_observation,
            aggregator: 0,
            max_observation_change_per_update,
            initial_observation,
            start_delay_slots,
            created_at_slot: current_slot,
        }
    }

    /// First slot that contributes to the aggregator
    pub fn aggregation_start_slot(&self) -> u64 {
        self.created_at_slot.saturating_add(self.start_delay_slots)
    }

    /// Step the observation toward `price` and accumulate.
    ///
    /// Returns the new observation, or None when nothing changed (same slot
    /// as the last update, or still inside the start delay).
    pub fn update(&mut self, current_slot: u64, price: u128) -> Option<u128> {
        if current_slot <= self.last_updated_slot {
            return None;
        }
        if current_slot < self.aggregation_start_slot() {
            return None;
        }

        // Slots before the start delay don't count toward the integral
        let from_slot = self.last_updated_slot.max(self.aggregation_start_slot());
        let elapsed = (current_slot - from_slot) as u128;

        let new_observation = self.bounded_step(price);
        let weighted = new_observation.wrapping_mul(elapsed);

        self.last_observation = new_observation;
        self.aggregator = self.aggregator.wrapping_add(weighted);
        self.last_price = price;
        self.last_updated_slot = current_slot;

        Some(new_observation)
    }

    /// Observation after one step toward `price`
    pub fn bounded_step(&self, price: u128) -> u128 {
        let max = self.max_observation_change_per_update;
        if price > self.last_observation {
            price.min(self.last_observation.saturating_add(max))
        } else {
            price.max(self.last_observation.saturating_sub(max))
        }
    }

    /// Average observation since aggregation started
    pub fn get_twap(&self) -> Result<u128, AmmError> {
        let slots_passed = self
            .last_updated_slot
            .saturating_sub(self.aggregation_start_slot());
        if slots_passed == 0 {
            return Err(AmmError::NoSlotsPassed);
        }
        Ok(self.aggregator / slots_passed as u128)
    }

    pub fn snapshot(&self) -> OracleSnapshot {
        OracleSnapshot {
            slot: self.last_updated_slot,
            aggregator: self.aggregator,
        }
    }

    /// TWAP between two snapshots. Correct across at most one aggregator
    /// wrap inside the window.
    pub fn twap_between(start: OracleSnapshot, end: OracleSnapshot) -> Result<u128, AmmError> {
        if end.slot <= start.slot {
            return Err(AmmError::NoSlotsPassed);
        }
        let delta = end.aggregator.wrapping_sub(start.aggregator);
        Ok(delta / (end.slot - start.slot) as u128)
    }
}
