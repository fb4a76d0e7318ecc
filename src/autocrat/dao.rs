use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::errors::AutocratError;
use crate::price_math::MAX_BPS;

// ============================================================================
// DAO POLICY CONSTANTS
// ============================================================================

/// Three days of slots at 2.5 slots per second
pub const THREE_DAYS_IN_SLOTS: u64 = 3 * 24 * 60 * 60 * 5 / 2;

/// Pass TWAP must beat fail TWAP by 3%
pub const DEFAULT_PASS_THRESHOLD_BPS: u16 = 300;

/// Markets older than five minutes of slots can't back a new proposal
pub const DEFAULT_MAX_AMM_AGE_SLOTS: u64 = 5 * 60 * 5 / 2;

// ============================================================================
// DAO
// ============================================================================

/// A futarchy DAO: its treasury, its two mints and the policy every
/// proposal market must follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dao {
    pub treasury: Address,
    /// Base asset of every proposal market
    pub token_mint: Address,
    /// Quote asset of every proposal market
    pub usdc_mint: Address,
    pub proposal_count: u32,
    /// How far, in basis points, the pass TWAP must sit above the fail TWAP
    pub pass_threshold_bps: u16,
    pub slots_per_proposal: u64,
    pub twap_initial_observation: u128,
    pub twap_max_observation_change_per_update: u128,
    #[serde(default)]
    pub twap_start_delay_slots: u64,
    pub min_quote_futarchic_liquidity: u64,
    pub min_base_futarchic_liquidity: u64,
    pub max_amm_age_slots: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeDaoArgs {
    pub token_mint: Address,
    pub usdc_mint: Address,
    pub twap_initial_observation: u128,
    /// Defaults to 2% of the initial observation
    #[serde(default)]
    pub twap_max_observation_change_per_update: Option<u128>,
    #[serde(default)]
    pub twap_start_delay_slots: Option<u64>,
    pub min_quote_futarchic_liquidity: u64,
    pub min_base_futarchic_liquidity: u64,
    #[serde(default)]
    pub pass_threshold_bps: Option<u16>,
    #[serde(default)]
    pub slots_per_proposal: Option<u64>,
    #[serde(default)]
    pub max_amm_age_slots: Option<u64>,
    /// Distinguishes DAOs over the same mint pair
    #[serde(default)]
    pub nonce: u64,
}

/// Partial policy change; absent fields keep their value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDaoParams {
    pub pass_threshold_bps: Option<u16>,
    pub slots_per_proposal: Option<u64>,
    pub twap_initial_observation: Option<u128>,
    pub twap_max_observation_change_per_update: Option<u128>,
    pub twap_start_delay_slots: Option<u64>,
    pub min_quote_futarchic_liquidity: Option<u64>,
    pub min_base_futarchic_liquidity: Option<u64>,
    pub max_amm_age_slots: Option<u64>,
}

impl Dao {
    pub fn derive_address(token_mint: &Address, usdc_mint: &Address, nonce: u64) -> Address {
        Address::derive(&[b"dao", token_mint.as_ref(), usdc_mint.as_ref(), &nonce.to_le_bytes()])
    }

    pub fn derive_treasury(dao: &Address) -> Address {
        Address::derive(&[b"treasury", dao.as_ref()])
    }

    pub fn new(dao_address: &Address, args: &InitializeDaoArgs) -> Result<Self, AutocratError> {
        let pass_threshold_bps = args.pass_threshold_bps.unwrap_or(DEFAULT_PASS_THRESHOLD_BPS);
        if pass_threshold_bps > MAX_BPS {
            return Err(AutocratError::InvalidPassThreshold);
        }

        Ok(Self {
            treasury: Self::derive_treasury(dao_address),
            token_mint: args.token_mint,
            usdc_mint: args.usdc_mint,
            proposal_count: 0,
            pass_threshold_bps,
            slots_per_proposal: args.slots_per_proposal.unwrap_or(THREE_DAYS_IN_SLOTS),
            twap_initial_observation: args.twap_initial_observation,
            twap_max_observation_change_per_update: args
                .twap_max_observation_change_per_update
                .unwrap_or(args.twap_initial_observation / 50),
            twap_start_delay_slots: args.twap_start_delay_slots.unwrap_or(0),
            min_quote_futarchic_liquidity: args.min_quote_futarchic_liquidity,
            min_base_futarchic_liquidity: args.min_base_futarchic_liquidity,
            max_amm_age_slots: args.max_amm_age_slots.unwrap_or(DEFAULT_MAX_AMM_AGE_SLOTS),
        })
    }

    /// Apply a policy change. The whole update is rejected if any field is invalid.
    pub fn update(&mut self, params: &UpdateDaoParams) -> Result<(), AutocratError> {
        if params.pass_threshold_bps.map_or(false, |bps| bps > MAX_BPS) {
            return Err(AutocratError::InvalidPassThreshold);
        }

        macro_rules! update_if_set {
            ($field:ident) => {
                if let Some(value) = params.$field {
                    self.$field = value;
                }
            };
        }

        update_if_set!(pass_threshold_bps);
        update_if_set!(slots_per_proposal);
        update_if_set!(twap_initial_observation);
        update_if_set!(twap_max_observation_change_per_update);
        update_if_set!(twap_start_delay_slots);
        update_if_set!(min_quote_futarchic_liquidity);
        update_if_set!(min_base_futarchic_liquidity);
        update_if_set!(max_amm_age_slots);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> InitializeDaoArgs {
        InitializeDaoArgs {
            token_mint: Address::from_label("META"),
            usdc_mint: Address::from_label("USDC"),
            twap_initial_observation: 500_000_000_000,
            twap_max_observation_change_per_update: None,
            twap_start_delay_slots: None,
            min_quote_futarchic_liquidity: 1,
            min_base_futarchic_liquidity: 1,
            pass_threshold_bps: None,
            slots_per_proposal: None,
            max_amm_age_slots: None,
            nonce: 0,
        }
    }

    #[test]
    fn test_defaults() {
        let address = Dao::derive_address(&args().token_mint, &args().usdc_mint, 0);
        let dao = Dao::new(&address, &args()).unwrap();
        assert_eq!(dao.pass_threshold_bps, 300);
        assert_eq!(dao.slots_per_proposal, 648_000);
        assert_eq!(dao.max_amm_age_slots, 750);
        assert_eq!(dao.twap_max_observation_change_per_update, 10_000_000_000);
        assert_eq!(dao.treasury, Dao::derive_treasury(&address));
        assert_eq!(dao.proposal_count, 0);
    }

    #[test]
    fn test_threshold_bound() {
        let mut bad = args();
        bad.pass_threshold_bps = Some(10_001);
        let address = Address::from_label("dao");
        assert_eq!(Dao::new(&address, &bad), Err(AutocratError::InvalidPassThreshold));
    }

    #[test]
    fn test_update_only_touches_set_fields() {
        let mut dao = Dao::new(&Address::from_label("dao"), &args()).unwrap();
        let before = dao.clone();

        dao.update(&UpdateDaoParams {
            slots_per_proposal: Some(100),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(dao.slots_per_proposal, 100);
        assert_eq!(dao.pass_threshold_bps, before.pass_threshold_bps);
        assert_eq!(dao.twap_initial_observation, before.twap_initial_observation);

        let rejected = UpdateDaoParams {
            pass_threshold_bps: Some(20_000),
            slots_per_proposal: Some(5),
            ..Default::default()
        };
        assert_eq!(dao.update(&rejected), Err(AutocratError::InvalidPassThreshold));
        assert_eq!(dao.slots_per_proposal, 100);
    }
}
