// Events emitted by successful ledger operations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::amm::{AmmPool, SwapType};
use crate::autocrat::ProposalState;

/// Fields shared by every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonFields {
    pub id: Uuid,
    pub slot: u64,
    pub unix_timestamp: i64,
    pub user: Address,
}

impl CommonFields {
    pub fn new(slot: u64, user: Address) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot,
            unix_timestamp: chrono::Utc::now().timestamp(),
            user,
        }
    }
}

/// Prices and aggregators as decimal strings. The tagged event enum
/// buffers its fields before decoding, and that buffer has no u128 slot.
mod u128_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Pool and oracle state right after an AMM operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub amm: Address,
    pub post_base_reserves: u64,
    pub post_quote_reserves: u64,
    pub post_lp_supply: u64,
    #[serde(with = "u128_string")]
    pub oracle_last_price: u128,
    #[serde(with = "u128_string")]
    pub oracle_last_observation: u128,
    #[serde(with = "u128_string")]
    pub oracle_aggregator: u128,
}

impl PoolSnapshot {
    pub fn of(amm: Address, pool: &AmmPool) -> Self {
        Self {
            amm,
            post_base_reserves: pool.base_amount,
            post_quote_reserves: pool.quote_amount,
            post_lp_supply: pool.lp_supply,
            oracle_last_price: pool.oracle.last_price,
            oracle_last_observation: pool.oracle.last_observation,
            oracle_aggregator: pool.oracle.aggregator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    CreateMint {
        common: CommonFields,
        mint: Address,
        decimals: u8,
    },
    MintTokens {
        common: CommonFields,
        mint: Address,
        to: Address,
        amount: u64,
    },
    CreateAmm {
        common: CommonFields,
        amm: Address,
        base_mint: Address,
        quote_mint: Address,
        lp_mint: Address,
        #[serde(with = "u128_string")]
        twap_initial_observation: u128,
        #[serde(with = "u128_string")]
        twap_max_observation_change_per_update: u128,
    },
    AddLiquidity {
        common: CommonFields,
        pool: PoolSnapshot,
        base_amount: u64,
        quote_amount: u64,
        lp_tokens_minted: u64,
    },
    RemoveLiquidity {
        common: CommonFields,
        pool: PoolSnapshot,
        lp_tokens_burned: u64,
        base_amount: u64,
        quote_amount: u64,
    },
    Swap {
        common: CommonFields,
        pool: PoolSnapshot,
        swap_type: SwapType,
        input_amount: u64,
        output_amount: u64,
    },
    CrankThatTwap {
        common: CommonFields,
        pool: PoolSnapshot,
    },
    InitializeQuestion {
        common: CommonFields,
        question: Address,
        oracle: Address,
        num_outcomes: u8,
    },
    ResolveQuestion {
        common: CommonFields,
        question: Address,
        payout_numerators: Vec<u32>,
    },
    InitializeVault {
        common: CommonFields,
        vault: Address,
        question: Address,
        underlying_token_mint: Address,
        conditional_token_mints: Vec<Address>,
    },
    SplitTokens {
        common: CommonFields,
        vault: Address,
        amount: u64,
    },
    MergeTokens {
        common: CommonFields,
        vault: Address,
        amount: u64,
    },
    RedeemTokens {
        common: CommonFields,
        vault: Address,
        redeemed: u64,
    },
    InitializeDao {
        common: CommonFields,
        dao: Address,
        treasury: Address,
    },
    UpdateDao {
        common: CommonFields,
        dao: Address,
    },
    InitializeProposal {
        common: CommonFields,
        proposal: Address,
        dao: Address,
        number: u32,
        pass_amm: Address,
        fail_amm: Address,
    },
    FinalizeProposal {
        common: CommonFields,
        proposal: Address,
        #[serde(with = "u128_string")]
        pass_twap: u128,
        #[serde(with = "u128_string")]
        fail_twap: u128,
        state: ProposalState,
    },
    ExecuteProposal {
        common: CommonFields,
        proposal: Address,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::CreateMint { .. } => "create_mint",
            LedgerEvent::MintTokens { .. } => "mint_tokens",
            LedgerEvent::CreateAmm { .. } => "create_amm",
            LedgerEvent::AddLiquidity { .. } => "add_liquidity",
            LedgerEvent::RemoveLiquidity { .. } => "remove_liquidity",
            LedgerEvent::Swap { .. } => "swap",
            LedgerEvent::CrankThatTwap { .. } => "crank_that_twap",
            LedgerEvent::InitializeQuestion { .. } => "initialize_question",
            LedgerEvent::ResolveQuestion { .. } => "resolve_question",
            LedgerEvent::InitializeVault { .. } => "initialize_vault",
            LedgerEvent::SplitTokens { .. } => "split_tokens",
            LedgerEvent::MergeTokens { .. } => "merge_tokens",
            LedgerEvent::RedeemTokens { .. } => "redeem_tokens",
            LedgerEvent::InitializeDao { .. } => "initialize_dao",
            LedgerEvent::UpdateDao { .. } => "update_dao",
            LedgerEvent::InitializeProposal { .. } => "initialize_proposal",
            LedgerEvent::FinalizeProposal { .. } => "finalize_proposal",
            LedgerEvent::ExecuteProposal { .. } => "execute_proposal",
        }
    }

    pub fn common(&self) -> &CommonFields {
        match self {
            LedgerEvent::CreateMint { common, .. }
            | LedgerEvent::MintTokens { common, .. }
            | LedgerEvent::CreateAmm { common, .. }
            | LedgerEvent::AddLiquidity { common, .. }
            | LedgerEvent::RemoveLiquidity { common, .. }
            | LedgerEvent::Swap { common, .. }
            | LedgerEvent::CrankThatTwap { common, .. }
            | LedgerEvent::InitializeQuestion { common, .. }
            | LedgerEvent::ResolveQuestion { common, .. }
            | LedgerEvent::InitializeVault { common, .. }
            | LedgerEvent::SplitTokens { common, .. }
            | LedgerEvent::MergeTokens { common, .. }
            | LedgerEvent::RedeemTokens { common, .. }
            | LedgerEvent::InitializeDao { common, .. }
            | LedgerEvent::UpdateDao { common, .. }
            | LedgerEvent::InitializeProposal { common, .. }
            | LedgerEvent::FinalizeProposal { common, .. }
            | LedgerEvent::ExecuteProposal { common, .. } => common,
        }
    }

    /// Write the event to the log
    pub fn log(&self) {
        let common = self.common();
        match self {
            LedgerEvent::Swap { pool, swap_type, input_amount, output_amount, .. } => tracing::info!(
                slot = common.slot,
                user = %common.user,
                amm = %pool.amm,
                %swap_type,
                input_amount,
                output_amount,
                observation = %pool.oracle_last_observation,
                "swap"
            ),
            LedgerEvent::FinalizeProposal { proposal, pass_twap, fail_twap, state, .. } => tracing::info!(
                slot = common.slot,
                proposal = %proposal,
                %pass_twap,
                %fail_twap,
                %state,
                "proposal finalized"
            ),
            _ => tracing::info!(slot = common.slot, user = %common.user, "{}", self.name()),
        }
    }
}
