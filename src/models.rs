// Request and response bodies for the HTTP API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amm::{AmmPool, SwapType};
use crate::autocrat::{Dao, Proposal, ProposalInstruction, ProposalState};
use crate::errors::ErrorCategory;

// ===== GENERIC =====

/// An operation argument block plus the address acting on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedRequest<T> {
    pub signer: Address,
    pub args: T,
}

/// Body for calls that only need to know who is acting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerRequest {
    pub signer: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub category: ErrorCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressResponse {
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub slot: u64,
}

// ===== CLOCK & TOKENS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockResponse {
    pub slot: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceClockRequest {
    pub slots: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMintRequest {
    pub authority: Address,
    pub decimals: u8,
    /// Fixed address; otherwise derived from `label`, otherwise random
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintToRequest {
    pub authority: Address,
    pub to: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub mint: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesResponse {
    pub owner: Address,
    pub balances: Vec<BalanceEntry>,
}

// ===== AMMS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmResponse {
    pub address: Address,
    pub pool: AmmPool,
    pub spot_price: Option<u128>,
    /// Quote tokens per whole base token
    pub human_spot_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwapResponse {
    pub amm: Address,
    pub twap: u128,
    pub human_twap: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapQuoteRequest {
    pub swap_type: SwapType,
    pub input_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrankResponse {
    pub amm: Address,
    /// None when the oracle was already current
    pub observation: Option<u128>,
}

// ===== QUESTIONS & VAULTS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveQuestionRequest {
    pub signer: Address,
    pub payout_numerators: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVaultRequest {
    pub payer: Address,
    pub question: Address,
    pub underlying_token_mint: Address,
    pub num_outcomes: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultAmountRequest {
    pub user: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub user: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub vault: Address,
    pub redeemed: u64,
}

// ===== DAOS & PROPOSALS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaoResponse {
    pub address: Address,
    pub dao: Dao,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProposalRequest {
    /// Defaults to the DAO treasury
    #[serde(default)]
    pub proposer: Option<Address>,
    pub dao: Address,
    pub description_url: String,
    pub instruction: ProposalInstruction,
    pub base_tokens_to_lp: u64,
    pub quote_tokens_to_lp: u64,
    /// Random when absent
    #[serde(default)]
    pub nonce: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub address: Address,
    pub proposal: Proposal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub proposal: Address,
    pub state: ProposalState,
    pub pass_twap: Option<u128>,
    pub fail_twap: Option<u128>,
}

// ===== PRICES & EVENTS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmPriceRequest {
    pub human_price: Decimal,
    pub base_decimals: u8,
    pub quote_decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanPriceRequest {
    pub amm_price: u128,
    pub base_decimals: u8,
    pub quote_decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub amm_price: u128,
    pub human_price: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}
