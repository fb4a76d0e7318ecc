use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::dao::UpdateDaoParams;
use crate::address::Address;
use crate::errors::AutocratError;
use crate::price_math::MAX_BPS;

/// Outcome index of the pass side in every proposal question
pub const PASS_INDEX: usize = 0;
/// Outcome index of the fail side in every proposal question
pub const FAIL_INDEX: usize = 1;

// ============================================================================
// PROPOSAL STATE
// ============================================================================

/// Proposal lifecycle
///
/// Flow: Pending → Passed → Executed
///               ↘ Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalState {
    /// Markets are trading; can be finalized once old enough
    Pending,
    /// Pass market won; instruction may run once
    Passed,
    /// Fail market won; terminal
    Failed,
    /// Instruction ran; terminal
    Executed,
}

impl ProposalState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ProposalState::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Failed | ProposalState::Executed)
    }

    /// Payout numerators for the proposal question, pass side first
    pub fn payout_numerators(&self) -> Option<[u32; 2]> {
        match self {
            ProposalState::Passed => Some([1, 0]),
            ProposalState::Failed => Some([0, 1]),
            _ => None,
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ProposalState::Pending => "pending",
            ProposalState::Passed => "passed",
            ProposalState::Failed => "failed",
            ProposalState::Executed => "executed",
        };
        write!(f, "{}", state)
    }
}

impl Default for ProposalState {
    fn default() -> Self {
        ProposalState::Pending
    }
}

/// Compare the two market TWAPs.
///
/// The pass TWAP must be strictly above the fail TWAP raised by
/// `pass_threshold_bps`. Ties fail.
pub fn decide(pass_twap: u128, fail_twap: u128, pass_threshold_bps: u16) -> ProposalState {
    let threshold = fail_twap
        .saturating_mul((MAX_BPS as u128).saturating_add(pass_threshold_bps as u128))
        / MAX_BPS as u128;

    if pass_twap > threshold {
        ProposalState::Passed
    } else {
        ProposalState::Failed
    }
}

// ============================================================================
// INSTRUCTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalAccount {
    pub pubkey: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// What a passed proposal runs, signed by the DAO treasury
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalInstruction {
    pub program_id: Address,
    pub accounts: Vec<ProposalAccount>,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

/// Token program calls a treasury can make
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenInstruction {
    Transfer { mint: Address, to: Address, amount: u64 },
}

/// Autocrat program calls a treasury can make
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutocratInstruction {
    UpdateDao(UpdateDaoParams),
}

/// A decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreasuryCall {
    Token(TokenInstruction),
    Autocrat { dao: Address, instruction: AutocratInstruction },
}

pub fn token_program_id() -> Address {
    Address::from_label("token_program")
}

pub fn autocrat_program_id() -> Address {
    Address::from_label("autocrat_program")
}

impl ProposalInstruction {
    /// Move `amount` of `mint` from the treasury to `to`
    pub fn token_transfer(mint: Address, to: Address, amount: u64) -> Result<Self, AutocratError> {
        let data = bincode::serialize(&TokenInstruction::Transfer { mint, to, amount })
            .map_err(|_| AutocratError::InvalidInstruction)?;
        Ok(Self {
            program_id: token_program_id(),
            accounts: vec![ProposalAccount { pubkey: to, is_signer: false, is_writable: true }],
            data,
        })
    }

    /// Change the policy of `dao`
    pub fn update_dao(dao: Address, params: UpdateDaoParams) -> Result<Self, AutocratError> {
        let data = bincode::serialize(&AutocratInstruction::UpdateDao(params))
            .map_err(|_| AutocratError::InvalidInstruction)?;
        Ok(Self {
            program_id: autocrat_program_id(),
            accounts: vec![ProposalAccount { pubkey: dao, is_signer: false, is_writable: true }],
            data,
        })
    }

    pub fn decode(&self) -> Result<TreasuryCall, AutocratError> {
        if self.program_id == token_program_id() {
            let ix: TokenInstruction =
                bincode::deserialize(&self.data).map_err(|_| AutocratError::InvalidInstruction)?;
            Ok(TreasuryCall::Token(ix))
        } else if self.program_id == autocrat_program_id() {
            let dao = self
                .accounts
                .first()
                .map(|account| account.pubkey)
                .ok_or(AutocratError::InvalidInstruction)?;
            let instruction: AutocratInstruction =
                bincode::deserialize(&self.data).map_err(|_| AutocratError::InvalidInstruction)?;
            Ok(TreasuryCall::Autocrat { dao, instruction })
        } else {
            Err(AutocratError::InvalidInstruction)
        }
    }
}

// ============================================================================
// PROPOSAL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub number: u32,
    pub proposer: Address,
    pub description_url: String,
    pub slot_enqueued: u64,
    pub state: ProposalState,
    pub instruction: ProposalInstruction,
    pub question: Address,
    pub pass_amm: Address,
    pub fail_amm: Address,
    pub base_vault: Address,
    pub quote_vault: Address,
    pub dao: Address,
    pub pass_lp_tokens_locked: u64,
    pub fail_lp_tokens_locked: u64,
    pub nonce: u64,
    /// TWAPs observed at finalization
    #[serde(default)]
    pub pass_twap: Option<u128>,
    #[serde(default)]
    pub fail_twap: Option<u128>,
}

impl Proposal {
    pub fn derive_address(proposer: &Address, nonce: u64) -> Address {
        Address::derive(&[b"proposal", proposer.as_ref(), &nonce.to_le_bytes()])
    }

    /// Question id for a proposal: sha256 of a readable statement
    pub fn question_id(proposal: &Address) -> [u8; 32] {
        let statement = format!("Will {} pass?/FAIL/PASS", proposal);
        Sha256::digest(statement.as_bytes()).into()
    }

    /// Last slot the markets must reach before finalization
    pub fn finalization_slot(&self, slots_per_proposal: u64) -> u64 {
        self.slot_enqueued.saturating_add(slots_per_proposal)
    }
}
