// ============================================================================
// Questions
// ============================================================================
//
// A question fixes the set of outcomes a conditional vault splits into and,
// once its oracle resolves it, the share of the underlying each outcome
// token is worth.
//
//   unresolved: payout_denominator == 0, numerators all zero
//   resolved:   payout_denominator == sum(numerators), immutable
//
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::errors::VaultError;

/// Fewest outcomes a question can have
pub const MIN_OUTCOMES: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeQuestionArgs {
    #[serde(with = "hex::serde")]
    pub question_id: [u8; 32],
    /// Sole authority allowed to resolve
    pub oracle: Address,
    pub num_outcomes: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(with = "hex::serde")]
    pub question_id: [u8; 32],
    pub oracle: Address,
    pub payout_numerators: Vec<u32>,
    pub payout_denominator: u32,
}

impl Question {
    pub fn new(args: &InitializeQuestionArgs) -> Result<Self, VaultError> {
        if args.num_outcomes < MIN_OUTCOMES {
            return Err(VaultError::InsufficientNumConditions);
        }

        Ok(Self {
            question_id: args.question_id,
            oracle: args.oracle,
            payout_numerators: vec![0; args.num_outcomes as usize],
            payout_denominator: 0,
        })
    }

    pub fn num_outcomes(&self) -> usize {
        self.payout_numerators.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.payout_denominator != 0
    }

    /// Record the payout ratio. Happens once, by the oracle only.
    ///
    /// # Arguments
    /// * `signer` - Caller; must be the question's oracle
    /// * `payout_numerators` - One weight per outcome, not all zero
    pub fn resolve(&mut self, signer: &Address, payout_numerators: &[u32]) -> Result<(), VaultError> {
        if *signer != self.oracle {
            return Err(VaultError::UnauthorizedOracle);
        }
        if self.is_resolved() {
            return Err(VaultError::QuestionAlreadyResolved);
        }
        if payout_numerators.len() != self.num_outcomes() {
            return Err(VaultError::InvalidNumPayoutNumerators);
        }

        let denominator = payout_numerators
            .iter()
            .try_fold(0u32, |acc, n| acc.checked_add(*n))
            .ok_or(VaultError::InvalidNumPayoutNumerators)?;
        if denominator == 0 {
            return Err(VaultError::PayoutZero);
        }

        self.payout_numerators = payout_numerators.to_vec();
        self.payout_denominator = denominator;
        Ok(())
    }

    /// Underlying owed for a set of outcome token balances, one per outcome.
    /// Each term truncates, so dust stays with the vault.
    pub fn payout_for(&self, balances: &[u64]) -> Result<u64, VaultError> {
        if !self.is_resolved() {
            return Err(VaultError::CantRedeemConditionalTokens);
        }
        if balances.len() != self.num_outcomes() {
            return Err(VaultError::InvalidNumPayoutNumerators);
        }

        let denominator = self.payout_denominator as u128;
        let total: u128 = balances
            .iter()
            .zip(&self.payout_numerators)
            .map(|(balance, numerator)| *balance as u128 * *numerator as u128 / denominator)
            .sum();

        u64::try_from(total).map_err(|_| VaultError::AssertFailed)
    }
}
