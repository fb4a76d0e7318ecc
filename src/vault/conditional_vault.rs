// ============================================================================
// Conditional Vaults
// ============================================================================
//
// A vault locks one underlying mint against a question:
//
//   split:  N underlying → N of every outcome token
//   merge:  N of every outcome token → N underlying
//   redeem: after resolution, outcome tokens → underlying by payout ratio
//
// Balances live in the token book; the vault record only names the mints
// and the holding account, and checks that the holding account still
// covers every outstanding claim.
//
// ============================================================================

use serde::{Deserialize, Serialize};

use super::question::Question;
use crate::address::Address;
use crate::errors::VaultError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalVault {
    pub question: Address,
    pub underlying_token_mint: Address,
    /// Holds the deposited underlying
    pub underlying_token_account: Address,
    /// One mint per outcome, indexed like the question's numerators
    pub conditional_token_mints: Vec<Address>,
    /// Shared by the underlying and every conditional mint
    pub decimals: u8,
}

impl ConditionalVault {
    /// Lay out a vault at `vault_address` for `num_outcomes` outcomes
    pub fn new(
        vault_address: &Address,
        question: Address,
        underlying_token_mint: Address,
        decimals: u8,
        num_outcomes: usize,
    ) -> Self {
        let conditional_token_mints = (0..num_outcomes)
            .map(|i| {
                Address::derive(&[
                    b"conditional_token",
                    vault_address.as_ref(),
                    &(i as u8).to_le_bytes(),
                ])
            })
            .collect();

        Self {
            question,
            underlying_token_mint,
            underlying_token_account: Address::derive(&[b"vault_underlying", vault_address.as_ref()]),
            conditional_token_mints,
            decimals,
        }
    }

    /// Seeds every vault address is derived from
    pub fn derive_address(question: &Address, underlying_token_mint: &Address) -> Address {
        Address::derive(&[b"conditional_vault", question.as_ref(), underlying_token_mint.as_ref()])
    }

    pub fn num_outcomes(&self) -> usize {
        self.conditional_token_mints.len()
    }

    pub fn check_split(&self, underlying_balance: u64, amount: u64) -> Result<(), VaultError> {
        if underlying_balance < amount {
            return Err(VaultError::InsufficientUnderlyingTokens);
        }
        Ok(())
    }

    /// Caller must hold `amount` of every outcome token
    pub fn check_merge(&self, conditional_balances: &[u64], amount: u64) -> Result<(), VaultError> {
        if conditional_balances.len() != self.num_outcomes() {
            return Err(VaultError::AssertFailed);
        }
        if conditional_balances.iter().any(|b| *b < amount) {
            return Err(VaultError::InsufficientConditionalTokens);
        }
        Ok(())
    }

    /// Underlying owed for the caller's outcome balances
    pub fn redeemable(&self, question: &Question, conditional_balances: &[u64]) -> Result<u64, VaultError> {
        question.payout_for(conditional_balances)
    }

    /// The holding account covers every claim.
    ///
    /// Unresolved: any one outcome's supply could be merged back in full
    /// alongside the others, so the balance must cover the largest supply.
    /// Resolved: the balance must cover the payout-weighted supply.
    pub fn check_invariant(
        &self,
        question: &Question,
        underlying_balance: u64,
        conditional_supplies: &[u64],
    ) -> Result<(), VaultError> {
        if conditional_supplies.len() != self.num_outcomes() {
            return Err(VaultError::AssertFailed);
        }

        let required = if question.is_resolved() {
            question.payout_for(conditional_supplies)?
        } else {
            conditional_supplies.iter().copied().max().unwrap_or(0)
        };

        if underlying_balance < required {
            return Err(VaultError::AssertFailed);
        }
        Ok(())
    }
}
