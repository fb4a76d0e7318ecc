//! Host ledger for the futarchy core
//!
//! Stores every record (pools, questions, vaults, DAOs, proposals) at an
//! address, owns the token book and the slot clock, and exposes the named
//! operations. Each public operation is atomic: it runs against a staged
//! copy and is committed only if it succeeds, so a failed call leaves the
//! ledger untouched.
//!
//! Record logic lives in `amm`, `vault` and `autocrat`; this module moves
//! tokens around it and enforces ownership.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::address::Address;
use crate::amm::AmmPool;
use crate::autocrat::{Dao, Proposal};
use crate::errors::{FutarchyError, Result, TokenError};
use crate::events::{CommonFields, LedgerEvent};
use crate::vault::{ConditionalVault, Question};

pub mod amm_ops;
pub mod autocrat_ops;
pub mod tokens;
pub mod vault_ops;

pub use autocrat_ops::{EnqueueProposalArgs, InitializeProposalArgs};
pub use tokens::{Mint, TokenBook};

/// Events kept in the activity log
pub const MAX_EVENT_HISTORY: usize = 1_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Monotonic host clock
    pub slot: u64,
    pub tokens: TokenBook,
    pub amms: HashMap<Address, AmmPool>,
    pub questions: HashMap<Address, Question>,
    pub vaults: HashMap<Address, ConditionalVault>,
    pub daos: HashMap<Address, Dao>,
    pub proposals: HashMap<Address, Proposal>,
    #[serde(default)]
    pub events: VecDeque<LedgerEvent>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // ATOMICITY
    // ========================================================================

    /// Run `op` on a staged copy; commit it and log its events on success.
    pub(crate) fn atomically<T>(&mut self, op: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let history = std::mem::take(&mut self.events);
        let mut staged = self.clone();

        match op(&mut staged) {
            Ok(value) => {
                let emitted = std::mem::take(&mut staged.events);
                *self = staged;
                self.events = history;
                for event in emitted {
                    event.log();
                    self.events.push_back(event);
                }
                while self.events.len() > MAX_EVENT_HISTORY {
                    self.events.pop_front();
                }
                Ok(value)
            }
            Err(e) => {
                self.events = history;
                debug!(code = e.code(), "operation aborted: {}", e);
                Err(e)
            }
        }
    }

    pub(crate) fn common(&self, user: Address) -> CommonFields {
        CommonFields::new(self.slot, user)
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.events.push_back(event);
    }

    // ========================================================================
    // CLOCK
    // ========================================================================

    pub fn advance_slots(&mut self, slots: u64) -> u64 {
        self.slot = self.slot.saturating_add(slots);
        self.slot
    }

    /// Move the clock forward to `slot`; earlier slots are ignored
    pub fn warp_to_slot(&mut self, slot: u64) -> u64 {
        self.slot = self.slot.max(slot);
        self.slot
    }

    // ========================================================================
    // RECORD LOOKUP
    // ========================================================================

    pub fn amm(&self, address: &Address) -> Result<&AmmPool> {
        self.amms.get(address).ok_or_else(|| FutarchyError::not_found("amm", address))
    }

    pub fn question(&self, address: &Address) -> Result<&Question> {
        self.questions
            .get(address)
            .ok_or_else(|| FutarchyError::not_found("question", address))
    }

    pub fn vault(&self, address: &Address) -> Result<&ConditionalVault> {
        self.vaults
            .get(address)
            .ok_or_else(|| FutarchyError::not_found("vault", address))
    }

    pub fn dao(&self, address: &Address) -> Result<&Dao> {
        self.daos.get(address).ok_or_else(|| FutarchyError::not_found("dao", address))
    }

    pub fn proposal(&self, address: &Address) -> Result<&Proposal> {
        self.proposals
            .get(address)
            .ok_or_else(|| FutarchyError::not_found("proposal", address))
    }

    pub fn balance(&self, mint: &Address, owner: &Address) -> u64 {
        self.tokens.balance(mint, owner)
    }

    pub fn recent_events(&self, limit: usize) -> Vec<LedgerEvent> {
        self.events.iter().rev().take(limit).cloned().collect()
    }

    // ========================================================================
    // TOKENS
    // ========================================================================

    /// Register a new mint at `address` controlled by `authority`
    pub fn create_mint(&mut self, authority: Address, address: Address, decimals: u8) -> Result<()> {
        self.atomically(|ledger| {
            ledger.tokens.create_mint(address, decimals, authority)?;
            let common = ledger.common(authority);
            ledger.emit(LedgerEvent::CreateMint { common, mint: address, decimals });
            Ok(())
        })
    }

    /// Mint tokens; only the mint authority may call this
    pub fn mint_tokens(&mut self, signer: Address, mint: Address, to: Address, amount: u64) -> Result<()> {
        self.atomically(|ledger| {
            if ledger.tokens.mint(&mint)?.mint_authority != signer {
                return Err(TokenError::UnauthorizedMintAuthority.into());
            }
            ledger.tokens.mint_to(&mint, &to, amount)?;
            let common = ledger.common(signer);
            ledger.emit(LedgerEvent::MintTokens { common, mint, to, amount });
            Ok(())
        })
    }

    pub fn transfer(&mut self, signer: Address, mint: Address, to: Address, amount: u64) -> Result<()> {
        self.atomically(|ledger| ledger.tokens.transfer(&mint, &signer, &to, amount))
    }
}
