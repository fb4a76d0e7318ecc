// ============================================================================
// Token Book
// ============================================================================
//
// Mints and balances for every asset the ledger knows about: DAO tokens,
// conditional tokens and LP tokens alike. Balances are keyed by mint, then
// owner; owners can be users or system records (an AMM holds its reserves
// under its own address, a vault under its holding account).
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::errors::{FutarchyError, Result, TokenError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub decimals: u8,
    pub supply: u64,
    /// Who may mint; system mints are owned by their AMM or vault
    pub mint_authority: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBook {
    pub mints: HashMap<Address, Mint>,
    /// mint → owner → amount
    pub balances: HashMap<Address, HashMap<Address, u64>>,
}

impl TokenBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_mint(&mut self, address: Address, decimals: u8, mint_authority: Address) -> Result<()> {
        if self.mints.contains_key(&address) {
            return Err(FutarchyError::already_exists("mint", address));
        }
        self.mints.insert(address, Mint { decimals, supply: 0, mint_authority });
        Ok(())
    }

    pub fn mint(&self, address: &Address) -> Result<&Mint> {
        self.mints
            .get(address)
            .ok_or_else(|| FutarchyError::not_found("mint", address))
    }

    pub fn supply(&self, mint: &Address) -> u64 {
        self.mints.get(mint).map(|m| m.supply).unwrap_or(0)
    }

    pub fn balance(&self, mint: &Address, owner: &Address) -> u64 {
        self.balances
            .get(mint)
            .and_then(|owners| owners.get(owner))
            .copied()
            .unwrap_or(0)
    }

    /// Every non-zero balance an owner holds, by mint
    pub fn balances_of(&self, owner: &Address) -> Vec<(Address, u64)> {
        let mut held: Vec<(Address, u64)> = self
            .balances
            .iter()
            .filter_map(|(mint, owners)| owners.get(owner).map(|amount| (*mint, *amount)))
            .filter(|(_, amount)| *amount > 0)
            .collect();
        held.sort();
        held
    }

    fn debit(&mut self, mint: &Address, owner: &Address, amount: u64) -> Result<()> {
        let available = self.balance(mint, owner);
        if available < amount {
            return Err(TokenError::InsufficientBalance { needed: amount, available }.into());
        }
        if amount > 0 {
            self.balances.entry(*mint).or_default().insert(*owner, available - amount);
        }
        Ok(())
    }

    fn credit(&mut self, mint: &Address, owner: &Address, amount: u64) -> Result<()> {
        let entry = self.balances.entry(*mint).or_default().entry(*owner).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(TokenError::SupplyOverflow)?;
        Ok(())
    }

    /// Create `amount` new tokens for `to`
    pub fn mint_to(&mut self, mint: &Address, to: &Address, amount: u64) -> Result<()> {
        let info = self
            .mints
            .get_mut(mint)
            .ok_or_else(|| FutarchyError::not_found("mint", mint))?;
        info.supply = info.supply.checked_add(amount).ok_or(TokenError::SupplyOverflow)?;
        // Balance <= supply, so this can't overflow
        self.credit(mint, to, amount)
    }

    /// Destroy `amount` of `from`'s tokens
    pub fn burn(&mut self, mint: &Address, from: &Address, amount: u64) -> Result<()> {
        self.mint(mint)?;
        self.debit(mint, from, amount)?;
        if let Some(info) = self.mints.get_mut(mint) {
            info.supply -= amount;
        }
        Ok(())
    }

    pub fn transfer(&mut self, mint: &Address, from: &Address, to: &Address, amount: u64) -> Result<()> {
        self.mint(mint)?;
        self.debit(mint, from, amount)?;
        self.credit(mint, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> (TokenBook, Address, Address, Address) {
        let mut book = TokenBook::new();
        let usdc = Address::from_label("USDC");
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        book.create_mint(usdc, 6, alice).unwrap();
        book.mint_to(&usdc, &alice, 1_000).unwrap();
        (book, usdc, alice, bob)
    }

    #[test]
    fn test_mint_and_transfer() {
        let (mut book, usdc, alice, bob) = book();
        book.transfer(&usdc, &alice, &bob, 400).unwrap();
        assert_eq!(book.balance(&usdc, &alice), 600);
        assert_eq!(book.balance(&usdc, &bob), 400);
        assert_eq!(book.supply(&usdc), 1_000);
        assert_eq!(book.balances_of(&bob), vec![(usdc, 400)]);
    }

    #[test]
    fn test_insufficient_balance() {
        let (mut book, usdc, alice, bob) = book();
        let err = book.transfer(&usdc, &bob, &alice, 1).unwrap_err();
        assert_eq!(
            err,
            FutarchyError::Token(TokenError::InsufficientBalance { needed: 1, available: 0 })
        );
        assert_eq!(book.balance(&usdc, &alice), 1_000);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let (mut book, usdc, alice, _) = book();
        book.burn(&usdc, &alice, 250).unwrap();
        assert_eq!(book.supply(&usdc), 750);
        assert_eq!(book.balance(&usdc, &alice), 750);
        assert!(book.burn(&usdc, &alice, 751).is_err());
    }

    #[test]
    fn test_supply_overflow() {
        let (mut book, usdc, alice, _) = book();
        let err = book.mint_to(&usdc, &alice, u64::MAX).unwrap_err();
        assert_eq!(err, FutarchyError::Token(TokenError::SupplyOverflow));
        assert!(book.create_mint(usdc, 6, alice).is_err());
    }
}
