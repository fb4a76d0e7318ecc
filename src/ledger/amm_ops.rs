// AMM operations: pool creation, liquidity, swaps and oracle cranks

use tracing::warn;

use super::Ledger;
use crate::address::Address;
use crate::amm::{
    AddLiquidityArgs, AddLiquidityQuote, AmmPool, CreateAmmArgs, RemoveLiquidityArgs,
    RemoveLiquidityQuote, SwapArgs, SwapQuote, SwapType, LP_DECIMALS,
};
use crate::errors::{AmmError, FutarchyError, Result};
use crate::events::{LedgerEvent, PoolSnapshot};

/// Address of the pool for a (base, quote, proposal) triple
pub fn amm_address(base_mint: &Address, quote_mint: &Address, proposal: Option<&Address>) -> Address {
    let proposal = proposal.copied().unwrap_or_default();
    Address::derive(&[b"amm", base_mint.as_ref(), quote_mint.as_ref(), proposal.as_ref()])
}

/// Address of a pool's LP mint
pub fn lp_mint_address(amm: &Address) -> Address {
    Address::derive(&[b"amm_lp_mint", amm.as_ref()])
}

impl Ledger {
    fn amm_mut(&mut self, address: &Address) -> Result<&mut AmmPool> {
        self.amms
            .get_mut(address)
            .ok_or_else(|| FutarchyError::not_found("amm", address))
    }

    fn pool_snapshot(&self, amm: &Address) -> Result<PoolSnapshot> {
        Ok(PoolSnapshot::of(*amm, self.amm(amm)?))
    }

    // ========================================================================
    // CREATE
    // ========================================================================

    /// Create an empty pool. Decimals are taken from the mints.
    pub fn create_amm(&mut self, creator: Address, args: CreateAmmArgs) -> Result<Address> {
        self.atomically(|ledger| ledger.create_amm_inner(creator, args))
    }

    pub(crate) fn create_amm_inner(&mut self, creator: Address, args: CreateAmmArgs) -> Result<Address> {
        let base_decimals = self.tokens.mint(&args.base_mint)?.decimals;
        let quote_decimals = self.tokens.mint(&args.quote_mint)?.decimals;
        let args = CreateAmmArgs { base_decimals, quote_decimals, ..args };

        let address = amm_address(&args.base_mint, &args.quote_mint, args.proposal.as_ref());
        if self.amms.contains_key(&address) {
            return Err(FutarchyError::already_exists("amm", address));
        }

        let lp_mint = lp_mint_address(&address);
        let pool = AmmPool::new(&args, lp_mint, self.slot)?;
        self.tokens.create_mint(lp_mint, LP_DECIMALS, address)?;
        self.amms.insert(address, pool);

        let common = self.common(creator);
        self.emit(LedgerEvent::CreateAmm {
            common,
            amm: address,
            base_mint: args.base_mint,
            quote_mint: args.quote_mint,
            lp_mint,
            twap_initial_observation: args.twap_initial_observation,
            twap_max_observation_change_per_update: args.twap_max_observation_change_per_update,
        });
        Ok(address)
    }

    // ========================================================================
    // LIQUIDITY
    // ========================================================================

    pub fn add_liquidity(&mut self, user: Address, amm: Address, args: AddLiquidityArgs) -> Result<AddLiquidityQuote> {
        self.atomically(|ledger| ledger.add_liquidity_inner(user, amm, args))
    }

    pub(crate) fn add_liquidity_inner(
        &mut self,
        user: Address,
        amm: Address,
        args: AddLiquidityArgs,
    ) -> Result<AddLiquidityQuote> {
        let pool = self.amm_mut(&amm)?;
        let quote = pool.add_liquidity(&args)?;
        let (base_mint, quote_mint, lp_mint) = (pool.base_mint, pool.quote_mint, pool.lp_mint);

        self.tokens.transfer(&base_mint, &user, &amm, quote.base_amount)?;
        self.tokens.transfer(&quote_mint, &user, &amm, quote.quote_amount)?;
        self.tokens.mint_to(&lp_mint, &user, quote.lp_tokens)?;
        self.check_lp_supply(&amm)?;

        let common = self.common(user);
        let pool = self.pool_snapshot(&amm)?;
        self.emit(LedgerEvent::AddLiquidity {
            common,
            pool,
            base_amount: quote.base_amount,
            quote_amount: quote.quote_amount,
            lp_tokens_minted: quote.lp_tokens,
        });
        Ok(quote)
    }

    pub fn remove_liquidity(
        &mut self,
        user: Address,
        amm: Address,
        args: RemoveLiquidityArgs,
    ) -> Result<RemoveLiquidityQuote> {
        self.atomically(|ledger| ledger.remove_liquidity_inner(user, amm, args))
    }

    pub(crate) fn remove_liquidity_inner(
        &mut self,
        user: Address,
        amm: Address,
        args: RemoveLiquidityArgs,
    ) -> Result<RemoveLiquidityQuote> {
        let lp_mint = self.amm(&amm)?.lp_mint;
        // Token layer first: a user can't burn LP they don't hold
        self.tokens.burn(&lp_mint, &user, args.lp_tokens_to_burn)?;

        let pool = self.amm_mut(&amm)?;
        let quote = pool.remove_liquidity(&args)?;
        let (base_mint, quote_mint) = (pool.base_mint, pool.quote_mint);

        self.tokens.transfer(&base_mint, &amm, &user, quote.base_amount)?;
        self.tokens.transfer(&quote_mint, &amm, &user, quote.quote_amount)?;
        self.check_lp_supply(&amm)?;

        let common = self.common(user);
        let pool = self.pool_snapshot(&amm)?;
        self.emit(LedgerEvent::RemoveLiquidity {
            common,
            pool,
            lp_tokens_burned: quote.lp_tokens,
            base_amount: quote.base_amount,
            quote_amount: quote.quote_amount,
        });
        Ok(quote)
    }

    /// The pool's LP counter and the LP mint must agree
    fn check_lp_supply(&self, amm: &Address) -> Result<()> {
        let pool = self.amm(amm)?;
        let supply = self.tokens.supply(&pool.lp_mint);
        if supply != pool.lp_supply {
            warn!(amm = %amm, pool_supply = pool.lp_supply, mint_supply = supply, "lp supply mismatch");
            return Err(AmmError::AssertFailed.into());
        }
        Ok(())
    }

    // ========================================================================
    // SWAPS & ORACLE
    // ========================================================================

    pub fn swap(&mut self, user: Address, amm: Address, args: SwapArgs) -> Result<SwapQuote> {
        self.atomically(|ledger| ledger.swap_inner(user, amm, args))
    }

    pub(crate) fn swap_inner(&mut self, user: Address, amm: Address, args: SwapArgs) -> Result<SwapQuote> {
        let slot = self.slot;
        let pool = self.amm_mut(&amm)?;
        let quote = pool.swap(&args, slot)?;

        let (input_mint, output_mint) = match args.swap_type {
            SwapType::Buy => (pool.quote_mint, pool.base_mint),
            SwapType::Sell => (pool.base_mint, pool.quote_mint),
        };

        self.tokens.transfer(&input_mint, &user, &amm, quote.input_amount)?;
        self.tokens.transfer(&output_mint, &amm, &user, quote.output_amount)?;

        let common = self.common(user);
        let pool = self.pool_snapshot(&amm)?;
        self.emit(LedgerEvent::Swap {
            common,
            pool,
            swap_type: args.swap_type,
            input_amount: quote.input_amount,
            output_amount: quote.output_amount,
        });
        Ok(quote)
    }

    /// Quote a swap against the current reserves
    pub fn simulate_swap(&self, amm: &Address, swap_type: SwapType, input_amount: u64) -> Result<SwapQuote> {
        Ok(self.amm(amm)?.simulate_swap(swap_type, input_amount)?)
    }

    /// Tick the oracle without trading. Returns the new observation, if any.
    pub fn crank_that_twap(&mut self, cranker: Address, amm: Address) -> Result<Option<u128>> {
        self.atomically(|ledger| ledger.crank_that_twap_inner(cranker, amm))
    }

    pub(crate) fn crank_that_twap_inner(&mut self, cranker: Address, amm: Address) -> Result<Option<u128>> {
        let slot = self.slot;
        let observation = self.amm_mut(&amm)?.crank_that_twap(slot);

        let common = self.common(cranker);
        let pool = self.pool_snapshot(&amm)?;
        self.emit(LedgerEvent::CrankThatTwap { common, pool });
        Ok(observation)
    }

    pub fn get_twap(&self, amm: &Address) -> Result<u128> {
        Ok(self.amm(amm)?.get_twap()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amm::DEFAULT_SWAP_FEE_BPS;
    use crate::errors::TokenError;

    struct Setup {
        ledger: Ledger,
        alice: Address,
        meta: Address,
        usdc: Address,
        amm: Address,
    }

    fn setup() -> Setup {
        let mut ledger = Ledger::new();
        let alice = Address::from_label("alice");
        let meta = Address::from_label("META");
        let usdc = Address::from_label("USDC");
        ledger.create_mint(alice, meta, 9).unwrap();
        ledger.create_mint(alice, usdc, 6).unwrap();
        ledger.mint_tokens(alice, meta, alice, 100_000_000_000).unwrap();
        ledger.mint_tokens(alice, usdc, alice, 100_000_000_000).unwrap();

        let amm = ledger
            .create_amm(
                alice,
                CreateAmmArgs {
                    base_mint: meta,
                    quote_mint: usdc,
                    base_decimals: 0,
                    quote_decimals: 0,
                    twap_initial_observation: 500_000_000_000,
                    twap_max_observation_change_per_update: 10_000_000_000,
                    twap_start_delay_slots: 0,
                    swap_fee_bps: DEFAULT_SWAP_FEE_BPS,
                    proposal: None,
                },
            )
            .unwrap();
        Setup { ledger, alice, meta, usdc, amm }
    }

    #[test]
    fn test_create_amm_reads_mint_decimals() {
        let s = setup();
        let pool = s.ledger.amm(&s.amm).unwrap();
        assert_eq!((pool.base_decimals, pool.quote_decimals), (9, 6));
        assert_eq!(pool.oracle.last_updated_slot, pool.created_at_slot);
        assert!(s.ledger.tokens.mint(&pool.lp_mint).is_ok());
    }

    #[test]
    fn test_duplicate_amm_rejected() {
        let mut s = setup();
        let pool = s.ledger.amm(&s.amm).unwrap().clone();
        let args = CreateAmmArgs {
            base_mint: pool.base_mint,
            quote_mint: pool.quote_mint,
            base_decimals: 9,
            quote_decimals: 6,
            twap_initial_observation: 1,
            twap_max_observation_change_per_update: 1,
            twap_start_delay_slots: 0,
            swap_fee_bps: 100,
            proposal: None,
        };
        let err = s.ledger.create_amm(s.alice, args).unwrap_err();
        assert_eq!(err.code(), "AlreadyExists");
    }

    #[test]
    fn test_liquidity_moves_tokens() {
        let mut s = setup();
        let add = AddLiquidityArgs {
            max_quote_amount: 10_000_000_000,
            max_base_amount: 10_000_000_000,
            min_lp_tokens: 0,
        };
        s.ledger.add_liquidity(s.alice, s.amm, add).unwrap();
        assert_eq!(s.ledger.balance(&s.meta, &s.amm), 10_000_000_000);
        assert_eq!(s.ledger.balance(&s.usdc, &s.amm), 10_000_000_000);
        let lp_mint = s.ledger.amm(&s.amm).unwrap().lp_mint;
        assert_eq!(s.ledger.balance(&lp_mint, &s.alice), 10_000_000_000);

        let remove = RemoveLiquidityArgs {
            lp_tokens_to_burn: 10_000_000_000,
            min_base_amount: 0,
            min_quote_amount: 0,
        };
        s.ledger.remove_liquidity(s.alice, s.amm, remove).unwrap();
        assert_eq!(s.ledger.balance(&s.meta, &s.alice), 100_000_000_000);
        assert_eq!(s.ledger.balance(&lp_mint, &s.alice), 0);
    }

    #[test]
    fn test_swap_requires_input_balance() {
        let mut s = setup();
        let add = AddLiquidityArgs {
            max_quote_amount: 10_000_000_000,
            max_base_amount: 10_000_000_000,
            min_lp_tokens: 0,
        };
        s.ledger.add_liquidity(s.alice, s.amm, add).unwrap();
        let pool_before = s.ledger.amm(&s.amm).unwrap().clone();

        let bob = Address::from_label("bob");
        let buy = SwapArgs { swap_type: SwapType::Buy, input_amount: 100_000_000, output_amount_min: 0 };
        let err = s.ledger.swap(bob, s.amm, buy).unwrap_err();
        assert!(matches!(err, FutarchyError::Token(TokenError::InsufficientBalance { .. })));
        assert_eq!(s.ledger.amm(&s.amm).unwrap(), &pool_before);

        let quote = s.ledger.swap(s.alice, s.amm, buy).unwrap();
        assert_eq!(quote.output_amount, 98_029_507);
        assert_eq!(s.ledger.balance(&s.meta, &s.alice), 90_000_000_000 + 98_029_507);
    }

    #[test]
    fn test_crank_updates_oracle() {
        let mut s = setup();
        let add = AddLiquidityArgs {
            max_quote_amount: 10_000_000_000,
            max_base_amount: 10_000_000_000,
            min_lp_tokens: 0,
        };
        s.ledger.add_liquidity(s.alice, s.amm, add).unwrap();
        assert_eq!(s.ledger.get_twap(&s.amm), Err(AmmError::NoSlotsPassed.into()));

        s.ledger.advance_slots(100);
        let observation = s.ledger.crank_that_twap(s.alice, s.amm).unwrap();
        assert_eq!(observation, Some(510_000_000_000));
        assert_eq!(s.ledger.get_twap(&s.amm).unwrap(), 510_000_000_000);

        // Same slot again is a no-op
        assert_eq!(s.ledger.crank_that_twap(s.alice, s.amm).unwrap(), None);
    }
}
