use serde::{Deserialize, Serialize};
use std::fmt;

use super::oracle::TwapOracle;
use super::{DEFAULT_SWAP_FEE_BPS, MIN_INITIAL_QUOTE_AMOUNT};
use crate::address::Address;
use crate::errors::AmmError;
use crate::price_math::{price_from_reserves, MAX_BPS};

// ============================================================================
// SWAP DIRECTION
// ============================================================================

/// Direction of a swap, from the trader's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapType {
    /// Spend quote, receive base
    Buy,
    /// Spend base, receive quote
    Sell,
}

impl fmt::Display for SwapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapType::Buy => write!(f, "buy"),
            SwapType::Sell => write!(f, "sell"),
        }
    }
}

// ============================================================================
// ARGUMENTS & QUOTES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAmmArgs {
    pub base_mint: Address,
    pub quote_mint: Address,
    /// Overwritten from the mint when the ledger creates the pool
    #[serde(default)]
    pub base_decimals: u8,
    #[serde(default)]
    pub quote_decimals: u8,
    pub twap_initial_observation: u128,
    pub twap_max_observation_change_per_update: u128,
    #[serde(default)]
    pub twap_start_delay_slots: u64,
    #[serde(default = "default_swap_fee_bps")]
    pub swap_fee_bps: u16,
    #[serde(default)]
    pub proposal: Option<Address>,
}

fn default_swap_fee_bps() -> u16 {
    DEFAULT_SWAP_FEE_BPS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityArgs {
    /// Quote the depositor commits; ratio is anchored on this side
    pub max_quote_amount: u64,
    pub max_base_amount: u64,
    pub min_lp_tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityQuote {
    pub base_amount: u64,
    pub quote_amount: u64,
    pub lp_tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityArgs {
    pub lp_tokens_to_burn: u64,
    pub min_base_amount: u64,
    pub min_quote_amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityQuote {
    pub base_amount: u64,
    pub quote_amount: u64,
    pub lp_tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapArgs {
    pub swap_type: SwapType,
    pub input_amount: u64,
    pub output_amount_min: u64,
}

/// Result of a swap, simulated or applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub swap_type: SwapType,
    pub input_amount: u64,
    pub output_amount: u64,
    /// Portion of the input kept by the pool for LPs
    pub fee_amount: u64,
    pub new_base_amount: u64,
    pub new_quote_amount: u64,
}

// ============================================================================
// AMM POOL
// ============================================================================

/// Constant-product pool over a base and a quote mint.
///
/// Reserve math uses raw units only; decimals are kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmPool {
    /// Proposal this pool was created for, if any
    pub proposal: Option<Address>,
    pub created_at_slot: u64,
    pub lp_mint: Address,
    pub base_mint: Address,
    pub quote_mint: Address,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub base_amount: u64,
    pub quote_amount: u64,
    /// Mirrors the LP mint's supply
    pub lp_supply: u64,
    pub swap_fee_bps: u16,
    pub oracle: TwapOracle,
}

impl AmmPool {
    /// Create an empty pool.
    ///
    /// # Arguments
    /// * `args` - Mints, decimals, oracle policy and fee tier
    /// * `lp_mint` - Mint that will track LP claims
    /// * `current_slot` - Creation slot; also the oracle's first update slot
    pub fn new(args: &CreateAmmArgs, lp_mint: Address, current_slot: u64) -> Result<Self, AmmError> {
        if args.base_mint == args.quote_mint {
            return Err(AmmError::SameTokenMints);
        }
        if args.swap_fee_bps >= MAX_BPS {
            return Err(AmmError::InvalidSwapFee);
        }

        Ok(Self {
            proposal: args.proposal,
            created_at_slot: current_slot,
            lp_mint,
            base_mint: args.base_mint,
            quote_mint: args.quote_mint,
            base_decimals: args.base_decimals,
            quote_decimals: args.quote_decimals,
            base_amount: 0,
            quote_amount: 0,
            lp_supply: 0,
            swap_fee_bps: args.swap_fee_bps,
            oracle: TwapOracle::new(
                args.twap_initial_observation,
                args.twap_max_observation_change_per_update,
                args.twap_start_delay_slots,
                current_slot,
            ),
        })
    }

    /// Constant product of the reserves
    pub fn k(&self) -> u128 {
        self.base_amount as u128 * self.quote_amount as u128
    }

    /// Current spot price scaled by PRICE_SCALE, None while a side is empty
    pub fn spot_price(&self) -> Option<u128> {
        price_from_reserves(self.base_amount, self.quote_amount)
    }

    pub fn has_reserves(&self) -> bool {
        self.base_amount > 0 && self.quote_amount > 0
    }

    // ========================================================================
    // SWAPS
    // ========================================================================

    /// Quote a swap without touching the pool. `swap` applies exactly this.
    pub fn simulate_swap(&self, swap_type: SwapType, input_amount: u64) -> Result<SwapQuote, AmmError> {
        if input_amount == 0 {
            return Err(AmmError::ZeroSwapAmount);
        }
        if !self.has_reserves() {
            return Err(AmmError::NoReserves);
        }

        let (input_reserve, output_reserve) = match swap_type {
            SwapType::Buy => (self.quote_amount, self.base_amount),
            SwapType::Sell => (self.base_amount, self.quote_amount),
        };

        // Fee is floored first, so any rounding stays with the pool
        let fee_multiplier = (MAX_BPS - self.swap_fee_bps) as u128;
        let input_minus_fee = input_amount as u128 * fee_multiplier / MAX_BPS as u128;

        // u64 * u64 always fits in u128
        let numerator = input_minus_fee * output_reserve as u128;
        let denominator = input_reserve as u128 + input_minus_fee;

        // numerator / denominator < output_reserve, so this always fits
        let output_amount = u64::try_from(numerator / denominator).map_err(|_| AmmError::CastingOverflow)?;

        let new_input_reserve = input_reserve
            .checked_add(input_amount)
            .ok_or(AmmError::InputAmountOverflow)?;
        let new_output_reserve = output_reserve
            .checked_sub(output_amount)
            .ok_or(AmmError::AssertFailed)?;

        let (new_base_amount, new_quote_amount) = match swap_type {
            SwapType::Buy => (new_output_reserve, new_input_reserve),
            SwapType::Sell => (new_input_reserve, new_output_reserve),
        };

        if (new_base_amount as u128 * new_quote_amount as u128) < self.k() {
            return Err(AmmError::ConstantProductInvariantFailed);
        }

        let fee_amount = input_amount - input_minus_fee as u64;

        Ok(SwapQuote {
            swap_type,
            input_amount,
            output_amount,
            fee_amount,
            new_base_amount,
            new_quote_amount,
        })
    }

    /// Execute a swap and tick the oracle with the post-trade price.
    ///
    /// Nothing is written unless every check passes.
    pub fn swap(&mut self, args: &SwapArgs, current_slot: u64) -> Result<SwapQuote, AmmError> {
        let quote = self.simulate_swap(args.swap_type, args.input_amount)?;

        if quote.output_amount < args.output_amount_min {
            return Err(AmmError::SwapSlippageExceeded);
        }

        self.base_amount = quote.new_base_amount;
        self.quote_amount = quote.new_quote_amount;
        self.update_twap(current_slot);

        Ok(quote)
    }

    /// Feed the current spot price to the oracle
    pub fn update_twap(&mut self, current_slot: u64) -> Option<u128> {
        let price = self.spot_price()?;
        self.oracle.update(current_slot, price)
    }

    /// Keep the oracle current when nobody trades
    pub fn crank_that_twap(&mut self, current_slot: u64) -> Option<u128> {
        self.update_twap(current_slot)
    }

    pub fn get_twap(&self) -> Result<u128, AmmError> {
        self.oracle.get_twap()
    }

    // ========================================================================
    // LIQUIDITY
    // ========================================================================

    /// Amounts a deposit would take and the LP it would mint
    pub fn simulate_add_liquidity(&self, args: &AddLiquidityArgs) -> Result<AddLiquidityQuote, AmmError> {
        if args.max_quote_amount == 0 || args.max_base_amount == 0 {
            return Err(AmmError::ZeroLiquidityToAdd);
        }

        let quote = if self.lp_supply == 0 {
            self.quote_initial_deposit(args)?
        } else {
            self.quote_proportional_deposit(args)?
        };

        // Reject deposits the reserves or supply can't absorb
        self.base_amount
            .checked_add(quote.base_amount)
            .ok_or(AmmError::AddLiquidityCalculationError)?;
        self.quote_amount
            .checked_add(quote.quote_amount)
            .ok_or(AmmError::AddLiquidityCalculationError)?;
        self.lp_supply
            .checked_add(quote.lp_tokens)
            .ok_or(AmmError::AddLiquidityCalculationError)?;

        Ok(quote)
    }

    fn quote_initial_deposit(&self, args: &AddLiquidityArgs) -> Result<AddLiquidityQuote, AmmError> {
        if args.max_quote_amount <= MIN_INITIAL_QUOTE_AMOUNT {
            return Err(AmmError::InsufficientQuoteAmount);
        }

        let lp_tokens = args.max_quote_amount;
        if lp_tokens < args.min_lp_tokens {
            return Err(AmmError::AddLiquiditySlippageExceeded);
        }

        Ok(AddLiquidityQuote {
            base_amount: args.max_base_amount,
            quote_amount: args.max_quote_amount,
            lp_tokens,
        })
    }

    fn quote_proportional_deposit(&self, args: &AddLiquidityArgs) -> Result<AddLiquidityQuote, AmmError> {
        if args.min_lp_tokens == 0 {
            return Err(AmmError::ZeroMinLpTokens);
        }

        let base_reserve = self.base_amount as u128;
        let quote_reserve = self.quote_amount as u128;
        let supply = self.lp_supply as u128;
        let quote_amount = args.max_quote_amount as u128;

        // Round base up so the pool never loses to a depositor
        let base_amount = quote_amount
            .checked_mul(base_reserve)
            .and_then(|v| v.checked_div(quote_reserve))
            .and_then(|v| v.checked_add(1))
            .ok_or(AmmError::AddLiquidityCalculationError)?;
        let base_amount = u64::try_from(base_amount).map_err(|_| AmmError::AddLiquidityCalculationError)?;

        if base_amount > args.max_base_amount {
            return Err(AmmError::AddLiquidityMaxBaseExceeded);
        }

        let lp_by_quote = quote_amount
            .checked_mul(supply)
            .and_then(|v| v.checked_div(quote_reserve))
            .ok_or(AmmError::AddLiquidityCalculationError)?;
        let lp_by_base = (base_amount as u128)
            .checked_mul(supply)
            .and_then(|v| v.checked_div(base_reserve))
            .ok_or(AmmError::AddLiquidityCalculationError)?;
        let lp_tokens = u64::try_from(lp_by_quote.min(lp_by_base))
            .map_err(|_| AmmError::AddLiquidityCalculationError)?;

        if lp_tokens < args.min_lp_tokens {
            return Err(AmmError::AddLiquiditySlippageExceeded);
        }

        Ok(AddLiquidityQuote {
            base_amount,
            quote_amount: args.max_quote_amount,
            lp_tokens,
        })
    }

    /// Deposit liquidity. Does not tick the oracle.
    pub fn add_liquidity(&mut self, args: &AddLiquidityArgs) -> Result<AddLiquidityQuote, AmmError> {
        let quote = self.simulate_add_liquidity(args)?;

        // Checked in simulate_add_liquidity
        self.base_amount += quote.base_amount;
        self.quote_amount += quote.quote_amount;
        self.lp_supply += quote.lp_tokens;

        Ok(quote)
    }

    /// Amounts a burn of LP would release
    pub fn simulate_remove_liquidity(&self, args: &RemoveLiquidityArgs) -> Result<RemoveLiquidityQuote, AmmError> {
        if args.lp_tokens_to_burn == 0 {
            return Err(AmmError::ZeroLiquidityRemove);
        }
        if args.lp_tokens_to_burn > self.lp_supply {
            return Err(AmmError::AssertFailed);
        }

        let lp = args.lp_tokens_to_burn as u128;
        let supply = self.lp_supply as u128;
        // reserve * lp / supply <= reserve
        let base_amount = (self.base_amount as u128 * lp / supply) as u64;
        let quote_amount = (self.quote_amount as u128 * lp / supply) as u64;

        if base_amount < args.min_base_amount || quote_amount < args.min_quote_amount {
            return Err(AmmError::RemoveLiquiditySlippageExceeded);
        }

        Ok(RemoveLiquidityQuote {
            base_amount,
            quote_amount,
            lp_tokens: args.lp_tokens_to_burn,
        })
    }

    pub fn remove_liquidity(&mut self, args: &RemoveLiquidityArgs) -> Result<RemoveLiquidityQuote, AmmError> {
        let quote = self.simulate_remove_liquidity(args)?;

        self.base_amount -= quote.base_amount;
        self.quote_amount -= quote.quote_amount;
        self.lp_supply -= quote.lp_tokens;

        Ok(quote)
    }

    /// Reserves a given amount of LP currently claims
    pub fn reserves_for_lp(&self, lp_tokens: u64) -> (u64, u64) {
        if self.lp_supply == 0 {
            return (0, 0);
        }
        let lp = lp_tokens.min(self.lp_supply) as u128;
        let supply = self.lp_supply as u128;
        (
            (self.base_amount as u128 * lp / supply) as u64,
            (self.quote_amount as u128 * lp / supply) as u64,
        )
    }
}
