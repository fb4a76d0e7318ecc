//! Constant-product pools with an embedded TWAP oracle
//!
//! Pool math lives on `AmmPool` as pure `simulate_*` functions; the
//! mutating paths call them first and only write once every check passed.

pub mod oracle;
pub mod pool;

pub use oracle::{OracleSnapshot, TwapOracle};
pub use pool::{
    AddLiquidityArgs, AddLiquidityQuote, AmmPool, CreateAmmArgs, RemoveLiquidityArgs,
    RemoveLiquidityQuote, SwapArgs, SwapQuote, SwapType,
};

/// Swap fee taken from every input, in basis points (1%)
pub const DEFAULT_SWAP_FEE_BPS: u16 = 100;

/// First deposit must bring strictly more quote than this
pub const MIN_INITIAL_QUOTE_AMOUNT: u64 = 100_000_000;

/// Decimals of every LP mint
pub const LP_DECIMALS: u8 = 9;
