// Error types for the AMM, vault, autocrat and token layers

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CATEGORIES
// ============================================================================

/// Broad class of a failure. Every named error belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad arguments or a violated creation-time invariant
    Configuration,
    /// A checked computation could not be represented
    Arithmetic,
    /// A caller supplied tolerance was not met; retry with new parameters
    GuardRail,
    /// Operation attempted outside its lifecycle window
    Lifecycle,
    /// Signer or policy mismatch
    Authorization,
    /// Token balance or supply problem
    Token,
    /// Referenced record does not exist
    NotFound,
}

// ============================================================================
// AMM ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AmmError {
    AssertFailed,
    NoSlotsPassed,
    NoReserves,
    InputAmountOverflow,
    AddLiquidityCalculationError,
    DecimalScaleError,
    SameTokenMints,
    SwapSlippageExceeded,
    ZeroLiquidityRemove,
    ZeroLiquidityToAdd,
    ZeroMinLpTokens,
    AddLiquiditySlippageExceeded,
    AddLiquidityMaxBaseExceeded,
    InsufficientQuoteAmount,
    ZeroSwapAmount,
    ConstantProductInvariantFailed,
    CastingOverflow,
    RemoveLiquiditySlippageExceeded,
    InvalidSwapFee,
}

impl AmmError {
    pub fn code(&self) -> &'static str {
        match self {
            AmmError::AssertFailed => "AssertFailed",
            AmmError::NoSlotsPassed => "NoSlotsPassed",
            AmmError::NoReserves => "NoReserves",
            AmmError::InputAmountOverflow => "InputAmountOverflow",
            AmmError::AddLiquidityCalculationError => "AddLiquidityCalculationError",
            AmmError::DecimalScaleError => "DecimalScaleError",
            AmmError::SameTokenMints => "SameTokenMints",
            AmmError::SwapSlippageExceeded => "SwapSlippageExceeded",
            AmmError::ZeroLiquidityRemove => "ZeroLiquidityRemove",
            AmmError::ZeroLiquidityToAdd => "ZeroLiquidityToAdd",
            AmmError::ZeroMinLpTokens => "ZeroMinLpTokens",
            AmmError::AddLiquiditySlippageExceeded => "AddLiquiditySlippageExceeded",
            AmmError::AddLiquidityMaxBaseExceeded => "AddLiquidityMaxBaseExceeded",
            AmmError::InsufficientQuoteAmount => "InsufficientQuoteAmount",
            AmmError::ZeroSwapAmount => "ZeroSwapAmount",
            AmmError::ConstantProductInvariantFailed => "ConstantProductInvariantFailed",
            AmmError::CastingOverflow => "CastingOverflow",
            AmmError::RemoveLiquiditySlippageExceeded => "RemoveLiquiditySlippageExceeded",
            AmmError::InvalidSwapFee => "InvalidSwapFee",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AmmError::SameTokenMints
            | AmmError::InsufficientQuoteAmount
            | AmmError::ZeroLiquidityToAdd
            | AmmError::ZeroLiquidityRemove
            | AmmError::ZeroMinLpTokens
            | AmmError::ZeroSwapAmount
            | AmmError::InvalidSwapFee => ErrorCategory::Configuration,
            AmmError::InputAmountOverflow
            | AmmError::AddLiquidityCalculationError
            | AmmError::DecimalScaleError
            | AmmError::CastingOverflow
            | AmmError::ConstantProductInvariantFailed
            | AmmError::AssertFailed => ErrorCategory::Arithmetic,
            AmmError::SwapSlippageExceeded
            | AmmError::AddLiquiditySlippageExceeded
            | AmmError::AddLiquidityMaxBaseExceeded
            | AmmError::RemoveLiquiditySlippageExceeded => ErrorCategory::GuardRail,
            AmmError::NoSlotsPassed | AmmError::NoReserves => ErrorCategory::Lifecycle,
        }
    }
}

impl fmt::Display for AmmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AmmError::AssertFailed => "An assertion failed",
            AmmError::NoSlotsPassed => "Can't get a TWAP before some observations have been stored",
            AmmError::NoReserves => "Can't swap through a pool without token reserves on either side",
            AmmError::InputAmountOverflow => "Input token amount is too large for a swap, causes overflow",
            AmmError::AddLiquidityCalculationError => "Add liquidity calculation error",
            AmmError::DecimalScaleError => "Error in decimal scale conversion",
            AmmError::SameTokenMints => "You can't create an AMM pool where the token mints are the same",
            AmmError::SwapSlippageExceeded => "A user wouldn't have gotten back their `output_amount_min`, reverting",
            AmmError::ZeroLiquidityRemove => "Cannot remove zero liquidity",
            AmmError::ZeroLiquidityToAdd => "Cannot add liquidity with 0 tokens on either side",
            AmmError::ZeroMinLpTokens => "Must specify a non-zero `min_lp_tokens` when adding to an existing pool",
            AmmError::AddLiquiditySlippageExceeded => "LP wouldn't have gotten back `lp_token_min`",
            AmmError::AddLiquidityMaxBaseExceeded => "LP would have spent more than `max_base_amount`",
            AmmError::InsufficientQuoteAmount => "`quote_amount` must be greater than 100000000 when initializing a pool",
            AmmError::ZeroSwapAmount => "Users must swap a non-zero amount",
            AmmError::ConstantProductInvariantFailed => "K should always be increasing",
            AmmError::CastingOverflow => "Casting has caused an overflow",
            AmmError::RemoveLiquiditySlippageExceeded => "LP wouldn't have gotten back `min_base_amount` and `min_quote_amount`",
            AmmError::InvalidSwapFee => "Swap fee must be below 10000 basis points",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for AmmError {}

// ============================================================================
// VAULT ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VaultError {
    AssertFailed,
    InsufficientUnderlyingTokens,
    InsufficientConditionalTokens,
    CantRedeemConditionalTokens,
    InsufficientNumConditions,
    InvalidNumPayoutNumerators,
    PayoutZero,
    QuestionAlreadyResolved,
    UnauthorizedOracle,
    NumOutcomesMismatch,
}

impl VaultError {
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::AssertFailed => "AssertFailed",
            VaultError::InsufficientUnderlyingTokens => "InsufficientUnderlyingTokens",
            VaultError::InsufficientConditionalTokens => "InsufficientConditionalTokens",
            VaultError::CantRedeemConditionalTokens => "CantRedeemConditionalTokens",
            VaultError::InsufficientNumConditions => "InsufficientNumConditions",
            VaultError::InvalidNumPayoutNumerators => "InvalidNumPayoutNumerators",
            VaultError::PayoutZero => "PayoutZero",
            VaultError::QuestionAlreadyResolved => "QuestionAlreadyResolved",
            VaultError::UnauthorizedOracle => "UnauthorizedOracle",
            VaultError::NumOutcomesMismatch => "NumOutcomesMismatch",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            VaultError::InsufficientNumConditions
            | VaultError::InvalidNumPayoutNumerators
            | VaultError::PayoutZero
            | VaultError::NumOutcomesMismatch => ErrorCategory::Configuration,
            VaultError::InsufficientUnderlyingTokens | VaultError::InsufficientConditionalTokens => {
                ErrorCategory::Token
            }
            VaultError::CantRedeemConditionalTokens | VaultError::QuestionAlreadyResolved => {
                ErrorCategory::Lifecycle
            }
            VaultError::UnauthorizedOracle => ErrorCategory::Authorization,
            VaultError::AssertFailed => ErrorCategory::Arithmetic,
        }
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            VaultError::AssertFailed => "Vault invariant check failed",
            VaultError::InsufficientUnderlyingTokens => "Insufficient underlying token balance to mint this amount of conditional tokens",
            VaultError::InsufficientConditionalTokens => "Insufficient conditional token balance to merge or redeem this amount",
            VaultError::CantRedeemConditionalTokens => "Conditional tokens can only be redeemed once the question is resolved",
            VaultError::InsufficientNumConditions => "Questions need 2 or more conditions",
            VaultError::InvalidNumPayoutNumerators => "Invalid number of payout numerators",
            VaultError::PayoutZero => "Payouts must sum to 1 or more",
            VaultError::QuestionAlreadyResolved => "Question already resolved",
            VaultError::UnauthorizedOracle => "Only the question's oracle can resolve it",
            VaultError::NumOutcomesMismatch => "Vault outcome count must match the question",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for VaultError {}

// ============================================================================
// AUTOCRAT ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutocratError {
    AmmTooOld,
    InvalidInitialObservation,
    InvalidMaxObservationChange,
    InvalidStartDelaySlots,
    InvalidVaultUnderlying,
    InvalidMarket,
    InvalidQuestion,
    InsufficientLpTokenBalance,
    InsufficientLpTokenLock,
    MarketsTooYoung,
    ProposalAlreadyFinalized,
    ProposalNotPassed,
    InvalidPassThreshold,
    InvalidInstruction,
    UnauthorizedTreasury,
}

impl AutocratError {
    pub fn code(&self) -> &'static str {
        match self {
            AutocratError::AmmTooOld => "AmmTooOld",
            AutocratError::InvalidInitialObservation => "InvalidInitialObservation",
            AutocratError::InvalidMaxObservationChange => "InvalidMaxObservationChange",
            AutocratError::InvalidStartDelaySlots => "InvalidStartDelaySlots",
            AutocratError::InvalidVaultUnderlying => "InvalidVaultUnderlying",
            AutocratError::InvalidMarket => "InvalidMarket",
            AutocratError::InvalidQuestion => "InvalidQuestion",
            AutocratError::InsufficientLpTokenBalance => "InsufficientLpTokenBalance",
            AutocratError::InsufficientLpTokenLock => "InsufficientLpTokenLock",
            AutocratError::MarketsTooYoung => "MarketsTooYoung",
            AutocratError::ProposalAlreadyFinalized => "ProposalAlreadyFinalized",
            AutocratError::ProposalNotPassed => "ProposalNotPassed",
            AutocratError::InvalidPassThreshold => "InvalidPassThreshold",
            AutocratError::InvalidInstruction => "InvalidInstruction",
            AutocratError::UnauthorizedTreasury => "UnauthorizedTreasury",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AutocratError::AmmTooOld
            | AutocratError::MarketsTooYoung
            | AutocratError::ProposalAlreadyFinalized
            | AutocratError::ProposalNotPassed => ErrorCategory::Lifecycle,
            AutocratError::InvalidInitialObservation
            | AutocratError::InvalidMaxObservationChange
            | AutocratError::InvalidStartDelaySlots
            | AutocratError::UnauthorizedTreasury => ErrorCategory::Authorization,
            AutocratError::InsufficientLpTokenBalance => ErrorCategory::Token,
            AutocratError::InsufficientLpTokenLock
            | AutocratError::InvalidVaultUnderlying
            | AutocratError::InvalidMarket
            | AutocratError::InvalidQuestion
            | AutocratError::InvalidPassThreshold
            | AutocratError::InvalidInstruction => ErrorCategory::Configuration,
        }
    }
}

impl fmt::Display for AutocratError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AutocratError::AmmTooOld => "Amms must have been created within 5 minutes (counted in slots) of proposal initialization",
            AutocratError::InvalidInitialObservation => "An amm has an `initial_observation` that doesn't match the `dao`'s config",
            AutocratError::InvalidMaxObservationChange => "An amm has a `max_observation_change_per_update` that doesn't match the `dao`'s config",
            AutocratError::InvalidStartDelaySlots => "An amm has a `start_delay_slots` that doesn't match the `dao`'s config",
            AutocratError::InvalidVaultUnderlying => "A conditional vault has an underlying token that doesn't match the `dao`'s mints",
            AutocratError::InvalidMarket => "An amm doesn't trade the proposal's conditional tokens",
            AutocratError::InvalidQuestion => "The question must have two outcomes and be resolvable by the proposal",
            AutocratError::InsufficientLpTokenBalance => "The proposer doesn't hold enough LP tokens to lock",
            AutocratError::InsufficientLpTokenLock => "The locked LP tokens don't meet the `dao`'s minimum futarchic liquidity",
            AutocratError::MarketsTooYoung => "Oracles need to have been running for `slots_per_proposal` before the proposal can be finalized",
            AutocratError::ProposalAlreadyFinalized => "This proposal has already been finalized",
            AutocratError::ProposalNotPassed => "This proposal can't be executed because it isn't in the passed state",
            AutocratError::InvalidPassThreshold => "`pass_threshold_bps` must not exceed 10000",
            AutocratError::InvalidInstruction => "The proposal instruction targets an unknown program or carries undecodable data",
            AutocratError::UnauthorizedTreasury => "Only the DAO treasury can perform this action",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for AutocratError {}

// ============================================================================
// TOKEN ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenError {
    InsufficientBalance { needed: u64, available: u64 },
    SupplyOverflow,
    UnauthorizedMintAuthority,
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::InsufficientBalance { .. } => "InsufficientBalance",
            TokenError::SupplyOverflow => "SupplyOverflow",
            TokenError::UnauthorizedMintAuthority => "UnauthorizedMintAuthority",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TokenError::UnauthorizedMintAuthority => ErrorCategory::Authorization,
            TokenError::SupplyOverflow => ErrorCategory::Arithmetic,
            TokenError::InsufficientBalance { .. } => ErrorCategory::Token,
        }
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InsufficientBalance { needed, available } => {
                write!(f, "Insufficient balance: need {}, have {}", needed, available)
            }
            TokenError::SupplyOverflow => write!(f, "Mint supply would overflow"),
            TokenError::UnauthorizedMintAuthority => write!(f, "Signer is not the mint authority"),
        }
    }
}

impl std::error::Error for TokenError {}

// ============================================================================
// UMBRELLA ERROR
// ============================================================================

/// Any failure a ledger operation can report. Each variant leaves the
/// ledger exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FutarchyError {
    Amm(AmmError),
    Vault(VaultError),
    Autocrat(AutocratError),
    Token(TokenError),
    NotFound { kind: &'static str, address: String },
    AlreadyExists { kind: &'static str, address: String },
}

impl FutarchyError {
    pub fn not_found(kind: &'static str, address: impl ToString) -> Self {
        FutarchyError::NotFound { kind, address: address.to_string() }
    }

    pub fn already_exists(kind: &'static str, address: impl ToString) -> Self {
        FutarchyError::AlreadyExists { kind, address: address.to_string() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FutarchyError::Amm(e) => e.code(),
            FutarchyError::Vault(e) => e.code(),
            FutarchyError::Autocrat(e) => e.code(),
            FutarchyError::Token(e) => e.code(),
            FutarchyError::NotFound { .. } => "NotFound",
            FutarchyError::AlreadyExists { .. } => "AlreadyExists",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FutarchyError::Amm(e) => e.category(),
            FutarchyError::Vault(e) => e.category(),
            FutarchyError::Autocrat(e) => e.category(),
            FutarchyError::Token(e) => e.category(),
            FutarchyError::NotFound { .. } => ErrorCategory::NotFound,
            FutarchyError::AlreadyExists { .. } => ErrorCategory::Configuration,
        }
    }
}

impl fmt::Display for FutarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FutarchyError::Amm(e) => write!(f, "{}", e),
            FutarchyError::Vault(e) => write!(f, "{}", e),
            FutarchyError::Autocrat(e) => write!(f, "{}", e),
            FutarchyError::Token(e) => write!(f, "{}", e),
            FutarchyError::NotFound { kind, address } => write!(f, "{} not found: {}", kind, address),
            FutarchyError::AlreadyExists { kind, address } => {
                write!(f, "{} already exists: {}", kind, address)
            }
        }
    }
}

impl std::error::Error for FutarchyError {}

impl From<AmmError> for FutarchyError {
    fn from(e: AmmError) -> Self {
        FutarchyError::Amm(e)
    }
}

impl From<VaultError> for FutarchyError {
    fn from(e: VaultError) -> Self {
        FutarchyError::Vault(e)
    }
}

impl From<AutocratError> for FutarchyError {
    fn from(e: AutocratError) -> Self {
        FutarchyError::Autocrat(e)
    }
}

impl From<TokenError> for FutarchyError {
    fn from(e: TokenError) -> Self {
        FutarchyError::Token(e)
    }
}

pub type Result<T, E = FutarchyError> = std::result::Result<T, E>;
