//! Futarchy ledger: conditional-market governance on a constant-product AMM
//! Exports all modules for use as a library crate

pub mod address;
pub mod amm;
pub mod app_state;
pub mod autocrat;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod price_math;
pub mod routes;
pub mod vault;

// Re-export the core records and operations
pub use address::Address;
pub use amm::{
    AddLiquidityArgs, AmmPool, CreateAmmArgs, RemoveLiquidityArgs, SwapArgs, SwapQuote, SwapType,
    TwapOracle,
};
pub use autocrat::{Dao, InitializeDaoArgs, Proposal, ProposalInstruction, ProposalState, UpdateDaoParams};
pub use errors::{AmmError, AutocratError, ErrorCategory, FutarchyError, TokenError, VaultError};
pub use events::LedgerEvent;
pub use ledger::{EnqueueProposalArgs, InitializeProposalArgs, Ledger};
pub use vault::{ConditionalVault, InitializeQuestionArgs, Question};
