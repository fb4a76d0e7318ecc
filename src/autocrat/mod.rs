// Futarchy governance: DAOs and proposals decided by conditional markets

pub mod dao;
pub mod proposal;

pub use dao::{
    Dao, InitializeDaoArgs, UpdateDaoParams, DEFAULT_MAX_AMM_AGE_SLOTS, DEFAULT_PASS_THRESHOLD_BPS,
    THREE_DAYS_IN_SLOTS,
};
pub use proposal::{
    decide, AutocratInstruction, Proposal, ProposalAccount, ProposalInstruction, ProposalState,
    TokenInstruction, TreasuryCall, FAIL_INDEX, PASS_INDEX,
};
