// Conditional token vaults and the questions that gate them

pub mod conditional_vault;
pub mod question;

pub use conditional_vault::ConditionalVault;
pub use question::{InitializeQuestionArgs, Question, MIN_OUTCOMES};
