// Routes module - maps every HTTP endpoint to its handler

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app_state::SharedState;
use crate::handlers::*;

/// Endpoint table, printed at startup
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Liveness and current slot"),
    ("GET", "/clock", "Current slot"),
    ("POST", "/clock/advance", "Advance the slot clock"),
    ("POST", "/mints", "Create a mint"),
    ("POST", "/mints/:mint/mint_to", "Mint tokens"),
    ("GET", "/balances/:owner", "Balances by mint"),
    ("POST", "/amms", "Create an AMM"),
    ("GET", "/amms/:amm", "Pool state and spot price"),
    ("GET", "/amms/:amm/twap", "Oracle TWAP"),
    ("POST", "/amms/:amm/add_liquidity", "Deposit liquidity"),
    ("POST", "/amms/:amm/remove_liquidity", "Withdraw liquidity"),
    ("POST", "/amms/:amm/swap", "Swap"),
    ("POST", "/amms/:amm/quote", "Simulate a swap"),
    ("POST", "/amms/:amm/crank", "Crank the oracle"),
    ("POST", "/questions", "Create a question"),
    ("POST", "/questions/:question/resolve", "Resolve a question"),
    ("POST", "/vaults", "Create a conditional vault"),
    ("POST", "/vaults/:vault/split", "Split underlying into outcome tokens"),
    ("POST", "/vaults/:vault/merge", "Merge outcome tokens into underlying"),
    ("POST", "/vaults/:vault/redeem", "Redeem after resolution"),
    ("POST", "/daos", "Create a DAO"),
    ("GET", "/daos/:dao", "DAO policy"),
    ("POST", "/proposals", "Create and enqueue a proposal"),
    ("GET", "/proposals/:proposal", "Proposal state"),
    ("POST", "/proposals/:proposal/finalize", "Decide a proposal"),
    ("POST", "/proposals/:proposal/execute", "Run a passed proposal"),
    ("GET", "/events", "Recent ledger events"),
    ("POST", "/price/amm", "Human price to fixed point"),
    ("POST", "/price/human", "Fixed point price to human"),
];

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== HEALTH & CLOCK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/clock", get(get_clock))
        .route("/clock/advance", post(advance_clock))
        // ===== TOKENS =====
        .route("/mints", post(create_mint))
        .route("/mints/:mint/mint_to", post(mint_to))
        .route("/balances/:owner", get(get_balances))
        // ===== AMMS =====
        .route("/amms", post(create_amm))
        .route("/amms/:amm", get(get_amm))
        .route("/amms/:amm/twap", get(get_twap))
        .route("/amms/:amm/add_liquidity", post(add_liquidity))
        .route("/amms/:amm/remove_liquidity", post(remove_liquidity))
        .route("/amms/:amm/swap", post(swap))
        .route("/amms/:amm/quote", post(quote_swap))
        .route("/amms/:amm/crank", post(crank_twap))
        // ===== QUESTIONS & VAULTS =====
        .route("/questions", post(create_question))
        .route("/questions/:question/resolve", post(resolve_question))
        .route("/vaults", post(create_vault))
        .route("/vaults/:vault/split", post(split_tokens))
        .route("/vaults/:vault/merge", post(merge_tokens))
        .route("/vaults/:vault/redeem", post(redeem_tokens))
        // ===== DAOS & PROPOSALS =====
        .route("/daos", post(create_dao))
        .route("/daos/:dao", get(get_dao))
        .route("/proposals", post(create_proposal))
        .route("/proposals/:proposal", get(get_proposal))
        .route("/proposals/:proposal/finalize", post(finalize_proposal))
        .route("/proposals/:proposal/execute", post(execute_proposal))
        // ===== READS & HELPERS =====
        .route("/events", get(get_events))
        .route("/price/amm", post(to_amm_price))
        .route("/price/human", post(to_human_price))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
