// HTTP request handlers for the futarchy ledger API
//
// Every handler locks the shared state, runs one ledger operation and maps
// the outcome to JSON. Ledger operations are atomic, so an error response
// always means nothing changed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::debug;

use crate::address::Address;
use crate::amm::{
    AddLiquidityArgs, AddLiquidityQuote, CreateAmmArgs, RemoveLiquidityArgs, RemoveLiquidityQuote,
    SwapArgs, SwapQuote,
};
use crate::app_state::{lock, SharedState};
use crate::autocrat::InitializeDaoArgs;
use crate::errors::{ErrorCategory, FutarchyError};
use crate::events::LedgerEvent;
use crate::ledger::InitializeProposalArgs;
use crate::models::*;
use crate::price_math::{get_amm_price, get_human_price};
use crate::vault::InitializeQuestionArgs;

/// Events returned by `/events` when no limit is given
const DEFAULT_EVENT_LIMIT: usize = 100;

// ===== ERRORS =====

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Authorization => StatusCode::FORBIDDEN,
        ErrorCategory::Lifecycle => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl From<FutarchyError> for ApiError {
    fn from(e: FutarchyError) -> Self {
        debug!(code = e.code(), "request rejected: {}", e);
        ApiError {
            status: status_for(e.category()),
            body: ErrorResponse {
                error: e.to_string(),
                code: e.code().to_string(),
                category: e.category(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ===== HEALTH & CLOCK =====

pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let app_state = lock(&state);
    Json(HealthResponse { status: "ok".to_string(), slot: app_state.ledger.slot })
}

pub async fn get_clock(State(state): State<SharedState>) -> Json<ClockResponse> {
    Json(ClockResponse { slot: lock(&state).ledger.slot })
}

/// POST /clock/advance
pub async fn advance_clock(
    State(state): State<SharedState>,
    Json(request): Json<AdvanceClockRequest>,
) -> Json<ClockResponse> {
    let mut app_state = lock(&state);
    let slot = app_state.ledger.advance_slots(request.slots);
    app_state.persist();
    Json(ClockResponse { slot })
}

// ===== TOKENS =====

/// POST /mints
pub async fn create_mint(
    State(state): State<SharedState>,
    Json(request): Json<CreateMintRequest>,
) -> ApiResult<AddressResponse> {
    let address = request
        .address
        .or_else(|| request.label.as_deref().map(Address::from_label))
        .unwrap_or_else(|| Address(rand::random()));

    let mut app_state = lock(&state);
    app_state.ledger.create_mint(request.authority, address, request.decimals)?;
    app_state.persist();
    Ok(Json(AddressResponse { address }))
}

/// POST /mints/:mint/mint_to
pub async fn mint_to(
    State(state): State<SharedState>,
    Path(mint): Path<Address>,
    Json(request): Json<MintToRequest>,
) -> ApiResult<BalanceEntry> {
    let mut app_state = lock(&state);
    app_state.ledger.mint_tokens(request.authority, mint, request.to, request.amount)?;
    app_state.persist();
    let amount = app_state.ledger.balance(&mint, &request.to);
    Ok(Json(BalanceEntry { mint, amount }))
}

/// GET /balances/:owner
pub async fn get_balances(State(state): State<SharedState>, Path(owner): Path<Address>) -> Json<BalancesResponse> {
    let app_state = lock(&state);
    let balances = app_state
        .ledger
        .tokens
        .balances_of(&owner)
        .into_iter()
        .map(|(mint, amount)| BalanceEntry { mint, amount })
        .collect();
    Json(BalancesResponse { owner, balances })
}

// ===== AMMS =====

/// POST /amms
pub async fn create_amm(
    State(state): State<SharedState>,
    Json(request): Json<SignedRequest<CreateAmmArgs>>,
) -> ApiResult<AddressResponse> {
    let mut app_state = lock(&state);
    let address = app_state.ledger.create_amm(request.signer, request.args)?;
    app_state.persist();
    Ok(Json(AddressResponse { address }))
}

/// GET /amms/:amm
pub async fn get_amm(State(state): State<SharedState>, Path(amm): Path<Address>) -> ApiResult<AmmResponse> {
    let app_state = lock(&state);
    let pool = app_state.ledger.amm(&amm)?.clone();
    let spot_price = pool.spot_price();
    let human_spot_price = spot_price.and_then(|p| get_human_price(p, pool.base_decimals, pool.quote_decimals).ok());
    Ok(Json(AmmResponse { address: amm, pool, spot_price, human_spot_price }))
}

/// GET /amms/:amm/twap
pub async fn get_twap(State(state): State<SharedState>, Path(amm): Path<Address>) -> ApiResult<TwapResponse> {
    let app_state = lock(&state);
    let pool = app_state.ledger.amm(&amm)?;
    let twap = app_state.ledger.get_twap(&amm)?;
    let human_twap = get_human_price(twap, pool.base_decimals, pool.quote_decimals).ok();
    Ok(Json(TwapResponse { amm, twap, human_twap }))
}

/// POST /amms/:amm/add_liquidity
pub async fn add_liquidity(
    State(state): State<SharedState>,
    Path(amm): Path<Address>,
    Json(request): Json<SignedRequest<AddLiquidityArgs>>,
) -> ApiResult<AddLiquidityQuote> {
    let mut app_state = lock(&state);
    let quote = app_state.ledger.add_liquidity(request.signer, amm, request.args)?;
    app_state.persist();
    Ok(Json(quote))
}

/// POST /amms/:amm/remove_liquidity
pub async fn remove_liquidity(
    State(state): State<SharedState>,
    Path(amm): Path<Address>,
    Json(request): Json<SignedRequest<RemoveLiquidityArgs>>,
) -> ApiResult<RemoveLiquidityQuote> {
    let mut app_state = lock(&state);
    let quote = app_state.ledger.remove_liquidity(request.signer, amm, request.args)?;
    app_state.persist();
    Ok(Json(quote))
}

/// POST /amms/:amm/swap
pub async fn swap(
    State(state): State<SharedState>,
    Path(amm): Path<Address>,
    Json(request): Json<SignedRequest<SwapArgs>>,
) -> ApiResult<SwapQuote> {
    let mut app_state = lock(&state);
    let quote = app_state.ledger.swap(request.signer, amm, request.args)?;
    app_state.persist();
    Ok(Json(quote))
}

/// POST /amms/:amm/quote
/// Same math as /swap, nothing is written
pub async fn quote_swap(
    State(state): State<SharedState>,
    Path(amm): Path<Address>,
    Json(request): Json<SwapQuoteRequest>,
) -> ApiResult<SwapQuote> {
    let app_state = lock(&state);
    Ok(Json(app_state.ledger.simulate_swap(&amm, request.swap_type, request.input_amount)?))
}

/// POST /amms/:amm/crank
pub async fn crank_twap(
    State(state): State<SharedState>,
    Path(amm): Path<Address>,
    Json(request): Json<SignerRequest>,
) -> ApiResult<CrankResponse> {
    let mut app_state = lock(&state);
    let observation = app_state.ledger.crank_that_twap(request.signer, amm)?;
    app_state.persist();
    Ok(Json(CrankResponse { amm, observation }))
}

// ===== QUESTIONS & VAULTS =====

/// POST /questions
pub async fn create_question(
    State(state): State<SharedState>,
    Json(request): Json<SignedRequest<InitializeQuestionArgs>>,
) -> ApiResult<AddressResponse> {
    let mut app_state = lock(&state);
    let address = app_state.ledger.initialize_question(request.signer, request.args)?;
    app_state.persist();
    Ok(Json(AddressResponse { address }))
}

/// POST /questions/:question/resolve
pub async fn resolve_question(
    State(state): State<SharedState>,
    Path(question): Path<Address>,
    Json(request): Json<ResolveQuestionRequest>,
) -> ApiResult<AddressResponse> {
    let mut app_state = lock(&state);
    app_state
        .ledger
        .resolve_question(request.signer, question, request.payout_numerators)?;
    app_state.persist();
    Ok(Json(AddressResponse { address: question }))
}

/// POST /vaults
pub async fn create_vault(
    State(state): State<SharedState>,
    Json(request): Json<CreateVaultRequest>,
) -> ApiResult<AddressResponse> {
    let mut app_state = lock(&state);
    let address = app_state.ledger.initialize_vault(
        request.payer,
        request.question,
        request.underlying_token_mint,
        request.num_outcomes,
    )?;
    app_state.persist();
    Ok(Json(AddressResponse { address }))
}

/// POST /vaults/:vault/split
pub async fn split_tokens(
    State(state): State<SharedState>,
    Path(vault): Path<Address>,
    Json(request): Json<VaultAmountRequest>,
) -> ApiResult<BalancesResponse> {
    let mut app_state = lock(&state);
    app_state.ledger.split_tokens(request.user, vault, request.amount)?;
    app_state.persist();
    Ok(Json(conditional_balances(&app_state.ledger, &vault, request.user)?))
}

/// POST /vaults/:vault/merge
pub async fn merge_tokens(
    State(state): State<SharedState>,
    Path(vault): Path<Address>,
    Json(request): Json<VaultAmountRequest>,
) -> ApiResult<BalancesResponse> {
    let mut app_state = lock(&state);
    app_state.ledger.merge_tokens(request.user, vault, request.amount)?;
    app_state.persist();
    Ok(Json(conditional_balances(&app_state.ledger, &vault, request.user)?))
}

/// POST /vaults/:vault/redeem
pub async fn redeem_tokens(
    State(state): State<SharedState>,
    Path(vault): Path<Address>,
    Json(request): Json<RedeemRequest>,
) -> ApiResult<RedeemResponse> {
    let mut app_state = lock(&state);
    let redeemed = app_state.ledger.redeem_tokens(request.user, vault)?;
    app_state.persist();
    Ok(Json(RedeemResponse { vault, redeemed }))
}

fn conditional_balances(
    ledger: &crate::ledger::Ledger,
    vault: &Address,
    owner: Address,
) -> Result<BalancesResponse, FutarchyError> {
    let record = ledger.vault(vault)?;
    let balances = record
        .conditional_token_mints
        .iter()
        .map(|mint| BalanceEntry { mint: *mint, amount: ledger.balance(mint, &owner) })
        .collect();
    Ok(BalancesResponse { owner, balances })
}

// ===== DAOS & PROPOSALS =====

/// POST /daos
pub async fn create_dao(
    State(state): State<SharedState>,
    Json(request): Json<SignedRequest<InitializeDaoArgs>>,
) -> ApiResult<DaoResponse> {
    let mut app_state = lock(&state);
    let address = app_state.ledger.initialize_dao(request.signer, request.args)?;
    app_state.persist();
    let dao = app_state.ledger.dao(&address)?.clone();
    Ok(Json(DaoResponse { address, dao }))
}

/// GET /daos/:dao
pub async fn get_dao(State(state): State<SharedState>, Path(address): Path<Address>) -> ApiResult<DaoResponse> {
    let app_state = lock(&state);
    let dao = app_state.ledger.dao(&address)?.clone();
    Ok(Json(DaoResponse { address, dao }))
}

/// POST /proposals
pub async fn create_proposal(
    State(state): State<SharedState>,
    Json(request): Json<CreateProposalRequest>,
) -> ApiResult<ProposalResponse> {
    let mut app_state = lock(&state);
    let proposer = match request.proposer {
        Some(proposer) => proposer,
        None => app_state.ledger.dao(&request.dao)?.treasury,
    };
    let args = InitializeProposalArgs {
        dao: request.dao,
        description_url: request.description_url,
        instruction: request.instruction,
        base_tokens_to_lp: request.base_tokens_to_lp,
        quote_tokens_to_lp: request.quote_tokens_to_lp,
        nonce: request.nonce.unwrap_or_else(rand::random),
    };

    let address = app_state.ledger.initialize_proposal(proposer, args)?;
    app_state.persist();
    let proposal = app_state.ledger.proposal(&address)?.clone();
    Ok(Json(ProposalResponse { address, proposal }))
}

/// GET /proposals/:proposal
pub async fn get_proposal(
    State(state): State<SharedState>,
    Path(address): Path<Address>,
) -> ApiResult<ProposalResponse> {
    let app_state = lock(&state);
    let proposal = app_state.ledger.proposal(&address)?.clone();
    Ok(Json(ProposalResponse { address, proposal }))
}

/// POST /proposals/:proposal/finalize
pub async fn finalize_proposal(
    State(state): State<SharedState>,
    Path(address): Path<Address>,
    Json(request): Json<SignerRequest>,
) -> ApiResult<FinalizeResponse> {
    let mut app_state = lock(&state);
    let outcome = app_state.ledger.finalize_proposal(request.signer, address)?;
    app_state.persist();
    let proposal = app_state.ledger.proposal(&address)?;
    Ok(Json(FinalizeResponse {
        proposal: address,
        state: outcome,
        pass_twap: proposal.pass_twap,
        fail_twap: proposal.fail_twap,
    }))
}

/// POST /proposals/:proposal/execute
pub async fn execute_proposal(
    State(state): State<SharedState>,
    Path(address): Path<Address>,
    Json(request): Json<SignerRequest>,
) -> ApiResult<ProposalResponse> {
    let mut app_state = lock(&state);
    app_state.ledger.execute_proposal(request.signer, address)?;
    app_state.persist();
    let proposal = app_state.ledger.proposal(&address)?.clone();
    Ok(Json(ProposalResponse { address, proposal }))
}

// ===== PRICES & EVENTS =====

/// POST /price/amm
pub async fn to_amm_price(Json(request): Json<AmmPriceRequest>) -> ApiResult<PriceResponse> {
    let amm_price = get_amm_price(request.human_price, request.base_decimals, request.quote_decimals)
        .map_err(FutarchyError::from)?;
    Ok(Json(PriceResponse { amm_price, human_price: request.human_price }))
}

/// POST /price/human
pub async fn to_human_price(Json(request): Json<HumanPriceRequest>) -> ApiResult<PriceResponse> {
    let human_price = get_human_price(request.amm_price, request.base_decimals, request.quote_decimals)
        .map_err(FutarchyError::from)?;
    Ok(Json(PriceResponse { amm_price: request.amm_price, human_price }))
}

/// GET /events?limit=N, newest first
pub async fn get_events(
    State(state): State<SharedState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<LedgerEvent>> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    Json(lock(&state).ledger.recent_events(limit))
}
