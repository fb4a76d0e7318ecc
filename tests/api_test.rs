//! HTTP API tests. Each test drives a fresh in-memory router directly,
//! no listening socket needed.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use futarchy_ledger::app_state::AppState;
use futarchy_ledger::config::Config;
use futarchy_ledger::routes::build_router;
use futarchy_ledger::{Address, ProposalInstruction};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn app() -> Router {
    build_router(AppState::shared(Config::in_memory()))
}

fn hex(label: &str) -> String {
    Address::from_label(label).to_hex()
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::POST, uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::GET, uri, None).await
}

/// META (9 decimals) and USDC (6 decimals) with alice holding 20 billion units of each
async fn setup_mints(app: &Router) -> (String, String) {
    let alice = hex("alice");
    let mut mints = Vec::new();
    for (label, decimals) in [("META", 9), ("USDC", 6)] {
        let (status, body) =
            post(app, "/mints", json!({ "authority": alice, "decimals": decimals, "label": label })).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let mint = body["address"].as_str().unwrap().to_string();
        assert_eq!(mint, hex(label));

        let (status, body) = post(
            app,
            &format!("/mints/{}/mint_to", mint),
            json!({ "authority": alice, "to": alice, "amount": 20_000_000_000u64 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        mints.push(mint);
    }
    (mints[0].clone(), mints[1].clone())
}

// ============================================================================
// HEALTH & CLOCK
// ============================================================================

#[tokio::test]
async fn test_health_and_clock() {
    let app = app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["slot"], 0);

    let (status, body) = post(&app, "/clock/advance", json!({ "slots": 25 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"], 25);

    let (_, body) = get(&app, "/clock").await;
    assert_eq!(body["slot"], 25);
}

// ============================================================================
// AMM ENDPOINTS
// ============================================================================

#[tokio::test]
async fn test_amm_swap_and_twap_flow() {
    let app = app();
    let alice = hex("alice");
    let (meta, usdc) = setup_mints(&app).await;

    let (status, body) = post(
        &app,
        "/amms",
        json!({
            "signer": alice,
            "args": {
                "base_mint": meta,
                "quote_mint": usdc,
                "twap_initial_observation": 1_000_000_000_000u64,
                "twap_max_observation_change_per_update": 20_000_000_000u64,
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let amm = body["address"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        &format!("/amms/{}/add_liquidity", amm),
        json!({
            "signer": alice,
            "args": { "max_quote_amount": 10_000_000_000u64, "max_base_amount": 10_000_000_000u64, "min_lp_tokens": 0 }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = get(&app, &format!("/amms/{}", amm)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pool"]["base_decimals"], 9);
    assert_eq!(body["pool"]["quote_decimals"], 6);
    assert_eq!(body["spot_price"], 1_000_000_000_000u64);

    let (status, body) = post(
        &app,
        &format!("/amms/{}/quote", amm),
        json!({ "swap_type": "buy", "input_amount": 100_000_000u64 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["output_amount"], 98_029_507u64);

    // Asking for one unit more than the quote trips the slippage guard
    let (status, body) = post(
        &app,
        &format!("/amms/{}/swap", amm),
        json!({
            "signer": alice,
            "args": { "swap_type": "buy", "input_amount": 100_000_000u64, "output_amount_min": 98_029_508u64 }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SwapSlippageExceeded");
    assert_eq!(body["category"], "guard_rail");

    let (status, body) = get(&app, &format!("/amms/{}/twap", amm)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NoSlotsPassed");

    post(&app, "/clock/advance", json!({ "slots": 10 })).await;
    let (status, body) = post(
        &app,
        &format!("/amms/{}/swap", amm),
        json!({
            "signer": alice,
            "args": { "swap_type": "buy", "input_amount": 100_000_000u64, "output_amount_min": 98_029_507u64 }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["output_amount"], 98_029_507u64);

    let (status, body) = get(&app, &format!("/amms/{}/twap", amm)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    // Ten slots at the post-trade observation, inside the 2e10 step bound
    assert_eq!(body["twap"], 1_019_998_999_910u64);

    // Crank in the same slot is a no-op
    let (status, body) = post(&app, &format!("/amms/{}/crank", amm), json!({ "signer": alice })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["observation"], Value::Null);
}

#[tokio::test]
async fn test_unknown_amm_is_not_found() {
    let app = app();
    let (status, body) = get(&app, &format!("/amms/{}", hex("nowhere"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["category"], "not_found");
}

// ============================================================================
// VAULT ENDPOINTS
// ============================================================================

#[tokio::test]
async fn test_question_vault_round_trip() {
    let app = app();
    let alice = hex("alice");
    let oracle = hex("oracle");
    let (_, usdc) = setup_mints(&app).await;

    let (status, body) = post(
        &app,
        "/questions",
        json!({
            "signer": alice,
            "args": { "question_id": "11".repeat(32), "oracle": oracle, "num_outcomes": 2 }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let question = body["address"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/vaults",
        json!({ "payer": alice, "question": question, "underlying_token_mint": usdc, "num_outcomes": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let vault = body["address"].as_str().unwrap().to_string();

    let (status, body) =
        post(&app, &format!("/vaults/{}/split", vault), json!({ "user": alice, "amount": 100 })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let amounts: Vec<u64> = body["balances"].as_array().unwrap().iter().map(|b| b["amount"].as_u64().unwrap()).collect();
    assert_eq!(amounts, vec![100, 100]);

    let (status, body) =
        post(&app, &format!("/vaults/{}/redeem", vault), json!({ "user": alice })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CantRedeemConditionalTokens");

    let (status, body) = post(
        &app,
        &format!("/questions/{}/resolve", question),
        json!({ "signer": alice, "payout_numerators": [1, 0] }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "UnauthorizedOracle");

    let (status, _) = post(
        &app,
        &format!("/questions/{}/resolve", question),
        json!({ "signer": oracle, "payout_numerators": [1, 0] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        post(&app, &format!("/vaults/{}/redeem", vault), json!({ "user": alice })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["redeemed"], 100);
}

// ============================================================================
// DAO & PROPOSAL ENDPOINTS
// ============================================================================

#[tokio::test]
async fn test_proposal_lifecycle_over_http() {
    let app = app();
    let alice = hex("alice");
    let (meta, usdc) = setup_mints(&app).await;

    let (status, body) = post(
        &app,
        "/daos",
        json!({
            "signer": alice,
            "args": {
                "token_mint": meta,
                "usdc_mint": usdc,
                "twap_initial_observation": 500_000_000_000u64,
                "min_quote_futarchic_liquidity": 1,
                "min_base_futarchic_liquidity": 1,
                "slots_per_proposal": 100,
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let dao = body["address"].as_str().unwrap().to_string();
    assert_eq!(body["dao"]["pass_threshold_bps"], 300);
    assert_eq!(body["dao"]["proposal_count"], 0);

    let instruction = ProposalInstruction::token_transfer(
        Address::from_label("USDC"),
        Address::from_label("grantee"),
        250_000,
    )
    .unwrap();
    let (status, body) = post(
        &app,
        "/proposals",
        json!({
            "proposer": alice,
            "dao": dao,
            "description_url": "https://example.com/proposals/grant",
            "instruction": serde_json::to_value(&instruction).unwrap(),
            "base_tokens_to_lp": 1_000_000_000u64,
            "quote_tokens_to_lp": 500_000_000u64,
            "nonce": 3,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let proposal = body["address"].as_str().unwrap().to_string();
    assert_eq!(body["proposal"]["state"], "pending");
    assert_eq!(body["proposal"]["number"], 0);

    let (status, body) =
        post(&app, &format!("/proposals/{}/finalize", proposal), json!({ "signer": alice })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "MarketsTooYoung");

    post(&app, "/clock/advance", json!({ "slots": 100 })).await;
    let (status, body) =
        post(&app, &format!("/proposals/{}/finalize", proposal), json!({ "signer": alice })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["state"], "failed");
    assert_eq!(body["pass_twap"], 500_000_000_000u64);

    let (status, body) =
        post(&app, &format!("/proposals/{}/execute", proposal), json!({ "signer": alice })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ProposalNotPassed");

    let (status, body) = get(&app, &format!("/proposals/{}", proposal)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proposal"]["state"], "failed");

    let (status, body) = get(&app, "/events?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

// ============================================================================
// PRICE HELPERS
// ============================================================================

#[tokio::test]
async fn test_price_conversion_endpoints() {
    let app = app();

    let (status, body) = post(
        &app,
        "/price/amm",
        json!({ "human_price": "500", "base_decimals": 9, "quote_decimals": 6 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["amm_price"], 500_000_000_000u64);

    let (status, body) = post(
        &app,
        "/price/human",
        json!({ "amm_price": 500_000_000_000u64, "base_decimals": 9, "quote_decimals": 6 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["human_price"], "500");
}
