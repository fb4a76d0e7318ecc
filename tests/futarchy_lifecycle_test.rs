//! End-to-end ledger tests: DAO setup, proposal markets, trading,
//! finalization and redemption, driven only through the public API.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_test::{assert_err, assert_ok};

use futarchy_ledger::amm::{AddLiquidityArgs, CreateAmmArgs, SwapArgs, SwapType};
use futarchy_ledger::autocrat::{FAIL_INDEX, PASS_INDEX};
use futarchy_ledger::{
    Address, AutocratError, FutarchyError, InitializeDaoArgs, InitializeProposalArgs,
    InitializeQuestionArgs, Ledger, ProposalInstruction, ProposalState, VaultError,
};

// ============================================================================
// TEST ACCOUNTS
// ============================================================================

const ALICE: &str = "alice";
const BOB: &str = "bob";

const META_TO_LP: u64 = 1_000_000_000;
const USDC_TO_LP: u64 = 500_000_000;
const INITIAL_PRICE: u128 = 500_000_000_000;

struct World {
    ledger: Ledger,
    alice: Address,
    bob: Address,
    meta: Address,
    usdc: Address,
    dao: Address,
}

fn world() -> World {
    let mut ledger = Ledger::new();
    let alice = Address::from_label(ALICE);
    let bob = Address::from_label(BOB);
    let meta = Address::from_label("META");
    let usdc = Address::from_label("USDC");

    assert_ok!(ledger.create_mint(alice, meta, 9));
    assert_ok!(ledger.create_mint(alice, usdc, 6));
    assert_ok!(ledger.mint_tokens(alice, meta, alice, 10_000_000_000));
    assert_ok!(ledger.mint_tokens(alice, usdc, alice, 10_000_000_000));
    assert_ok!(ledger.mint_tokens(alice, usdc, bob, 1_000_000_000));

    let dao = assert_ok!(ledger.initialize_dao(
        alice,
        InitializeDaoArgs {
            token_mint: meta,
            usdc_mint: usdc,
            twap_initial_observation: INITIAL_PRICE,
            twap_max_observation_change_per_update: None,
            twap_start_delay_slots: None,
            min_quote_futarchic_liquidity: 1,
            min_base_futarchic_liquidity: 1,
            pass_threshold_bps: None,
            slots_per_proposal: Some(100),
            max_amm_age_slots: None,
            nonce: 0,
        },
    ));

    World { ledger, alice, bob, meta, usdc, dao }
}

fn propose(w: &mut World, nonce: u64) -> Address {
    let treasury = assert_ok!(w.ledger.dao(&w.dao)).treasury;
    assert_ok!(w.ledger.mint_tokens(w.alice, w.usdc, treasury, 1_000_000));
    let instruction = assert_ok!(ProposalInstruction::token_transfer(
        w.usdc,
        Address::from_label("grantee"),
        250_000
    ));
    assert_ok!(w.ledger.initialize_proposal(
        w.alice,
        InitializeProposalArgs {
            dao: w.dao,
            description_url: format!("https://example.com/proposals/{}", nonce),
            instruction,
            base_tokens_to_lp: META_TO_LP,
            quote_tokens_to_lp: USDC_TO_LP,
            nonce,
        },
    ))
}

// ============================================================================
// PROPOSAL LIFECYCLE
// ============================================================================

#[test]
fn test_fail_market_bid_up_rejects_proposal() {
    let mut w = world();
    let proposal = propose(&mut w, 1);
    let record = assert_ok!(w.ledger.proposal(&proposal)).clone();
    let bob = w.bob;

    // Bob backs the fail side with all his USDC
    assert_ok!(w.ledger.split_tokens(bob, record.quote_vault, 1_000_000_000));
    w.ledger.advance_slots(1);
    let buy = SwapArgs { swap_type: SwapType::Buy, input_amount: 100_000_000, output_amount_min: 1 };
    let quote = assert_ok!(w.ledger.swap(bob, record.fail_amm, buy));

    let base_vault = assert_ok!(w.ledger.vault(&record.base_vault)).clone();
    let fail_meta = base_vault.conditional_token_mints[FAIL_INDEX];
    assert_eq!(w.ledger.balance(&fail_meta, &bob), quote.output_amount);

    w.ledger.advance_slots(99);
    let state = assert_ok!(w.ledger.finalize_proposal(bob, proposal));
    assert_eq!(state, ProposalState::Failed);

    let record = assert_ok!(w.ledger.proposal(&proposal)).clone();
    assert_eq!(record.pass_twap, Some(INITIAL_PRICE));
    assert_eq!(record.fail_twap, Some(519_900_000_000));

    // Proposer got the locked LP back on both markets
    for amm in [record.pass_amm, record.fail_amm] {
        let lp_mint = assert_ok!(w.ledger.amm(&amm)).lp_mint;
        assert_eq!(w.ledger.balance(&lp_mint, &w.alice), USDC_TO_LP);
        assert_eq!(w.ledger.balance(&lp_mint, &proposal), 0);
    }

    // Fail-side tokens redeem one to one, pass-side ones are worthless
    assert_eq!(assert_ok!(w.ledger.redeem_tokens(bob, record.quote_vault)), 900_000_000);
    assert_eq!(assert_ok!(w.ledger.redeem_tokens(bob, record.base_vault)), quote.output_amount);
    assert_eq!(w.ledger.balance(&w.meta, &bob), quote.output_amount);
    assert_eq!(w.ledger.balance(&base_vault.conditional_token_mints[PASS_INDEX], &bob), 0);

    let err = assert_err!(w.ledger.execute_proposal(bob, proposal));
    assert_eq!(err, FutarchyError::Autocrat(AutocratError::ProposalNotPassed));
    assert_eq!(w.ledger.balance(&w.usdc, &Address::from_label("grantee")), 0);
}

#[test]
fn test_proposals_are_numbered_in_order() {
    let mut w = world();
    let first = propose(&mut w, 1);
    let second = propose(&mut w, 2);

    assert_eq!(assert_ok!(w.ledger.proposal(&first)).number, 0);
    assert_eq!(assert_ok!(w.ledger.proposal(&second)).number, 1);
    assert_eq!(assert_ok!(w.ledger.dao(&w.dao)).proposal_count, 2);

    // Same proposer and nonce lands on the same address
    let treasury = assert_ok!(w.ledger.dao(&w.dao)).treasury;
    let instruction = assert_ok!(ProposalInstruction::token_transfer(w.usdc, treasury, 1));
    let err = assert_err!(w.ledger.initialize_proposal(
        w.alice,
        InitializeProposalArgs {
            dao: w.dao,
            description_url: "dup".to_string(),
            instruction,
            base_tokens_to_lp: META_TO_LP,
            quote_tokens_to_lp: USDC_TO_LP,
            nonce: 1,
        },
    ));
    assert_eq!(err.code(), "AlreadyExists");
    assert_eq!(assert_ok!(w.ledger.dao(&w.dao)).proposal_count, 2);
}

#[test]
fn test_finalize_too_early_keeps_proposal_pending() {
    let mut w = world();
    let proposal = propose(&mut w, 7);

    w.ledger.advance_slots(99);
    let err = assert_err!(w.ledger.finalize_proposal(w.alice, proposal));
    assert_eq!(err, FutarchyError::Autocrat(AutocratError::MarketsTooYoung));
    assert_eq!(assert_ok!(w.ledger.proposal(&proposal)).state, ProposalState::Pending);

    w.ledger.advance_slots(1);
    assert_eq!(assert_ok!(w.ledger.finalize_proposal(w.alice, proposal)), ProposalState::Failed);
}

// ============================================================================
// STANDALONE QUESTIONS & VAULTS
// ============================================================================

#[test]
fn test_three_outcome_vault_partial_payout() {
    let mut w = world();
    let oracle = Address::from_label("oracle");
    let question = assert_ok!(w.ledger.initialize_question(
        w.alice,
        InitializeQuestionArgs { question_id: [7u8; 32], oracle, num_outcomes: 3 },
    ));
    let vault = assert_ok!(w.ledger.initialize_vault(w.alice, question, w.usdc, 3));

    assert_ok!(w.ledger.split_tokens(w.bob, vault, 1_000));
    assert_ok!(w.ledger.merge_tokens(w.bob, vault, 400));
    let record = assert_ok!(w.ledger.vault(&vault)).clone();
    assert_eq!(w.ledger.conditional_balances(&record, &w.bob), vec![600, 600, 600]);

    let err = assert_err!(w.ledger.redeem_tokens(w.bob, vault));
    assert_eq!(err, FutarchyError::Vault(VaultError::CantRedeemConditionalTokens));

    let err = assert_err!(w.ledger.resolve_question(w.bob, question, vec![1, 0, 1]));
    assert_eq!(err, FutarchyError::Vault(VaultError::UnauthorizedOracle));
    assert_ok!(w.ledger.resolve_question(oracle, question, vec![1, 0, 1]));

    assert_eq!(assert_ok!(w.ledger.redeem_tokens(w.bob, vault)), 600);
    assert_eq!(w.ledger.conditional_balances(&record, &w.bob), vec![0, 0, 0]);
    assert_eq!(w.ledger.balance(&w.usdc, &w.bob), 1_000_000_000 - 400);

    let err = assert_err!(w.ledger.resolve_question(oracle, question, vec![0, 1, 0]));
    assert_eq!(err, FutarchyError::Vault(VaultError::QuestionAlreadyResolved));
    assert_eq!(assert_ok!(w.ledger.question(&question)).payout_numerators, vec![1, 0, 1]);
}

// ============================================================================
// PROPERTY CHECKS
// ============================================================================

#[test]
fn test_split_then_merge_restores_balances() {
    let mut w = world();
    let question = assert_ok!(w.ledger.initialize_question(
        w.alice,
        InitializeQuestionArgs { question_id: [9u8; 32], oracle: w.alice, num_outcomes: 2 },
    ));
    let vault = assert_ok!(w.ledger.initialize_vault(w.alice, question, w.usdc, 2));
    let record = assert_ok!(w.ledger.vault(&vault)).clone();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50 {
        let before = w.ledger.balance(&w.usdc, &w.bob);
        let amount = rng.gen_range(1..=before.min(50_000_000));
        assert_ok!(w.ledger.split_tokens(w.bob, vault, amount));
        assert_eq!(w.ledger.conditional_balances(&record, &w.bob), vec![amount, amount]);
        assert_eq!(w.ledger.balance(&w.usdc, &record.underlying_token_account), amount);

        assert_ok!(w.ledger.merge_tokens(w.bob, vault, amount));
        assert_eq!(w.ledger.balance(&w.usdc, &w.bob), before);
        assert_eq!(w.ledger.conditional_balances(&record, &w.bob), vec![0, 0]);
    }
}

#[test]
fn test_random_swaps_never_shrink_k() {
    let mut w = world();
    let amm = assert_ok!(w.ledger.create_amm(
        w.alice,
        CreateAmmArgs {
            base_mint: w.meta,
            quote_mint: w.usdc,
            base_decimals: 0,
            quote_decimals: 0,
            twap_initial_observation: INITIAL_PRICE,
            twap_max_observation_change_per_update: INITIAL_PRICE / 50,
            twap_start_delay_slots: 0,
            swap_fee_bps: 100,
            proposal: None,
        },
    ));
    assert_ok!(w.ledger.add_liquidity(
        w.alice,
        amm,
        AddLiquidityArgs { max_quote_amount: 2_000_000_000, max_base_amount: 4_000_000_000, min_lp_tokens: 0 },
    ));

    let mut rng = StdRng::seed_from_u64(7);
    let mut k = assert_ok!(w.ledger.amm(&amm)).k();
    let mut last_observation = INITIAL_PRICE;

    for _ in 0..200 {
        w.ledger.advance_slots(rng.gen_range(0..3));
        let swap_type = if rng.gen_bool(0.5) { SwapType::Buy } else { SwapType::Sell };
        let input_amount = rng.gen_range(1..=50_000_000);
        let args = SwapArgs { swap_type, input_amount, output_amount_min: 0 };

        assert_ok!(w.ledger.swap(w.alice, amm, args));

        let pool = assert_ok!(w.ledger.amm(&amm));
        assert!(pool.k() >= k, "k shrank from {} to {}", k, pool.k());
        let step = pool.oracle.last_observation.abs_diff(last_observation);
        assert!(step <= pool.oracle.max_observation_change_per_update);
        k = pool.k();
        last_observation = pool.oracle.last_observation;
    }
}
