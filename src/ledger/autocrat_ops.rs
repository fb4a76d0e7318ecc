// ============================================================================
// Autocrat Operations
// ============================================================================
//
// DAO setup and the proposal lifecycle:
//
//   initialize_proposal  question + 2 vaults + 2 splits + 2 AMMs + LP, then enqueue
//   enqueue_proposal     validate markets, lock LP, proposal goes Pending
//   finalize_proposal    crank, compare TWAPs, resolve the question, unlock LP
//   execute_proposal     run the stored instruction as the treasury
//
// Every composite step calls the `_inner` operations so the whole
// composition commits or aborts as one.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;

use super::Ledger;
use crate::address::Address;
use crate::amm::{AddLiquidityArgs, AmmPool, CreateAmmArgs, DEFAULT_SWAP_FEE_BPS};
use crate::autocrat::{
    decide, AutocratInstruction, Dao, InitializeDaoArgs, Proposal, ProposalInstruction,
    ProposalState, TokenInstruction, TreasuryCall, UpdateDaoParams, FAIL_INDEX, PASS_INDEX,
};
use crate::errors::{AutocratError, FutarchyError, Result, VaultError};
use crate::events::LedgerEvent;
use crate::vault::InitializeQuestionArgs;

/// Every proposal question is pass/fail
const PROPOSAL_OUTCOMES: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeProposalArgs {
    pub dao: Address,
    pub description_url: String,
    pub instruction: ProposalInstruction,
    /// DAO tokens split into each market's base side
    pub base_tokens_to_lp: u64,
    /// Quote tokens split into each market's quote side
    pub quote_tokens_to_lp: u64,
    #[serde(default)]
    pub nonce: u64,
}

/// Enqueue a proposal over markets that were prepared separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueProposalArgs {
    pub dao: Address,
    pub description_url: String,
    pub instruction: ProposalInstruction,
    pub question: Address,
    pub base_vault: Address,
    pub quote_vault: Address,
    pub pass_amm: Address,
    pub fail_amm: Address,
    pub pass_lp_tokens_to_lock: u64,
    pub fail_lp_tokens_to_lock: u64,
    #[serde(default)]
    pub nonce: u64,
}

impl Ledger {
    // ========================================================================
    // DAO
    // ========================================================================

    pub fn initialize_dao(&mut self, payer: Address, args: InitializeDaoArgs) -> Result<Address> {
        self.atomically(|ledger| {
            ledger.tokens.mint(&args.token_mint)?;
            ledger.tokens.mint(&args.usdc_mint)?;

            let address = Dao::derive_address(&args.token_mint, &args.usdc_mint, args.nonce);
            if ledger.daos.contains_key(&address) {
                return Err(FutarchyError::already_exists("dao", address));
            }
            let dao = Dao::new(&address, &args)?;
            let treasury = dao.treasury;
            ledger.daos.insert(address, dao);

            let common = ledger.common(payer);
            ledger.emit(LedgerEvent::InitializeDao { common, dao: address, treasury });
            Ok(address)
        })
    }

    /// Change DAO policy. Only the DAO's treasury may sign this, which in
    /// practice means an executed proposal.
    pub fn update_dao(&mut self, signer: Address, dao: Address, params: UpdateDaoParams) -> Result<()> {
        self.atomically(|ledger| ledger.update_dao_inner(signer, dao, params))
    }

    fn update_dao_inner(&mut self, signer: Address, dao: Address, params: UpdateDaoParams) -> Result<()> {
        let record = self
            .daos
            .get_mut(&dao)
            .ok_or_else(|| FutarchyError::not_found("dao", dao))?;
        if record.treasury != signer {
            return Err(AutocratError::UnauthorizedTreasury.into());
        }
        record.update(&params)?;

        let common = self.common(signer);
        self.emit(LedgerEvent::UpdateDao { common, dao });
        Ok(())
    }

    // ========================================================================
    // PROPOSAL CREATION
    // ========================================================================

    /// Build both conditional markets from the proposer's tokens and enqueue
    /// the proposal, as one operation.
    ///
    /// # Arguments
    /// * `proposer` - Funds the markets and receives the LP back at finalization
    /// * `args` - DAO, instruction and liquidity to seed each market with
    ///
    /// # Returns
    /// * Address of the new proposal
    pub fn initialize_proposal(&mut self, proposer: Address, args: InitializeProposalArgs) -> Result<Address> {
        self.atomically(|ledger| ledger.initialize_proposal_inner(proposer, args))
    }

    fn initialize_proposal_inner(&mut self, proposer: Address, args: InitializeProposalArgs) -> Result<Address> {
        let dao = self.dao(&args.dao)?.clone();
        let proposal = Proposal::derive_address(&proposer, args.nonce);

        let question = self.initialize_question_inner(
            proposer,
            InitializeQuestionArgs {
                question_id: Proposal::question_id(&proposal),
                oracle: proposal,
                num_outcomes: PROPOSAL_OUTCOMES,
            },
        )?;
        let base_vault = self.initialize_vault_inner(proposer, question, dao.token_mint, PROPOSAL_OUTCOMES)?;
        let quote_vault = self.initialize_vault_inner(proposer, question, dao.usdc_mint, PROPOSAL_OUTCOMES)?;

        self.split_tokens_inner(proposer, base_vault, args.base_tokens_to_lp)?;
        self.split_tokens_inner(proposer, quote_vault, args.quote_tokens_to_lp)?;

        let base_mints = self.vault(&base_vault)?.conditional_token_mints.clone();
        let quote_mints = self.vault(&quote_vault)?.conditional_token_mints.clone();

        let mut amms = [Address::default(); 2];
        let mut lp_tokens = [0u64; 2];
        for index in [PASS_INDEX, FAIL_INDEX] {
            let amm = self.create_amm_inner(
                proposer,
                CreateAmmArgs {
                    base_mint: base_mints[index],
                    quote_mint: quote_mints[index],
                    base_decimals: 0,
                    quote_decimals: 0,
                    twap_initial_observation: dao.twap_initial_observation,
                    twap_max_observation_change_per_update: dao.twap_max_observation_change_per_update,
                    twap_start_delay_slots: dao.twap_start_delay_slots,
                    swap_fee_bps: DEFAULT_SWAP_FEE_BPS,
                    proposal: Some(proposal),
                },
            )?;
            let deposit = self.add_liquidity_inner(
                proposer,
                amm,
                AddLiquidityArgs {
                    max_quote_amount: args.quote_tokens_to_lp,
                    max_base_amount: args.base_tokens_to_lp,
                    min_lp_tokens: 0,
                },
            )?;
            amms[index] = amm;
            lp_tokens[index] = deposit.lp_tokens;
        }

        self.enqueue_proposal_inner(
            proposer,
            EnqueueProposalArgs {
                dao: args.dao,
                description_url: args.description_url,
                instruction: args.instruction,
                question,
                base_vault,
                quote_vault,
                pass_amm: amms[PASS_INDEX],
                fail_amm: amms[FAIL_INDEX],
                pass_lp_tokens_to_lock: lp_tokens[PASS_INDEX],
                fail_lp_tokens_to_lock: lp_tokens[FAIL_INDEX],
                nonce: args.nonce,
            },
        )
    }

    pub fn enqueue_proposal(&mut self, proposer: Address, args: EnqueueProposalArgs) -> Result<Address> {
        self.atomically(|ledger| ledger.enqueue_proposal_inner(proposer, args))
    }

    fn enqueue_proposal_inner(&mut self, proposer: Address, args: EnqueueProposalArgs) -> Result<Address> {
        let dao = self.dao(&args.dao)?.clone();
        let proposal = Proposal::derive_address(&proposer, args.nonce);
        if self.proposals.contains_key(&proposal) {
            return Err(FutarchyError::already_exists("proposal", proposal));
        }

        let base_vault = self.vault(&args.base_vault)?;
        let quote_vault = self.vault(&args.quote_vault)?;
        if base_vault.underlying_token_mint != dao.token_mint || quote_vault.underlying_token_mint != dao.usdc_mint {
            return Err(AutocratError::InvalidVaultUnderlying.into());
        }
        if base_vault.question != args.question || quote_vault.question != args.question {
            return Err(AutocratError::InvalidQuestion.into());
        }

        let question = self.question(&args.question)?;
        if question.oracle != proposal
            || question.num_outcomes() != PROPOSAL_OUTCOMES as usize
            || question.is_resolved()
        {
            return Err(AutocratError::InvalidQuestion.into());
        }

        let markets = [
            (args.pass_amm, PASS_INDEX, args.pass_lp_tokens_to_lock),
            (args.fail_amm, FAIL_INDEX, args.fail_lp_tokens_to_lock),
        ];
        for (amm, index, lp_to_lock) in markets {
            let pool = self.amm(&amm)?;
            if pool.base_mint != base_vault.conditional_token_mints[index]
                || pool.quote_mint != quote_vault.conditional_token_mints[index]
            {
                return Err(AutocratError::InvalidMarket.into());
            }
            check_market_policy(&dao, pool, self.slot)?;

            if self.balance(&pool.lp_mint, &proposer) < lp_to_lock {
                return Err(AutocratError::InsufficientLpTokenBalance.into());
            }
            let (base_locked, quote_locked) = pool.reserves_for_lp(lp_to_lock);
            if base_locked < dao.min_base_futarchic_liquidity || quote_locked < dao.min_quote_futarchic_liquidity {
                return Err(AutocratError::InsufficientLpTokenLock.into());
            }
        }

        for (amm, _, lp_to_lock) in markets {
            let lp_mint = self.amm(&amm)?.lp_mint;
            self.tokens.transfer(&lp_mint, &proposer, &proposal, lp_to_lock)?;
        }

        let record = self
            .daos
            .get_mut(&args.dao)
            .ok_or_else(|| FutarchyError::not_found("dao", args.dao))?;
        let number = record.proposal_count;
        record.proposal_count += 1;

        self.proposals.insert(
            proposal,
            Proposal {
                number,
                proposer,
                description_url: args.description_url,
                slot_enqueued: self.slot,
                state: ProposalState::Pending,
                instruction: args.instruction,
                question: args.question,
                pass_amm: args.pass_amm,
                fail_amm: args.fail_amm,
                base_vault: args.base_vault,
                quote_vault: args.quote_vault,
                dao: args.dao,
                pass_lp_tokens_locked: args.pass_lp_tokens_to_lock,
                fail_lp_tokens_locked: args.fail_lp_tokens_to_lock,
                nonce: args.nonce,
                pass_twap: None,
                fail_twap: None,
            },
        );

        let common = self.common(proposer);
        self.emit(LedgerEvent::InitializeProposal {
            common,
            proposal,
            dao: args.dao,
            number,
            pass_amm: args.pass_amm,
            fail_amm: args.fail_amm,
        });
        Ok(proposal)
    }

    // ========================================================================
    // FINALIZE & EXECUTE
    // ========================================================================

    /// Decide a pending proposal from its market TWAPs.
    ///
    /// Both oracles are cranked first, so the decision covers every slot up
    /// to now even if nobody traded recently.
    pub fn finalize_proposal(&mut self, cranker: Address, proposal: Address) -> Result<ProposalState> {
        self.atomically(|ledger| ledger.finalize_proposal_inner(cranker, proposal))
    }

    fn finalize_proposal_inner(&mut self, cranker: Address, proposal: Address) -> Result<ProposalState> {
        let record = self.proposal(&proposal)?.clone();
        if !record.state.is_pending() {
            return Err(AutocratError::ProposalAlreadyFinalized.into());
        }
        let dao = self.dao(&record.dao)?.clone();

        for amm in [record.pass_amm, record.fail_amm] {
            let pool = self.amm(&amm)?;
            if record.slot_enqueued.saturating_sub(pool.created_at_slot) > dao.max_amm_age_slots {
                return Err(AutocratError::AmmTooOld.into());
            }
        }

        self.crank_that_twap_inner(cranker, record.pass_amm)?;
        self.crank_that_twap_inner(cranker, record.fail_amm)?;

        let finalization_slot = record.finalization_slot(dao.slots_per_proposal);
        let pass_pool = self.amm(&record.pass_amm)?;
        let fail_pool = self.amm(&record.fail_amm)?;
        if self.slot < finalization_slot
            || pass_pool.oracle.last_updated_slot < finalization_slot
            || fail_pool.oracle.last_updated_slot < finalization_slot
        {
            return Err(AutocratError::MarketsTooYoung.into());
        }

        let pass_twap = pass_pool.get_twap()?;
        let fail_twap = fail_pool.get_twap()?;
        let (pass_lp_mint, fail_lp_mint) = (pass_pool.lp_mint, fail_pool.lp_mint);

        let state = decide(pass_twap, fail_twap, dao.pass_threshold_bps);
        let numerators = state.payout_numerators().ok_or(VaultError::AssertFailed)?;
        self.resolve_question_inner(proposal, record.question, numerators.to_vec())?;

        self.tokens
            .transfer(&pass_lp_mint, &proposal, &record.proposer, record.pass_lp_tokens_locked)?;
        self.tokens
            .transfer(&fail_lp_mint, &proposal, &record.proposer, record.fail_lp_tokens_locked)?;

        if let Some(stored) = self.proposals.get_mut(&proposal) {
            stored.state = state;
            stored.pass_twap = Some(pass_twap);
            stored.fail_twap = Some(fail_twap);
        }

        info!(
            proposal = %proposal,
            %pass_twap,
            %fail_twap,
            threshold_bps = dao.pass_threshold_bps,
            "proposal decided"
        );
        let common = self.common(cranker);
        self.emit(LedgerEvent::FinalizeProposal { common, proposal, pass_twap, fail_twap, state });
        Ok(state)
    }

    /// Run a passed proposal's instruction with the treasury as signer
    pub fn execute_proposal(&mut self, executor: Address, proposal: Address) -> Result<()> {
        self.atomically(|ledger| {
            let record = ledger.proposal(&proposal)?.clone();
            if record.state != ProposalState::Passed {
                return Err(AutocratError::ProposalNotPassed.into());
            }
            let treasury = ledger.dao(&record.dao)?.treasury;
            ledger.process_instruction(treasury, &record.instruction)?;

            if let Some(stored) = ledger.proposals.get_mut(&proposal) {
                stored.state = ProposalState::Executed;
            }
            let common = ledger.common(executor);
            ledger.emit(LedgerEvent::ExecuteProposal { common, proposal });
            Ok(())
        })
    }

    fn process_instruction(&mut self, signer: Address, instruction: &ProposalInstruction) -> Result<()> {
        match instruction.decode()? {
            TreasuryCall::Token(TokenInstruction::Transfer { mint, to, amount }) => {
                self.tokens.transfer(&mint, &signer, &to, amount)
            }
            TreasuryCall::Autocrat { dao, instruction: AutocratInstruction::UpdateDao(params) } => {
                self.update_dao_inner(signer, dao, params)
            }
        }
    }
}

/// A proposal market must be fresh and carry the DAO's oracle policy
fn check_market_policy(dao: &Dao, pool: &AmmPool, current_slot: u64) -> Result<(), AutocratError> {
    if current_slot.saturating_sub(pool.created_at_slot) > dao.max_amm_age_slots {
        return Err(AutocratError::AmmTooOld);
    }
    if pool.oracle.initial_observation != dao.twap_initial_observation {
        return Err(AutocratError::InvalidInitialObservation);
    }
    if pool.oracle.max_observation_change_per_update != dao.twap_max_observation_change_per_update {
        return Err(AutocratError::InvalidMaxObservationChange);
    }
    if pool.oracle.start_delay_slots != dao.twap_start_delay_slots {
        return Err(AutocratError::InvalidStartDelaySlots);
    }
    Ok(())
}
