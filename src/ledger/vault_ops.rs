// Question and conditional vault operations

use tracing::warn;

use super::Ledger;
use crate::address::Address;
use crate::errors::{FutarchyError, Result, VaultError};
use crate::events::LedgerEvent;
use crate::vault::{ConditionalVault, InitializeQuestionArgs, Question};

/// Address of a question; the same id may be reused by different oracles
pub fn question_address(args: &InitializeQuestionArgs) -> Address {
    Address::derive(&[
        b"question",
        &args.question_id,
        args.oracle.as_ref(),
        &[args.num_outcomes],
    ])
}

impl Ledger {
    // ========================================================================
    // QUESTIONS
    // ========================================================================

    pub fn initialize_question(&mut self, payer: Address, args: InitializeQuestionArgs) -> Result<Address> {
        self.atomically(|ledger| ledger.initialize_question_inner(payer, args))
    }

    pub(crate) fn initialize_question_inner(
        &mut self,
        payer: Address,
        args: InitializeQuestionArgs,
    ) -> Result<Address> {
        let address = question_address(&args);
        if self.questions.contains_key(&address) {
            return Err(FutarchyError::already_exists("question", address));
        }
        let question = Question::new(&args)?;
        self.questions.insert(address, question);

        let common = self.common(payer);
        self.emit(LedgerEvent::InitializeQuestion {
            common,
            question: address,
            oracle: args.oracle,
            num_outcomes: args.num_outcomes,
        });
        Ok(address)
    }

    /// Resolve a question; `signer` must be its oracle. Questions owned by a
    /// proposal only resolve through `finalize_proposal`.
    pub fn resolve_question(&mut self, signer: Address, question: Address, payout_numerators: Vec<u32>) -> Result<()> {
        let oracle = self.question(&question)?.oracle;
        if self.proposals.contains_key(&oracle) {
            warn!(question = %question, proposal = %oracle, "refusing direct resolve of a proposal question");
            return Err(VaultError::UnauthorizedOracle.into());
        }
        self.atomically(|ledger| ledger.resolve_question_inner(signer, question, payout_numerators))
    }

    pub(crate) fn resolve_question_inner(
        &mut self,
        signer: Address,
        question: Address,
        payout_numerators: Vec<u32>,
    ) -> Result<()> {
        self.questions
            .get_mut(&question)
            .ok_or_else(|| FutarchyError::not_found("question", question))?
            .resolve(&signer, &payout_numerators)?;

        let common = self.common(signer);
        self.emit(LedgerEvent::ResolveQuestion { common, question, payout_numerators });
        Ok(())
    }

    // ========================================================================
    // VAULTS
    // ========================================================================

    /// Create a vault over `underlying_token_mint` and one conditional mint
    /// per outcome of `question`.
    ///
    /// # Arguments
    /// * `payer` - Recorded on the event only
    /// * `question` - Existing question the vault settles against
    /// * `underlying_token_mint` - Mint that gets locked on split
    /// * `num_outcomes` - Must equal the question's outcome count
    pub fn initialize_vault(
        &mut self,
        payer: Address,
        question: Address,
        underlying_token_mint: Address,
        num_outcomes: u8,
    ) -> Result<Address> {
        self.atomically(|ledger| ledger.initialize_vault_inner(payer, question, underlying_token_mint, num_outcomes))
    }

    pub(crate) fn initialize_vault_inner(
        &mut self,
        payer: Address,
        question: Address,
        underlying_token_mint: Address,
        num_outcomes: u8,
    ) -> Result<Address> {
        if self.question(&question)?.num_outcomes() != num_outcomes as usize {
            return Err(VaultError::NumOutcomesMismatch.into());
        }
        let decimals = self.tokens.mint(&underlying_token_mint)?.decimals;

        let address = ConditionalVault::derive_address(&question, &underlying_token_mint);
        if self.vaults.contains_key(&address) {
            return Err(FutarchyError::already_exists("vault", address));
        }

        let vault = ConditionalVault::new(&address, question, underlying_token_mint, decimals, num_outcomes as usize);
        for mint in &vault.conditional_token_mints {
            self.tokens.create_mint(*mint, decimals, address)?;
        }
        let conditional_token_mints = vault.conditional_token_mints.clone();
        self.vaults.insert(address, vault);

        let common = self.common(payer);
        self.emit(LedgerEvent::InitializeVault {
            common,
            vault: address,
            question,
            underlying_token_mint,
            conditional_token_mints,
        });
        Ok(address)
    }

    /// Lock `amount` underlying and mint `amount` of every outcome token
    pub fn split_tokens(&mut self, user: Address, vault: Address, amount: u64) -> Result<()> {
        self.atomically(|ledger| ledger.split_tokens_inner(user, vault, amount))
    }

    pub(crate) fn split_tokens_inner(&mut self, user: Address, vault: Address, amount: u64) -> Result<()> {
        let record = self.vault(&vault)?.clone();
        record.check_split(self.balance(&record.underlying_token_mint, &user), amount)?;

        self.tokens.transfer(
            &record.underlying_token_mint,
            &user,
            &record.underlying_token_account,
            amount,
        )?;
        for mint in &record.conditional_token_mints {
            self.tokens.mint_to(mint, &user, amount)?;
        }
        self.check_vault_invariant(&vault)?;

        let common = self.common(user);
        self.emit(LedgerEvent::SplitTokens { common, vault, amount });
        Ok(())
    }

    /// Burn `amount` of every outcome token and release `amount` underlying
    pub fn merge_tokens(&mut self, user: Address, vault: Address, amount: u64) -> Result<()> {
        self.atomically(|ledger| ledger.merge_tokens_inner(user, vault, amount))
    }

    pub(crate) fn merge_tokens_inner(&mut self, user: Address, vault: Address, amount: u64) -> Result<()> {
        let record = self.vault(&vault)?.clone();
        let balances = self.conditional_balances(&record, &user);
        record.check_merge(&balances, amount)?;

        for mint in &record.conditional_token_mints {
            self.tokens.burn(mint, &user, amount)?;
        }
        self.tokens.transfer(
            &record.underlying_token_mint,
            &record.underlying_token_account,
            &user,
            amount,
        )?;
        self.check_vault_invariant(&vault)?;

        let common = self.common(user);
        self.emit(LedgerEvent::MergeTokens { common, vault, amount });
        Ok(())
    }

    /// Burn every outcome token `user` holds and pay out their resolved
    /// value. Returns the underlying paid.
    pub fn redeem_tokens(&mut self, user: Address, vault: Address) -> Result<u64> {
        self.atomically(|ledger| ledger.redeem_tokens_inner(user, vault))
    }

    pub(crate) fn redeem_tokens_inner(&mut self, user: Address, vault: Address) -> Result<u64> {
        let record = self.vault(&vault)?.clone();
        let question = self.question(&record.question)?;
        let balances = self.conditional_balances(&record, &user);
        let redeemed = record.redeemable(question, &balances)?;

        for (mint, balance) in record.conditional_token_mints.iter().zip(&balances) {
            self.tokens.burn(mint, &user, *balance)?;
        }
        self.tokens.transfer(
            &record.underlying_token_mint,
            &record.underlying_token_account,
            &user,
            redeemed,
        )?;
        self.check_vault_invariant(&vault)?;

        let common = self.common(user);
        self.emit(LedgerEvent::RedeemTokens { common, vault, redeemed });
        Ok(redeemed)
    }

    /// `user`'s balance of each outcome token, in outcome order
    pub fn conditional_balances(&self, vault: &ConditionalVault, user: &Address) -> Vec<u64> {
        vault
            .conditional_token_mints
            .iter()
            .map(|mint| self.balance(mint, user))
            .collect()
    }

    fn check_vault_invariant(&self, vault: &Address) -> Result<()> {
        let record = self.vault(vault)?;
        let question = self.question(&record.question)?;
        let underlying = self.balance(&record.underlying_token_mint, &record.underlying_token_account);
        let supplies: Vec<u64> = record
            .conditional_token_mints
            .iter()
            .map(|mint| self.tokens.supply(mint))
            .collect();

        record.check_invariant(question, underlying, &supplies).map_err(|e| {
            warn!(vault = %vault, underlying, ?supplies, "vault invariant violated");
            e.into()
        })
    }
}
