//! In-memory cluster for tests and offline runs
//!
//! `LocalLedger` interprets the system, associated-token-account and
//! Token-2022 instructions this crate emits and serves every account in the
//! real Token-2022 byte layout, so the services run unchanged against it.
//! Each transaction applies atomically: the first failing instruction
//! rejects the whole transaction and leaves state untouched. As on chain,
//! a harvest skips source accounts that do not belong to the mint.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use solana_program::{program_option::COption, program_pack::Pack};
use solana_sdk::{
    account::Account as SolanaAccount, hash::Hash, instruction::Instruction, rent::Rent,
    system_instruction::SystemInstruction, system_program, transaction::Transaction,
};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_token_2022::{
    extension::{
        mint_close_authority::MintCloseAuthority,
        transfer_fee::{
            instruction::TransferFeeInstruction, TransferFee, TransferFeeAmount,
            TransferFeeConfig,
        },
        BaseStateWithExtensionsMut, ExtensionType, StateWithExtensionsMut,
    },
    instruction::TokenInstruction,
    state::{Account, AccountState, Mint},
};
use tracing::debug;
use withheld_math::TransferFeeParams;

use crate::client::cluster::{signer_set, ClusterClient};
use crate::core::{token_program_id, SdkError, SdkResult};
use crate::prelude::*;
use crate::protocol::{unpack_mint, WithheldLedger};

/// Lamports charged per transaction signature
pub const LOCAL_SIGNATURE_FEE: u64 = 5_000;

/// Mint fields and extension values to render as Token-2022 bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedMint {
    pub decimals: u8,
    pub supply: u64,
    pub mint_authority: Option<Pubkey>,
    pub freeze_authority: Option<Pubkey>,
    pub config_authority: Option<Pubkey>,
    pub withdraw_authority: Option<Pubkey>,
    /// Installs the transfer fee extension when set
    pub fee: Option<TransferFeeParams>,
    pub withheld: u64,
    /// Installs the close authority extension when set
    pub close_authority: Option<Pubkey>,
}

impl Default for PackedMint {
    fn default() -> Self {
        Self {
            decimals: 9,
            supply: 0,
            mint_authority: None,
            freeze_authority: None,
            config_authority: None,
            withdraw_authority: None,
            fee: None,
            withheld: 0,
            close_authority: None,
        }
    }
}

impl PackedMint {
    pub fn extension_types(&self) -> Vec<ExtensionType> {
        let mut types = Vec::new();
        if self.fee.is_some() {
            types.push(ExtensionType::TransferFeeConfig);
        }
        if self.close_authority.is_some() {
            types.push(ExtensionType::MintCloseAuthority);
        }
        types
    }

    pub fn account_len(&self) -> SdkResult<usize> {
        Ok(ExtensionType::try_calculate_account_len::<Mint>(
            &self.extension_types(),
        )?)
    }
}

/// Render a mint in Token-2022 layout
pub fn pack_mint(mint: &PackedMint) -> SdkResult<Vec<u8>> {
    let base = Mint {
        mint_authority: COption::from(mint.mint_authority),
        supply: mint.supply,
        decimals: mint.decimals,
        is_initialized: true,
        freeze_authority: COption::from(mint.freeze_authority),
    };

    let types = mint.extension_types();
    if types.is_empty() {
        let mut data = vec![0; Mint::LEN];
        Mint::pack(base, &mut data)?;
        return Ok(data);
    }

    let mut data = vec![0; mint.account_len()?];
    let mut state = StateWithExtensionsMut::<Mint>::unpack_uninitialized(&mut data)?;
    if let Some(params) = mint.fee {
        let fee = TransferFee {
            epoch: 0u64.into(),
            maximum_fee: params.maximum_fee.into(),
            transfer_fee_basis_points: params.basis_points.into(),
        };
        let config = state.init_extension::<TransferFeeConfig>(true)?;
        config.transfer_fee_config_authority = mint.config_authority.try_into()?;
        config.withdraw_withheld_authority = mint.withdraw_authority.try_into()?;
        config.withheld_amount = mint.withheld.into();
        config.older_transfer_fee = fee;
        config.newer_transfer_fee = fee;
    }
    if let Some(authority) = mint.close_authority {
        let extension = state.init_extension::<MintCloseAuthority>(true)?;
        extension.close_authority = Some(authority).try_into()?;
    }
    state.base = base;
    state.pack_base();
    state.init_account_type()?;

    Ok(data)
}

/// Render a token account in Token-2022 layout
///
/// `withheld` adds the transfer-fee-amount extension.
pub fn pack_token_account(
    mint: &Pubkey,
    owner: &Pubkey,
    amount: u64,
    withheld: Option<u64>,
) -> SdkResult<Vec<u8>> {
    let base = Account {
        mint: *mint,
        owner: *owner,
        amount,
        delegate: COption::None,
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount: 0,
        close_authority: COption::None,
    };

    let Some(withheld) = withheld else {
        let mut data = vec![0; Account::LEN];
        Account::pack(base, &mut data)?;
        return Ok(data);
    };

    let mut data = vec![0; token_account_len(true)?];
    let mut state = StateWithExtensionsMut::<Account>::unpack_uninitialized(&mut data)?;
    state.init_extension::<TransferFeeAmount>(true)?.withheld_amount = withheld.into();
    state.base = base;
    state.pack_base();
    state.init_account_type()?;

    Ok(data)
}

fn token_account_len(with_fee: bool) -> SdkResult<usize> {
    if with_fee {
        Ok(ExtensionType::try_calculate_account_len::<Account>(&[
            ExtensionType::TransferFeeAmount,
        ])?)
    } else {
        Ok(Account::LEN)
    }
}

#[derive(Clone, Debug)]
struct LocalMint {
    space: usize,
    initialized: bool,
    fields: PackedMint,
    ledger: WithheldLedger,
}

impl LocalMint {
    fn render(&self) -> SdkResult<Vec<u8>> {
        let mut fields = self.fields.clone();
        fields.withheld = self.ledger.pool();
        pack_mint(&fields)
    }

    fn require_initialized(&self, address: &Pubkey) -> SdkResult<()> {
        if !self.initialized {
            return Err(rejected(format!("mint {} is not initialized", address)));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Allocation {
    space: usize,
    owner: Pubkey,
}

#[derive(Clone, Debug, Default)]
struct LocalState {
    lamports: BTreeMap<Pubkey, u64>,
    allocations: BTreeMap<Pubkey, Allocation>,
    mints: BTreeMap<Pubkey, LocalMint>,
    /// token account -> mint
    token_accounts: BTreeMap<Pubkey, Pubkey>,
    /// token accounts served verbatim, keyed by address with their mint
    raw_accounts: BTreeMap<Pubkey, (Pubkey, Vec<u8>)>,
    transactions: Vec<Signature>,
    nonce: u64,
}

/// In-memory cluster that executes this crate's instructions
#[derive(Debug, Default)]
pub struct LocalLedger {
    state: Mutex<LocalState>,
}

impl LocalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit lamports without a transaction
    pub fn fund(&self, address: &Pubkey, lamports: u64) -> SdkResult<()> {
        self.lock()?.credit(address, lamports)
    }

    /// Serve `data` as a token account of `mint` in enumeration results
    pub fn insert_raw_token_account(
        &self,
        mint: &Pubkey,
        address: &Pubkey,
        data: Vec<u8>,
    ) -> SdkResult<()> {
        self.lock()?.raw_accounts.insert(*address, (*mint, data));
        Ok(())
    }

    pub fn transaction_count(&self) -> SdkResult<usize> {
        Ok(self.lock()?.transactions.len())
    }

    /// Balances, withheld accumulators and pool of `mint`
    pub fn withheld_ledger(&self, mint: &Pubkey) -> SdkResult<WithheldLedger> {
        self.lock()?
            .mints
            .get(mint)
            .map(|m| m.ledger.clone())
            .ok_or(SdkError::AccountNotFound(*mint))
    }

    fn lock(&self) -> SdkResult<MutexGuard<'_, LocalState>> {
        self.state
            .lock()
            .map_err(|_| SdkError::Rpc("local ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl ClusterClient for LocalLedger {
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64> {
        Ok(Rent::default().minimum_balance(data_len))
    }

    async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> SdkResult<Signature> {
        let signers = signer_set(payer, signers);
        let mut state = self.lock()?;
        state.nonce += 1;

        let mut tx = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
        tx.try_sign(&signers, Hash::new_from_array(counter_bytes(state.nonce)))
            .map_err(|e| SdkError::InvalidParameters(format!("failed to sign transaction: {}", e)))?;
        let signature = tx.signatures[0];

        let mut next = state.clone();
        next.debit(
            &payer.pubkey(),
            LOCAL_SIGNATURE_FEE * tx.signatures.len() as u64,
        )?;
        for (index, instruction) in instructions.iter().enumerate() {
            next.execute(instruction).map_err(|e| match e {
                SdkError::TransactionRejected(reason) => {
                    rejected(format!("instruction {}: {}", index, reason))
                }
                other => rejected(format!("instruction {}: {}", index, other)),
            })?;
        }
        next.transactions.push(signature);
        *state = next;

        Ok(signature)
    }

    async fn get_account(&self, address: &Pubkey) -> SdkResult<Option<SolanaAccount>> {
        self.lock()?.render(address)
    }

    async fn get_token_accounts_by_mint(
        &self,
        program: &Pubkey,
        mint: &Pubkey,
    ) -> SdkResult<Vec<(Pubkey, SolanaAccount)>> {
        let state = self.lock()?;
        if *program != token_program_id() {
            return Ok(Vec::new());
        }

        let mut accounts = Vec::new();
        for (address, account_mint) in &state.token_accounts {
            if account_mint == mint {
                if let Some(account) = state.render(address)? {
                    accounts.push((*address, account));
                }
            }
        }
        for (address, (account_mint, data)) in &state.raw_accounts {
            if account_mint == mint {
                accounts.push((*address, token_program_account(1, data.clone())));
            }
        }
        Ok(accounts)
    }

    async fn get_balance(&self, address: &Pubkey) -> SdkResult<u64> {
        Ok(self.lock()?.lamports.get(address).copied().unwrap_or(0))
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> SdkResult<Signature> {
        let mut state = self.lock()?;
        state.credit(address, lamports)?;
        state.nonce += 1;
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&counter_bytes(state.nonce));
        Ok(Signature::from(bytes))
    }

    async fn current_epoch(&self) -> SdkResult<u64> {
        Ok(0)
    }
}

impl LocalState {
    fn render(&self, address: &Pubkey) -> SdkResult<Option<SolanaAccount>> {
        let lamports = self.lamports.get(address).copied().unwrap_or(0);

        if let Some(mint) = self.mints.get(address) {
            let data = if mint.initialized {
                mint.render()?
            } else {
                vec![0; mint.space]
            };
            return Ok(Some(token_program_account(lamports, data)));
        }
        if let Some(mint_address) = self.token_accounts.get(address) {
            let mint = self.mint(mint_address)?;
            let account = mint.ledger.account(address)?;
            let withheld = mint.fields.fee.map(|_| account.withheld);
            let data =
                pack_token_account(mint_address, &account.owner, account.balance, withheld)?;
            return Ok(Some(token_program_account(lamports, data)));
        }
        if let Some(allocation) = self.allocations.get(address) {
            return Ok(Some(SolanaAccount {
                lamports,
                data: vec![0; allocation.space],
                owner: allocation.owner,
                executable: false,
                rent_epoch: 0,
            }));
        }
        if lamports > 0 {
            return Ok(Some(SolanaAccount::new(lamports, 0, &system_program::id())));
        }
        Ok(None)
    }

    fn execute(&mut self, instruction: &Instruction) -> SdkResult<()> {
        if instruction.program_id == system_program::id() {
            self.system(instruction)
        } else if instruction.program_id == spl_associated_token_account::id() {
            self.associated_token(instruction)
        } else if instruction.program_id == token_program_id() {
            self.token(instruction)
        } else {
            Err(rejected(format!(
                "unknown program {}",
                instruction.program_id
            )))
        }
    }

    fn system(&mut self, instruction: &Instruction) -> SdkResult<()> {
        let decoded: SystemInstruction = bincode::deserialize(&instruction.data)
            .map_err(|e| rejected(format!("invalid system instruction: {}", e)))?;
        let (lamports, space, owner) = match decoded {
            SystemInstruction::CreateAccount {
                lamports,
                space,
                owner,
            } => (lamports, space, owner),
            other => {
                return Err(rejected(format!(
                    "unsupported system instruction {:?}",
                    other
                )))
            }
        };

        let from = key(instruction, 0)?;
        let to = key(instruction, 1)?;
        if self.in_use(&to) {
            return Err(rejected(format!("account {} already in use", to)));
        }
        let space = space as usize;
        if lamports < Rent::default().minimum_balance(space) {
            return Err(rejected(format!(
                "{} lamports do not cover rent for {} bytes",
                lamports, space
            )));
        }
        self.debit(&from, lamports)?;
        self.credit(&to, lamports)?;
        self.allocations.insert(to, Allocation { space, owner });
        Ok(())
    }

    fn associated_token(&mut self, instruction: &Instruction) -> SdkResult<()> {
        let idempotent = match instruction.data.first() {
            None | Some(0) => false,
            Some(1) => true,
            Some(other) => {
                return Err(rejected(format!(
                    "unsupported associated token instruction {}",
                    other
                )))
            }
        };
        let funding = key(instruction, 0)?;
        let address = key(instruction, 1)?;
        let wallet = key(instruction, 2)?;
        let mint_address = key(instruction, 3)?;
        let token_program = key(instruction, 5)?;

        let expected =
            get_associated_token_address_with_program_id(&wallet, &mint_address, &token_program);
        if address != expected {
            return Err(rejected(format!(
                "{} is not the associated token address {}",
                address, expected
            )));
        }

        if let Some(existing_mint) = self.token_accounts.get(&address) {
            let owner = self.mint(existing_mint)?.ledger.account(&address)?.owner;
            if idempotent && *existing_mint == mint_address && owner == wallet {
                return Ok(());
            }
            return Err(rejected(format!("account {} already in use", address)));
        }
        if self.in_use(&address) {
            return Err(rejected(format!("account {} already in use", address)));
        }

        let mint = self.mint(&mint_address)?;
        mint.require_initialized(&mint_address)?;
        let rent = Rent::default().minimum_balance(token_account_len(mint.fields.fee.is_some())?);

        self.debit(&funding, rent)?;
        self.credit(&address, rent)?;
        self.token_accounts.insert(address, mint_address);
        self.mint_mut(&mint_address)?
            .ledger
            .open_account(address, wallet);
        Ok(())
    }

    fn token(&mut self, instruction: &Instruction) -> SdkResult<()> {
        let decoded = TokenInstruction::unpack(&instruction.data)
            .map_err(|e| rejected(format!("invalid token instruction: {}", e)))?;

        match decoded {
            TokenInstruction::InitializeMint {
                decimals,
                mint_authority,
                freeze_authority,
            } => {
                let address = key(instruction, 0)?;
                let mint = self.uninitialized_mint(&address)?;
                let required = mint.fields.account_len()?;
                if mint.space != required {
                    return Err(rejected(format!(
                        "mint {} has {} bytes, its extensions need {}",
                        address, mint.space, required
                    )));
                }
                mint.fields.decimals = decimals;
                mint.fields.mint_authority = Some(mint_authority);
                mint.fields.freeze_authority = coption_to_option(freeze_authority);
                mint.initialized = true;
                Ok(())
            }
            TokenInstruction::InitializeMintCloseAuthority { close_authority } => {
                let address = key(instruction, 0)?;
                let mint = self.uninitialized_mint(&address)?;
                mint.fields.close_authority = coption_to_option(close_authority);
                ensure_fits(&address, mint)
            }
            TokenInstruction::MintTo { amount } => {
                let address = key(instruction, 0)?;
                let destination = key(instruction, 1)?;
                let authority = key(instruction, 2)?;
                self.require_account_of(&destination, &address)?;
                let mint = self.mint_mut(&address)?;
                mint.require_initialized(&address)?;
                if mint.fields.mint_authority != Some(authority) {
                    return Err(rejected(format!(
                        "{} is not the mint authority of {}",
                        authority, address
                    )));
                }
                mint.fields.supply = mint
                    .fields
                    .supply
                    .checked_add(amount)
                    .ok_or_else(|| rejected("supply overflow".to_string()))?;
                mint.ledger.mint(&destination, amount)
            }
            TokenInstruction::CloseAccount => self.close_account(instruction),
            TokenInstruction::TransferFeeExtension => self.transfer_fee(instruction),
            other => Err(rejected(format!("unsupported token instruction {:?}", other))),
        }
    }

    fn transfer_fee(&mut self, instruction: &Instruction) -> SdkResult<()> {
        let decoded = TransferFeeInstruction::unpack(&instruction.data[1..])
            .map_err(|e| rejected(format!("invalid transfer fee instruction: {}", e)))?;

        match decoded {
            TransferFeeInstruction::InitializeTransferFeeConfig {
                transfer_fee_config_authority,
                withdraw_withheld_authority,
                transfer_fee_basis_points,
                maximum_fee,
            } => {
                let address = key(instruction, 0)?;
                let params = TransferFeeParams {
                    basis_points: transfer_fee_basis_points,
                    maximum_fee,
                };
                params
                    .validate()
                    .map_err(|e| rejected(format!("invalid transfer fee: {}", e)))?;
                let mint = self.uninitialized_mint(&address)?;
                mint.fields.fee = Some(params);
                mint.fields.config_authority = coption_to_option(transfer_fee_config_authority);
                mint.fields.withdraw_authority = coption_to_option(withdraw_withheld_authority);
                ensure_fits(&address, mint)
            }
            TransferFeeInstruction::TransferCheckedWithFee {
                amount,
                decimals,
                fee,
            } => {
                let source = key(instruction, 0)?;
                let address = key(instruction, 1)?;
                let destination = key(instruction, 2)?;
                let authority = key(instruction, 3)?;
                self.require_account_of(&source, &address)?;
                self.require_account_of(&destination, &address)?;

                let mint = self.mint(&address)?;
                mint.require_initialized(&address)?;
                if mint.fields.decimals != decimals {
                    return Err(rejected(format!(
                        "decimals mismatch: mint has {}, instruction states {}",
                        mint.fields.decimals, decimals
                    )));
                }
                if mint.ledger.account(&source)?.owner != authority {
                    return Err(rejected(format!("{} does not own {}", authority, source)));
                }
                let program_fee = unpack_mint(&address, &mint.render()?)?.program_fee(0, amount)?;
                if program_fee != fee {
                    return Err(rejected(format!(
                        "fee mismatch: instruction states {}, mint derives {}",
                        fee, program_fee
                    )));
                }
                self.mint_mut(&address)?
                    .ledger
                    .transfer(&source, &destination, amount, fee)
            }
            TransferFeeInstruction::WithdrawWithheldTokensFromAccounts {
                num_token_accounts,
            } => {
                let address = key(instruction, 0)?;
                let destination = key(instruction, 1)?;
                let authority = key(instruction, 2)?;
                let count = usize::from(num_token_accounts);
                if instruction.accounts.len() < 3 + count {
                    return Err(rejected("missing source accounts".to_string()));
                }
                let sources: Vec<Pubkey> = instruction.accounts
                    [instruction.accounts.len() - count..]
                    .iter()
                    .map(|meta| meta.pubkey)
                    .collect();
                self.require_account_of(&destination, &address)?;
                for source in &sources {
                    self.require_account_of(source, &address)?;
                }
                self.require_withdraw_authority(&address, &authority)?;
                self.mint_mut(&address)?
                    .ledger
                    .withdraw_from_accounts(&sources, &destination)
                    .map(|_| ())
            }
            TransferFeeInstruction::HarvestWithheldTokensToMint => {
                let address = key(instruction, 0)?;
                // sources of another mint are skipped, not fatal
                let sources: Vec<Pubkey> = instruction.accounts[1..]
                    .iter()
                    .map(|meta| meta.pubkey)
                    .filter(|source| match self.require_account_of(source, &address) {
                        Ok(()) => true,
                        Err(err) => {
                            debug!(%source, "harvest skipped source: {}", err);
                            false
                        }
                    })
                    .collect();
                let mint = self.mint_mut(&address)?;
                mint.require_initialized(&address)?;
                mint.ledger.harvest_to_mint(&sources).map(|_| ())
            }
            TransferFeeInstruction::WithdrawWithheldTokensFromMint => {
                let address = key(instruction, 0)?;
                let destination = key(instruction, 1)?;
                let authority = key(instruction, 2)?;
                self.require_account_of(&destination, &address)?;
                self.require_withdraw_authority(&address, &authority)?;
                self.mint_mut(&address)?
                    .ledger
                    .withdraw_from_mint(&destination)
                    .map(|_| ())
            }
            other => Err(rejected(format!(
                "unsupported transfer fee instruction {:?}",
                other
            ))),
        }
    }

    fn close_account(&mut self, instruction: &Instruction) -> SdkResult<()> {
        let address = key(instruction, 0)?;
        let destination = key(instruction, 1)?;
        let authority = key(instruction, 2)?;

        if let Some(mint) = self.mints.get(&address) {
            mint.require_initialized(&address)?;
            if mint.fields.close_authority != Some(authority) {
                return Err(rejected(format!(
                    "{} is not the close authority of {}",
                    authority, address
                )));
            }
            if mint.fields.supply != 0 {
                return Err(rejected(format!(
                    "mint {} has non-zero supply {}",
                    address, mint.fields.supply
                )));
            }
            self.mints.remove(&address);
            self.allocations.remove(&address);
            // accounts of a closed mint can no longer be rendered
            self.token_accounts.retain(|_, mint| *mint != address);
        } else if let Some(mint_address) = self.token_accounts.get(&address).copied() {
            let mint = self.mint_mut(&mint_address)?;
            if mint.ledger.account(&address)?.owner != authority {
                return Err(rejected(format!("{} does not own {}", authority, address)));
            }
            mint.ledger.close_account(&address)?;
            self.token_accounts.remove(&address);
        } else {
            return Err(rejected(format!("account {} cannot be closed", address)));
        }

        let lamports = self.lamports.remove(&address).unwrap_or(0);
        self.credit(&destination, lamports)
    }

    /// Mint accepting extension initialization, created from a fresh allocation
    fn uninitialized_mint(&mut self, address: &Pubkey) -> SdkResult<&mut LocalMint> {
        if !self.mints.contains_key(address) {
            let allocation = self
                .allocations
                .get(address)
                .copied()
                .ok_or_else(|| rejected(format!("account {} is not allocated", address)))?;
            if allocation.owner != token_program_id() {
                return Err(rejected(format!(
                    "account {} is owned by {}",
                    address, allocation.owner
                )));
            }
            self.mints.insert(
                *address,
                LocalMint {
                    space: allocation.space,
                    initialized: false,
                    fields: PackedMint::default(),
                    ledger: WithheldLedger::new(),
                },
            );
        }

        let mint = self.mint_mut(address)?;
        if mint.initialized {
            return Err(rejected(format!("mint {} is already initialized", address)));
        }
        Ok(mint)
    }

    fn require_withdraw_authority(&self, mint: &Pubkey, authority: &Pubkey) -> SdkResult<()> {
        let local = self.mint(mint)?;
        local.require_initialized(mint)?;
        if local.fields.fee.is_none() {
            return Err(rejected(format!("mint {} has no transfer fee", mint)));
        }
        if local.fields.withdraw_authority != Some(*authority) {
            return Err(rejected(format!(
                "{} is not the withdraw withheld authority of {}",
                authority, mint
            )));
        }
        Ok(())
    }

    fn require_account_of(&self, account: &Pubkey, mint: &Pubkey) -> SdkResult<()> {
        match self.token_accounts.get(account) {
            Some(account_mint) if account_mint == mint => Ok(()),
            Some(other) => Err(rejected(format!(
                "account {} belongs to mint {}, not {}",
                account, other, mint
            ))),
            None => Err(rejected(format!("{} is not a token account", account))),
        }
    }

    fn mint(&self, address: &Pubkey) -> SdkResult<&LocalMint> {
        self.mints
            .get(address)
            .ok_or_else(|| rejected(format!("{} is not a mint", address)))
    }

    fn mint_mut(&mut self, address: &Pubkey) -> SdkResult<&mut LocalMint> {
        self.mints
            .get_mut(address)
            .ok_or_else(|| rejected(format!("{} is not a mint", address)))
    }

    fn in_use(&self, address: &Pubkey) -> bool {
        self.allocations.contains_key(address)
            || self.mints.contains_key(address)
            || self.token_accounts.contains_key(address)
    }

    fn credit(&mut self, address: &Pubkey, lamports: u64) -> SdkResult<()> {
        let balance = self.lamports.entry(*address).or_insert(0);
        *balance = balance
            .checked_add(lamports)
            .ok_or_else(|| rejected(format!("lamport overflow on {}", address)))?;
        Ok(())
    }

    fn debit(&mut self, address: &Pubkey, lamports: u64) -> SdkResult<()> {
        let balance = self.lamports.get(address).copied().unwrap_or(0);
        if balance < lamports {
            return Err(rejected(format!(
                "insufficient lamports: {} holds {}, needs {}",
                address, balance, lamports
            )));
        }
        self.lamports.insert(*address, balance - lamports);
        Ok(())
    }
}

fn ensure_fits(address: &Pubkey, mint: &LocalMint) -> SdkResult<()> {
    let required = mint.fields.account_len()?;
    if required > mint.space {
        return Err(rejected(format!(
            "mint {} has {} bytes, its extensions need {}",
            address, mint.space, required
        )));
    }
    Ok(())
}

fn key(instruction: &Instruction, index: usize) -> SdkResult<Pubkey> {
    instruction
        .accounts
        .get(index)
        .map(|meta| meta.pubkey)
        .ok_or_else(|| rejected(format!("missing account {}", index)))
}

fn coption_to_option(value: COption<Pubkey>) -> Option<Pubkey> {
    match value {
        COption::Some(key) => Some(key),
        COption::None => None,
    }
}

fn token_program_account(lamports: u64, data: Vec<u8>) -> SolanaAccount {
    SolanaAccount {
        lamports,
        data,
        owner: token_program_id(),
        executable: false,
        rent_epoch: 0,
    }
}

fn counter_bytes(value: u64) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&value.to_le_bytes());
    bytes
}

fn rejected(reason: String) -> SdkError {
    SdkError::TransactionRejected(reason)
}
