//! Shared setup for tests running against the in-memory ledger

#![allow(dead_code)]

use std::sync::Arc;

use solana_sdk::native_token::LAMPORTS_PER_SOL;
use withheld_sdk::{
    instructions::MintSpec, prelude::*, testing::LocalLedger, FeeClient, TransferFeeParams,
};

pub const MINT_AMOUNT: u64 = 1_000_000_000;
pub const TRANSFER_AMOUNT: u64 = 1_000_000;

/// 50 bps capped at 5000, as in the reference scenario
pub fn scenario_fee() -> TransferFeeParams {
    TransferFeeParams::new(50, 5_000).unwrap()
}

pub struct Harness {
    pub ledger: Arc<LocalLedger>,
    pub client: FeeClient,
    pub payer: Keypair,
    pub recipient: Keypair,
}

/// A fee mint whose every authority is the payer, with funded accounts
pub struct FeeMint {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = Arc::new(LocalLedger::new());
        let payer = Keypair::new();
        ledger.fund(&payer.pubkey(), 100 * LAMPORTS_PER_SOL).unwrap();
        Self {
            client: FeeClient::new(ledger.clone()),
            ledger,
            payer,
            recipient: Keypair::new(),
        }
    }

    pub async fn create_mint(&self, spec: &MintSpec) -> Pubkey {
        let mint = Keypair::new();
        self.client
            .mint
            .create_mint(&self.payer, &mint, spec)
            .await
            .unwrap();
        mint.pubkey()
    }

    pub fn fee_spec(&self, params: TransferFeeParams) -> MintSpec {
        MintSpec::new(9, self.payer.pubkey()).with_transfer_fee(
            Some(self.payer.pubkey()),
            Some(self.payer.pubkey()),
            params,
        )
    }

    /// Fee mint, payer source holding `MINT_AMOUNT`, empty recipient account
    pub async fn fee_mint(&self, params: TransferFeeParams) -> FeeMint {
        let mint = self.create_mint(&self.fee_spec(params)).await;
        let (source, _) = self
            .client
            .tokens
            .create_account(&self.payer, &mint, &self.payer.pubkey())
            .await
            .unwrap();
        self.client
            .tokens
            .mint_to(&self.payer, &mint, &source, &self.payer, MINT_AMOUNT)
            .await
            .unwrap();
        let (destination, _) = self
            .client
            .tokens
            .create_account(&self.payer, &mint, &self.recipient.pubkey())
            .await
            .unwrap();
        FeeMint {
            mint,
            source,
            destination,
        }
    }

    pub async fn transfer(&self, setup: &FeeMint, to: &Pubkey, gross: u64) {
        self.client
            .tokens
            .transfer_with_fee(&self.payer, &setup.mint, &setup.source, to, &self.payer, gross)
            .await
            .unwrap();
    }

    pub async fn balance(&self, account: &Pubkey) -> u64 {
        self.client.tokens.fetch(account).await.unwrap().amount
    }

    pub async fn withheld(&self, account: &Pubkey) -> u64 {
        self.client.tokens.fetch(account).await.unwrap().withheld()
    }
}
