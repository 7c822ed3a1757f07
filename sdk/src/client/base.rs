use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, instruction::Instruction,
    transaction::Transaction,
};
use tracing::{debug, info, warn};

use crate::client::cluster::{signer_set, ClusterClient};
use crate::config::{ClusterConfig, RetryConfig};
use crate::core::{classify_submission_error, SdkError, SdkResult, TOKEN_ACCOUNT_MINT_OFFSET};
use crate::prelude::*;

const AIRDROP_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Cluster client over JSON-RPC
pub struct RpcCluster {
    rpc: Arc<RpcClient>,
    retry: RetryConfig,
    timeout: Duration,
}

impl RpcCluster {
    pub fn new(rpc: Arc<RpcClient>, retry: RetryConfig) -> Self {
        Self {
            rpc,
            retry,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(cluster: &ClusterConfig, retry: RetryConfig) -> SdkResult<Self> {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            cluster.rpc_url.clone(),
            cluster.timeout(),
            cluster.commitment()?,
        );
        Ok(Self {
            rpc: Arc::new(rpc),
            retry,
            timeout: cluster.timeout(),
        })
    }

    /// Get the RPC client
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Get the RPC endpoint URL
    pub fn rpc_url(&self) -> String {
        self.rpc.url()
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.rpc.commitment()
    }

    async fn submit_once(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
        sent: &mut Vec<Signature>,
    ) -> SdkResult<Signature> {
        let recent_blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(classify_submission_error)?;

        let mut tx = Transaction::new_with_payer(instructions, Some(&signers[0].pubkey()));
        tx.try_sign(&signers.to_vec(), recent_blockhash)
            .map_err(|e| SdkError::InvalidParameters(format!("failed to sign transaction: {}", e)))?;
        sent.push(tx.signatures[0]);

        self.rpc
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(classify_submission_error)
    }

    /// First previously sent signature that reached our commitment
    async fn find_landed(&self, sent: &[Signature]) -> SdkResult<Option<Signature>> {
        let statuses = self.rpc.get_signature_statuses(sent).await?.value;
        for (signature, status) in sent.iter().zip(statuses) {
            let Some(status) = status else { continue };
            if !status.satisfies_commitment(self.rpc.commitment()) {
                continue;
            }
            if let Some(err) = status.err {
                return Err(SdkError::TransactionRejected(format!(
                    "{} failed: {}",
                    signature, err
                )));
            }
            return Ok(Some(*signature));
        }
        Ok(None)
    }
}

#[async_trait]
impl ClusterClient for RpcCluster {
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64> {
        Ok(self
            .rpc
            .get_minimum_balance_for_rent_exemption(data_len)
            .await?)
    }

    async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> SdkResult<Signature> {
        let signers = signer_set(payer, signers);
        let mut sent = Vec::new();
        let mut attempt = 0;

        loop {
            let err = match self.submit_once(instructions, &signers, &mut sent).await {
                Ok(signature) => {
                    info!(%signature, instructions = instructions.len(), "transaction confirmed");
                    return Ok(signature);
                }
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            // a send that timed out may still have landed
            if !sent.is_empty() {
                match self.find_landed(&sent).await {
                    Ok(Some(signature)) => {
                        info!(%signature, "earlier submission landed");
                        return Ok(signature);
                    }
                    Ok(None) => {}
                    Err(status_err @ SdkError::TransactionRejected(_)) => return Err(status_err),
                    Err(status_err) => debug!("signature status check failed: {}", status_err),
                }
            }

            if attempt >= self.retry.max_retries {
                return Err(err);
            }
            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                attempt = attempt + 1,
                max_retries = self.retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                "confirmation failed, resubmitting: {}",
                err
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn get_account(&self, address: &Pubkey) -> SdkResult<Option<Account>> {
        Ok(self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?
            .value)
    }

    async fn get_token_accounts_by_mint(
        &self,
        program: &Pubkey,
        mint: &Pubkey,
    ) -> SdkResult<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                TOKEN_ACCOUNT_MINT_OFFSET,
                mint.as_ref(),
            ))]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.rpc.commitment()),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        Ok(self
            .rpc
            .get_program_accounts_with_config(program, config)
            .await?)
    }

    async fn get_balance(&self, address: &Pubkey) -> SdkResult<u64> {
        Ok(self.rpc.get_balance(address).await?)
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> SdkResult<Signature> {
        let signature = self.rpc.request_airdrop(address, lamports).await?;
        let deadline = tokio::time::Instant::now() + self.timeout;

        while tokio::time::Instant::now() < deadline {
            if self.rpc.confirm_transaction(&signature).await? {
                info!(%signature, %address, lamports, "airdrop confirmed");
                return Ok(signature);
            }
            tokio::time::sleep(AIRDROP_POLL_INTERVAL).await;
        }

        Err(SdkError::ConfirmationFailed(format!(
            "airdrop {} not confirmed within {:?}",
            signature, self.timeout
        )))
    }

    async fn current_epoch(&self) -> SdkResult<u64> {
        Ok(self.rpc.get_epoch_info().await?.epoch)
    }
}
