use crate::prelude::*;

/// Token-2022 program ID
pub fn token_program_id() -> Pubkey {
    spl_token_2022::id()
}

/// Cluster endpoints
pub mod endpoints {
    pub const LOCALNET_RPC: &str = "http://localhost:8899";
    pub const DEVNET_RPC: &str = "https://api.devnet.solana.com";
    pub const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
    pub const EXPLORER: &str = "https://explorer.solana.com";
}

/// Byte offset of the mint field in a token account
pub const TOKEN_ACCOUNT_MINT_OFFSET: usize = 0;

/// Source accounts per withdraw/harvest transaction
///
/// Each source is a 32-byte key in the message; 20 keeps a single
/// transaction well inside the packet limit alongside mint, destination and
/// authority.
pub const DEFAULT_SOURCES_PER_TRANSACTION: usize = 20;

/// Lamports requested per airdrop
pub const DEFAULT_AIRDROP_LAMPORTS: u64 = solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Balance below which the payer is topped up
pub const DEFAULT_MIN_BALANCE_LAMPORTS: u64 = solana_sdk::native_token::LAMPORTS_PER_SOL;
