use crate::prelude::*;

/// A token account holding a non-zero withheld fee
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithheldAccount {
    pub address: Pubkey,
    pub owner: Pubkey,
    pub withheld_amount: u64,
}

/// The three ways withheld fees leave their current location
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    /// Token accounts -> destination, signed by the withdraw authority
    WithdrawFromAccounts,
    /// Token accounts -> mint pool, permissionless
    HarvestToMint,
    /// Mint pool -> destination, signed by the withdraw authority
    WithdrawFromMint,
}

impl CollectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            CollectionKind::WithdrawFromAccounts => "withdraw-from-accounts",
            CollectionKind::HarvestToMint => "harvest-to-mint",
            CollectionKind::WithdrawFromMint => "withdraw-from-mint",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Withheld fees for one mint at a point in time
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithheldSnapshot {
    pub accounts: Vec<WithheldAccount>,
    pub mint_pool: u64,
}

impl WithheldSnapshot {
    /// Accounts plus mint pool, without overflow
    pub fn total(&self) -> u128 {
        self.accounts
            .iter()
            .map(|a| u128::from(a.withheld_amount))
            .sum::<u128>()
            + u128::from(self.mint_pool)
    }
}

/// Which collection path a cycle takes
///
/// `Withdraw` moves account fees straight to the destination. `Harvest`
/// moves them into the mint pool first, then drains the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionPath {
    #[default]
    Withdraw,
    Harvest,
}

impl std::str::FromStr for CollectionPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "withdraw" => Ok(CollectionPath::Withdraw),
            "harvest" => Ok(CollectionPath::Harvest),
            other => Err(format!("unknown collection path '{}', expected withdraw or harvest", other)),
        }
    }
}
