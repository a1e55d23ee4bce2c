#[cfg(test)]
#[path = "honey_ledger_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::models::LedgerError;

pub const STARTING_HONEY: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoneyBalance {
    pub honey: u32,
    #[serde(default)]
    pub exchanges: u32,
}

impl Default for HoneyBalance {
    fn default() -> HoneyBalance {
        return HoneyBalance {
            honey: STARTING_HONEY,
            exchanges: 0,
        };
    }
}

/// Reward currency earned by completing exchanges with the tutor.
pub struct HoneyLedger {
    file_path: path::PathBuf,
    reward_every: u32,
}

impl HoneyLedger {
    pub fn new(data_dir: &path::Path, reward_every: u32) -> HoneyLedger {
        return HoneyLedger {
            file_path: data_dir.join("honey.yaml"),
            reward_every: reward_every.max(1),
        };
    }

    pub async fn load(&self) -> Result<HoneyBalance> {
        if !self.file_path.exists() {
            return Ok(HoneyBalance::default());
        }

        let payload = fs::read_to_string(&self.file_path).await?;
        let balance: HoneyBalance = serde_yaml::from_str(&payload)?;

        return Ok(balance);
    }

    async fn save(&self, balance: &HoneyBalance) -> Result<()> {
        if let Some(dir) = self.file_path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).await?;
            }
        }

        let payload = serde_yaml::to_string(balance)?;
        let mut file = fs::File::create(&self.file_path).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(());
    }

    /// Counts a completed exchange, granting one honey every `reward_every`
    /// exchanges. Returns the updated balance.
    pub async fn record_exchange(&self) -> Result<HoneyBalance> {
        let mut balance = self.load().await?;
        balance.exchanges += 1;
        if balance.exchanges % self.reward_every == 0 {
            balance.honey += 1;
            tracing::info!(honey = balance.honey, "Honey earned");
        }

        self.save(&balance).await?;
        return Ok(balance);
    }

    pub async fn spend(&self, amount: u32) -> Result<HoneyBalance> {
        if amount < 1 {
            return Err(LedgerError::InvalidAmount(amount).into());
        }

        let mut balance = self.load().await?;
        if balance.honey < amount {
            return Err(LedgerError::Insufficient {
                amount,
                balance: balance.honey,
            }
            .into());
        }

        balance.honey -= amount;
        self.save(&balance).await?;

        return Ok(balance);
    }
}
