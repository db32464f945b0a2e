//! Session settings and their TOML persistence.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Top-level configuration stored in `nexmile.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Annotations written into CMR log entries.
    pub cmr: CmrCfg,
    /// Invoice numbering and payment terms.
    pub billing: BillingCfg,
    pub session: SessionCfg,
}

/// Values recorded against each CMR transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmrCfg {
    /// File name noted when a scan is uploaded.
    pub upload_file: String,
    /// Address noted when the document is emailed to the client.
    pub notify_address: String,
    /// Note recorded when the client confirms.
    pub confirmation_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCfg {
    /// Leading segment of generated invoice ids.
    pub invoice_prefix: String,
    /// Payment term noted when an invoice goes out for payment.
    pub payment_term_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCfg {
    /// Author name on activity items created by the user.
    pub author: String,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Self::from_toml_str(&s)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl Default for CmrCfg {
    fn default() -> Self {
        Self {
            upload_file: "cmr_2405.pdf".into(),
            notify_address: "logistics@rossi.it".into(),
            confirmation_note: "Signed by client".into(),
        }
    }
}

impl Default for BillingCfg {
    fn default() -> Self {
        Self {
            invoice_prefix: "INV".into(),
            payment_term_days: 30,
        }
    }
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self { author: "Me".into() }
    }
}
