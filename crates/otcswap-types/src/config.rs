//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{Amount, PartyId, Result, SwapError, constants};

/// Parameters governing collateral, fees and dispute penalties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The only identity allowed to withdraw accrued fees.
    pub owner: PartyId,
    /// Seller collateral as a percentage of the total sale value.
    #[serde(default = "default_collateral_percent")]
    pub collateral_percent: u8,
    /// `fee = amount * multiplier / fee_divisor`.
    #[serde(default = "default_fee_divisor")]
    pub fee_divisor: u128,
    /// Fee multiplier for back-outs of disputed offers.
    #[serde(default = "default_dispute_multiplier")]
    pub dispute_multiplier: u128,
}

fn default_collateral_percent() -> u8 {
    constants::DEFAULT_COLLATERAL_PERCENT
}

fn default_fee_divisor() -> u128 {
    constants::DEFAULT_FEE_DIVISOR
}

fn default_dispute_multiplier() -> u128 {
    constants::DEFAULT_DISPUTE_MULTIPLIER
}

impl EngineConfig {
    /// Canonical parameters (25% collateral, 1% fee, 5x dispute penalty).
    #[must_use]
    pub fn with_owner(owner: PartyId) -> Self {
        Self {
            owner,
            collateral_percent: constants::DEFAULT_COLLATERAL_PERCENT,
            fee_divisor: constants::DEFAULT_FEE_DIVISOR,
            dispute_multiplier: constants::DEFAULT_DISPUTE_MULTIPLIER,
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns [`SwapError::Configuration`] for out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        if self.owner.is_nil() {
            return Err(SwapError::Configuration("owner must not be nil".into()));
        }
        if !(1..=100).contains(&self.collateral_percent) {
            return Err(SwapError::Configuration(format!(
                "collateral_percent {} outside 1..=100",
                self.collateral_percent
            )));
        }
        if self.fee_divisor == 0 {
            return Err(SwapError::Configuration("fee_divisor must be positive".into()));
        }
        if self.dispute_multiplier == 0 {
            return Err(SwapError::Configuration("dispute_multiplier must be >= 1".into()));
        }
        Ok(())
    }

    /// Collateral owed for a lot priced at `total_sale_value`.
    ///
    /// # Errors
    /// Returns [`SwapError::Overflow`] if the multiplication overflows.
    pub fn collateral_for(&self, total_sale_value: Amount) -> Result<Amount> {
        total_sale_value
            .checked_mul(Amount::from(self.collateral_percent))
            .map(|v| v / 100)
            .ok_or_else(|| SwapError::Overflow(format!("collateral for {total_sale_value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_defaults() {
        let cfg = EngineConfig::with_owner(PartyId::new());
        assert_eq!(cfg.collateral_percent, 25);
        assert_eq!(cfg.fee_divisor, 100);
        assert_eq!(cfg.dispute_multiplier, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn collateral_is_quarter_of_value() {
        let cfg = EngineConfig::with_owner(PartyId::new());
        assert_eq!(cfg.collateral_for(10_000).unwrap(), 2_500);
        assert_eq!(cfg.collateral_for(3).unwrap(), 0);
        assert!(matches!(cfg.collateral_for(u128::MAX), Err(SwapError::Overflow(_))));
    }

    #[test]
    fn from_json_fills_defaults() {
        let owner = PartyId::new();
        let json = format!(r#"{{"owner":"{owner}"}}"#);
        let cfg = EngineConfig::from_json(&json).unwrap();
        assert_eq!(cfg, EngineConfig::with_owner(owner));
    }

    #[test]
    fn from_json_rejects_bad_values() {
        let owner = PartyId::new();
        let json = format!(r#"{{"owner":"{owner}","fee_divisor":0}}"#);
        assert!(matches!(
            EngineConfig::from_json(&json),
            Err(SwapError::Configuration(_))
        ));

        let json = format!(r#"{{"owner":"{owner}","collateral_percent":101}}"#);
        assert!(EngineConfig::from_json(&json).is_err());

        let json = format!(r#"{{"owner":"{}"}}"#, PartyId::nil());
        assert!(EngineConfig::from_json(&json).is_err());

        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(SwapError::Serialization(_))
        ));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = EngineConfig::with_owner(PartyId::new());
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
