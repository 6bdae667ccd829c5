//! Simulation scenarios.

use serde::{Deserialize, Serialize};

/// How transfer endpoints are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Traffic {
    /// Any ordered pair of distinct accounts.
    Uniform,
    /// Only the first two accounts, in both directions.
    Hotspot,
}

/// A fault planted in the store before traffic starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultPlan {
    /// Every balance update on the account at this index fails.
    UpdateFailure { account_index: usize },
}

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Endpoint selection.
    pub traffic: Traffic,
    /// Faults active for the whole run.
    pub faults: Vec<FaultPlan>,
}

impl Scenario {
    /// Names accepted by [`Scenario::load`].
    pub const NAMES: [&'static str; 3] = ["random-load", "contention", "faulty-credit"];

    /// Load a scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "random-load" => Ok(Self::random_load()),
            "contention" => Ok(Self::contention()),
            "faulty-credit" => Ok(Self::faulty_credit()),
            _ => Err(anyhow::anyhow!(
                "Unknown scenario: {} (expected one of {})",
                name,
                Self::NAMES.join(", ")
            )),
        }
    }

    /// Random transfers across all accounts.
    fn random_load() -> Self {
        Self {
            name: "random-load".to_string(),
            description: "Concurrent random transfers between all accounts".to_string(),
            traffic: Traffic::Uniform,
            faults: Vec::new(),
        }
    }

    /// All traffic on two accounts.
    fn contention() -> Self {
        Self {
            name: "contention".to_string(),
            description: "Concurrent transfers racing on the same two balances".to_string(),
            traffic: Traffic::Hotspot,
            faults: Vec::new(),
        }
    }

    /// Random transfers with one account refusing balance updates.
    fn faulty_credit() -> Self {
        Self {
            name: "faulty-credit".to_string(),
            description: "Transfers touching a failing account must leave no trace".to_string(),
            traffic: Traffic::Uniform,
            faults: vec![FaultPlan::UpdateFailure { account_index: 1 }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_known_scenarios() {
        for name in Scenario::NAMES {
            let scenario = Scenario::load(name).unwrap();
            assert_eq!(scenario.name, name);
        }
        assert_eq!(Scenario::load("contention").unwrap().traffic, Traffic::Hotspot);
        assert_eq!(Scenario::load("faulty-credit").unwrap().faults.len(), 1);
    }

    #[test]
    fn test_unknown_scenario() {
        assert!(Scenario::load("simple-settlement").is_err());
    }
}
