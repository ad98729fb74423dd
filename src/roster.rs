//! Candidate roster: the fixed set of roles and the labels allowed for each.
//!
//! The roster is loaded once at startup. A roster found inside a persisted
//! snapshot is kept only as an audit record and never replaces this one.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Elective offices on the ballot, in the order they are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Mayor,
    #[serde(rename = "Vice Mayor")]
    ViceMayor,
    Councilor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Mayor, Role::ViceMayor, Role::Councilor];

    /// Key used for this role in ballots and snapshot files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mayor => "Mayor",
            Role::ViceMayor => "Vice Mayor",
            Role::Councilor => "Councilor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(rename = "Mayor")]
    pub mayor: Vec<String>,
    #[serde(rename = "Vice Mayor")]
    pub vice_mayor: Vec<String>,
    #[serde(rename = "Councilor")]
    pub councilor: Vec<String>,
}

impl Default for Roster {
    fn default() -> Self {
        fn labels(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Roster {
            mayor: labels(&["AGDA, DAYAN (PFP)", "PICARDAL, DINDO (IND)"]),
            vice_mayor: labels(&["TIU SONCO, EMMANUEL (LAKAS)", "FRANCO, KUYA VIC OHOYY (NPC)"]),
            councilor: labels(&[
                "DAZA, ZEN (PFP)",
                "ANACTA, KATRINA (PFP)",
                "LIMBAUAN, LYRA GEL (PFP)",
                "TIU, GLAIZA (PFP)",
                "BAGACAY, TOTOY ENAT (IND)",
                "UY, FRICH BAYLON (PFP)",
                "CAINDAY, KATHLYN JANE (PFP)",
                "GALO, IAN ERVIN (IND)",
                "ARAGO, MELCHO (IND)",
                "ESCOTO, BOTOY (LAKAS)",
                "ANG, JAY ANTHONY (PFP)",
                "CAPITO, ANNABELLE (PDPLBN)",
                "APELADO, JESSIE (IND)",
                "BAGRO, CELERINO JR. (IND)",
                "ABOBO, WILFRED (IND)",
                "AFABLE, CRIS (IND)",
                "CAMPOMANES, ONINS (IND)",
            ]),
        }
    }
}

impl Roster {
    pub fn candidates(&self, role: Role) -> &[String] {
        match role {
            Role::Mayor => &self.mayor,
            Role::ViceMayor => &self.vice_mayor,
            Role::Councilor => &self.councilor,
        }
    }

    pub fn contains(&self, role: Role, label: &str) -> bool {
        self.candidates(role).iter().any(|c| c == label)
    }

    /// Every role needs at least one candidate, and labels may not be blank.
    pub fn validate(&self) -> Result<()> {
        for role in Role::ALL {
            let candidates = self.candidates(role);
            if candidates.is_empty() {
                return Err(LedgerError::Config(format!("roster has no candidates for {}", role)));
            }
            if candidates.iter().any(|c| c.trim().is_empty()) {
                return Err(LedgerError::Config(format!("roster has a blank {} label", role)));
            }
        }
        Ok(())
    }

    /// Load a roster from a JSON file shaped like `{"Mayor": [..], "Vice Mayor": [..], "Councilor": [..]}`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read roster {}: {}", path.display(), e))
        })?;
        let roster: Roster = serde_json::from_str(&contents).map_err(|e| {
            LedgerError::Config(format!("Failed to parse roster {}: {}", path.display(), e))
        })?;
        roster.validate()?;
        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_roster_is_valid() {
        let roster = Roster::default();
        assert!(roster.validate().is_ok());
        assert_eq!(roster.candidates(Role::Mayor).len(), 2);
        assert_eq!(roster.candidates(Role::Councilor).len(), 17);
        assert!(roster.contains(Role::ViceMayor, "TIU SONCO, EMMANUEL (LAKAS)"));
        assert!(!roster.contains(Role::Mayor, "TIU SONCO, EMMANUEL (LAKAS)"));
    }

    #[test]
    fn test_roster_serializes_with_ballot_keys() {
        let value = serde_json::to_value(Roster::default()).unwrap();
        assert!(value["Vice Mayor"].is_array());
        assert!(value.get("vice_mayor").is_none());
    }

    #[test]
    fn test_load_roster_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("roster.json");
        fs::write(
            &path,
            r#"{"Mayor": ["A"], "Vice Mayor": ["B"], "Councilor": ["C", "D"]}"#,
        )
        .unwrap();

        let roster = Roster::load(&path).unwrap();
        assert_eq!(roster.councilor, vec!["C".to_string(), "D".to_string()]);
    }

    #[test]
    fn test_load_rejects_empty_role() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("roster.json");
        fs::write(&path, r#"{"Mayor": [], "Vice Mayor": ["B"], "Councilor": ["C"]}"#).unwrap();

        assert!(matches!(Roster::load(&path), Err(LedgerError::Config(_))));
    }
}
