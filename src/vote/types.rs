/// Vote types for Ballotchain
use serde::{Deserialize, Serialize};

/// Placeholder written over voter ids on every public read of the chain.
pub const MASKED_VOTER_ID: &str = "*****";

/// One voter's picks. Keys match the role names used on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "Mayor")]
    pub mayor: String,
    #[serde(rename = "Vice Mayor")]
    pub vice_mayor: String,
    #[serde(rename = "Councilor", default)]
    pub councilor: Vec<String>,
}

impl Ballot {
    /// Every candidate label this ballot counts toward. A ballot contributes
    /// one count per Councilor pick, so a label may repeat across picks.
    pub fn picks(&self) -> impl Iterator<Item = &str> {
        [self.mayor.as_str(), self.vice_mayor.as_str()]
            .into_iter()
            .chain(self.councilor.iter().map(String::as_str))
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: String,
    pub candidates: Ballot,
}

impl Vote {
    pub fn new(voter_id: impl Into<String>, candidates: Ballot) -> Self {
        Vote {
            voter_id: voter_id.into(),
            candidates,
        }
    }

    /// Copy of this vote with the voter id redacted and the picks intact.
    pub fn masked(&self) -> Vote {
        Vote {
            voter_id: MASKED_VOTER_ID.to_string(),
            candidates: self.candidates.clone(),
        }
    }
}
