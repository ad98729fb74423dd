//! Error types for Ballotchain

use thiserror::Error;

use crate::roster::Role;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid payload")]
    InvalidPayload,
    #[error("Voting closed for {0}")]
    VotingClosed(String),
    #[error("Voter {voter_id} already voted in {voted_in}, cannot vote in {barangay}")]
    CrossBarangayVoter {
        voter_id: String,
        voted_in: String,
        barangay: String,
    },
    #[error("Voter {voter_id} already voted in {barangay}")]
    DuplicateVoter { voter_id: String, barangay: String },
    #[error("Missing role: {0}")]
    MissingRole(Role),
    #[error("Invalid {role} candidate: {candidate}")]
    InvalidCandidate { role: Role, candidate: String },
    #[error("Councilor must be a list")]
    CouncilorNotList,
    #[error("Invalid Councilor: {0}")]
    InvalidCouncilor(String),
    #[error("Barangay {0} already mined.")]
    AlreadyMined(String),
    #[error("No pending votes for {0}")]
    NoPendingVotes(String),
    #[error("No pending votes to mine")]
    NothingToMine,
    #[error("Invalid chain: {0}")]
    InvalidChain(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Rejections are caller mistakes; everything else is an operational failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            LedgerError::Io(_) | LedgerError::Serialization(_) | LedgerError::Config(_)
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(LedgerError::InvalidPayload.to_string(), "Invalid payload");
        assert_eq!(
            LedgerError::MissingRole(Role::ViceMayor).to_string(),
            "Missing role: Vice Mayor"
        );
        assert_eq!(
            LedgerError::InvalidCandidate {
                role: Role::Mayor,
                candidate: "NOBODY".to_string()
            }
            .to_string(),
            "Invalid Mayor candidate: NOBODY"
        );
        assert_eq!(
            LedgerError::AlreadyMined("Brgy1".to_string()).to_string(),
            "Barangay Brgy1 already mined."
        );
    }

    #[test]
    fn test_io_errors_are_not_rejections() {
        let err: LedgerError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(!err.is_rejection());
        assert!(LedgerError::NothingToMine.is_rejection());
    }
}
