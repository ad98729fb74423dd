use crate::crypto::canonical_hash;
use crate::error::{LedgerError, Result};
use crate::persistence::{ExportSnapshot, InMemoryPersistence, LedgerSnapshot, Persistence};
use crate::roster::Roster;
use crate::vote::{validate_ballot, Vote};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::state::{LedgerState, UnitMap};
use super::validation::verify_chain;

/// `previous_hash` of the first block in the chain.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

pub const VOTE_RECORDED: &str = "Vote recorded successfully";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since the Unix epoch, with sub-second precision.
    pub timestamp: f64,
    pub barangay: String,
    pub votes: Vec<Vote>,
    pub previous_hash: String,
    pub hash: String,
}

/// The hashed fields of a block: everything except `hash`.
#[derive(Serialize)]
struct BlockContents<'a> {
    index: u64,
    timestamp: f64,
    barangay: &'a str,
    votes: &'a [Vote],
    previous_hash: &'a str,
}

impl Block {
    pub fn new(index: u64, barangay: &str, votes: Vec<Vote>, previous_hash: &str) -> Result<Self> {
        let timestamp = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        Self::with_timestamp(index, timestamp, barangay, votes, previous_hash)
    }

    pub fn with_timestamp(
        index: u64,
        timestamp: f64,
        barangay: &str,
        votes: Vec<Vote>,
        previous_hash: &str,
    ) -> Result<Self> {
        let mut block = Block {
            index,
            timestamp,
            barangay: barangay.to_string(),
            votes,
            previous_hash: previous_hash.to_string(),
            hash: String::new(),
        };
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    /// Recompute the hash from the block's own fields.
    pub fn calculate_hash(&self) -> Result<String> {
        canonical_hash(&BlockContents {
            index: self.index,
            timestamp: self.timestamp,
            barangay: &self.barangay,
            votes: &self.votes,
            previous_hash: &self.previous_hash,
        })
    }

    /// Copy of the block with every voter id redacted. The stored hash is
    /// kept as-is, so a masked block does not verify on its own.
    pub fn masked(&self) -> Block {
        Block {
            votes: self.votes.iter().map(Vote::masked).collect(),
            ..self.clone()
        }
    }
}

/// The ledger store: the chain plus pending votes, voter registry and the set
/// of closed barangays. Every mutation is written through `persistence`
/// before it becomes visible in memory.
pub struct Blockchain {
    pub blocks: Vec<Block>,
    pub state: LedgerState,
    pub roster: Roster,
    pub persistence: Box<dyn Persistence>,
}

impl Blockchain {
    /// Create an empty ledger backed by in-memory persistence.
    pub fn new(roster: Roster) -> Self {
        Blockchain {
            blocks: Vec::new(),
            state: LedgerState::new(),
            roster,
            persistence: Box::new(InMemoryPersistence::new()),
        }
    }

    /// Open the ledger stored in `persistence`.
    ///
    /// A missing snapshot starts an empty ledger. An unreadable one is
    /// discarded and replaced by an empty ledger; in both cases the fresh
    /// state is written back immediately.
    pub fn open(roster: Roster, persistence: Box<dyn Persistence>) -> Result<Self> {
        let snapshot = match persistence.load_snapshot() {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                tracing::info!("no ledger snapshot found, starting empty");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "ledger snapshot unreadable, discarding it and starting empty");
                None
            }
        };

        let mut blockchain = Blockchain {
            blocks: Vec::new(),
            state: LedgerState::new(),
            roster,
            persistence,
        };

        match snapshot {
            Some(snapshot) => blockchain.restore(snapshot),
            None => blockchain.persist()?,
        }

        Ok(blockchain)
    }

    fn restore(&mut self, snapshot: LedgerSnapshot) {
        if let Some(recorded) = &snapshot.allowed_candidates {
            if recorded != &self.roster {
                tracing::warn!("snapshot roster differs from the configured roster; keeping the configured one");
            }
        }

        self.blocks = snapshot.chain;
        self.state = LedgerState {
            pending: snapshot.current_votes_by_barangay,
            voters: snapshot
                .voters_by_barangay
                .into_iter()
                .map(|(barangay, ids)| (barangay, ids.into_iter().collect()))
                .collect(),
            mined: snapshot.mined_barangays.into_iter().collect(),
        };

        if let Err(e) = verify_chain(&self.blocks) {
            tracing::warn!(error = %e, "restored chain failed integrity check");
        }

        tracing::info!(
            blocks = self.blocks.len(),
            mined = self.state.mined.len(),
            "ledger restored from snapshot"
        );
    }

    /// Validate and record one vote. See [`validate_ballot`] for the ballot checks;
    /// the payload, closed-barangay and voter-registry checks run before it.
    pub fn submit_vote(&mut self, voter_id: &str, candidates: &Value, barangay: &str) -> Result<String> {
        let voter_id = voter_id.trim();
        let barangay = barangay.trim();
        let selection = match candidates.as_object() {
            Some(selection) if !voter_id.is_empty() && !barangay.is_empty() => selection,
            _ => return Err(LedgerError::InvalidPayload),
        };

        if self.state.is_mined(barangay) {
            return Err(LedgerError::VotingClosed(barangay.to_string()));
        }

        match self.state.registered_barangay(voter_id) {
            Some(voted_in) if voted_in != barangay => {
                return Err(LedgerError::CrossBarangayVoter {
                    voter_id: voter_id.to_string(),
                    voted_in: voted_in.to_string(),
                    barangay: barangay.to_string(),
                });
            }
            Some(_) => {
                return Err(LedgerError::DuplicateVoter {
                    voter_id: voter_id.to_string(),
                    barangay: barangay.to_string(),
                });
            }
            None => {}
        }

        let ballot = validate_ballot(selection, &self.roster)?;

        let mut next = self.state.clone();
        next.record_vote(barangay, Vote::new(voter_id, ballot));
        self.commit(Vec::new(), next)?;

        tracing::info!(barangay = %barangay, pending = self.state.pending_for(barangay).len(), "vote recorded");
        Ok(VOTE_RECORDED.to_string())
    }

    /// Seal one barangay's pending votes into a new block and close it.
    pub fn mine(&mut self, barangay: &str) -> Result<Block> {
        let barangay = barangay.trim();
        if self.state.is_mined(barangay) {
            return Err(LedgerError::AlreadyMined(barangay.to_string()));
        }
        if self.state.pending_for(barangay).is_empty() {
            return Err(LedgerError::NoPendingVotes(barangay.to_string()));
        }

        let mut next = self.state.clone();
        let block = Self::seal_block(&mut next, barangay, self.next_index(), self.last_hash())?;
        self.commit(vec![block.clone()], next)?;

        tracing::info!(index = block.index, barangay = %barangay, votes = block.votes.len(), hash = %block.hash, "block mined");
        Ok(block)
    }

    /// Mine every barangay holding pending votes, in the order they first
    /// received a vote. The batch is written as a single snapshot.
    pub fn mine_all(&mut self) -> Result<Vec<Block>> {
        let mut next = self.state.clone();
        let mut created: Vec<Block> = Vec::new();
        let mut previous_hash = self.last_hash().to_string();
        let mut index = self.next_index();

        for barangay in self.state.barangays_with_pending() {
            if next.is_mined(&barangay) {
                continue;
            }
            let block = Self::seal_block(&mut next, &barangay, index, &previous_hash)?;
            previous_hash = block.hash.clone();
            index += 1;
            created.push(block);
        }

        if created.is_empty() {
            return Err(LedgerError::NothingToMine);
        }

        self.commit(created.clone(), next)?;
        tracing::info!(blocks = created.len(), height = self.blocks.len(), "mined all pending barangays");
        Ok(created)
    }

    fn seal_block(state: &mut LedgerState, barangay: &str, index: u64, previous_hash: &str) -> Result<Block> {
        let votes = state.seal(barangay);
        Block::new(index, barangay, votes, previous_hash)
    }

    /// Swap in `next` and append `new_blocks`, but only if the resulting
    /// snapshot is written successfully. On failure memory is left untouched.
    fn commit(&mut self, new_blocks: Vec<Block>, next: LedgerState) -> Result<()> {
        let base_len = self.blocks.len();
        self.blocks.extend(new_blocks);
        let previous = std::mem::replace(&mut self.state, next);

        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "failed to persist ledger, rolling back");
            self.blocks.truncate(base_len);
            self.state = previous;
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.persistence.save_snapshot(&self.snapshot())
    }

    fn next_index(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }

    pub fn last_hash(&self) -> &str {
        self.blocks
            .last()
            .map(|b| b.hash.as_str())
            .unwrap_or(GENESIS_PREVIOUS_HASH)
    }

    /// The chain with every voter id redacted.
    pub fn masked_chain(&self) -> Vec<Block> {
        self.blocks.iter().map(Block::masked).collect()
    }

    /// Pending votes per barangay, voter ids included.
    pub fn pending_snapshot(&self) -> &UnitMap<Vec<Vote>> {
        &self.state.pending
    }

    /// Masked blocks grouped by barangay.
    pub fn mined_by_barangay(&self) -> BTreeMap<String, Vec<Block>> {
        let mut grouped: BTreeMap<String, Vec<Block>> = BTreeMap::new();
        for block in &self.blocks {
            grouped.entry(block.barangay.clone()).or_default().push(block.masked());
        }
        grouped
    }

    pub fn verify(&self) -> Result<()> {
        verify_chain(&self.blocks)
    }

    /// Full state as written to the data file.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            chain: self.blocks.clone(),
            current_votes_by_barangay: self.state.pending.clone(),
            voters_by_barangay: self.voters_as_lists(),
            mined_barangays: self.state.mined.iter().cloned().collect(),
            allowed_candidates: Some(self.roster.clone()),
        }
    }

    /// Full unredacted state for the export download.
    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            chain: self.blocks.clone(),
            pending: self.state.pending.clone(),
            voters_by_barangay: self.voters_as_lists(),
            mined_barangays: self.state.mined.iter().cloned().collect(),
            allowed_candidates: self.roster.clone(),
        }
    }

    fn voters_as_lists(&self) -> BTreeMap<String, Vec<String>> {
        self.state
            .voters
            .iter()
            .map(|(barangay, ids)| (barangay.clone(), ids.iter().cloned().collect()))
            .collect()
    }
}
