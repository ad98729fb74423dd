//! Vote tallies over mined blocks and pending votes.
//!
//! Every Mayor, Vice Mayor and Councilor pick counts once toward its
//! candidate. Pending (unmined) votes are included, so results are live.

use crate::blockchain::{Block, Blockchain, UnitMap};
use crate::vote::Vote;
use std::collections::BTreeMap;

/// Candidate label to number of picks. Candidates with no picks are absent.
pub type Tally = BTreeMap<String, u64>;

fn count_into(tally: &mut Tally, votes: &[Vote]) {
    for vote in votes {
        for name in vote.candidates.picks() {
            *tally.entry(name.to_string()).or_insert(0) += 1;
        }
    }
}

pub fn tally_overall(blocks: &[Block], pending: &UnitMap<Vec<Vote>>) -> Tally {
    let mut tally = Tally::new();
    for block in blocks {
        count_into(&mut tally, &block.votes);
    }
    for (_, votes) in pending.iter() {
        count_into(&mut tally, votes);
    }
    tally
}

pub fn tally_by_barangay(blocks: &[Block], pending: &UnitMap<Vec<Vote>>) -> BTreeMap<String, Tally> {
    let mut by_barangay: BTreeMap<String, Tally> = BTreeMap::new();
    for block in blocks {
        if block.votes.is_empty() {
            continue;
        }
        count_into(by_barangay.entry(block.barangay.clone()).or_default(), &block.votes);
    }
    for (barangay, votes) in pending.iter() {
        if votes.is_empty() {
            continue;
        }
        count_into(by_barangay.entry(barangay.to_string()).or_default(), votes);
    }
    by_barangay
}

impl Blockchain {
    pub fn tally_overall(&self) -> Tally {
        tally_overall(&self.blocks, &self.state.pending)
    }

    pub fn tally_by_barangay(&self) -> BTreeMap<String, Tally> {
        tally_by_barangay(&self.blocks, &self.state.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Roster;
    use serde_json::json;

    fn submit(chain: &mut Blockchain, voter: &str, barangay: &str, mayor: &str, councilors: &[&str]) {
        chain
            .submit_vote(
                voter,
                &json!({
                    "Mayor": mayor,
                    "Vice Mayor": "TIU SONCO, EMMANUEL (LAKAS)",
                    "Councilor": councilors
                }),
                barangay,
            )
            .unwrap();
    }

    #[test]
    fn test_empty_ledger_has_empty_tallies() {
        let chain = Blockchain::new(Roster::default());
        assert!(chain.tally_overall().is_empty());
        assert!(chain.tally_by_barangay().is_empty());
    }

    #[test]
    fn test_counts_mined_and_pending() {
        let mut chain = Blockchain::new(Roster::default());
        submit(&mut chain, "V1", "Brgy1", "AGDA, DAYAN (PFP)", &["DAZA, ZEN (PFP)", "TIU, GLAIZA (PFP)"]);
        chain.mine("Brgy1").unwrap();
        submit(&mut chain, "V2", "Brgy2", "PICARDAL, DINDO (IND)", &["DAZA, ZEN (PFP)"]);

        let overall = chain.tally_overall();
        assert_eq!(overall["AGDA, DAYAN (PFP)"], 1);
        assert_eq!(overall["PICARDAL, DINDO (IND)"], 1);
        assert_eq!(overall["TIU SONCO, EMMANUEL (LAKAS)"], 2);
        assert_eq!(overall["DAZA, ZEN (PFP)"], 2);
        assert!(!overall.contains_key("GALO, IAN ERVIN (IND)"));

        let by_barangay = chain.tally_by_barangay();
        assert_eq!(by_barangay["Brgy1"]["TIU, GLAIZA (PFP)"], 1);
        assert_eq!(by_barangay["Brgy2"]["DAZA, ZEN (PFP)"], 1);
        assert!(!by_barangay["Brgy2"].contains_key("AGDA, DAYAN (PFP)"));
    }

    #[test]
    fn test_overall_is_sum_of_barangays() {
        let mut chain = Blockchain::new(Roster::default());
        submit(&mut chain, "V1", "Brgy1", "AGDA, DAYAN (PFP)", &["DAZA, ZEN (PFP)"]);
        submit(&mut chain, "V2", "Brgy1", "PICARDAL, DINDO (IND)", &[]);
        submit(&mut chain, "V3", "Brgy2", "AGDA, DAYAN (PFP)", &["DAZA, ZEN (PFP)", "ANG, JAY ANTHONY (PFP)"]);
        chain.mine("Brgy2").unwrap();
        submit(&mut chain, "V4", "Brgy3", "AGDA, DAYAN (PFP)", &["ANG, JAY ANTHONY (PFP)"]);

        let mut summed = Tally::new();
        for tally in chain.tally_by_barangay().values() {
            for (name, count) in tally {
                *summed.entry(name.clone()).or_insert(0) += count;
            }
        }
        assert_eq!(summed, chain.tally_overall());
    }
}
