use crate::error::{LedgerError, Result};

use super::chain::{Block, GENESIS_PREVIOUS_HASH};

/// Walk the chain and check that indexes count up from 1, each block links
/// to its predecessor's hash (the first one to the genesis sentinel), and
/// every stored hash matches a recomputation from the block's fields.
pub fn verify_chain(blocks: &[Block]) -> Result<()> {
    let mut expected_previous = GENESIS_PREVIOUS_HASH;

    for (position, block) in blocks.iter().enumerate() {
        let expected_index = position as u64 + 1;
        if block.index != expected_index {
            return Err(LedgerError::InvalidChain(format!(
                "Invalid block index. Expected {}, but got {}.",
                expected_index, block.index
            )));
        }

        if block.previous_hash != expected_previous {
            return Err(LedgerError::InvalidChain(format!(
                "Invalid previous block hash at index {}. Expected {}, but got {}.",
                block.index, expected_previous, block.previous_hash
            )));
        }

        let recomputed = block.calculate_hash()?;
        if recomputed != block.hash {
            return Err(LedgerError::InvalidChain(format!(
                "Hash mismatch at index {}. Expected {}, but got {}.",
                block.index, recomputed, block.hash
            )));
        }

        expected_previous = block.hash.as_str();
    }

    Ok(())
}
