//! Persisted search values
//!
//! The table is a single line of comma separated `P1Hash:P2Hash;Score` records,
//! where the hashes are the canonical tile masks of both players (decimal) and the
//! score is relative to the side to move.

use log::info;
use thiserror::Error;

use std::fs;
use std::path::Path;

use crate::{bitboard::Position, canonical::CanonicalKey, transposition_table::*};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("malformed table record {index} '{record}': {reason}")]
    MalformedRecord {
        index: usize,
        record: String,
        reason: String,
    },
    #[error("failed to access table file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses a table, failing on the first malformed record
///
/// An empty blob is an empty table. Every value is loaded as a seeded entry.
pub fn parse_table(data: &str) -> Result<TranspositionTable, TableError> {
    let mut table = TranspositionTable::new();
    if data.trim().is_empty() {
        return Ok(table);
    }

    for (index, record) in data.split(',').enumerate() {
        let record = record.trim();
        let (key, score) = parse_record(record).map_err(|reason| TableError::MalformedRecord {
            index,
            record: record.to_owned(),
            reason,
        })?;
        table.set(key, Entry::seeded(score));
    }
    Ok(table)
}

fn parse_record(record: &str) -> Result<(CanonicalKey, i32), String> {
    let fields: Vec<&str> = record.split(';').collect();
    if fields.len() != 2 {
        return Err(format!("expected 'key;score', found {} fields", fields.len()));
    }
    let hashes: Vec<&str> = fields[0].split(':').collect();
    if hashes.len() != 2 {
        return Err(format!("expected 'P1Hash:P2Hash', found {} fields", hashes.len()));
    }

    let player_one_mask = hashes[0]
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("player 1 hash '{}': {}", hashes[0], err))?;
    let player_two_mask = hashes[1]
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("player 2 hash '{}': {}", hashes[1], err))?;
    let score = fields[1]
        .trim()
        .parse::<i32>()
        .map_err(|err| format!("score '{}': {}", fields[1], err))?;

    // reject masks that no game can reach
    Position::from_masks(player_one_mask, player_two_mask).map_err(|err| err.to_string())?;

    Ok((
        CanonicalKey::from_masks(player_one_mask, player_two_mask),
        score,
    ))
}

/// Writes the exact entries of a table, ordered by key
pub fn serialize_table(table: &TranspositionTable) -> String {
    let mut records: Vec<(CanonicalKey, i32)> = table
        .iter()
        .filter(|(_, entry)| entry.bound == Bound::Exact)
        .map(|(key, entry)| (*key, entry.score))
        .collect();
    records.sort_unstable();

    records
        .iter()
        .map(|(key, score)| {
            format!(
                "{}:{};{}",
                key.player_one_mask(),
                key.player_two_mask(),
                score
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn load_table<P: AsRef<Path>>(path: P) -> Result<TranspositionTable, TableError> {
    let data = fs::read_to_string(path.as_ref())?;
    let table = parse_table(&data)?;
    info!(
        "loaded {} positions from {}",
        table.len(),
        path.as_ref().display()
    );
    Ok(table)
}

pub fn save_table<P: AsRef<Path>>(path: P, table: &TranspositionTable) -> Result<(), TableError> {
    let data = serialize_table(table);
    fs::write(path.as_ref(), data)?;
    info!("saved table to {}", path.as_ref().display());
    Ok(())
}
