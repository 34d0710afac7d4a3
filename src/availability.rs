//! # Availability Index Module
//!
//! Read-only snapshot of what the known stores stock, with seasonality.
//! Built once per planning run from availability records and queried by the
//! scoring engine (availability and seasonality fits) and the shopping
//! split (store assignment).
//!
//! Lookup resolution is layered: direct normalized-name match, then synonym
//! match, then fuzzy bigram match above a 0.8 similarity threshold. Unknown
//! names are treated as year-round staples rather than penalised.

use log::trace;
use std::collections::BTreeMap;

use crate::model::{AvailabilityRecord, Store};
use crate::normalize::{bigram_similarity, normalize_name};

/// Minimum bigram similarity for a fuzzy product match
const FUZZY_THRESHOLD: f64 = 0.8;

/// Read-only product availability snapshot
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    /// Primary product name to record
    records: BTreeMap<String, AvailabilityRecord>,
    /// Synonym to primary product name
    synonyms: BTreeMap<String, String>,
}

impl AvailabilityIndex {
    /// Build an index from availability records
    ///
    /// Names and synonyms are normalized on entry so lookups match recipe
    /// ingredient names. Later records win on duplicate names.
    pub fn new(records: Vec<AvailabilityRecord>) -> Self {
        let mut index = Self::default();
        for mut record in records {
            record.name = normalize_name(&record.name);
            for synonym in &record.synonyms {
                index
                    .synonyms
                    .insert(normalize_name(synonym), record.name.clone());
            }
            index.records.insert(record.name.clone(), record);
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve an ingredient name to a known product record
    ///
    /// Resolution order: direct match, synonym match, fuzzy bigram match
    /// (highest similarity wins, ties broken by lexicographically smallest
    /// product name). Returns None for unknown names.
    pub fn lookup(&self, name: &str) -> Option<&AvailabilityRecord> {
        let name = normalize_name(name);

        if let Some(record) = self.records.get(&name) {
            return Some(record);
        }
        if let Some(primary) = self.synonyms.get(&name) {
            return self.records.get(primary);
        }

        let mut best: Option<(f64, &str)> = None;
        for candidate in self.records.keys() {
            let similarity = bigram_similarity(&name, candidate);
            if similarity < FUZZY_THRESHOLD {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_sim, best_name)) => {
                    similarity > best_sim
                        || (similarity == best_sim && candidate.as_str() < best_name)
                }
            };
            if better {
                best = Some((similarity, candidate));
            }
        }
        if let Some((similarity, matched)) = best {
            trace!("Fuzzy availability match: '{name}' -> '{matched}' ({similarity:.2})");
            return self.records.get(matched);
        }
        None
    }

    /// Whether an ingredient can be bought right now
    ///
    /// Unknown names are assumed to be year-round staples. Known products
    /// are obtainable iff they are in season.
    pub fn obtainable(&self, name: &str) -> bool {
        match self.lookup(name) {
            Some(record) => record.in_season,
            None => true,
        }
    }

    /// Store carrying the product, None for unknown names
    pub fn store_for(&self, name: &str) -> Option<Store> {
        self.lookup(name).map(|r| r.store)
    }
}
