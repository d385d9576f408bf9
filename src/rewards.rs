use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Sentinel recorded for a day whose goal was reached after every card was
/// already owned. Distinct from any real filename in the pool.
pub const ALL_COLLECTED: &str = "All cards collected";

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "gif", "jpg", "jpeg", "bmp", "webp"];

/// Outcome of asking the ledger for today's award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Award {
    /// Today already has an entry; re-triggering never re-rolls.
    AlreadyAwarded(String),
    /// A new card was unlocked.
    Unlocked(String),
    /// Pool exhausted; the sentinel was recorded for today.
    AllCollected,
    /// No cards exist at all. Nothing is recorded.
    EmptyPool,
}

/// Unlock state machine: one card per calendar day the goal is first
/// reached, never the same card twice, never two awards for one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardLedger {
    unlocked: BTreeSet<String>,
    awarded_dates: BTreeMap<String, String>,
}

impl RewardLedger {
    pub fn new(unlocked: BTreeSet<String>, awarded_dates: BTreeMap<String, String>) -> Self {
        Self {
            unlocked,
            awarded_dates,
        }
    }

    pub fn unlocked(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    pub fn awarded_dates(&self) -> &BTreeMap<String, String> {
        &self.awarded_dates
    }

    pub fn awarded_for(&self, day_key: &str) -> Option<&str> {
        self.awarded_dates.get(day_key).map(String::as_str)
    }

    /// Cards owned that still exist in the pool (pool contents may change
    /// under us; missing files just stop counting).
    pub fn owned_count(&self, pool: &[String]) -> usize {
        pool.iter().filter(|name| self.unlocked.contains(*name)).count()
    }

    /// Issue the award for one goal-reaching day. Idempotent per day: an
    /// existing entry is returned unchanged, including the sentinel.
    pub fn award(&mut self, day_key: &str, pool: &[String], rng: &mut impl Rng) -> Award {
        if let Some(existing) = self.awarded_dates.get(day_key) {
            return Award::AlreadyAwarded(existing.clone());
        }
        if pool.is_empty() {
            return Award::EmptyPool;
        }

        let remaining: Vec<&String> = pool
            .iter()
            .filter(|name| !self.unlocked.contains(*name))
            .collect();
        if remaining.is_empty() {
            self.awarded_dates
                .insert(day_key.to_string(), ALL_COLLECTED.to_string());
            return Award::AllCollected;
        }

        let picked = remaining[rng.gen_range(0..remaining.len())].clone();
        self.unlocked.insert(picked.clone());
        self.awarded_dates.insert(day_key.to_string(), picked.clone());
        Award::Unlocked(picked)
    }
}

/// Discover the reward pool: image-like filenames in the card directory,
/// sorted. An unreadable directory reads as an empty pool.
pub fn scan_pool(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    names.sort();
    names
}
