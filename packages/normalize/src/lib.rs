#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Free-text ward name resolution against the canonical ward list.
//!
//! Independent data sources spell the same ward half a dozen ways
//! ("INDIRANAGAR WARD", "Indira Nagar", "indiranagar-80"). The
//! [`WardNormalizer`] maps each raw spelling onto the canonical list with
//! a tiered strategy, first hit wins:
//!
//! 1. manual override — exact raw-string lookup
//! 2. exact match after normalization
//! 3. unambiguous substring match
//! 4. Levenshtein similarity above [`FUZZY_MATCH_THRESHOLD`]
//!
//! Unresolved names are recorded once for diagnostics and excluded from
//! aggregation; a ward nobody can spell simply does not appear.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;

/// Minimum normalized Levenshtein similarity for a fuzzy match. Policy
/// constant, tunable.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.85;

/// Strips the standalone word "ward" in any case.
static WARD_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bward\b").expect("valid regex"));

/// Strips everything that is not a lowercase letter, digit, or space.
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]+").expect("valid regex"));

/// Collapses whitespace runs.
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes a ward name for comparison.
///
/// The pipeline: lowercase, drop the standalone word "ward", strip
/// non-alphanumerics, collapse whitespace, trim. Applied symmetrically
/// to canonical names and incoming raw names.
#[must_use]
pub fn normalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let no_ward = WARD_WORD_RE.replace_all(&lower, "");
    let alnum = NON_ALNUM_RE.replace_all(&no_ward, "");
    WHITESPACE_RE.replace_all(&alnum, " ").trim().to_owned()
}

/// Normalized edit-distance similarity in `[0, 1]`.
#[allow(clippy::cast_precision_loss)]
fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - strsim::levenshtein(a, b) as f64 / max_len as f64
}

/// Resolves free-text ward names to canonical ward names.
///
/// Built once per aggregation cycle from the canonical ward list plus an
/// optional manual override table keyed by exact raw string. Resolution
/// is deterministic for a fixed canonical set.
#[derive(Debug)]
pub struct WardNormalizer {
    /// `(normalized, canonical)` pairs, in canonical-list order.
    canonical: Vec<(String, String)>,
    /// Normalized name → canonical name, for the exact tier.
    by_normalized: BTreeMap<String, String>,
    /// Exact raw string → canonical name.
    manual: BTreeMap<String, String>,
    /// Raw names that failed every tier, deduplicated.
    unmapped: Mutex<BTreeSet<String>>,
}

impl WardNormalizer {
    /// Builds a normalizer over the given canonical names and manual
    /// override table.
    #[must_use]
    pub fn new(canonical_names: &[String], manual: BTreeMap<String, String>) -> Self {
        let canonical: Vec<(String, String)> = canonical_names
            .iter()
            .map(|name| (normalize(name), name.clone()))
            .collect();
        let by_normalized = canonical
            .iter()
            .map(|(normalized, name)| (normalized.clone(), name.clone()))
            .collect();
        Self {
            canonical,
            by_normalized,
            manual,
            unmapped: Mutex::new(BTreeSet::new()),
        }
    }

    /// Resolves a raw ward name to a canonical name, or `None` if no
    /// tier produces a confident match.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }

        // Tier 1: manual override on the exact raw string.
        if let Some(canonical) = self.manual.get(raw) {
            return Some(canonical.clone());
        }

        let norm = normalize(raw);

        // Tier 2: exact match after normalization.
        if let Some(canonical) = self.by_normalized.get(&norm) {
            return Some(canonical.clone());
        }

        // Tier 3: substring containment, either direction. Accepted only
        // when exactly one canonical name qualifies; two or more is
        // ambiguous and falls through.
        if !norm.is_empty() {
            let mut matches = self
                .canonical
                .iter()
                .filter(|(cn, _)| cn.contains(&norm) || norm.contains(cn.as_str()));
            if let Some((_, canonical)) = matches.next()
                && matches.next().is_none()
            {
                return Some(canonical.clone());
            }
        }

        // Tier 4: best fuzzy candidate above the threshold.
        let best = self
            .canonical
            .iter()
            .map(|(cn, canonical)| (similarity(&norm, cn), canonical))
            .max_by(|(a, _), (b, _)| a.total_cmp(b));
        if let Some((score, canonical)) = best
            && score >= FUZZY_MATCH_THRESHOLD
        {
            return Some(canonical.clone());
        }

        self.record_unmapped(raw, best);
        None
    }

    /// Raw names that failed resolution so far, in sorted order.
    #[must_use]
    pub fn unmapped(&self) -> Vec<String> {
        self.unmapped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Records an unresolved name once, logging on first sight.
    fn record_unmapped(&self, raw: &str, best: Option<(f64, &String)>) {
        let mut unmapped = self
            .unmapped
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if unmapped.insert(raw.to_owned()) {
            match best {
                Some((score, canonical)) => log::warn!(
                    "Unmapped ward: {raw:?} (best candidate {canonical:?} at {:.1}%)",
                    score * 100.0
                ),
                None => log::warn!("Unmapped ward: {raw:?} (no canonical wards loaded)"),
            }
        }
    }
}
