//! Invoice number allocation.
//!
//! Numbers follow `{prefix}-{year}-{sequential}` with zero-padding, e.g.
//! "INV-2026-000042", resetting to 1 at each year boundary.
//!
//! The reference system scanned existing rows and incremented on every
//! create, unlocked. Here the counters live in a [`NumberSequence`] that is
//! seeded once from the existing numbers and then only ever advances; the
//! engine allocates through `&mut self`, so allocate + insert is a single
//! serialized step and duplicates cannot be handed out.

use std::collections::HashMap;

/// Per-year invoice number counters.
#[derive(Debug, Clone)]
pub struct NumberSequence {
    prefix: String,
    zero_pad: usize,
    /// Highest number already issued, per year.
    issued: HashMap<i32, u64>,
}

impl NumberSequence {
    /// Create an empty sequence; every year starts at 1.
    pub fn new(prefix: impl Into<String>, zero_pad: usize) -> Self {
        Self {
            prefix: prefix.into(),
            zero_pad,
            issued: HashMap::new(),
        }
    }

    /// Seed the counters from already-persisted invoice numbers.
    ///
    /// Numbers with a foreign prefix or an unparsable suffix are ignored —
    /// they never existed as far as the sequence is concerned.
    pub fn seed<'a>(mut self, existing: impl IntoIterator<Item = &'a str>) -> Self {
        for number in existing {
            if let Some((year, n)) = self.parse(number) {
                let slot = self.issued.entry(year).or_insert(0);
                *slot = (*slot).max(n);
            }
        }
        self
    }

    /// Allocate the next number for `year`, advancing the counter.
    pub fn allocate(&mut self, year: i32) -> String {
        let slot = self.issued.entry(year).or_insert(0);
        *slot += 1;
        let n = *slot;
        self.format(year, n)
    }

    /// Preview the next number for `year` without consuming it.
    pub fn peek(&self, year: i32) -> String {
        let next = self.issued.get(&year).copied().unwrap_or(0) + 1;
        self.format(year, next)
    }

    fn format(&self, year: i32, n: u64) -> String {
        format!("{}-{year}-{n:0>width$}", self.prefix, width = self.zero_pad)
    }

    /// Parse `number` back into (year, sequential) if it matches this
    /// sequence's prefix and shape.
    pub fn parse(&self, number: &str) -> Option<(i32, u64)> {
        let rest = number.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        let (year_str, suffix) = rest.split_once('-')?;
        let year: i32 = year_str.parse().ok()?;
        let n: u64 = suffix.parse().ok()?;
        Some((year, n))
    }
}
