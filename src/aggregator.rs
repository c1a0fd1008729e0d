use std::collections::BTreeMap;
use serde::Serialize;

use crate::prober::{ProbeOutcome, ProbeResult};

/// Samples collected for one group, keyed by probed host.
///
/// Samples for a host stay in the order they were folded in, which is the
/// completion order of the probes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IpResultSet(BTreeMap<String, Vec<ProbeOutcome>>);

impl IpResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one outcome under its host. No deduplication.
    pub fn fold(&mut self, result: ProbeResult) {
        self.0.entry(result.host).or_default().push(result.outcome);
    }

    #[cfg(test)]
    pub fn get(&self, host: &str) -> Option<&[ProbeOutcome]> {
        self.0.get(host).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_samples(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn failures(&self) -> usize {
        self.0
            .values()
            .flatten()
            .filter(|o| !o.is_success())
            .count()
    }
}

impl FromIterator<ProbeResult> for IpResultSet {
    fn from_iter<I: IntoIterator<Item = ProbeResult>>(iter: I) -> Self {
        let mut set = Self::new();
        for r in iter {
            set.fold(r);
        }
        set
    }
}
