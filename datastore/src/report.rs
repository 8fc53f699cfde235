// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The validation report: a keyed multimap from node name (or the reserved
//! global key) to findings, in arrival order.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Key under which cluster-wide findings are filed.
pub const GLOBAL_KEY: &str = "<global>";

/// The findings produced by one validation cycle. Appends may come from any
/// thread; there is no deduplication and no reordering.
#[derive(Default)]
pub struct Report {
    entries: Mutex<BTreeMap<String, Vec<String>>>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Report::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<String>>> {
        self.entries.lock().expect("poisoned report lock")
    }

    /// Append a finding under `key` (a node name or [`GLOBAL_KEY`]).
    pub fn append(&self, key: &str, finding: impl Into<String>) {
        let finding = finding.into();
        debug!("report[{key}]: {finding}");
        self.lock().entry(key.to_string()).or_default().push(finding);
    }

    /// Append a cluster-wide finding.
    pub fn append_global(&self, finding: impl Into<String>) {
        self.append(GLOBAL_KEY, finding);
    }

    /// The findings filed under `key`, in arrival order.
    #[must_use]
    pub fn entries_for(&self, key: &str) -> Vec<String> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    /// The cluster-wide findings, in arrival order.
    #[must_use]
    pub fn global(&self) -> Vec<String> {
        self.entries_for(GLOBAL_KEY)
    }

    /// A snapshot of the whole report.
    #[must_use]
    pub fn data(&self) -> BTreeMap<String, Vec<String>> {
        self.lock().clone()
    }

    /// Total number of findings across all keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().values().all(Vec::is_empty)
    }

    /// Drop all findings.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (key, findings) in self.data() {
            writeln!(f, "{key}:")?;
            for finding in findings {
                writeln!(f, "  {finding}")?;
            }
        }
        Ok(())
    }
}
