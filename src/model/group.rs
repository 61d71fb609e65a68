//! Approximate-name clustering of vendor totals.
//!
//! Clustering is a single online pass: each vendor name joins the first existing group whose
//! seed it fuzzily matches, or seeds a new group. Matching is tested against the seed only, so a
//! group may hold names that do not match each other.

use crate::model::{Amount, VendorTotals};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A cluster of vendor-name variants with their combined count and spend.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    canonical: String,
    count: u64,
    total: Amount,
    members: Vec<String>,
    #[serde(skip)]
    folded: String,
}

impl Group {
    fn seed(name: &str, count: u64, total: Amount) -> Self {
        Self {
            canonical: name.to_string(),
            count,
            total,
            members: vec![name.to_string()],
            folded: fold_case(name),
        }
    }

    fn absorb(&mut self, name: &str, count: u64, total: Amount) -> Option<()> {
        self.total = self.total.checked_add(total)?;
        self.count += count;
        self.members.push(name.to_string());
        Some(())
    }

    /// The vendor name that seeded the group and labels it in the report.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    /// Every vendor name folded into the group, the seed first.
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

/// The groups produced by one clustering pass, in creation order.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Groups(Vec<Group>);

impl Groups {
    /// Partitions the vendor names of `totals` into groups.
    ///
    /// Names are visited in the order `totals` yields them. For each name the existing groups are
    /// scanned in creation order and the first one whose seed matches wins; there is no scoring.
    ///
    /// # Errors
    /// - Returns an error if a group's combined total does not fit in an `Amount`.
    pub fn cluster(totals: &VendorTotals) -> Result<Self> {
        let mut groups: Vec<Group> = Vec::new();
        for (name, acc) in totals.iter() {
            let folded = fold_case(name);
            match groups
                .iter_mut()
                .find(|group| fuzzy_match(&folded, &group.folded))
            {
                Some(group) => {
                    trace!("'{name}' joins the group of '{}'", group.canonical);
                    group
                        .absorb(name, acc.count(), acc.total())
                        .with_context(|| {
                            format!("The total spend for group '{}' overflows", group.canonical)
                        })?;
                }
                None => {
                    trace!("'{name}' seeds a new group");
                    groups.push(Group::seed(name, acc.count(), acc.total()));
                }
            }
        }
        debug!(
            "Clustered {} vendor names into {} groups",
            totals.len(),
            groups.len()
        );
        Ok(Self(groups))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The group a vendor name was folded into.
    pub fn find(&self, name: &str) -> Option<&Group> {
        self.0.iter().find(|g| g.members.iter().any(|m| m == name))
    }
}

impl IntoIterator for Groups {
    type Item = Group;
    type IntoIter = std::vec::IntoIter<Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Lowercases `s` one character at a time, keeping only the first char of any expansion.
///
/// Unlike `str::to_lowercase` there are no context rules (a word-final 'Σ' folds to 'σ') and no
/// multi-char results ('İ' folds to 'i'), so a folded name has exactly as many chars as the name.
fn fold_case(s: &str) -> String {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Returns true if every character of `source` appears in `target`, in order.
///
/// The test is directional and case sensitive; callers fold case first. An empty `source`
/// matches any `target`.
pub fn fuzzy_match(source: &str, target: &str) -> bool {
    let mut remaining = target.chars();
    source.chars().all(|c| remaining.any(|t| t == c))
}
