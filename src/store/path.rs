// src/store/path.rs

use std::{fmt, str::FromStr};

use crate::error::AppError;

/// Materialized path of a subject: the ids from the root down to the node.
///
/// Mirrors the `ltree` column of the `subject` table (`"1.4.9"`). Ordering
/// is label-wise and numeric, so a parent sorts before its descendants and
/// siblings sort by id. The Postgres queries order by the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectPath(Vec<i64>);

impl SubjectPath {
    pub fn root(id: i64) -> Self {
        SubjectPath(vec![id])
    }

    /// Path of a new node placed under `self`.
    pub fn child(&self, id: i64) -> Self {
        let mut labels = self.0.clone();
        labels.push(id);
        SubjectPath(labels)
    }

    /// The node id (last label).
    pub fn leaf(&self) -> i64 {
        // Paths are never empty: every constructor adds at least one label.
        self.0[self.0.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Equivalent of `self <@ ancestor`: true when `ancestor` is a prefix of
    /// `self`, including `self == ancestor`.
    pub fn is_descendant_of(&self, ancestor: &SubjectPath) -> bool {
        self.0.starts_with(&ancestor.0)
    }

    /// Moves `self` from under `old_root` to under `new_root`, keeping the
    /// relative tail. Returns `None` when `self` is outside `old_root`.
    pub fn rebase(&self, old_root: &SubjectPath, new_root: &SubjectPath) -> Option<SubjectPath> {
        if !self.is_descendant_of(old_root) {
            return None;
        }
        let mut labels = new_root.0.clone();
        labels.extend_from_slice(&self.0[old_root.0.len()..]);
        Some(SubjectPath(labels))
    }
}

impl fmt::Display for SubjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for label in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", label)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for SubjectPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let labels = s
            .split('.')
            .map(|label| {
                label
                    .parse::<i64>()
                    .map_err(|_| AppError::Internal(format!("Malformed subject path '{}'", s)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SubjectPath(labels))
    }
}
