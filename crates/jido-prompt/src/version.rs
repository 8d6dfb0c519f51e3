//! Linear prompt versioning: snapshots, lookup and diffs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result, ValidationError};
use crate::message::{MessageItem, RenderedMessage, validate_messages};
use crate::prompt::{Metadata, Prompt};
use crate::template::Params;

/// A snapshot of an earlier prompt version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub version: u32,
    pub messages: Vec<MessageItem>,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Message-level difference between two rendered versions.
///
/// `added` holds messages rendered in the first version and missing from the
/// second; `removed` the reverse. Matching is by whole message and counts
/// duplicates, but ignores order, so a pure reordering yields an empty diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub added: Vec<RenderedMessage>,
    pub removed: Vec<RenderedMessage>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl Prompt {
    /// Snapshot the current version into history, apply `transform`, and
    /// return the result as version `current + 1`.
    ///
    /// The transform's result is re-validated. Its id, version and history
    /// are always taken from `self`, so a transform cannot rewrite history.
    pub fn new_version<F>(&self, transform: F) -> Result<Prompt>
    where
        F: FnOnce(Prompt) -> Result<Prompt>,
    {
        let version = self
            .version
            .checked_add(1)
            .ok_or(Error::VersionOverflow(self.version))?;

        let mut history = Vec::with_capacity(self.history.len() + 1);
        history.push(self.snapshot());
        history.extend(self.history.iter().cloned());

        let mut next = transform(self.clone())?;
        validate_messages(&next.messages)?;

        next.id = self.id.clone();
        next.version = version;
        next.history = history;

        debug!(prompt = %next.id, version = next.version, "new prompt version");
        Ok(next)
    }

    /// The prompt as it was at `version`.
    ///
    /// Returns a clone of `self` for the current version, a rebuilt prompt
    /// for versions still in history, [`Error::FutureVersion`] for versions
    /// past the current one and [`Error::VersionNotFound`] otherwise.
    pub fn get_version(&self, version: u32) -> Result<Prompt> {
        if version == self.version {
            return Ok(self.clone());
        }
        if version > self.version {
            return Err(Error::FutureVersion {
                requested: version,
                current: self.version,
            });
        }

        let position = self
            .history
            .iter()
            .position(|entry| entry.version == version)
            .ok_or(Error::VersionNotFound(version))?;
        let entry = &self.history[position];

        Ok(Prompt {
            id: self.id.clone(),
            version: entry.version,
            messages: entry.messages.clone(),
            history: self.history[position + 1..].to_vec(),
            params: entry.params.clone(),
            metadata: entry.metadata.clone(),
            output_schema: self.output_schema.clone(),
        })
    }

    /// Version numbers, newest first, starting with the current one.
    pub fn list_versions(&self) -> Vec<u32> {
        std::iter::once(self.version)
            .chain(self.history.iter().map(|entry| entry.version))
            .collect()
    }

    /// Render versions `a` and `b` with their own params and diff the
    /// resulting messages.
    pub fn compare_versions(&self, a: u32, b: u32) -> Result<VersionDiff> {
        let rendered_a = self.get_version(a)?.render()?;
        let rendered_b = self.get_version(b)?.render()?;

        Ok(VersionDiff {
            added: list_difference(&rendered_a, &rendered_b),
            removed: list_difference(&rendered_b, &rendered_a),
        })
    }

    /// Keep only the `keep` most recent history entries. Dropped versions
    /// report [`Error::VersionNotFound`] afterwards.
    pub fn prune_history(&self, keep: usize) -> Prompt {
        let mut pruned = self.clone();
        pruned.history.truncate(keep);
        pruned
    }

    fn snapshot(&self) -> HistoryEntry {
        HistoryEntry {
            version: self.version,
            messages: self.messages.clone(),
            params: self.params.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Check a deserialized version chain: `version` is at least 1, history
/// versions strictly decrease below it, and every snapshot satisfies the
/// message invariants.
pub(crate) fn validate_history(
    version: u32,
    history: &[HistoryEntry],
) -> std::result::Result<(), ValidationError> {
    if version == 0 {
        return Err(ValidationError::InvalidVersion(version));
    }
    let mut previous = version;
    for entry in history {
        if entry.version == 0 {
            return Err(ValidationError::InvalidVersion(entry.version));
        }
        if entry.version >= previous {
            return Err(ValidationError::HistoryOutOfOrder {
                version: entry.version,
                previous,
            });
        }
        validate_messages(&entry.messages).map_err(|source| {
            ValidationError::InvalidHistory {
                version: entry.version,
                source: Box::new(source),
            }
        })?;
        previous = entry.version;
    }
    Ok(())
}

/// Elements of `left` left over after removing one occurrence of each
/// element of `right`.
fn list_difference(left: &[RenderedMessage], right: &[RenderedMessage]) -> Vec<RenderedMessage> {
    let mut remaining: Vec<Option<&RenderedMessage>> = left.iter().map(Some).collect();
    for message in right {
        if let Some(slot) = remaining.iter_mut().find(|slot| **slot == Some(message)) {
            *slot = None;
        }
    }
    remaining.into_iter().flatten().cloned().collect()
}
