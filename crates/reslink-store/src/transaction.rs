//! Link replacement transaction
//!
//! [`replace_links`] makes the outbound links of one `(from, name)` key equal
//! exactly a supplied target list:
//!
//! 1. lock the key (serializes replacements on the same key)
//! 2. stage deletion of every existing link under the key
//! 3. stage one insert per target, validating each
//! 4. commit the staged batch atomically
//!
//! A validation failure in step 3 drops the batch, so the store keeps the
//! old link set. Readers never observe a partially replaced key.

use crate::store::{LinkStore, WriteBatch};
use reslink_types::{EntityRef, LinkData, LinkId, LinkKey, LinkResult, NewLink, ValidationError};
use std::collections::HashSet;
use std::time::Duration;

/// Default wait for the per-key transaction lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Replacement options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// Maximum wait for the per-key lock
    pub lock_timeout: Duration,
    /// Collapse duplicate targets, keeping the first occurrence
    pub unique_targets: bool,
    /// Reject replacements with more targets than this
    pub max_targets: Option<usize>,
}

impl ReplaceOptions {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With lock timeout
    #[inline]
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// With duplicate collapsing
    #[inline]
    #[must_use]
    pub fn with_unique_targets(mut self, unique: bool) -> Self {
        self.unique_targets = unique;
        self
    }

    /// With target limit
    #[inline]
    #[must_use]
    pub fn with_max_targets(mut self, max: usize) -> Self {
        self.max_targets = Some(max);
        self
    }
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            unique_targets: false,
            max_targets: None,
        }
    }
}

/// Outcome of a committed replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replaced {
    /// Links removed from the key
    pub removed: usize,
    /// Ids of the new links, in target order
    pub inserted: Vec<LinkId>,
}

/// Atomically replace every `from --name--> *` link with one link per target
///
/// An empty `targets` list deletes the key's links. Duplicate targets become
/// independent links unless [`ReplaceOptions::unique_targets`] is set.
///
/// # Errors
/// - `LinkError::Validation` if `from`, `name` or any target is incomplete,
///   or the target count exceeds [`ReplaceOptions::max_targets`]
/// - `LinkError::TransactionAborted` if the key lock is not acquired in time
/// - `LinkError::Storage` if the commit fails
///
/// On any error the previous link set is left untouched.
pub fn replace_links<S, I>(
    store: &S,
    from: &EntityRef,
    targets: I,
    name: &str,
    data: &LinkData,
    options: &ReplaceOptions,
) -> LinkResult<Replaced>
where
    S: LinkStore + ?Sized,
    I: IntoIterator<Item = EntityRef>,
{
    let targets = collect_targets(targets, options)?;

    // Fail fast on a bad key before waiting on its lock.
    NewLink::new(from.clone(), from.clone(), name).validate()?;

    let key = LinkKey::new(from, name);
    let _lock = store.lock_key(&key, options.lock_timeout)?;

    let mut batch = WriteBatch::new();
    batch.delete_by_from_and_name(key.clone());
    for target in targets {
        batch.insert(NewLink::new(from.clone(), target, name).with_data(data.clone()))?;
    }

    let report = store.commit(batch)?;
    tracing::info!(
        "Replaced links under {}: removed {}, inserted {}",
        key,
        report.deleted,
        report.inserted.len()
    );

    Ok(Replaced {
        removed: report.deleted,
        inserted: report.inserted,
    })
}

fn collect_targets<I>(targets: I, options: &ReplaceOptions) -> Result<Vec<EntityRef>, ValidationError>
where
    I: IntoIterator<Item = EntityRef>,
{
    let mut targets: Vec<EntityRef> = targets.into_iter().collect();

    if options.unique_targets {
        let mut seen = HashSet::new();
        targets.retain(|target| seen.insert(target.clone()));
    }

    if let Some(max) = options.max_targets {
        if targets.len() > max {
            return Err(ValidationError::TooManyTargets {
                count: targets.len(),
                max,
            });
        }
    }

    Ok(targets)
}
