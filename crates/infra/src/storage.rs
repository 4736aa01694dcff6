//! Shared in-memory tables for movements and their attachments.
//!
//! Movements and attachments live behind one lock so that the
//! movement→attachment reference behaves like a foreign key with
//! cascade-on-delete: an upload can never land on a movement that is being
//! deleted, and a delete removes every attachment in the same critical section.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_core::{AttachmentId, DomainError, DomainResult, MovementId};
use cashbook_ledger::{Attachment, LedgerSummary, Movement};

/// Position of a movement in the newest-first listing order.
///
/// Ordered by creation time, ties broken by id. Handed back to callers as the
/// pagination cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MovementCursor {
    pub created_at: DateTime<Utc>,
    pub id: MovementId,
}

impl MovementCursor {
    pub fn of(movement: &Movement) -> Self {
        Self {
            created_at: movement.created_at,
            id: movement.id,
        }
    }
}

/// Backing storage shared by the in-memory ledger and attachment stores.
#[derive(Debug, Default)]
pub struct LedgerTables {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    movements: HashMap<MovementId, Movement>,
    order: BTreeSet<MovementCursor>,
    attachments: HashMap<AttachmentId, Attachment>,
    by_movement: HashMap<MovementId, BTreeSet<AttachmentId>>,
    /// Maintained in the same critical section as `movements`.
    summary: LedgerSummary,
    last_timestamp: Option<DateTime<Utc>>,
}

impl LedgerTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> DomainResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| poisoned())
    }

    pub(crate) fn write(&self) -> DomainResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> DomainError {
    tracing::error!("ledger tables lock poisoned");
    DomainError::persistence("ledger tables lock poisoned")
}

impl Tables {
    /// Timestamp for a new row: strictly later than any handed out before, so
    /// fresh rows always sort ahead of any page cursor already issued.
    pub(crate) fn next_timestamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let at = match self.last_timestamp {
            Some(last) if last >= now => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(at);
        at
    }

    pub(crate) fn movement(&self, id: &MovementId) -> Option<&Movement> {
        self.movements.get(id)
    }

    pub(crate) fn contains_movement(&self, id: &MovementId) -> bool {
        self.movements.contains_key(id)
    }

    /// Add a movement. Fails without touching anything when the totals
    /// would overflow.
    pub(crate) fn insert_movement(&mut self, movement: Movement) -> DomainResult<()> {
        self.summary.apply(&movement)?;
        self.put_movement(movement);
        Ok(())
    }

    /// Swap in a new version of an existing movement, returning the old one.
    pub(crate) fn replace_movement(&mut self, next: Movement) -> DomainResult<Option<Movement>> {
        let Some(previous) = self.movements.get(&next.id).cloned() else {
            return Ok(None);
        };
        self.summary.replace(&previous, &next)?;
        self.movements.insert(next.id, next);
        Ok(Some(previous))
    }

    /// Remove a movement and, by cascade, all of its attachments.
    pub(crate) fn remove_movement(
        &mut self,
        id: &MovementId,
    ) -> DomainResult<Option<(Movement, Vec<Attachment>)>> {
        let Some(movement) = self.take_movement(id) else {
            return Ok(None);
        };
        if let Err(err) = self.summary.revert(&movement) {
            self.put_movement(movement);
            return Err(err);
        }
        let attachments = self.remove_attachments_of(id);
        Ok(Some((movement, attachments)))
    }

    /// Undo [`insert_movement`](Self::insert_movement).
    pub(crate) fn undo_insert(&mut self, id: &MovementId, summary: LedgerSummary) {
        self.take_movement(id);
        self.summary = summary;
    }

    /// Undo [`replace_movement`](Self::replace_movement).
    pub(crate) fn undo_replace(&mut self, previous: Movement, summary: LedgerSummary) {
        self.movements.insert(previous.id, previous);
        self.summary = summary;
    }

    /// Undo [`remove_movement`](Self::remove_movement).
    pub(crate) fn undo_remove(
        &mut self,
        movement: Movement,
        attachments: Vec<Attachment>,
        summary: LedgerSummary,
    ) {
        self.put_movement(movement);
        for a in attachments {
            self.insert_attachment(a);
        }
        self.summary = summary;
    }

    fn put_movement(&mut self, movement: Movement) {
        self.order.insert(MovementCursor::of(&movement));
        self.movements.insert(movement.id, movement);
    }

    fn take_movement(&mut self, id: &MovementId) -> Option<Movement> {
        let movement = self.movements.remove(id)?;
        self.order.remove(&MovementCursor::of(&movement));
        Some(movement)
    }

    /// Newest-first walk, strictly older than `after` when given.
    pub(crate) fn movements_before<'a>(
        &'a self,
        after: Option<MovementCursor>,
    ) -> impl Iterator<Item = &'a Movement> + 'a {
        let keys: Box<dyn Iterator<Item = &'a MovementCursor> + 'a> = match after {
            Some(cursor) => Box::new(self.order.range(..cursor).rev()),
            None => Box::new(self.order.iter().rev()),
        };
        keys.filter_map(move |key| self.movements.get(&key.id))
    }

    pub(crate) fn all_movements(&self) -> impl Iterator<Item = &Movement> {
        self.movements.values()
    }

    pub(crate) fn balance(&self) -> Decimal {
        self.summary.balance
    }

    pub(crate) fn summary(&self) -> LedgerSummary {
        self.summary
    }

    pub(crate) fn attachment(&self, id: &AttachmentId) -> Option<&Attachment> {
        self.attachments.get(id)
    }

    pub(crate) fn insert_attachment(&mut self, attachment: Attachment) {
        self.by_movement
            .entry(attachment.movement_id)
            .or_default()
            .insert(attachment.id);
        self.attachments.insert(attachment.id, attachment);
    }

    pub(crate) fn remove_attachment(&mut self, id: &AttachmentId) -> Option<Attachment> {
        let attachment = self.attachments.remove(id)?;
        if let Some(ids) = self.by_movement.get_mut(&attachment.movement_id) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_movement.remove(&attachment.movement_id);
            }
        }
        Some(attachment)
    }

    pub(crate) fn remove_attachments_of(&mut self, movement_id: &MovementId) -> Vec<Attachment> {
        let ids = self.by_movement.remove(movement_id).unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.attachments.remove(id))
            .collect()
    }

    /// Attachments of a movement in upload order.
    pub(crate) fn attachments_of<'a>(
        &'a self,
        movement_id: MovementId,
    ) -> impl Iterator<Item = &'a Attachment> + 'a {
        let ids: Vec<AttachmentId> = self
            .by_movement
            .get(&movement_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.into_iter().filter_map(move |id| self.attachments.get(&id))
    }
}
