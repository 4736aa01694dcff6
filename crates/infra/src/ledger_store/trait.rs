use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_core::{DomainResult, ExpectedVersion, MovementId};
use cashbook_ledger::{LedgerSummary, Movement, MovementKind, MovementPatch, NewMovement};

use crate::context::OperationContext;
use crate::storage::MovementCursor;

/// Listing request. `limit == 0` asks for the configured default page size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementQuery {
    #[serde(default)]
    pub kind: Option<MovementKind>,
    #[serde(default)]
    pub limit: usize,
    /// Cursor returned by the previous page.
    #[serde(default)]
    pub after: Option<MovementCursor>,
}

impl MovementQuery {
    pub fn first(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn of_kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn after(mut self, cursor: MovementCursor) -> Self {
        self.after = Some(cursor);
        self
    }
}

/// One page of movements, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPage {
    pub items: Vec<Movement>,
    /// Present when more rows follow; pass it back as `MovementQuery::after`.
    pub next_cursor: Option<MovementCursor>,
}

/// Maintained aggregate versus a from-scratch scan of the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub maintained: LedgerSummary,
    pub scanned: LedgerSummary,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.maintained == self.scanned
    }
}

/// Petty-cash movement store.
///
/// Implementations enforce record-level invariants only; authorization is
/// the caller's job.
pub trait LedgerStore: Send + Sync {
    fn record_movement(&self, ctx: &OperationContext, input: NewMovement) -> DomainResult<MovementId>;

    /// Apply `patch` if the stored version equals `expected`, otherwise
    /// fail with a retryable conflict.
    fn update_movement(
        &self,
        ctx: &OperationContext,
        id: MovementId,
        expected: ExpectedVersion,
        patch: MovementPatch,
    ) -> DomainResult<Movement>;

    /// Delete a movement and all of its attachments.
    fn delete_movement(&self, ctx: &OperationContext, id: MovementId) -> DomainResult<()>;

    fn get_movement(&self, id: MovementId) -> DomainResult<Movement>;

    /// Signed sum over the current movement set.
    fn get_balance(&self) -> DomainResult<Decimal>;

    fn list_movements(&self, query: &MovementQuery) -> DomainResult<MovementPage>;

    /// Totals for reporting; may be served from a short-lived cache.
    fn summary(&self) -> DomainResult<LedgerSummary>;

    fn reconcile(&self) -> DomainResult<Reconciliation>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn record_movement(&self, ctx: &OperationContext, input: NewMovement) -> DomainResult<MovementId> {
        (**self).record_movement(ctx, input)
    }

    fn update_movement(
        &self,
        ctx: &OperationContext,
        id: MovementId,
        expected: ExpectedVersion,
        patch: MovementPatch,
    ) -> DomainResult<Movement> {
        (**self).update_movement(ctx, id, expected, patch)
    }

    fn delete_movement(&self, ctx: &OperationContext, id: MovementId) -> DomainResult<()> {
        (**self).delete_movement(ctx, id)
    }

    fn get_movement(&self, id: MovementId) -> DomainResult<Movement> {
        (**self).get_movement(id)
    }

    fn get_balance(&self) -> DomainResult<Decimal> {
        (**self).get_balance()
    }

    fn list_movements(&self, query: &MovementQuery) -> DomainResult<MovementPage> {
        (**self).list_movements(query)
    }

    fn summary(&self) -> DomainResult<LedgerSummary> {
        (**self).summary()
    }

    fn reconcile(&self) -> DomainResult<Reconciliation> {
        (**self).reconcile()
    }
}
