use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use cashbook_core::{DomainError, DomainResult, ExpectedVersion, MovementId, Versioned};
use cashbook_ledger::{AuditAction, EntityType, LedgerSummary, Movement, MovementPatch, NewMovement};

use super::r#trait::{LedgerStore, MovementPage, MovementQuery, Reconciliation};
use crate::audit::{AuditLog, append_for_mutation, snapshot};
use crate::config::LedgerConfig;
use crate::context::OperationContext;
use crate::stats_cache::StatsCache;
use crate::storage::{LedgerTables, MovementCursor};

/// In-memory ledger store.
///
/// Intended for tests/dev. Shares [`LedgerTables`] with the attachment store
/// so cascade deletes and uploads see one consistent view.
#[derive(Debug)]
pub struct InMemoryLedgerStore<A> {
    tables: Arc<LedgerTables>,
    audit: A,
    cache: Arc<StatsCache>,
    config: LedgerConfig,
}

impl<A> InMemoryLedgerStore<A> {
    pub fn new(
        tables: Arc<LedgerTables>,
        audit: A,
        cache: Arc<StatsCache>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            tables,
            audit,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }
}

fn movement_not_found(id: MovementId) -> DomainError {
    DomainError::not_found(format!("movement {id}"))
}

impl<A> LedgerStore for InMemoryLedgerStore<A>
where
    A: AuditLog,
{
    fn record_movement(&self, ctx: &OperationContext, input: NewMovement) -> DomainResult<MovementId> {
        let mut tables = self.tables.write()?;

        let created_at = tables.next_timestamp(Utc::now());
        let movement = Movement::create(MovementId::new(), input, ctx.actor.clone(), created_at)?;
        let id = movement.id;
        let description = format!(
            "recorded {} of {}: {}",
            movement.kind, movement.amount, movement.description
        );
        let (kind, amount) = (movement.kind, movement.amount);

        let checkpoint = tables.summary();
        if let Err(err) = tables.insert_movement(movement) {
            tracing::warn!(movement_id = %id, actor = %ctx.actor, error = %err, "movement rejected");
            return Err(err);
        }
        let record = ctx.audit(AuditAction::Create, EntityType::Movement, id, None, description);
        if let Err(err) = append_for_mutation(&self.audit, record) {
            tables.undo_insert(&id, checkpoint);
            return Err(err);
        }
        self.cache.invalidate();
        drop(tables);

        tracing::info!(movement_id = %id, %kind, %amount, actor = %ctx.actor, "movement recorded");
        Ok(id)
    }

    fn update_movement(
        &self,
        ctx: &OperationContext,
        id: MovementId,
        expected: ExpectedVersion,
        patch: MovementPatch,
    ) -> DomainResult<Movement> {
        let mut tables = self.tables.write()?;

        let current = tables.movement(&id).ok_or_else(|| movement_not_found(id))?;
        if let Err(err) = expected.check(current.version()) {
            tracing::warn!(movement_id = %id, actor = %ctx.actor, error = %err, "stale movement update rejected");
            return Err(err);
        }

        let next = current.patched(&patch, Utc::now())?;
        let description = current.describe_changes(&next);
        let prior_state = snapshot(current)?;

        let checkpoint = tables.summary();
        let previous = tables
            .replace_movement(next.clone())?
            .ok_or_else(|| movement_not_found(id))?;
        let record = ctx.audit(
            AuditAction::Update,
            EntityType::Movement,
            id,
            Some(prior_state),
            description,
        );
        if let Err(err) = append_for_mutation(&self.audit, record) {
            tables.undo_replace(previous, checkpoint);
            return Err(err);
        }
        self.cache.invalidate();
        drop(tables);

        tracing::info!(movement_id = %id, version = next.version, actor = %ctx.actor, "movement updated");
        Ok(next)
    }

    fn delete_movement(&self, ctx: &OperationContext, id: MovementId) -> DomainResult<()> {
        let mut tables = self.tables.write()?;

        let checkpoint = tables.summary();
        let (movement, attachments) = tables
            .remove_movement(&id)?
            .ok_or_else(|| movement_not_found(id))?;

        let prior_state = match snapshot(&movement) {
            Ok(v) => v,
            Err(err) => {
                tables.undo_remove(movement, attachments, checkpoint);
                return Err(err);
            }
        };
        let description = format!(
            "deleted {} of {}: {} ({} attachment(s) removed)",
            movement.kind,
            movement.amount,
            movement.description,
            attachments.len()
        );
        let record = ctx.audit(
            AuditAction::Delete,
            EntityType::Movement,
            id,
            Some(prior_state),
            description,
        );
        if let Err(err) = append_for_mutation(&self.audit, record) {
            tables.undo_remove(movement, attachments, checkpoint);
            return Err(err);
        }
        self.cache.invalidate();
        drop(tables);

        tracing::info!(
            movement_id = %id,
            attachments = attachments.len(),
            actor = %ctx.actor,
            "movement deleted"
        );
        Ok(())
    }

    fn get_movement(&self, id: MovementId) -> DomainResult<Movement> {
        let tables = self.tables.read()?;
        tables.movement(&id).cloned().ok_or_else(|| movement_not_found(id))
    }

    fn get_balance(&self) -> DomainResult<Decimal> {
        Ok(self.tables.read()?.balance())
    }

    fn list_movements(&self, query: &MovementQuery) -> DomainResult<MovementPage> {
        let limit = self.config.page_size(query.limit);
        let tables = self.tables.read()?;

        let mut items: Vec<Movement> = tables
            .movements_before(query.after)
            .filter(|m| query.kind.is_none_or(|k| m.kind == k))
            .take(limit + 1)
            .cloned()
            .collect();

        let next_cursor = if items.len() > limit {
            items.truncate(limit);
            items.last().map(MovementCursor::of)
        } else {
            None
        };

        Ok(MovementPage { items, next_cursor })
    }

    fn summary(&self) -> DomainResult<LedgerSummary> {
        self.cache.get_or_compute(|| {
            let tables = self.tables.read()?;
            LedgerSummary::scan(tables.all_movements())
        })
    }

    fn reconcile(&self) -> DomainResult<Reconciliation> {
        let tables = self.tables.read()?;
        let reconciliation = Reconciliation {
            maintained: tables.summary(),
            scanned: LedgerSummary::scan(tables.all_movements())?,
        };
        if !reconciliation.is_consistent() {
            tracing::error!(
                maintained = %reconciliation.maintained.balance,
                scanned = %reconciliation.scanned.balance,
                "maintained ledger summary diverged from scan"
            );
        }
        Ok(reconciliation)
    }
}
