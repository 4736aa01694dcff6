//! Service boundary used by the web layer.
//!
//! Every call is authorized against the [`PermissionGate`] before any store is
//! touched; the stores themselves only enforce record-level invariants.

use std::io::Read;
use std::sync::Arc;

use rust_decimal::Decimal;

use cashbook_auth::{Capability, PermissionGate};
use cashbook_core::{AttachmentId, AuditRecordId, DomainError, DomainResult, ExpectedVersion, MovementId};
use cashbook_ledger::{
    Attachment, AttachmentInfo, AuditRecord, LedgerSummary, Movement, MovementPatch, NewMovement,
    Upload,
};

use crate::attachments::{AttachmentStore, BatchOutcome, InMemoryAttachmentStore};
use crate::audit::{AuditLog, AuditQuery, InMemoryAuditLog};
use crate::config::LedgerConfig;
use crate::context::Caller;
use crate::export::{ExportAssembler, ExportBundle};
use crate::ledger_store::{
    InMemoryLedgerStore, LedgerStore, MovementPage, MovementQuery, Reconciliation,
};
use crate::stats_cache::StatsCache;
use crate::storage::LedgerTables;

#[derive(Clone)]
pub struct LedgerService {
    gate: Arc<dyn PermissionGate>,
    ledger: Arc<dyn LedgerStore>,
    attachments: Arc<dyn AttachmentStore>,
    audit: Arc<dyn AuditLog>,
    export: ExportAssembler<Arc<dyn AttachmentStore>>,
}

impl core::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedgerService").finish_non_exhaustive()
    }
}

impl LedgerService {
    pub fn new(
        gate: Arc<dyn PermissionGate>,
        ledger: Arc<dyn LedgerStore>,
        attachments: Arc<dyn AttachmentStore>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            export: ExportAssembler::new(attachments.clone()),
            gate,
            ledger,
            attachments,
            audit,
        }
    }

    /// Fully in-memory wiring: shared tables, one audit log, one stats cache.
    pub fn in_memory(config: LedgerConfig, gate: Arc<dyn PermissionGate>) -> Self {
        let tables = Arc::new(LedgerTables::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let cache = Arc::new(StatsCache::new(config.stats_ttl()));
        let attachments = InMemoryAttachmentStore::new(
            tables.clone(),
            audit.clone(),
            config.max_attachment_bytes,
        );
        let ledger = InMemoryLedgerStore::new(tables, audit.clone(), cache, config);

        Self::new(gate, Arc::new(ledger), Arc::new(attachments), audit)
    }

    fn authorize(&self, caller: &Caller, capability: &Capability) -> DomainResult<()> {
        self.gate
            .require(&caller.actor, capability)
            .map_err(DomainError::from)
    }

    /// Record a successful authentication.
    pub fn login(&self, caller: &Caller) -> DomainResult<AuditRecordId> {
        let id = self
            .audit
            .record_login(&caller.actor.id, caller.request.clone())?;
        tracing::info!(actor = %caller.actor.id, "login recorded");
        Ok(id)
    }

    pub fn record_movement(&self, caller: &Caller, input: NewMovement) -> DomainResult<MovementId> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger.record_movement(&caller.context(), input)
    }

    pub fn update_movement(
        &self,
        caller: &Caller,
        id: MovementId,
        expected: ExpectedVersion,
        patch: MovementPatch,
    ) -> DomainResult<Movement> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger
            .update_movement(&caller.context(), id, expected, patch)
    }

    pub fn delete_movement(&self, caller: &Caller, id: MovementId) -> DomainResult<()> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger.delete_movement(&caller.context(), id)
    }

    pub fn get_movement(&self, caller: &Caller, id: MovementId) -> DomainResult<Movement> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger.get_movement(id)
    }

    pub fn get_balance(&self, caller: &Caller) -> DomainResult<Decimal> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger.get_balance()
    }

    pub fn list_movements(&self, caller: &Caller, query: &MovementQuery) -> DomainResult<MovementPage> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger.list_movements(query)
    }

    pub fn summary(&self, caller: &Caller) -> DomainResult<LedgerSummary> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger.summary()
    }

    pub fn reconcile(&self, caller: &Caller) -> DomainResult<Reconciliation> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.ledger.reconcile()
    }

    pub fn store_attachment(
        &self,
        caller: &Caller,
        movement_id: MovementId,
        upload: Upload,
    ) -> DomainResult<AttachmentId> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.attachments
            .store(&caller.context(), movement_id, upload)
    }

    pub fn store_attachment_from_reader(
        &self,
        caller: &Caller,
        movement_id: MovementId,
        filename: &str,
        content_type: &str,
        reader: &mut dyn Read,
    ) -> DomainResult<AttachmentId> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.attachments.store_from_reader(
            &caller.context(),
            movement_id,
            filename,
            content_type,
            reader,
        )
    }

    pub fn store_attachments(
        &self,
        caller: &Caller,
        movement_id: MovementId,
        uploads: Vec<Upload>,
    ) -> DomainResult<BatchOutcome> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.attachments
            .store_batch(&caller.context(), movement_id, uploads)
    }

    pub fn retrieve_attachment(&self, caller: &Caller, id: AttachmentId) -> DomainResult<Attachment> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.attachments.retrieve(id)
    }

    pub fn list_attachments(
        &self,
        caller: &Caller,
        movement_id: MovementId,
    ) -> DomainResult<Vec<AttachmentInfo>> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.attachments.list_for(movement_id)
    }

    pub fn delete_attachment(&self, caller: &Caller, id: AttachmentId) -> DomainResult<()> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.attachments.delete(&caller.context(), id)
    }

    pub fn export_attachments(
        &self,
        caller: &Caller,
        movement_id: MovementId,
    ) -> DomainResult<ExportBundle> {
        self.authorize(caller, &Capability::LEDGER_ACCESS)?;
        self.export.bundle(movement_id)
    }

    pub fn audit_trail(&self, caller: &Caller, query: &AuditQuery) -> DomainResult<Vec<AuditRecord>> {
        self.authorize(caller, &Capability::AUDIT_READ)?;
        Ok(self.audit.query(query)?)
    }
}
