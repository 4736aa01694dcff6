use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;

use cashbook_auth::{Actor, Capability, RolePolicyGate, Role};
use cashbook_infra::audit::AuditQuery;
use cashbook_infra::ledger_store::MovementQuery;
use cashbook_infra::{Caller, LedgerConfig, LedgerService};
use cashbook_ledger::{NewMovement, RequestMeta, Upload};

fn main() -> anyhow::Result<()> {
    let config = LedgerConfig::from_env().context("invalid CASHBOOK_* configuration")?;
    cashbook_observability::init(config.log_format);

    let gate = RolePolicyGate::new()
        .grant(Role::new("cashier"), Capability::LEDGER_ACCESS)
        .grant(Role::new("auditor"), Capability::AUDIT_READ);
    let service = LedgerService::in_memory(config, Arc::new(gate));

    let cashier = Caller::new(Actor::new("cashier").with_role(Role::new("cashier")))
        .with_request(RequestMeta::new("127.0.0.1", "cashbook-demo"));
    service.login(&cashier)?;

    let donation = service.record_movement(
        &cashier,
        NewMovement::entry(Decimal::new(10_000, 2), "Donation").with_subject_name("Parish fair"),
    )?;
    service.record_movement(&cashier, NewMovement::exit(Decimal::new(3_000, 2), "Supplies"))?;
    service.store_attachment(
        &cashier,
        donation,
        Upload::new("receipt.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
    )?;

    let balance = service.get_balance(&cashier)?;
    let summary = service.summary(&cashier)?;
    let page = service.list_movements(&cashier, &MovementQuery::default())?;
    tracing::info!(
        %balance,
        entries = %summary.total_entries,
        exits = %summary.total_exits,
        listed = page.items.len(),
        "ledger ready"
    );

    let auditor = Caller::new(Actor::new("auditor").with_role(Role::new("auditor")));
    for record in service.audit_trail(&auditor, &AuditQuery::latest(10))? {
        tracing::info!(
            action = %record.action,
            entity = %record.entity_type,
            actor = %record.actor,
            "{}",
            record.description
        );
    }

    Ok(())
}
