//! End-to-end behaviour of the ledger through the service boundary.

use std::sync::Arc;

use rust_decimal_macros::dec;

use cashbook_auth::{Actor, Capability, Role, RolePolicyGate};
use cashbook_core::{DomainError, ExpectedVersion};
use cashbook_infra::audit::AuditQuery;
use cashbook_infra::export::ExportBundle;
use cashbook_infra::ledger_store::MovementQuery;
use cashbook_infra::{Caller, LedgerConfig, LedgerService};
use cashbook_ledger::{
    AuditAction, EntityType, MAX_ATTACHMENT_BYTES, MovementKind, MovementPatch, NewMovement,
    RequestMeta, Upload,
};

fn service() -> LedgerService {
    let gate = RolePolicyGate::new()
        .grant(Role::new("cashier"), Capability::LEDGER_ACCESS)
        .grant(Role::new("auditor"), Capability::AUDIT_READ);
    LedgerService::in_memory(LedgerConfig::default(), Arc::new(gate))
}

fn cashier() -> Caller {
    Caller::new(Actor::new("cashier").with_role(Role::new("cashier")))
        .with_request(RequestMeta::new("10.0.0.7", "firefox"))
}

fn admin() -> Caller {
    Caller::new(Actor::new("root").with_role(Role::ADMIN))
}

#[test]
fn donation_and_supplies_leave_seventy() {
    let svc = service();
    let c = cashier();
    svc.record_movement(&c, NewMovement::entry(dec!(100.00), "Donation")).unwrap();
    svc.record_movement(&c, NewMovement::exit(dec!(30.00), "Supplies")).unwrap();

    assert_eq!(svc.get_balance(&c).unwrap(), dec!(70.00));
    assert_eq!(svc.get_balance(&c).unwrap(), dec!(70.00));

    let summary = svc.summary(&c).unwrap();
    assert_eq!(summary.total_entries, dec!(100.00));
    assert_eq!(summary.total_exits, dec!(30.00));
    assert!(svc.reconcile(&c).unwrap().is_consistent());
}

#[test]
fn receipt_round_trips_unchanged() {
    let svc = service();
    let c = cashier();
    let mid = svc.record_movement(&c, NewMovement::exit(dec!(8), "Bus fare")).unwrap();
    let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    let aid = svc
        .store_attachment(&c, mid, Upload::new("r.pdf", "application/pdf", bytes.clone()))
        .unwrap();
    let got = svc.retrieve_attachment(&c, aid).unwrap();
    assert_eq!(got.filename, "r.pdf");
    assert_eq!(got.content_type, "application/pdf");
    assert_eq!(got.bytes, bytes);
}

#[test]
fn size_limit_is_sixteen_mebibytes_inclusive() {
    let svc = service();
    let c = cashier();
    let mid = svc.record_movement(&c, NewMovement::exit(dec!(1), "Scan")).unwrap();

    let err = svc
        .store_attachment(
            &c,
            mid,
            Upload::new("big.pdf", "application/pdf", vec![0; MAX_ATTACHMENT_BYTES + 1]),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    svc.store_attachment(
        &c,
        mid,
        Upload::new("exact.pdf", "application/pdf", vec![0; MAX_ATTACHMENT_BYTES]),
    )
    .unwrap();

    let listed = svc.list_attachments(&c, mid).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].size, MAX_ATTACHMENT_BYTES as u64);
}

#[test]
fn batch_reports_partial_success() {
    let svc = service();
    let c = cashier();
    let mid = svc.record_movement(&c, NewMovement::exit(dec!(55), "Groceries")).unwrap();

    let outcome = svc
        .store_attachments(
            &c,
            mid,
            vec![
                Upload::new("valid.pdf", "application/pdf", vec![1; 32]),
                Upload::new("invalid.exe", "application/octet-stream", vec![2; 32]),
                Upload::new("valid2.png", "image/png", vec![3; 32]),
            ],
        )
        .unwrap();
    assert_eq!(outcome.stored.len(), 2);
    assert_eq!(outcome.rejected.len(), 1);
    assert!(!outcome.is_complete());
}

#[test]
fn deleting_a_movement_takes_its_receipts() {
    let svc = service();
    let c = cashier();
    let mid = svc.record_movement(&c, NewMovement::exit(dec!(20), "Gas")).unwrap();
    let a = svc
        .store_attachment(&c, mid, Upload::new("a.pdf", "application/pdf", vec![1]))
        .unwrap();
    let b = svc
        .store_attachment(&c, mid, Upload::new("b.jpg", "image/jpeg", vec![2]))
        .unwrap();

    svc.delete_movement(&c, mid).unwrap();

    for id in [a, b] {
        assert!(matches!(
            svc.retrieve_attachment(&c, id),
            Err(DomainError::NotFound(_))
        ));
    }
    assert!(matches!(svc.get_movement(&c, mid), Err(DomainError::NotFound(_))));
    assert_eq!(svc.get_balance(&c).unwrap(), dec!(0));

    let trail = svc
        .audit_trail(&admin(), &AuditQuery::for_entity(EntityType::Movement, mid.to_string()))
        .unwrap();
    assert_eq!(trail[0].action, AuditAction::Delete);
    assert!(trail[0].description.contains("2 attachment(s)"));
    assert_eq!(trail[0].prior_state.as_ref().unwrap()["description"], "Gas");
}

#[test]
fn every_mutation_leaves_exactly_one_audit_record() {
    let svc = service();
    let c = cashier();
    let auditor = Caller::new(Actor::new("aud").with_role(Role::new("auditor")));

    let id = svc.record_movement(&c, NewMovement::entry(dec!(10), "Raffle")).unwrap();
    svc.update_movement(&c, id, ExpectedVersion(1), MovementPatch::amount(dec!(12)))
        .unwrap();
    svc.delete_movement(&c, id).unwrap();

    // Failed operations audit nothing.
    let _ = svc.update_movement(&c, id, ExpectedVersion(2), MovementPatch::amount(dec!(1)));
    let _ = svc.record_movement(&c, NewMovement::entry(dec!(-1), "bad"));

    let trail = svc
        .audit_trail(&auditor, &AuditQuery::for_entity(EntityType::Movement, id.to_string()))
        .unwrap();
    let actions: Vec<_> = trail.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::Delete, AuditAction::Update, AuditAction::Create]
    );
    assert!(trail.iter().all(|r| r.actor.as_str() == "cashier"));
    assert!(trail[2].prior_state.is_none());
    assert!(trail.iter().all(|r| r.request == c.request));

    let all = svc.audit_trail(&auditor, &AuditQuery::latest(100)).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn login_is_audited_without_an_entity() {
    let svc = service();
    svc.login(&cashier()).unwrap();

    let trail = svc
        .audit_trail(&admin(), &AuditQuery::latest(10).with_action(AuditAction::Login))
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].entity_type, EntityType::Session);
    assert!(trail[0].entity_id.is_none());
}

#[test]
fn cleared_optional_fields_stay_cleared() {
    let svc = service();
    let c = cashier();
    let id = svc
        .record_movement(
            &c,
            NewMovement::exit(dec!(5), "Coffee").with_notes("for volunteers").with_receipt_number("  "),
        )
        .unwrap();
    let m = svc.get_movement(&c, id).unwrap();
    assert_eq!(m.notes.as_deref(), Some("for volunteers"));
    assert_eq!(m.receipt_number, None);

    let patch = MovementPatch {
        notes: Some(None),
        ..MovementPatch::default()
    };
    let updated = svc.update_movement(&c, id, ExpectedVersion(1), patch).unwrap();
    assert_eq!(updated.notes, None);
    assert!(updated.updated_at.is_some());
}

#[test]
fn summary_reflects_every_mutation_immediately() {
    let svc = service();
    let c = cashier();
    let id = svc.record_movement(&c, NewMovement::entry(dec!(50), "Bazaar")).unwrap();
    assert_eq!(svc.summary(&c).unwrap().balance, dec!(50));

    svc.update_movement(&c, id, ExpectedVersion(1), MovementPatch::amount(dec!(80)))
        .unwrap();
    assert_eq!(svc.summary(&c).unwrap().balance, dec!(80));

    svc.record_movement(&c, NewMovement::exit(dec!(30), "Rent")).unwrap();
    assert_eq!(svc.summary(&c).unwrap().balance, dec!(50));

    svc.delete_movement(&c, id).unwrap();
    let summary = svc.summary(&c).unwrap();
    assert_eq!(summary.balance, dec!(-30));
    assert_eq!(summary.movement_count, 1);
}

#[test]
fn listing_filters_by_kind_and_pages() {
    let svc = service();
    let c = cashier();
    for i in 0..5 {
        svc.record_movement(&c, NewMovement::exit(dec!(1), format!("out {i}"))).unwrap();
        svc.record_movement(&c, NewMovement::entry(dec!(1), format!("in {i}"))).unwrap();
    }

    let first = svc
        .list_movements(&c, &MovementQuery::first(3).of_kind(MovementKind::Entry))
        .unwrap();
    assert_eq!(
        first.items.iter().map(|m| m.description.as_str()).collect::<Vec<_>>(),
        vec!["in 4", "in 3", "in 2"]
    );
    let cursor = first.next_cursor.unwrap();
    let rest = svc
        .list_movements(
            &c,
            &MovementQuery::first(3).of_kind(MovementKind::Entry).after(cursor),
        )
        .unwrap();
    assert_eq!(rest.items.len(), 2);
    assert!(rest.next_cursor.is_none());
}

#[test]
fn export_single_and_many() {
    let svc = service();
    let c = cashier();
    let mid = svc.record_movement(&c, NewMovement::exit(dec!(3), "Stamps")).unwrap();

    assert!(matches!(
        svc.export_attachments(&c, mid),
        Err(DomainError::NotFound(_))
    ));

    svc.store_attachment(&c, mid, Upload::new("one.gif", "image/gif", vec![9; 10]))
        .unwrap();
    let single = svc.export_attachments(&c, mid).unwrap();
    assert!(matches!(single, ExportBundle::Single(_)));
    assert_eq!(single.bytes(), vec![9u8; 10].as_slice());

    svc.store_attachment(&c, mid, Upload::new("two.docx", "application/octet-stream", vec![1]))
        .unwrap();
    match svc.export_attachments(&c, mid).unwrap() {
        ExportBundle::Archive { entries, .. } => assert_eq!(entries, vec!["one.gif", "two.docx"]),
        other => panic!("expected archive, got {other:?}"),
    }
}

#[test]
fn individual_receipt_can_be_removed() {
    let svc = service();
    let c = cashier();
    let mid = svc.record_movement(&c, NewMovement::exit(dec!(3), "Stamps")).unwrap();
    let keep = svc
        .store_attachment(&c, mid, Upload::new("keep.png", "image/png", vec![1]))
        .unwrap();
    let gone = svc
        .store_attachment(&c, mid, Upload::new("drop.png", "image/png", vec![2]))
        .unwrap();

    svc.delete_attachment(&c, gone).unwrap();
    let ids: Vec<_> = svc
        .list_attachments(&c, mid)
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![keep]);
    assert!(matches!(
        svc.delete_attachment(&c, gone),
        Err(DomainError::NotFound(_))
    ));
}
