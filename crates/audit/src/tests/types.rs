// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    Action, Actor, AuditEntry, AuditSink, Cause, MemoryAuditSink, ResourceType, TracingAuditSink,
};
use quarters_domain::{Role, UserId};
use std::sync::Arc;
use time::macros::datetime;

fn create_test_entry(action: &str) -> AuditEntry {
    AuditEntry::new(
        Actor::new(UserId::new(1), Role::AdminGeneral),
        Cause::new(String::from("document:4"), String::from("fire close")),
        Action::new(String::from(action), None),
        ResourceType::Document,
        Some(4),
        datetime!(2026-03-01 10:00 UTC),
    )
}

#[test]
fn test_new_entry_is_not_yet_persisted() {
    let entry: AuditEntry = create_test_entry("close");

    assert_eq!(entry.id, None);
    assert_eq!(entry.actor.role, Role::AdminGeneral);
    assert_eq!(entry.resource_id, Some(4));
}

#[test]
fn test_with_resource_id_binds_late_identifier() {
    let mut entry: AuditEntry = create_test_entry("create");
    entry.resource_id = None;

    let bound = entry.with_resource_id(12);

    assert_eq!(bound.resource_id, Some(12));
}

#[test]
fn test_resource_type_parse_round_trip() {
    for resource in [
        ResourceType::Document,
        ResourceType::HousingUnit,
        ResourceType::LodgingUnit,
        ResourceType::User,
    ] {
        assert_eq!(resource.as_str().parse::<ResourceType>(), Ok(resource));
    }
    assert!("vivienda".parse::<ResourceType>().is_err());
}

#[test]
fn test_memory_sink_keeps_entries_in_order() {
    let sink = MemoryAuditSink::new();

    sink.record(&create_test_entry("create")).unwrap();
    sink.record(&create_test_entry("issue")).unwrap();

    let names: Vec<String> = sink
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.action.name)
        .collect();
    assert_eq!(names, vec!["create", "issue"]);
}

#[test]
fn test_shared_sink_records_through_arc() {
    let sink = Arc::new(MemoryAuditSink::new());
    let shared: Arc<dyn AuditSink> = sink.clone();

    shared.record(&create_test_entry("sign")).unwrap();

    assert_eq!(sink.entries().unwrap().len(), 1);
}

#[test]
fn test_tracing_sink_always_accepts() {
    assert!(TracingAuditSink.record(&create_test_entry("close")).is_ok());
}
