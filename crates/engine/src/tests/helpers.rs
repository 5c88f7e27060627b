// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{AuthenticatedActor, Engine, EngineConfig, FixedClock};
use quarters::CapabilityAuthorizer;
use quarters_audit::{AuditEntry, AuditSink, AuditSinkError, MemoryAuditSink};
use quarters_domain::{
    District, Document, DocumentId, DocumentType, Role, Unit, UnitKind, User, UserId,
};
use quarters_persistence::Persistence;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::datetime;

pub const NOW: OffsetDateTime = datetime!(2026-03-02 09:30 UTC);

pub fn norte() -> District {
    District::new("Norte")
}

/// How a [`ScriptedSink`] answers the next `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Healthy,
    Failing,
    FailOnce,
    Slow(Duration),
}

/// An audit sink whose behavior can be switched mid-test.
///
/// Accepted entries are forwarded to an in-memory sink.
#[derive(Debug)]
pub struct ScriptedSink {
    mode: Mutex<SinkMode>,
    calls: AtomicUsize,
    accepted: MemoryAuditSink,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(SinkMode::Healthy),
            calls: AtomicUsize::new(0),
            accepted: MemoryAuditSink::new(),
        }
    }

    pub fn set_mode(&self, mode: SinkMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Vec<AuditEntry> {
        self.accepted.entries().unwrap()
    }
}

impl AuditSink for ScriptedSink {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut mode = self.mode.lock().unwrap();
        match *mode {
            SinkMode::Healthy => {}
            SinkMode::Failing => {
                return Err(AuditSinkError::Unavailable(String::from("sink offline")));
            }
            SinkMode::FailOnce => {
                *mode = SinkMode::Healthy;
                return Err(AuditSinkError::Unavailable(String::from("sink hiccup")));
            }
            SinkMode::Slow(delay) => std::thread::sleep(delay),
        }
        drop(mode);
        self.accepted.record(entry)
    }
}

/// An engine over a fresh in-memory database seeded with an admin, an
/// admin-general, two applicants `U1` and `U2`, and an available housing
/// unit `K01`.
pub struct Fixture {
    pub engine: Engine,
    pub sink: Arc<ScriptedSink>,
    pub admin: User,
    pub admin_general: User,
    pub u1: User,
    pub u2: User,
    pub k01: Unit,
}

pub fn fixture() -> Fixture {
    fixture_with_config(EngineConfig::default())
}

pub fn fixture_with_config(config: EngineConfig) -> Fixture {
    let mut db = Persistence::new_in_memory().unwrap();
    let admin = db.register_user("Admin", Role::Admin, None).unwrap();
    let admin_general = db
        .register_user("Admin General", Role::AdminGeneral, None)
        .unwrap();
    let u1 = db.register_user("U1", Role::Applicant, None).unwrap();
    let u2 = db.register_user("U2", Role::Applicant, None).unwrap();
    let k01 = db
        .register_unit(UnitKind::Housing, "K01", &norte(), "Two bedrooms")
        .unwrap();

    let sink = Arc::new(ScriptedSink::new());
    let engine = build_engine(db, sink.clone(), config);
    Fixture {
        engine,
        sink,
        admin,
        admin_general,
        u1,
        u2,
        k01,
    }
}

pub fn build_engine(db: Persistence, sink: Arc<dyn AuditSink>, config: EngineConfig) -> Engine {
    Engine::new(db, CapabilityAuthorizer::builtin(), sink, config)
        .with_clock(Arc::new(FixedClock(NOW)))
}

/// Acts as `user` in their role as stored.
pub fn as_actor(user: &User) -> AuthenticatedActor {
    AuthenticatedActor::new(user.id, user.role)
}

/// Acts as the user with `id` in their current stored role.
pub fn current_actor(engine: &Engine, id: UserId) -> AuthenticatedActor {
    let user = engine.persistence().unwrap().get_user(id).unwrap();
    as_actor(&user)
}

pub fn assignment_payload(titular: &User, unit: &Unit) -> Value {
    json!({
        "titular_id": titular.id.value(),
        "unit_id": unit.id.value(),
        "details": { "furnished": false }
    })
}

pub fn doc_id(document: &Document) -> DocumentId {
    document.id.unwrap()
}

/// Creates an assignment act for `titular` on `unit` and has the titular
/// sign it, leaving it pending admin closure.
pub fn signed_assignment(engine: &Engine, admin: &User, titular: &User, unit: &Unit) -> Document {
    let document = engine
        .create(
            DocumentType::AssignmentAct,
            &as_actor(admin),
            &assignment_payload(titular, unit),
        )
        .unwrap();
    engine
        .fire(
            doc_id(&document),
            "sign",
            &current_actor(engine, titular.id),
            &json!({ "note": "signed" }),
        )
        .unwrap()
}

/// Closes a signed assignment act as `admin_general`.
pub fn close(engine: &Engine, admin_general: &User, document: &Document, payload: &Value) -> Document {
    engine
        .fire(doc_id(document), "close", &as_actor(admin_general), payload)
        .unwrap()
}

pub fn load_unit(engine: &Engine, unit: &Unit) -> Unit {
    engine.load_unit(unit.id).unwrap()
}

pub fn load_user(engine: &Engine, user: &User) -> User {
    engine.load_user(user.id).unwrap()
}
