// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::mutations::records::{write_unit, write_user};
use crate::{Persistence, PersistenceError};
use quarters::{CapabilityAuthorizer, CreateContext, TransitionResult, apply_create};
use quarters_domain::{
    CreatePayload, District, DocumentType, Occupancy, OperationalState, Role, Unit, UnitKind, User,
};
use serde_json::json;
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub const NOW: OffsetDateTime = datetime!(2026-03-02 09:30 UTC);

pub fn norte() -> District {
    District::new("Norte")
}

/// A database seeded with an admin, an admin-general, one applicant and
/// one available housing unit `K01`.
pub struct Fixture {
    pub db: Persistence,
    pub admin: User,
    pub admin_general: User,
    pub applicant: User,
    pub unit: Unit,
}

pub fn fixture() -> Fixture {
    let mut db = Persistence::new_in_memory().unwrap();
    let admin = db.register_user("Admin", Role::Admin, None).unwrap();
    let admin_general = db
        .register_user("Admin General", Role::AdminGeneral, None)
        .unwrap();
    let applicant = db.register_user("U1", Role::Applicant, None).unwrap();
    let unit = db
        .register_unit(UnitKind::Housing, "K01", &norte(), "Two bedrooms")
        .unwrap();
    Fixture {
        db,
        admin,
        admin_general,
        applicant,
        unit,
    }
}

/// Plans an assignment act by `actor` for `titular` on `unit`.
pub fn plan_assignment(actor: &User, titular: &User, unit: &Unit) -> TransitionResult {
    let payload = CreatePayload::parse(
        DocumentType::AssignmentAct,
        &json!({
            "titular_id": titular.id.value(),
            "unit_id": unit.id.value(),
            "details": { "furnished": false }
        }),
    )
    .unwrap();
    apply_create(
        &CapabilityAuthorizer::builtin(),
        DocumentType::AssignmentAct,
        &payload,
        &CreateContext {
            actor,
            titular,
            unit: Some(unit),
            source: None,
            now: NOW,
        },
    )
    .unwrap()
}

/// Stores `user` as the occupant of `unit` and returns both as written.
pub fn occupy_in_db(db: &mut Persistence, unit: &Unit, user: &User) -> (Unit, User) {
    let mut unit = unit.clone();
    let mut user = user.clone();
    unit.occupancy
        .open(
            unit.id,
            Occupancy::new(
                user.id,
                date!(2026 - 03 - 02),
                Some(date!(2026 - 05 - 01)),
                Some(String::from("assignment_act")),
            ),
        )
        .unwrap();
    unit.operational_state = OperationalState::Occupied;
    user.begin_tenure(unit.kind, unit.id);

    db.atomically(|tx| {
        let user = write_user(tx.conn, &user)?;
        let unit = write_unit(tx.conn, &unit)?;
        Ok::<_, PersistenceError>((unit, user))
    })
    .unwrap()
}
