// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::Persistence;
use quarters_domain::Role;

#[test]
fn test_persistence_initialization() {
    let mut db = Persistence::new_in_memory().unwrap();
    assert!(db.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1 = Persistence::new_in_memory().unwrap();
    let mut db2 = Persistence::new_in_memory().unwrap();

    db1.register_user("Only In One", Role::Applicant, None)
        .unwrap();

    let (users1, _) = db1.snapshot().unwrap();
    let (users2, _) = db2.snapshot().unwrap();
    assert_eq!(users1.len(), 1);
    assert!(users2.is_empty());
}

#[test]
fn test_file_database_initializes_and_reopens() {
    let path = std::env::temp_dir().join(format!(
        "quarters_init_{}_{}.db",
        std::process::id(),
        line!()
    ));
    let _ = std::fs::remove_file(&path);

    {
        let mut db = Persistence::new_with_file(&path, 1000).unwrap();
        db.register_user("Persisted", Role::Applicant, None).unwrap();
    }
    let mut reopened = Persistence::new_with_file(&path, 1000).unwrap();
    let (users, _) = reopened.snapshot().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].display_name, "Persisted");

    drop(reopened);
    let _ = std::fs::remove_file(&path);
}
