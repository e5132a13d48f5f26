use rentsplit_core::db::migrations::{apply_migrations, latest_version};
use rentsplit_core::db::{open_db_in_memory, DbError};
use rusqlite::Connection;

fn user_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn fresh_database_is_migrated_to_latest() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(user_version(&conn), latest_version());

    for table in [
        "assets",
        "beneficiaries",
        "ownerships",
        "distributions",
        "allocations",
        "audit_records",
        "job_locks",
    ] {
        let found: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(found, 1, "missing table `{table}`");
    }
}

#[test]
fn reapplying_migrations_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    assert_eq!(user_version(&conn), latest_version());
}

#[test]
fn newer_schema_versions_are_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert!(matches!(err, DbError::UnsupportedSchemaVersion { .. }));
}

#[test]
fn duplicate_distribution_per_period_is_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO assets (id, tenant_id, monthly_rent_minor) VALUES ('a1', 't1', 1000);",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO distributions (id, asset_id, period, total_amount_minor)
         VALUES ('d1', 'a1', '2026-08', 1000);",
        [],
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO distributions (id, asset_id, period, total_amount_minor)
             VALUES ('d2', 'a1', '2026-08', 1000);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}
