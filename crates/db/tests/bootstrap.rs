use sqlx::PgPool;

/// Connect, migrate, verify seed data.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    admissions_db::health_check(&pool).await.unwrap();

    let roles: Vec<String> = sqlx::query_scalar("SELECT name FROM roles ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(roles, vec!["admin".to_string(), "applicant".to_string()]);

    for table in ["users", "user_sessions", "applicants", "draft_store", "applications"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count, 0, "{table} should start empty");
    }
}

/// `updated_at` is maintained by trigger.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updated_at_trigger(pool: PgPool) {
    let (id, before): (i64, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
        "INSERT INTO roles (name) VALUES ('tmp') RETURNING id, updated_at",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let after: chrono::DateTime<chrono::Utc> =
        sqlx::query_scalar("UPDATE roles SET description = 'x' WHERE id = $1 RETURNING updated_at")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(after >= before);
}
