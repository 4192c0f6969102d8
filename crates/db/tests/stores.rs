//! The Postgres collaborators driving the real intake flow.

use std::sync::Arc;

use admissions_core::consent::ConsentPolicy;
use admissions_core::persistence::{KeyValueStore, PersistenceBridge};
use admissions_core::session::WizardSession;
use admissions_core::submission::IdentityDirectory;
use admissions_core::wizard::{FormStep, WizardState};
use admissions_db::models::applicant::CreateApplicant;
use admissions_db::models::user::CreateUser;
use admissions_db::repositories::{ApplicantRepo, RoleRepo, UserRepo};
use admissions_db::stores::{PgDraftStore, PgIdentityDirectory};
use sqlx::PgPool;

async fn owner(pool: &PgPool) -> i64 {
    let role = RoleRepo::find_by_name(pool, "applicant").await.unwrap().unwrap();
    UserRepo::create(
        pool,
        &CreateUser {
            username: "owner".into(),
            email: "owner@example.com".into(),
            display_name: "Owner".into(),
            password_hash: "hash".into(),
            role_id: role.id,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pg_draft_store_behaves_as_key_value_store(pool: PgPool) {
    let store = PgDraftStore::new(pool.clone(), owner(&pool).await);
    assert_eq!(store.get("a").await.unwrap(), None);
    store.set("a", "1").await.unwrap();
    assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    store.remove("a").await.unwrap();
    store.remove("a").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_corrupt_draft_in_postgres_is_discarded(pool: PgPool) {
    let store = Arc::new(PgDraftStore::new(pool.clone(), owner(&pool).await));
    store.set("u:application_draft", "{not json").await.unwrap();

    let bridge = PersistenceBridge::new(store.clone(), "u");
    assert!(bridge.load().await.unwrap().is_none());
    assert_eq!(store.get("u:application_draft").await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_session_resumes_from_postgres(pool: PgPool) {
    let store: Arc<PgDraftStore> = Arc::new(PgDraftStore::new(pool.clone(), owner(&pool).await));
    let mut draft = admissions_core::draft::ApplicationDraft::default();
    draft.personal_info.name = "Resumed".into();
    PersistenceBridge::new(store.clone(), "u")
        .save(&draft, FormStep::Goals)
        .await
        .unwrap();

    let session = WizardSession::open(
        PersistenceBridge::new(store, "u"),
        ConsentPolicy::PerSession,
    )
    .await
    .unwrap();
    assert_eq!(
        session.state(),
        WizardState::AwaitingConsent {
            resume_step: FormStep::Goals
        }
    );
    assert_eq!(session.controller().draft().personal_info.name, "Resumed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_identity_directory_resolves_by_email(pool: PgPool) {
    let applicant = ApplicantRepo::create(
        &pool,
        &CreateApplicant {
            user_id: None,
            full_name: "Maria".into(),
            email: "maria@example.com".into(),
            mobile_number: None,
        },
    )
    .await
    .unwrap();

    let directory = PgIdentityDirectory::new(pool.clone());
    assert_eq!(
        directory.find_applicant("MARIA@example.com").await.unwrap(),
        Some(applicant.id)
    );
    assert_eq!(directory.find_applicant("x@example.com").await.unwrap(), None);
}
