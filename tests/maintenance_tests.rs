#![allow(clippy::unwrap_used)]

use chrono::Duration;
use keeper_bot::database::connection::DatabaseManager;
use keeper_bot::database::models::{Sender, User, UserMode};
use keeper_bot::services::maintenance::{expire_stale_modes, MaintenanceService};
use tempfile::{tempdir, TempDir};
use tokio_test::{assert_err, assert_ok};

async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.to_string_lossy());

    let db = DatabaseManager::new(&db_url).await.unwrap();
    db.run_migrations().await.unwrap();
    (db, dir)
}

async fn pending_user(db: &DatabaseManager, id: i64) {
    let sender = Sender { id, username: None, first_name: format!("User{id}") };
    User::touch(&db.pool, &sender).await.unwrap();
    User::set_mode(&db.pool, id, &UserMode::AwaitingRecordName).await.unwrap();
}

#[tokio::test]
async fn test_fresh_interactions_are_kept() {
    let (db, _temp_dir) = setup_test_db().await;
    pending_user(&db, 1).await;

    let expired = expire_stale_modes(&db.store(), Duration::minutes(30)).await.unwrap();
    assert!(expired.is_empty());

    let user = User::find_by_id(&db.pool, 1).await.unwrap().unwrap();
    assert_eq!(user.current_mode(), UserMode::AwaitingRecordName);
}

#[tokio::test]
async fn test_stale_interactions_are_reset() {
    let (db, _temp_dir) = setup_test_db().await;
    pending_user(&db, 1).await;
    pending_user(&db, 2).await;

    sqlx::query("UPDATE users SET mode_updated_at = '2020-01-01T00:00:00.000Z' WHERE id = 1")
        .execute(&db.pool)
        .await
        .unwrap();

    let expired = expire_stale_modes(&db.store(), Duration::minutes(30)).await.unwrap();
    assert_eq!(expired, vec![1]);

    let user = User::find_by_id(&db.pool, 1).await.unwrap().unwrap();
    assert_eq!(user.current_mode(), UserMode::Idle);
    let user = User::find_by_id(&db.pool, 2).await.unwrap().unwrap();
    assert_eq!(user.current_mode(), UserMode::AwaitingRecordName);
}

#[tokio::test]
async fn test_service_run_now_and_lifecycle() {
    let (db, _temp_dir) = setup_test_db().await;
    pending_user(&db, 1).await;
    sqlx::query("UPDATE users SET mode_updated_at = NULL WHERE id = 1")
        .execute(&db.pool)
        .await
        .unwrap();

    let mut service = MaintenanceService::new(db.store(), 30).await.unwrap();
    assert_ok!(service.start().await);

    assert_eq!(service.run_now().await.unwrap(), vec![1]);
    assert!(service.run_now().await.unwrap().is_empty());

    assert_ok!(service.stop().await);
}

#[tokio::test]
async fn test_closed_store_is_skipped() {
    let (db, _temp_dir) = setup_test_db().await;
    db.close().await;

    let expired = expire_stale_modes(&db.store(), Duration::minutes(30)).await.unwrap();
    assert!(expired.is_empty());
    assert_err!(User::count(&db.pool).await);
}
