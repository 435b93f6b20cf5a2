use http::StatusCode;
use uuid::Uuid;

use petadopt_core::domain::{Aggregate, AggregateStore};
use petadopt_core::usecase::UseCase;
use petadopt_users::domain::types::{UserPreferences, UserRole, UserStatus};
use petadopt_users::error::UsersServiceError;
use petadopt_users::usecase::user::{
    ChangePasswordInput, RegisterUserInput, RegisterUserUseCase, SuspendUserInput,
    UpdateProfileInput,
};

use crate::helpers::{StaleEmailLookup, app_state, outbox_rows, user_store, users_db};

fn registration(email: &str) -> RegisterUserInput {
    RegisterUserInput {
        email: email.into(),
        full_name: "Ana Lima".into(),
        password_hash: "hash".into(),
        phone_number: None,
    }
}

#[tokio::test]
async fn should_normalize_and_save_registration() {
    let db = users_db().await;
    let state = app_state(&db);

    let user = state
        .register_user()
        .execute(RegisterUserInput {
            phone_number: Some("+55 11 98765-4321".into()),
            ..registration(" Ana@Example.com ")
        })
        .await
        .unwrap();

    assert_eq!(user.email().as_str(), "ana@example.com");
    assert_eq!(user.phone_number().unwrap().as_str(), "+5511987654321");
    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_reject_taken_email() {
    let db = users_db().await;
    let state = app_state(&db);
    state
        .register_user()
        .execute(registration("ana@example.com"))
        .await
        .unwrap();

    let err = state
        .register_user()
        .execute(registration("ANA@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, UsersServiceError::EmailAlreadyRegistered));
    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_reject_one_of_two_concurrent_registrations_of_one_email() {
    let db = users_db().await;
    let state = app_state(&db);
    let first = state.register_user();
    let second = state.register_user();

    let (a, b) = tokio::join!(
        first.execute(registration("dup@example.com")),
        second.execute(registration("DUP@example.com")),
    );

    let (winner, loser) = match (a, b) {
        (Ok(user), Err(err)) | (Err(err), Ok(user)) => (user, err),
        (a, b) => panic!("expected exactly one registration to win, got {a:?} and {b:?}"),
    };
    assert_eq!(winner.email().as_str(), "dup@example.com");
    assert!(matches!(loser, UsersServiceError::EmailAlreadyRegistered));
    assert_eq!(loser.status(), StatusCode::CONFLICT);
    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_return_conflict_when_email_is_taken_after_the_lookup() {
    let db = users_db().await;
    app_state(&db)
        .register_user()
        .execute(registration("ana@example.com"))
        .await
        .unwrap();
    let late = RegisterUserUseCase {
        repo: StaleEmailLookup(user_store(&db)),
    };

    let err = late
        .execute(registration("ana@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, UsersServiceError::EmailAlreadyRegistered));
    assert_eq!(err.status(), StatusCode::CONFLICT);
    assert_eq!(err.error_code(), 1102);
    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_store_preferences_from_profile_update() {
    let db = users_db().await;
    let state = app_state(&db);
    let user = state
        .register_user()
        .execute(registration("ana@example.com"))
        .await
        .unwrap();
    let prefs = UserPreferences {
        preferred_pet_type: Some("dog".into()),
        preferred_sizes: vec!["medium".into(), "large".into()],
        preferred_age_range: Some("adult".into()),
        receive_email_notifications: false,
        receive_sms_notifications: true,
    };

    let updated = state
        .update_profile()
        .execute(UpdateProfileInput {
            user_id: user.id(),
            full_name: None,
            phone_number: None,
            preferences: Some(prefs.clone()),
        })
        .await
        .unwrap();

    assert_eq!(updated.preferences(), &prefs);
    let stored = user_store(&db).find_by_id(user.id()).await.unwrap().unwrap();
    assert_eq!(stored.preferences(), &prefs);
    let rows = outbox_rows(&db).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].event_type, "UserProfileUpdatedEvent");
}

#[tokio::test]
async fn should_validate_registration_input() {
    let db = users_db().await;
    let state = app_state(&db);

    let err = state
        .register_user()
        .execute(registration("not-an-email"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert!(outbox_rows(&db).await.is_empty());
}

#[tokio::test]
async fn should_return_not_found_for_unknown_user() {
    let db = users_db().await;
    let state = app_state(&db);

    let err = state
        .promote_to_admin()
        .execute(Uuid::now_v7())
        .await
        .unwrap_err();

    assert!(matches!(err, UsersServiceError::UserNotFound));
}

#[tokio::test]
async fn should_enqueue_account_lifecycle_events_in_order() {
    let db = users_db().await;
    let state = app_state(&db);
    let user = state
        .register_user()
        .execute(registration("ana@example.com"))
        .await
        .unwrap();
    let id = user.id();

    state
        .update_profile()
        .execute(UpdateProfileInput {
            user_id: id,
            full_name: Some("Ana Maria Lima".into()),
            phone_number: None,
            preferences: None,
        })
        .await
        .unwrap();
    state
        .change_password()
        .execute(ChangePasswordInput {
            user_id: id,
            password_hash: "new-hash".into(),
        })
        .await
        .unwrap();
    let promoted = state.promote_to_admin().execute(id).await.unwrap();
    state.record_login().execute(id).await.unwrap();
    let suspended = state
        .suspend_user()
        .execute(SuspendUserInput {
            user_id: id,
            reason: "chargeback".into(),
        })
        .await
        .unwrap();
    let activated = state.activate_user().execute(id).await.unwrap();

    assert_eq!(promoted.role(), UserRole::Admin);
    assert_eq!(suspended.status(), UserStatus::Suspended);
    assert_eq!(activated.status(), UserStatus::Active);
    assert_eq!(activated.version(), 6);
    let types: Vec<_> = outbox_rows(&db)
        .await
        .into_iter()
        .map(|r| r.event_type)
        .collect();
    assert_eq!(
        types,
        vec![
            "UserRegisteredEvent",
            "UserProfileUpdatedEvent",
            "UserPasswordChangedEvent",
            "UserRoleChangedEvent",
            "UserSuspendedEvent",
        ]
    );
}

#[tokio::test]
async fn should_forbid_password_change_when_suspended() {
    let db = users_db().await;
    let state = app_state(&db);
    let user = state
        .register_user()
        .execute(registration("ana@example.com"))
        .await
        .unwrap();
    state
        .suspend_user()
        .execute(SuspendUserInput {
            user_id: user.id(),
            reason: "fraud".into(),
        })
        .await
        .unwrap();

    let err = state
        .change_password()
        .execute(ChangePasswordInput {
            user_id: user.id(),
            password_hash: "x".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert_eq!(outbox_rows(&db).await.len(), 2);
}
