mod common;

use common::*;
use server::auth::ClaimsDecoder;
use server::auth::guard::PERMISSION_DENIED;
use server::error::ServiceError;
use server::services::users::{EMAIL_TAKEN, INVALID_LOGIN, NAME_TAKEN, NON_MVP, USER_NOT_FOUND};
use shared::types::{CreateUserRequest, LoginData};

fn login(id: &str, password: &str) -> LoginData {
    LoginData {
        id: id.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn new_users_start_empty() {
    let state = memory_state().await;
    let user = register(&state, "alice").await;

    assert_eq!(user.name, "alice");
    assert_eq!((user.coins, user.gems), (0, 0));
    assert!(!user.is_admin);

    let stats = state.stats.get_stats("alice").await.unwrap();
    assert_eq!((stats.games, stats.wins, stats.top5, stats.kills), (0, 0, 0, 0));
}

#[tokio::test]
async fn duplicate_name_or_email_is_rejected() {
    let state = memory_state().await;
    register(&state, "alice").await;

    let err = state
        .users
        .create_user(&CreateUserRequest {
            name: "alice".into(),
            email: "other@example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::invalid(NAME_TAKEN));

    let err = state
        .users
        .create_user(&CreateUserRequest {
            name: "alice2".into(),
            email: "alice@example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::invalid(EMAIL_TAKEN));
}

#[tokio::test]
async fn malformed_registration_is_rejected() {
    let state = memory_state().await;
    for (name, email, password) in [
        ("a", "a@example.com", PASSWORD),
        ("alice", "not-an-email", PASSWORD),
        ("alice", "alice@example.com", "short"),
    ] {
        let err = state
            .users
            .create_user(&CreateUserRequest {
                name: name.into(),
                email: email.into(),
                password: password.into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)), "{}", name);
    }
}

#[tokio::test]
async fn login_issues_a_user_token() {
    let state = memory_state().await;
    let user = register(&state, "alice").await;

    for identifier in ["alice", "alice@example.com", user.id.as_str()] {
        let res = state.users.login(&login(identifier, PASSWORD)).await.unwrap();
        assert!(!res.is_admin);

        let claims = ClaimsDecoder::new(true, SECRET).decode(&res.token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.aud, "medieval");
        assert_eq!(claims.iss, "users-service");
        assert_eq!(claims.exp, res.expires_at);
        assert_eq!(claims.exp - claims.iat, 480 * 60);
        assert!(!claims.jti.is_empty());
    }
}

#[tokio::test]
async fn bad_credentials_share_one_message() {
    let state = memory_state().await;
    register(&state, "alice").await;

    let wrong_password = state
        .users
        .login(&login("alice", "wrong-password1"))
        .await
        .unwrap_err();
    let unknown_user = state
        .users
        .login(&login("nobody", PASSWORD))
        .await
        .unwrap_err();

    assert_eq!(wrong_password, ServiceError::invalid(INVALID_LOGIN));
    assert_eq!(unknown_user, ServiceError::invalid(INVALID_LOGIN));
}

#[tokio::test]
async fn users_read_themselves_by_any_identifier() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;
    register(&state, "bob").await;

    for identifier in ["alice", "alice@example.com", alice.id.as_str()] {
        let view = state.users.read_user(&player(&alice), identifier).await.unwrap();
        assert_eq!(view.id, alice.id);
    }

    let err = state.users.read_user(&player(&alice), "bob").await.unwrap_err();
    assert_eq!(err, ServiceError::Unauthenticated(PERMISSION_DENIED.into()));

    let err = state.users.read_user(&admin(), "nobody").await.unwrap_err();
    assert_eq!(err, ServiceError::not_found(USER_NOT_FOUND));
}

#[tokio::test]
async fn delete_is_self_or_admin_and_idempotent() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;

    let err = state
        .users
        .delete_user(&player(&alice), &bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthenticated(_)));

    state.users.delete_user(&player(&alice), &alice.id).await.unwrap();
    state.users.delete_user(&admin(), &alice.id).await.unwrap();

    let err = state.users.read_user(&admin(), &alice.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    // Stats went with the user.
    assert!(matches!(
        state.stats.get_stats("alice").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn update_and_list_are_not_offered() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;

    assert_eq!(
        state.users.update_user(&alice.id).await.unwrap_err(),
        ServiceError::Unimplemented(NON_MVP.into())
    );
    assert_eq!(
        state.users.list_users().await.unwrap_err(),
        ServiceError::Unimplemented(NON_MVP.into())
    );
}

#[tokio::test]
async fn promoted_users_log_in_as_admins() {
    let state = memory_state().await;
    register(&state, "alice").await;

    let view = state.users.promote("alice@example.com").await.unwrap();
    assert!(view.is_admin);

    let res = state.users.login(&login("alice", PASSWORD)).await.unwrap();
    assert!(res.is_admin);
    let claims = ClaimsDecoder::Unverified.decode(&res.token).unwrap();
    assert!(claims.is_admin);
}

#[tokio::test]
async fn service_tokens_carry_the_service_audience() {
    let state = memory_state().await;

    let (token, _) = state.users.service_token("matchmaker", 600).await.unwrap();
    let claims = ClaimsDecoder::new(true, SECRET).decode(&token).unwrap();
    assert!(claims.is_service());
    assert_eq!(claims.sub, "matchmaker");

    assert!(state.users.service_token("", 600).await.is_err());
    assert!(state.users.service_token("matchmaker", 0).await.is_err());
}

#[tokio::test]
async fn email_is_stored_and_matched_as_typed() {
    let state = memory_state().await;
    let bob = state
        .users
        .create_user(&CreateUserRequest {
            name: "bob".into(),
            email: "Bob@Example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
    assert_eq!(bob.email, "Bob@Example.com");

    let res = state
        .users
        .login(&login("Bob@Example.com", PASSWORD))
        .await
        .unwrap();
    let claims = ClaimsDecoder::Unverified.decode(&res.token).unwrap();
    assert_eq!(claims.user_id, bob.id);

    let view = state
        .users
        .read_user(&player(&bob), "Bob@Example.com")
        .await
        .unwrap();
    assert_eq!(view.id, bob.id);
}

#[tokio::test]
async fn email_collision_at_insert_reports_the_email() {
    let (state, db) = memory_state_with_pool().await;
    register(&state, "alice").await;

    // Stricter than the pre-insert check, so only the insert catches it.
    sqlx::query("CREATE UNIQUE INDEX users_email_nocase ON users (lower(email))")
        .execute(&db)
        .await
        .unwrap();

    let err = state
        .users
        .create_user(&CreateUserRequest {
            name: "alice2".into(),
            email: "ALICE@example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err, ServiceError::invalid(EMAIL_TAKEN));
    assert!(matches!(
        state.users.read_user(&admin(), "alice2").await,
        Err(ServiceError::NotFound(_))
    ));
}
