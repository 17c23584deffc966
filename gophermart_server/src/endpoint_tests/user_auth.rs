use std::sync::{Arc, Mutex};

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gm_common::Points;
use gophermart_engine::{db_types::User, traits::LedgerError, AccountApi};
use serde_json::json;

use super::{
    helpers::{post_json, post_raw_json, test_auth_config},
    mocks::MockLedger,
};
use crate::{auth::TokenIssuer, routes::{login, register}};

fn mount(cfg: &mut ServiceConfig, ledger: MockLedger) {
    let account_api = AccountApi::new(ledger);
    let signer = TokenIssuer::new(&test_auth_config());
    cfg.app_data(web::Data::new(account_api)).app_data(web::Data::new(signer)).service(
        web::scope("/api/user")
            .route("/register", web::post().to(register::<MockLedger>))
            .route("/login", web::post().to(login::<MockLedger>)),
    );
}

fn stored_user(user_id: &str, password: &str) -> User {
    let hash = bcrypt::hash(password, 4).expect("Failed to hash password");
    User { user_id: user_id.to_string(), password: hash, accrual: Points::default() }
}

#[actix_web::test]
async fn register_returns_a_bearer_token() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        // The ledger keeps whatever hash registration produced, so the
        // follow-up login inside the handler verifies against it.
        let stored: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let writer = Arc::clone(&stored);
        ledger.expect_user_add().returning(move |user| {
            *writer.lock().unwrap() = Some(user.password);
            Ok(())
        });
        ledger.expect_user_get().returning(move |user_id| {
            let hash = stored.lock().unwrap().clone();
            Ok(hash.map(|password| User { user_id: user_id.to_string(), password, accrual: Points::default() }))
        });
        mount(cfg, ledger);
    }

    let reply =
        post_json("", "/api/user/register", json!({"login": "user01", "password": "p"}), configure).await;
    assert_eq!(reply.status, StatusCode::OK);
    let header = reply.headers.get("authorization").expect("Authorization header must be set");
    assert!(header.to_str().unwrap().starts_with("Bearer "));
}

#[actix_web::test]
async fn duplicate_registration_is_a_conflict() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger
            .expect_user_add()
            .returning(|user| Err(LedgerError::UserAlreadyExists(user.user_id)));
        mount(cfg, ledger);
    }

    let reply =
        post_json("", "/api/user/register", json!({"login": "user01", "password": "p"}), configure).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn malformed_registration_body_is_a_bad_request() {
    fn configure(cfg: &mut ServiceConfig) {
        mount(cfg, MockLedger::new());
    }

    let reply = post_raw_json("", "/api/user/register", r#"{"login": }"#, configure).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_returns_a_bearer_token() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_user_get().returning(|user_id| {
            assert_eq!(user_id, "user01");
            Ok(Some(stored_user(user_id, "p")))
        });
        mount(cfg, ledger);
    }

    let reply = post_json("", "/api/user/login", json!({"login": "user01", "password": "p"}), configure).await;
    assert_eq!(reply.status, StatusCode::OK);
    let header = reply.headers.get("authorization").expect("Authorization header must be set");
    assert!(header.to_str().unwrap().starts_with("Bearer "));
}

#[actix_web::test]
async fn login_with_the_wrong_password_is_unauthorized() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_user_get().returning(|user_id| Ok(Some(stored_user(user_id, "p"))));
        mount(cfg, ledger);
    }

    let reply =
        post_json("", "/api/user/login", json!({"login": "user01", "password": "wrong"}), configure).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_of_an_unknown_user_is_unauthorized() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_user_get().returning(|_| Ok(None));
        mount(cfg, ledger);
    }

    let reply = post_json("", "/api/user/login", json!({"login": "ghost", "password": "p"}), configure).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}
