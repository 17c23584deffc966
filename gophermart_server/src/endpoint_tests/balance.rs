use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use gm_common::Points;
use gophermart_engine::{
    db_types::{Balance, OrderNumber, User, Withdrawal},
    traits::LedgerError,
    AccountApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, post_json, test_auth_config},
    mocks::MockLedger,
};
use crate::{
    middleware::AuthMiddlewareFactory,
    routes::{balance, withdraw, withdrawals},
};

fn mount(cfg: &mut ServiceConfig, ledger: MockLedger) {
    let account_api = AccountApi::new(ledger);
    cfg.app_data(web::Data::new(account_api)).service(
        web::scope("/api/user")
            .wrap(AuthMiddlewareFactory::new(test_auth_config().jwt_secret))
            .route("/balance", web::get().to(balance::<MockLedger>))
            .route("/balance/withdraw", web::post().to(withdraw::<MockLedger>))
            .route("/withdrawals", web::get().to(withdrawals::<MockLedger>)),
    );
}

fn account(user_id: &str, points: Points) -> User {
    User { user_id: user_id.to_string(), password: "hash".to_string(), accrual: points }
}

fn withdrawal_row(user_id: &str, number: &str, sum: Points) -> Withdrawal {
    Withdrawal {
        user_id: user_id.to_string(),
        number: OrderNumber::parse(number).expect("Invalid order number in test"),
        sum,
        processed_at: Utc.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn balance_reports_current_and_withdrawn() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_balance_for_user().returning(|_| {
            Ok(Balance { current: Points::from_points(500), withdrawn: Points::from_points(42) })
        });
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = get_request(&token, "/api/user/balance", configure).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, r#"{"current":500,"withdrawn":42}"#);
}

#[actix_web::test]
async fn fractional_balances_survive_the_wire() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_balance_for_user().returning(|_| {
            Ok(Balance { current: Points::try_from_f64(600.5).unwrap(), withdrawn: Points::default() })
        });
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = get_request(&token, "/api/user/balance", configure).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, r#"{"current":600.5,"withdrawn":0}"#);
}

#[actix_web::test]
async fn a_withdrawal_within_the_balance_succeeds() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_user_get().returning(|user_id| Ok(Some(account(user_id, Points::from_points(500)))));
        ledger.expect_withdraw().returning(|w| {
            assert_eq!(w.sum, Points::from_points(250));
            Ok(withdrawal_row(&w.user_id, w.number.as_str(), w.sum))
        });
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let body = json!({"order": "12345678903", "sum": 250});
    let reply = post_json(&token, "/api/user/balance/withdraw", body, configure).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[actix_web::test]
async fn an_overdraw_is_payment_required() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_user_get().returning(|user_id| Ok(Some(account(user_id, Points::from_points(100)))));
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let body = json!({"order": "12345678903", "sum": 250});
    let reply = post_json(&token, "/api/user/balance/withdraw", body, configure).await;
    assert_eq!(reply.status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn losing_the_withdrawal_race_is_payment_required() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        // The pre-check passes, but the guarded debit in the ledger loses a
        // race and reports insufficient funds.
        ledger.expect_user_get().returning(|user_id| Ok(Some(account(user_id, Points::from_points(500)))));
        ledger.expect_withdraw().returning(|w| Err(LedgerError::InsufficientFunds(w.sum)));
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let body = json!({"order": "12345678903", "sum": 250});
    let reply = post_json(&token, "/api/user/balance/withdraw", body, configure).await;
    assert_eq!(reply.status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn a_withdrawal_against_an_invalid_order_is_unprocessable() {
    fn configure(cfg: &mut ServiceConfig) {
        mount(cfg, MockLedger::new());
    }

    let token = issue_token("user01");
    let body = json!({"order": "2377225625", "sum": 250});
    let reply = post_json(&token, "/api/user/balance/withdraw", body, configure).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn a_duplicate_withdrawal_order_is_a_conflict() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_user_get().returning(|user_id| Ok(Some(account(user_id, Points::from_points(500)))));
        ledger.expect_withdraw().returning(|w| Err(LedgerError::WithdrawalAlreadyExists(w.number)));
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let body = json!({"order": "12345678903", "sum": 250});
    let reply = post_json(&token, "/api/user/balance/withdraw", body, configure).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn withdrawals_serialise_per_the_api_contract() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_withdrawals_for_user().returning(|user_id| {
            Ok(vec![withdrawal_row(user_id, "12345678903", Points::from_points(250))])
        });
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = get_request(&token, "/api/user/withdrawals", configure).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, r#"[{"order":"12345678903","sum":250,"processed_at":"2024-07-03T12:00:00Z"}]"#);
}

#[actix_web::test]
async fn balance_requires_a_token() {
    fn configure(cfg: &mut ServiceConfig) {
        mount(cfg, MockLedger::new());
    }

    let reply = get_request("", "/api/user/balance", configure).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}
