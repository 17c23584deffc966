use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use gm_common::Points;
use gophermart_engine::{
    db_types::{Order, OrderNumber, OrderStatus},
    traits::LedgerError,
    OrdersApi,
};

use super::{
    helpers::{get_request, issue_token, post_plain, test_auth_config},
    mocks::MockLedger,
};
use crate::{
    middleware::AuthMiddlewareFactory,
    routes::{order_history, submit_order},
};

fn mount(cfg: &mut ServiceConfig, ledger: MockLedger) {
    let orders_api = OrdersApi::new(ledger);
    cfg.app_data(web::Data::new(orders_api)).service(
        web::scope("/api/user")
            .wrap(AuthMiddlewareFactory::new(test_auth_config().jwt_secret))
            .route("/orders", web::post().to(submit_order::<MockLedger>))
            .route("/orders", web::get().to(order_history::<MockLedger>)),
    );
}

fn order_row(number: &str, user_id: &str) -> Order {
    Order {
        number: OrderNumber::parse(number).expect("Invalid order number in test"),
        user_id: user_id.to_string(),
        status: OrderStatus::New,
        accrual: Points::default(),
        uploaded_at: Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn a_new_order_is_accepted() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_order_get().returning(|_| Ok(None));
        ledger.expect_order_add().returning(|user_id, number| {
            assert_eq!(user_id, "user01");
            Ok(order_row(number.as_str(), user_id))
        });
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = post_plain(&token, "/api/user/orders", "2377225624", configure).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn resubmission_by_the_same_user_returns_ok() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_order_get().returning(|number| Ok(Some(order_row(number.as_str(), "user01"))));
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = post_plain(&token, "/api/user/orders", "2377225624", configure).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[actix_web::test]
async fn another_users_order_is_a_conflict() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_order_get().returning(|number| Ok(Some(order_row(number.as_str(), "user02"))));
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = post_plain(&token, "/api/user/orders", "2377225624", configure).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn an_insert_that_loses_the_race_is_a_conflict() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_order_get().returning(|_| Ok(None));
        ledger.expect_order_add().returning(|_, number| Err(LedgerError::OrderAlreadyExists(number.clone())));
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = post_plain(&token, "/api/user/orders", "2377225624", configure).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn a_luhn_failure_is_unprocessable() {
    fn configure(cfg: &mut ServiceConfig) {
        // No expectations: the request must be rejected before the ledger is touched.
        mount(cfg, MockLedger::new());
    }

    let token = issue_token("user01");
    let reply = post_plain(&token, "/api/user/orders", "2377225625", configure).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let reply = post_plain(&token, "/api/user/orders", "not-a-number", configure).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn uploads_require_a_token() {
    fn configure(cfg: &mut ServiceConfig) {
        mount(cfg, MockLedger::new());
    }

    let reply = post_plain("", "/api/user/orders", "2377225624", configure).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_garbage_token_is_rejected() {
    fn configure(cfg: &mut ServiceConfig) {
        mount(cfg, MockLedger::new());
    }

    let reply = post_plain("nonsense.token.here", "/api/user/orders", "2377225624", configure).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn order_history_serialises_per_the_api_contract() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_orders_for_user().returning(|user_id| {
            assert_eq!(user_id, "user01");
            let mut processed = order_row("12345678903", user_id);
            processed.status = OrderStatus::Processed;
            processed.accrual = Points::from_points(500);
            processed.uploaded_at = Utc.with_ymd_and_hms(2024, 7, 2, 9, 30, 0).unwrap();
            Ok(vec![order_row("2377225624", user_id), processed])
        });
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = get_request(&token, "/api/user/orders", configure).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body,
        r#"[{"number":"2377225624","status":"NEW","uploaded_at":"2024-07-01T10:00:00Z"},{"number":"12345678903","status":"PROCESSED","accrual":500,"uploaded_at":"2024-07-02T09:30:00Z"}]"#
    );
}

#[actix_web::test]
async fn an_empty_history_is_an_empty_array() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut ledger = MockLedger::new();
        ledger.expect_orders_for_user().returning(|_| Ok(Vec::new()));
        mount(cfg, ledger);
    }

    let token = issue_token("user01");
    let reply = get_request(&token, "/api/user/orders", configure).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "[]");
}
