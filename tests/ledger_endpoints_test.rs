use axum::http::StatusCode;
use circlesplit::api;
use circlesplit::datasource::MockLedgerSource;
use circlesplit::domain::{Address, DebtId, DebtRecord, ScoreSnapshot, TimeSecs, U256};
use circlesplit::engine::SettlementClock;
use circlesplit::orchestration::{LedgerService, PollerRegistry, SplitExecutor};
use circlesplit::receipt::ScanChain;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const CAROL: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

const WEI: u128 = 1_000_000_000_000_000_000;
const T0: i64 = 1_700_000_000;

fn setup_test_app(mock: MockLedgerSource) -> axum::Router {
    let mock = Arc::new(mock);
    let service = LedgerService::new(mock.clone(), mock.clone(), SettlementClock::default());
    let registry = PollerRegistry::new(service, Duration::from_secs(3600));
    let state = api::AppState::new(registry, SplitExecutor::new(mock), ScanChain::default());
    api::create_router(state)
}

fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn debt(id: u64, creditor: &str, debtor: &str, units: u128, created_at: i64) -> DebtRecord {
    DebtRecord::new(
        DebtId::new(id),
        addr(creditor),
        addr(debtor),
        U256::from(units * WEI),
        TimeSecs::new(created_at),
        false,
    )
}

/// Bob paid Alice back two hours after the split; Carol owes Bob.
fn circle() -> MockLedgerSource {
    MockLedgerSource::new()
        .with_debt(debt(1, ALICE, BOB, 25, T0).with_settled_at(TimeSecs::new(T0 + 2 * 3600)))
        .with_debt(debt(2, BOB, CAROL, 40, T0 + 86_400))
        .with_debt(debt(3, ALICE, CAROL, 7, T0 + 100))
}

async fn request(app: axum::Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = setup_test_app(MockLedgerSource::new());
    let (status, body) = request(app.clone(), "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(app, "GET", "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["receiptScanners"], 0);
}

#[tokio::test]
async fn test_balances_exclude_settled_debts() {
    let app = setup_test_app(circle());
    let (status, body) = request(app, "GET", &format!("/v1/balances?user={}", BOB)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owed"], "40");
    assert_eq!(body["owing"], "0");
    assert_eq!(body["net"], "40");
    assert_eq!(body["failedDebtIds"], serde_json::json!([]));
}

#[tokio::test]
async fn test_balances_unsettled_debtor_scenario() {
    let mock = MockLedgerSource::new().with_debt(debt(1, ALICE, BOB, 25, T0));
    let app = setup_test_app(mock);
    let (status, body) = request(app, "GET", &format!("/v1/balances?user={}", BOB)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owing"], "25");
    assert_eq!(body["owed"], "0");
    assert_eq!(body["net"], "-25");
}

#[tokio::test]
async fn test_balances_accept_mixed_case_address() {
    let app = setup_test_app(circle());
    let upper = format!("0x{}", "B".repeat(40));
    let (status, body) = request(app, "GET", &format!("/v1/balances?user={}", upper)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], BOB);
    assert_eq!(body["owed"], "40");
}

#[tokio::test]
async fn test_failed_record_read_is_dropped() {
    let app = setup_test_app(circle().with_failing_read(DebtId::new(2)));
    let (status, body) = request(app, "GET", &format!("/v1/balances?user={}", BOB)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owed"], "0");
    assert_eq!(body["failedDebtIds"], serde_json::json!(["2"]));
}

#[tokio::test]
async fn test_invalid_user_address() {
    let app = setup_test_app(circle());
    for uri in [
        "/v1/balances?user=bob",
        "/v1/debts?user=0x123",
        "/v1/timeline?user=0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
        "/v1/score?user=",
    ] {
        let (status, body) = request(app.clone(), "GET", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "Invalid user address");
    }
}

#[tokio::test]
async fn test_listing_failure_is_upstream_error() {
    let app = setup_test_app(MockLedgerSource::new().with_failing_id_listing());
    let (status, body) = request(app, "GET", &format!("/v1/balances?user={}", BOB)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("mock listing failure"));
}

#[tokio::test]
async fn test_debts_are_directed() {
    let app = setup_test_app(circle());
    let (status, body) = request(app, "GET", &format!("/v1/debts?user={}", BOB)).await;

    assert_eq!(status, StatusCode::OK);
    let debts = body["debts"].as_array().unwrap();
    assert_eq!(debts.len(), 2);
    assert_eq!(debts[0]["id"], "1");
    assert_eq!(debts[0]["counterparty"], ALICE);
    assert_eq!(debts[0]["isUserDebtor"], true);
    assert_eq!(debts[0]["settled"], true);
    assert_eq!(debts[1]["id"], "2");
    assert_eq!(debts[1]["counterparty"], CAROL);
    assert_eq!(debts[1]["isUserDebtor"], false);
    assert_eq!(debts[1]["amount"], "40");
}

#[tokio::test]
async fn test_timeline_newest_first() {
    let app = setup_test_app(circle());
    let (status, body) = request(app, "GET", &format!("/v1/timeline?user={}", BOB)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2-split", "1-payment", "1-split"]);
}

#[tokio::test]
async fn test_timeline_on_time_payment() {
    let app = setup_test_app(circle());
    let (status, body) = request(
        app,
        "GET",
        &format!("/v1/timeline?user={}&filter=payment", BOB),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["kind"], "payment");
    assert_eq!(events[0]["onTime"], true);
    assert_eq!(events[0]["scoreImpact"], 10);
    assert_eq!(events[0]["settlementApproximated"], false);
    assert_eq!(events[0]["timestamp"], T0 + 7200);
}

#[tokio::test]
async fn test_timeline_late_payment() {
    let mock = MockLedgerSource::new()
        .with_debt(debt(1, ALICE, BOB, 25, T0).with_settled_at(TimeSecs::new(T0 + 30 * 3600)));
    let app = setup_test_app(mock);
    let (_, body) = request(
        app,
        "GET",
        &format!("/v1/timeline?user={}&filter=payment", BOB),
    )
    .await;

    let events = body["events"].as_array().unwrap();
    assert_eq!(events[0]["onTime"], false);
    assert_eq!(events[0]["scoreImpact"], -50);
}

#[tokio::test]
async fn test_timeline_approximated_settlement() {
    let mut record = debt(1, ALICE, BOB, 25, T0);
    record.settled = true;
    let app = setup_test_app(MockLedgerSource::new().with_debt(record));
    let (_, body) = request(
        app,
        "GET",
        &format!("/v1/timeline?user={}&filter=payment", BOB),
    )
    .await;

    let events = body["events"].as_array().unwrap();
    assert_eq!(events[0]["settlementApproximated"], true);
    assert_eq!(events[0]["timestamp"], T0 + 3600);
    assert_eq!(events[0]["onTime"], true);
}

#[tokio::test]
async fn test_timeline_search_and_sort() {
    let app = setup_test_app(circle());
    let (_, body) = request(
        app.clone(),
        "GET",
        &format!("/v1/timeline?user={}&search=CCCC", BOB),
    )
    .await;
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["otherParty"], CAROL);

    let (_, body) = request(
        app,
        "GET",
        &format!("/v1/timeline?user={}&sort=lowest", BOB),
    )
    .await;
    let amounts: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["amount"].as_str().unwrap())
        .collect();
    assert_eq!(amounts, vec!["25", "25", "40"]);
}

#[tokio::test]
async fn test_timeline_rejects_unknown_filter() {
    let app = setup_test_app(circle());
    let (status, body) = request(
        app,
        "GET",
        &format!("/v1/timeline?user={}&filter=refund", BOB),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid filter"));
}

#[tokio::test]
async fn test_score_without_contract_data() {
    let app = setup_test_app(MockLedgerSource::new());
    let (status, body) = request(app, "GET", &format!("/v1/score?user={}", ALICE)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 500);
    assert_eq!(body["tier"], "Building");
    assert!(body.get("details").is_none());
    assert_eq!(body["borrowingPower"], "0");
    assert_eq!(
        body["projection"],
        serde_json::json!([
            { "label": "Start", "score": 500 },
            { "label": "Now", "score": 500 }
        ])
    );
}

#[tokio::test]
async fn test_score_with_details() {
    let snapshot = ScoreSnapshot {
        total_score: 760,
        bills_split: 20,
        loans_repaid: 2,
        late_payments: 1,
        on_time_payments: 12,
        last_activity_timestamp: T0,
    };
    let mock = MockLedgerSource::new().with_score(&addr(ALICE), snapshot);
    let app = setup_test_app(mock);
    let (status, body) = request(app, "GET", &format!("/v1/score?user={}", ALICE)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 760);
    assert_eq!(body["tier"], "Excellent");
    assert_eq!(body["details"]["billsSplit"], 20);
    let projection = body["projection"].as_array().unwrap();
    assert_eq!(projection.first().unwrap()["label"], "Start");
    assert_eq!(projection.last().unwrap()["label"], "Now");
    assert_eq!(projection.last().unwrap()["score"], 760);
    assert!(projection
        .iter()
        .all(|p| (300..=850).contains(&p["score"].as_u64().unwrap())));
}

#[tokio::test]
async fn test_watch_lifecycle() {
    let app = setup_test_app(circle());
    let (status, body) = request(app.clone(), "PUT", &format!("/v1/watch?user={}", BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["watching"], true);

    let (_, body) = request(app.clone(), "GET", "/v1/watch").await;
    assert_eq!(body, serde_json::json!([BOB]));

    let (status, body) = request(app.clone(), "DELETE", &format!("/v1/watch?user={}", BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["watching"], false);

    let (status, _) = request(app, "DELETE", &format!("/v1/watch?user={}", BOB)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
