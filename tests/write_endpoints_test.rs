use axum::body::Body;
use axum::http::{Request, StatusCode};
use circlesplit::api;
use circlesplit::datasource::MockLedgerSource;
use circlesplit::domain::{Address, DebtId, DebtRecord, TimeSecs, U256};
use circlesplit::engine::SettlementClock;
use circlesplit::orchestration::{LedgerService, PollerRegistry, SplitExecutor};
use circlesplit::receipt::ScanChain;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const CAROL: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
const DAVE: &str = "0xdddddddddddddddddddddddddddddddddddddddd";

fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn setup_test_app(mock: &MockLedgerSource) -> axum::Router {
    setup_with_registry(mock).0
}

fn setup_with_registry(mock: &MockLedgerSource) -> (axum::Router, PollerRegistry) {
    let mock = Arc::new(mock.clone());
    let service = LedgerService::new(mock.clone(), mock.clone(), SettlementClock::default());
    let registry = PollerRegistry::new(service, Duration::from_secs(3600));
    let state = api::AppState::new(
        registry.clone(),
        SplitExecutor::new(mock),
        ScanChain::default(),
    );
    (api::create_router(state), registry)
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_equal_split_writes_every_share() {
    let mock = MockLedgerSource::new();
    let app = setup_test_app(&mock);

    let (status, body) = send(
        app.clone(),
        post_json(
            "/v1/splits",
            serde_json::json!({
                "creditor": ALICE,
                "total": "90.00",
                "debtors": [BOB, CAROL],
                "includeCreditor": true
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], 2);
    assert_eq!(body["total"], 2);
    assert_eq!(body["txHashes"].as_array().unwrap().len(), 2);
    assert!(body.get("failure").is_none());

    let debts = mock.debts().await;
    assert_eq!(debts.len(), 2);
    assert!(debts.iter().all(|d| d.creditor == addr(ALICE)));
    assert!(debts
        .iter()
        .all(|d| d.amount_wei == U256::from(30_000_000_000_000_000_000u128)));

    let req = Request::builder()
        .uri(format!("/v1/balances?user={}", ALICE))
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(app, req).await;
    assert_eq!(body["owed"], "60");
}

#[tokio::test]
async fn test_split_halts_at_failed_write() {
    let mock = MockLedgerSource::new().with_revert_at_write(1);
    let app = setup_test_app(&mock);

    let (status, body) = send(
        app,
        post_json(
            "/v1/splits",
            serde_json::json!({
                "creditor": ALICE,
                "shares": [
                    { "debtor": BOB, "amount": "12.50" },
                    { "debtor": CAROL, "amount": "12.50" },
                    { "debtor": DAVE, "amount": "12.50" }
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["completed"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["failure"]["index"], 1);
    assert_eq!(body["failure"]["debtor"], CAROL);
    assert!(body["failure"]["error"].as_str().unwrap().contains("reverted"));

    assert_eq!(mock.writes_attempted(), 2);
    let debts = mock.debts().await;
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].debtor, addr(BOB));
}

#[tokio::test]
async fn test_split_validation_errors() {
    let mock = MockLedgerSource::new();
    let app = setup_test_app(&mock);

    let cases = [
        serde_json::json!({ "creditor": ALICE }),
        serde_json::json!({ "creditor": ALICE, "shares": [{ "debtor": ALICE, "amount": "5" }] }),
        serde_json::json!({ "creditor": ALICE, "shares": [{ "debtor": BOB, "amount": "-5" }] }),
        serde_json::json!({ "creditor": ALICE, "shares": [{ "debtor": BOB, "amount": "five" }] }),
        serde_json::json!({ "creditor": "alice", "total": "10", "debtors": [BOB] }),
        serde_json::json!({ "creditor": ALICE, "total": "10", "debtors": [] }),
    ];
    for case in cases {
        let (status, body) = send(app.clone(), post_json("/v1/splits", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", case);
        assert!(body["error"].is_string());
    }
    assert_eq!(mock.writes_attempted(), 0);
}

#[tokio::test]
async fn test_settle_debt() {
    let record = DebtRecord::new(
        DebtId::new(9),
        addr(ALICE),
        addr(BOB),
        U256::from(5_000_000_000_000_000_000u128),
        TimeSecs::new(1_700_000_000),
        false,
    );
    let mock = MockLedgerSource::new().with_debt(record);
    let (app, registry) = setup_with_registry(&mock);

    // Alice is polled on a long interval, so only a settlement wake-up
    // can change her view.
    let mut alice_rx = registry.watch(&addr(ALICE)).await;
    tokio::time::timeout(Duration::from_secs(5), alice_rx.wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap();

    let (status, _) = send(
        app.clone(),
        Request::builder()
            .method("POST")
            .uri(format!("/v1/debts/9/settle?user={}", ALICE))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, body) = send(
        app.clone(),
        Request::builder()
            .method("POST")
            .uri(format!("/v1/debts/9/settle?user={}", BOB))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["debtId"], "9");
    assert!(body["txHash"].as_str().unwrap().starts_with("0x"));
    assert!(mock.debts().await[0].settled);

    let refreshed = tokio::time::timeout(
        Duration::from_secs(5),
        alice_rx.wait_for(|view| view.as_ref().is_some_and(|v| v.balance.owed.is_zero())),
    )
    .await
    .map(|changed| changed.is_ok())
    .unwrap_or(false);
    assert!(refreshed, "creditor view was not refreshed");

    let req = Request::builder()
        .uri(format!("/v1/balances?user={}", ALICE))
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(app.clone(), req).await;
    assert_eq!(body["owed"], "0");

    let (status, _) = send(
        app,
        Request::builder()
            .method("POST")
            .uri(format!("/v1/debts/nine/settle?user={}", BOB))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_without_scanners_returns_demo() {
    let app = setup_test_app(&MockLedgerSource::new());
    let req = Request::builder()
        .method("POST")
        .uri("/v1/receipts/scan")
        .header("content-type", "image/png")
        .body(Body::from(vec![0x89, 0x50, 0x4e, 0x47]))
        .unwrap();

    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "demo");
    assert_eq!(body["receipt"]["merchant"], "Demo Restaurant");
    assert_eq!(body["receipt"]["items"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_scan_rejects_empty_body() {
    let app = setup_test_app(&MockLedgerSource::new());
    let req = Request::builder()
        .method("POST")
        .uri("/v1/receipts/scan")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_itemized_share_in_euros() {
    let app = setup_test_app(&MockLedgerSource::new());
    let receipt = serde_json::json!({
        "merchant": "Bistro",
        "date": "2024-05-01",
        "items": [
            { "name": "Pasta", "quantity": 1, "price": 20.0, "total": 20.0 },
            { "name": "Wine", "quantity": 1, "price": 30.0, "total": 30.0 }
        ],
        "subtotal": 50.0,
        "tax": 5.0,
        "tip": 10.0,
        "total": 65.0
    });

    let (status, body) = send(
        app,
        post_json(
            "/v1/receipts/share",
            serde_json::json!({ "receipt": receipt, "selectedItems": [0], "currency": "eur" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "EUR");
    assert_eq!(body["share"], "26.00");
    assert_eq!(body["formatted"], "€26.00");
    // 26 / 0.92, rounded to cents
    assert_eq!(body["usd"], "28.26");
}

#[tokio::test]
async fn test_itemized_share_unknown_item() {
    let app = setup_test_app(&MockLedgerSource::new());
    let receipt = serde_json::json!({ "items": [], "subtotal": 0, "total": 0 });
    let (status, _) = send(
        app,
        post_json(
            "/v1/receipts/share",
            serde_json::json!({ "receipt": receipt, "selectedItems": [3] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
