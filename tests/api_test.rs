use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use swift_codes::api::{router, AppState};
use swift_codes::{
    BankRepository, BankService, CountryCode, Deadline, Headquarter, MemoryStore, SwiftCode,
};
use tower::ServiceExt;

fn test_app() -> (Router, BankRepository) {
    let repo = BankRepository::new(Arc::new(MemoryStore::new()));
    let service = BankService::new(repo.clone());
    let app = router(AppState::new(service, Duration::from_secs(5)));
    (app, repo)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/swift-codes")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn deutsche_hq() -> Value {
    json!({
        "swiftCode": "DEUTDEFFXXX",
        "bankName": "Deutsche Bank",
        "address": "Taunusanlage 12",
        "countryISO2": "DE",
        "countryName": "Germany",
        "isHeadquarter": true
    })
}

fn deutsche_branch(code: &str) -> Value {
    json!({
        "swiftCode": code,
        "bankName": "Deutsche Bank",
        "address": "Unter den Linden 13",
        "countryISO2": "DE",
        "countryName": "Germany",
        "isHeadquarter": false
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_get_headquarter_without_branches() {
    let (app, repo) = test_app();
    let hq = Headquarter::new(
        SwiftCode::parse("DEUTDEFFXXX").unwrap(),
        "Deutsche Bank",
        "Taunusanlage 12",
        CountryCode::parse("DE").unwrap(),
        "Germany",
    );
    repo.create_headquarter(&hq, Deadline::after(Duration::from_secs(5)))
        .await
        .unwrap();

    let (status, body) = send(&app, get("/v1/swift-codes/DEUTDEFFXXX")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bankName"], "Deutsche Bank");
    assert_eq!(body["countryISO2"], "DE");
    assert_eq!(body["isHeadquarter"], true);
    assert_eq!(body["branches"], json!([]));
}

#[tokio::test]
async fn test_add_branch_without_headquarter_is_not_found() {
    let (app, _) = test_app();
    let (status, body) = send(&app, post(deutsche_branch("DEUTDEFF100"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("DEUTDEFFXXX"));
}

#[tokio::test]
async fn test_headquarter_and_branch_lifecycle() {
    let (app, _) = test_app();

    let (status, body) = send(&app, post(deutsche_hq())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].as_str().unwrap().contains("DEUTDEFFXXX"));

    let (status, _) = send(&app, post(deutsche_branch("DEUTDEFF100"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, hq) = send(&app, get("/v1/swift-codes/DEUTDEFFXXX")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hq["bankName"], "DEUTSCHE BANK");
    assert_eq!(hq["branches"][0]["swiftCode"], "DEUTDEFF100");
    assert_eq!(hq["branches"][0]["isHeadquarter"], false);

    let (status, branch) = send(&app, get("/v1/swift-codes/DEUTDEFF100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(branch["countryName"], "GERMANY");
    assert_eq!(branch["isHeadquarter"], false);

    let (status, country) = send(&app, get("/v1/swift-codes/country/DE")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(country["countryISO2"], "DE");
    assert_eq!(country["countryName"], "GERMANY");
    assert_eq!(country["count"], 2);
    assert_eq!(country["banks"][0]["swiftCode"], "DEUTDEFFXXX");
    assert_eq!(country["banks"][1]["swiftCode"], "DEUTDEFF100");

    let (status, _) = send(&app, delete("/v1/swift-codes/DEUTDEFF100")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, hq) = send(&app, get("/v1/swift-codes/DEUTDEFFXXX")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hq["branches"], json!([]));

    let (status, body) = send(&app, delete("/v1/swift-codes/DEUTDEFFXXX")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Headquarter was deleted successfully");

    let (status, _) = send(&app, get("/v1/swift-codes/DEUTDEFFXXX")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, delete("/v1/swift-codes/DEUTDEFFXXX")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_headquarter_removes_its_branches() {
    let (app, _) = test_app();
    send(&app, post(deutsche_hq())).await;
    send(&app, post(deutsche_branch("DEUTDEFF100"))).await;

    let (status, _) = send(&app, delete("/v1/swift-codes/DEUTDEFFXXX")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/v1/swift-codes/DEUTDEFF100")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicates_conflict() {
    let (app, _) = test_app();
    send(&app, post(deutsche_hq())).await;

    let (status, _) = send(&app, post(deutsche_hq())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, post(deutsche_branch("DEUTDEFF100"))).await;
    let (status, _) = send(&app, post(deutsche_branch("DEUTDEFF100"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_headquarter_flag_must_match_suffix() {
    let (app, _) = test_app();

    let mut body = deutsche_hq();
    body["isHeadquarter"] = json!(false);
    let (status, response) = send(&app, post(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("isHeadquarter"));

    let mut body = deutsche_branch("DEUTDEFF100");
    body["isHeadquarter"] = json!(true);
    let (status, _) = send(&app, post(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let (app, _) = test_app();

    let (status, body) = send(&app, get("/v1/swift-codes/DEUT")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, get("/v1/swift-codes/deutdeffxxx")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/v1/swift-codes/country/de")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_country = deutsche_hq();
    bad_country["countryISO2"] = json!("DEU");
    let (status, _) = send(&app, post(bad_country)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/swift-codes")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
}

#[tokio::test]
async fn test_unknown_country_is_not_found() {
    let (app, _) = test_app();
    let (status, body) = send(&app, get("/v1/swift-codes/country/XX")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
