mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use clubledger::api::{create_router, AppState};
use clubledger::domain::{Money, Tier, TimeMs};
use common::{cents, setup, TestClub};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(t: &TestClub) -> axum::Router {
    create_router(AppState::new(
        t.repo.clone(),
        t.config.clone(),
        Arc::new(t.club.clone()),
    ))
}

fn request(method: &str, uri: &str, member: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, roles)) = member {
        builder = builder
            .header("x-member-id", id)
            .header("x-member-roles", roles);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(t: &TestClub, req: Request<Body>) -> (StatusCode, Value) {
    let response = app(t).oneshot(req).await.unwrap();
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

fn money(value: &Value) -> Money {
    serde_json::from_value(value.clone()).unwrap()
}

/// Whole-hour slot starting `hours` from the wall clock, so the booking is in the future.
fn future_slot(hours: i64) -> (i64, i64) {
    let now = TimeMs::now().as_ms();
    let start = (now / 3_600_000 + hours) * 3_600_000;
    (start, start + 3_600_000)
}

#[tokio::test]
async fn test_health_and_ready() {
    let t = setup().await;
    let (status, body) = send(&t, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&t, request("GET", "/ready", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let t = setup().await;
    let (status, body) = send(&t, request("GET", "/v1/wallet", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn test_admin_only_routes() {
    let t = setup().await;
    let body = json!({"name": "Center Court", "hourlyPrice": "150.00"});

    let (status, _) = send(
        &t,
        request("POST", "/v1/courts", Some(("ann", "")), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, court) = send(
        &t,
        request("POST", "/v1/courts", Some(("root", "admin")), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(court["name"], "Center Court");
    assert_eq!(money(&court["hourlyPrice"]), cents(15_000));

    let (status, member) = send(
        &t,
        request(
            "POST",
            "/v1/members",
            Some(("root", "admin")),
            Some(json!({"id": "zoe", "fullName": "Zoe Tran", "tier": "gold"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["tier"], "gold");

    let (status, me) = send(&t, request("GET", "/v1/members/me", Some(("zoe", "")), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["fullName"], "Zoe Tran");
}

#[tokio::test]
async fn test_booking_flow_over_http() {
    let t = setup().await;
    t.member("ann", Tier::Standard, cents(50_000)).await;
    t.member("bob", Tier::Standard, cents(50_000)).await;
    let court = t.court("Court 1", cents(10_000)).await;
    let (start, end) = future_slot(72);
    let body = json!({"courtId": court.id, "startMs": start, "endMs": end});

    let (status, receipt) = send(
        &t,
        request("POST", "/v1/bookings", Some(("ann", "")), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["booking"]["status"], "confirmed");
    assert_eq!(money(&receipt["balance"]), cents(40_000));
    let id = receipt["booking"]["id"].as_i64().unwrap();

    let (status, conflict) = send(
        &t,
        request("POST", "/v1/bookings", Some(("bob", "")), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["kind"], "conflict");

    let (status, _) = send(
        &t,
        request("GET", &format!("/v1/bookings/{}", id), Some(("bob", "")), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cancelled) = send(
        &t,
        request("POST", &format!("/v1/bookings/{}/cancel", id), Some(("ann", "")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["refundPercent"], 100);
    assert_eq!(money(&cancelled["balance"]), cents(50_000));

    let (status, wallet) = send(&t, request("GET", "/v1/wallet", Some(("ann", "")), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["recentTransactions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_error_kinds_in_body() {
    let t = setup().await;
    t.member("ann", Tier::Standard, cents(1_000)).await;
    let court = t.court("Court 1", cents(10_000)).await;
    let (start, end) = future_slot(48);

    let (status, body) = send(
        &t,
        request(
            "POST",
            "/v1/bookings",
            Some(("ann", "")),
            Some(json!({"courtId": court.id, "startMs": start, "endMs": end})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["kind"], "insufficient_funds");

    let (status, body) = send(
        &t,
        request(
            "POST",
            "/v1/bookings",
            Some(("ann", "")),
            Some(json!({"courtId": court.id, "startMs": end, "endMs": start})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = send(
        &t,
        request(
            "POST",
            "/v1/bookings/recurring",
            Some(("ann", "")),
            Some(json!({
                "courtId": court.id,
                "rule": "MON",
                "fromDate": "2030-01-07",
                "toDate": "2030-01-14",
                "startTime": "18:00:00",
                "endTime": "19:00:00"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "tier_not_eligible");

    let (status, body) =
        send(&t, request("GET", "/v1/tournaments/77", Some(("ann", "")), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_notifications_inbox() {
    let t = setup().await;
    t.member("ann", Tier::Standard, cents(50_000)).await;
    t.member("bob", Tier::Standard, cents(0)).await;

    let (status, _) = send(
        &t,
        request(
            "POST",
            "/v1/matches/duel",
            Some(("ann", "")),
            Some(json!({"opponentId": "bob"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, count) = send(
        &t,
        request("GET", "/v1/notifications/unread-count", Some(("bob", "")), None),
    )
    .await;
    assert_eq!(count["unread"], 1);

    let (_, inbox) = send(&t, request("GET", "/v1/notifications", Some(("bob", "")), None)).await;
    let id = inbox[0]["id"].as_i64().unwrap();

    let (status, _) = send(
        &t,
        request("POST", &format!("/v1/notifications/{}/read", id), Some(("ann", "")), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &t,
        request("POST", &format!("/v1/notifications/{}/read", id), Some(("bob", "")), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, count) = send(
        &t,
        request("GET", "/v1/notifications/unread-count", Some(("bob", "")), None),
    )
    .await;
    assert_eq!(count["unread"], 0);
}
