//! REST client against an in-process axum backend.

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use lotwatch_core::{LotId, SpotId, SpotState};
use lotwatch_rest::{NewVehicle, ParkingApiClient, RestError, Session};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const ACCESS: &str = "access-token";

async fn spawn_backend() -> String {
    let app = Router::new()
        .route(
            "/api/dashboard/",
            get(|| async {
                Json(json!([
                    {"id": 1, "name": "North", "total_spots": 10, "available_spots": 4, "occupancy_percent": 60.0},
                    {"id": 2, "name": "South", "total_spots": 0, "available_spots": 0}
                ]))
            }),
        )
        .route("/api/spots/", get(spots))
        .route("/api/token/", post(token))
        .route("/api/me/", get(me))
        .route("/api/lots/for-my-permit/", get(permit_lots))
        .route("/api/events/active/", get(|| async {
            Json(json!([{"event_id": 7, "event_name": "Game day",
                "restricted_lots": [{"parking_lot_id": 2, "parking_lot_name": "South"}]}]))
        }))
        .route("/api/vehicles/", post(add_vehicle))
        .route("/api/vehicles/{id}/", delete(delete_vehicle));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ACCESS}"))
}

async fn spots(Query(params): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    match params.get("parking_lot").map(String::as_str) {
        Some("1") => Ok(Json(json!([
            {"parking_spot_id": 1, "availability": true},
            {"parking_spot_id": 2, "availability": false}
        ]))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn token(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["username"] == "sam" && body["password"] == "pw" {
        Ok(Json(json!({"access": ACCESS, "refresh": "refresh-token"})))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "username": "sam", "first_name": "Sam",
        "permit_type": {"name": "Student"},
        "vehicles": [{"vehicle_id": 3, "make": "Toyota", "model": "Camry"}]
    })))
}

async fn permit_lots(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!([
        {"id": 1, "name": "North", "total_spots": 10, "available_spots": 4, "occupancy_percent": 60.0}
    ])))
}

async fn add_vehicle(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok((
        StatusCode::CREATED,
        Json(json!({"vehicle_id": 9, "make": body["make"], "model": body["model"]})),
    ))
}

async fn delete_vehicle(headers: HeaderMap, Path(id): Path<i64>) -> StatusCode {
    if !authorized(&headers) {
        StatusCode::UNAUTHORIZED
    } else if id == 3 {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn client() -> ParkingApiClient {
    let base = spawn_backend().await;
    ParkingApiClient::new(base, Arc::new(Session::new())).unwrap()
}

#[tokio::test]
async fn test_fetch_dashboard_derives_missing_occupancy() {
    let client = client().await;
    let lots = client.fetch_dashboard().await.unwrap();

    assert_eq!(lots.len(), 2);
    assert_eq!(lots[0].id, LotId::new(1));
    assert_eq!(lots[0].occupancy_percent, 60.0);
    assert_eq!(lots[1].occupancy_percent, 0.0);
}

#[tokio::test]
async fn test_fetch_spots_uses_lot_query() {
    let client = client().await;
    let spots = client.fetch_spots(LotId::new(1)).await.unwrap();
    assert_eq!(
        spots,
        vec![
            SpotState::new(SpotId::new(1), true),
            SpotState::new(SpotId::new(2), false)
        ]
    );

    let err = client.fetch_spots(LotId::new(5)).await.unwrap_err();
    assert!(matches!(err, RestError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_login_enables_authorized_endpoints() {
    let client = client().await;

    let err = client.login("sam", "wrong").await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(!client.session().is_active());

    client.login("sam", "pw").await.unwrap();
    assert!(client.session().is_active());

    let profile = client.fetch_profile().await.unwrap();
    assert_eq!(profile.display_name(), "Sam");
    assert_eq!(profile.vehicles.len(), 1);

    let lots = client.fetch_lots_for_permit().await.unwrap();
    assert_eq!(lots.len(), 1);

    let vehicle = client
        .add_vehicle(&NewVehicle {
            make: "Ford".to_string(),
            model: "Focus".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(vehicle.make, "Ford");

    client.delete_vehicle(3).await.unwrap();
    assert!(client.delete_vehicle(4).await.is_err());

    client.logout();
    assert!(matches!(
        client.fetch_profile().await,
        Err(RestError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_active_events() {
    let client = client().await;
    let events = client.fetch_active_events().await.unwrap();

    assert_eq!(events.len(), 1);
    assert!(lotwatch_rest::is_lot_restricted(&events, LotId::new(2)));
    assert!(!lotwatch_rest::is_lot_restricted(&events, LotId::new(1)));
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let client = ParkingApiClient::new("http://127.0.0.1:9", Arc::new(Session::new())).unwrap();
    assert!(matches!(
        client.fetch_dashboard().await,
        Err(RestError::HttpClient(_))
    ));
}
