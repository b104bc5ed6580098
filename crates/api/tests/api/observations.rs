use crate::helpers::{get, spawn_app, spawn_app_with, spawn_app_with_store, MockClimateAccess};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use climate_api::Error;
use hyper::Method;
use serde_json::{from_slice, json, Value};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn precipitation_returns_one_entry_per_measurement_row() {
    let test_app = spawn_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1.0/precipitation")
        .body(Body::empty())
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let entries: Vec<Value> = from_slice(&body).unwrap();

    // One entry per measurement row, duplicate dates included
    assert_eq!(entries.len(), 5);
    for entry in &entries {
        let object = entry.as_object().expect("entry is a single-key object");
        assert_eq!(object.len(), 1);
    }

    // Null precipitation survives the reshaping
    assert!(entries
        .iter()
        .any(|entry| entry.as_object().unwrap().get("2017-01-01") == Some(&Value::Null)));
}

#[tokio::test]
async fn stations_returns_one_code_per_station_row() {
    let test_app = spawn_app().await;

    let (status, body) = get(&test_app.app, "/api/v1.0/stations").await;

    assert_eq!(status, StatusCode::OK);
    let codes: Vec<String> = from_slice(&body).unwrap();
    assert_eq!(codes, vec!["USC00519281", "USC00519397"]);
}

#[tokio::test]
async fn tobs_returns_the_most_active_stations_final_year() {
    let test_app = spawn_app().await;

    let (status, body) = get(&test_app.app, "/api/v1.0/tobs").await;

    assert_eq!(status, StatusCode::OK);
    let observations: Vec<Value> = from_slice(&body).unwrap();

    // The 2010 reading predates the one-year window
    assert_eq!(observations.len(), 3);
    for obs in &observations {
        assert_eq!(obs["station"], "USC00519281");
        assert_eq!(obs["station_name"], "WAIHEE 837.5, HI US");

        let date = obs["date"].as_str().expect("date is a string");
        assert!(
            ("2016-08-23"..="2017-08-23").contains(&date),
            "date {} outside the window",
            date
        );
    }
}

#[tokio::test]
async fn tobs_breaks_count_ties_on_station_code() {
    let test_app = spawn_app_with(
        &[
            ("USC00519397", "WAIKIKI 717.2, HI US"),
            ("USC00519281", "WAIHEE 837.5, HI US"),
        ],
        &[
            ("USC00519397", "2017-01-01", None, 70.0),
            ("USC00519281", "2017-01-01", None, 71.0),
        ],
    )
    .await;

    let (status, body) = get(&test_app.app, "/api/v1.0/tobs").await;

    assert_eq!(status, StatusCode::OK);
    let observations: Vec<Value> = from_slice(&body).unwrap();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0]["station"], "USC00519281");
}

#[tokio::test]
async fn tobs_on_an_empty_store_returns_an_empty_list() {
    let test_app = spawn_app_with(&[], &[]).await;

    let (status, body) = get(&test_app.app, "/api/v1.0/tobs").await;

    assert_eq!(status, StatusCode::OK);
    let observations: Vec<Value> = from_slice(&body).unwrap();
    assert!(observations.is_empty());
}

#[tokio::test]
async fn tobs_reports_null_name_for_unknown_stations() {
    let test_app = spawn_app_with(&[], &[("USC00511918", "2017-06-01", Some(0.1), 75.0)]).await;

    let (status, body) = get(&test_app.app, "/api/v1.0/tobs").await;

    assert_eq!(status, StatusCode::OK);
    let observations: Vec<Value> = from_slice(&body).unwrap();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0]["station"], "USC00511918");
    assert_eq!(observations[0]["station_name"], Value::Null);
}

#[tokio::test]
async fn store_failures_surface_as_an_opaque_internal_error() {
    let mut climate_db = MockClimateAccess::new();
    climate_db
        .expect_precipitation()
        .times(1)
        .returning(|| Err(Error::Query(sqlx::Error::RowNotFound)));

    let app = spawn_app_with_store(Arc::new(climate_db));

    let (status, body) = get(&app, "/api/v1.0/precipitation").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let payload: Value = from_slice(&body).unwrap();
    assert_eq!(payload, json!({"error": "internal error"}));
}
