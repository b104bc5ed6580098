use crate::helpers::{get, spawn_app};
use axum::http::StatusCode;

#[tokio::test]
async fn route_listing_names_every_api_path() {
    let test_app = spawn_app().await;

    let (status, body) = get(&test_app.app, "/").await;

    assert_eq!(status, StatusCode::OK);
    let listing = String::from_utf8(body).unwrap();
    for path in [
        "/api/v1.0/precipitation",
        "/api/v1.0/stations",
        "/api/v1.0/tobs",
        "/api/v1.0/{start_date}",
        "/api/v1.0/{start_date}/{end_date}",
        "/docs",
    ] {
        assert!(listing.contains(path), "missing {} in listing", path);
    }

    // /home serves the same listing
    let (status, home_body) = get(&test_app.app, "/home").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing, String::from_utf8(home_body).unwrap());
}

#[tokio::test]
async fn docs_page_is_served() {
    let test_app = spawn_app().await;

    let (status, _) = get(&test_app.app, "/docs").await;

    assert_eq!(status, StatusCode::OK);
}
