mod common;

use std::collections::HashSet;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use minetrack_api::database::TableId;

fn ids(body: &Value, column: &str) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r[column].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn capacity_pages_follow_the_cursor() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.mine_planner_token.clone();

    let (status, first) = server.get("/effective-capacity?limit=10", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["error"], false);
    assert_eq!(first["limit"], 10);
    assert_eq!(first["total"], 25);
    assert_eq!(first["data"].as_array().map(Vec::len), Some(10));
    assert_eq!(first["data"][0]["week_start"], "2025-01-25");
    assert_eq!(first["nextCursorDate"], "2025-01-16");
    assert_eq!(first["nextCursorId"], "EFC0016");

    let (_, second) = server
        .get("/effective-capacity?limit=10&cursor_date=2025-01-16&cursor_id=EFC0016", &token)
        .await?;
    assert_eq!(second["data"][0]["week_start"], "2025-01-15");
    assert_eq!(second["nextCursorDate"], "2025-01-06");
    assert_eq!(second["nextCursorId"], "EFC0006");
    assert_eq!(second["total"], 25);

    let (_, third) = server
        .get("/effective-capacity?limit=10&cursor_date=2025-01-06&cursor_id=EFC0006", &token)
        .await?;
    assert_eq!(third["data"].as_array().map(Vec::len), Some(5));
    assert!(third["nextCursorDate"].is_null());
    assert!(third["nextCursorId"].is_null());
    assert_eq!(third["total"], 25);

    let mut seen: HashSet<String> = HashSet::new();
    for page in [&first, &second, &third] {
        seen.extend(ids(page, "effcap_id"));
    }
    assert_eq!(seen.len(), 25);
    Ok(())
}

#[tokio::test]
async fn date_range_and_all_mode() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.mine_planner_token.clone();

    let (_, ranged) = server
        .get("/effective-capacity?start=2025-01-10&end=2025-01-14&limit=2", &token)
        .await?;
    assert_eq!(ranged["total"], 5);
    assert_eq!(ids(&ranged, "effcap_id"), vec!["EFC0014", "EFC0013"]);

    let (_, all) = server.get("/effective-capacity?all=true&limit=3", &token).await?;
    assert_eq!(all["data"].as_array().map(Vec::len), Some(25));
    assert_eq!(all["total"], 25);
    assert!(all["nextCursorDate"].is_null());

    // The limit is not consulted when everything is requested
    for path in ["/effective-capacity?all=true&limit=0", "/effective-capacity?all=true&limit=x", "/mines?all=true&limit=-1"] {
        let (status, body) = server.get(path, &token).await?;
        assert_eq!(status, StatusCode::OK, "{}", path);
        assert!(body["data"].as_array().map_or(false, |rows| !rows.is_empty()), "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn rows_without_an_ordering_date_are_left_out() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, body) = server.get("/mines", &server.admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["limit"], 20);
    assert_eq!(ids(&body, "mine_id"), vec!["M02", "M01"]);
    Ok(())
}

#[tokio::test]
async fn weather_pages_break_date_ties_by_id() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.shipping_planner_token.clone();

    let (status, first) = server.get("/weather?limit=4", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&first, "weather_id"), vec!["W006", "W005", "W004", "W003"]);
    assert_eq!(first["nextCursorDate"], "2025-01-02");
    assert_eq!(first["nextCursorId"], "W003");
    assert_eq!(first["total"], 6);
    assert!(first.get("nextCursor").is_none());

    let (_, second) = server
        .get("/weather?limit=4&cursor_date=2025-01-02&cursor_id=W003", &token)
        .await?;
    assert_eq!(ids(&second, "weather_id"), vec!["W002", "W001"]);
    assert!(second["nextCursorDate"].is_null());
    assert!(second["nextCursorId"].is_null());
    assert_eq!(second["total"], 6);
    Ok(())
}

#[tokio::test]
async fn bad_page_parameters_are_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.mine_planner_token.clone();

    for path in [
        "/effective-capacity?limit=0",
        "/effective-capacity?limit=-5",
        "/effective-capacity?limit=ten",
        "/effective-capacity?start=2025-01-01",
        "/effective-capacity?start=01/01/2025&end=2025-01-31",
        "/weather?cursor_date=2025-01-02",
        "/weather?cursor_id=W003",
    ] {
        let (status, body) = server.get(path, &token).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["error"], true, "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn oversized_limits_are_clamped() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, body) = server.get("/effective-capacity?limit=1000000", &server.mine_planner_token).await?;
    assert_eq!(status, StatusCode::OK);
    let limit = body["limit"].as_i64().unwrap_or_default();
    assert!(limit > 0 && limit < 1_000_000);
    Ok(())
}

#[tokio::test]
async fn scalar_listing_orders_tied_dates_by_id() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server
        .store
        .seed(TableId::Mines, vec![json!({"mine_id": "M04", "mine_name": "Kideco", "start_date": "2012-03-15"})])
        .await;

    let (status, body) = server.get("/mines", &server.admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body, "mine_id"), vec!["M04", "M02", "M01"]);
    assert_eq!(body["nextCursor"], Value::Null);
    Ok(())
}
