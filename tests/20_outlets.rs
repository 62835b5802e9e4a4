mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn create_then_get_round_trips_caller_fields() -> Result<()> {
    let server = common::start_server().await?;
    let admin = server.admin_token().await?;

    let input = json!({
        "name": "Grünerløkka",
        "address": "Thorvald Meyers gate 1",
        "latitude": 59.9226,
        "longitude": 10.7583,
        "is_active": false
    });
    let (status, created) = server.send_json(Method::POST, "/api/admin/outlets", &admin, &input).await?;
    assert_eq!(status, StatusCode::CREATED);
    for field in ["name", "address", "latitude", "longitude", "is_active"] {
        assert_eq!(created[field], input[field], "{field}");
    }
    assert!(created["id"].is_string());
    assert!(created["created_at"].is_string());

    let id = created["id"].as_str().unwrap_or_default();
    let (status, fetched) = server
        .send_empty(Method::GET, &format!("/api/admin/outlets/{id}"), &admin)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    Ok(())
}

#[tokio::test]
async fn create_requires_a_name() -> Result<()> {
    let server = common::start_server().await?;
    let admin = server.admin_token().await?;

    let (status, body) = server
        .send_json(Method::POST, "/api/admin/outlets", &admin, &json!({ "address": "Somewhere" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required.");

    let (status, body) = server
        .send_json(Method::POST, "/api/admin/outlets", &admin, &json!({ "name": "x", "latitude": "north" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Latitude must be a number or null.");
    Ok(())
}

#[tokio::test]
async fn list_is_newest_first() -> Result<()> {
    let server = common::start_server().await?;
    let admin = server.admin_token().await?;

    for name in ["First", "Second", "Third"] {
        server
            .send_json(Method::POST, "/api/admin/outlets", &admin, &json!({ "name": name }))
            .await?;
    }
    let (status, body) = server.send_empty(Method::GET, "/api/admin/outlets", &admin).await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .map(|rows| rows.iter().filter_map(|row| row["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, ["Third", "Second", "First"]);
    Ok(())
}

#[tokio::test]
async fn update_validates_and_reports_missing_rows() -> Result<()> {
    let server = common::start_server().await?;
    let admin = server.admin_token().await?;

    let (_, created) = server
        .send_json(Method::POST, "/api/admin/outlets", &admin, &json!({ "name": "Bislett" }))
        .await?;
    let path = format!("/api/admin/outlets/{}", created["id"].as_str().unwrap_or_default());

    let (status, body) = server.send_json(Method::PUT, &path, &admin, &json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body is required.");

    let (status, body) = server
        .send_json(Method::PUT, &path, &admin, &json!({ "owner": "someone" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid update fields provided.");

    let (status, body) = server
        .send_json(Method::PUT, &path, &admin, &json!({ "address": null, "name": "Bislett Stadion" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bislett Stadion");
    assert!(body["address"].is_null());

    let (status, body) = server
        .send_json(
            Method::PUT,
            "/api/admin/outlets/00000000-0000-0000-0000-000000000000",
            &admin,
            &json!({ "name": "Ghost" }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Outlet not found to update.");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_distinguished() -> Result<()> {
    let server = common::start_server().await?;
    let admin = server.admin_token().await?;

    let res = server
        .send_raw(Method::POST, "/api/admin/outlets", &admin, "{\"name\": \"Tøyen\"")
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON in request body.");

    let res = server.send_raw(Method::POST, "/api/admin/outlets", &admin, "[]").await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body must be a JSON object.");
    Ok(())
}

#[tokio::test]
async fn delete_is_idempotent_to_absence() -> Result<()> {
    let server = common::start_server().await?;
    let admin = server.admin_token().await?;

    let (_, created) = server
        .send_json(Method::POST, "/api/admin/outlets", &admin, &json!({ "name": "Vulkan" }))
        .await?;
    let path = format!("/api/admin/outlets/{}", created["id"].as_str().unwrap_or_default());

    let (status, body) = server.send_empty(Method::DELETE, &path, &admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Outlet deleted successfully." }));

    let (status, body) = server.send_empty(Method::DELETE, &path, &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Outlet not found to delete or already deleted.");

    let (status, body) = server.send_empty(Method::GET, &path, &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Outlet not found.");
    Ok(())
}

#[tokio::test]
async fn undecodable_id_and_unknown_route_still_answer_json() -> Result<()> {
    let server = common::start_server().await?;
    let admin = server.admin_token().await?;

    let (status, body) = server.send_empty(Method::GET, "/api/admin/outlets/%FF", &admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid ID in request path." }));

    let (status, body) = server.send_empty(Method::GET, "/api/admin/outlet_products", &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Route not found." }));
    Ok(())
}
