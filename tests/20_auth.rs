mod common;

use anyhow::Result;
use chrono::Utc;
use reqwest::{Method, StatusCode};

use minetrack_api::auth::{generate_jwt, Claims, Role};

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, body) = server.call(Method::GET, "/mines", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn malformed_or_expired_tokens_are_unauthorized() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, _) = server.get("/mines", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut claims = Claims::new(common::MINE_PLANNER_ID, Role::MinePlanner);
    claims.exp = Utc::now().timestamp() - 3600;
    let (status, _) = server.get("/mines", &generate_jwt(&claims)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_but_unrecognised_tokens_are_forbidden() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    // Signed correctly but not the token stored for this user
    let mut claims = Claims::new(common::MINE_PLANNER_ID, Role::MinePlanner);
    claims.iat -= 60;
    let (status, body) = server.get("/mines", &generate_jwt(&claims)?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // No such user
    let stranger = generate_jwt(&Claims::new(99, Role::Admin))?;
    let (status, _) = server.get("/mines", &stranger).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn role_gates_use_the_stored_role() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, _) = server.get("/equipments", &server.mine_planner_token).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.get("/equipments", &server.shipping_planner_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.get("/shipping-schedules", &server.mine_planner_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.get("/shipping-schedules", &server.shipping_planner_token).await?;
    assert_eq!(status, StatusCode::OK);

    // Token-only routes admit every role
    for token in [&server.admin_token, &server.mine_planner_token, &server.shipping_planner_token] {
        let (status, _) = server.get("/weather", token).await?;
        assert_eq!(status, StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_token() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.mine_planner_token.clone();

    let (status, _) = server.call(Method::DELETE, "/logout/2", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.get("/mines", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
