use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use dashgate::api::{
    self,
    handlers::auth::{
        issue_dashboard_link, AuthState, BanConfig, GateConfig, SessionConfig, TokenOwner,
        EXCHANGE_CODE_PARAM, SESSION_TOKEN_HEADER, SHARED_SECRET_HEADER,
    },
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceExt;
use url::Url;

const SECRET: &str = "integration-secret";

fn state(session: SessionConfig, bans: BanConfig) -> Result<Arc<AuthState>> {
    Ok(Arc::new(AuthState::new(
        session,
        bans,
        &GateConfig::new(SecretString::from(SECRET.to_string())),
        Url::parse("https://dash.example.com/")?,
    )))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    header: Option<(&str, &str)>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let peer: SocketAddr = "192.0.2.10:5555".parse()?;
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(peer));
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body)?).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, payload))
}

#[tokio::test]
async fn dashboard_link_round_trip() -> Result<()> {
    let state = state(SessionConfig::new(), BanConfig::new())?;
    let app = api::router(state.clone());

    let link = issue_dashboard_link(
        state.registry(),
        state.dashboard_url(),
        TokenOwner::new(1001, "dana", "Dana"),
        true,
    )?;
    let code = link
        .url
        .query_pairs()
        .find(|(key, _)| key == EXCHANGE_CODE_PARAM)
        .map(|(_, value)| value.into_owned())
        .context("link has no code")?;
    assert_eq!(code, link.code);
    assert_eq!(link.expires_in, Duration::from_secs(60));

    let (status, body) = call(
        &app,
        "POST",
        "/v1/auth/exchange",
        None,
        Some(json!({ "code": code })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().context("token missing")?.to_string();

    let (status, body) = call(
        &app,
        "GET",
        "/v1/auth/session",
        Some((SESSION_TOKEN_HEADER, token.as_str())),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["user_id"], 1001);

    let (status, _) = call(
        &app,
        "POST",
        "/v1/auth/logout",
        Some((SESSION_TOKEN_HEADER, token.as_str())),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        "GET",
        "/v1/auth/session",
        Some((SESSION_TOKEN_HEADER, token.as_str())),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn tokens_expire_after_ttl() -> Result<()> {
    let state = state(SessionConfig::new().with_token_ttl_minutes(1), BanConfig::new())?;
    let app = api::router(state.clone());
    let token = state
        .registry()
        .issue_token(TokenOwner::new(5, "erin", "Erin"), false)?;

    tokio::time::advance(Duration::from_secs(59)).await;
    let (status, _) = call(
        &app,
        "GET",
        "/v1/auth/session",
        Some((SESSION_TOKEN_HEADER, token.as_str())),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    tokio::time::advance(Duration::from_secs(2)).await;
    let (status, _) = call(
        &app,
        "GET",
        "/v1/auth/session",
        Some((SESSION_TOKEN_HEADER, token.as_str())),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.registry().token_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ban_lifts_after_duration() -> Result<()> {
    let bans = BanConfig::new()
        .with_fail_limit(3)
        .with_ban_duration(Duration::from_secs(30));
    let state = state(SessionConfig::new(), bans)?;
    let app = api::router(state.clone());

    for _ in 0..3 {
        let (status, _) = call(
            &app,
            "GET",
            "/v1/auth/session",
            Some((SHARED_SECRET_HEADER, "guess")),
            None,
        )
        .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert!(state.bans().is_banned("192.0.2.10"));

    let (status, _) = call(
        &app,
        "GET",
        "/v1/auth/session",
        Some((SHARED_SECRET_HEADER, SECRET)),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    tokio::time::advance(Duration::from_secs(31)).await;
    let (status, body) = call(
        &app,
        "GET",
        "/v1/auth/session",
        Some((SHARED_SECRET_HEADER, SECRET)),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "shared_secret");
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let state = state(SessionConfig::new(), BanConfig::new())?;
    let app = api::router(state);

    let (status, body) = call(&app, "GET", "/api-docs/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/auth/exchange"].is_object());
    Ok(())
}
