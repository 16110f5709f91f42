use crate::api::handlers::{auth, health};
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router.
///
/// `/health` and `/v1/auth/exchange` are public. Session routes sit behind the
/// ban guard and authentication; `/v1/auth/links` also requires an admin.
#[must_use]
pub fn router(auth_state: Arc<auth::AuthState>) -> Router {
    let gate = auth_state.gate().clone();

    let public = Router::new()
        .route("/health", get(health::health).head(health::health))
        .route("/v1/auth/exchange", post(auth::exchange::exchange));

    let protected = auth::protect(
        Router::new()
            .route("/v1/auth/session", get(auth::session::session))
            .route("/v1/auth/logout", post(auth::session::logout)),
        gate.clone(),
    );

    let admin = auth::protect(
        auth::admin_routes(Router::new().route("/v1/auth/links", post(auth::links::create_link))),
        gate,
    );

    public
        .merge(protected)
        .merge(admin)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, auth_state: Arc<auth::AuthState>) -> Result<()> {
    let app = router(auth_state.clone());

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    // ConnectInfo feeds the source IP used by the ban tracker.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", err);
        }
        info!("Gracefully shutdown");
    })
    .await?;

    auth_state.shutdown();

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
