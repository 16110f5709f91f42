use super::handlers::{auth, health};
use utoipa::{
    openapi::{
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
        Contact, License,
    },
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::exchange::exchange,
        auth::session::session,
        auth::session::logout,
        auth::links::create_link,
    ),
    components(schemas(
        health::Health,
        auth::Role,
        auth::types::ErrorResponse,
        auth::types::ExchangeRequest,
        auth::types::ExchangeResponse,
        auth::types::AuthModeKind,
        auth::types::SessionResponse,
        auth::types::LinkRequest,
        auth::types::LinkResponse,
    )),
    modifiers(&SecuritySchemes, &CargoInfo),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "auth", description = "Session exchange and dashboard links")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                auth::SESSION_TOKEN_HEADER,
            ))),
        );
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                auth::SHARED_SECRET_HEADER,
            ))),
        );
    }
}

// Use Cargo.toml metadata instead of the utoipa defaults.
struct CargoInfo;

impl Modify for CargoInfo {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = env!("CARGO_PKG_NAME").to_string();
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
        openapi.info.description = optional_str(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
        openapi.info.contact = cargo_contact();
        openapi.info.license = optional_str(env!("CARGO_PKG_LICENSE")).map(|identifier| {
            let mut license = License::new(identifier);
            license.identifier = Some(identifier.to_string());
            license
        });
    }
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match (author.find('<'), author.rfind('>')) {
        (Some(start), Some(end)) if start < end => {
            let name = optional_str(author[..start].trim());
            let email = optional_str(author[start + 1..end].trim());
            (name, email)
        }
        _ => (optional_str(author), None),
    }
}

fn optional_str(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
