use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::context::WebsiteContext;

/// Header carrying the website (tenant) id, set by the upstream gateway.
pub const WEBSITE_HEADER: &str = "x-website-id";

/// Extracts the website context from `x-website-id` and stashes it in request
/// extensions. Token validation belongs to the gateway; this layer only
/// enforces that a well-formed website id is present.
pub async fn website_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let website_id = extract_website_id(req.headers())?;
    req.extensions_mut().insert(WebsiteContext::new(website_id));
    Ok(next.run(req).await)
}

fn extract_website_id(headers: &HeaderMap) -> Result<khata_core::WebsiteId, StatusCode> {
    let header = headers
        .get(WEBSITE_HEADER)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    header.trim().parse().map_err(|_| StatusCode::UNAUTHORIZED)
}
