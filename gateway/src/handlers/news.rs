use super::config::CONTENT_SOURCE_HEADER;
use super::{HandlerResult, RequestContext, json_response};
use content::ContentService;
use http::StatusCode;
use http::header::HeaderValue;

pub const DEFAULT_LIMIT: usize = 12;
pub const MAX_LIMIT: usize = 100;

/// `limit` query parameter, clamped to 1..=100. Anything unparsable gets the
/// default.
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .map(|limit| limit.clamp(1, MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT)
}

/// `GET /api/news`: a JSON array, empty when every lookup failed.
pub async fn news(content: &ContentService, ctx: &RequestContext<'_>) -> HandlerResult {
    let limit = parse_limit(ctx.query("limit"));
    let listing = content.news(&ctx.tenant, ctx.mode, limit).await;

    let mut response = json_response(StatusCode::OK, &listing.items)?;
    response.headers_mut().insert(
        CONTENT_SOURCE_HEADER,
        HeaderValue::from_static(listing.source),
    );
    Ok(response)
}
