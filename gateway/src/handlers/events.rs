use super::config::CONTENT_SOURCE_HEADER;
use super::{HandlerResult, RequestContext, json_error, json_response};
use content::{ContentService, View};
use http::StatusCode;
use http::header::HeaderValue;

/// `GET /api/events`: events API, then CMS events, then the hero event.
pub async fn events(content: &ContentService, ctx: &RequestContext<'_>) -> HandlerResult {
    let listing = content.events(&ctx.tenant, ctx.mode).await;

    let mut response = json_response(StatusCode::OK, &listing.items)?;
    response.headers_mut().insert(
        CONTENT_SOURCE_HEADER,
        HeaderValue::from_static(listing.source),
    );
    Ok(response)
}

/// `GET /api/events/{id}`
pub async fn event(content: &ContentService, ctx: &RequestContext<'_>, id: &str) -> HandlerResult {
    match content.event(&ctx.tenant, id).await {
        Some(event) => json_response(StatusCode::OK, &event),
        None => json_error(StatusCode::NOT_FOUND, "Event not found"),
    }
}

/// `GET /api/raceready-events?view=next|events|event[&event=<slug>]`
///
/// Bad parameters are a 400. A missing GUID or a failing upstream is a 200
/// with a `null` body.
pub async fn race_ready_events(content: &ContentService, ctx: &RequestContext<'_>) -> HandlerResult {
    let view = match View::parse(ctx.query("view"), ctx.query("event")) {
        Ok(view) => view,
        Err(error) => return json_error(StatusCode::BAD_REQUEST, &error.to_string()),
    };

    let payload = content.race_ready_view(&ctx.tenant, &view).await;
    json_response(StatusCode::OK, &payload)
}
