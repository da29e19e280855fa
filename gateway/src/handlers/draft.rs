use super::{HandlerResult, RequestContext, invalid_token};
use crate::draft::DraftGate;
use bytes::Bytes;
use http::header::{CACHE_CONTROL, HeaderValue, LOCATION, SET_COOKIE};
use http::{Response, StatusCode};

/// `GET /api/draft/enable?token=<secret>&redirect=<path>`
///
/// A wrong or missing token is a 401 and sets no cookie.
pub fn enable(gate: &DraftGate, ctx: &RequestContext<'_>) -> HandlerResult {
    if !gate.verify_token(ctx.query("token")) {
        tracing::warn!(tenant = %ctx.tenant, "draft mode rejected");
        return invalid_token();
    }
    let Some(cookie) = gate.enable_cookie() else {
        return invalid_token();
    };

    tracing::info!(tenant = %ctx.tenant, "draft mode enabled");
    redirect(gate, ctx, cookie)
}

/// `GET /api/draft/disable?redirect=<path>`
pub fn disable(gate: &DraftGate, ctx: &RequestContext<'_>) -> HandlerResult {
    redirect(gate, ctx, gate.disable_cookie())
}

fn redirect(gate: &DraftGate, ctx: &RequestContext<'_>, cookie: String) -> HandlerResult {
    let target = gate.redirect_target(ctx.query("redirect").or_else(|| ctx.query("slug")));
    let location = HeaderValue::from_str(&target).unwrap_or_else(|_| HeaderValue::from_static("/"));

    Ok(Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(LOCATION, location)
        .header(SET_COOKIE, cookie)
        .header(CACHE_CONTROL, "no-store")
        .body(Bytes::new())?)
}
