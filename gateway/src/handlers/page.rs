use super::{HandlerResult, RequestContext, json_error, json_response};
use content::ContentService;
use http::StatusCode;

/// Catch-all page route. Unresolved paths are a 404.
pub async fn page(content: &ContentService, ctx: &RequestContext<'_>, path: &str) -> HandlerResult {
    match content.page(&ctx.tenant, path, ctx.mode).await {
        Some(page) => json_response(StatusCode::OK, &page),
        None => {
            tracing::debug!(tenant = %ctx.tenant, path, "page not found");
            json_error(StatusCode::NOT_FOUND, "Page not found")
        }
    }
}
