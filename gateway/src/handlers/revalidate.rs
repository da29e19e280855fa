use super::{HandlerResult, RequestContext, invalid_token, json_response};
use crate::draft::secrets_match;
use content::ContentService;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TOKEN_HEADER: &str = "x-revalidate-token";

/// Tag that drops every tenant's cached site config.
pub const SITE_CONFIG_TAG: &str = "site-config";

#[derive(Debug, Default, Deserialize)]
struct WebhookBody {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Debug, Serialize)]
struct Revalidated<'a> {
    revalidated: bool,
    now: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
}

/// `GET|POST /api/revalidate`
///
/// `path` and `tag` come from the query, else from a JSON body. A tenant slug
/// as `tag` drops that tenant's config, `site-config` drops all configs and
/// `path` drops the cached page at that path. No target drops everything.
pub async fn revalidate(
    content: &ContentService,
    secret: Option<&str>,
    ctx: &RequestContext<'_>,
) -> HandlerResult {
    let token = ctx.query("token").or_else(|| ctx.header(TOKEN_HEADER));
    let authorized = match (secret, token) {
        (Some(secret), Some(token)) => secrets_match(secret, token),
        _ => false,
    };
    if !authorized {
        tracing::warn!(tenant = %ctx.tenant, "revalidate rejected");
        return invalid_token();
    }

    let body = parse_body(ctx);
    let path = ctx
        .query("path")
        .map(str::to_string)
        .or(body.path)
        .filter(|p| !p.trim().is_empty());
    let tag = ctx
        .query("tag")
        .map(str::to_string)
        .or(body.tag)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    match (&path, &tag) {
        (None, None) => content.invalidate_all().await,
        _ => {
            if let Some(tag) = &tag {
                if tag == SITE_CONFIG_TAG {
                    content.invalidate_configs().await;
                } else {
                    content.invalidate_tenant(tag).await;
                }
            }
            if let Some(path) = &path {
                content.invalidate_path(path);
            }
        }
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();

    json_response(
        StatusCode::OK,
        &Revalidated {
            revalidated: true,
            now,
            path: path.as_deref(),
            tag: tag.as_deref(),
        },
    )
}

fn parse_body(ctx: &RequestContext<'_>) -> WebhookBody {
    let body = ctx.body();
    if body.is_empty() {
        return WebhookBody::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|error| {
        tracing::debug!(%error, "ignoring unparsable revalidate body");
        WebhookBody::default()
    })
}
