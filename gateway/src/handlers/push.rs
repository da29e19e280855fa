use super::{HandlerResult, RequestContext, json_error, json_response};
use crate::push::{PushSubscription, SubscriptionStore};
use http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct Unsubscribe {
    endpoint: String,
}

/// `POST /api/push/subscribe` stores a subscription, `DELETE` removes one by
/// endpoint (JSON body or `endpoint` query parameter).
pub fn subscribe(store: &dyn SubscriptionStore, ctx: &RequestContext<'_>) -> HandlerResult {
    if ctx.request.method() == Method::DELETE {
        return unsubscribe(store, ctx);
    }

    let subscription = match serde_json::from_slice::<PushSubscription>(ctx.body()) {
        Ok(subscription) if subscription.is_valid() => subscription,
        _ => return json_error(StatusCode::BAD_REQUEST, "Invalid subscription"),
    };

    let created = match store.add(subscription) {
        Ok(created) => created,
        Err(error) => {
            tracing::warn!(tenant = %ctx.tenant, %error, "push subscription refused");
            return json_error(StatusCode::SERVICE_UNAVAILABLE, "Subscription store is full");
        }
    };
    tracing::debug!(tenant = %ctx.tenant, created, total = store.len(), "push subscription stored");

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    json_response(status, &json!({ "subscribed": true }))
}

fn unsubscribe(store: &dyn SubscriptionStore, ctx: &RequestContext<'_>) -> HandlerResult {
    let endpoint = match ctx.query("endpoint") {
        Some(endpoint) => endpoint.to_string(),
        None => match serde_json::from_slice::<Unsubscribe>(ctx.body()) {
            Ok(body) => body.endpoint,
            Err(_) => return json_error(StatusCode::BAD_REQUEST, "Missing endpoint"),
        },
    };

    let removed = store.remove(&endpoint);
    json_response(StatusCode::OK, &json!({ "removed": removed }))
}
