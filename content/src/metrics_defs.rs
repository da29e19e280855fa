//! Metrics definitions for the content layer.

use shared::metrics_defs::{MetricDef, MetricType};

pub const UPSTREAM_REQUEST: MetricDef = MetricDef {
    name: "upstream.request",
    metric_type: MetricType::Counter,
    description: "Upstream HTTP calls. Tagged with upstream (cms, raceready) and outcome.",
};

pub const FALLBACK_RESOLVED: MetricDef = MetricDef {
    name: "fallback.resolved",
    metric_type: MetricType::Counter,
    description: "Fallback chain resolutions. Tagged with chain and the winning source.",
};

pub const CONFIG_CACHE_STATUS: MetricDef = MetricDef {
    name: "config_cache.status",
    metric_type: MetricType::Counter,
    description: "Site config lookups. Tagged with status (HIT, MISS, FALLBACK).",
};

pub const ALL_METRICS: &[MetricDef] = &[UPSTREAM_REQUEST, FALLBACK_RESOLVED, CONFIG_CACHE_STATUS];
