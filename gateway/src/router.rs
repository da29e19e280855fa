use http::Method;
use routing::{Route, RouteTable};

/// Handler selected for a request path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Config,
    Menu,
    News,
    Events,
    Event,
    RaceReadyEvents,
    Revalidate,
    DraftEnable,
    DraftDisable,
    PushSubscribe,
    /// Any other `/api/` path
    ApiNotFound,
    /// Everything else is a CMS page
    Page,
}

const READ_METHODS: &[Method] = &[Method::GET, Method::HEAD];
const WEBHOOK_METHODS: &[Method] = &[Method::GET, Method::POST];
const SUBSCRIBE_METHODS: &[Method] = &[Method::POST, Method::DELETE];

impl Action {
    /// Route name used in logs and as the `route` metric tag.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Config => "config",
            Action::Menu => "menu",
            Action::News => "news",
            Action::Events => "events",
            Action::Event => "event",
            Action::RaceReadyEvents => "raceready_events",
            Action::Revalidate => "revalidate",
            Action::DraftEnable => "draft_enable",
            Action::DraftDisable => "draft_disable",
            Action::PushSubscribe => "push_subscribe",
            Action::ApiNotFound => "api_not_found",
            Action::Page => "page",
        }
    }

    pub fn methods(&self) -> &'static [Method] {
        match self {
            Action::Revalidate => WEBHOOK_METHODS,
            Action::PushSubscribe => SUBSCRIBE_METHODS,
            _ => READ_METHODS,
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods().contains(method)
    }
}

/// The gateway's routes. Order matters: the page catch-all comes last.
pub fn route_table() -> RouteTable<Action> {
    RouteTable::new(vec![
        Route::new("/api/config", Action::Config),
        Route::new("/api/menu", Action::Menu),
        Route::new("/api/news", Action::News),
        Route::new("/api/events", Action::Events),
        Route::new("/api/events/{id}", Action::Event),
        Route::new("/api/raceready-events", Action::RaceReadyEvents),
        Route::new("/api/revalidate", Action::Revalidate),
        Route::new("/api/draft/enable", Action::DraftEnable),
        Route::new("/api/draft/disable", Action::DraftDisable),
        Route::new("/api/push/subscribe", Action::PushSubscribe),
        Route::new("/api/*", Action::ApiNotFound),
        Route::new("/*", Action::Page),
    ])
}
