use std::collections::HashMap;

#[derive(Debug, PartialEq)]
enum PathSegment {
    Static(String),
    Param(String),
}

#[derive(Debug)]
struct Path {
    segments: Vec<PathSegment>,
    has_trailing_splat: bool,
}

fn split_segments(path: &str) -> Vec<&str> {
    path.trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

impl Path {
    /// Parses a path pattern string into a Path struct
    /// Supports:
    /// - Static segments: "/api/news"
    /// - Dynamic parameters: "/api/events/{id}"
    /// - Trailing splat: "/api/draft/*" or "/*" for a catch-all
    pub fn parse(path_str: &str) -> Self {
        let mut normalized_path = path_str.trim().trim_end_matches('/');

        let mut has_trailing_splat = false;
        if let Some(stripped) = normalized_path.strip_suffix("/*") {
            has_trailing_splat = true;
            normalized_path = stripped;
        } else if normalized_path == "*" {
            has_trailing_splat = true;
            normalized_path = "";
        }

        let segments = split_segments(normalized_path)
            .into_iter()
            .map(|s| {
                if let Some(stripped) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    PathSegment::Param(stripped.to_string())
                } else {
                    PathSegment::Static(s.to_string())
                }
            })
            .collect();

        Path {
            segments,
            has_trailing_splat,
        }
    }

    /// Matches a request path against this path pattern.
    /// Empty segments are ignored, so "//api//news/" matches "/api/news".
    fn matches<'a>(&self, request_path: &'a str) -> Option<(HashMap<String, &'a str>, Vec<&'a str>)> {
        let request_segments = split_segments(request_path);

        let mut params = HashMap::new();
        let mut i_req = 0;

        for seg in self.segments.iter() {
            let req_segment = *request_segments.get(i_req)?;
            match seg {
                PathSegment::Static(s) => {
                    if req_segment != s {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), req_segment);
                }
            }
            i_req += 1;
        }

        if self.has_trailing_splat {
            Some((params, request_segments[i_req..].to_vec()))
        } else if i_req == request_segments.len() {
            Some((params, Vec::new()))
        } else {
            None
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct RouteMatch<'a, A> {
    pub params: HashMap<String, &'a str>,
    /// Segments consumed by a trailing splat, in request order.
    pub rest: Vec<&'a str>,
    pub action: &'a A,
}

impl<A> RouteMatch<'_, A> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).copied()
    }
}

#[derive(Debug)]
pub struct Route<A> {
    path: Path,
    action: A,
}

impl<A> Route<A> {
    pub fn new(path: &str, action: A) -> Self {
        Self {
            path: Path::parse(path),
            action,
        }
    }

    /// Returns Some(RouteMatch) if the request path matches this route, None otherwise.
    pub fn matches<'a>(&'a self, request_path: &'a str) -> Option<RouteMatch<'a, A>> {
        let (params, rest) = self.path.matches(request_path)?;
        Some(RouteMatch {
            params,
            rest,
            action: &self.action,
        })
    }
}

/// Ordered route table. The first matching route wins, so catch-all
/// routes belong at the end.
#[derive(Debug)]
pub struct RouteTable<A> {
    routes: Vec<Route<A>>,
}

impl<A> RouteTable<A> {
    pub fn new(routes: Vec<Route<A>>) -> Self {
        Self { routes }
    }

    pub fn resolve<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a, A>> {
        self.routes.iter().find_map(|route| route.matches(path))
    }

    /// Matches the request URI path against the table.
    pub fn resolve_request<'a, B>(
        &'a self,
        request: &'a http::Request<B>,
    ) -> Option<RouteMatch<'a, A>> {
        self.resolve(request.uri().path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_path() {
        let route = Route::new("/api/news/", "news");
        assert!(route.matches("/api/news").is_some(), "exact path");
        assert!(
            route.matches("/api/news/").is_some(),
            "with trailing slash normalization"
        );
        assert!(
            route.matches("//api//news").is_some(),
            "repeated slashes collapse"
        );
        assert!(
            route.matches("/api/news/2").is_none(),
            "extra segment doesn't match"
        );
        assert!(route.matches("/api/").is_none(), "missing segment");
    }

    #[test]
    fn test_trailing_splat() {
        let route = Route::new("/api/draft/*", "draft");
        let m = route.matches("/api/draft/enable").unwrap();
        assert_eq!(m.rest, vec!["enable"]);
        assert!(route.matches("/api/draft").is_some(), "splat may be empty");
        assert!(route.matches("/api/").is_none(), "missing segment");
    }

    #[test]
    fn test_catch_all() {
        let route = Route::new("/*", "page");
        let m = route.matches("/events/2024/round-1").unwrap();
        assert_eq!(m.rest, vec!["events", "2024", "round-1"]);
        assert!(route.matches("/").unwrap().rest.is_empty());
    }

    #[test]
    fn test_dynamic_path() {
        let route = Route::new("/api/events/{id}", "event");

        let route_match = route.matches("/api/events/123").unwrap();
        assert_eq!(route_match.param("id"), Some("123"));
        assert_eq!(route_match.action, &"event");
        assert!(route.matches("/api/events").is_none());
    }

    #[test]
    fn test_table_first_match_wins() {
        let table = RouteTable::new(vec![
            Route::new("/api/events", "events"),
            Route::new("/api/events/{id}", "event"),
            Route::new("/*", "page"),
        ]);

        assert_eq!(table.resolve("/api/events").unwrap().action, &"events");
        assert_eq!(table.resolve("/api/events/9").unwrap().action, &"event");
        assert_eq!(table.resolve("/about").unwrap().action, &"page");

        let request = http::Request::builder()
            .uri("http://mra.example.com/api/events/7?x=1")
            .body(())
            .unwrap();
        let m = table.resolve_request(&request).unwrap();
        assert_eq!(m.param("id"), Some("7"));
    }

    #[test]
    fn test_path_parsing() {
        let path = Path::parse("");
        assert_eq!(path.segments.len(), 0);
        assert!(!path.has_trailing_splat);

        let path = Path::parse("/api/events/{id}");
        assert_eq!(path.segments.len(), 3);
        assert_eq!(path.segments[2], PathSegment::Param("id".into()));

        let path = Path::parse("/*");
        assert_eq!(path.segments.len(), 0);
        assert!(path.has_trailing_splat);
    }
}
