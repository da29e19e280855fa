use crate::http::{into_boxed, make_error_response};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Liveness and readiness probes served on the admin listener.
///
/// `/health` answers as long as the process accepts connections. `/ready`
/// defers to the supplied probe, which the gateway sets once the static
/// snapshot is loaded and the site listener is bound.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }

    fn respond(&self, method: &Method, path: &str) -> Response<Bytes> {
        if method != Method::GET && method != Method::HEAD {
            return make_error_response(StatusCode::METHOD_NOT_ALLOWED);
        }

        match path {
            "/health" => Response::new(Bytes::from_static(b"ok\n")),
            "/ready" if (self.is_ready)() => Response::new(Bytes::from_static(b"ok\n")),
            "/ready" => make_error_response(StatusCode::SERVICE_UNAVAILABLE),
            _ => make_error_response(StatusCode::NOT_FOUND),
        }
    }
}

impl<F, E> Service<Request<Incoming>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + Sync + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let res = into_boxed(self.respond(req.method(), req.uri().path()));
        Box::pin(async move { Ok(res) })
    }
}
