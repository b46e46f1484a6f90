//! Task-local request context so error bodies can echo the request path
//! without threading it through every service call.

use std::cell::RefCell;
use std::future::Future;

use axum::{body::Body, extract::Request, middleware::Next, response::Response};

tokio::task_local! {
    static CURRENT_REQUEST_PATH: RefCell<Option<String>>;
}

pub async fn scope_request_path<Fut, R>(path: String, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_PATH
        .scope(RefCell::new(Some(path)), future)
        .await
}

pub fn current_request_path() -> Option<String> {
    CURRENT_REQUEST_PATH
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

/// Middleware that records the request path for the duration of the request.
pub async fn request_path_middleware(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    scope_request_path(path, next.run(req)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn path_is_visible_inside_scope() {
        let path = scope_request_path("/api/v1/orders".to_string(), async {
            current_request_path()
        })
        .await;
        assert_eq!(path.as_deref(), Some("/api/v1/orders"));
    }

    #[tokio::test]
    async fn path_is_absent_outside_scope() {
        assert!(current_request_path().is_none());
    }
}
