#![forbid(unsafe_code)]

use std::any::Any;
use std::time::Instant;

use log::{error, info, warn};
use poem::http::{HeaderValue, StatusCode};
use poem::middleware::{CatchPanic, Compression};
use poem::{Endpoint, EndpointExt, IntoResponse, Middleware, Request, Response, Result};
use uuid::Uuid;

use crate::utils::errors::{HttpResult, StatusKind};

// ***************************************************************************
//                                Constants
// ***************************************************************************
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ***************************************************************************
//                              Middleware Chain
// ***************************************************************************
// ---------------------------------------------------------------------------
// with_middleware:
// ---------------------------------------------------------------------------
/** Wrap the routed application in the middleware chain applied to every
 * request.  The last middleware added is the outermost:
 *
 *   request logging -> panic recovery -> compression -> error rendering -> routes
 */
pub fn with_middleware<E>(ep: E) -> impl Endpoint
where
    E: Endpoint + 'static,
{
    ep.catch_all_error(render_error)
        .with(Compression::new())
        .with(CatchPanic::new().with_handler(panic_response))
        .with(RequestLog)
}

// ---------------------------------------------------------------------------
// render_error:
// ---------------------------------------------------------------------------
/** Render request decoding failures raised below the handlers, such as
 * undecodable path parameters, as INVALID_ARGUMENT JSON bodies.  Any other
 * error keeps poem's default response.
 */
async fn render_error(err: poem::Error) -> Response {
    if err.status() != StatusCode::BAD_REQUEST {
        return err.into_response();
    }
    let body = HttpResult::from_decode_error(&err);
    json_response(StatusKind::InvalidArgument.http_status(), &body)
}

// ---------------------------------------------------------------------------
// panic_response:
// ---------------------------------------------------------------------------
/** Turn a panic raised while handling a request into a 500 response. */
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", detail);

    let kind = StatusKind::Internal;
    let body = HttpResult::new(kind.code().to_string(), "internal server error".to_string());
    json_response(kind.http_status(), &body)
}

fn json_response(status: StatusCode, body: &HttpResult) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => Response::builder()
            .status(status)
            .content_type("application/json; charset=utf-8")
            .body(json),
        Err(_) => status.into_response(),
    }
}

// ***************************************************************************
//                               Request Logging
// ***************************************************************************
/// Logs one line per request with a generated request id, the response
/// status and the elapsed time.  The id is echoed in the x-request-id
/// response header.
pub struct RequestLog;

impl<E: Endpoint> Middleware<E> for RequestLog {
    type Output = RequestLogEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RequestLogEndpoint { inner: ep }
    }
}

pub struct RequestLogEndpoint<E> {
    inner: E,
}

impl<E: Endpoint> Endpoint for RequestLogEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        let request_id = Uuid::new_v4();
        let method = req.method().clone();
        let uri = req.uri().clone();
        let start = Instant::now();

        match self.inner.call(req).await {
            Ok(resp) => {
                let mut resp = resp.into_response();
                if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                    resp.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                info!("[{}] {} {} -> {} ({:?})", request_id, method, uri, resp.status(), start.elapsed());
                Ok(resp)
            }
            Err(err) => {
                warn!("[{}] {} {} -> {} ({:?}): {}", request_id, method, uri, err.status(), start.elapsed(), err);
                Err(err)
            }
        }
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::test::TestClient;
    use poem::{get, handler, Route};

    #[handler]
    fn explode() -> String {
        panic!("boom");
    }

    #[handler]
    fn fine() -> String {
        "fine".repeat(64)
    }

    #[handler]
    fn reject() -> Result<String> {
        Err(poem::Error::from_string("unparseable", StatusCode::BAD_REQUEST))
    }

    fn app() -> impl Endpoint {
        with_middleware(Route::new()
            .at("/explode", get(explode))
            .at("/fine", get(fine))
            .at("/reject", get(reject)))
    }

    fn request_id(resp: &poem::test::TestResponse) -> Uuid {
        let value = resp.0.headers().get(REQUEST_ID_HEADER).expect("missing request id");
        Uuid::parse_str(value.to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn panic_becomes_500() {
        let cli = TestClient::new(app());

        let resp = cli.get("/explode").send().await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = resp.0.into_body().into_json().await.unwrap();
        assert_eq!(body["result_code"], "INTERNAL");

        // The server keeps serving after a panic.
        let resp = cli.get("/fine").send().await;
        resp.assert_status_is_ok();
    }

    #[tokio::test]
    async fn gzip_when_accepted() {
        let cli = TestClient::new(app());
        let resp = cli.get("/fine").header("Accept-Encoding", "gzip").send().await;
        resp.assert_status_is_ok();
        resp.assert_header("content-encoding", "gzip");
    }

    #[tokio::test]
    async fn unmatched_route_passes_through() {
        let cli = TestClient::new(app());
        let resp = cli.get("/missing").send().await;
        resp.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn panicking_requests_are_logged() {
        let cli = TestClient::new(app());
        let resp = cli.get("/explode").send().await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        request_id(&resp);
    }

    #[tokio::test]
    async fn request_ids_are_unique() {
        let cli = TestClient::new(app());
        let first = cli.get("/fine").send().await;
        let second = cli.get("/fine").send().await;
        assert_ne!(request_id(&first), request_id(&second));
    }

    #[tokio::test]
    async fn bad_request_errors_render_as_json() {
        let cli = TestClient::new(app());
        let resp = cli.get("/reject").send().await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        request_id(&resp);
        let body: serde_json::Value = resp.0.into_body().into_json().await.unwrap();
        assert_eq!(body["result_code"], "INVALID_ARGUMENT");
        assert_eq!(body["result_msg"], "invalid argument: unparseable");
    }
}
