#![forbid(unsafe_code)]

use anyhow::anyhow;
use poem::http::StatusCode;
use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, param::Path, ApiResponse };

use crate::api::greeter::RespHello;
use crate::api::use_case::{self, UseCase};
use crate::utils::errors::{HttpResult, StatusKind, UseCaseError};
use crate::utils::http_utils::RequestDebug;

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct BadRouteApi;

pub struct BadRoute;

#[derive(Debug)]
pub struct ReqBadRoute
{
    name: String,
    bad1: String,
    bad2: String,
}

impl RequestDebug for ReqBadRoute {
    fn get_request_info(&self) -> String {
        format!("  Path parameters:\n    name: {}\n    bad1: {}\n    bad2: {}",
                self.name, self.bad1, self.bad2)
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
#[oai(bad_request_handler = "make_http_400_decode")]
enum BadRouteResponse {
    #[oai(status = 200)]
    Http200(Json<RespHello>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_400_decode(err: poem::Error) -> BadRouteResponse {
    BadRouteResponse::Http400(Json(HttpResult::from_decode_error(&err)))
}
fn make_error_response(err: UseCaseError) -> BadRouteResponse {
    let result = Json(HttpResult::from(&err));
    match err.kind.http_status() {
        StatusCode::BAD_REQUEST => BadRouteResponse::Http400(result),
        _ => BadRouteResponse::Http500(result),
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi(prefix_path = "/api")]
impl BadRouteApi {
    /// Bad Route
    ///
    /// If bad Route greets you, you found a bug.
    #[oai(path = "/hello/:name/:bad1/:bad2", method = "get", operation_id = "badRoute")]
    async fn bad_route_api(&self, http_req: &Request, name: Path<String>,
                           bad1: Path<String>, bad2: Path<String>) -> BadRouteResponse {
        let req = ReqBadRoute { name: name.0, bad1: bad1.0, bad2: bad2.0 };
        match use_case::handle(&BadRoute, http_req, req) {
            Ok(r) => BadRouteResponse::Http200(Json(r)),
            Err(e) => make_error_response(e),
        }
    }
}

// ***************************************************************************
//                                 Use Case
// ***************************************************************************
impl UseCase for BadRoute {
    type Input = ReqBadRoute;
    type Output = RespHello;

    const TITLE: &'static str = "Bad Route";

    // Always rejects its input.
    fn interact(&self, _input: ReqBadRoute) -> Result<RespHello, UseCaseError> {
        Err(UseCaseError::wrap(anyhow!("bad route was called"), StatusKind::InvalidArgument))
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    fn req(bad1: &str, bad2: &str) -> ReqBadRoute {
        ReqBadRoute { name: "Alice".to_string(), bad1: bad1.to_string(), bad2: bad2.to_string() }
    }

    #[test]
    fn always_invalid_argument() {
        for (b1, b2) in [("x", "y"), ("1", "2"), ("", "")] {
            let err = BadRoute.interact(req(b1, b2)).unwrap_err();
            assert_eq!(err.kind, StatusKind::InvalidArgument);
            assert_eq!(err.to_string(), "invalid argument: bad route was called");
        }
    }

    #[test]
    fn error_kinds_pick_response_status() {
        let err = BadRoute.interact(req("x", "y")).unwrap_err();
        assert!(matches!(make_error_response(err), BadRouteResponse::Http400(_)));

        let err = UseCaseError::wrap(anyhow!("broken"), StatusKind::Internal);
        assert!(matches!(make_error_response(err), BadRouteResponse::Http500(_)));
    }

    #[test]
    fn request_info_lists_all_params() {
        let s = req("x", "y").get_request_info();
        assert!(s.contains("name: Alice"));
        assert!(s.contains("bad1: x"));
        assert!(s.contains("bad2: y"));
    }
}
