#![forbid(unsafe_code)]

use poem::http::StatusCode;
use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };

use crate::api::use_case::{self, UseCase};
use crate::utils::errors::{HttpResult, UseCaseError};
use crate::utils::http_utils::RequestDebug;

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct GreeterApi;

pub struct Greeter;

#[derive(Debug)]
pub struct ReqGreeter
{
    name: String,
}

/// Output shared by the hello routes.
#[derive(Object, Debug)]
pub struct RespHello
{
    message: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqGreeter {
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Path parameters:");
        s.push_str("\n    name: ");
        s.push_str(&self.name);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
#[oai(bad_request_handler = "make_http_400_decode")]
enum GreeterResponse {
    #[oai(status = 200)]
    Http200(Json<RespHello>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespHello) -> GreeterResponse {
    GreeterResponse::Http200(Json(resp))
}
fn make_http_400_decode(err: poem::Error) -> GreeterResponse {
    GreeterResponse::Http400(Json(HttpResult::from_decode_error(&err)))
}
fn make_error_response(err: UseCaseError) -> GreeterResponse {
    let result = Json(HttpResult::from(&err));
    match err.kind.http_status() {
        StatusCode::BAD_REQUEST => GreeterResponse::Http400(result),
        _ => GreeterResponse::Http500(result),
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi(prefix_path = "/api")]
impl GreeterApi {
    /// Greeter
    ///
    /// Greeter greets you.
    #[oai(path = "/hello/:name", method = "get", operation_id = "greeter")]
    async fn greeter_api(&self, http_req: &Request,
                         #[oai(validator(min_length = 1))] name: Path<String>) -> GreeterResponse {
        let req = ReqGreeter { name: name.0 };
        match use_case::handle(&Greeter, http_req, req) {
            Ok(r) => make_http_200(r),
            Err(e) => make_error_response(e),
        }
    }
}

// ***************************************************************************
//                                 Use Case
// ***************************************************************************
impl UseCase for Greeter {
    type Input = ReqGreeter;
    type Output = RespHello;

    const TITLE: &'static str = "Greeter";

    fn interact(&self, input: ReqGreeter) -> Result<RespHello, UseCaseError> {
        Ok(RespHello::new(format!("Hello {}", input.name)))
    }
}

impl RespHello {
    fn new(message: String) -> Self {
        Self { message }
    }
}
