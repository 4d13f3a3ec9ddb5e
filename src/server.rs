#![forbid(unsafe_code)]

use log::info;
use poem::{listener::TcpListener, Endpoint, Route};
use poem_openapi::OpenApiService;

use crate::api::bad_route::BadRouteApi;
use crate::api::greeter::GreeterApi;
use crate::utils::config::Config;
use crate::utils::middleware::with_middleware;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME    : &str = "HelloOpenApiServer"; // for poem logging
const DOCS_PATH      : &str = "/docs";
const SPEC_JSON_PATH : &str = "/docs/openapi.json";
const SPEC_YAML_PATH : &str = "/docs/openapi.yaml";

// ---------------------------------------------------------------------------
// build_app:
// ---------------------------------------------------------------------------
/** Register the API routes, the generated OpenAPI documents and Swagger UI,
 * then wrap everything in the middleware chain.
 */
pub fn build_app(config: &Config) -> impl Endpoint {
    let endpoints = (GreeterApi, BadRouteApi);
    let api_service = OpenApiService::new(endpoints, &config.title, &config.version)
        .description(&config.description);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();
    let ui = api_service.swagger_ui();

    let app = Route::new()
        .nest("/", api_service)
        .at(SPEC_JSON_PATH, spec)
        .at(SPEC_YAML_PATH, spec_yaml)
        .nest(DOCS_PATH, ui);

    with_middleware(app)
}

// ---------------------------------------------------------------------------
// run_server:
// ---------------------------------------------------------------------------
/** Bind the configured address and serve until the process is killed.  Only
 * returns on failure, typically when the port is already in use.
 */
pub async fn run_server(config: &Config) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.bind_addr, config.http_port);
    info!("http://localhost:{}{}", config.http_port, DOCS_PATH);

    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(build_app(config))
        .await
}
