//! OpenAPI documentation for the one REST endpoint this service exposes.
//! Generated with utoipa, the way `familiar-api::openapi` documents its
//! routes; most of spec.md §6's tool surface lives over MCP instead and has
//! no OpenAPI representation.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::http_error::HttpErrorBody;
use crate::routes::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Strategy Compiler API",
        version = "1.0.0",
        description = "HTTP facade over the strategy compilation service. Card/strategy \
            authoring and compilation are exposed to agents over MCP \
            (see the strategy-mcp binary); this HTTP surface carries only \
            the one REST endpoint and health checks spec.md §6 names.",
        license(name = "MIT"),
    ),
    paths(crate::routes::health::health_check, crate::routes::strategies::get_strategy_handler),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "strategies", description = "Strategy read endpoint"),
    ),
    components(schemas(HealthResponse, HttpErrorBody))
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi())
}