use utoipa::OpenApi;

use crate::error::{ErrorResponse, OkResponse};
use crate::handlers;
use crate::health::AggregatedHealth;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "items-api",
        version = "0.1.0",
        description = "CRUD over a single item collection backed by a key-value store, plus an aggregated health check"
    ),
    paths(
        handlers::health::health_handler,
        handlers::list::list_handler,
        handlers::create::create_handler,
        handlers::get::get_handler,
        handlers::put::put_handler,
        handlers::delete::delete_handler
    ),
    components(schemas(AggregatedHealth, ErrorResponse, OkResponse)),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "items", description = "Item collection operations")
    )
)]
pub struct ApiDoc;
