//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the Rates API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Postal Rates API",
        version = "0.1.0",
        description = "Price quotes for domestic and international postal products",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/rates", api = domain_postal_rates::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
