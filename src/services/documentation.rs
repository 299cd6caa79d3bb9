use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Family Feud room server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::get_state,
        crate::routes::rooms::save_state,
        crate::routes::rooms::delete_state,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::room::RoomStateAck,
            crate::state::game::GameState,
            crate::state::game::Question,
            crate::state::game::Answer,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Per-room game state shared by hosts and viewers"),
    )
)]
pub struct ApiDoc;
