use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{config, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full application router: public system routes plus the JWT-protected API
pub fn app(state: AppState) -> Router {
    let config = config();
    router(state, &config.security, config.api.enable_request_logging)
}

fn router(state: AppState, security: &SecurityConfig, request_logging: bool) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(cors_layer(security));

    let router = if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(operations_routes())
        .merge(planning_routes())
        .merge(user_routes())
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn operations_routes() -> Router<AppState> {
    use protected::{equipment, mines, roads, weather};

    Router::new()
        .route("/mines", get(mines::mines_list))
        .route("/mines/:id", get(mines::mine_get))
        .route("/equipments", get(equipment::equipment_list).post(equipment::equipment_post))
        .route("/equipments/:id", get(equipment::equipment_get).put(equipment::equipment_put))
        .route("/weather", get(weather::weather_list))
        .route("/roads", get(roads::roads_list))
        .route("/roads/:id", put(roads::road_put))
}

fn planning_routes() -> Router<AppState> {
    use protected::{capacity, constraints, production, shipping};

    Router::new()
        .route("/effective-capacity", get(capacity::capacity_list).post(capacity::capacity_post))
        .route("/effective-capacity/:id", put(capacity::capacity_put))
        .route(
            "/production-constraints",
            get(constraints::constraints_list).post(constraints::constraints_post),
        )
        .route("/production-plans", get(production::plans_list).post(production::plans_post))
        .route("/production-plans/:id", put(production::plans_put))
        .route("/shipping-schedules", get(shipping::shipping_list).post(shipping::shipping_post))
        .route(
            "/shipping-schedules/:id",
            get(shipping::shipping_get).put(shipping::shipping_put),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route(
            "/users/:id",
            get(users::user_get).put(users::user_put).delete(users::user_delete),
        )
        .route("/users/:id/role", put(users::user_role_put))
        .route("/logout/:id", delete(users::logout))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
