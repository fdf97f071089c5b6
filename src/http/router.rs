// Router - routes and middleware for the food API

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let food = Router::new()
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:category-name",
            get(handlers::get_category).delete(handlers::delete_category),
        )
        // Subcategories
        .route(
            "/categories/:category-name/subcategories",
            get(handlers::list_subcategories).post(handlers::create_subcategory),
        )
        .route(
            "/categories/:category-name/subcategories/:subcategory-name",
            get(handlers::get_subcategory).delete(handlers::delete_subcategory),
        )
        // Units
        .route(
            "/subcategories/:subcategory-name/units",
            get(handlers::list_subcategory_units).post(handlers::create_unit),
        )
        .route(
            "/subcategories/:subcategory-name/units/:unit-name",
            get(handlers::get_subcategory_unit).delete(handlers::delete_unit),
        )
        .route(
            "/categories/:category-name/units",
            get(handlers::list_category_units),
        )
        .route(
            "/categories/:category-name/units/:unit-name",
            get(handlers::get_category_unit),
        );

    Router::new()
        .nest("/food", food)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
