//! Route definitions for the Larder inventory API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health::health_check))
        // Auth routes (mixed public/protected)
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - items and their lots
        .nest("/items", item_routes(state.clone()))
        // Protected routes - lot ledger
        .nest("/lots", lot_routes(state.clone()))
        // Protected routes - locations
        .nest("/locations", location_routes(state.clone()))
        // Protected routes - inventories and membership
        .nest("/inventories", inventory_routes(state.clone()))
        // Protected routes - search
        .nest("/search", search_routes(state.clone()))
        // Protected routes - trash
        .nest("/trash", trash_routes(state.clone()))
        // Protected routes - chat assistant
        .nest("/chat", chat_routes(state.clone()))
        // Protected routes - notifications
        .nest("/notifications", notification_routes(state.clone()))
        // Protected routes - transaction log
        .nest("/audit", audit_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password))
        .merge(protected_auth_routes(state))
}

/// Account routes that need a valid access token
fn protected_auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/change-password", post(handlers::auth::change_password))
        .route("/account", delete(handlers::auth::delete_account))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Item routes (protected)
fn item_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::item::list_items).post(handlers::item::create_item),
        )
        .route("/expiring", get(handlers::item::expiring_items))
        .route("/oldest", get(handlers::item::oldest_items))
        .route(
            "/:item_id",
            get(handlers::item::get_item)
                .put(handlers::item::update_item)
                .delete(handlers::item::delete_item),
        )
        .route(
            "/:item_id/lots",
            get(handlers::item::get_item_lots).post(handlers::lot::create_lot),
        )
        .route("/:item_id/sync-quantity", post(handlers::item::sync_quantity))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Lot ledger routes (protected)
fn lot_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:lot_id/reduce", post(handlers::lot::reduce_lot))
        .route("/:lot_id", delete(handlers::lot::delete_lot))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Location routes (protected)
fn location_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::location::list_locations).post(handlers::location::create_location),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Inventory and membership routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::inventory::list_inventories).post(handlers::inventory::create_inventory),
        )
        .route(
            "/:inventory_id/members",
            get(handlers::inventory::list_members).post(handlers::inventory::add_member),
        )
        .route(
            "/:inventory_id/members/:user_id",
            delete(handlers::inventory::remove_member),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Search routes (protected)
fn search_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::search::search_items))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Trash routes (protected)
fn trash_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::trash::list_trash))
        .route("/purge-old", post(handlers::trash::purge_old))
        .route("/:item_id/restore", put(handlers::trash::restore_item))
        .route("/:item_id", delete(handlers::trash::purge_item))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Chat assistant routes (protected)
fn chat_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::chat::chat))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Transaction log routes (protected)
fn audit_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::audit::list_transactions))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/expiration-digest",
            post(handlers::notification::send_expiration_digest),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
