use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::shared::config::{resolve_path, Config};
use crate::system::auth::middleware::{optional_auth, require_admin, require_auth, require_elevated};
use crate::{handlers, system};

/// Multipart overhead allowed on top of two attachments
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// All application routes
pub fn configure_routes(config: &Config) -> Router {
    let form_limit = config.storage.max_upload_bytes * 2 + FORM_OVERHEAD_BYTES;
    let files_dir = resolve_path(&config.storage.root_dir);
    let files_prefix = format!("/{}", config.storage.public_base_url.trim_matches('/'));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SYSTEM AUTH ROUTES (PUBLIC)
        // ========================================
        .route(
            "/api/system/auth/login",
            post(system::handlers::auth::login),
        )
        .route(
            "/api/system/auth/refresh",
            post(system::handlers::auth::refresh),
        )
        .route(
            "/api/system/auth/logout",
            post(system::handlers::auth::logout),
        )
        .route(
            "/api/system/auth/me",
            get(system::handlers::auth::current_user).layer(middleware::from_fn(require_auth)),
        )
        // Users: listing is admin only, provisioning decides itself whether
        // a caller is needed (first admin bootstrap)
        .route(
            "/api/system/users",
            get(system::handlers::users::list)
                .layer(middleware::from_fn(require_admin))
                .merge(
                    post(system::handlers::users::provision)
                        .layer(middleware::from_fn(optional_auth)),
                ),
        )
        .route(
            "/api/system/users/:id",
            get(system::handlers::users::get_by_id)
                .put(system::handlers::users::update)
                .delete(system::handlers::users::delete)
                .layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/api/system/users/:id/change-password",
            post(system::handlers::users::change_password)
                .layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/system/permissions",
            get(system::handlers::permissions::my_permissions)
                .layer(middleware::from_fn(require_auth)),
        )
        // ========================================
        // CATALOGS
        // ========================================
        .route(
            "/api/warehouses",
            get(handlers::a001_warehouse::list_all)
                .layer(middleware::from_fn(require_auth))
                .merge(
                    post(handlers::a001_warehouse::create)
                        .layer(middleware::from_fn(require_elevated)),
                ),
        )
        .route(
            "/api/warehouses/:id",
            get(handlers::a001_warehouse::get_by_id).layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/clients",
            get(handlers::a002_client::list_all)
                .layer(middleware::from_fn(require_auth))
                .merge(
                    post(handlers::a002_client::create)
                        .layer(middleware::from_fn(require_elevated)),
                ),
        )
        .route(
            "/api/clients/:id",
            get(handlers::a002_client::get_by_id).layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/products",
            get(handlers::a003_product::list_all)
                .layer(middleware::from_fn(require_auth))
                .merge(
                    post(handlers::a003_product::create)
                        .layer(middleware::from_fn(require_elevated)),
                ),
        )
        .route(
            "/api/products/:id",
            get(handlers::a003_product::get_by_id).layer(middleware::from_fn(require_auth)),
        )
        // Stock rights come from the role permission table
        .route(
            "/api/stock",
            get(handlers::a004_stock::list_grouped)
                .post(handlers::a004_stock::add)
                .layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/stock/:id",
            put(handlers::a004_stock::update_quantity).layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/employees",
            get(handlers::a005_employee::list_all)
                .post(handlers::a005_employee::create)
                .layer(middleware::from_fn(require_elevated)),
        )
        .route(
            "/api/employees/:id/toggle-active",
            post(handlers::a005_employee::toggle_active)
                .layer(middleware::from_fn(require_elevated)),
        )
        // ========================================
        // LOADS
        // ========================================
        .route(
            "/api/loads",
            get(handlers::a006_load::list)
                .post(handlers::a006_load::create)
                .layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/loads/:id",
            get(handlers::a006_load::get_view).layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/loads/:id/stages/:stage",
            get(handlers::a006_load::get_stage).layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/loads/:id/stages/:stage/advance",
            post(handlers::a006_load::advance)
                .layer(DefaultBodyLimit::max(form_limit))
                .layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/api/loads/:id/cancel",
            post(handlers::a006_load::cancel).layer(middleware::from_fn(require_auth)),
        )
        .nest_service(&files_prefix, ServeDir::new(files_dir))
}
