use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{forums, posts, products, root, threads};
use crate::middleware::Access;
use crate::routes::{ResourceRouter, RouteError};
use crate::state::AppState;

/// Full HTTP application: resource table plus global middleware
pub fn app(state: AppState) -> Result<Router, RouteError> {
    let config = state.config.clone();

    let router = resources(state)?
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    let router = if config.security.enable_cors {
        router.layer(cors_layer(&config.security.cors_origins))
    } else {
        router
    };

    if config.api.enable_request_logging {
        Ok(router.layer(TraceLayer::new_for_http()))
    } else {
        Ok(router)
    }
}

fn resources(state: AppState) -> Result<Router, RouteError> {
    let router = ResourceRouter::new(state)
        // Public
        .resource("/", |r| r.get(Access::Public, root::index))?
        .resource("/health", |r| r.get(Access::Public, root::health))?
        // Products: reads are public, writes are admin-only
        .resource("/products", |r| {
            r.get(Access::Public, products::list)
                .post(Access::Admin, products::create)
        })?
        .resource("/products/{id:int}", |r| {
            r.get(Access::Public, products::get)
                .put(Access::Admin, products::update)
                .delete(Access::Admin, products::delete)
        })?
        // Forums
        .resource("/forums", |r| {
            r.get(Access::Public, forums::list)
                .post(Access::Admin, forums::create)
        })?
        // Threads and posts: any identified caller may write
        .resource("/threads", |r| r.post(Access::Login, threads::create))?
        .resource("/threads/{forum_id:int}", |r| r.get(Access::Public, threads::list))?
        .resource("/posts", |r| r.post(Access::Login, posts::create))?
        .resource("/posts/{thread_id:int}", |r| r.get(Access::Public, posts::list))?;

    Ok(router.into_router())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
