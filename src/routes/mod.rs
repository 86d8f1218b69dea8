//! Declarative resource routing.
//!
//! Each resource is a path template plus a set of `(method, access, handler)`
//! bindings. [`ResourceRouter`] compiles them into an axum [`Router`]:
//!
//! - the template's typed placeholders are checked against the decoded path
//!   parameters before anything else, so a non-numeric `{id:int}` segment is a
//!   404 whatever the method or caller;
//! - a method with no binding on a matching path is a 405;
//! - `Access::Login` / `Access::Admin` wrap only the endpoint they guard.

pub mod template;

use std::sync::Arc;

use axum::{
    extract::{rejection::RawPathParamsRejection, RawPathParams, Request, State},
    handler::Handler,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};

use crate::error::ApiError;
use crate::middleware::{require_admin, require_login, Access};
use crate::state::AppState;

pub use template::{ParamKind, PathTemplate, RouteError};

/// Method bindings for one path template
pub struct Methods {
    state: AppState,
    inner: Option<MethodRouter<AppState>>,
}

impl Methods {
    pub fn on<H, T>(mut self, filter: MethodFilter, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let endpoint = guard(&self.state, access, on(filter, handler));
        self.inner = Some(match self.inner.take() {
            Some(existing) => existing.merge(endpoint),
            None => endpoint,
        });
        self
    }

    pub fn get<H, T>(self, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.on(MethodFilter::GET, access, handler)
    }

    pub fn post<H, T>(self, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.on(MethodFilter::POST, access, handler)
    }

    pub fn put<H, T>(self, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.on(MethodFilter::PUT, access, handler)
    }

    pub fn delete<H, T>(self, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.on(MethodFilter::DELETE, access, handler)
    }
}

fn guard(state: &AppState, access: Access, endpoint: MethodRouter<AppState>) -> MethodRouter<AppState> {
    match access {
        Access::Public => endpoint,
        Access::Login => endpoint.route_layer(middleware::from_fn(require_login)),
        Access::Admin => endpoint.route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
    }
}

pub struct ResourceRouter {
    state: AppState,
    router: Router<AppState>,
}

impl ResourceRouter {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            router: Router::new(),
        }
    }

    /// Register `template` with the bindings added by `bind`
    pub fn resource<F>(mut self, template: &str, bind: F) -> Result<Self, RouteError>
    where
        F: FnOnce(Methods) -> Methods,
    {
        let template = PathTemplate::parse(template)?;
        let methods = bind(Methods {
            state: self.state.clone(),
            inner: None,
        });

        let Some(method_router) = methods.inner else {
            tracing::warn!("resource {} registered without methods", template);
            return Ok(self);
        };

        let path = template.axum_path();
        let method_router = method_router.fallback(method_not_allowed);
        let method_router = if template.has_typed_params() {
            method_router.layer(middleware::from_fn_with_state(Arc::new(template), enforce_template))
        } else {
            method_router
        };

        self.router = self.router.route(&path, method_router);
        Ok(self)
    }

    pub fn into_router(self) -> Router {
        self.router.fallback(not_found).with_state(self.state)
    }
}

/// Treat a typed placeholder that fails to parse as if no route matched
async fn enforce_template(
    State(template): State<Arc<PathTemplate>>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    request: Request,
    next: Next,
) -> Response {
    let accepted = match &params {
        Ok(params) => template.accepts(params.iter()),
        // Parameters that do not decode to UTF-8 cannot satisfy any placeholder
        Err(_) => false,
    };
    if !accepted {
        tracing::debug!("{} does not satisfy {}", request.uri().path(), template);
        return not_found().await.into_response();
    }
    next.run(request).await
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}
