use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use eyre::{Result, WrapErr};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::{
    adapters::http_request::{HttpRequestView, HttpViewError},
    config::models::{HydratorConfig, RouteConfig},
    core::Hydrator,
    metrics,
    tracing_setup::create_request_span,
};

/// Route target: the DTO a matched pattern hydrates
#[derive(Debug, Clone)]
struct RouteTarget {
    pattern: String,
    dto: String,
}

/// Per-method `matchit` routers built from the configured routes
#[derive(Default)]
pub struct RouteTable {
    routers: HashMap<Method, matchit::Router<RouteTarget>>,
}

enum RouteMatch {
    Found {
        target: RouteTarget,
        vars: HashMap<String, String>,
    },
    MethodNotAllowed,
    NotFound,
}

impl RouteTable {
    pub fn new(routes: &[RouteConfig]) -> Result<Self> {
        let mut table = Self::default();

        for route in routes {
            for method in &route.methods {
                let method = Method::from_bytes(method.to_uppercase().as_bytes())
                    .wrap_err_with(|| format!("Invalid HTTP method '{method}'"))?;
                let target = RouteTarget {
                    pattern: route.path.clone(),
                    dto: route.dto.clone(),
                };
                table
                    .routers
                    .entry(method.clone())
                    .or_default()
                    .insert(route.path.clone(), target)
                    .wrap_err_with(|| format!("Failed to register route {method} {}", route.path))?;
            }
        }

        Ok(table)
    }

    fn find(&self, method: &Method, path: &str) -> RouteMatch {
        if let Some(router) = self.routers.get(method)
            && let Ok(matched) = router.at(path)
        {
            let vars = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            return RouteMatch::Found {
                target: matched.value.clone(),
                vars,
            };
        }

        if self.routers.values().any(|router| router.at(path).is_ok()) {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotFound
        }
    }
}

/// Everything one request needs, swapped as a unit on schema reload
pub struct HydrationState {
    hydrator: Hydrator,
    routes: RouteTable,
    max_body_bytes: usize,
}

impl HydrationState {
    pub fn new(hydrator: Hydrator, routes: RouteTable, max_body_bytes: usize) -> Self {
        Self {
            hydrator,
            routes,
            max_body_bytes,
        }
    }

    pub fn from_config(config: &HydratorConfig) -> Result<Self> {
        let registry = config
            .build_registry()
            .wrap_err("Failed to build dto registry")?;
        let hydrator =
            Hydrator::new(Arc::new(registry)).with_mode(config.hydration.coercion_mode());
        let routes = RouteTable::new(&config.routes)?;

        Ok(Self::new(hydrator, routes, config.hydration.max_body_bytes))
    }

    pub fn hydrator(&self) -> &Hydrator {
        &self.hydrator
    }
}

/// HTTP handler hydrating the DTO bound to each matched route
#[derive(Clone)]
pub struct HydrationHandler {
    state: Arc<ArcSwap<HydrationState>>,
}

impl HydrationHandler {
    pub fn new(state: HydrationState) -> Self {
        Self {
            state: Arc::new(ArcSwap::from_pointee(state)),
        }
    }

    pub fn from_config(config: &HydratorConfig) -> Result<Self> {
        Ok(Self::new(HydrationState::from_config(config)?))
    }

    /// Swap in a freshly built state. On error the current one stays active.
    pub fn reload(&self, config: &HydratorConfig) -> Result<()> {
        let state = HydrationState::from_config(config)?;
        let dtos = state.hydrator.registry().len();
        self.state.store(Arc::new(state));
        metrics::set_registered_dtos(dtos);
        tracing::info!(dtos, routes = config.routes.len(), "Hydration state reloaded");
        Ok(())
    }

    pub fn current(&self) -> Arc<HydrationState> {
        self.state.load_full()
    }

    /// Axum router answering every request through [`Self::handle`]
    pub fn router(self) -> Router {
        Router::new()
            .fallback(dispatch)
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    pub async fn handle(&self, request: Request) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = create_request_span(
            request.method().as_str(),
            request.uri().path(),
            &request_id,
        );

        self.handle_inner(request).instrument(span).await
    }

    async fn handle_inner(&self, request: Request) -> Response {
        let state = self.current();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let (target, vars) = match state.routes.find(&method, &path) {
            RouteMatch::Found { target, vars } => (target, vars),
            RouteMatch::MethodNotAllowed => {
                metrics::increment_request_total(metrics::UNMATCHED_ROUTE, method.as_str(), 405);
                return error_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "METHOD_NOT_ALLOWED",
                    format!("method {method} is not allowed for {path}"),
                );
            }
            RouteMatch::NotFound => {
                metrics::increment_request_total(metrics::UNMATCHED_ROUTE, method.as_str(), 404);
                return error_response(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("no route matches {method} {path}"),
                );
            }
        };

        tracing::Span::current().record("dto", target.dto.as_str());

        let response = match HttpRequestView::from_request(request, vars, state.max_body_bytes).await
        {
            Ok(view) => match state.hydrator.hydrate(&target.dto, &view) {
                Ok(dto) => (
                    StatusCode::OK,
                    Json(json!({ "dto": dto.type_name(), "data": dto.to_json() })),
                )
                    .into_response(),
                Err(e) => {
                    let status = StatusCode::from_u16(e.status_code())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    (status, Json(e.to_json())).into_response()
                }
            },
            Err(e @ HttpViewError::BodyTooLarge { .. }) => {
                error_response(StatusCode::PAYLOAD_TOO_LARGE, "BODY_TOO_LARGE", e.to_string())
            }
            Err(e @ HttpViewError::Body(_)) => {
                error_response(StatusCode::BAD_REQUEST, "BODY_UNREADABLE", e.to_string())
            }
        };

        let status = response.status().as_u16();
        tracing::Span::current().record("http.status_code", status);
        metrics::increment_request_total(&target.pattern, method.as_str(), status);

        response
    }
}

async fn dispatch(State(handler): State<HydrationHandler>, request: Request) -> Response {
    handler.handle(request).await
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    let body: Value = json!({
        "error": true,
        "code": code,
        "message": message,
    });
    (status, Json(body)).into_response()
}
