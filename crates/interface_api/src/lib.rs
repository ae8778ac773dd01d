//! HTTP API Layer
//!
//! REST surface over the CRM record-access layer, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per entity, thin over `domain_crm` repositories
//! - **Middleware**: request ids, request logging, tracing, CORS
//! - **DTOs**: query parameters and bodies that are not records themselves
//! - **Error Handling**: `CrmError` mapped to consistent JSON error bodies
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let store = infra_remote::remote_store()?;
//! let app = create_router(Arc::new(Crm::new(store)), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_crm::Crm;

use crate::config::ApiConfig;
use crate::handlers::{activities, companies, contacts, deals, health};
use crate::middleware::request_logging;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub crm: Arc<Crm>,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// `/health` and `/ready` sit at the root; every CRM route is nested under
/// `config.api_prefix`.
pub fn create_router(crm: Arc<Crm>, config: ApiConfig) -> Router {
    let prefix = config.api_prefix.clone();
    let state = AppState { crm, config };

    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check));

    let contact_routes = Router::new()
        .route("/", get(contacts::list_contacts).post(contacts::create_contact))
        .route("/export", get(contacts::export_contacts))
        .route("/bulk-update", post(contacts::bulk_update_contacts))
        .route("/bulk-delete", post(contacts::bulk_delete_contacts))
        .route(
            "/:id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        );

    let company_routes = Router::new()
        .route("/", get(companies::list_companies).post(companies::create_company))
        .route(
            "/:id",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        );

    let deal_routes = Router::new()
        .route("/", get(deals::list_deals).post(deals::create_deal))
        .route("/stages", get(deals::list_stages))
        .route("/by-stage", get(deals::deals_by_stage))
        .route("/pipeline", get(deals::pipeline_summary))
        .route(
            "/:id",
            get(deals::get_deal)
                .put(deals::update_deal)
                .delete(deals::delete_deal),
        )
        .route("/:id/stage", put(deals::update_stage));

    let activity_routes = Router::new()
        .route("/", get(activities::list_activities).post(activities::create_activity))
        .route("/types", get(activities::list_types))
        .route("/upcoming", get(activities::upcoming_activities))
        .route("/overdue", get(activities::overdue_activities))
        .route(
            "/:id",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route("/:id/complete", post(activities::complete_activity));

    let api_routes = Router::new()
        .nest("/contacts", contact_routes)
        .nest("/companies", company_routes)
        .nest("/deals", deal_routes)
        .nest("/activities", activity_routes);

    Router::new()
        .merge(public_routes)
        .nest(&prefix, api_routes)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
