// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CreateIdentityRequest, CreateIdentityResponse, DeploymentResponse, GasParamsDto,
        IdentityAddressResponse, IdentitySummary, ListOpsResponse, OpHashRequest, OpHashResponse,
        RelayRequest,
    },
    state::AppState,
    storage::{RefundRecord, RelayRecord},
};

pub mod deployment;
pub mod health;
pub mod identities;
pub mod params;
pub mod relay;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/deployment", get(deployment::get_deployment))
        .route("/identities", post(identities::create_identity))
        .route(
            "/identities/address",
            get(identities::predict_identity_address),
        )
        .route("/identities/{address}", get(identities::get_identity))
        .route(
            "/identities/{address}/op-hash",
            post(identities::get_op_hash),
        )
        .route(
            "/identities/{address}/ops",
            get(identities::list_identity_ops),
        )
        .route("/relay", post(relay::relay_op))
        .route("/relay/{op_hash}", get(relay::get_relayed_op))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        deployment::get_deployment,
        identities::predict_identity_address,
        identities::create_identity,
        identities::get_identity,
        identities::get_op_hash,
        identities::list_identity_ops,
        relay::relay_op,
        relay::get_relayed_op
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            DeploymentResponse,
            IdentityAddressResponse,
            CreateIdentityRequest,
            CreateIdentityResponse,
            IdentitySummary,
            GasParamsDto,
            OpHashRequest,
            OpHashResponse,
            RelayRequest,
            RelayRecord,
            RefundRecord,
            ListOpsResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Deployment", description = "Core contract addresses"),
        (name = "Identities", description = "Identity creation, state and op hashing"),
        (name = "Relay", description = "Meta-transaction submission and journal")
    )
)]
pub struct ApiDoc;


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/v1/deployment",
            "/v1/identities",
            "/v1/identities/address",
            "/v1/identities/{address}",
            "/v1/identities/{address}/op-hash",
            "/v1/identities/{address}/ops",
            "/v1/relay",
            "/v1/relay/{op_hash}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
