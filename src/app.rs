use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::role::{ADMIN, AGENT, BUILDER, COMMERCIAL_OWNERS, LANDLORD, TENANT};
use crate::middleware::{require_entitlement, require_kyc, require_role, resolve_identity, EntitlementGate};
use crate::services::entitlement::EntitlementPolicy;
use crate::state::AppState;

/// Full application router. Identity is resolved once per request; each route
/// decides whether it needs it.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .merge(auth_routes())
        .merge(property_routes(&state))
        .merge(project_routes())
        .merge(commercial_routes())
        .merge(agent_routes())
        .merge(account_routes())
        .merge(workflow_routes())
        .merge(subscription_routes())
        .merge(estate_routes())
        .fallback(route_not_found)
        // Global middleware
        .layer(from_fn_with_state(state.clone(), resolve_identity))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/users/me", patch(auth::update_me))
}

fn property_routes(state: &AppState) -> Router<AppState> {
    use handlers::{favorites, inquiries, properties};

    let entitled = |policy| from_fn_with_state(EntitlementGate::new(state, policy), require_entitlement);

    Router::new()
        .route(
            "/api/properties",
            get(properties::list).post(
                properties::create
                    .layer(entitled(EntitlementPolicy::CREATE_LISTING))
                    // KYC runs first so a blocked listing does not spend a credit
                    .layer(from_fn_with_state(state.clone(), require_kyc)),
            ),
        )
        .route("/api/properties/mine", get(properties::mine))
        .route(
            "/api/properties/:id",
            get(properties::show)
                .patch(properties::update)
                .delete(properties::retire),
        )
        .route("/api/properties/:id/status", patch(properties::update_status))
        .route(
            "/api/properties/:id/contact",
            get(properties::contact.layer(entitled(EntitlementPolicy::VIEW_CONTACT))),
        )
        .route(
            "/api/properties/:id/virtual-tour",
            get(properties::virtual_tour.layer(entitled(EntitlementPolicy::VIRTUAL_TOUR))),
        )
        .route(
            "/api/properties/:id/insights",
            get(properties::insights.layer(entitled(EntitlementPolicy::AI_INSIGHTS))),
        )
        .route(
            "/api/properties/:id/favorite",
            post(favorites::add).delete(favorites::remove),
        )
        .route(
            "/api/properties/:id/inquiries",
            get(inquiries::list_for_property)
                .post(inquiries::create.layer(from_fn_with_state(TENANT, require_role))),
        )
        .route("/api/favorites", get(favorites::list))
        .route("/api/inquiries", get(inquiries::list_sent))
        .route("/api/inquiries/:id/status", patch(inquiries::update_status))
}

fn project_routes() -> Router<AppState> {
    use handlers::projects;

    let builder = || from_fn_with_state(BUILDER, require_role);

    Router::new()
        .route(
            "/api/projects",
            get(projects::list).post(projects::create.layer(builder())),
        )
        .route(
            "/api/projects/:id",
            get(projects::show)
                .patch(projects::update.layer(builder()))
                .delete(projects::delete.layer(builder())),
        )
}

fn commercial_routes() -> Router<AppState> {
    use handlers::commercial;

    let owners = || from_fn_with_state(COMMERCIAL_OWNERS, require_role);

    Router::new()
        .route(
            "/api/commercial",
            get(commercial::list).post(commercial::create.layer(owners())),
        )
        .route(
            "/api/commercial/:id",
            get(commercial::show)
                .patch(commercial::update.layer(owners()))
                .delete(commercial::delete.layer(owners())),
        )
}

fn agent_routes() -> Router<AppState> {
    use handlers::{agents, appointments};

    Router::new()
        .route("/api/agents/:id", get(agents::show))
        .route(
            "/api/agents/:id/reviews",
            get(agents::reviews).post(agents::create_review),
        )
        .route(
            "/api/appointments",
            get(appointments::list_own).post(appointments::create),
        )
        .route("/api/appointments/:id/status", patch(appointments::update_status))
        .route(
            "/api/agent/appointments",
            get(appointments::list_for_agent.layer(from_fn_with_state(AGENT, require_role))),
        )
}

fn account_routes() -> Router<AppState> {
    use handlers::{notifications, saved_searches};

    Router::new()
        .route(
            "/api/saved-searches",
            get(saved_searches::list).post(saved_searches::create),
        )
        .route(
            "/api/saved-searches/:id",
            get(saved_searches::show)
                .patch(saved_searches::update)
                .delete(saved_searches::delete),
        )
        .route("/api/saved-searches/:id/results", get(saved_searches::results))
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/:id", delete(notifications::delete))
        .route("/api/notifications/:id/read", patch(notifications::mark_read))
}

fn workflow_routes() -> Router<AppState> {
    use handlers::{kyc, verification};

    let admin = || from_fn_with_state(ADMIN, require_role);

    Router::new()
        // KYC
        .route("/api/kyc", get(kyc::list.layer(admin())).post(kyc::submit))
        .route("/api/kyc/me", get(kyc::me))
        .route("/api/kyc/verify-otp", post(kyc::verify_otp))
        .route("/api/kyc/resend-otp", post(kyc::resend_otp))
        .route("/api/kyc/:id", patch(kyc::review.layer(admin())))
        // Role verification
        .route(
            "/api/verification",
            get(verification::list.layer(admin())).post(verification::submit),
        )
        .route("/api/verification/me", get(verification::me))
        .route("/api/verification/:id", patch(verification::review.layer(admin())))
}

fn subscription_routes() -> Router<AppState> {
    use handlers::subscriptions;

    Router::new()
        .route("/api/subscriptions/plans", get(subscriptions::plans))
        .route("/api/subscriptions/me", get(subscriptions::me))
        .route(
            "/api/admin/subscriptions/:user_id",
            put(subscriptions::assign.layer(from_fn_with_state(ADMIN, require_role))),
        )
}

fn estate_routes() -> Router<AppState> {
    use handlers::{leases, utility_bills};

    let landlord = || from_fn_with_state(LANDLORD, require_role);

    Router::new()
        // Leases
        .route(
            "/api/leases",
            get(leases::list).post(leases::create.layer(landlord())),
        )
        .route(
            "/api/leases/:id",
            get(leases::show)
                .patch(leases::update.layer(landlord()))
                .delete(leases::delete.layer(landlord())),
        )
        .route(
            "/api/leases/:id/terminate",
            post(leases::terminate.layer(landlord())),
        )
        // Utility bills
        .route(
            "/api/utility-bills",
            get(utility_bills::list).post(utility_bills::create.layer(landlord())),
        )
        .route(
            "/api/utility-bills/:id",
            get(utility_bills::show)
                .patch(utility_bills::update.layer(landlord()))
                .delete(utility_bills::delete.layer(landlord())),
        )
        .route(
            "/api/utility-bills/:id/pay",
            post(utility_bills::pay.layer(from_fn_with_state(TENANT, require_role))),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
