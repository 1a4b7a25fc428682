pub mod config;
pub mod domain;
pub mod global;
pub mod shutdown;
pub mod state;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::activity::handler as activity;
use crate::global::middleware::request_id_middleware;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        domain::health::handler::health_check,
        domain::activity::handler::list_activities,
        domain::activity::handler::get_activity,
        domain::activity::handler::create_activity,
        domain::activity::handler::update_activity,
        domain::activity::handler::delete_activity,
        domain::activity::handler::batch_delete_activities,
        domain::activity::handler::register_activity,
        domain::activity::handler::my_registrations,
        domain::activity::handler::list_registrations,
        domain::activity::handler::cancel_registration,
        domain::activity::handler::mark_attendance,
        domain::activity::handler::export_registrations,
    ),
    components(
        schemas(
            domain::health::dto::HealthStatus,
            domain::health::dto::HealthState,
            domain::health::dto::DatabaseCheck,
            domain::activity::entity::activity::ActivityCategory,
            domain::activity::entity::activity::ActivityStatus,
            domain::activity::entity::activity_registration::RegistrationStatus,
            domain::activity::dto::CreateActivityRequest,
            domain::activity::dto::UpdateActivityRequest,
            domain::activity::dto::ActivityResponse,
            domain::activity::dto::ActivityListResponse,
            domain::activity::dto::BatchDeleteRequest,
            domain::activity::dto::BatchDeleteResponse,
            domain::activity::dto::DeleteActivityResponse,
            domain::activity::dto::RegisterActivityRequest,
            domain::activity::dto::RegistrationResponse,
            domain::activity::dto::RegistrationListResponse,
            domain::activity::dto::SuccessActivityResponse,
            domain::activity::dto::SuccessActivityListResponse,
            domain::activity::dto::SuccessDeleteActivityResponse,
            domain::activity::dto::SuccessBatchDeleteResponse,
            domain::activity::dto::SuccessRegistrationResponse,
            domain::activity::dto::SuccessRegistrationListResponse,
            domain::activity::dto::SuccessMyRegistrationsResponse,
            utils::response::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "헬스체크 API"),
        (name = "Activity", description = "활동 관리 API"),
        (name = "Registration", description = "활동 신청 API")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// 설정의 허용 Origin으로 CORS 레이어 구성 (쿠키 인증을 위해 credentials 허용)
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn app(state: AppState) -> Router {
    // my-registrations, batch-delete는 /:id 보다 먼저 매칭되는 정적 경로
    let activity_routes = Router::new()
        .route(
            "/",
            get(activity::list_activities).post(activity::create_activity),
        )
        .route("/my-registrations", get(activity::my_registrations))
        .route("/batch-delete", post(activity::batch_delete_activities))
        .route(
            "/registrations/:registration_id",
            delete(activity::cancel_registration),
        )
        .route(
            "/registrations/:registration_id/attendance",
            post(activity::mark_attendance),
        )
        .route(
            "/:activity_id",
            get(activity::get_activity)
                .patch(activity::update_activity)
                .delete(activity::delete_activity),
        )
        .route("/:activity_id/register", post(activity::register_activity))
        .route(
            "/:activity_id/registrations",
            get(activity::list_registrations),
        )
        .route(
            "/:activity_id/registrations/export",
            get(activity::export_registrations),
        );

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(domain::health::health_check))
        .nest("/api/activities", activity_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
