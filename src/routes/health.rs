use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;

use crate::db::{self, DbPool};
use crate::services::UsageLimitService;

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    database: &'static str,
    free_plan: &'static str,
}

/// Liveness check - is the process running?
/// Returns 200 if the server is alive.
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { status: "ok" })
}

/// Readiness check - can free-tier companies be served?
/// Returns 200 when the database answers and the free plan resolves, 503 otherwise.
pub async fn readiness(
    pool: web::Data<DbPool>,
    service: web::Data<UsageLimitService>,
) -> HttpResponse {
    let db_healthy = db::health_check(pool.get_ref()).await;

    let free_plan_ok = db_healthy && service.gate().resolver().free_plan().await.is_ok();

    let http_status = if db_healthy && free_plan_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = ReadinessResponse {
        status: if http_status == StatusCode::OK {
            "ready"
        } else {
            "not_ready"
        },
        checks: ReadinessChecks {
            database: if db_healthy { "ok" } else { "error" },
            free_plan: if free_plan_ok { "ok" } else { "missing" },
        },
    };

    HttpResponse::build(http_status).json(response)
}

/// Configure health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
