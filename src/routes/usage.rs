use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::UsageType;
use crate::pagination::{ListCountersQuery, OffsetPaginatedResponse};
use crate::services::{UsageCounterStore, UsageLimitService};

/// GET /api/companies/{company_id}/usage - Limits and usage for every usage type
pub async fn get_usage_summary(
    pool: web::Data<DbPool>,
    service: web::Data<UsageLimitService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let company_id = path.into_inner();
    let summary = service.usage_summary(pool.get_ref(), company_id).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// GET /api/companies/{company_id}/usage/{usage_type} - Pre-check one usage type
pub async fn get_usage(
    pool: web::Data<DbPool>,
    service: web::Data<UsageLimitService>,
    path: web::Path<(Uuid, UsageType)>,
) -> AppResult<HttpResponse> {
    let (company_id, usage_type) = path.into_inner();
    let check = service
        .check_limit(pool.get_ref(), company_id, usage_type)
        .await?;

    Ok(HttpResponse::Ok().json(check))
}

/// GET /api/companies/{company_id}/counters - Counter history with pagination
pub async fn list_counters(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<ListCountersQuery>,
) -> AppResult<HttpResponse> {
    let company_id = path.into_inner();
    let (page, per_page) = query.bounds();

    let (counters, total_count) = UsageCounterStore::list_for_company(
        pool.get_ref(),
        company_id,
        query.include_archived,
        query.order,
        page,
        per_page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(OffsetPaginatedResponse::new(
        counters,
        total_count,
        page,
        per_page,
    )))
}

/// Configure usage routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/companies/{company_id}")
            .route("/usage", web::get().to(get_usage_summary))
            .route("/usage/{usage_type}", web::get().to(get_usage))
            .route("/counters", web::get().to(list_counters)),
    );
}
