use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::SubscriptionEventRequest;
use crate::services::UsageLimitService;

/// POST /api/companies/{company_id}/subscription-events - Billing reports a plan change
pub async fn post_subscription_event(
    pool: web::Data<DbPool>,
    service: web::Data<UsageLimitService>,
    path: web::Path<Uuid>,
    body: web::Json<SubscriptionEventRequest>,
) -> AppResult<HttpResponse> {
    let company_id = path.into_inner();
    let event = body.into_inner().event;

    log::info!(
        "Subscription event {:?} received for company {}",
        event,
        company_id
    );

    let result = service
        .handle_subscription_event(pool.get_ref(), company_id, event)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Configure subscription event routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/companies/{company_id}/subscription-events",
        web::post().to(post_subscription_event),
    );
}
