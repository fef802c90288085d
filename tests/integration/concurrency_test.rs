//! Concurrency tests for quota reservation
//!
//! Verifies that the conditional increment and the row lock on the active
//! counter never let concurrent reservations overshoot a limit.

use std::sync::Arc;

use hireflow_quota::models::UsageType;
use hireflow_quota::services::UsageLimitService;
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{build_service, reserve, PlanBuilder, TestDb};

/// Fires `attempts` concurrent reservations and returns how many were allowed
async fn reserve_concurrently(
    service: Arc<UsageLimitService>,
    pool: Arc<PgPool>,
    company_id: Uuid,
    usage_type: UsageType,
    attempts: usize,
) -> usize {
    let mut handles = Vec::new();

    for _ in 0..attempts {
        let service_clone = Arc::clone(&service);
        let pool_clone = Arc::clone(&pool);

        let handle = tokio::spawn(async move {
            let mut tx = pool_clone.begin().await.expect("Failed to begin");
            let check = service_clone
                .check_limit_in_transaction(&mut tx, company_id, usage_type)
                .await
                .expect("Failed to check limit");
            tx.commit().await.expect("Failed to commit");
            check.allowed
        });

        handles.push(handle);
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.expect("Task panicked") {
            allowed += 1;
        }
    }
    allowed
}

async fn active_used(pool: &PgPool, company_id: Uuid, usage_type: UsageType) -> i32 {
    sqlx::query_scalar(
        "SELECT used FROM usage_counters WHERE company_id = $1 AND usage_type = $2 AND is_active",
    )
    .bind(company_id)
    .bind(usage_type)
    .fetch_one(pool)
    .await
    .expect("Failed to read active counter")
}

// =============================================================================
// Same Company
// =============================================================================

/// 20 simultaneous requests against a limit of 5: exactly 5 get through
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_exceed_limit() {
    let db = TestDb::with_max_connections(20).await;
    let free = PlanBuilder::new("Free")
        .with_comparison_limit(Some(5))
        .insert(&db.pool)
        .await;
    let service = Arc::new(build_service(&db.pool, Some(free.id)));
    let pool = Arc::new(db.pool.clone());
    let company_id = Uuid::new_v4();

    let allowed = reserve_concurrently(
        Arc::clone(&service),
        Arc::clone(&pool),
        company_id,
        UsageType::Comparison,
        20,
    )
    .await;

    assert_eq!(allowed, 5, "Expected exactly 5 reservations to succeed");
    assert_eq!(active_used(&db.pool, company_id, UsageType::Comparison).await, 5);

    let counters: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM usage_counters WHERE company_id = $1 AND is_active",
    )
    .bind(company_id)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(counters, 1, "Concurrent first use must create a single counter");
}

/// Existing usage counts against the remaining headroom
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_respect_prior_usage() {
    let db = TestDb::with_max_connections(20).await;
    let free = PlanBuilder::new("Free")
        .with_resume_upload_limit(Some(10))
        .insert(&db.pool)
        .await;
    let service = Arc::new(build_service(&db.pool, Some(free.id)));
    let pool = Arc::new(db.pool.clone());
    let company_id = Uuid::new_v4();

    for _ in 0..7 {
        reserve(&service, &db.pool, company_id, UsageType::ResumeUpload).await;
    }

    let allowed = reserve_concurrently(
        Arc::clone(&service),
        Arc::clone(&pool),
        company_id,
        UsageType::ResumeUpload,
        12,
    )
    .await;

    assert_eq!(allowed, 3);
    assert_eq!(
        active_used(&db.pool, company_id, UsageType::ResumeUpload).await,
        10
    );
}

/// Below the limit every concurrent request succeeds and none is lost
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_below_limit_are_all_counted() {
    let db = TestDb::with_max_connections(20).await;
    let free = PlanBuilder::new("Free")
        .with_comparison_limit(Some(100))
        .insert(&db.pool)
        .await;
    let service = Arc::new(build_service(&db.pool, Some(free.id)));
    let pool = Arc::new(db.pool.clone());
    let company_id = Uuid::new_v4();

    let allowed = reserve_concurrently(service, pool, company_id, UsageType::Comparison, 25).await;

    assert_eq!(allowed, 25);
    assert_eq!(active_used(&db.pool, company_id, UsageType::Comparison).await, 25);
}

// =============================================================================
// Different Companies
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_companies_have_independent_quotas() {
    let db = TestDb::with_max_connections(20).await;
    let free = PlanBuilder::new("Free")
        .with_comparison_limit(Some(3))
        .insert(&db.pool)
        .await;
    let service = Arc::new(build_service(&db.pool, Some(free.id)));
    let pool = Arc::new(db.pool.clone());
    let companies: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    let mut handles = Vec::new();
    for company_id in companies.clone() {
        let service_clone = Arc::clone(&service);
        let pool_clone = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            reserve_concurrently(
                service_clone,
                pool_clone,
                company_id,
                UsageType::Comparison,
                6,
            )
            .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.expect("Task panicked"), 3);
    }

    for company_id in companies {
        assert_eq!(active_used(&db.pool, company_id, UsageType::Comparison).await, 3);
    }
}

// =============================================================================
// Reservation vs. Archive
// =============================================================================

/// Archiving while reservations are in flight never loses or duplicates a unit
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_archive_during_reservations_keeps_totals_consistent() {
    let db = TestDb::with_max_connections(20).await;
    let free = PlanBuilder::new("Free")
        .with_comparison_limit(Some(1000))
        .insert(&db.pool)
        .await;
    let service = Arc::new(build_service(&db.pool, Some(free.id)));
    let pool = Arc::new(db.pool.clone());
    let company_id = Uuid::new_v4();

    reserve(&service, &db.pool, company_id, UsageType::Comparison).await;

    let reservations = tokio::spawn(reserve_concurrently(
        Arc::clone(&service),
        Arc::clone(&pool),
        company_id,
        UsageType::Comparison,
        15,
    ));
    let archive = {
        let service_clone = Arc::clone(&service);
        let pool_clone = Arc::clone(&pool);
        tokio::spawn(async move {
            service_clone
                .notify_subscription_changed(&pool_clone, company_id)
                .await
                .expect("Failed to archive")
        })
    };

    let allowed = reservations.await.expect("Task panicked");
    archive.await.expect("Task panicked");
    assert_eq!(allowed, 15);

    // Every committed unit lives in exactly one row, archived or active
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(used), 0)::BIGINT FROM usage_counters WHERE company_id = $1",
    )
    .bind(company_id)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(total, 16);

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM usage_counters WHERE company_id = $1 AND is_active",
    )
    .bind(company_id)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(active, 1);
}
