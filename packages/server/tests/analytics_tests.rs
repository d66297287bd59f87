//! Integration tests for the analytics endpoints and reference-data
//! lookups. Each test runs against its own database, so exact counts are
//! safe to assert.

mod common;

use crate::common::{
    create_citizen, create_moderator, create_test_issue, set_issue_status, IssueFixture,
    TestHarness,
};
use chrono::Utc;
use serde_json::json;
use server_core::domains::geography::models::{Constituency, County, Ward};
use server_core::domains::issues::models::{IssueCategory, IssueSeverity, IssueStatus};
use test_context::test_context;

// =============================================================================
// Dashboard
// =============================================================================

/// An empty store degrades to zeros, not errors; in particular the
/// resolution rate must not divide by zero.
#[test_context(TestHarness)]
#[tokio::test]
async fn dashboard_on_empty_store_is_all_zeros(ctx: &TestHarness) {
    let client = ctx.client();
    let (status, body) = client.get("/api/analytics/dashboard", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["total_issues"], 0);
    assert_eq!(body["resolution_rate"], 0.0);
    assert_eq!(body["category_breakdown"], json!({}));
    assert_eq!(body["monthly_trends"].as_array().unwrap().len(), 6);
    assert_eq!(body["recent_activity"], json!([]));
}

/// Two issues across two counties and categories, one resolved.
#[test_context(TestHarness)]
#[tokio::test]
async fn dashboard_aggregates_the_two_issue_scenario(ctx: &TestHarness) {
    let user = create_citizen(&ctx.db_pool, "reporter").await.unwrap();
    create_test_issue(
        &ctx.db_pool,
        &user,
        IssueFixture {
            title: "Dry taps".to_string(),
            category: IssueCategory::Water,
            county: "Kiambu".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let resolved = create_test_issue(
        &ctx.db_pool,
        &user,
        IssueFixture {
            title: "Potholes on Thika Road".to_string(),
            category: IssueCategory::Roads,
            county: "Nairobi".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    set_issue_status(&ctx.db_pool, &resolved, IssueStatus::Resolved)
        .await
        .unwrap();

    let client = ctx.client();
    let (status, body) = client.get("/api/analytics/dashboard", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["total_issues"], 2);
    assert_eq!(body["open_issues"], 1);
    assert_eq!(body["resolved_issues"], 1);
    assert_eq!(body["resolution_rate"], 50.0);
    assert_eq!(body["category_breakdown"], json!({ "roads": 1, "water": 1 }));
    assert_eq!(body["county_breakdown"], json!({ "Kiambu": 1, "Nairobi": 1 }));
    assert_eq!(body["severity_breakdown"], json!({ "medium": 2 }));

    // Both issues were created this month
    let trends = body["monthly_trends"].as_array().unwrap();
    assert_eq!(trends.len(), 6);
    let current = &trends[5];
    assert_eq!(current["month"], Utc::now().format("%B %Y").to_string());
    assert_eq!(current["issues"], 2);
    assert_eq!(current["resolved"], 1);

    // Most recently updated first
    let activity = body["recent_activity"].as_array().unwrap();
    assert_eq!(activity.len(), 2);
    assert_eq!(activity[0]["title"], "Potholes on Thika Road");
}

/// Rates are rounded to two decimals.
#[test_context(TestHarness)]
#[tokio::test]
async fn resolution_rate_is_rounded(ctx: &TestHarness) {
    let user = create_citizen(&ctx.db_pool, "reporter").await.unwrap();
    for i in 0..3 {
        let issue = create_test_issue(
            &ctx.db_pool,
            &user,
            IssueFixture {
                title: format!("Issue {}", i),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        if i == 0 {
            set_issue_status(&ctx.db_pool, &issue, IssueStatus::Resolved)
                .await
                .unwrap();
        }
    }

    let client = ctx.client();
    let (_, body) = client.get("/api/analytics/dashboard", None).await;
    assert_eq!(body["resolution_rate"], 33.33);
}

// =============================================================================
// County and category breakdowns
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn county_breakdown_orders_and_filters(ctx: &TestHarness) {
    let user = create_citizen(&ctx.db_pool, "reporter").await.unwrap();
    for i in 0..2 {
        create_test_issue(
            &ctx.db_pool,
            &user,
            IssueFixture {
                title: format!("Nairobi issue {}", i),
                county: "Nairobi".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }
    let kiambu = create_test_issue(
        &ctx.db_pool,
        &user,
        IssueFixture {
            county: "Kiambu".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    set_issue_status(&ctx.db_pool, &kiambu, IssueStatus::Resolved)
        .await
        .unwrap();

    let client = ctx.client();
    let (status, body) = client.get("/api/analytics/counties", None).await;
    assert_eq!(status, 200);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Busiest county first
    assert_eq!(rows[0]["county"], "Nairobi");
    assert_eq!(rows[0]["total"], 2);
    assert_eq!(rows[0]["open"], 2);
    assert_eq!(rows[1]["county"], "Kiambu");
    assert_eq!(rows[1]["resolved"], 1);

    // Case-insensitive substring pre-filter
    let (_, filtered) = client.get("/api/analytics/counties?county=kiam", None).await;
    let rows = filtered.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["county"], "Kiambu");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn category_breakdown_counts_severity_hotspots(ctx: &TestHarness) {
    let user = create_citizen(&ctx.db_pool, "reporter").await.unwrap();
    create_test_issue(
        &ctx.db_pool,
        &user,
        IssueFixture {
            category: IssueCategory::Health,
            severity: IssueSeverity::Critical,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    create_test_issue(
        &ctx.db_pool,
        &user,
        IssueFixture {
            category: IssueCategory::Health,
            severity: IssueSeverity::High,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    create_test_issue(
        &ctx.db_pool,
        &user,
        IssueFixture {
            category: IssueCategory::Water,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let client = ctx.client();
    let (_, body) = client
        .get("/api/analytics/categories?category=health", None)
        .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category"], "health");
    assert_eq!(rows[0]["total"], 2);
    assert_eq!(rows[0]["critical"], 1);
    assert_eq!(rows[0]["high"], 1);

    let (status, _) = client
        .get("/api/analytics/categories?category=nonsense", None)
        .await;
    assert_eq!(status, 400);
}

// =============================================================================
// Daily trends
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn trends_cover_the_requested_window(ctx: &TestHarness) {
    let user = create_citizen(&ctx.db_pool, "reporter").await.unwrap();
    let issue = create_test_issue(&ctx.db_pool, &user, IssueFixture::default())
        .await
        .unwrap();
    set_issue_status(&ctx.db_pool, &issue, IssueStatus::Resolved)
        .await
        .unwrap();

    let client = ctx.client();
    let (status, body) = client.get("/api/analytics/trends?days=7", None).await;
    assert_eq!(status, 200);
    let days = body.as_array().unwrap();
    // Inclusive window: today plus the 7 days before it, oldest first
    assert_eq!(days.len(), 8);
    let today = days.last().unwrap();
    assert_eq!(today["date"], Utc::now().date_naive().to_string());
    assert_eq!(today["issues"], 1);
    assert_eq!(today["resolved"], 1);
    assert_eq!(days[0]["issues"], 0);
}

// =============================================================================
// Snapshots
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn snapshot_rollup_is_gated_and_upserts(ctx: &TestHarness) {
    let user = create_citizen(&ctx.db_pool, "reporter").await.unwrap();
    let moderator = create_moderator(&ctx.db_pool, "mod").await.unwrap();
    create_test_issue(&ctx.db_pool, &user, IssueFixture::default())
        .await
        .unwrap();

    let client = ctx.client();
    let (status, _) = client
        .post(
            "/api/analytics/snapshots",
            Some(&ctx.token_for(&user)),
            json!({}),
        )
        .await;
    assert_eq!(status, 403);

    let token = ctx.token_for(&moderator);
    let (status, body) = client
        .post("/api/analytics/snapshots", Some(&token), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["total_issues"], 1);
    assert_eq!(body["new_issues_today"], 1);

    // Recomputing the same day replaces, not appends
    create_test_issue(&ctx.db_pool, &user, IssueFixture::default())
        .await
        .unwrap();
    let (_, body) = client
        .post("/api/analytics/snapshots", Some(&token), json!({}))
        .await;
    assert_eq!(body["total_issues"], 2);

    let (status, list) = client.get("/api/analytics/snapshots", None).await;
    assert_eq!(status, 200);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

// =============================================================================
// Reference data
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn geography_lookups_follow_the_hierarchy(ctx: &TestHarness) {
    let kiambu = County::create("Kiambu", "022", &ctx.db_pool).await.unwrap();
    let nairobi = County::create("Nairobi", "047", &ctx.db_pool)
        .await
        .unwrap();
    let ruiru = Constituency::create("Ruiru", kiambu.id, &ctx.db_pool)
        .await
        .unwrap();
    Constituency::create("Westlands", nairobi.id, &ctx.db_pool)
        .await
        .unwrap();
    Ward::create("Biashara", ruiru.id, &ctx.db_pool).await.unwrap();
    Ward::create("Gitothua", ruiru.id, &ctx.db_pool)
        .await
        .unwrap();

    let client = ctx.client();
    let (status, counties) = client.get("/api/counties", None).await;
    assert_eq!(status, 200);
    let names: Vec<&str> = counties
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Kiambu", "Nairobi"]);

    let (_, constituencies) = client.get("/api/constituencies?county=Kiambu", None).await;
    let rows = constituencies.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Ruiru");

    let (_, wards) = client.get("/api/wards?constituency=Ruiru", None).await;
    assert_eq!(wards.as_array().unwrap().len(), 2);
}

/// Names are unique within their parent scope, but reusable across parents.
#[test_context(TestHarness)]
#[tokio::test]
async fn geography_names_are_scoped_to_parents(ctx: &TestHarness) {
    let kiambu = County::create("Kiambu", "022", &ctx.db_pool).await.unwrap();
    let nairobi = County::create("Nairobi", "047", &ctx.db_pool)
        .await
        .unwrap();

    Constituency::create("Township", kiambu.id, &ctx.db_pool)
        .await
        .unwrap();
    // Same constituency name under a different county is fine
    Constituency::create("Township", nairobi.id, &ctx.db_pool)
        .await
        .unwrap();
    // Duplicate within the same county is not
    assert!(Constituency::create("Township", kiambu.id, &ctx.db_pool)
        .await
        .is_err());

    assert!(County::create("Kiambu", "099", &ctx.db_pool).await.is_err());
}
