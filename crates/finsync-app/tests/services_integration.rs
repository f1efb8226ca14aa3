use chrono::NaiveDate;
use rust_decimal::Decimal;

use finsync::application::dtos::{DashboardPeriod, DateRange, ExportFormat, TransactionFilters};
use finsync::QueryError;
use finsync_domain::category::{Category, CategoryKind};
use finsync_domain::goal::{ContributionDraft, GoalStatus};
use finsync_domain::shared::{CategoryId, DomainError, GoalId, TransactionId};

mod test_helpers;

use test_helpers::{build_client, list_json, transaction_json, CannedResponse, StubServer};

fn goal_json(status: &str) -> String {
    format!(
        r#"{{"success":true,"data":{{"id":9,"name":"Trip","target_amount":"1000","current_amount":"250","status":"{}","contributions":[]}}}}"#,
        status
    )
}

fn category(id: i64) -> Category {
    Category {
        id: CategoryId::from(id),
        name: "Food".to_string(),
        color: None,
        icon: None,
        kind: CategoryKind::Expense,
        is_default: false,
        is_active: true,
    }
}

fn contribution() -> ContributionDraft {
    ContributionDraft {
        amount: Decimal::from(50),
        date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        note: None,
    }
}

// ============================================================
// Transactions
// ============================================================

#[tokio::test]
async fn infinite_pages_walk_forward_until_exhausted() {
    let server = StubServer::start().await;
    server
        .route(
            "GET",
            "/transactions",
            CannedResponse::json(
                200,
                &list_json(&[transaction_json(1, "income", "5", "2025-03-01", None)], 1, 2),
            ),
        )
        .route(
            "GET",
            "/transactions",
            CannedResponse::json(
                200,
                &list_json(&[transaction_json(2, "expense", "3", "2025-03-02", None)], 2, 2),
            ),
        );
    let harness = build_client(&server);
    let api = &harness.finance.services.transactions;
    let filters = TransactionFilters::default();

    let first = api.pages(&filters).await.unwrap();
    assert_eq!(first.data.pages().len(), 1);
    assert!(first.data.has_next_page());

    let both = api.next_page(&filters).await.unwrap();
    let ids: Vec<&str> = both.data.items().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(!both.data.has_next_page());

    // End of sequence: no further request
    let again = api.next_page(&filters).await.unwrap();
    assert_eq!(again.data.pages().len(), 2);
    assert_eq!(server.count("GET", "/transactions"), 2);

    let targets: Vec<String> = server.requests().into_iter().map(|r| r.target).collect();
    assert!(targets[0].contains("page=1"));
    assert!(targets[1].contains("page=2"));
}

#[tokio::test]
async fn failed_delete_leaves_cache_fresh() {
    let server = StubServer::start().await;
    server
        .route("GET", "/transactions/7", CannedResponse::json(
            200,
            &format!(r#"{{"success":true,"data":{}}}"#, transaction_json(7, "expense", "9", "2025-03-01", None)),
        ))
        .route(
            "DELETE",
            "/transactions/7",
            CannedResponse::json(422, r#"{"errors":["Transaction is locked"]}"#),
        );
    let harness = build_client(&server);
    let api = &harness.finance.services.transactions;
    let id = TransactionId::from(7);

    api.get(&id).await.unwrap();
    assert!(api.delete(&id).await.is_err());

    let cached = api.get(&id).await.unwrap();
    assert!(!cached.is_stale);
    assert_eq!(server.count("GET", "/transactions/7"), 1);
}

// ============================================================
// Categories
// ============================================================

#[tokio::test]
async fn category_in_use_is_never_deleted() {
    let server = StubServer::start().await;
    server.route(
        "GET",
        "/categories/5/usage",
        CannedResponse::json(200, r#"{"success":true,"data":{"transactions_count":3,"total_amount":"42.00"}}"#),
    );
    let harness = build_client(&server);

    let err = harness
        .finance
        .services
        .categories
        .delete(&category(5))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Domain(DomainError::CategoryInUse(_))));
    assert_eq!(server.count("DELETE", "/categories/5"), 0);
}

#[tokio::test]
async fn unused_category_delete_rechecks_usage() {
    let server = StubServer::start().await;
    server
        .route(
            "GET",
            "/categories/5/usage",
            CannedResponse::json(200, r#"{"success":true,"data":{"transactions_count":0}}"#),
        )
        .route("DELETE", "/categories/5", CannedResponse::json(200, r#"{"success":true}"#));
    let harness = build_client(&server);
    let categories = &harness.finance.services.categories;

    // A cached usage read does not satisfy the pre-delete check
    categories.usage(&CategoryId::from(5)).await.unwrap();
    categories.delete(&category(5)).await.unwrap();

    assert_eq!(server.count("GET", "/categories/5/usage"), 2);
    assert_eq!(server.count("DELETE", "/categories/5"), 1);
}

// ============================================================
// Goals
// ============================================================

#[tokio::test]
async fn paused_goal_refuses_contributions() {
    let server = StubServer::start().await;
    server.route("GET", "/goals/9", CannedResponse::json(200, &goal_json("paused")));
    let harness = build_client(&server);

    let err = harness
        .finance
        .services
        .goals
        .add_contribution(&GoalId::from(9), &contribution())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Domain(DomainError::GoalNotActive(_))));
    assert_eq!(server.count("POST", "/goals/9/contributions"), 0);
}

#[tokio::test]
async fn contribution_invalidates_goal() {
    let server = StubServer::start().await;
    server
        .route("GET", "/goals/9", CannedResponse::json(200, &goal_json("active")))
        .route(
            "POST",
            "/goals/9/contributions",
            CannedResponse::json(201, r#"{"success":true,"data":{"id":1,"amount":"50","date":"2025-03-02"}}"#),
        );
    let harness = build_client(&server);
    let goals = &harness.finance.services.goals;
    let id = GoalId::from(9);

    let recorded = goals.add_contribution(&id, &contribution()).await.unwrap();
    assert_eq!(recorded.amount, Decimal::from(50));

    let body = &server
        .requests()
        .into_iter()
        .find(|r| r.method == "POST")
        .unwrap()
        .body;
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["date"], "2025-03-02");

    assert!(goals.get(&id).await.unwrap().is_stale);
    server.wait_for("GET", "/goals/9", 2).await;
}

#[tokio::test]
async fn completed_goal_cannot_be_reactivated() {
    let server = StubServer::start().await;
    server.route("GET", "/goals/9", CannedResponse::json(200, &goal_json("completed")));
    let harness = build_client(&server);

    let err = harness
        .finance
        .services
        .goals
        .set_status(&GoalId::from(9), GoalStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Domain(DomainError::Validation(_))));
    assert_eq!(server.count("PUT", "/goals/9"), 0);
}

// ============================================================
// Dashboard + analytics
// ============================================================

#[tokio::test]
async fn dashboard_summary_and_charts() {
    let server = StubServer::start().await;
    server
        .route(
            "GET",
            "/dashboard",
            CannedResponse::json(200, r#"{"success":true,"data":{"total_balance":"900","total_income":"1000","total_expenses":"100"}}"#),
        )
        .route(
            "GET",
            "/transactions",
            CannedResponse::json(
                200,
                &list_json(
                    &[
                        transaction_json(1, "income", "100", "2025-03-15", None),
                        transaction_json(2, "expense", "40", "2025-03-15", Some("Food")),
                    ],
                    1,
                    1,
                ),
            ),
        );
    let harness = build_client(&server);
    let dashboard = &harness.finance.services.dashboard;

    let summary = dashboard.summary(DashboardPeriod::Month).await.unwrap();
    assert_eq!(summary.data.net_income(), Decimal::from(900));
    assert!(server.requests()[0].target.contains("period=month"));

    let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
    let charts = dashboard.charts_on(&DateRange::default(), today).await.unwrap();
    let last = charts.daily.last().unwrap();
    assert_eq!(charts.daily.len(), 30);
    assert_eq!(last.income, Decimal::from(100));
    assert_eq!(last.expense, Decimal::from(40));
    assert_eq!(last.balance, Decimal::from(60));
    assert_eq!(charts.categories[0].name, "Food");
}

#[tokio::test]
async fn analytics_reports_and_export() {
    let server = StubServer::start().await;
    server
        .route(
            "GET",
            "/analytics/income_vs_expenses",
            CannedResponse::json(200, r#"{"success":true,"data":{"income":"300","expenses":"120"}}"#),
        )
        .route(
            "GET",
            "/analytics/export",
            CannedResponse::file("text/csv", None, b"date,amount\n"),
        );
    let harness = build_client(&server);
    let analytics = &harness.finance.services.analytics;
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
    );

    let totals = analytics.income_vs_expenses(&range).await.unwrap();
    assert_eq!(totals.data.net(), Decimal::from(180));
    analytics.income_vs_expenses(&range).await.unwrap();
    assert_eq!(server.count("GET", "/analytics/income_vs_expenses"), 1);

    let file = analytics.export(&range, ExportFormat::Csv).await.unwrap();
    assert_eq!(file.bytes, b"date,amount\n");
    assert_eq!(file.filename.as_deref(), Some("finsync-report.csv"));
    let export = server
        .requests()
        .into_iter()
        .find(|r| r.path() == "/api/v1/analytics/export")
        .unwrap();
    assert!(export.target.contains("format=csv"));
    assert!(export.target.contains("start_date=2025-01-01"));
}
