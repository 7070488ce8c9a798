/// Integration tests for the xFinance API
///
/// Tests without a database go through `lazy_app`: authentication, the
/// ledger engine and response headers. Tests marked `#[ignore]` need
/// `DATABASE_URL`; run them with `cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use uuid::Uuid;

fn journal_rows() -> serde_json::Value {
    json!([
        ["Date", "Debit", "Credit", "Currency", "Amount", "Description"],
        [45291, "1101", "3101", "MNT", 500, "Opening capital"],
        [45293, "6101", "1101", "MNT", 200, "Rent"],
        [45292, "1101", "5101", "MNT", 1000, "Sales"],
        [45295, "1102", "1101", "USD", 50, "To USD account"],
        ["", "", "", "", "", ""],
        [45330, "1101", "5101", "MNT", 999, "Next month"]
    ])
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let mut app = lazy_app();

    let (status, body) = send(&mut app, json_request("GET", "/api/companies", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_non_bearer_header_is_bad_request() {
    let mut app = lazy_app();

    let request = axum::http::Request::builder()
        .uri("/api/companies")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = send(&mut app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let mut app = lazy_app();
    let token = refresh_token(Uuid::new_v4(), "saraa");

    let (status, _) = send(&mut app, json_request("GET", "/api/auth/me", Some(&token), None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let mut app = lazy_app();
    let claims = xfinance_shared::auth::jwt::Claims::new(
        Uuid::new_v4(),
        "saraa".to_string(),
        xfinance_shared::auth::jwt::TokenType::Access,
    );
    let forged =
        xfinance_shared::auth::jwt::create_token(&claims, "another-secret-that-is-32-bytes-long").unwrap();

    let (status, _) = send(&mut app, json_request("POST", "/api/ledger", Some(&forged), Some(json!({})))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_endpoint_rejects_access_token() {
    let mut app = lazy_app();
    let access = access_token(Uuid::new_v4(), "saraa");

    let (status, _) = send(
        &mut app,
        json_request("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": access }))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_validates_before_touching_database() {
    let mut app = lazy_app();

    let (status, body) = send(
        &mut app,
        json_request("POST", "/api/auth/login", None, Some(json!({ "username": "", "password": "x" }))),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "username");
}

#[tokio::test]
async fn test_ledger_reconstruction() {
    let mut app = lazy_app();
    let token = access_token(Uuid::new_v4(), "saraa");

    let (status, body) = send(
        &mut app,
        json_request(
            "POST",
            "/api/ledger",
            Some(&token),
            Some(json!({
                "account_code": "1101",
                "date_from": "2024-01-01",
                "date_to": "2024-01-31",
                "rows": journal_rows(),
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["opening_balance"], 500.0);
    assert_eq!(body["total_debit"], 1000.0);
    assert_eq!(body["total_credit"], 250.0);
    assert_eq!(body["closing_balance"], 1250.0);
    assert_eq!(body["skipped_rows"], 2);

    // Sorted by date, not sheet order
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["description"], "Sales");
    assert_eq!(entries[0]["balance"], 1500.0);
    assert_eq!(entries[1]["counter_account"], "6101");
    assert_eq!(entries[1]["balance"], 1300.0);
    assert_eq!(entries[2]["currency"], "USD");
    assert_eq!(entries[2]["balance"], 1250.0);
}

#[tokio::test]
async fn test_ledger_currency_filter() {
    let mut app = lazy_app();
    let token = access_token(Uuid::new_v4(), "saraa");

    let (status, body) = send(
        &mut app,
        json_request(
            "POST",
            "/api/ledger",
            Some(&token),
            Some(json!({
                "account_code": "1101",
                "date_from": "2024-01-01",
                "date_to": "2024-01-31",
                "currency": "usd",
                "rows": journal_rows(),
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["opening_balance"], 0.0);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["closing_balance"], -50.0);
}

#[tokio::test]
async fn test_ledger_custom_layout() {
    let mut app = lazy_app();
    let token = access_token(Uuid::new_v4(), "saraa");

    // Amount first, then date, credit, debit
    let (status, body) = send(
        &mut app,
        json_request(
            "POST",
            "/api/ledger",
            Some(&token),
            Some(json!({
                "account_code": "1101",
                "date_from": "2024-01-01",
                "date_to": "2024-01-31",
                "layout": { "amount": 0, "date": 1, "credit": 2, "debit": 3, "currency": 4 },
                "rows": [[750, "2024-01-10", "3101", "1101", "MNT"]],
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["closing_balance"], 750.0);
}

#[tokio::test]
async fn test_ledger_rejects_inverted_range() {
    let mut app = lazy_app();
    let token = access_token(Uuid::new_v4(), "saraa");

    let (status, body) = send(
        &mut app,
        json_request(
            "POST",
            "/api/ledger",
            Some(&token),
            Some(json!({
                "account_code": "1101",
                "date_from": "2024-02-01",
                "date_to": "2024-01-01",
                "rows": [],
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_ledger_rejects_blank_account() {
    let mut app = lazy_app();
    let token = access_token(Uuid::new_v4(), "saraa");

    let (status, _) = send(
        &mut app,
        json_request(
            "POST",
            "/api/ledger",
            Some(&token),
            Some(json!({
                "account_code": "  ",
                "date_from": "2024-01-01",
                "date_to": "2024-01-31",
                "rows": journal_rows(),
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trial_balance() {
    let mut app = lazy_app();
    let token = access_token(Uuid::new_v4(), "saraa");

    let (status, body) = send(
        &mut app,
        json_request(
            "POST",
            "/api/ledger/trial-balance",
            Some(&token),
            Some(json!({
                "date_from": "2024-01-01",
                "date_to": "2024-01-31",
                "rows": journal_rows(),
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);

    let lines = body["lines"].as_array().unwrap();
    let codes: Vec<&str> = lines.iter().map(|l| l["account_code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["1101", "1102", "3101", "5101", "6101"]);

    assert_eq!(lines[0]["opening_balance"], 500.0);
    assert_eq!(lines[0]["closing_balance"], 1250.0);
    assert_eq!(lines[2]["opening_balance"], -500.0);
    assert_eq!(body["total_debit_turnover"], body["total_credit_turnover"]);
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let mut app = lazy_app();

    let response = tower::Service::call(&mut app, json_request("GET", "/api/companies", None, None))
        .await
        .unwrap();
    let headers = response.headers();

    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let mut app = lazy_app();

    let (status, body) = send(&mut app, json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

// Database-backed flows

#[tokio::test]
#[ignore]
async fn test_login_flow() {
    let mut ctx = TestContext::new().await.unwrap();

    let (status, body) = send(
        &mut ctx.app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": ctx.admin.username, "password": TEST_PASSWORD })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["access_token"].is_string());
    assert!(body["user"].get("password_hash").is_none());

    let actions: Vec<i64> = body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_i64().unwrap())
        .collect();
    assert!(actions.contains(&100));
    assert!(actions.contains(&400));

    let (status, _) = send(
        &mut ctx.app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": ctx.admin.username, "password": "wrong-password-1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_company_and_account_lifecycle() {
    let mut ctx = TestContext::new().await.unwrap();
    let token = ctx.token.clone();

    let name = format!("Tenger {}", Uuid::new_v4());
    let (status, company) = send(
        &mut ctx.app,
        json_request("POST", "/api/companies", Some(&token), Some(json!({ "name": name }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", company);
    let company_id = company["id"].as_str().unwrap().to_string();

    let accounts_uri = format!("/api/companies/{}/accounts", company_id);
    let account = json!({ "account_number": "1101", "name": "Cash", "account_type": "asset" });

    let (status, created) = send(
        &mut ctx.app,
        json_request("POST", &accounts_uri, Some(&token), Some(account.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["currency"], "MNT");

    let (status, body) = send(
        &mut ctx.app,
        json_request("POST", &accounts_uri, Some(&token), Some(account)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Account number already exists for this company");

    let (status, body) = send(
        &mut ctx.app,
        json_request(
            "PUT",
            &format!("{}/import", accounts_uri),
            Some(&token),
            Some(json!({ "accounts": [
                { "account_number": "1101", "name": "Cash on hand", "account_type": "asset" },
                { "account_number": "3101", "name": "Capital", "account_type": "equity" }
            ]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["imported"], 2);

    let (status, list) = send(&mut ctx.app, json_request("GET", &accounts_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[0]["name"], "Cash on hand");

    let (status, prepared) = send(
        &mut ctx.app,
        json_request(
            "POST",
            "/api/journal/prepare",
            Some(&token),
            Some(json!({
                "company_id": company_id,
                "entry": {
                    "date": "2024-03-15",
                    "debit_account": "1101",
                    "credit_account": "3101",
                    "currency": "USD",
                    "amount": 10
                },
                "rates": [["2024-03-01", "USD", 3400]]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", prepared);
    assert_eq!(prepared["base_amount"], 34000.0);
    assert_eq!(prepared["debit_account_name"], "Cash on hand");

    let (status, _) = send(
        &mut ctx.app,
        json_request("DELETE", &format!("/api/companies/{}", company_id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_user_without_action_cannot_edit_accounts() {
    let mut ctx = TestContext::new().await.unwrap();
    let (user, user_token) = ctx.plain_user().await.unwrap();
    let admin_token = ctx.token.clone();

    let (_, company) = send(
        &mut ctx.app,
        json_request(
            "POST",
            "/api/companies",
            Some(&admin_token),
            Some(json!({ "name": format!("Khan {}", Uuid::new_v4()) })),
        ),
    )
    .await;
    let company_id = company["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &mut ctx.app,
        json_request(
            "POST",
            &format!("/api/companies/{}/accounts", company_id),
            Some(&user_token),
            Some(json!({ "account_number": "1101", "name": "Cash", "account_type": "asset" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // Reading is open to everyone
    let (status, _) = send(
        &mut ctx.app,
        json_request("GET", &format!("/api/companies/{}/accounts", company_id), Some(&user_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    send(
        &mut ctx.app,
        json_request("DELETE", &format!("/api/companies/{}", company_id), Some(&admin_token), None),
    )
    .await;
    xfinance_shared::models::user::User::delete(&ctx.db, user.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_daily_tasks_are_private() {
    let mut ctx = TestContext::new().await.unwrap();
    let (other, other_token) = ctx.plain_user().await.unwrap();
    let token = ctx.token.clone();

    let (status, task) = send(
        &mut ctx.app,
        json_request(
            "POST",
            "/api/daily-tasks",
            Some(&token),
            Some(json!({ "title": "Close March VAT", "task_date": "2024-03-31" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let toggle_uri = format!("/api/daily-tasks/{}/toggle", task["id"].as_str().unwrap());

    let (status, toggled) = send(&mut ctx.app, json_request("POST", &toggle_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_done"], true);

    let (status, _) = send(&mut ctx.app, json_request("POST", &toggle_uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    xfinance_shared::models::user::User::delete(&ctx.db, other.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_deactivated_user_cannot_refresh() {
    let mut ctx = TestContext::new().await.unwrap();
    let (user, user_token) = ctx.plain_user().await.unwrap();
    let user_refresh = refresh_token(user.id, &user.username);
    let admin_token = ctx.token.clone();

    let (status, body) = send(
        &mut ctx.app,
        json_request("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": user_refresh }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let access = body["access_token"].as_str().unwrap();
    let claims = xfinance_shared::auth::jwt::validate_access_token(access, TEST_SECRET).unwrap();
    assert_eq!(claims.sub, user.id);

    let (status, _) = send(
        &mut ctx.app,
        json_request(
            "PUT",
            &format!("/api/users/{}", user.id),
            Some(&admin_token),
            Some(json!({ "is_active": false })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &mut ctx.app,
        json_request("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": user_refresh }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&mut ctx.app, json_request("GET", "/api/auth/me", Some(&user_token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Deleted users are refused the same way
    xfinance_shared::models::user::User::delete(&ctx.db, user.id).await.unwrap();
    let (status, _) = send(
        &mut ctx.app,
        json_request("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": user_refresh }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_user_create_with_unknown_role_leaves_no_user() {
    let mut ctx = TestContext::new().await.unwrap();
    let token = ctx.token.clone();
    let username = format!("clerk_{}", &Uuid::new_v4().simple().to_string()[..8]);
    let user = json!({
        "username": username,
        "email": format!("{}@example.mn", username),
        "password": TEST_PASSWORD,
    });

    let mut with_bad_role = user.clone();
    with_bad_role["role_ids"] = json!([Uuid::new_v4()]);

    let (status, body) = send(
        &mut ctx.app,
        json_request("POST", "/api/users", Some(&token), Some(with_bad_role)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let left = xfinance_shared::models::user::User::find_by_username(&ctx.db, &username)
        .await
        .unwrap();
    assert!(left.is_none());

    // Retrying without the bad role is not a duplicate
    let (status, created) = send(&mut ctx.app, json_request("POST", "/api/users", Some(&token), Some(user))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);

    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    xfinance_shared::models::user::User::delete(&ctx.db, id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_permission_is_checked_before_validation() {
    let mut ctx = TestContext::new().await.unwrap();
    let (user, user_token) = ctx.plain_user().await.unwrap();

    let (status, body) = send(
        &mut ctx.app,
        json_request(
            "POST",
            "/api/users",
            Some(&user_token),
            Some(json!({ "username": "x", "email": "not-an-email", "password": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (status, _) = send(
        &mut ctx.app,
        json_request(
            "POST",
            &format!("/api/companies/{}/accounts", Uuid::new_v4()),
            Some(&user_token),
            Some(json!({ "account_number": "   ", "name": "", "account_type": "asset" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    xfinance_shared::models::user::User::delete(&ctx.db, user.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}
