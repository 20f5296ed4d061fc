//! API integration tests
//!
//! Run against a live server whose `auth.jwt_secret` matches `JWT_SECRET`
//! and whose `auth.admin_emails` contains `TEST_ADMIN_EMAIL`.

use chrono::{Duration, Utc};
use lending_server::models::user::UserClaims;
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

fn token_for(sub: &str, email: &str) -> String {
    UserClaims {
        sub: sub.to_string(),
        email: email.to_string(),
        name: Some(sub.to_string()),
        given_name: None,
        family_name: None,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        iat: Some(Utc::now().timestamp()),
    }
    .create_token(&secret())
    .expect("Failed to sign token")
}

fn admin_token() -> String {
    let email = std::env::var("TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.org".to_string());
    token_for("it_admin", &email)
}

fn user_token() -> String {
    token_for("it_user", "borrower@example.org")
}

/// Create equipment with a unique name, returning its JSON
async fn create_equipment(client: &Client, total: i32) -> Value {
    let name = format!("it-{}", uuid::Uuid::new_v4().simple());
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({ "name": name, "totalQuantity": total }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn create_request(client: &Client, equipment_name: &str, quantity: i32) -> Value {
    let pickup = Utc::now() + Duration::days(1);
    let response = client
        .post(format!("{}/requests", BASE_URL))
        .bearer_auth(user_token())
        .json(&json!({
            "equipmentType": equipment_name.to_lowercase(),
            "quantity": quantity,
            "purpose": "Integration test",
            "campus": "Main",
            "pickupDate": pickup,
            "returnDate": pickup + Duration::days(2)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn get_equipment(client: &Client, id: &str) -> Value {
    client
        .get(format!("{}/equipment/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

async fn delete_equipment(client: &Client, id: &str) {
    let response = client
        .delete(format!("{}/equipment/{}", BASE_URL, id))
        .bearer_auth(admin_token())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_missing_token_is_unauthorized() {
    let client = Client::new();

    let response = client
        .get(format!("{}/requests/active", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_non_admin_cannot_approve() {
    let client = Client::new();

    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, uuid::Uuid::new_v4()))
        .bearer_auth(user_token())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_unknown_equipment_type_rejected() {
    let client = Client::new();
    let pickup = Utc::now();

    let response = client
        .post(format!("{}/requests", BASE_URL))
        .bearer_auth(user_token())
        .json(&json!({
            "equipmentType": format!("missing-{}", uuid::Uuid::new_v4()),
            "quantity": 1,
            "purpose": "Integration test",
            "campus": "Main",
            "pickupDate": pickup,
            "returnDate": pickup
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_full_lending_cycle() {
    let client = Client::new();
    let equipment = create_equipment(&client, 10).await;
    let equipment_id = equipment["id"].as_str().expect("No equipment id").to_string();
    let name = equipment["name"].as_str().expect("No equipment name").to_string();
    assert_eq!(name, name.to_uppercase());
    assert_eq!(equipment["availableQuantity"], 10);

    let request = create_request(&client, &name, 4).await;
    let request_id = request["id"].as_str().expect("No request id").to_string();
    assert_eq!(request["status"], "PENDING");

    // Approve reserves stock
    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .bearer_auth(admin_token())
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["request"]["status"], "APPROVED");
    assert_eq!(body["equipment"]["availableQuantity"], 6);

    // Second approval is a state error
    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .bearer_auth(admin_token())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
    assert_eq!(get_equipment(&client, &equipment_id).await["availableQuantity"], 6);

    // Preview does not write
    let response = client
        .get(format!(
            "{}/requests/{}/return-preview?quantity=3",
            BASE_URL, request_id
        ))
        .bearer_auth(user_token())
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "PARTIALLY_RETURNED");
    assert_eq!(body["remainingQuantity"], 1);

    // Partial return
    let response = client
        .post(format!("{}/requests/return", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({ "equipment": [{ "id": request_id, "returned": 3 }] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["results"][0]["request"]["status"], "PARTIALLY_RETURNED");
    assert_eq!(body["results"][0]["equipment"]["availableQuantity"], 9);

    // Over-return changes nothing
    let response = client
        .post(format!("{}/requests/return", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({ "items": [{ "requestId": request_id, "returnedNow": 2 }] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
    assert_eq!(get_equipment(&client, &equipment_id).await["availableQuantity"], 9);

    // Final return
    let response = client
        .post(format!("{}/requests/return", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({ "items": [{ "requestId": request_id, "returnedNow": 1 }] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["results"][0]["request"]["status"], "RETURNED");
    assert_eq!(get_equipment(&client, &equipment_id).await["availableQuantity"], 10);

    delete_equipment(&client, &equipment_id).await;
}

#[tokio::test]
#[ignore]
async fn test_insufficient_inventory() {
    let client = Client::new();
    let equipment = create_equipment(&client, 2).await;
    let equipment_id = equipment["id"].as_str().expect("No equipment id").to_string();
    let name = equipment["name"].as_str().expect("No equipment name").to_string();

    let request = create_request(&client, &name, 3).await;
    let request_id = request["id"].as_str().expect("No request id");

    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .bearer_auth(admin_token())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InsufficientInventory");
    assert_eq!(get_equipment(&client, &equipment_id).await["availableQuantity"], 2);

    delete_equipment(&client, &equipment_id).await;
}

#[tokio::test]
#[ignore]
async fn test_total_below_on_loan_rejected() {
    let client = Client::new();
    let equipment = create_equipment(&client, 5).await;
    let equipment_id = equipment["id"].as_str().expect("No equipment id").to_string();
    let name = equipment["name"].as_str().expect("No equipment name").to_string();

    let request = create_request(&client, &name, 4).await;
    let request_id = request["id"].as_str().expect("No request id");
    client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .bearer_auth(admin_token())
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .put(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .bearer_auth(admin_token())
        .json(&json!({ "totalQuantity": 3 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .put(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .bearer_auth(admin_token())
        .json(&json!({ "totalQuantity": 8 }))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["totalQuantity"], 8);
    assert_eq!(body["availableQuantity"], 4);

    delete_equipment(&client, &equipment_id).await;
}
