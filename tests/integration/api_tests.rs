//! API integration tests
//!
//! Run against a live server backed by PostgreSQL and Redis:
//! `cargo test -- --ignored`

use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api";

/// Client that keeps the session cookie between calls
fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@uni.test", prefix, Uuid::new_v4().simple())
}

async fn register_admin(client: &Client, email: &str) {
    let request = json!({
        "fullName": "Test Librarian",
        "email": email,
        "password": "librarian-pass",
    });
    let form = multipart::Form::new().text("request", request.to_string());

    let response = client
        .post(format!("{}/admin/register", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

async fn register_student(client: &Client, email: &str) -> reqwest::Response {
    let request = json!({
        "fullName": "Test Student",
        "email": email,
        "universityId": "U-12345",
        "password": "student-pass",
    });
    let card = multipart::Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("card.png")
        .mime_str("image/png")
        .expect("Invalid mime type");
    let form = multipart::Form::new()
        .text("request", request.to_string())
        .part("idCardImage", card);

    client
        .post(format!("{}/user/register", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request")
}

async fn create_book(admin: &Client, copies: i32) -> String {
    let response = admin
        .post(format!("{}/books/createBook", BASE_URL))
        .json(&json!({
            "title": format!("Integration Book {}", Uuid::new_v4().simple()),
            "author": "Test Author",
            "genre": "Testing",
            "total_copies": copies,
            "color": "#336699",
            "description": "A book used by the integration tests",
            "cover": "https://example.test/cover.png",
            "summary": "Summary",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["bookId"].as_str().expect("No bookId").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = Client::new()
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
async fn test_protected_route_requires_session() {
    let response = Client::new()
        .get(format!("{}/user/profile", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_student_registration_and_login() {
    let client = session_client();
    let email = unique_email("student");

    let response = register_student(&client, &email).await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile: Value = client
        .get(format!("{}/user/profile", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(profile["email"], email.as_str());
    assert_eq!(profile["accountStatus"], "Verification Pending");

    // Same e-mail in a different case is a duplicate
    let duplicate = register_student(&session_client(), &email.to_uppercase()).await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let wrong = Client::new()
        .post(format!("{}/user/login", BASE_URL))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_second_login_revokes_first_session() {
    let first = session_client();
    let email = unique_email("single");
    assert_eq!(register_student(&first, &email).await.status(), StatusCode::OK);

    let second = session_client();
    let response = second
        .post(format!("{}/user/login", BASE_URL))
        .json(&json!({ "email": email, "password": "student-pass" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let stale = first
        .get(format!("{}/user/profile", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    let live = second
        .get(format!("{}/user/profile", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(live.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_student_cannot_use_admin_routes() {
    let student = session_client();
    assert_eq!(
        register_student(&student, &unique_email("nosy")).await.status(),
        StatusCode::OK
    );

    let response = student
        .get(format!("{}/user/allUsers", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_borrow_lifecycle() {
    let admin = session_client();
    register_admin(&admin, &unique_email("admin")).await;

    let student = session_client();
    let student_email = unique_email("borrower");
    assert_eq!(
        register_student(&student, &student_email).await.status(),
        StatusCode::OK
    );

    let book_id = create_book(&admin, 1).await;

    // Pending accounts cannot borrow
    let early = student
        .post(format!("{}/borrow-requests/create", BASE_URL))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(early.status(), StatusCode::FORBIDDEN);

    let approved = admin
        .put(format!("{}/user/approve/{}", BASE_URL, student_email))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(approved.status(), StatusCode::OK);

    let created = student
        .post(format!("{}/borrow-requests/create", BASE_URL))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), StatusCode::CREATED);
    let request: Value = created.json().await.expect("Failed to parse response");
    assert_eq!(request["status"], "Pending");
    let request_id = request["id"].as_str().expect("No request id").to_string();

    let duplicate = student
        .post(format!("{}/borrow-requests/create", BASE_URL))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let lent = admin
        .put(format!("{}/borrow-requests/approve-request/{}", BASE_URL, request_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(lent.status(), StatusCode::OK);
    let lent: Value = lent.json().await.expect("Failed to parse response");
    assert_eq!(lent["status"], "Borrowed");
    assert!(lent["dueDate"].is_string());

    let book: Value = admin
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["available_copies"], 0);

    // A borrowed book cannot be deleted
    let blocked = admin
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(blocked.status(), StatusCode::CONFLICT);

    let returned = admin
        .put(format!("{}/borrow-requests/return-book/{}", BASE_URL, request_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(returned.status(), StatusCode::OK);
    let returned: Value = returned.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "Returned");

    let status = student
        .post(format!("{}/borrow-requests/check-status", BASE_URL))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(status.status(), StatusCode::OK);

    let deleted = admin
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(deleted.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_rating_only_once() {
    let admin = session_client();
    register_admin(&admin, &unique_email("rater-admin")).await;
    let book_id = create_book(&admin, 2).await;

    let student = session_client();
    assert_eq!(
        register_student(&student, &unique_email("rater")).await.status(),
        StatusCode::OK
    );

    let rate = |value: i32| {
        student
            .post(format!("{}/books/rating", BASE_URL))
            .json(&json!({ "bookId": book_id, "rating": value }))
            .send()
    };

    assert_eq!(
        rate(6).await.expect("Failed to send request").status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        rate(4).await.expect("Failed to send request").status(),
        StatusCode::OK
    );
    assert_eq!(
        rate(5).await.expect("Failed to send request").status(),
        StatusCode::CONFLICT
    );

    let book: Value = student
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["rating"], 4.0);
}

#[tokio::test]
#[ignore]
async fn test_student_with_borrowed_book_cannot_be_deleted() {
    let admin = session_client();
    register_admin(&admin, &unique_email("keeper-admin")).await;

    let student = session_client();
    let student_email = unique_email("holder");
    assert_eq!(
        register_student(&student, &student_email).await.status(),
        StatusCode::OK
    );
    let approved = admin
        .put(format!("{}/user/approve/{}", BASE_URL, student_email))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(approved.status(), StatusCode::OK);

    let book_id = create_book(&admin, 1).await;
    let created: Value = student
        .post(format!("{}/borrow-requests/create", BASE_URL))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let request_id = created["id"].as_str().expect("No request id").to_string();

    let lent = admin
        .put(format!("{}/borrow-requests/approve-request/{}", BASE_URL, request_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(lent.status(), StatusCode::OK);

    let blocked = admin
        .delete(format!("{}/user/delete/{}", BASE_URL, student_email))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(blocked.status(), StatusCode::CONFLICT);
    let body: Value = blocked.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Cannot delete user with borrowed books");

    let users: Value = admin
        .get(format!("{}/user/allUsers", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let still_there = users
        .as_array()
        .expect("Expected a list")
        .iter()
        .any(|user| user["email"] == student_email.as_str());
    assert!(still_there);
}

#[tokio::test]
#[ignore]
async fn test_admin_cannot_delete_own_account() {
    let admin = session_client();
    let email = unique_email("self-admin");
    register_admin(&admin, &email).await;

    let response = admin
        .delete(format!("{}/admin/delete/{}", BASE_URL, email))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Session survives the refusal
    let admins = admin
        .get(format!("{}/admin/allAdmins", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(admins.status(), StatusCode::OK);
}
