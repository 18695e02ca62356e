//! End-to-end tests of the user endpoints over real HTTP.

use user_service_sdk::{ErrorBody, NewUser, UserClient, UserView};

mod common;

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.into(),
        full_name: Some("John Doe".into()),
        password: "pa55word".into(),
        role: None,
    }
}

#[tokio::test]
async fn test_user_lifecycle() {
    let server = common::TestServer::start().await;
    let client = UserClient::new(&server.url());

    let created = client.create_user(&new_user("john@x.io")).await.unwrap();
    assert_eq!(created.status, 201);
    let user: UserView = created.json().unwrap();
    assert_eq!(user.email, "john@x.io");
    assert_eq!(user.role, "CUSTOMER");

    let fetched = client.get_user(&user.id).await.unwrap();
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.json::<UserView>().unwrap(), user);

    let found = client.find_user("john@x.io").await.unwrap();
    assert_eq!(found.json::<UserView>().unwrap().id, user.id);

    let deleted = client.delete_user(&user.id).await.unwrap();
    assert_eq!(deleted.status, 204);
    assert!(deleted.body.is_none());

    let gone = client.get_user(&user.id).await.unwrap();
    assert_eq!(gone.status, 404);
    let error: ErrorBody = gone.json().unwrap();
    assert_eq!(error.error_code, "USER_NOT_FOUND");
    assert_eq!(error.message, format!("User not found: {}", user.id));
    assert_eq!(Some(error.correlation_id), gone.correlation_id);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let server = common::TestServer::start().await;
    let client = UserClient::new(&server.url()).with_correlation_id("dup-1");

    assert_eq!(client.create_user(&new_user("dup@x.io")).await.unwrap().status, 201);
    let again = client.create_user(&new_user("dup@x.io")).await.unwrap();

    assert_eq!(again.status, 409);
    let error: ErrorBody = again.json().unwrap();
    assert_eq!(error.error_code, "USER_ALREADY_EXISTS");
    assert_eq!(error.message, "User with this email already exists: dup@x.io");
    assert_eq!(error.correlation_id, "dup-1");
}

#[tokio::test]
async fn test_listing_pages_and_sorts() {
    let server = common::TestServer::start().await;
    let client = UserClient::new(&server.url());
    for email in ["c@x.io", "a@x.io", "b@x.io"] {
        client.create_user(&new_user(email)).await.unwrap();
    }

    let reply = client.list_users(0, 2, Some("email,desc")).await.unwrap();
    assert_eq!(reply.status, 200);
    let page: serde_json::Value = reply.json().unwrap();
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["content"][0]["email"], "c@x.io");
    assert_eq!(page["content"][1]["email"], "b@x.io");

    let bad = client.list_users(0, 2, Some("password")).await.unwrap();
    assert_eq!(bad.status, 400);
    assert_eq!(bad.json::<ErrorBody>().unwrap().error_code, "METHOD_ARGUMENT_NOT_VALID");
}

#[tokio::test]
async fn test_invalid_request_rejected() {
    let server = common::TestServer::start().await;
    let client = UserClient::new(&server.url());

    let reply = client.create_user(&new_user("not-an-email")).await.unwrap();

    assert_eq!(reply.status, 400);
    assert_eq!(
        reply.json::<ErrorBody>().unwrap().message,
        "email: must be a well-formed email address"
    );
}

#[tokio::test]
async fn test_health() {
    let server = common::TestServer::start().await;
    let reply = UserClient::new(&server.url()).health().await.unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body.unwrap()["status"], "UP");
    assert!(reply.correlation_id.is_some());
}
