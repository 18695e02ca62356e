//! Correlation id propagation and invocation logging across both layers.

use user_service_sdk::{NewUser, UserClient};

mod common;

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.into(),
        full_name: None,
        password: "top-secret".into(),
        role: Some("ADMIN".into()),
    }
}

#[tokio::test]
async fn test_supplied_id_is_echoed_and_logged() {
    let server = common::TestServer::start().await;
    let client = UserClient::new(&server.url()).with_correlation_id("abc-123");

    let reply = client.create_user(&new_user("admin@x.io")).await.unwrap();

    assert_eq!(reply.status, 201);
    assert_eq!(reply.correlation_id.as_deref(), Some("abc-123"));

    let lines = server.lines_for("abc-123");
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[Service] create_user | correlationId=abc-123 | status=SUCCESS"));
    assert!(lines[1].starts_with("[Controller] POST /api/users | status=201"));
    for line in &lines {
        assert!(line.contains(r#""password":"***""#));
        assert!(!line.contains("top-secret"));
    }
}

#[tokio::test]
async fn test_missing_id_is_generated() {
    let server = common::TestServer::start().await;
    let client = UserClient::new(&server.url());

    let reply = client.find_user("nobody@x.io").await.unwrap();

    assert_eq!(reply.status, 404);
    let id = reply.correlation_id.unwrap();
    assert_eq!(id.len(), 36);
    assert_eq!(reply.body.unwrap()["correlationId"], id.as_str());

    let lines = server.lines_for(&id);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[Service][ERROR] get_user_by_email"));
    assert!(lines[0].contains("error=User not found: nobody@x.io"));
    assert!(lines[1].starts_with(
        "[Controller][ERROR] GET /api/users/by-email?email=nobody%40x.io | status=404"
    ));
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_own_ids() {
    let server = common::TestServer::start().await;
    let url = server.url();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let cid = format!("req-{i}");
            let client = UserClient::new(&url).with_correlation_id(cid.clone());
            let reply = client
                .create_user(&new_user(&format!("user{i}@x.io")))
                .await
                .unwrap();
            assert_eq!(reply.correlation_id.as_deref(), Some(cid.as_str()));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for i in 0..8 {
        let lines = server.lines_for(&format!("req-{i}"));
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains(&format!("user{i}@x.io"))));
    }
    assert!(server.sink.records().iter().all(|r| r.correlation_id != "no-cid"));
}
