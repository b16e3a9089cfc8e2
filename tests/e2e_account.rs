//! E2E tests for profile registration, reads, updates and admin removal

mod common;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD, DEFAULT_PASSWORD, TestServer};
use serde_json::Value;

#[tokio::test]
async fn test_register_returns_read_view_without_credentials() {
    let server = TestServer::new().await;

    let json = server.register("  Ada@Example.COM ", "Ada").await;

    assert!(json["id"].is_string());
    assert_eq!(json["email"], "ada@example.com");
    assert_eq!(json["first_name"], "Ada");
    assert_eq!(json["is_staff"], false);
    assert_eq!(json["is_active"], true);
    assert!(json.get("password").is_none());
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_case_insensitive() {
    let server = TestServer::new().await;
    server.register("ada@example.com", "Ada").await;

    let response = server
        .client
        .post(server.url("/api/profiles"))
        .json(&serde_json::json!({
            "email": "ADA@example.com",
            "first_name": "Other",
            "password": DEFAULT_PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_register_rejects_missing_fields() {
    let server = TestServer::new().await;

    for body in [
        serde_json::json!({ "first_name": "Ada", "password": DEFAULT_PASSWORD }),
        serde_json::json!({ "email": "ada@example.com", "password": DEFAULT_PASSWORD }),
        serde_json::json!({ "email": "ada@example.com", "first_name": "Ada" }),
        serde_json::json!({ "email": "", "first_name": "Ada", "password": DEFAULT_PASSWORD }),
        serde_json::json!({ "email": "ada@example.com", "first_name": " ", "password": DEFAULT_PASSWORD }),
    ] {
        let response = server
            .client
            .post(server.url("/api/profiles"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body: {}", body);
    }
}

#[tokio::test]
async fn test_get_and_list_profiles_anonymously() {
    let server = TestServer::new().await;
    let created = server.register("ada@example.com", "Ada").await;
    let id = created["id"].as_str().unwrap();

    let response = server
        .client
        .get(server.url(&format!("/api/profiles/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json, created);

    let missing = server
        .client
        .get(server.url("/api/profiles/01HZZZZZZZZZZZZZZZZZZZZZZZ"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    let list: Vec<Value> = server
        .client
        .get(server.url("/api/profiles"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // Bootstrap admin plus the new account
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|p| p.get("password").is_none()));
}

#[tokio::test]
async fn test_list_profiles_search_and_paging() {
    let server = TestServer::new().await;
    server.register("ada@example.com", "Ada").await;
    server.register("grace@example.com", "Grace").await;
    server.register("alan@example.com", "Alan").await;

    let found: Vec<Value> = server
        .client
        .get(server.url("/api/profiles"))
        .query(&[("search", "GRACE")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["email"], "grace@example.com");

    let page: Vec<Value> = server
        .client
        .get(server.url("/api/profiles"))
        .query(&[("limit", "2"), ("offset", "1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["email"], "ada@example.com");
    assert_eq!(page[1]["email"], "grace@example.com");
}

#[tokio::test]
async fn test_owner_can_patch_profile() {
    let server = TestServer::new().await;
    let (id, token) = server.register_and_login("ada@example.com").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/profiles/{}", id)))
        .header("Authorization", format!("Token {}", token))
        .json(&serde_json::json!({ "first_name": "Augusta", "last_name": "King" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["first_name"], "Augusta");
    assert_eq!(json["last_name"], "King");
    assert_eq!(json["email"], "ada@example.com");
}

#[tokio::test]
async fn test_put_replaces_profile_and_password() {
    let server = TestServer::new().await;
    let (id, token) = server.register_and_login("ada@example.com").await;

    let response = server
        .client
        .put(server.url(&format!("/api/profiles/{}", id)))
        .header("Authorization", format!("Token {}", token))
        .json(&serde_json::json!({
            "email": "lovelace@example.com",
            "first_name": "Ada",
            "password": "a brand new secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let old = server
        .client
        .post(server.url("/api/login"))
        .json(&serde_json::json!({ "email": "lovelace@example.com", "password": DEFAULT_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status(), 400);

    server
        .login("lovelace@example.com", "a brand new secret")
        .await;

    let incomplete = server
        .client
        .put(server.url(&format!("/api/profiles/{}", id)))
        .header("Authorization", format!("Token {}", token))
        .json(&serde_json::json!({ "first_name": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(incomplete.status(), 400);
}

#[tokio::test]
async fn test_cannot_update_other_profile() {
    let server = TestServer::new().await;
    let (ada_id, _) = server.register_and_login("ada@example.com").await;
    let (_, grace_token) = server.register_and_login("grace@example.com").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/profiles/{}", ada_id)))
        .header("Authorization", format!("Token {}", grace_token))
        .json(&serde_json::json!({ "first_name": "Hacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let anonymous = server
        .client
        .patch(server.url(&format!("/api/profiles/{}", ada_id)))
        .json(&serde_json::json!({ "first_name": "Hacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);

    let json: Value = server
        .client
        .get(server.url(&format!("/api/profiles/{}", ada_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["first_name"], "Tester");
}

#[tokio::test]
async fn test_update_to_taken_email_fails() {
    let server = TestServer::new().await;
    let (id, token) = server.register_and_login("ada@example.com").await;
    server.register("grace@example.com", "Grace").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/profiles/{}", id)))
        .header("Authorization", format!("Token {}", token))
        .json(&serde_json::json!({ "email": "Grace@Example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_admin_delete_requires_staff_and_cascades() {
    let server = TestServer::new().await;
    let (ada_id, ada_token) = server.register_and_login("ada@example.com").await;
    server.post_status(&ada_token, "soon gone").await;

    let self_delete = server
        .client
        .delete(server.url(&format!("/admin/profiles/{}", ada_id)))
        .header("Authorization", format!("Token {}", ada_token))
        .send()
        .await
        .unwrap();
    assert_eq!(self_delete.status(), 403);

    let anonymous = server
        .client
        .delete(server.url(&format!("/admin/profiles/{}", ada_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);

    let admin_token = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let response = server
        .client
        .delete(server.url(&format!("/admin/profiles/{}", ada_id)))
        .header("Authorization", format!("Token {}", admin_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let gone = server
        .client
        .get(server.url(&format!("/api/profiles/{}", ada_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);

    let feed: Vec<Value> = server
        .client
        .get(server.url("/api/feed"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(feed.is_empty());

    let again = server
        .client
        .delete(server.url(&format!("/admin/profiles/{}", ada_id)))
        .header("Authorization", format!("Token {}", admin_token))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}
