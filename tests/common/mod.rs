//! Common test utilities for E2E tests

#![allow(dead_code)]

use profilefeed::{AppState, config};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@test.example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const DEFAULT_PASSWORD: &str = "correct horse battery staple";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Build a configuration pointing at a throwaway database
pub fn test_config(db_path: std::path::PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: config::DatabaseConfig { path: db_path },
        auth: config::AuthConfig {
            token_max_age: 3600,
        },
        admin: config::AdminConfig {
            email: Some(ADMIN_EMAIL.to_string()),
            first_name: "Admin".to_string(),
            last_name: None,
            password: Some(ADMIN_PASSWORD.to_string()),
        },
        limits: config::LimitsConfig {
            max_body_bytes: 16 * 1024,
            default_page_size: 50,
            max_page_size: 100,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        profilefeed::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path().join("test.db"));

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = profilefeed::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register an account through the API and return its JSON view
    pub async fn register(&self, email: &str, first_name: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/profiles"))
            .json(&serde_json::json!({
                "email": email,
                "first_name": first_name,
                "password": DEFAULT_PASSWORD,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }

    /// Log in and return the bearer token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let json: Value = response.json().await.unwrap();
        json["token"].as_str().unwrap().to_string()
    }

    /// Register and log in, returning `(account_id, token)`
    pub async fn register_and_login(&self, email: &str) -> (String, String) {
        let account = self.register(email, "Tester").await;
        let token = self.login(email, DEFAULT_PASSWORD).await;
        (account["id"].as_str().unwrap().to_string(), token)
    }

    /// Post a status as the holder of `token`
    pub async fn post_status(&self, token: &str, text: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/feed"))
            .header("Authorization", format!("Token {}", token))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}
