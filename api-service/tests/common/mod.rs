use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_service::account::service::AccountService;
use api_service::admission::RateLimitPolicy;
use api_service::inbound::http::router::create_router;
use api_service::outbound::rate_limit::InMemoryRateLimiter;
use api_service::outbound::repositories::InMemoryCredentialStore;
use auth::Authenticator;
use auth::HashCost;
use auth::PasswordHasher;
use serde_json::json;
use serde_json::Value;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Knobs for a spawned test server
pub struct TestSettings {
    pub max_requests: u32,
    pub window: Duration,
    pub token_ttl: chrono::Duration,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window: Duration::from_secs(60),
            token_ttl: chrono::Duration::hours(24),
        }
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    /// Spawn the application with default settings
    pub async fn spawn() -> Self {
        Self::spawn_with(TestSettings::default()).await
    }

    /// Spawn the application in a background task and return TestApp
    pub async fn spawn_with(settings: TestSettings) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        // Cheap hashing keeps the suite fast
        let password_hasher = PasswordHasher::with_cost(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to build password hasher");

        let authenticator = Arc::new(
            Authenticator::new(TEST_SECRET)
                .expect("Failed to build authenticator")
                .with_password_hasher(password_hasher)
                .with_token_ttl(settings.token_ttl),
        );

        let store = Arc::new(InMemoryCredentialStore::new());
        let account_service = Arc::new(AccountService::new(store, Arc::clone(&authenticator)));
        let admission = Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::new(
            settings.max_requests,
            settings.window,
        )));

        let router = create_router(
            account_service,
            Arc::clone(&authenticator),
            admission,
            false,
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
            authenticator,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register an account and return the response
    pub async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/auth/register")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the response
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the access token
    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let body: Value = self
            .login(email, password)
            .await
            .json()
            .await
            .expect("Failed to parse response");

        body["access_token"]
            .as_str()
            .expect("Missing access_token")
            .to_string()
    }
}
