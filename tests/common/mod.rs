#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use therapy_crm::auth::{generate_jwt, Claims};
use therapy_crm::config::AppConfig;
use therapy_crm::database::MemoryStore;
use therapy_crm::notifications::{NotificationError, Notifier, OutgoingEmail};
use therapy_crm::{app, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const THERAPIST_EMAIL: &str = "therapist@clinic.test";

/// Captures outgoing mail instead of talking to a relay
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeMailer {
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().iter().filter(|e| e.to == address).cloned().collect()
    }

    /// Token embedded in the newest reminder link sent to `address`
    pub fn form_token_for(&self, address: &str) -> Option<String> {
        let reminders = self.sent_to(address);
        let body = &reminders.last()?.text_body;
        let start = body.find("/form/")? + "/form/".len();
        Some(body[start..].split_whitespace().next()?.to_string())
    }
}

#[async_trait]
impl Notifier for FakeMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError> {
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(NotificationError::Transport(format!("mailbox {} unavailable", email.to)));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }

    fn sender(&self) -> (&str, &str) {
        ("CRM Therapy", "crm@clinic.test")
    }
}

/// The full router served in-process on a free port, backed by the memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub mailer: Arc<FakeMailer>,
    pub store: Arc<MemoryStore>,
    client: reqwest::Client,
    token: String,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.api.port = port;
        config.api.public_base_url = base_url.clone();
        config.api.enable_request_logging = false;
        config.security.jwt_secret = JWT_SECRET.to_string();
        config.email.therapist_email = THERAPIST_EMAIL.to_string();

        let mailer = Arc::new(FakeMailer::default());
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone(), mailer.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let token = generate_jwt(&Claims::therapist("dr.test", 1), JWT_SECRET)?;
        let server = Self {
            port,
            base_url,
            mailer,
            store,
            client: reqwest::Client::new(),
            token,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Unauthenticated client, as a patient's browser would be
    pub fn anonymous(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(&self.token)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(&self.token)
    }

    /// POST /patients and return the new id
    pub async fn add_patient(&self, name: &str, email: &str) -> Result<String> {
        let res = self
            .post("/patients")
            .json(&serde_json::json!({ "name": name, "email": email }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "add patient failed: {}", res.status());

        let body: Value = res.json().await?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .context("response carried no id")
    }
}
