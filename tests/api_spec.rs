use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use phishing_sim::api::{create_router, SecurityConfig};
use phishing_sim::db::{AttemptStore, Database};
use phishing_sim::mail::{ConsoleMailer, MailError, MailSender, OutgoingMail};
use phishing_sim::models::*;
use phishing_sim::phishing::{PhishingConfig, PhishingService};
use uuid::Uuid;

struct RejectingMailer;

#[async_trait]
impl MailSender for RejectingMailer {
    async fn send_mail(&self, _mail: &OutgoingMail) -> Result<(), MailError> {
        Err(MailError::Transport("relay unavailable".to_string()))
    }
}

struct UnavailableStore;

impl AttemptStore for UnavailableStore {
    fn new_attempt_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn insert_attempt(&self, _attempt: &Attempt) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }

    fn get_attempt(&self, _id: Uuid) -> anyhow::Result<Option<Attempt>> {
        anyhow::bail!("disk full")
    }

    fn update_attempt(&self, _attempt: &Attempt) -> anyhow::Result<bool> {
        anyhow::bail!("disk full")
    }

    fn list_attempts(&self, _filter: &AttemptFilter) -> anyhow::Result<Vec<Attempt>> {
        anyhow::bail!("disk full")
    }
}

fn server_with_store(
    mailer: Arc<dyn MailSender>,
    store: Arc<dyn AttemptStore>,
    security: SecurityConfig,
) -> TestServer {
    let service = PhishingService::new(
        mailer,
        store,
        PhishingConfig::new("http://localhost:3000"),
    );
    TestServer::new(create_router(service, security)).expect("Failed to create test server")
}

fn server_with(mailer: Arc<dyn MailSender>, security: SecurityConfig) -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    server_with_store(mailer, Arc::new(db), security)
}

fn setup() -> TestServer {
    server_with(Arc::new(ConsoleMailer), SecurityConfig::disabled())
}

async fn send_attempt(server: &TestServer, email: &str) -> Attempt {
    server
        .post("/api/phishing/send")
        .json(&SendPhishingInput {
            email: email.to_string(),
        })
        .await
        .json::<Attempt>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/health").await;
        response.assert_status_ok();
        response.assert_json(&serde_json::json!({ "status": "ok" }));
    }
}

mod send {
    use super::*;

    #[tokio::test]
    async fn creates_a_sent_attempt() {
        let server = setup();

        let response = server
            .post("/api/phishing/send")
            .json(&SendPhishingInput {
                email: "a@x.com".to_string(),
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let attempt: Attempt = response.json();
        assert_eq!(attempt.email, "a@x.com");
        assert_eq!(attempt.status, AttemptStatus::Sent);
    }

    #[tokio::test]
    async fn uses_camel_case_timestamps() {
        let server = setup();

        let body: serde_json::Value = server
            .post("/api/phishing/send")
            .json(&serde_json::json!({ "email": "a@x.com" }))
            .await
            .json();

        assert_eq!(body["status"], "sent");
        assert!(body["createdAt"].is_string());
        assert!(body["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn rejects_empty_email() {
        let server = setup();

        let response = server
            .post("/api/phishing/send")
            .json(&serde_json::json!({ "email": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reports_send_failure_and_keeps_failed_record() {
        let server = server_with(Arc::new(RejectingMailer), SecurityConfig::disabled());

        let response = server
            .post("/api/phishing/send")
            .json(&serde_json::json!({ "email": "a@x.com" }))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert!(response.text().starts_with("Failed to send email:"));
        assert!(response.text().contains("relay unavailable"));

        let attempts: Vec<Attempt> = server.get("/api/phishing/attempts").await.json();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, AttemptStatus::Failed);
    }
}

mod click {
    use super::*;

    #[tokio::test]
    async fn marks_attempt_clicked() {
        let server = setup();
        let attempt = send_attempt(&server, "a@x.com").await;

        let response = server
            .get(&format!("/api/phishing/click/{}", attempt.id))
            .await;

        response.assert_status_ok();
        let clicked: Attempt = response.json();
        assert_eq!(clicked.id, attempt.id);
        assert_eq!(clicked.status, AttemptStatus::Clicked);
    }

    #[tokio::test]
    async fn repeated_click_still_succeeds() {
        let server = setup();
        let attempt = send_attempt(&server, "a@x.com").await;
        let path = format!("/api/phishing/click/{}", attempt.id);

        server.get(&path).await.assert_status_ok();
        let response = server.get(&path).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Attempt>().status, AttemptStatus::Clicked);
    }

    #[tokio::test]
    async fn unknown_id_returns_not_found() {
        let server = setup();

        let response = server.get("/api/phishing/click/nonexistent-id").await;

        response.assert_status_not_found();
        response.assert_text("Phishing attempt not found");
    }

    #[tokio::test]
    async fn does_not_require_api_key() {
        let server = server_with(
            Arc::new(ConsoleMailer),
            SecurityConfig::with_api_key("secret"),
        );
        let attempt: Attempt = server
            .post("/api/phishing/send")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer secret"),
            )
            .json(&serde_json::json!({ "email": "a@x.com" }))
            .await
            .json();

        let response = server
            .get(&format!("/api/phishing/click/{}", attempt.id))
            .await;

        response.assert_status_ok();
    }
}

mod attempts {
    use super::*;

    #[tokio::test]
    async fn lists_attempts_filtered_by_status() {
        let server = setup();
        let clicked = send_attempt(&server, "a@x.com").await;
        send_attempt(&server, "b@x.com").await;
        server
            .get(&format!("/api/phishing/click/{}", clicked.id))
            .await
            .assert_status_ok();

        let all: Vec<Attempt> = server.get("/api/phishing/attempts").await.json();
        assert_eq!(all.len(), 2);

        let response = server
            .get("/api/phishing/attempts")
            .add_query_param("status", "clicked")
            .await;
        response.assert_status_ok();
        let only_clicked: Vec<Attempt> = response.json();
        assert_eq!(only_clicked.len(), 1);
        assert_eq!(only_clicked[0].id, clicked.id);
    }

    #[tokio::test]
    async fn gets_attempt_by_id() {
        let server = setup();
        let attempt = send_attempt(&server, "a@x.com").await;

        let response = server
            .get(&format!("/api/phishing/attempts/{}", attempt.id))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Attempt>(), attempt);
    }

    #[tokio::test]
    async fn missing_attempt_returns_not_found() {
        let server = setup();
        let response = server
            .get(&format!("/api/phishing/attempts/{}", Uuid::new_v4()))
            .await;
        response.assert_status_not_found();
    }
}

mod auth {
    use super::*;

    fn secured() -> TestServer {
        server_with(
            Arc::new(ConsoleMailer),
            SecurityConfig::with_api_key("secret"),
        )
    }

    #[tokio::test]
    async fn rejects_send_without_key() {
        let server = secured();

        let response = server
            .post("/api/phishing/send")
            .json(&serde_json::json!({ "email": "a@x.com" }))
            .expect_failure()
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn rejects_wrong_key() {
        let server = secured();

        let response = server
            .get("/api/phishing/attempts")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer wrong"),
            )
            .expect_failure()
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn accepts_valid_key() {
        let server = secured();

        let response = server
            .get("/api/phishing/attempts")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer secret"),
            )
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn health_is_public() {
        let server = secured();
        server.get("/api/health").await.assert_status_ok();
    }
}

mod store_failure {
    use super::*;

    fn unavailable() -> TestServer {
        server_with_store(
            Arc::new(ConsoleMailer),
            Arc::new(UnavailableStore),
            SecurityConfig::disabled(),
        )
    }

    #[tokio::test]
    async fn send_returns_sanitized_internal_error() {
        let server = unavailable();

        let response = server
            .post("/api/phishing/send")
            .json(&serde_json::json!({ "email": "a@x.com" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_text("Internal server error");
    }

    #[tokio::test]
    async fn click_returns_sanitized_internal_error() {
        let server = unavailable();

        let response = server
            .get(&format!("/api/phishing/click/{}", Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_text("Internal server error");
    }
}
