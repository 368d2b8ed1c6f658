use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Datelike, Utc};
use greenpia::api::middleware::SecurityConfig;
use greenpia::api::{create_router, create_router_with};
use greenpia::db::Database;
use greenpia::models::*;
use greenpia::notify::Notifier;
use greenpia::rotation::RotationOverview;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

fn setup_with_notifier(notifier: Arc<dyn Notifier>) -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router_with(db, notifier, SecurityConfig::disabled());
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_household(server: &TestServer, id: &str, move_in: Option<&str>) -> Household {
    server
        .post("/api/v1/households")
        .json(&CreateHouseholdInput {
            household_id: id.to_string(),
            resident_name: format!("Unit {id}"),
            move_in_date: move_in.map(|d| d.parse().expect("bad date literal")),
            contact: None,
        })
        .await
        .json::<Household>()
}

/// Records how often a notification was attempted; optionally fails.
struct CountingNotifier {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingNotifier {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
        })
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self, _title: &str, _body: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("smtp relay unreachable")
        }
        Ok(())
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
    }
}

mod households {
    use super::*;

    #[tokio::test]
    async fn create_and_fetch_household() {
        let server = setup();
        let created = create_test_household(&server, "101", Some("2018-04-01")).await;
        assert_eq!(created.leader_history_count, 0);

        let response = server.get("/api/v1/households/101").await;
        response.assert_status_ok();
        let fetched: Household = response.json();
        assert_eq!(fetched.household_id, "101");
        assert_eq!(fetched.resident_name, "Unit 101");
    }

    #[tokio::test]
    async fn duplicate_unit_code_is_a_bad_request() {
        let server = setup();
        create_test_household(&server, "101", None).await;

        let response = server
            .post("/api/v1/households")
            .json(&CreateHouseholdInput {
                household_id: "101".to_string(),
                resident_name: "Second".to_string(),
                move_in_date: None,
                contact: None,
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_household_is_not_found() {
        let server = setup();
        let response = server.get("/api/v1/households/999").await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn complete_term_increments_history() {
        let server = setup();
        create_test_household(&server, "101", None).await;

        let response = server.post("/api/v1/households/101/complete-term").await;
        response.assert_status_ok();
        let household: Household = response.json();
        assert_eq!(household.leader_history_count, 1);
    }
}

mod rotation {
    use super::*;

    #[tokio::test]
    async fn calculate_creates_a_draft_schedule() {
        let server = setup();
        create_test_household(&server, "101", Some("2018-04-01")).await;
        create_test_household(&server, "102", Some("2020-03-15")).await;

        let response = server.post("/api/v1/schedules/2024/calculate").await;
        response.assert_status(StatusCode::CREATED);
        let entry: LeaderScheduleEntry = response.json();
        assert_eq!(entry.primary_household_id, "101");
        assert_eq!(entry.backup_household_id, "102");
        assert_eq!(entry.status, ScheduleStatus::Draft);
    }

    #[tokio::test]
    async fn calculate_conflicts_when_every_household_is_exempted() {
        let server = setup();
        create_test_household(&server, "101", None).await;

        let exemption: ExemptionRequest = server
            .post("/api/v1/exemptions")
            .json(&CreateExemptionInput {
                household_id: "101".to_string(),
                year: 2024,
                reason: None,
            })
            .await
            .json();
        server
            .post(&format!("/api/v1/exemptions/{}/approve", exemption.id))
            .await
            .assert_status_ok();

        let response = server.post("/api/v1/schedules/2024/calculate").await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn recalculate_reports_candidate_count_even_at_zero() {
        let server = setup();
        create_test_household(&server, "101", None).await;
        server
            .post("/api/v1/households/101/complete-term")
            .await
            .assert_status_ok();

        let response = server.post("/api/v1/schedules/2024/recalculate").await;
        response.assert_status_ok();
        let outcome: RecalculateOutcome = response.json();
        assert_eq!(outcome.candidate_count, 0);
        assert!(outcome.entry.is_none());

        let response = server.get("/api/v1/schedules/2024").await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn rotation_overview_annotates_exclusion_reasons() {
        let server = setup();
        create_test_household(&server, "101", Some("2018-04-01")).await;
        server
            .post("/api/v1/households/101/complete-term")
            .await
            .assert_status_ok();
        create_test_household(&server, "102", Some("2020-03-15")).await;

        let response = server.get("/api/v1/schedules/2024/rotation").await;
        response.assert_status_ok();
        let overview: RotationOverview = response.json();
        assert_eq!(overview.households.len(), 2);
        assert!(!overview.households[0].is_candidate);
        assert!(overview.households[1].is_candidate);
        assert!(overview.schedule.is_none());

        // Codes serialize as the single letters the UI displays.
        let value = serde_json::to_value(&overview).unwrap();
        assert_eq!(value["households"][0]["reasons"][0], "B");
    }

    #[tokio::test]
    async fn advance_walks_the_confirmation_sequence() {
        let server = setup();
        create_test_household(&server, "101", Some("2018-04-01")).await;
        create_test_household(&server, "102", Some("2020-03-15")).await;
        server
            .post("/api/v1/schedules/2024/calculate")
            .await
            .assert_status(StatusCode::CREATED);

        let entry: LeaderScheduleEntry =
            server.post("/api/v1/schedules/2024/advance").await.json();
        assert_eq!(entry.status, ScheduleStatus::Conditional);
        let entry: LeaderScheduleEntry =
            server.post("/api/v1/schedules/2024/advance").await.json();
        assert_eq!(entry.status, ScheduleStatus::Confirmed);

        let response = server.post("/api/v1/schedules/2024/advance").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod inquiries {
    use super::*;

    #[tokio::test]
    async fn creating_an_inquiry_sends_a_notification() {
        let notifier = CountingNotifier::new(false);
        let server = setup_with_notifier(notifier.clone());
        create_test_household(&server, "101", None).await;

        let response = server
            .post("/api/v1/inquiries")
            .json(&CreateInquiryInput {
                household_id: "101".to_string(),
                title: "Parking".to_string(),
                body: "Is guest parking available?".to_string(),
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn answering_succeeds_even_when_the_notifier_fails() {
        let notifier = CountingNotifier::new(true);
        let server = setup_with_notifier(notifier.clone());
        create_test_household(&server, "101", None).await;

        let inquiry: Inquiry = server
            .post("/api/v1/inquiries")
            .json(&CreateInquiryInput {
                household_id: "101".to_string(),
                title: "Parking".to_string(),
                body: "Is guest parking available?".to_string(),
            })
            .await
            .json();

        let response = server
            .post(&format!("/api/v1/inquiries/{}/answer", inquiry.id))
            .json(&AnswerInquiryInput {
                answer: "Two guest spots behind building B.".to_string(),
            })
            .await;
        response.assert_status_ok();
        let answered: Inquiry = response.json();
        assert_eq!(answered.status, InquiryStatus::Answered);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 2);
    }
}

mod role_sync {
    use super::*;

    #[tokio::test]
    async fn request_header_triggers_promotion_for_scheduled_household() {
        let server = setup();
        create_test_household(&server, "101", Some("2018-04-01")).await;

        // Schedule the current year so evaluation-time sync sees membership.
        let year = Utc::now().year();
        server
            .post(&format!("/api/v1/schedules/{year}/calculate"))
            .await
            .assert_status(StatusCode::CREATED);

        let user: User = server
            .post("/api/v1/users")
            .json(&CreateUserInput {
                name: "Tanaka".to_string(),
                household_id: Some("101".to_string()),
                role: None,
            })
            .await
            .json();
        assert_eq!(user.role, UserRole::Resident);

        // Any authenticated request reconciles the role before handling.
        server
            .get("/api/v1/health")
            .add_header("X-User-Id", user.id.to_string())
            .await
            .assert_status_ok();

        let fetched: User = server.get(&format!("/api/v1/users/{}", user.id)).await.json();
        assert_eq!(fetched.role, UserRole::Leader);
    }

    #[tokio::test]
    async fn malformed_user_header_is_ignored() {
        let server = setup();
        server
            .get("/api/v1/health")
            .add_header("X-User-Id", "not-a-uuid")
            .await
            .assert_status_ok();
    }
}

mod rate_limiting {
    use super::*;

    fn setup_with_limit(max_requests: u32) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let app = create_router_with(
            db,
            Arc::new(greenpia::notify::LogNotifier),
            SecurityConfig::with_rate_limit(max_requests),
        );
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn requests_over_the_limit_are_rejected() {
        let server = setup_with_limit(2);

        server.get("/api/v1/health").await.assert_status_ok();
        server.get("/api/v1/health").await.assert_status_ok();

        let response = server.get("/api/v1/health").await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    }
}

mod auth {
    use super::*;

    fn setup_with_key(key: &str) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let app = create_router_with(
            db,
            Arc::new(greenpia::notify::LogNotifier),
            SecurityConfig::with_api_key(key),
        );
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn requests_without_a_key_are_unauthorized() {
        let server = setup_with_key("secret");
        let response = server.get("/api/v1/households").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn requests_with_the_key_pass() {
        let server = setup_with_key("secret");
        let response = server
            .get("/api/v1/households")
            .add_header("Authorization", "Bearer secret")
            .await;
        response.assert_status_ok();
    }
}
