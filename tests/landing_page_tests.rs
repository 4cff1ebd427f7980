//! Landing page subscription flow and admin management against a mocked
//! MailerLite API.

mod test_utils;

use std::sync::Arc;

use applied_ai::models::subscription_session;
use applied_ai::repositories::subscription::{StepRecord, SubscriptionRepository};
use applied_ai::subscription::{SubscriptionState, SubscriptionStep};
use sea_orm::{EntityTrait, PaginatorTrait};
use axum::http::StatusCode;
use serde_json::json;
use test_utils::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "ada@example.com";

fn subscriber_path() -> String {
    format!("/subscribers/{}", EMAIL)
}

fn submit(slug: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    json_request("POST", &format!("/api/landing-pages/{}/submit/", slug), &body)
}

async fn mock_unknown_subscriber(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(subscriber_path()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
        .mount(server)
        .await;
}

async fn mock_known_subscriber(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(subscriber_path()))
        .and(header("authorization", "Bearer ml-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 555, "email": EMAIL}})),
        )
        .mount(server)
        .await;
}

async fn mock_groups(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "G1", "name": "Newsletter"},
                {"id": 2002, "name": "Automation leads"}
            ]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn public_page_hides_inactive_pages() {
    let db = setup_test_db().await.unwrap();
    insert_landing_page(&db, "live", &["G1"], true).await.unwrap();
    insert_landing_page(&db, "draft", &["G1"], false).await.unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, body) = send(&app, get("/api/landing-pages/live/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "live");
    assert_eq!(body["template_content"], "Here is your template");
    assert!(body.get("mailerlite_group_ids").is_none());

    let (status, _) = send(&app, get("/api/landing-pages/draft/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn email_step_creates_subscriber_in_first_group_and_joins_the_rest() {
    let server = MockServer::start().await;
    mock_unknown_subscriber(&server).await;
    Mock::given(method("POST"))
        .and(path("/subscribers"))
        .and(body_json(json!({
            "email": EMAIL,
            "groups": ["G1"],
            "fields": {"name": "Ada"}
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "555", "email": EMAIL}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/subscribers/{}/groups/G2", EMAIL)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    let page = insert_landing_page(&db, "guide", &["G1", "G2"], true).await.unwrap();
    let sessions = SubscriptionRepository::new(Arc::new(db.clone()));
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, body) = send(
        &app,
        submit("guide", json!({"step": "email", "email": " Ada@Example.com ", "first_name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "Subscriber created successfully", "next_step": "business_type"})
    );

    let session = sessions.find_session(page.id, EMAIL).await.unwrap().unwrap();
    assert_eq!(session.state, "email_captured");
    let history = sessions.transitions(session.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].from_state.is_none());
    assert_eq!(history[0].step, "email");
}

#[tokio::test]
async fn email_step_encodes_reserved_characters_in_subscriber_paths() {
    let email = "a#b@example.com";
    let encoded = "a%23b@example.com";
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/subscribers/{}", encoded)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/subscribers"))
        .and(body_json(json!({
            "email": email,
            "groups": ["G1"],
            "fields": {"name": "Ada"}
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "556", "email": email}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/subscribers/{}/groups/G2", encoded)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_landing_page(&db, "guide", &["G1", "G2"], true).await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, body) = send(
        &app,
        submit("guide", json!({"step": "email", "email": email, "first_name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next_step"], "business_type");
}

#[tokio::test]
async fn email_step_for_existing_subscriber_joins_every_group_and_renames() {
    let server = MockServer::start().await;
    mock_known_subscriber(&server).await;
    for group in ["G1", "G2"] {
        Mock::given(method("POST"))
            .and(path(format!("/subscribers/{}/groups/{}", EMAIL, group)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("PUT"))
        .and(path("/subscribers/555"))
        .and(body_json(json!({"fields": {"name": "Ada"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "555", "email": EMAIL}})))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_landing_page(&db, "guide", &["G1", "G2"], true).await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, _) = send(
        &app,
        submit("guide", json!({"step": "email", "email": EMAIL, "first_name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn business_type_step_sets_flags_and_completes_the_session() {
    for (choice, uses_automation, sells_services) in [("implement", 1, 0), ("sell_services", 0, 1)] {
        let server = MockServer::start().await;
        mock_known_subscriber(&server).await;
        Mock::given(method("PUT"))
            .and(path("/subscribers/555"))
            .and(body_json(json!({"fields": {
                "uses_automation_in_their_business": uses_automation,
                "sell_ai_services": sells_services
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "555", "email": EMAIL}})))
            .expect(1)
            .mount(&server)
            .await;

        let db = setup_test_db().await.unwrap();
        let page = insert_landing_page(&db, "guide", &["G1"], true).await.unwrap();
        let sessions = SubscriptionRepository::new(Arc::new(db.clone()));
        let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

        let (status, body) = send(
            &app,
            submit("guide", json!({"step": "business_type", "email": EMAIL, "business_type": choice})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completed"], true);
        assert_eq!(body["template"], "Here is your template");
        assert_eq!(body["message"], "Business type updated successfully");

        let session = sessions.find_session(page.id, EMAIL).await.unwrap().unwrap();
        assert_eq!(session.state, "completed");
        assert_eq!(session.business_type.as_deref(), Some(choice));
    }
}

#[tokio::test]
async fn invalid_submissions_are_rejected_before_mailerlite() {
    let server = MockServer::start().await;
    // Any upstream call would be unexpected.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_landing_page(&db, "guide", &["G1"], true).await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let cases = [
        (json!({"step": "email", "email": EMAIL}), "Email and first name are required"),
        (json!({"step": "business_type"}), "Email is required"),
        (
            json!({"step": "business_type", "email": EMAIL, "business_type": "hobby"}),
            "Invalid business type",
        ),
        (json!({"step": "payment", "email": EMAIL}), "Invalid step"),
    ];
    for (request, message) in cases {
        let (status, body) = send(&app, submit("guide", request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], message);
    }

    let (status, _) = send(
        &app,
        submit("guide", json!({"step": "email", "email": "not-an-email", "first_name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long_name = "x".repeat(101);
    let (status, _) = send(
        &app,
        submit("guide", json!({"step": "email", "email": EMAIL, "first_name": long_name})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mailerlite_failure_is_500_and_records_nothing() {
    let server = MockServer::start().await;
    mock_unknown_subscriber(&server).await;
    Mock::given(method("POST"))
        .and(path("/subscribers"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "invalid"})))
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    let page = insert_landing_page(&db, "guide", &["G1"], true).await.unwrap();
    let sessions = SubscriptionRepository::new(Arc::new(db.clone()));
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, _) = send(
        &app,
        submit("guide", json!({"step": "email", "email": EMAIL, "first_name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(sessions.find_session(page.id, EMAIL).await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_email_steps_share_one_session() {
    let db = setup_test_db().await.unwrap();
    let page = insert_landing_page(&db, "guide", &["G1"], true).await.unwrap();
    let sessions = SubscriptionRepository::new(Arc::new(db.clone()));
    let step = || StepRecord {
        landing_page_id: page.id,
        email: EMAIL,
        step: SubscriptionStep::Email,
        business_type: None,
    };

    let (first, second) = tokio::join!(sessions.record_step(step()), sessions.record_step(step()));
    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.session.id, second.session.id);
    assert_eq!(subscription_session::Entity::find().count(&db).await.unwrap(), 1);

    let mut sources = vec![first.from_state, second.from_state];
    sources.sort_by_key(|s| s.map(|s| s.as_str()));
    assert_eq!(sources, vec![None, Some(SubscriptionState::EmailCaptured)]);

    let history = sessions.transitions(first.session.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].from_state.is_none());
    assert_eq!(history[1].from_state.as_deref(), Some("email_captured"));
}

#[tokio::test]
async fn step_source_state_comes_from_the_stored_session() {
    let db = setup_test_db().await.unwrap();
    let page = insert_landing_page(&db, "guide", &["G1"], true).await.unwrap();
    let sessions = SubscriptionRepository::new(Arc::new(db.clone()));

    let completed = sessions
        .record_step(StepRecord {
            landing_page_id: page.id,
            email: EMAIL,
            step: SubscriptionStep::BusinessType,
            business_type: Some("implement"),
        })
        .await
        .unwrap();
    assert!(completed.from_state.is_none());
    assert_eq!(completed.session.state, "completed");

    let replayed = sessions
        .record_step(StepRecord {
            landing_page_id: page.id,
            email: EMAIL,
            step: SubscriptionStep::Email,
            business_type: None,
        })
        .await
        .unwrap();
    assert_eq!(replayed.from_state, Some(SubscriptionState::Completed));
    assert_eq!(replayed.session.state, "completed");
    assert_eq!(replayed.session.business_type.as_deref(), Some("implement"));
}

#[tokio::test]
async fn admin_list_fetches_groups_once_when_mailerlite_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_landing_page(&db, "guide", &["G1", "G2"], true).await.unwrap();
    insert_landing_page(&db, "course", &["G2", "G3"], true).await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, body) = send(&app, admin_request("GET", "/api/admin/landing-pages/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    for page in body["results"].as_array().unwrap() {
        for group in page["mailerlite_groups"].as_array().unwrap() {
            assert_eq!(group["name"], format!("Group ID: {}", group["id"].as_str().unwrap()));
        }
    }
}

#[tokio::test]
async fn admin_endpoints_require_token() {
    let db = setup_test_db().await.unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, _) = send(&app, get("/api/admin/landing-pages/")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = axum::http::Request::builder()
        .uri("/api/admin/mailerlite/groups/")
        .header("authorization", "Bearer wrong")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn group_listing_is_cached_until_refreshed() {
    let server = MockServer::start().await;
    mock_groups(&server, 2).await;

    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    for _ in 0..3 {
        let (status, body) = send(&app, admin_request("GET", "/api/admin/mailerlite/groups/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["groups"][1]["id"], "2002");
        assert_eq!(body["groups"][1]["display_label"], "Automation leads (ID: 2002)");
    }

    let (status, _) = send(&app, admin_request("POST", "/api/admin/mailerlite/groups/refresh/")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn concurrent_cache_misses_fetch_groups_once() {
    let server = MockServer::start().await;
    mock_groups(&server, 1).await;

    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                send(&app, admin_request("GET", "/api/admin/mailerlite/groups/")).await
            })
        })
        .collect();
    for handle in handles {
        let (status, _) = handle.await.expect("task completes");
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn admin_create_validates_groups_and_resolves_names() {
    let server = MockServer::start().await;
    mock_groups(&server, 1).await;

    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, body) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/admin/landing-pages/",
            &json!({"title": "Guide", "slug": "guide", "mailerlite_group_ids": ["G1", "G404"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Group ID \"G404\" not found in MailerLite. Please refresh the groups list and try again."
    );

    let (status, body) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/admin/landing-pages/",
            &json!({"title": "Guide", "slug": "guide", "mailerlite_group_ids": ["2002", "G1", "G1"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mailerlite_group_ids"], json!(["2002", "G1"]));
    assert_eq!(body["mailerlite_groups"][0]["name"], "Automation leads");
    assert_eq!(body["is_active"], true);

    let (status, body) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/admin/landing-pages/",
            &json!({"title": "Again", "slug": "guide"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let (status, _) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/admin/landing-pages/",
            &json!({"title": "Bad", "slug": "has spaces"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_update_replaces_fields_and_can_deactivate() {
    let db = setup_test_db().await.unwrap();
    insert_landing_page(&db, "guide", &[], true).await.unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, body) = send(
        &app,
        admin_json_request(
            "PUT",
            "/api/admin/landing-pages/guide/",
            &json!({"title": "Renamed", "slug": "guide-2025", "is_active": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "guide-2025");
    assert!(body["template_content"].is_null());

    let (status, _) = send(&app, get("/api/landing-pages/guide-2025/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, admin_request("GET", "/api/admin/landing-pages/guide-2025/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);
}
