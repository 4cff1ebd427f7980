//! News API: public feed, canonical and captured story management and the
//! Notion reading list.

mod test_utils;

use axum::http::StatusCode;
use serde_json::json;
use test_utils::*;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn feed_lists_ranked_stories_newest_event_first() {
    let db = setup_test_db().await.unwrap();
    let older = insert_canonical_story(&db, "Older", Some("ranked"), Some(2), 5)
        .await
        .unwrap();
    let newer = insert_canonical_story(&db, "Newer", Some("ranked"), Some(4), 1)
        .await
        .unwrap();
    insert_canonical_story(&db, "Low rank", Some("ranked"), Some(1), 0)
        .await
        .unwrap();
    insert_canonical_story(&db, "Unranked", None, Some(9), 0)
        .await
        .unwrap();
    insert_canonical_story(&db, "Draft", Some("new"), Some(5), 0)
        .await
        .unwrap();

    insert_captured_story(&db, Some(newer.id), "hn", "https://news.example/a", 30)
        .await
        .unwrap();
    insert_captured_story(&db, Some(newer.id), "reddit", "https://reddit.example/b", 5)
        .await
        .unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, body) = send(&app, get("/api/news/feed/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["hasMore"], false);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["id"], newer.id);
    assert_eq!(data[0]["show_source"], true);
    assert_eq!(data[0]["source_url"], "https://reddit.example/b");
    assert_eq!(data[0]["source_name"], "reddit");
    assert_eq!(data[0]["captured_stories_count"], 2);

    assert_eq!(data[1]["id"], older.id);
    assert_eq!(data[1]["show_source"], false);
    assert!(data[1]["source_url"].is_null());
}

#[tokio::test]
async fn feed_paginates_with_camel_case_page_size() {
    let db = setup_test_db().await.unwrap();
    for hours in 0..3 {
        insert_canonical_story(&db, &format!("Story {}", hours), Some("ranked"), Some(3), hours)
            .await
            .unwrap();
    }
    let app = test_app(test_config(), db).unwrap();

    let (status, body) = send(&app, get("/api/news/feed/?page=1&pageSize=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["hasMore"], true);

    let (_, body) = send(&app, get("/api/news/feed/?page=2&pageSize=2")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["hasMore"], false);

    let (status, _) = send(&app, get("/api/news/feed/?pageSize=51")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn story_mutations_require_admin_token() {
    let db = setup_test_db().await.unwrap();
    let story = insert_canonical_story(&db, "Story", None, None, 0).await.unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, _) = send(
        &app,
        json_request("POST", "/api/news/canonical-stories/", &json!({"title": "New"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let uri = format!("/api/news/canonical-stories/{}/", story.id);
    let (status, _) = send(&app, json_request("DELETE", &uri, &json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Story");
}

#[tokio::test]
async fn canonical_story_crud() {
    let db = setup_test_db().await.unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, created) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/news/canonical-stories/",
            &json!({
                "title": "Model release",
                "summary": "A new model",
                "event_time": "2025-06-01T12:00:00Z",
                "rank": 3,
                "status": "ranked"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_noteworthy"], false);
    assert_eq!(created["captured_stories_count"], 0);
    let uri = format!("/api/news/canonical-stories/{}/", created["id"]);

    let (status, updated) = send(
        &app,
        admin_json_request("PUT", &uri, &json!({"title": "Model release v2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Model release v2");
    assert!(updated["rank"].is_null());
    assert!(updated["status"].is_null());

    let (status, body) = send(
        &app,
        admin_json_request("PUT", &uri, &json!({"summary": "no title"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Title is required");

    let (status, _) = send(&app, admin_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, admin_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_canonical_story_keeps_captured_stories_unlinked() {
    let db = setup_test_db().await.unwrap();
    let story = insert_canonical_story(&db, "Story", Some("ranked"), Some(3), 0)
        .await
        .unwrap();
    let captured = insert_captured_story(&db, Some(story.id), "hn", "https://news.example/a", 1)
        .await
        .unwrap();
    let app = test_app(test_config(), db).unwrap();

    let captured_uri = format!("/api/news/captured-stories/{}/", captured.id);
    let (_, body) = send(&app, get(&captured_uri)).await;
    assert_eq!(body["canonical_story"], story.id);
    assert_eq!(body["canonical_story_title"], "Story");

    let (status, _) = send(
        &app,
        admin_request("DELETE", &format!("/api/news/canonical-stories/{}/", story.id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, get(&captured_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["canonical_story"].is_null());
    assert!(body["canonical_story_title"].is_null());
}

#[tokio::test]
async fn captured_story_requires_existing_canonical_story() {
    let db = setup_test_db().await.unwrap();
    let story = insert_canonical_story(&db, "Story", None, None, 0).await.unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, body) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/news/captured-stories/",
            &json!({"canonical_story": 9999, "title": "T", "url": "https://x.example", "source": "hn"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Canonical story does not exist");

    let (status, body) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/news/captured-stories/",
            &json!({"canonical_story": story.id, "title": "T", "source": "hn"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Url is required");

    let (status, body) = send(
        &app,
        admin_json_request(
            "POST",
            "/api/news/captured-stories/",
            &json!({"canonical_story": story.id, "title": "T", "url": "https://x.example", "source": "hn"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["canonical_story_title"], "Story");

    let (_, list) = send(
        &app,
        get(&format!("/api/news/captured-stories/?canonical_story={}", story.id)),
    )
    .await;
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn noteworthy_sends_story_to_reading_list_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pages"))
        .and(header("authorization", "Bearer notion-key"))
        .and(body_partial_json(json!({
            "parent": {"database_id": "reading-list-db"},
            "properties": {
                "Name": {"title": [{"text": {"content": "Big launch"}}]},
                "URL": {"url": "https://reddit.example/b"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "notion-page-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    let story = insert_canonical_story(&db, "Big launch", Some("ranked"), Some(3), 0)
        .await
        .unwrap();
    insert_captured_story(&db, Some(story.id), "hn", "https://news.example/a", 30)
        .await
        .unwrap();
    insert_captured_story(&db, Some(story.id), "reddit", "https://reddit.example/b", 5)
        .await
        .unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();
    let uri = format!("/api/news/canonical-stories/{}/noteworthy/", story.id);

    let (status, _) = send(&app, json_request("POST", &uri, &json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, admin_request("POST", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_noteworthy"], true);
    assert_eq!(body["notion_page_id"], "notion-page-1");

    let (status, body) = send(&app, admin_request("POST", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notion_page_id"], "notion-page-1");
}

#[tokio::test]
async fn noteworthy_failure_leaves_story_unflagged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "bad property"})))
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    let story = insert_canonical_story(&db, "Story", None, None, 0).await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, body) = send(
        &app,
        admin_request("POST", &format!("/api/news/canonical-stories/{}/noteworthy/", story.id)),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains("bad property"));

    let (_, body) = send(&app, get(&format!("/api/news/canonical-stories/{}/", story.id))).await;
    assert_eq!(body["is_noteworthy"], false);
    assert!(body["notion_page_id"].is_null());
}
