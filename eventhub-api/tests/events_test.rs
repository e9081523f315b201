/// Integration tests for the event endpoints

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_create_and_fetch_event() {
    let ctx = TestContext::new();
    let (organizer, token) = ctx.user("Ann", "ann@x.com").await;

    let event = ctx.event(&token, Some(10)).await;
    assert_eq!(event["organizer"], organizer.as_str());
    assert_eq!(event["attendees"], json!([]));
    assert_eq!(event["maxAttendees"], 10);
    assert_eq!(event["image"], serde_json::Value::Null);

    let id = event["_id"].as_str().unwrap();
    let (status, body) = ctx
        .send("GET", &format!("/api/events/{}", id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"], event);

    let (status, body) = ctx.send("GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_event() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            "GET",
            "/api/events/8c1d5a0e-2f0e-4a59-9b1a-6d0f1b2c3d4e",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");

    let (status, _) = ctx.send("GET", "/api/events/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_event_validation() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("Ann", "ann@x.com").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/events",
            Some(&token),
            Some(json!({
                "title": "   ",
                "description": "Talks",
                "category": "Tech",
                "date": "2026-11-05T18:00:00Z",
                "location": "Library",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a title");

    let (status, _) = ctx
        .send(
            "POST",
            "/api/events",
            Some(&token),
            Some(json!({
                "title": "Meetup",
                "description": "Talks",
                "category": "Tech",
                "date": "2026-11-05T18:00:00Z",
                "location": "Library",
                "maxAttendees": 0,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_and_leave() {
    let ctx = TestContext::new();
    let (_, organizer) = ctx.user("Ann", "ann@x.com").await;
    let (bob, bob_token) = ctx.user("Bob", "bob@x.com").await;
    let event = ctx.event(&organizer, None).await;
    let id = event["_id"].as_str().unwrap();

    let (status, body) = ctx
        .send("POST", &format!("/api/events/{}/join", id), Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["attendees"], json!([bob]));

    let (status, body) = ctx
        .send("POST", &format!("/api/events/{}/join", id), Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You are already attending this event");

    let (status, body) = ctx
        .send("POST", &format!("/api/events/{}/leave", id), Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["attendees"], json!([]));

    let (status, body) = ctx
        .send("POST", &format!("/api/events/{}/leave", id), Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You are not attending this event");
}

#[tokio::test]
async fn test_join_requires_token() {
    let ctx = TestContext::new();
    let (_, organizer) = ctx.user("Ann", "ann@x.com").await;
    let event = ctx.event(&organizer, None).await;

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/api/events/{}/join", event["_id"].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_organizer_cannot_join() {
    let ctx = TestContext::new();
    let (_, organizer) = ctx.user("Ann", "ann@x.com").await;
    let event = ctx.event(&organizer, None).await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/api/events/{}/join", event["_id"].as_str().unwrap()),
            Some(&organizer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Organizers cannot join their own event");
}

#[tokio::test]
async fn test_full_event_refuses_join() {
    let ctx = TestContext::new();
    let (_, organizer) = ctx.user("Ann", "ann@x.com").await;
    let (_, bob) = ctx.user("Bob", "bob@x.com").await;
    let (_, carol) = ctx.user("Carol", "carol@x.com").await;
    let event = ctx.event(&organizer, Some(1)).await;
    let join = format!("/api/events/{}/join", event["_id"].as_str().unwrap());

    let (status, _) = ctx.send("POST", &join, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.send("POST", &join, Some(&carol), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event is full");

    let (_, body) = ctx
        .send(
            "GET",
            &format!("/api/events/{}", event["_id"].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert_eq!(body["event"]["attendees"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_organizer_can_update_or_delete() {
    let ctx = TestContext::new();
    let (_, organizer) = ctx.user("Ann", "ann@x.com").await;
    let (_, bob) = ctx.user("Bob", "bob@x.com").await;
    let event = ctx.event(&organizer, None).await;
    let uri = format!("/api/events/{}", event["_id"].as_str().unwrap());

    let (status, _) = ctx
        .send("PUT", &uri, Some(&bob), Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(
            "PUT",
            &uri,
            Some(&organizer),
            Some(json!({ "title": "Rust meetup #2", "image": "https://img.example/1.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["title"], "Rust meetup #2");
    assert_eq!(body["event"]["image"], "https://img.example/1.png");
    assert_eq!(body["event"]["location"], "Library");

    let (status, body) = ctx.send("DELETE", &uri, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = ctx.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_capacity_cannot_drop_below_attendees() {
    let ctx = TestContext::new();
    let (_, organizer) = ctx.user("Ann", "ann@x.com").await;
    let (_, bob) = ctx.user("Bob", "bob@x.com").await;
    let (_, carol) = ctx.user("Carol", "carol@x.com").await;
    let event = ctx.event(&organizer, Some(5)).await;
    let uri = format!("/api/events/{}", event["_id"].as_str().unwrap());

    for token in [&bob, &carol] {
        let (status, _) = ctx
            .send("POST", &format!("{}/join", uri), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = ctx
        .send("PUT", &uri, Some(&organizer), Some(json!({ "maxAttendees": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "maxAttendees");

    let (status, body) = ctx
        .send("PUT", &uri, Some(&organizer), Some(json!({ "maxAttendees": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["maxAttendees"], 2);

    let (status, body) = ctx
        .send("PUT", &uri, Some(&organizer), Some(json!({ "maxAttendees": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["maxAttendees"], serde_json::Value::Null);
}
