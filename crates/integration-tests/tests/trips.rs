mod harness;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use harness::config::ConfigBuilder;
use harness::server::TestServer;
use wayfarer_server::trips::{TRIPS_CHANNEL, TripEvent};

fn draft(destination: &str) -> serde_json::Value {
    serde_json::json!({
        "title": format!("Week in {destination}"),
        "destination": destination,
        "startDate": "2026-06-01",
        "endDate": "2026-06-07",
        "budget": 1200.5,
        "interests": ["food"],
        "isPublic": true
    })
}

#[tokio::test]
async fn drafts_round_trip_and_announce_changes() {
    let server = TestServer::start(ConfigBuilder::new().build()).await.unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    server
        .cache()
        .subscribe(TRIPS_CHANNEL, move |event: TripEvent| sink.lock().unwrap().push(event))
        .await;

    let resp = server
        .client()
        .put(server.url("/api/v1/trips/42"))
        .json(&draft("Paris"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server.client().get(server.url("/api/v1/trips/42")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "42");
    assert_eq!(body["destination"], "Paris");
    assert_eq!(body["isPublic"], true);

    let resp = server
        .client()
        .delete(server.url("/api/v1/trips/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = server.client().get(server.url("/api/v1/trips/42")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Trip not found");

    assert_eq!(
        *events.lock().unwrap(),
        [
            TripEvent::Updated { id: "42".to_owned() },
            TripEvent::Deleted { id: "42".to_owned() },
        ]
    );
}

#[tokio::test]
async fn clearing_drafts_leaves_other_keys() {
    let server = TestServer::start(ConfigBuilder::new().build()).await.unwrap();
    server.cache().set("session:1", "alive", Some(Duration::from_secs(60))).await;

    for (id, city) in [("1", "Rome"), ("2", "Oslo")] {
        let resp = server
            .client()
            .put(server.url(&format!("/api/v1/trips/{id}")))
            .json(&draft(city))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = server.client().delete(server.url("/api/v1/trips")).send().await.unwrap();
    assert_eq!(resp.status(), 204);

    for id in ["1", "2"] {
        let resp = server
            .client()
            .get(server.url(&format!("/api/v1/trips/{id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }
    assert_eq!(
        server.cache().get::<String>("session:1").await.as_deref(),
        Some("alive")
    );
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let server = TestServer::start(ConfigBuilder::new().build()).await.unwrap();

    let resp = server
        .client()
        .put(server.url("/api/v1/trips/42"))
        .header("content-type", "application/json")
        .body("{\"title\": \"unterminated")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
