//! Integration tests for the control API endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Queued actions are drained and performed by hand
//! to stand in for the simulation thread.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;
use warden_api::{AppState, AuthGate, build_router};
use warden_core::queue::{ActionReceiver, action_queue};
use warden_core::registry::StateRegistry;
use warden_core::sandbox::SandboxWorld;
use warden_types::{AdminAction, PlayerId};

struct Harness {
    _dir: tempfile::TempDir,
    world: Arc<SandboxWorld>,
    state: Arc<AppState>,
    receiver: ActionReceiver,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let world = Arc::new(SandboxWorld::new());
        let registry = Arc::new(StateRegistry::new(world.clone()));
        let (queue, receiver) = action_queue(16);
        let auth = Arc::new(AuthGate::load(dir.path().join("warden_api_key.txt")));
        let state = Arc::new(AppState::new(registry, queue, auth));
        Self {
            _dir: dir,
            world,
            state,
            receiver,
        }
    }

    fn join(&self, name: &str) -> PlayerId {
        let id = PlayerId::from_name(name);
        self.state
            .registry
            .on_join(self.world.spawn(id, name), Some(String::from("127.0.0.1")));
        id
    }

    /// Run everything queued, as the simulation thread would.
    fn run_queued(&mut self) -> usize {
        let batch = self.receiver.drain(usize::MAX);
        for scheduled in &batch {
            self.state.registry.perform(scheduled);
        }
        batch.len()
    }

    async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = build_router(Arc::clone(&self.state))
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(request).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, form: &str) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_owned()))
            .unwrap();
        self.send(request).await
    }
}

// =========================================================================
// Auth bootstrap
// =========================================================================

#[tokio::test]
async fn auth_bootstrap_generates_key_once() {
    let harness = Harness::new();

    let (status, json) = harness.get("/api/auth/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["initialized"], false);

    let (status, json) = harness.post_form("/api/auth/init", "").await;
    assert_eq!(status, StatusCode::OK);
    let key = json["key"].as_str().unwrap();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));

    let (_, json) = harness.get("/api/auth/status").await;
    assert_eq!(json["initialized"], true);

    let (status, _) = harness.post_form("/api/auth/init", "").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn auth_init_rejects_short_key() {
    let harness = Harness::new();
    let (status, json) = harness.post_form("/api/auth/init", "key=short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "key_too_short");

    let (_, json) = harness.get("/api/auth/status").await;
    assert_eq!(json["initialized"], false);
}

#[tokio::test]
async fn endpoints_are_open_until_initialized() {
    let harness = Harness::new();
    let (status, _) = harness.get("/api/players").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn gated_endpoints_require_secret_after_init() {
    let harness = Harness::new();
    let (_, json) = harness.post_form("/api/auth/init", "key=correct-horse").await;
    assert_eq!(json["key"], "correct-horse");

    let (status, json) = harness.get("/api/players").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");

    let wrong = Request::get("/api/players")
        .header("X-Auth-Key", "correct-horse!")
        .body(Body::empty())
        .unwrap();
    assert_eq!(harness.send(wrong).await.0, StatusCode::UNAUTHORIZED);

    let by_header = Request::get("/api/players")
        .header("X-Auth-Key", "correct-horse")
        .body(Body::empty())
        .unwrap();
    assert_eq!(harness.send(by_header).await.0, StatusCode::OK);

    let by_cookie = Request::get("/api/players")
        .header(header::COOKIE, "warden_key=correct-horse")
        .body(Body::empty())
        .unwrap();
    assert_eq!(harness.send(by_cookie).await.0, StatusCode::OK);

    // Status stays open.
    let (status, _) = harness.get("/api/auth/status").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn error_bodies_are_exact() {
    let harness = Harness::new();
    let short = Request::post("/api/auth/init")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("key=short"))
        .unwrap();
    let (status, body) = harness.send_raw(short).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.as_ref(), br#"{"error":"key_too_short"}"#);

    harness.post_form("/api/auth/init", "key=correct-horse").await;
    let anonymous = Request::get("/api/players").body(Body::empty()).unwrap();
    let (status, body) = harness.send_raw(anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.as_ref(), br#"{"error":"unauthorized"}"#);
}

// =========================================================================
// Player reads
// =========================================================================

#[tokio::test]
async fn list_players_splits_online_and_offline() {
    let harness = Harness::new();
    harness.join("Zed");
    let alex = harness.join("Alex");
    harness.state.registry.on_leave(alex);
    harness.join("Bob");

    let (status, json) = harness.get("/api/players").await;
    assert_eq!(status, StatusCode::OK);
    let online: Vec<&str> = json["online"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["username"].as_str().unwrap())
        .collect();
    assert_eq!(online, vec!["Bob", "Zed"]);
    let offline = json["offline"].as_array().unwrap();
    assert_eq!(offline.len(), 1);
    assert_eq!(offline.first().unwrap()["username"], "Alex");
    assert_eq!(offline.first().unwrap()["online"], false);
}

#[tokio::test]
async fn get_player_returns_external_shape() {
    let harness = Harness::new();
    let id = harness.join("Steve");

    let (status, json) = harness.get(&format!("/api/player/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["uuid"], id.to_string());
    assert_eq!(json["username"], "Steve");
    assert_eq!(json["online"], true);
    assert_eq!(json["gameMode"], "survival");
    assert_eq!(json["dimension"], "minecraft:overworld");
    assert_eq!(json["frozen"], false);
    assert!(json["healthPercentage"].is_number());
    assert_eq!(json["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(json["sessions"][0]["ip"], "127.0.0.1");
    assert!(json["sessions"][0].get("end").is_none());
}

#[tokio::test]
async fn get_player_unknown_and_malformed() {
    let harness = Harness::new();
    let unknown = PlayerId::from_name("Nobody");
    let (status, json) = harness.get(&format!("/api/player/{unknown}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({}));

    let (status, _) = harness.get("/api/player/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_carry_cors_header() {
    let harness = Harness::new();
    let request = Request::get("/api/auth/status")
        .header(header::ORIGIN, "http://dashboard.local")
        .body(Body::empty())
        .unwrap();
    let response = build_router(Arc::clone(&harness.state))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

// =========================================================================
// Actions
// =========================================================================

#[tokio::test]
async fn teleport_online_player_is_queued_then_applied() {
    let mut harness = Harness::new();
    let id = harness.join("Steve");

    let (status, json) = harness
        .post_form("/api/action/teleport", &format!("uuid={id}&x=10&y=65&z=-5"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    // Accepted, not yet run.
    assert!(harness.world.calls().iter().all(|c| c.operation != "teleport"));

    assert_eq!(harness.run_queued(), 1);
    let location = harness.world.player_state(id).unwrap().location;
    assert!((location.x - 10.0).abs() < 1e-9);
    assert!((location.y - 65.0).abs() < 1e-9);
    assert!((location.z + 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn action_on_offline_player_fails_without_capability_call() {
    let mut harness = Harness::new();
    let id = harness.join("Steve");
    harness.state.registry.on_leave(id);
    harness.world.despawn(id);
    harness.world.clear_calls();

    let (status, json) = harness
        .post_form("/api/action/teleport", &format!("uuid={id}&x=10&y=65&z=-5"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(harness.run_queued(), 0);
    assert!(harness.world.calls().is_empty());
}

#[tokio::test]
async fn note_works_for_offline_player() {
    let mut harness = Harness::new();
    let id = PlayerId::from_name("Ghost");

    let (_, json) = harness
        .post_form("/api/action/setnote", &format!("uuid={id}&note=watch+this+one"))
        .await;
    assert_eq!(json["success"], true);
    harness.run_queued();
    assert_eq!(
        harness.state.registry.get_note(id).as_deref(),
        Some("watch this one")
    );
}

#[tokio::test]
async fn unknown_effect_fails_without_effect_call() {
    let mut harness = Harness::new();
    let id = harness.join("Steve");
    harness.world.clear_calls();

    let (status, json) = harness
        .post_form("/api/action/effect", &format!("uuid={id}&effect=superspeed"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(harness.run_queued(), 0);
    assert!(harness.world.calls().iter().all(|c| c.operation != "apply_effect"));
}

#[tokio::test]
async fn effect_defaults_are_applied() {
    let mut harness = Harness::new();
    let id = harness.join("Steve");

    let (_, json) = harness
        .post_form("/api/action/effect", &format!("uuid={id}"))
        .await;
    assert_eq!(json["success"], true);

    let batch = harness.receiver.drain(usize::MAX);
    assert_eq!(
        batch.first().unwrap().action,
        AdminAction::ApplyEffect {
            effect: String::from("speed"),
            duration_seconds: 60,
            amplifier: 0,
        }
    );
}

#[tokio::test]
async fn freeze_action_anchors_player() {
    let mut harness = Harness::new();
    let id = harness.join("Steve");

    let (_, json) = harness
        .post_form("/api/action/freeze", &format!("uuid={id}"))
        .await;
    assert_eq!(json["success"], true);
    harness.run_queued();
    assert!(harness.state.registry.is_frozen(id));

    let (_, json) = harness.get(&format!("/api/player/{id}")).await;
    assert_eq!(json["frozen"], true);
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let harness = Harness::new();
    let id = harness.join("Steve");

    let (status, _) = harness.post_form("/api/action/heal", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.post_form("/api/action/heal", "uuid=garbage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = harness
        .post_form("/api/action/explode", &format!("uuid={id}"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("explode"));

    let (status, _) = harness.get("/api/action/heal").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn full_queue_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let world = Arc::new(SandboxWorld::new());
    let registry = Arc::new(StateRegistry::new(world.clone()));
    let (queue, _receiver) = action_queue(1);
    let auth = Arc::new(AuthGate::load(dir.path().join("key.txt")));
    let state = Arc::new(AppState::new(Arc::clone(&registry), queue, auth));

    let id = PlayerId::from_name("Steve");
    registry.on_join(world.spawn(id, "Steve"), None);

    let mut results = Vec::new();
    for _ in 0..2 {
        let request = Request::post("/api/action/heal")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("uuid={id}")))
            .unwrap();
        let response = build_router(Arc::clone(&state)).oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        results.push(json["success"].as_bool().unwrap());
    }
    assert_eq!(results, vec![true, false]);
}
