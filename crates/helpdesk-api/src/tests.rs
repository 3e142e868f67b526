//! Router tests over an in-memory SQLite store.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use helpdesk_core::{
  store::TicketStore,
  ticket::{Ticket, TicketDocument, TicketStatus},
  tier::Tier,
  user::{Role, User},
};
use helpdesk_engine::Engine;
use helpdesk_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, router};

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let users = vec![
    User::new("u1", "Uma", Role::EmployeeL1),
    User::new("u2", "Vic", Role::EmployeeL2),
    User::new("c1", "Cleo", Role::Client),
  ];
  for u in &users {
    store.put_user(u.clone()).await.unwrap();
  }

  AppState {
    engine: Arc::new(Engine::initialize(Vec::new(), users)),
    store:  Arc::new(store),
  }
}

async fn call<S>(
  state:  &AppState<S>,
  method: &str,
  uri:    &str,
  body:   Option<Value>,
) -> (StatusCode, Value)
where
  S: TicketStore + Clone + 'static,
{
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn submit(state: &AppState<SqliteStore>) -> String {
  let (status, body) = call(
    state,
    "POST",
    "/tickets",
    Some(json!({ "client_id": "c1", "title": "Email bounced", "severity": "high" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["success"], true);
  body["ticket"]["ticket_id"].as_str().unwrap().to_owned()
}

/// Wraps a [`SqliteStore`], optionally holding back or failing ticket
/// write-backs.
#[derive(Clone)]
struct FlakyStore {
  inner:       SqliteStore,
  delay_next:  Arc<AtomicBool>,
  fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
  fn over(inner: &SqliteStore) -> Self {
    Self {
      inner:       inner.clone(),
      delay_next:  Arc::new(AtomicBool::new(false)),
      fail_writes: Arc::new(AtomicBool::new(false)),
    }
  }
}

impl TicketStore for FlakyStore {
  type Error = helpdesk_store_sqlite::Error;

  async fn load_tickets(&self) -> Result<Vec<TicketDocument>, Self::Error> {
    self.inner.load_tickets().await
  }

  async fn load_users(&self) -> Result<Vec<User>, Self::Error> {
    self.inner.load_users().await
  }

  async fn get_ticket(&self, ticket_id: String) -> Result<Option<TicketDocument>, Self::Error> {
    self.inner.get_ticket(ticket_id).await
  }

  async fn put_ticket(&self, ticket: Ticket) -> Result<(), Self::Error> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(helpdesk_store_sqlite::Error::Corrupt {
        table:   "tickets",
        message: "disk full".into(),
      });
    }
    if self.delay_next.swap(false, Ordering::SeqCst) {
      tokio::time::sleep(Duration::from_millis(200)).await;
    }
    self.inner.put_ticket(ticket).await
  }

  async fn put_user(&self, user: User) -> Result<(), Self::Error> {
    self.inner.put_user(user).await
  }
}

/// Shares `base`'s engine but writes back through a [`FlakyStore`].
fn flaky(base: &AppState<SqliteStore>) -> AppState<FlakyStore> {
  AppState {
    engine: Arc::clone(&base.engine),
    store:  Arc::new(FlakyStore::over(&base.store)),
  }
}

#[tokio::test]
async fn submit_then_claim_persists_to_store() {
  let state = make_state().await;
  let id = submit(&state).await;

  let (status, body) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/claim"),
    Some(json!({ "user_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Ticket claimed");
  assert_eq!(body["ticket"]["assigned_to"], "u1");

  let stored = state.store.get_ticket(id).await.unwrap().unwrap().into_ticket();
  assert_eq!(stored.status, TicketStatus::Open);
  assert_eq!(stored.activity_log.len(), 2);
}

#[tokio::test]
async fn second_claim_is_conflict() {
  let state = make_state().await;
  let id = submit(&state).await;
  let uri = format!("/tickets/{id}/claim");

  call(&state, "POST", &uri, Some(json!({ "user_id": "u1" }))).await;
  let (status, body) = call(&state, "POST", &uri, Some(json!({ "user_id": "u1" }))).await;

  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);
  assert_eq!(body["error"], "not_available");
}

#[tokio::test]
async fn failure_kinds_map_to_statuses() {
  let state = make_state().await;
  let id = submit(&state).await;

  let (status, _) = call(
    &state,
    "POST",
    "/tickets/nope/claim",
    Some(json!({ "user_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/claim"),
    Some(json!({ "user_id": "u2" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "wrong_level");

  let (status, _) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/start"),
    Some(json!({ "user_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/escalate"),
    Some(json!({ "user_id": "u2", "target_level": "l2" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "invalid_escalation");
}

#[tokio::test]
async fn escalation_moves_ticket_between_queues() {
  let state = make_state().await;
  let id = submit(&state).await;

  let (_, l1) = call(&state, "GET", "/queue/l1", None).await;
  assert_eq!(l1.as_array().unwrap().len(), 1);

  let (status, body) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/escalate"),
    Some(json!({ "user_id": "u1", "target_level": "l2", "reason": "needs DB access" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Ticket escalated to L2");
  assert_eq!(body["ticket"]["current_level"], "l2");

  let (_, l1) = call(&state, "GET", "/queue/l1", None).await;
  assert!(l1.as_array().unwrap().is_empty());
  let (_, l2) = call(&state, "GET", "/queue/L2", None).await;
  assert_eq!(l2.as_array().unwrap().len(), 1);

  let stored = state.store.get_ticket(id).await.unwrap().unwrap().into_ticket();
  assert_eq!(stored.current_level, Tier::L2);
  assert_eq!(stored.escalation_history.len(), 1);
}

#[tokio::test]
async fn full_flow_over_http() {
  let state = make_state().await;
  let id = submit(&state).await;
  let post = |path: &'static str, body: Value| {
    let state = state.clone();
    let uri = format!("/tickets/{id}/{path}");
    async move { call(&state, "POST", &uri, Some(body)).await }
  };

  assert_eq!(post("claim", json!({ "user_id": "u1" })).await.0, StatusCode::OK);
  assert_eq!(post("start", json!({ "user_id": "u1" })).await.0, StatusCode::OK);
  let (status, body) = post("resolve", json!({ "user_id": "u1", "notes": "reset MX" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ticket"]["status"], "resolved");
  let (status, body) = post("close", json!({ "user_id": "c1" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ticket"]["status"], "closed");

  let (_, mine) = call(&state, "GET", "/clients/c1/tickets", None).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);
  let (_, assigned) = call(&state, "GET", "/staff/u1/tickets", None).await;
  assert!(assigned.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn patch_updates_fields() {
  let state = make_state().await;
  let id = submit(&state).await;

  let (status, body) = call(
    &state,
    "PATCH",
    &format!("/tickets/{id}"),
    Some(json!({ "user_id": "u1", "severity": "critical" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ticket"]["severity"], "critical");
  assert_eq!(body["ticket"]["client_notifications"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bad_inputs() {
  let state = make_state().await;

  let (status, _) = call(&state, "GET", "/queue/l9", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&state, "GET", "/tickets/missing", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(
    &state,
    "POST",
    "/tickets",
    Some(json!({ "client_id": "c1", "title": "   " })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = call(
    &state,
    "POST",
    "/tickets",
    Some(json!({ "client_id": "ghost", "title": "Hi" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "user_not_found");
}

#[tokio::test]
async fn late_write_back_does_not_regress_store() {
  let base = make_state().await;
  let id = submit(&base).await;
  let state = flaky(&base);
  state.store.delay_next.store(true, Ordering::SeqCst);

  let claim = {
    let state = state.clone();
    let uri = format!("/tickets/{id}/claim");
    tokio::spawn(async move { call(&state, "POST", &uri, Some(json!({ "user_id": "u1" }))).await })
  };
  while base.engine.ticket(&id).unwrap().assigned_to.is_none() {
    tokio::task::yield_now().await;
  }

  let (status, _) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/start"),
    Some(json!({ "user_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = claim.await.unwrap();
  assert_eq!(status, StatusCode::OK);

  let stored = base.store.get_ticket(id.clone()).await.unwrap().unwrap().into_ticket();
  assert_eq!(stored.status, TicketStatus::InProgress);
  assert_eq!(stored, base.engine.ticket(&id).unwrap());
}

#[tokio::test]
async fn failed_write_back_reports_applied_ticket() {
  let base = make_state().await;
  let id = submit(&base).await;
  let state = flaky(&base);
  state.store.fail_writes.store(true, Ordering::SeqCst);

  let (status, body) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/claim"),
    Some(json!({ "user_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["applied"], true);
  assert_eq!(body["ticket"]["assigned_to"], "u1");

  let stored = base.store.get_ticket(id.clone()).await.unwrap().unwrap().into_ticket();
  assert_eq!(stored.status, TicketStatus::Unassigned);

  // The next successful command carries the missed state with it.
  state.store.fail_writes.store(false, Ordering::SeqCst);
  let (status, _) = call(
    &state,
    "POST",
    &format!("/tickets/{id}/start"),
    Some(json!({ "user_id": "u1" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let stored = base.store.get_ticket(id.clone()).await.unwrap().unwrap().into_ticket();
  assert_eq!(stored, base.engine.ticket(&id).unwrap());
}

#[tokio::test]
async fn supplied_ticket_id_is_kept_and_duplicates_conflict() {
  let state = make_state().await;
  let body = json!({ "ticket_id": "HD-7", "client_id": "c1", "title": "Badge reader" });

  let (status, created) = call(&state, "POST", "/tickets", Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["ticket"]["ticket_id"], "HD-7");

  let (status, dup) = call(&state, "POST", "/tickets", Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(dup["error"], "ticket_exists");
}
