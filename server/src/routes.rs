use crate::auth::AdminUser;
use crate::backend::AdminBackend;
use crate::error::{ServerError, ServerResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use hub_api::bracket::{BracketGroup, group_matches};
use hub_api::standings::{TeamStanding, compute_standings, standings_by_group};
use hub_api::{MatchUpdate, ReviewStatus, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn AdminBackend>,
}

impl AppState {
    pub fn new(backend: impl AdminBackend + 'static) -> Self {
        Self { backend: Arc::new(backend) }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

fn ack(message: impl Into<String>) -> Json<Ack> {
    Json(Ack { success: true, message: message.into() })
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStandings {
    pub group: String,
    pub standings: Vec<TeamStanding>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    pub event_id: String,
    pub event_name: String,
    pub standings: Vec<TeamStanding>,
    pub groups: Vec<GroupStandings>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketResponse {
    pub event_id: String,
    pub event_name: String,
    pub groups: Vec<BracketGroup>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/users/{uid}/role", put(set_user_role))
        .route("/api/teams/{id}/approve", post(approve_team))
        .route("/api/teams/{id}/reject", post(reject_team))
        .route("/api/matches/{id}", put(update_match))
        .route("/api/chat/{id}", delete(delete_chat_message))
        .route("/api/registrations/{id}/approve", post(approve_registration))
        .route("/api/registrations/{id}/reject", post(reject_registration))
        .route("/api/events/{id}/standings", get(event_standings))
        .route("/api/events/{id}/bracket", get(event_bracket))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

async fn health() -> Json<Ack> {
    ack("ok")
}

async fn set_user_role(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    payload: Result<Json<RoleBody>, JsonRejection>,
) -> ServerResult<Json<Ack>> {
    let role = match body(payload)?.role.trim().to_ascii_lowercase().as_str() {
        "admin" => Role::Admin,
        "user" => Role::User,
        other => return Err(ServerError::BadRequest(format!("unknown role {other:?}"))),
    };
    state.backend.set_user_role(&admin.token, &uid, role).await?;
    tracing::info!(by = %admin.uid, %uid, ?role, "role updated");
    Ok(ack(format!("user {uid} is now {}", if role == Role::Admin { "admin" } else { "user" })))
}

async fn review_team(state: &AppState, admin: &AdminUser, id: &str, status: ReviewStatus) -> ServerResult<Json<Ack>> {
    state.backend.set_team_status(&admin.token, id, status).await?;
    tracing::info!(by = %admin.uid, team = %id, status = status.label(), "team reviewed");
    Ok(ack(format!("team {id} {}", status.label())))
}

async fn approve_team(admin: AdminUser, State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Json<Ack>> {
    review_team(&state, &admin, &id, ReviewStatus::Approved).await
}

async fn reject_team(admin: AdminUser, State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Json<Ack>> {
    review_team(&state, &admin, &id, ReviewStatus::Rejected).await
}

async fn update_match(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MatchUpdate>, JsonRejection>,
) -> ServerResult<Json<Ack>> {
    let update = body(payload)?;
    if update.is_empty() {
        return Err(ServerError::BadRequest("provide scoreA, scoreB or status".into()));
    }
    state.backend.update_match(&admin.token, &id, &update).await?;
    tracing::info!(by = %admin.uid, match_id = %id, ?update, "match updated");
    Ok(ack(format!("match {id} updated")))
}

async fn delete_chat_message(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Ack>> {
    state.backend.delete_chat_message(&admin.token, &id).await?;
    tracing::info!(by = %admin.uid, message = %id, "chat message deleted");
    Ok(ack(format!("message {id} deleted")))
}

async fn review_registration(
    state: &AppState,
    admin: &AdminUser,
    id: &str,
    decision: ReviewStatus,
) -> ServerResult<Json<Ack>> {
    state.backend.review_registration(&admin.token, id, decision).await?;
    tracing::info!(by = %admin.uid, registration = %id, decision = decision.label(), "registration reviewed");
    Ok(ack(format!("registration {id} {}", decision.label())))
}

async fn approve_registration(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Ack>> {
    review_registration(&state, &admin, &id, ReviewStatus::Approved).await
}

async fn reject_registration(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Ack>> {
    review_registration(&state, &admin, &id, ReviewStatus::Rejected).await
}

async fn event_standings(State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Json<StandingsResponse>> {
    let event = state.backend.event(&id).await?;
    let matches = state.backend.event_matches(&id).await?;
    let groups = standings_by_group(&matches)
        .into_iter()
        .map(|(group, standings)| GroupStandings { group, standings })
        .collect();
    Ok(Json(StandingsResponse {
        event_id: id,
        event_name: event.name,
        standings: compute_standings(&matches),
        groups,
    }))
}

async fn event_bracket(State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Json<BracketResponse>> {
    let event = state.backend.event(&id).await?;
    let matches = state.backend.event_matches(&id).await?;
    Ok(Json(BracketResponse {
        event_id: id,
        event_name: event.name,
        groups: group_matches(&matches),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use hub_api::client::{ApiError, ApiResult, AuthAccount};
    use hub_api::{Event, Match, MatchStatus, UserProfile};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn existing(id: &str, what: &str) -> ApiResult<()> {
            if id.starts_with("missing") {
                Err(ApiError::NotFound(format!("{what}/{id}")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl AdminBackend for FakeBackend {
        async fn verify_token(&self, token: &str) -> ApiResult<AuthAccount> {
            let uid = match token {
                "admin-tok" => "boss",
                "user-tok" => "fan",
                _ => return Err(ApiError::Unauthorized("INVALID_ID_TOKEN".into())),
            };
            Ok(AuthAccount { uid: uid.into(), ..AuthAccount::default() })
        }

        async fn user_profile(&self, uid: &str) -> ApiResult<Option<UserProfile>> {
            let role = if uid == "boss" { Role::Admin } else { Role::User };
            Ok(Some(UserProfile { id: uid.into(), role, ..UserProfile::default() }))
        }

        async fn set_user_role(&self, token: &str, uid: &str, role: Role) -> ApiResult<()> {
            Self::existing(uid, "users")?;
            self.record(format!("role {uid} {role:?} {token}"));
            Ok(())
        }

        async fn set_team_status(&self, _token: &str, team_id: &str, status: ReviewStatus) -> ApiResult<()> {
            Self::existing(team_id, "teams")?;
            self.record(format!("team {team_id} {}", status.label()));
            Ok(())
        }

        async fn update_match(&self, _token: &str, match_id: &str, update: &MatchUpdate) -> ApiResult<()> {
            Self::existing(match_id, "matches")?;
            self.record(format!("match {match_id} {:?} {:?} {:?}", update.score_a, update.score_b, update.status));
            Ok(())
        }

        async fn delete_chat_message(&self, _token: &str, message_id: &str) -> ApiResult<()> {
            Self::existing(message_id, "live_chat")?;
            self.record(format!("chat {message_id}"));
            Ok(())
        }

        async fn review_registration(&self, _token: &str, id: &str, decision: ReviewStatus) -> ApiResult<()> {
            Self::existing(id, "registrations")?;
            self.record(format!("registration {id} {}", decision.label()));
            Ok(())
        }

        async fn event(&self, event_id: &str) -> ApiResult<Event> {
            Self::existing(event_id, "events")?;
            Ok(Event { id: event_id.into(), name: "Spring Cup".into(), ..Event::default() })
        }

        async fn event_matches(&self, event_id: &str) -> ApiResult<Vec<Match>> {
            let game = |a: &str, b: &str, sa, sb, round, status| Match {
                event_id: event_id.into(),
                team_a: a.into(),
                team_b: b.into(),
                score_a: sa,
                score_b: sb,
                round,
                status,
                ..Match::default()
            };
            Ok(vec![
                game("Owls", "Foxes", 2, 1, 1, MatchStatus::Completed),
                game("Hawks", "Bears", 0, 0, 1, MatchStatus::Completed),
                game("Owls", "Hawks", 0, 0, 2, MatchStatus::Pending),
            ])
        }
    }

    fn setup() -> (Router, Arc<FakeBackend>) {
        let fake = Arc::new(FakeBackend::default());
        let state = AppState { backend: fake.clone() };
        (app(state), fake)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(router: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (router, _) = setup();
        let (status, body) = call(router, request("GET", "/api/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn writes_require_a_valid_token() {
        let (router, fake) = setup();
        let (status, body) = call(router.clone(), request("POST", "/api/teams/t1/approve", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, body) = call(router, request("POST", "/api/teams/t1/approve", Some("forged"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("INVALID_ID_TOKEN"));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_admins_are_forbidden() {
        let (router, fake) = setup();
        let (status, _) = call(router, request("DELETE", "/api/chat/c1", Some("user-tok"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_can_review_teams_and_registrations() {
        let (router, fake) = setup();
        for uri in [
            "/api/teams/t1/approve",
            "/api/teams/t2/reject",
            "/api/registrations/r1/approve",
            "/api/registrations/r2/reject",
        ] {
            let (status, body) = call(router.clone(), request("POST", uri, Some("admin-tok"), None)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["success"], json!(true));
        }
        assert_eq!(
            *fake.calls.lock().unwrap(),
            vec![
                "team t1 approved",
                "team t2 rejected",
                "registration r1 approved",
                "registration r2 rejected",
            ]
        );
    }

    #[tokio::test]
    async fn missing_targets_are_not_found() {
        let (router, _) = setup();
        let (status, body) =
            call(router.clone(), request("POST", "/api/teams/missing-1/approve", Some("admin-tok"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("teams/missing-1"));

        let (status, _) = call(router, request("GET", "/api/events/missing-ev/standings", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn role_updates_validate_the_body() {
        let (router, fake) = setup();
        let (status, _) = call(
            router.clone(),
            request("PUT", "/api/users/fan/role", Some("admin-tok"), Some(json!({ "role": "Admin" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(*fake.calls.lock().unwrap(), vec!["role fan Admin admin-tok"]);

        let (status, _) = call(
            router.clone(),
            request("PUT", "/api/users/fan/role", Some("admin-tok"), Some(json!({ "role": "overlord" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            router,
            request("PUT", "/api/users/fan/role", Some("admin-tok"), Some(json!({ "rank": 1 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn match_update_needs_a_field() {
        let (router, fake) = setup();
        let (status, _) =
            call(router.clone(), request("PUT", "/api/matches/m1", Some("admin-tok"), Some(json!({})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            router,
            request(
                "PUT",
                "/api/matches/m1",
                Some("admin-tok"),
                Some(json!({ "scoreA": 3, "status": "finished" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(*fake.calls.lock().unwrap(), vec!["match m1 Some(3) None Some(Completed)"]);
    }

    #[tokio::test]
    async fn match_update_rejects_unknown_status() {
        let (router, fake) = setup();
        let (status, body) = call(
            router,
            request("PUT", "/api/matches/m1", Some("admin-tok"), Some(json!({ "status": "complete" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("complete"));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn standings_are_public_and_ranked() {
        let (router, _) = setup();
        let (status, body) = call(router, request("GET", "/api/events/spring/standings", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["eventName"], json!("Spring Cup"));
        let teams: Vec<&str> = body["standings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["team"].as_str().unwrap())
            .collect();
        assert_eq!(teams, vec!["Owls", "Hawks", "Bears", "Foxes"]);
        assert_eq!(body["standings"][0]["points"], json!(3));
        assert_eq!(body["standings"][3]["goalDifference"], json!(-1));
        assert_eq!(body["groups"][0]["group"], json!("Main Bracket"));
    }

    #[tokio::test]
    async fn bracket_lists_labelled_rounds() {
        let (router, _) = setup();
        let (status, body) = call(router, request("GET", "/api/events/spring/bracket", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        let rounds = body["groups"][0]["rounds"].as_array().unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0]["label"], json!("Semi-Finals"));
        assert_eq!(rounds[1]["label"], json!("Finals"));
        assert_eq!(rounds[0]["matches"].as_array().unwrap().len(), 2);
    }
}
