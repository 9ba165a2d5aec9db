use std::collections::HashMap;
use std::time::Instant;

use axum::{
    debug_handler,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use shared::shared_wheel_game::*;
use shared::RequestError;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::games::wheel_table::{SpinTicket, Table};
use crate::messages::{status_message, SPINNING_MESSAGE};
use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_wheel_layout))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/color", post(select_color))
        .route("/sessions/:id/spin", post(spin_wheel))
        .route("/sessions/:id/reset", post(reset_session_handler))
}

/// Looks up a table and marks it as used.
fn active_table(tables: &mut HashMap<Uuid, Table>, id: Uuid) -> Result<&mut Table, ApiError> {
    let table = tables.get_mut(&id).ok_or(ApiError::SessionNotFound)?;
    table.touch(Instant::now());
    Ok(table)
}

fn session_view(id: Uuid, table: &Table) -> SessionView {
    SessionView {
        session_id: id.to_string(),
        session: table.session().clone(),
        rotation: table.rotation(),
        last_outcome: table.last_outcome().cloned(),
        message: status_message(table.status()),
    }
}

async fn get_wheel_layout(State(state): State<AppState>) -> Json<WheelLayout> {
    let config = &state.config;
    Json(WheelLayout {
        segments: config.segments().colors().to_vec(),
        palette: config.segments().palette(),
        segment_angle: config.segment_angle(),
        extra_rotations: config.extra_rotations(),
        spin_duration_ms: config.spin_duration().as_millis() as u64,
        default_stake: state.settings.default_stake,
        initial_balance: config.initial_balance(),
    })
}

async fn create_session(State(state): State<AppState>) -> Json<SessionView> {
    let mut store = state.store.lock().await;
    let expired = store.cleanup_idle(Instant::now(), state.settings.session_idle);
    if expired > 0 {
        debug!("Dropped {} idle wheel sessions", expired);
    }
    let id = store.open(&state.config);
    info!("🎡 New wheel session {} (open sessions: {})", id, store.tables.len());
    let table = &store.tables[&id];
    Json(session_view(id, table))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let mut store = state.store.lock().await;
    let table = active_table(&mut store.tables, id)?;
    Ok(Json(session_view(id, table)))
}

async fn select_color(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectColorRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let color = request.color.ok_or(RequestError::NoColorSelected)?;
    let mut store = state.store.lock().await;
    let table = active_table(&mut store.tables, id)?;
    table.select_color(&state.config, color)?;
    Ok(Json(session_view(id, table)))
}

#[debug_handler]
async fn spin_wheel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<WheelSpinRequest>,
) -> Result<Json<WheelSpinResponse>, ApiError> {
    let stake = request.stake.ok_or(RequestError::InvalidStake)?;

    let (started, balance) = {
        let mut store = state.store.lock().await;
        let store = &mut *store;
        let table = active_table(&mut store.tables, id)?;
        let started = table.start_spin(&state.config, request.color, &stake, &mut store.rng)?;
        (started, table.session().balance)
    };

    info!(
        "🎡 WHEEL SPIN: session {} staked {} and landed on segment {} ({})",
        id, started.outcome.stake, started.outcome.segment_index, started.outcome.result_color
    );

    schedule_settlement(state.clone(), id, started.ticket);

    Ok(Json(WheelSpinResponse {
        is_win: started.outcome.is_win(),
        outcome: started.outcome,
        balance,
        target_rotation: started.target_rotation,
        spin_duration_ms: state.config.spin_duration().as_millis() as u64,
        message: SPINNING_MESSAGE.to_string(),
    }))
}

#[debug_handler]
async fn reset_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let mut store = state.store.lock().await;
    let table = active_table(&mut store.tables, id)?;
    if table.session().is_spinning {
        info!("Session {} reset with a spin still in flight; abandoning it", id);
    }
    table.reset(&state.config);
    Ok(Json(session_view(id, table)))
}

/// Applies the held outcome once the wheel animation has had time to finish.
fn schedule_settlement(state: AppState, id: Uuid, ticket: SpinTicket) {
    let delay = state.config.spin_duration();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let mut store = state.store.lock().await;
        let Some(table) = store.tables.get_mut(&id) else {
            return;
        };
        match table.settle(ticket) {
            Some(outcome) => {
                if outcome.is_win() {
                    info!("💰 Session {} won {} diamonds, balance {}", id, outcome.stake, table.session().balance);
                } else {
                    info!("Session {} lost {} diamonds, balance {}", id, outcome.stake, table.session().balance);
                }
                if table.is_bankrupt() {
                    schedule_bankrupt_reset(state.clone(), id, table.generation());
                }
            }
            None => debug!("Discarding settlement for abandoned spin on session {}", id),
        }
    });
}

fn schedule_bankrupt_reset(state: AppState, id: Uuid, generation: u64) {
    let delay = state.settings.bankrupt_reset;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let mut store = state.store.lock().await;
        if let Some(table) = store.tables.get_mut(&id) {
            if table.reset_if_bankrupt(&state.config, generation) {
                info!("Session {} ran out of diamonds and was reset", id);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(vars: &[(&str, &str)]) -> AppState {
        let vars: Vec<(String, String)> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let settings = ServerSettings::from_lookup(|key| {
            vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap();
        let config = settings.game.build().unwrap();
        AppState::new(config, settings)
    }

    fn instant_state() -> AppState {
        test_state(&[
            ("ROULETTE_SPIN_DURATION_MS", "0"),
            ("ROULETTE_BANKRUPT_RESET_MS", "0"),
            ("ROULETTE_RNG_SEED", "7"),
        ])
    }

    async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = crate::build_app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn parse<T: DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    async fn open_session(state: &AppState) -> String {
        let (status, body) = call(state, "POST", "/api/wheel/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        parse::<SessionView>(body).session_id
    }

    #[tokio::test]
    async fn test_layout_reports_configured_wheel() {
        let state = instant_state();
        let (status, body) = call(&state, "GET", "/api/wheel/config", None).await;
        assert_eq!(status, StatusCode::OK);
        let layout: WheelLayout = parse(body);
        assert_eq!(layout.segments.len(), 8);
        assert_eq!(layout.segment_angle, 45.0);
        assert_eq!(layout.default_stake, 10);
        assert_eq!(layout.initial_balance, 100);
    }

    #[tokio::test]
    async fn test_new_session_starts_fresh() {
        let state = instant_state();
        let id = open_session(&state).await;
        let (status, body) = call(&state, "GET", &format!("/api/wheel/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let view: SessionView = parse(body);
        assert_eq!(view.session.balance, 100);
        assert!(!view.session.is_spinning);
        assert_eq!(view.message, "Place your stake and choose a color!");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = instant_state();
        let uri = format!("/api/wheel/sessions/{}", Uuid::new_v4());
        let (status, body) = call(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "session_not_found");
    }

    #[tokio::test]
    async fn test_spin_settles_after_delay() {
        let state = instant_state();
        let id = open_session(&state).await;
        let (status, body) = call(&state, "POST", &format!("/api/wheel/sessions/{}/spin", id), Some(json!({ "stake": 10 }))).await;
        assert_eq!(status, StatusCode::OK);
        let spin: WheelSpinResponse = parse(body);
        assert_eq!(spin.balance, 90);
        assert_eq!(spin.message, "Spinning...");
        assert_eq!(spin.target_rotation.rem_euclid(360.0), 45.0 * spin.outcome.segment_index as f64 + 22.5);

        tokio::time::sleep(Duration::from_millis(50)).await;

        let (_, body) = call(&state, "GET", &format!("/api/wheel/sessions/{}", id), None).await;
        let view: SessionView = parse(body);
        assert!(!view.session.is_spinning);
        let expected = if spin.is_win { 110 } else { 90 };
        assert_eq!(view.session.balance, expected);
        assert_eq!(view.last_outcome, Some(spin.outcome));
    }

    #[tokio::test]
    async fn test_second_spin_conflicts_while_in_flight() {
        let state = test_state(&[("ROULETTE_SPIN_DURATION_MS", "60000")]);
        let id = open_session(&state).await;
        let uri = format!("/api/wheel/sessions/{}/spin", id);
        let (status, _) = call(&state, "POST", &uri, Some(json!({ "stake": 10 }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&state, "POST", &uri, Some(json!({ "stake": 10 }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "spin_in_progress");
        assert_eq!(body["message"], "❗ A spin is already in progress.");
    }

    #[tokio::test]
    async fn test_invalid_stakes_leave_balance_alone() {
        let state = instant_state();
        let id = open_session(&state).await;
        let uri = format!("/api/wheel/sessions/{}/spin", id);
        for stake in [json!(0), json!(-4), json!(2.5), json!("ten"), Value::Null] {
            let (status, body) = call(&state, "POST", &uri, Some(json!({ "stake": stake }))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "invalid_stake");
        }
        let (status, body) = call(&state, "POST", &uri, Some(json!({ "stake": 101 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "❗ Cannot bet more than your diamonds.");

        let (_, body) = call(&state, "GET", &format!("/api/wheel/sessions/{}", id), None).await;
        let view: SessionView = parse(body);
        assert_eq!(view.session.balance, 100);
        assert!(!view.session.is_spinning);
    }

    #[tokio::test]
    async fn test_select_color_and_unknown_color() {
        let state = instant_state();
        let id = open_session(&state).await;
        let uri = format!("/api/wheel/sessions/{}/color", id);

        let (status, body) = call(&state, "POST", &uri, Some(json!({ "color": "green" }))).await;
        assert_eq!(status, StatusCode::OK);
        let view: SessionView = parse(body);
        assert_eq!(view.session.chosen_color, Some(shared::Color::green()));
        assert_eq!(view.message, "You selected: GREEN");

        let (status, body) = call(&state, "POST", &uri, Some(json!({ "color": "blue" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown_color");
    }

    #[tokio::test]
    async fn test_spin_without_color_is_rejected() {
        let state = test_state(&[("ROULETTE_DEFAULT_COLOR", "none"), ("ROULETTE_SPIN_DURATION_MS", "0")]);
        let id = open_session(&state).await;
        let (status, body) = call(&state, "POST", &format!("/api/wheel/sessions/{}/spin", id), Some(json!({ "stake": 5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no_color_selected");
    }

    #[tokio::test]
    async fn test_reset_abandons_in_flight_spin() {
        let state = test_state(&[("ROULETTE_SPIN_DURATION_MS", "20")]);
        let id = open_session(&state).await;
        let (status, _) = call(&state, "POST", &format!("/api/wheel/sessions/{}/spin", id), Some(json!({ "stake": 40 }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&state, "POST", &format!("/api/wheel/sessions/{}/reset", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let view: SessionView = parse(body);
        assert_eq!(view.session.balance, 100);
        assert_eq!(view.message, "Game reset! Place your stake.");

        tokio::time::sleep(Duration::from_millis(80)).await;

        let (_, body) = call(&state, "GET", &format!("/api/wheel/sessions/{}", id), None).await;
        let view: SessionView = parse(body);
        assert_eq!(view.session.balance, 100);
        assert!(!view.session.is_spinning);
        assert_eq!(view.last_outcome, None);
    }

    #[tokio::test]
    async fn test_bankrupt_session_resets_itself() {
        let state = instant_state();
        let id = open_session(&state).await;
        let (status, _) = call(&state, "POST", &format!("/api/wheel/sessions/{}/color", id), Some(json!({ "color": "green" }))).await;
        assert_eq!(status, StatusCode::OK);

        let table_id = Uuid::parse_str(&id).unwrap();
        {
            let mut store = state.store.lock().await;
            let table = store.tables.get_mut(&table_id).unwrap();
            let started = table
                .start_spin(&state.config, None, &StakeInput::Whole(100), &mut FirstSegmentDraw)
                .unwrap();
            table.settle(started.ticket);
            assert!(table.is_bankrupt());
            schedule_bankrupt_reset(state.clone(), table_id, table.generation());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        let (_, body) = call(&state, "GET", &format!("/api/wheel/sessions/{}", id), None).await;
        let view: SessionView = parse(body);
        assert_eq!(view.session.balance, 100);
        assert_eq!(view.message, "Game reset! Place your stake.");
    }

    #[tokio::test]
    async fn test_non_numeric_stake_shapes_are_typed_errors() {
        let state = instant_state();
        let id = open_session(&state).await;
        let uri = format!("/api/wheel/sessions/{}/spin", id);
        for stake in [json!(true), json!([10]), json!({ "amount": 10 })] {
            let (status, body) = call(&state, "POST", &uri, Some(json!({ "stake": stake }))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "invalid_stake");
            assert_eq!(body["message"], "❗ Invalid stake amount.");
        }
    }

    #[tokio::test]
    async fn test_blank_color_means_no_color() {
        let state = test_state(&[("ROULETTE_DEFAULT_COLOR", "none"), ("ROULETTE_SPIN_DURATION_MS", "0")]);
        let id = open_session(&state).await;

        let uri = format!("/api/wheel/sessions/{}/spin", id);
        let (status, body) = call(&state, "POST", &uri, Some(json!({ "stake": 10, "color": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no_color_selected");
        assert_eq!(body["message"], "❗ Choose a color first.");

        let uri = format!("/api/wheel/sessions/{}/color", id);
        let (status, body) = call(&state, "POST", &uri, Some(json!({ "color": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no_color_selected");
    }

    #[tokio::test]
    async fn test_idle_sessions_expire_when_new_ones_open() {
        let state = test_state(&[("ROULETTE_SESSION_IDLE_SECS", "0")]);
        let first = open_session(&state).await;
        let second = open_session(&state).await;

        let (status, _) = call(&state, "GET", &format!("/api/wheel/sessions/{}", first), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&state, "GET", &format!("/api/wheel/sessions/{}", second), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.store.lock().await.tables.len(), 1);
    }

    /// Always lands on segment 0, which is red on the default wheel.
    struct FirstSegmentDraw;

    impl shared::RandomSource for FirstSegmentDraw {
        fn unit_draw(&mut self) -> f64 {
            0.0
        }
    }
}
