//! `/api/memory/*` routes — the page's only way into the game session.
//!
//! Every POST carries `now` (milliseconds, from `Date.now()` on the page).
//! When it is missing the session's latest timestamp is used instead.

use crate::game::card::CardId;
use crate::game::render;
use crate::game::state::{export_snapshot_json, import_config_json, with_session, with_session_mut};
use crate::game::timer::TimerHandle;
use crate::routes::util::{get_param, get_u64, parse_form_body, parse_query};

// ── POST /api/memory/start ─────────────────────────────────────────

/// Handle POST /api/memory/start
/// Body params: `now`, optional `seed`.
/// Deals a new game and returns the full game fragment.
pub fn handle_start_post(body: &str) -> String {
    let params = parse_form_body(body);
    let seed = get_u64(&params, "seed");
    with_session_mut(|s| {
        let now = s.host_now(get_u64(&params, "now"));
        s.start(now, seed);
        render::render_game(s, now)
    })
}

// ── POST /api/memory/select ────────────────────────────────────────

/// Handle POST /api/memory/select
/// Body params: `card={slot}`, `now`.
/// Invalid selections change nothing and re-render the same game.
pub fn handle_select_post(body: &str) -> String {
    let params = parse_form_body(body);
    let card = get_param(&params, "card")
        .and_then(|s| s.parse::<usize>().ok())
        .map(CardId);
    with_session_mut(|s| {
        let now = s.host_now(get_u64(&params, "now"));
        s.select_card(card, now);
        render::render_game(s, now)
    })
}

// ── POST /api/memory/resolve ───────────────────────────────────────

/// Handle POST /api/memory/resolve
/// Body params: `timer={handle}`, `now`.
/// Fired by the mismatch delay; stale handles leave the game untouched.
pub fn handle_resolve_post(body: &str) -> String {
    let params = parse_form_body(body);
    let timer = get_u64(&params, "timer").map(TimerHandle);
    with_session_mut(|s| {
        let now = s.host_now(get_u64(&params, "now"));
        if let Some(timer) = timer {
            s.resolve_pending(timer, now);
        }
        render::render_game(s, now)
    })
}

// ── POST /api/memory/tick ──────────────────────────────────────────

/// Handle POST /api/memory/tick
/// Body params: `timer={handle}`, `now`.
/// Returns the elapsed-time fragment. A stale ticker gets a fragment without
/// the polling attribute, which stops it on the page.
pub fn handle_tick_post(body: &str) -> String {
    let params = parse_form_body(body);
    let timer = get_u64(&params, "timer").map(TimerHandle);
    with_session_mut(|s| {
        let now = s.host_now(get_u64(&params, "now"));
        let live = timer.and_then(|t| s.tick(t, now)).is_some();
        if live {
            render::render_elapsed(s, now)
        } else {
            render::render_elapsed_frozen(s, now)
        }
    })
}

// ── GET /api/memory/board ──────────────────────────────────────────

/// Handle GET /api/memory/board?now={ms}
/// Returns the current game fragment. Only the clock of a never-started
/// session is touched (see `GameSession::host_now`).
pub fn handle_board_get(query: &str) -> String {
    let params = parse_query(query);
    with_session_mut(|s| {
        let now = s.host_now(get_u64(&params, "now"));
        render::render_game(s, now)
    })
}

// ── GET /api/memory/state ──────────────────────────────────────────

/// Handle GET /api/memory/state?now={ms}
/// Returns the session snapshot as JSON.
pub fn handle_state_get(query: &str) -> String {
    let params = parse_query(query);
    export_snapshot_json(get_u64(&params, "now"))
}

// ── POST /api/memory/modal ─────────────────────────────────────────

/// Handle POST /api/memory/modal
/// Body params:
///   - action=close               → hide the completion modal
///   - action=play_again&now={ms} → hide it and deal a new game
pub fn handle_modal_post(body: &str) -> String {
    let params = parse_form_body(body);
    let action = get_param(&params, "action").unwrap_or("");
    with_session_mut(|s| {
        let now = s.host_now(get_u64(&params, "now"));
        match action {
            "close" => s.close_modal(),
            "play_again" => {
                s.close_modal();
                s.start(now, get_u64(&params, "seed"));
            }
            _ => {}
        }
        render::render_game(s, now)
    })
}

// ── POST /api/memory/config ────────────────────────────────────────

/// Handle POST /api/memory/config
/// Body is a JSON `GameConfig`, either raw or as a `config=` form field.
/// Restarts the game with the new config; on error the old game keeps running.
pub fn handle_config_post(body: &str) -> String {
    let params = parse_form_body(body);
    let json = get_param(&params, "config").unwrap_or(body.trim());
    let now = get_u64(&params, "now");
    let seed = get_u64(&params, "seed");
    match import_config_json(json, now, seed) {
        Ok(()) => with_session(|s| render::render_game(s, s.now_or_last(now))),
        Err(e) => {
            tracing::warn!(error = %e, "rejected game config");
            format!(r#"<span class="text-red-600">Invalid config: {}</span>"#, e)
        }
    }
}
