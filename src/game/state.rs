//! Per-worker session container.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the WASM module alive, so the session persists
//! across `handle_request` calls until the page is reloaded.

use std::cell::RefCell;

use crate::game::config::{ConfigError, GameConfig};
use crate::game::session::GameSession;

thread_local! {
    static SESSION: RefCell<GameSession> = RefCell::new(GameSession::default());
}

/// Execute a closure with read access to the session.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&GameSession) -> R,
{
    SESSION.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the session.
pub fn with_session_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut GameSession) -> R,
{
    SESSION.with(|s| f(&mut s.borrow_mut()))
}

/// Replace the whole session (tests and hard resets).
pub fn replace_session(session: GameSession) {
    SESSION.with(|s| {
        *s.borrow_mut() = session;
    });
}

/// Export the current session snapshot as JSON.
pub fn export_snapshot_json(now: Option<u64>) -> String {
    with_session_mut(|s| {
        let now = s.host_now(now);
        serde_json::to_string(&s.snapshot(now)).unwrap_or_else(|_| "{}".to_string())
    })
}

/// Parse and validate a config, then restart the session with it.
/// On error the running session and its config are left untouched.
pub fn import_config_json(json: &str, now: Option<u64>, seed: Option<u64>) -> Result<(), ConfigError> {
    let config = GameConfig::from_json(json)?;
    with_session_mut(|s| {
        let now = s.now_or_last(now);
        s.reconfigure(config, now, seed);
    });
    Ok(())
}
