//! Memory game in-browser WASM server.
//!
//! Exports `handle_request(method, path, query, body)` for the Service Worker
//! bridge to call. Uses `matchit` for URL routing — the same router
//! engine that powers Axum.
//!
//! The game session lives in WASM memory for the life of the worker. Timers
//! stay on the page: fragments ask HTMX to call `/api/memory/resolve` and
//! `/api/memory/tick` back with the handle the session issued.

use wasm_bindgen::prelude::*;

pub mod game;
pub mod routes;

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method` — HTTP method (e.g., "GET", "POST")
/// * `path`   — URL path (e.g., "/api/memory/select")
/// * `query`  — Query string (e.g., "?now=1700000000000")
/// * `body`   — Request body (e.g., POST form data). Empty string for GET requests.
///
/// # Returns
/// An HTML string fragment suitable for HTMX to swap into the DOM, or JSON
/// for `/api/memory/state`.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    router.insert("/api/memory/start", "start").ok();
    router.insert("/api/memory/select", "select").ok();
    router.insert("/api/memory/resolve", "resolve").ok();
    router.insert("/api/memory/tick", "tick").ok();
    router.insert("/api/memory/board", "board").ok();
    router.insert("/api/memory/state", "state").ok();
    router.insert("/api/memory/modal", "modal").ok();
    router.insert("/api/memory/config", "config").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("board", "GET") => routes::memory::handle_board_get(query),
            ("state", "GET") => routes::memory::handle_state_get(query),

            ("start", "POST") => routes::memory::handle_start_post(body),
            ("select", "POST") => routes::memory::handle_select_post(body),
            ("resolve", "POST") => routes::memory::handle_resolve_post(body),
            ("tick", "POST") => routes::memory::handle_tick_post(body),
            ("modal", "POST") => routes::memory::handle_modal_post(body),
            ("config", "POST") => routes::memory::handle_config_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-red-600">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-red-600">405 — method not allowed</span>"#.to_string()
}
