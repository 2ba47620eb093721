//! HTML fragments for the memory game.
//!
//! Everything the page shows is rendered here from the session: the score
//! panel, the deck, the completion modal and the hidden trigger that brings
//! the mismatch delay back to Rust. Timers are requested through HTMX
//! attributes; dropping the attribute is how a timer gets stopped.

use crate::game::card::{Card, CardFace};
use crate::game::session::GameSession;
use crate::game::timer::format_elapsed;

const GAME_TARGET: &str = "#memory-game";

fn card_classes(card: &Card) -> &'static str {
    match card.face() {
        CardFace::Closed => "card",
        CardFace::Turned => "card turned",
        CardFace::Mismatch => "card turned mismatch",
        CardFace::Matched => "card match",
    }
}

/// Render the full game: score panel, deck, modal and any pending timer.
pub fn render_game(session: &GameSession, now: u64) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(r#"<div id="memory-game">"#);
    html.push_str(&render_score_panel(session, now));
    html.push_str(&render_deck(session));
    html.push_str(&render_pending_trigger(session, now));
    html.push_str(&render_modal(session, now));
    html.push_str(r#"</div>"#);
    html
}

/// Render the deck as a list of cards. Closed cards post their slot back
/// when clicked; face-up cards carry no handler.
pub fn render_deck(session: &GameSession) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(r#"<ul class="deck">"#);
    for card in session.cards() {
        let click = if card.is_face_up() {
            String::new()
        } else {
            format!(
                r#" onclick="htmx.ajax('POST', '/api/memory/select', {{values: {{card: '{}', now: Date.now()}}, target: '{}', swap: 'outerHTML'}})""#,
                card.id, GAME_TARGET
            )
        };
        html.push_str(&format!(
            r#"<li class="{}" data-card="{}" title="{}"{}><i class="fa {}"></i></li>"#,
            card_classes(card),
            card.id,
            card.title(),
            click,
            card.symbol.class_name()
        ));
    }
    html.push_str(r#"</ul>"#);
    html
}

/// One-shot trigger that fires the mismatch delay. Empty when nothing is pending.
pub fn render_pending_trigger(session: &GameSession, now: u64) -> String {
    let Some(pending) = session.pending() else {
        return String::new();
    };
    format!(
        r#"<div class="hidden" hx-post="/api/memory/resolve" hx-trigger="load delay:{}ms" hx-vals='js:{{timer: "{}", now: Date.now()}}' hx-target="{}" hx-swap="outerHTML"></div>"#,
        pending.delay_remaining(now),
        pending.handle,
        GAME_TARGET
    )
}

/// Three stars, filled left to right up to `score`.
pub fn render_stars(score: u8) -> String {
    let mut html = String::with_capacity(256);
    html.push_str(r#"<ul class="stars">"#);
    for i in 0..3 {
        let style = if i < score { "fas" } else { "far" };
        html.push_str(&format!(r#"<li><i class="{} fa-star"></i></li>"#, style));
    }
    html.push_str(r#"</ul>"#);
    html
}

/// Elapsed time display. While the ticker is live it polls the tick route;
/// once the game ends the polling attribute disappears and the host's
/// interval stops with it.
pub fn render_elapsed(session: &GameSession, now: u64) -> String {
    let text = format_elapsed(session.elapsed(now));
    match session.ticker() {
        Some(ticker) => format!(
            r#"<span class="elapsed" hx-post="/api/memory/tick" hx-trigger="every {}ms" hx-vals='js:{{timer: "{}", now: Date.now()}}' hx-swap="outerHTML">{}</span>"#,
            session.config().tick_interval_ms,
            ticker,
            text
        ),
        None => render_elapsed_frozen(session, now),
    }
}

/// Elapsed time without polling, for finished games and stale tickers.
pub fn render_elapsed_frozen(session: &GameSession, now: u64) -> String {
    format!(
        r#"<span class="elapsed">{}</span>"#,
        format_elapsed(session.elapsed(now))
    )
}

pub fn render_score_panel(session: &GameSession, now: u64) -> String {
    let moves = session.stats().number_of_moves;
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<section class="score-panel">"#);
    html.push_str(&render_stars(session.score()));
    html.push_str(&format!(
        r#"<span class="moves">{}</span> {}"#,
        moves,
        if moves == 1 { "Move" } else { "Moves" }
    ));
    html.push_str(&render_elapsed(session, now));
    html.push_str(&format!(
        r#"<div class="restart" title="restart game" onclick="htmx.ajax('POST', '/api/memory/start', {{values: {{now: Date.now()}}, target: '{}', swap: 'outerHTML'}})"><i class="fa fa-repeat"></i></div>"#,
        GAME_TARGET
    ));
    html.push_str(r#"</section>"#);
    html
}

/// Completion modal. Clicking the backdrop closes it; "play again" closes it
/// and deals a new game.
pub fn render_modal(session: &GameSession, now: u64) -> String {
    if !session.modal_visible() {
        return String::new();
    }
    let stats = session.stats();
    let mut html = String::with_capacity(1024);
    html.push_str(&format!(
        r#"<div class="modal show-modal" hx-post="/api/memory/modal" hx-trigger="click target:.modal" hx-vals='{{"action": "close"}}' hx-target="{}" hx-swap="outerHTML">"#,
        GAME_TARGET
    ));
    html.push_str(r#"<div class="modal-content">"#);
    html.push_str(r#"<h2>Congratulations! You won!</h2>"#);
    html.push_str(&format!(
        r#"<p>With <span class="moves">{}</span> moves in <span class="elapsed">{}</span></p>"#,
        stats.number_of_moves,
        format_elapsed(session.elapsed(now))
    ));
    html.push_str(&render_stars(session.score()));
    html.push_str(&format!(
        r#"<button id="play-again-button" onclick="htmx.ajax('POST', '/api/memory/modal', {{values: {{action: 'play_again', now: Date.now()}}, target: '{}', swap: 'outerHTML'}})">Play again</button>"#,
        GAME_TARGET
    ));
    html.push_str(r#"</div></div>"#);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::CardState;
    use crate::game::config::GameConfig;
    use crate::game::session::Selection;

    fn session(pairs: usize) -> GameSession {
        GameSession::new(GameConfig::with_pairs(pairs).unwrap(), 0, Some(5))
    }

    fn finish(s: &mut GameSession, now: u64) {
        loop {
            let Some((a_id, sym)) = s
                .cards()
                .iter()
                .find(|c| c.state() == CardState::Closed)
                .map(|c| (c.id, c.symbol))
            else {
                break;
            };
            let b_id = s
                .cards()
                .iter()
                .find(|c| c.id != a_id && c.symbol == sym)
                .map(|c| c.id)
                .unwrap();
            s.select_card(Some(a_id), now);
            s.select_card(Some(b_id), now);
        }
    }

    #[test]
    fn deck_renders_every_card_closed() {
        let s = session(8);
        let html = render_deck(&s);
        assert_eq!(html.matches("<li class=\"card\"").count(), 16);
        assert_eq!(html.matches("click to turn card").count(), 16);
        assert!(html.contains("fa fa-cat"));
        assert!(html.contains("/api/memory/select"));
    }

    #[test]
    fn deck_marks_turned_and_mismatched_cards() {
        let mut s = session(8);
        let first = s.cards()[0].clone();
        let other = s
            .cards()
            .iter()
            .find(|c| c.symbol != first.symbol)
            .unwrap()
            .id;
        s.select_card(Some(first.id), 100);
        let html = render_deck(&s);
        assert_eq!(html.matches("card turned").count(), 1);

        let Selection::Mismatched { .. } = s.select_card(Some(other), 200) else {
            panic!("expected mismatch");
        };
        let html = render_deck(&s);
        assert_eq!(html.matches("card turned mismatch").count(), 2);
        assert!(html.contains("no match, better luck next move!"));
    }

    #[test]
    fn pending_trigger_only_while_mismatch_pending() {
        let mut s = session(8);
        assert!(render_pending_trigger(&s, 0).is_empty());

        let first = s.cards()[0].clone();
        let other = s
            .cards()
            .iter()
            .find(|c| c.symbol != first.symbol)
            .unwrap()
            .id;
        s.select_card(Some(first.id), 100);
        let Selection::Mismatched { timer } = s.select_card(Some(other), 200) else {
            panic!("expected mismatch");
        };
        let html = render_pending_trigger(&s, 450);
        assert!(html.contains("load delay:750ms"));
        assert!(html.contains(&format!("timer: \"{}\"", timer)));
    }

    #[test]
    fn stars_fill_left_to_right() {
        let html = render_stars(2);
        assert_eq!(html.matches("fas fa-star").count(), 2);
        assert_eq!(html.matches("far fa-star").count(), 1);
    }

    #[test]
    fn elapsed_polls_while_running() {
        let s = session(8);
        let html = render_elapsed(&s, 3_000);
        assert!(html.contains("00:00:03"));
        assert!(html.contains("every 1000ms"));
        assert!(html.contains("/api/memory/tick"));
    }

    #[test]
    fn finished_game_stops_polling_and_shows_modal() {
        let mut s = session(2);
        finish(&mut s, 5_000);
        assert!(s.is_complete());

        let html = render_elapsed(&s, 60_000);
        assert!(html.contains("00:00:05"));
        assert!(!html.contains("hx-trigger"));

        let modal = render_modal(&s, 60_000);
        assert!(modal.contains("show-modal"));
        assert!(modal.contains("play_again"));
        assert_eq!(modal.matches("fas fa-star").count(), 3);
    }

    #[test]
    fn modal_hidden_during_play() {
        let s = session(8);
        assert!(render_modal(&s, 0).is_empty());
    }

    #[test]
    fn score_panel_counts_moves() {
        let s = session(8);
        let html = render_score_panel(&s, 0);
        assert!(html.contains(r#"<span class="moves">0</span> Moves"#));
        assert!(html.contains("/api/memory/start"));
    }

    #[test]
    fn game_wraps_all_parts() {
        let s = session(8);
        let html = render_game(&s, 0);
        assert!(html.starts_with(r#"<div id="memory-game">"#));
        assert!(html.contains("score-panel"));
        assert!(html.contains(r#"<ul class="deck">"#));
    }
}
