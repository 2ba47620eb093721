//! The game session — one playthrough's deck, move, stats and timers.
//!
//! All transitions take `now` in milliseconds since the epoch; the wasm32
//! target has no usable system clock, so time always comes from the host.
//!
//! Per move: empty → one turned → two turned → resolved → empty. A match
//! resolves immediately. A mismatch leaves both cards flagged and schedules a
//! delayed resolution, which the next selection short-circuits.

use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::game::card::{Card, CardId, CardState};
use crate::game::config::GameConfig;
use crate::game::deck;
use crate::game::rng::GameRng;
use crate::game::score::{ScoreThresholds, score};
use crate::game::timer::{ElapsedClock, PendingResolution, TimerHandle, TimerIds};

/// Cards turned in the current move. Never more than two.
#[derive(Debug, Clone, Default)]
pub struct Move {
    cards: SmallVec<[CardId; 2]>,
}

impl Move {
    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cards.len() == 2
    }

    fn push(&mut self, card: CardId) {
        assert!(self.cards.len() < 2, "a move holds at most two cards");
        self.cards.push(card);
    }

    fn take_pair(&mut self) -> [CardId; 2] {
        assert_eq!(self.cards.len(), 2, "move not finished");
        let pair = [self.cards[0], self.cards[1]];
        self.cards.clear();
        pair
    }

    fn clear(&mut self) {
        self.cards.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub number_of_moves: u32,
    pub number_of_matches: u32,
    pub started_on: u64,
}

/// Why a selection was absorbed without changing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No card, or a slot outside the deck.
    NoCard,
    /// The card is already turned or matched.
    AlreadyFaceUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Ignored(IgnoreReason),
    /// First card of a move.
    Turned,
    /// Second card matched the first. `complete` is set when it was the last pair.
    Matched { complete: bool },
    /// Second card did not match; `timer` resolves the move when it fires.
    Mismatched { timer: TimerHandle },
}

/// What the display layer reads after each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub number_of_moves: u32,
    pub number_of_matches: u32,
    pub pairs: u32,
    pub elapsed_millis: u64,
    pub score: u8,
    pub is_complete: bool,
}

pub struct GameSession {
    config: GameConfig,
    cards: Vec<Card>,
    current: Move,
    stats: SessionStats,
    thresholds: ScoreThresholds,
    pending: Option<PendingResolution>,
    clock: ElapsedClock,
    timers: TimerIds,
    rng: GameRng,
    complete: bool,
    modal_visible: bool,
    last_seen: u64,
    /// False until a host timestamp has fixed the start time.
    anchored: bool,
}

/// Seed used when the host does not supply one.
fn seed_from_time(now: u64) -> u64 {
    now ^ 0x9E37_79B9_7F4A_7C15
}

impl GameSession {
    /// Create a session and start it immediately.
    pub fn new(config: GameConfig, now: u64, seed: Option<u64>) -> Self {
        let mut timers = TimerIds::default();
        let clock = ElapsedClock::start(now, timers.issue());
        let seed = seed.unwrap_or_else(|| seed_from_time(now));
        let mut session = Self {
            thresholds: ScoreThresholds::for_pairs(config.pairs as u32),
            config,
            cards: Vec::new(),
            current: Move::default(),
            stats: SessionStats::default(),
            pending: None,
            clock,
            timers,
            rng: GameRng::new(seed),
            complete: false,
            modal_visible: false,
            last_seen: now,
            anchored: true,
        };
        session.start(now, Some(seed));
        session
    }

    /// Deal a fresh shuffled deck and restart the stats and clock.
    /// Any outstanding mismatch delay and the previous ticker are cancelled.
    pub fn start(&mut self, now: u64, seed: Option<u64>) {
        let now = self.observe(now);
        if let Some(pending) = self.pending.take() {
            trace!(timer = %pending.handle, "cancelled pending resolution on restart");
        }
        let seed = seed.unwrap_or_else(|| seed_from_time(now));
        self.rng = GameRng::new(seed);
        self.cards = deck::deal(self.config.pairs, &mut self.rng);
        self.current.clear();
        self.stats = SessionStats {
            number_of_moves: 0,
            number_of_matches: 0,
            started_on: now,
        };
        self.thresholds = ScoreThresholds::for_pairs(self.config.pairs as u32);
        self.clock = ElapsedClock::start(now, self.timers.issue());
        self.complete = false;
        self.modal_visible = false;
        self.anchored = true;
        debug!(seed, pairs = self.config.pairs, "session started");
    }

    /// Swap in a new config and start over with it.
    pub fn reconfigure(&mut self, config: GameConfig, now: u64, seed: Option<u64>) {
        self.config = config;
        self.start(now, seed);
    }

    /// Turn a card. Invalid selections are absorbed and reported as `Ignored`.
    pub fn select_card(&mut self, card: Option<CardId>, now: u64) -> Selection {
        let now = self.observe(now);
        let Some(id) = card.filter(|id| id.index() < self.cards.len()) else {
            trace!(?card, "selection ignored: no card");
            return Selection::Ignored(IgnoreReason::NoCard);
        };
        if self.cards[id.index()].is_face_up() {
            trace!(%id, "selection ignored: already face up");
            return Selection::Ignored(IgnoreReason::AlreadyFaceUp);
        }

        // Acting early skips the rest of the mismatch delay.
        if let Some(pending) = self.pending {
            debug!(timer = %pending.handle, remaining_ms = pending.delay_remaining(now), "short-circuiting mismatch delay");
            self.resolve_move(now);
        }

        debug_assert!(!self.current.is_full(), "pending resolution left a full move");

        self.cards[id.index()].turn();
        self.current.push(id);
        if self.current.is_full() {
            self.evaluate_move(now)
        } else {
            Selection::Turned
        }
    }

    fn evaluate_move(&mut self, now: u64) -> Selection {
        let [a, b] = [self.current.cards()[0], self.current.cards()[1]];
        if self.cards[a.index()].symbol == self.cards[b.index()].symbol {
            self.cards[a.index()].set_matched();
            self.cards[b.index()].set_matched();
            self.stats.number_of_matches += 1;
            debug!(%a, %b, matches = self.stats.number_of_matches, "pair matched");
            self.resolve_move(now);
            Selection::Matched {
                complete: self.complete,
            }
        } else {
            self.cards[a.index()].flag_mismatch();
            self.cards[b.index()].flag_mismatch();
            let handle = self.timers.issue();
            self.pending = Some(PendingResolution {
                handle,
                due_at: now.saturating_add(self.config.mismatch_delay_ms),
            });
            debug!(%a, %b, timer = %handle, "mismatch, resolution scheduled");
            Selection::Mismatched { timer: handle }
        }
    }

    /// Finish the current move. Panics unless exactly two cards are turned.
    fn resolve_move(&mut self, now: u64) {
        let pair = self.current.take_pair();
        for id in pair {
            let card = &mut self.cards[id.index()];
            if card.state() != CardState::Matched {
                card.close();
            }
        }
        self.stats.number_of_moves += 1;
        trace!(moves = self.stats.number_of_moves, "move resolved");
        if self.stats.number_of_matches as usize == self.config.pairs {
            self.end_game(now);
        }
        self.pending = None;
    }

    /// Mismatch-delay callback. Returns false for stale or unknown handles.
    pub fn resolve_pending(&mut self, timer: TimerHandle, now: u64) -> bool {
        let now = self.observe(now);
        match self.pending {
            Some(pending) if pending.handle == timer => {
                self.resolve_move(now);
                true
            }
            _ => {
                debug!(%timer, "ignoring stale resolution timer");
                false
            }
        }
    }

    /// Elapsed-ticker callback. Returns the elapsed time while `timer` is the
    /// live ticker, `None` otherwise.
    pub fn tick(&mut self, timer: TimerHandle, now: u64) -> Option<u64> {
        let now = self.observe(now);
        if self.clock.is_live(timer) {
            Some(self.clock.elapsed(now))
        } else {
            trace!(%timer, "ignoring stale tick");
            None
        }
    }

    /// Stop the clock and raise the completion modal.
    pub fn end_game(&mut self, now: u64) {
        let now = self.observe(now);
        self.clock.stop(now);
        self.complete = true;
        self.modal_visible = true;
        debug!(
            moves = self.stats.number_of_moves,
            elapsed_ms = self.clock.elapsed(now),
            score = self.score(),
            "game complete"
        );
    }

    pub fn close_modal(&mut self) {
        self.modal_visible = false;
    }

    /// Clamp host timestamps so time never runs backwards within a session.
    fn observe(&mut self, now: u64) -> u64 {
        self.last_seen = self.last_seen.max(now);
        self.last_seen
    }

    /// The host's timestamp if it sent one, else the latest one seen.
    pub fn now_or_last(&self, now: Option<u64>) -> u64 {
        now.map_or(self.last_seen, |n| n.max(self.last_seen))
    }

    /// Take the timestamp a request carried. A session that was never
    /// started by the host (the worker's initial one) starts its clock at
    /// the first timestamp it sees.
    pub fn host_now(&mut self, now: Option<u64>) -> u64 {
        if let Some(at) = now.filter(|_| !self.anchored) {
            self.anchored = true;
            self.stats.started_on = at;
            self.clock.restart_at(at);
            trace!(started_on = at, "clock anchored to first host timestamp");
        }
        let now = self.now_or_last(now);
        self.observe(now)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id.index())
    }

    pub fn current_move(&self) -> &Move {
        &self.current
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    pub fn pending(&self) -> Option<PendingResolution> {
        self.pending
    }

    pub fn ticker(&self) -> Option<TimerHandle> {
        self.clock.ticker()
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn modal_visible(&self) -> bool {
        self.modal_visible
    }

    pub fn score(&self) -> u8 {
        score(&self.thresholds, self.stats.number_of_moves)
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        self.clock.elapsed(now)
    }

    pub fn snapshot(&self, now: u64) -> SessionSnapshot {
        SessionSnapshot {
            number_of_moves: self.stats.number_of_moves,
            number_of_matches: self.stats.number_of_matches,
            pairs: self.config.pairs as u32,
            elapsed_millis: self.clock.elapsed(now),
            score: self.score(),
            is_complete: self.complete,
        }
    }
}

/// The worker's initial session. Its clock waits for the first host
/// timestamp, see [`GameSession::host_now`].
impl Default for GameSession {
    fn default() -> Self {
        let mut session = Self::new(GameConfig::default(), 0, None);
        session.anchored = false;
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::CardFace;
    use crate::game::deck::symbol_counts;

    fn session(pairs: usize) -> GameSession {
        let config = GameConfig::with_pairs(pairs).unwrap();
        GameSession::new(config, 1_000, Some(42))
    }

    /// Two slots holding the same symbol, skipping matched cards.
    fn matching_pair(s: &GameSession) -> (CardId, CardId) {
        let open: Vec<&Card> = s
            .cards()
            .iter()
            .filter(|c| c.state() != CardState::Matched)
            .collect();
        for (i, a) in open.iter().enumerate() {
            for b in &open[i + 1..] {
                if a.symbol == b.symbol {
                    return (a.id, b.id);
                }
            }
        }
        panic!("no open pair left");
    }

    fn mismatching_pair(s: &GameSession) -> (CardId, CardId) {
        let cards = s.cards();
        let first = cards[0].id;
        let other = cards
            .iter()
            .find(|c| c.symbol != cards[0].symbol)
            .map(|c| c.id)
            .unwrap();
        (first, other)
    }

    fn third_card(s: &GameSession, a: CardId, b: CardId) -> CardId {
        s.cards()
            .iter()
            .find(|c| c.id != a && c.id != b)
            .map(|c| c.id)
            .unwrap()
    }

    #[test]
    fn start_deals_two_of_each_symbol() {
        for pairs in 1..=8 {
            let s = session(pairs);
            assert_eq!(s.cards().len(), pairs * 2);
            assert_eq!(symbol_counts(s.cards()), vec![2; pairs]);
            assert!(s.cards().iter().all(|c| c.face() == CardFace::Closed));
        }
    }

    #[test]
    fn start_resets_stats() {
        let mut s = session(8);
        let (a, b) = matching_pair(&s);
        s.select_card(Some(a), 1_100);
        s.select_card(Some(b), 1_200);
        assert_eq!(s.stats().number_of_moves, 1);

        s.start(5_000, Some(9));
        assert_eq!(
            s.stats(),
            SessionStats {
                number_of_moves: 0,
                number_of_matches: 0,
                started_on: 5_000
            }
        );
        assert!(s.current_move().is_empty());
        assert!(!s.is_complete());
    }

    #[test]
    fn first_selection_turns_card() {
        let mut s = session(8);
        let id = s.cards()[0].id;
        assert_eq!(s.select_card(Some(id), 1_100), Selection::Turned);
        assert_eq!(s.card(id).unwrap().state(), CardState::Turned);
        assert_eq!(s.current_move().cards(), &[id]);
    }

    #[test]
    fn missing_or_out_of_range_card_is_ignored() {
        let mut s = session(8);
        assert_eq!(
            s.select_card(None, 1_100),
            Selection::Ignored(IgnoreReason::NoCard)
        );
        assert_eq!(
            s.select_card(Some(CardId(99)), 1_100),
            Selection::Ignored(IgnoreReason::NoCard)
        );
        assert!(s.current_move().is_empty());
    }

    #[test]
    fn reselecting_turned_card_is_ignored() {
        let mut s = session(8);
        let id = s.cards()[0].id;
        s.select_card(Some(id), 1_100);
        assert_eq!(
            s.select_card(Some(id), 1_200),
            Selection::Ignored(IgnoreReason::AlreadyFaceUp)
        );
        assert_eq!(s.current_move().len(), 1);
        assert_eq!(s.stats().number_of_moves, 0);
    }

    #[test]
    fn match_counts_once_and_locks_cards() {
        let mut s = session(8);
        let (a, b) = matching_pair(&s);
        s.select_card(Some(a), 1_100);
        assert_eq!(
            s.select_card(Some(b), 1_200),
            Selection::Matched { complete: false }
        );
        assert_eq!(s.card(a).unwrap().state(), CardState::Matched);
        assert_eq!(s.card(b).unwrap().state(), CardState::Matched);
        assert_eq!(s.stats().number_of_matches, 1);
        assert_eq!(s.stats().number_of_moves, 1);
        assert!(s.current_move().is_empty());
        assert!(s.pending().is_none());

        assert_eq!(
            s.select_card(Some(a), 1_300),
            Selection::Ignored(IgnoreReason::AlreadyFaceUp)
        );
        assert_eq!(s.stats().number_of_matches, 1);
        assert_eq!(s.stats().number_of_moves, 1);
    }

    #[test]
    fn mismatch_flags_then_closes_on_timer() {
        let mut s = session(8);
        let (a, b) = mismatching_pair(&s);
        s.select_card(Some(a), 1_100);
        let Selection::Mismatched { timer } = s.select_card(Some(b), 1_200) else {
            panic!("expected mismatch");
        };
        assert_eq!(s.card(a).unwrap().face(), CardFace::Mismatch);
        assert_eq!(s.card(b).unwrap().face(), CardFace::Mismatch);
        assert_eq!(s.stats().number_of_moves, 0);
        assert_eq!(s.pending().unwrap().due_at, 2_200);

        assert!(s.resolve_pending(timer, 2_200));
        assert_eq!(s.card(a).unwrap().face(), CardFace::Closed);
        assert_eq!(s.card(b).unwrap().face(), CardFace::Closed);
        assert_eq!(s.stats().number_of_moves, 1);
        assert!(s.current_move().is_empty());
        assert!(s.pending().is_none());
    }

    #[test]
    fn mismatched_card_cannot_short_circuit_itself() {
        let mut s = session(8);
        let (a, b) = mismatching_pair(&s);
        s.select_card(Some(a), 1_100);
        s.select_card(Some(b), 1_200);
        assert_eq!(
            s.select_card(Some(a), 1_300),
            Selection::Ignored(IgnoreReason::AlreadyFaceUp)
        );
        assert!(s.pending().is_some());
        assert_eq!(s.stats().number_of_moves, 0);
    }

    #[test]
    fn next_selection_short_circuits_mismatch() {
        let mut s = session(8);
        let (a, b) = mismatching_pair(&s);
        let c = third_card(&s, a, b);
        s.select_card(Some(a), 1_100);
        let Selection::Mismatched { timer } = s.select_card(Some(b), 1_200) else {
            panic!("expected mismatch");
        };

        assert_eq!(s.select_card(Some(c), 1_300), Selection::Turned);
        assert_eq!(s.card(a).unwrap().state(), CardState::Closed);
        assert_eq!(s.card(b).unwrap().state(), CardState::Closed);
        assert_eq!(s.stats().number_of_moves, 1);
        assert_eq!(s.current_move().cards(), &[c]);
        assert!(s.pending().is_none());

        // The original timer fires late and must not touch the new move.
        assert!(!s.resolve_pending(timer, 2_200));
        assert_eq!(s.current_move().cards(), &[c]);
        assert_eq!(s.stats().number_of_moves, 1);
    }

    #[test]
    fn restart_cancels_pending_resolution() {
        let mut s = session(8);
        let (a, b) = mismatching_pair(&s);
        s.select_card(Some(a), 1_100);
        let Selection::Mismatched { timer } = s.select_card(Some(b), 1_200) else {
            panic!("expected mismatch");
        };
        s.start(1_500, Some(3));
        assert!(s.pending().is_none());
        assert!(!s.resolve_pending(timer, 2_200));
        assert_eq!(s.stats().number_of_moves, 0);
    }

    #[test]
    fn restart_replaces_ticker() {
        let mut s = session(8);
        let old = s.ticker().unwrap();
        assert_eq!(s.tick(old, 3_000), Some(2_000));
        s.start(4_000, Some(1));
        assert_eq!(s.tick(old, 5_000), None);
        let new = s.ticker().unwrap();
        assert_ne!(old, new);
        assert_eq!(s.tick(new, 5_000), Some(1_000));
    }

    #[test]
    fn clearing_every_pair_completes_and_freezes_clock() {
        let mut s = session(8);
        let ticker = s.ticker().unwrap();
        let mut now = 1_000;
        for round in 0..8 {
            let (a, b) = matching_pair(&s);
            now += 500;
            s.select_card(Some(a), now);
            now += 500;
            let outcome = s.select_card(Some(b), now);
            assert_eq!(outcome, Selection::Matched { complete: round == 7 });
        }
        assert!(s.is_complete());
        assert!(s.modal_visible());
        assert_eq!(s.stats().number_of_matches, 8);
        assert_eq!(s.stats().number_of_moves, 8);
        assert_eq!(s.score(), 3);
        assert!(s.ticker().is_none());

        let frozen = s.elapsed(now);
        assert_eq!(frozen, 8_000);
        assert_eq!(s.elapsed(now + 60_000), frozen);
        assert_eq!(s.tick(ticker, now + 60_000), None);
        assert_eq!(s.snapshot(now + 60_000).elapsed_millis, frozen);
    }

    #[test]
    fn move_never_exceeds_two_cards() {
        let mut s = session(8);
        let ids: Vec<CardId> = s.cards().iter().map(|c| c.id).collect();
        let mut now = 1_000;
        for id in ids.iter().chain(ids.iter().rev()) {
            now += 10;
            s.select_card(Some(*id), now);
            assert!(s.current_move().len() <= 2);
        }
    }

    #[test]
    fn snapshot_reports_score_and_progress() {
        let mut s = session(8);
        let (a, b) = matching_pair(&s);
        s.select_card(Some(a), 1_500);
        s.select_card(Some(b), 2_000);
        let snap = s.snapshot(4_000);
        assert_eq!(snap.number_of_moves, 1);
        assert_eq!(snap.number_of_matches, 1);
        assert_eq!(snap.pairs, 8);
        assert_eq!(snap.elapsed_millis, 3_000);
        assert_eq!(snap.score, 3);
        assert!(!snap.is_complete);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_string(&session(2).snapshot(1_000)).unwrap();
        assert!(json.contains("\"numberOfMoves\":0"));
        assert!(json.contains("\"isComplete\":false"));
    }

    #[test]
    fn same_seed_deals_same_deck() {
        let a = session(8);
        let b = session(8);
        let symbols = |s: &GameSession| s.cards().iter().map(|c| c.symbol).collect::<Vec<_>>();
        assert_eq!(symbols(&a), symbols(&b));
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn host_time_never_runs_backwards() {
        let mut s = session(8);
        let id = s.cards()[0].id;
        s.select_card(Some(id), 10_000);
        assert_eq!(s.now_or_last(None), 10_000);
        assert_eq!(s.now_or_last(Some(5_000)), 10_000);
        assert_eq!(s.now_or_last(Some(12_000)), 12_000);
    }

    #[test]
    fn close_modal_hides_it() {
        let mut s = session(1);
        let (a, b) = matching_pair(&s);
        s.select_card(Some(a), 1_100);
        s.select_card(Some(b), 1_200);
        assert!(s.modal_visible());
        s.close_modal();
        assert!(!s.modal_visible());
        assert!(s.is_complete());
    }

    #[test]
    fn mismatch_delay_saturates_near_max_timestamp() {
        let config = GameConfig {
            mismatch_delay_ms: u64::MAX,
            ..GameConfig::default()
        };
        let mut s = GameSession::new(config, 1_000, Some(42));
        let (a, b) = mismatching_pair(&s);
        s.select_card(Some(a), 1_100);
        let Selection::Mismatched { .. } = s.select_card(Some(b), 1_200) else {
            panic!("expected mismatch");
        };
        let pending = s.pending().unwrap();
        assert_eq!(pending.due_at, u64::MAX);
        assert!(pending.delay_remaining(1_200) > 0);
    }

    #[test]
    fn default_session_starts_clock_at_first_host_timestamp() {
        let mut s = GameSession::default();
        assert_eq!(s.host_now(None), 0);
        let now = s.host_now(Some(1_700_000_000_000));
        assert_eq!(now, 1_700_000_000_000);
        assert_eq!(s.stats().started_on, 1_700_000_000_000);
        assert_eq!(s.elapsed(1_700_000_005_000), 5_000);

        // Only the first timestamp moves the start.
        s.host_now(Some(1_700_000_009_000));
        assert_eq!(s.stats().started_on, 1_700_000_000_000);
    }

    #[test]
    fn started_session_keeps_its_start_time() {
        let mut s = session(8);
        s.host_now(Some(50_000));
        assert_eq!(s.stats().started_on, 1_000);
        assert_eq!(s.elapsed(50_000), 49_000);
    }

    #[test]
    #[should_panic(expected = "move not finished")]
    fn resolving_incomplete_move_is_fatal() {
        let mut s = session(8);
        let id = s.cards()[0].id;
        s.select_card(Some(id), 1_100);
        s.resolve_move(1_200);
    }

    #[test]
    #[should_panic(expected = "at most two cards")]
    fn pushing_third_card_is_fatal() {
        let mut m = Move::default();
        m.push(CardId(0));
        m.push(CardId(1));
        m.push(CardId(2));
    }
}
