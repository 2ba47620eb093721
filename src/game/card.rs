//! Card types — slot identity, symbol kind and the per-card state machine.
//!
//! A card moves `Closed → Turned → {Matched | Closed}`. The mismatch flag is
//! display-only and only ever set while the card is `Turned`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed symbol set. A session plays with the first `pairs` of these.
pub const SYMBOLS: [&str; 8] = [
    "fa-cat",
    "fa-kiwi-bird",
    "fa-anchor",
    "fa-bolt",
    "fa-cube",
    "fa-leaf",
    "fa-bicycle",
    "fa-bomb",
];

/// Slot index of a card within the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub usize);

impl CardId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A symbol kind, stored as an index into [`SYMBOLS`]. Only
/// [`Symbol::nth`] builds one, so the index is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Symbol(u8);

impl Symbol {
    /// The `n`th symbol of the fixed set, if there is one.
    pub fn nth(n: usize) -> Option<Self> {
        (n < SYMBOLS.len()).then_some(Self(n as u8))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Font Awesome class name used when rendering.
    pub fn class_name(self) -> &'static str {
        SYMBOLS[self.index()]
    }
}

/// Persistent card state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardState {
    #[default]
    Closed,
    Turned,
    Matched,
}

/// What the display layer should show for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardFace {
    Closed,
    Turned,
    Mismatch,
    Matched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub symbol: Symbol,
    state: CardState,
    mismatch: bool,
}

impl Card {
    pub fn new(id: CardId, symbol: Symbol) -> Self {
        Self {
            id,
            symbol,
            state: CardState::Closed,
            mismatch: false,
        }
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    pub fn is_mismatch(&self) -> bool {
        self.mismatch
    }

    /// Turned or matched cards cannot be selected again.
    pub fn is_face_up(&self) -> bool {
        matches!(self.state, CardState::Turned | CardState::Matched)
    }

    pub fn face(&self) -> CardFace {
        match self.state {
            CardState::Closed => CardFace::Closed,
            CardState::Turned if self.mismatch => CardFace::Mismatch,
            CardState::Turned => CardFace::Turned,
            CardState::Matched => CardFace::Matched,
        }
    }

    pub fn turn(&mut self) {
        self.state = CardState::Turned;
        self.mismatch = false;
    }

    pub fn close(&mut self) {
        self.state = CardState::Closed;
        self.mismatch = false;
    }

    pub fn set_matched(&mut self) {
        self.state = CardState::Matched;
        self.mismatch = false;
    }

    /// Flag a turned card as part of a mismatched move.
    pub fn flag_mismatch(&mut self) {
        debug_assert_eq!(self.state, CardState::Turned, "only turned cards can mismatch");
        self.mismatch = true;
    }

    /// Hover text shown by the deck.
    pub fn title(&self) -> &'static str {
        match self.face() {
            CardFace::Closed | CardFace::Turned => "click to turn card",
            CardFace::Mismatch => "no match, better luck next move!",
            CardFace::Matched => "it's a match!",
        }
    }
}
