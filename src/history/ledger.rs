//! Move ledger with review cursor and inverse-pair elision.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Fingerprint, Move, PlayerId};
use crate::rules::Board;

/// Fingerprint, side to move and move number at one point of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub fingerprint: Fingerprint,
    pub player: PlayerId,
    pub move_number: u32,
}

impl Checkpoint {
    pub fn of<B: Board>(board: &B) -> Self {
        Self {
            fingerprint: board.fingerprint(),
            player: board.current_player(),
            move_number: board.move_number(),
        }
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} move {}", self.fingerprint, self.player, self.move_number)
    }
}

/// One recorded move and the state it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub mv: Move,
    pub fingerprint: Fingerprint,
    pub player_after: PlayerId,
    pub move_number_after: u32,
}

impl LedgerEntry {
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            fingerprint: self.fingerprint,
            player: self.player_after,
            move_number: self.move_number_after,
        }
    }
}

/// What `record` did with a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Appended,
    /// The move undid the previous entry; both were removed.
    Elided,
}

/// Ordered move history of one game.
///
/// Entries live in a persistent vector so snapshots of the ledger are cheap.
/// The review cursor counts the entries visible while stepping through the
/// game; it equals `len()` unless the user is reviewing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "LedgerData", into = "LedgerData")]
pub struct Ledger {
    initial: Checkpoint,
    entries: Vector<LedgerEntry>,
    cursor: usize,
    repetitions: FxHashMap<Fingerprint, u32>,
}

/// Serialized form; repetition counts are derived on load.
#[derive(Clone, Serialize, Deserialize)]
struct LedgerData {
    initial: Checkpoint,
    entries: Vector<LedgerEntry>,
    cursor: usize,
}

impl From<LedgerData> for Ledger {
    fn from(data: LedgerData) -> Self {
        let mut ledger = Ledger::from_checkpoint(data.initial);
        for entry in &data.entries {
            *ledger.repetitions.entry(entry.fingerprint).or_insert(0) += 1;
        }
        ledger.cursor = data.cursor.min(data.entries.len());
        ledger.entries = data.entries;
        ledger
    }
}

impl From<Ledger> for LedgerData {
    fn from(ledger: Ledger) -> Self {
        Self {
            initial: ledger.initial,
            entries: ledger.entries,
            cursor: ledger.cursor,
        }
    }
}

impl Ledger {
    /// Start a ledger at `initial`'s current state.
    pub fn new<B: Board>(initial: &B) -> Self {
        Self::from_checkpoint(Checkpoint::of(initial))
    }

    pub fn from_checkpoint(initial: Checkpoint) -> Self {
        let mut repetitions = FxHashMap::default();
        repetitions.insert(initial.fingerprint, 1);
        Self {
            initial,
            entries: Vector::new(),
            cursor: 0,
            repetitions,
        }
    }

    /// Record `mv`, which `board` has just executed.
    ///
    /// Recording while reviewing discards the entries after the cursor first.
    /// The previous entry and `mv` are elided together only when the board
    /// calls them a candidate pair and the state after `mv` matches the state
    /// before the previous entry exactly.
    pub fn record<B: Board>(&mut self, board: &B, mv: &Move) -> RecordOutcome {
        if self.is_reviewing() {
            self.truncate(self.cursor);
        }

        let after = Checkpoint::of(board);
        if let Some(prev) = self.entries.last() {
            let before_prev = self.checkpoint_at(self.entries.len() - 1);
            if board.cancels(&prev.mv, mv) && after == before_prev {
                self.pop();
                return RecordOutcome::Elided;
            }
        }

        self.entries.push_back(LedgerEntry {
            mv: mv.clone(),
            fingerprint: after.fingerprint,
            player_after: after.player,
            move_number_after: after.move_number,
        });
        *self.repetitions.entry(after.fingerprint).or_insert(0) += 1;
        self.cursor = self.entries.len();
        RecordOutcome::Appended
    }

    /// Remove and return the last entry.
    pub fn pop(&mut self) -> Option<LedgerEntry> {
        let entry = self.entries.pop_back()?;
        self.forget(entry.fingerprint);
        self.cursor = self.cursor.min(self.entries.len());
        Some(entry)
    }

    fn truncate(&mut self, len: usize) {
        while self.entries.len() > len {
            self.pop();
        }
    }

    fn forget(&mut self, fingerprint: Fingerprint) {
        if let Some(count) = self.repetitions.get_mut(&fingerprint) {
            *count -= 1;
            if *count == 0 {
                self.repetitions.remove(&fingerprint);
            }
        }
    }

    /// State after the first `n` entries.
    #[must_use]
    pub fn checkpoint_at(&self, n: usize) -> Checkpoint {
        match n {
            0 => self.initial,
            n => self.entries[n - 1].checkpoint(),
        }
    }

    #[must_use]
    pub fn initial(&self) -> Checkpoint {
        self.initial
    }

    /// State after the last entry.
    #[must_use]
    pub fn current(&self) -> Checkpoint {
        self.checkpoint_at(self.entries.len())
    }

    /// How often `fingerprint` occurs in this line, initial state included.
    #[must_use]
    pub fn repetitions(&self, fingerprint: Fingerprint) -> u32 {
        self.repetitions.get(&fingerprint).copied().unwrap_or(0)
    }

    // === Review cursor ===

    /// Step back one move. Returns false at the start.
    pub fn review_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Step forward one move. Returns false at the end.
    pub fn review_forward(&mut self) -> bool {
        if self.cursor >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Jump to the position after `n` moves, clamped to the ledger length.
    pub fn review_to(&mut self, n: usize) {
        self.cursor = n.min(self.entries.len());
    }

    pub fn review_to_end(&mut self) {
        self.cursor = self.entries.len();
    }

    #[must_use]
    pub fn review_position(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_reviewing(&self) -> bool {
        self.cursor < self.entries.len()
    }

    // === Accessors ===

    /// Every recorded move, ignoring the cursor.
    #[must_use]
    pub fn moves(&self) -> Vec<Move> {
        self.entries.iter().map(|e| e.mv.clone()).collect()
    }

    /// Moves up to the review cursor.
    #[must_use]
    pub fn moves_to_cursor(&self) -> Vec<Move> {
        self.entries
            .iter()
            .take(self.cursor)
            .map(|e| e.mv.clone())
            .collect()
    }

    #[must_use]
    pub fn entries(&self) -> &Vector<LedgerEntry> {
        &self.entries
    }

    #[must_use]
    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
