//! Moves and their wire format.
//!
//! A `Move` is an operation code plus a short list of operands and an optional
//! acting seat. Games name their op codes through a `Vocabulary`, which is
//! what turns a move into its canonical text form and back:
//!
//! ```
//! use rust_boardgame::core::{Move, OpCode, Operand, PlayerId, Vocabulary};
//!
//! const DROP: OpCode = OpCode::game(1);
//! let vocab = Vocabulary::new(&[(DROP, "dropb")]);
//!
//! let mv = Move::new(DROP)
//!     .with_operands(&[Operand::Col('C'), Operand::Int(4)])
//!     .by(PlayerId::new(1));
//! let text = mv.encode(&vocab).unwrap();
//! assert_eq!(text, "dropb C 4 P1");
//! assert_eq!(Move::decode(&text, &vocab).unwrap(), mv);
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use super::player::PlayerId;

/// Operation code of a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpCode(pub u16);

impl OpCode {
    /// Game start marker.
    pub const START: OpCode = OpCode(0);
    /// End of a multi-step turn.
    pub const DONE: OpCode = OpCode(1);
    pub const PASS: OpCode = OpCode(2);
    pub const RESIGN: OpCode = OpCode(3);

    /// First code available to game modules.
    pub const FIRST_GAME: u16 = 100;

    /// Game-specific op code number `n`.
    #[must_use]
    pub const fn game(n: u16) -> Self {
        Self(Self::FIRST_GAME + n)
    }

    #[must_use]
    pub const fn is_standard(self) -> bool {
        self.0 < Self::FIRST_GAME
    }
}

/// A single move operand: an integer or a column letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Int(i32),
    Col(char),
}

impl Operand {
    /// Numeric value; column letters map to 0-based indices (`A` = 0).
    #[must_use]
    pub fn value(self) -> i32 {
        match self {
            Operand::Int(v) => v,
            Operand::Col(c) => c as i32 - 'A' as i32,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Some(Operand::Col(c)),
            _ => token.parse::<i32>().ok().map(Operand::Int),
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "{v}"),
            Operand::Col(c) => write!(f, "{c}"),
        }
    }
}

/// An immutable move value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub op: OpCode,
    pub operands: SmallVec<[Operand; 4]>,
    pub player: Option<PlayerId>,
}

impl Move {
    #[must_use]
    pub fn new(op: OpCode) -> Self {
        Self {
            op,
            operands: SmallVec::new(),
            player: None,
        }
    }

    #[must_use]
    pub fn pass(player: PlayerId) -> Self {
        Self::new(OpCode::PASS).by(player)
    }

    #[must_use]
    pub fn done(player: PlayerId) -> Self {
        Self::new(OpCode::DONE).by(player)
    }

    #[must_use]
    pub fn with_operands(mut self, operands: &[Operand]) -> Self {
        self.operands = SmallVec::from_slice(operands);
        self
    }

    /// Shorthand for a `column row` cell operand pair.
    #[must_use]
    pub fn at(self, col: usize, row: usize) -> Self {
        self.with_operands(&[Operand::Col((b'A' + col as u8) as char), Operand::Int(row as i32)])
    }

    #[must_use]
    pub fn by(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Operand `i` as a number, if present.
    #[must_use]
    pub fn operand(&self, i: usize) -> Option<i32> {
        self.operands.get(i).map(|o| o.value())
    }

    /// Decode a `column row` pair written by [`Move::at`].
    #[must_use]
    pub fn cell(&self) -> Option<(usize, usize)> {
        let col = self.operand(0)?;
        let row = self.operand(1)?;
        (col >= 0 && row >= 0).then_some((col as usize, row as usize))
    }

    /// Canonical text form. Fails if `vocab` has no keyword for the op code.
    pub fn encode(&self, vocab: &Vocabulary) -> Result<String, WireError> {
        let keyword = vocab.keyword(self.op).ok_or(WireError::UnknownOp(self.op))?;
        Ok(self.write(keyword))
    }

    /// Text for logs and error messages. An op code without a keyword is
    /// written as `#<code>`.
    #[must_use]
    pub fn describe(&self, vocab: &Vocabulary) -> String {
        match vocab.keyword(self.op) {
            Some(keyword) => self.write(keyword),
            None => self.write(&format!("#{}", self.op.0)),
        }
    }

    fn write(&self, keyword: &str) -> String {
        let mut out = String::from(keyword);
        for operand in &self.operands {
            out.push(' ');
            out.push_str(&operand.to_string());
        }
        if let Some(p) = self.player {
            out.push(' ');
            out.push_str(&p.to_string());
        }
        out
    }

    /// Parse the canonical text form.
    pub fn decode(text: &str, vocab: &Vocabulary) -> Result<Self, WireError> {
        let mut tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(WireError::Empty);
        }

        let keyword = tokens.remove(0);
        let op = vocab
            .op(keyword)
            .ok_or_else(|| WireError::UnknownKeyword(keyword.to_string()))?;

        let player = match tokens.last() {
            // A bare "P" is column P, not a seat.
            Some(last) if last.len() > 1 && last.starts_with('P') => {
                let p = PlayerId::from_token(last)
                    .ok_or_else(|| WireError::BadPlayer(last.to_string()))?;
                tokens.pop();
                Some(p)
            }
            _ => None,
        };

        let operands = tokens
            .iter()
            .map(|t| Operand::parse(t).ok_or_else(|| WireError::BadOperand(t.to_string())))
            .collect::<Result<SmallVec<[Operand; 4]>, _>>()?;

        Ok(Self { op, operands, player })
    }
}

/// Errors from the move and record wire formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("empty move text")]
    Empty,

    #[error("unknown move keyword '{0}'")]
    UnknownKeyword(String),

    #[error("op code {0:?} has no keyword")]
    UnknownOp(OpCode),

    #[error("malformed operand '{0}'")]
    BadOperand(String),

    #[error("malformed player token '{0}'")]
    BadPlayer(String),

    #[error("malformed setup token: {0}")]
    BadSetup(String),
}

/// Keyword table for one game's op codes.
///
/// Always includes the standard keywords `start`, `done`, `pass`, `resign`.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    entries: Vec<(OpCode, &'static str)>,
}

impl Vocabulary {
    const STANDARD: [(OpCode, &'static str); 4] = [
        (OpCode::START, "start"),
        (OpCode::DONE, "done"),
        (OpCode::PASS, "pass"),
        (OpCode::RESIGN, "resign"),
    ];

    /// Build a vocabulary from game-specific entries.
    ///
    /// Panics on a duplicate code or keyword; vocabularies are static tables
    /// and a clash is a programming error.
    #[must_use]
    pub fn new(game_entries: &[(OpCode, &'static str)]) -> Self {
        let mut entries: Vec<(OpCode, &'static str)> = Self::STANDARD.to_vec();
        for &(op, kw) in game_entries {
            assert!(
                !entries.iter().any(|&(o, k)| o == op || k == kw),
                "duplicate vocabulary entry {op:?} '{kw}'"
            );
            entries.push((op, kw));
        }
        Self { entries }
    }

    #[must_use]
    pub fn keyword(&self, op: OpCode) -> Option<&'static str> {
        self.entries.iter().find(|(o, _)| *o == op).map(|(_, k)| *k)
    }

    #[must_use]
    pub fn op(&self, keyword: &str) -> Option<OpCode> {
        self.entries
            .iter()
            .find(|(_, k)| k.eq_ignore_ascii_case(keyword))
            .map(|(o, _)| *o)
    }
}
