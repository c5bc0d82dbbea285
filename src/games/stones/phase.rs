//! Turn phases of the capture game.

/// Where a turn stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for `place`, `capture`, `pick` or `pass`.
    Play,
    /// A stone lifted from cell `from` waits to be dropped.
    Holding { from: usize },
    GameOver,
}

/// Something that moves the phase machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Pick(usize),
    /// Drop onto the cell the stone was lifted from.
    DropBack,
    /// Any move that completes a turn while play continues.
    EndTurn,
    /// A move that ends the game.
    Finish,
}

impl Phase {
    /// The phase after `step`. Panics on a step the phase does not allow.
    #[must_use]
    pub fn after(self, step: Step) -> Phase {
        match (self, step) {
            (Phase::Play, Step::Pick(from)) => Phase::Holding { from },
            (Phase::Play, Step::EndTurn) => Phase::Play,
            (Phase::Play, Step::Finish) => Phase::GameOver,
            (Phase::Holding { .. }, Step::DropBack) => Phase::Play,
            (Phase::Holding { .. }, Step::EndTurn) => Phase::Play,
            (Phase::Holding { .. }, Step::Finish) => Phase::GameOver,
            (Phase::Play, Step::DropBack)
            | (Phase::Holding { .. }, Step::Pick(_))
            | (Phase::GameOver, _) => panic!("{step:?} is not allowed in phase {self:?}"),
        }
    }

    #[must_use]
    pub fn code(self) -> usize {
        match self {
            Phase::Play => 0,
            Phase::Holding { .. } => 1,
            Phase::GameOver => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_then_drop() {
        let holding = Phase::Play.after(Step::Pick(4));
        assert_eq!(holding, Phase::Holding { from: 4 });
        assert_eq!(holding.after(Step::DropBack), Phase::Play);
        assert_eq!(holding.after(Step::EndTurn), Phase::Play);
    }

    #[test]
    #[should_panic(expected = "not allowed")]
    fn test_no_moves_after_game_over() {
        let _ = Phase::GameOver.after(Step::EndTurn);
    }
}
