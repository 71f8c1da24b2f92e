// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use anyhow::Result;
use log::trace;

use super::material::Color;
use super::moves::{Outcome, PawnPromoter};
use super::position::{Delta, Position, Snapshot};
use super::square::Square;
use super::Turn;

/// A position that remembers how to take back every move applied to it,
/// most recent first. Used by the search to walk the game tree in place.
#[derive(Debug, Clone, Default)]
pub struct ReversiblePosition {
    position: Position,
    history: Vec<Delta>,
}

impl ReversiblePosition {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            history: Vec::new(),
        }
    }

    pub fn move_piece(&mut self, from: Square, to: Square) -> Result<Outcome> {
        let promoter = self.position.promoter();
        self.move_with(from, to, promoter.as_ref())
    }

    pub fn move_with(
        &mut self,
        from: Square,
        to: Square,
        promoter: &dyn PawnPromoter,
    ) -> Result<Outcome> {
        let delta = self.position.apply(from, to, promoter)?;
        let outcome = delta.outcome;
        self.history.push(delta);
        Ok(outcome)
    }

    /// Takes back the most recent move and returns its origin and
    /// destination, or `None` when there is nothing left to undo.
    pub fn undo(&mut self) -> Option<(Square, Square)> {
        let delta = self.history.pop()?;
        self.position.revert(&delta);
        Some((delta.from, delta.to))
    }

    /// Replaces the whole position with `snapshot`. Moves made before the
    /// load can no longer be undone.
    pub fn load_external_position(&mut self, snapshot: &Snapshot) -> Result<()> {
        let promoter = self.position.promoter();
        self.position = Position::from_snapshot(snapshot)?.with_promoter(promoter);
        self.history.clear();
        trace!("loaded position, {} to move", snapshot.next_move());
        Ok(())
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    pub fn snapshot(&self) -> Snapshot {
        self.position.snapshot()
    }

    /// Number of moves that can still be undone.
    #[inline]
    pub fn depth(&self) -> usize {
        self.history.len()
    }
}

impl From<Position> for ReversiblePosition {
    fn from(position: Position) -> Self {
        Self::new(position)
    }
}

impl AsRef<Position> for ReversiblePosition {
    fn as_ref(&self) -> &Position {
        &self.position
    }
}

impl Turn for ReversiblePosition {
    #[inline]
    fn turn(&self) -> Color {
        self.position.turn()
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    fn round_trip(board: &mut ReversiblePosition, from: Square, to: Square) -> Outcome {
        let before = board.snapshot();
        let outcome = board.move_piece(from, to).unwrap();
        assert_ne!(board.snapshot(), before);
        assert_eq!(board.undo(), Some((from, to)));
        assert_eq!(board.snapshot(), before);
        outcome
    }

    fn played(moves: &[(Square, Square)]) -> ReversiblePosition {
        let mut board = ReversiblePosition::default();
        for (from, to) in moves {
            board.move_piece(*from, *to).unwrap();
        }
        board
    }

    #[test]
    fn test_undo_on_fresh_board() {
        let mut board = ReversiblePosition::default();
        assert_eq!(board.undo(), None);
        assert_eq!(board.depth(), 0);
    }
    #[test]
    fn test_undo_normal_move() {
        let mut board = played(&[]);
        assert_eq!(round_trip(&mut board, E2, E4), Outcome::NORMAL);
        assert_eq!(board.turn(), Color::White);
        assert!(!board.position().piece_at(E2).unwrap().has_moved());
    }
    #[test]
    fn test_undo_capture() {
        let mut board = played(&[(E2, E4), (D7, D5)]);
        assert!(round_trip(&mut board, E4, D5).contains(Outcome::CAPTURE));
        assert_eq!(board.position().live_ids(Color::Black).len(), 16);
    }
    #[test]
    fn test_undo_en_passant() {
        let mut board = played(&[(E2, E4), (A7, A6), (E4, E5), (D7, D5)]);
        assert!(round_trip(&mut board, E5, D6).contains(Outcome::EN_PASSANT_CAPTURE));
        assert!(board.position_mut().legal_moves_at(E5).contains(D6));
    }
    #[test]
    fn test_undo_castle() {
        let mut board = played(&[(E2, E4), (E7, E5), (G1, F3), (B8, C6), (F1, C4), (G8, F6)]);
        assert!(round_trip(&mut board, E1, G1).contains(Outcome::KINGSIDE_CASTLING));
        assert!(!board.position().piece_at(H1).unwrap().has_moved());
        assert!(board.position_mut().legal_moves_at(E1).contains(G1));
    }
    #[test]
    fn test_undo_promotion() {
        let snapshot = Snapshot::new(Color::Black)
            .with(E1, Material::WK)
            .with(B1, Material::WN)
            .with_moved(A2, Material::BP)
            .with(H8, Material::BK);
        let mut board = ReversiblePosition::default();
        board.load_external_position(&snapshot).unwrap();
        assert!(round_trip(&mut board, A2, B1).contains(Outcome::PAWN_PROMOTION));
        assert_eq!(board.position().piece_at(A2).unwrap().material(), Material::BP);
        assert_eq!(board.position().piece_at(B1).unwrap().material(), Material::WN);
    }
    #[test]
    fn test_undo_restores_result() {
        let mut board = played(&[(F2, F3), (E7, E5), (G2, G4)]);
        let outcome = round_trip(&mut board, D8, H4);
        assert!(outcome.contains(Outcome::CHECK_MATE));
        assert_eq!(board.position().winner(), None);
    }
    #[test]
    fn test_undo_sequence() {
        let mut board = ReversiblePosition::default();
        let start = board.snapshot();
        for (from, to) in [(E2, E4), (E7, E5), (G1, F3), (B8, C6)] {
            board.move_piece(from, to).unwrap();
        }
        assert_eq!(board.depth(), 4);
        while board.undo().is_some() {}
        assert_eq!(board.snapshot(), start);
    }
    #[test]
    fn test_failed_move_is_not_recorded() {
        let mut board = ReversiblePosition::default();
        assert!(board.move_piece(E2, E5).is_err());
        assert_eq!(board.depth(), 0);
    }
    #[test]
    fn test_load_external_position() {
        let mut board = played(&[(E2, E4)]);
        let snapshot = Snapshot::new(Color::Black)
            .with(E1, Material::WK)
            .with(E8, Material::BK)
            .with_recent(Color::White, E2, E1);
        board.load_external_position(&snapshot).unwrap();
        assert_eq!(board.depth(), 0);
        assert_eq!(board.undo(), None);
        assert_eq!(board.snapshot(), snapshot);
        assert_eq!(board.turn(), Color::Black);
    }
    #[test]
    fn test_load_rejects_missing_king() {
        let mut board = ReversiblePosition::default();
        let snapshot = Snapshot::new(Color::White).with(E1, Material::WK);
        assert!(board.load_external_position(&snapshot).is_err());
        assert_eq!(board.snapshot(), Position::new().snapshot());
    }
}
