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

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::castling::{CastleSide, KING_COLUMN};
use super::material::{Color, Material, PieceKind};
use super::square::{Direction, Mask, Offset, Square};

use PieceKind::*;

/// Read access a piece needs from the position it stands on.
pub trait BoardView {
    fn occupant(&self, square: Square) -> Option<&Piece>;

    /// Column offset (-1, 0 or +1) in which `pawn` may currently capture
    /// en passant.
    fn en_passant_offset(&self, pawn: &Piece) -> isize;

    /// Whether any opponent of `color` threatens `square`.
    fn is_threatened(&self, color: Color, square: Square) -> bool;
}

/// Index of a piece in the arena owned by its position.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId(u16);

impl PieceId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u16)
    }
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    material: Material,
    square: Square,
    has_moved: bool,
    legal: Option<Mask>,
}

impl Piece {
    pub(crate) fn new(material: Material, square: Square, has_moved: bool) -> Self {
        Self {
            material,
            square,
            has_moved,
            legal: None,
        }
    }

    #[inline]
    pub fn material(&self) -> Material {
        self.material
    }
    #[inline]
    pub fn color(&self) -> Color {
        self.material.color()
    }
    #[inline]
    pub fn kind(&self) -> PieceKind {
        self.material.kind()
    }
    #[inline]
    pub fn square(&self) -> Square {
        self.square
    }
    #[inline]
    pub fn has_moved(&self) -> bool {
        self.has_moved
    }
    #[inline]
    pub fn glyph(&self) -> char {
        self.material.glyph()
    }

    pub(crate) fn relocate(&mut self, square: Square) {
        self.square = square;
        self.has_moved = true;
    }

    pub(crate) fn restore(&mut self, square: Square, has_moved: bool) {
        self.square = square;
        self.has_moved = has_moved;
    }

    #[inline]
    pub(crate) fn cached_moves(&self) -> Option<Mask> {
        self.legal
    }
    #[inline]
    pub(crate) fn cache_moves(&mut self, destinations: Mask) {
        self.legal = Some(destinations);
    }
    #[inline]
    pub(crate) fn clear_cache(&mut self) {
        self.legal = None;
    }

    /// Destinations allowed by this piece's movement rule alone. King
    /// destinations already exclude attacked squares; nothing else here
    /// looks at the safety of the mover's own king.
    pub fn candidates(&self, board: &impl BoardView) -> Mask {
        match self.kind() {
            Pawn => self.pawn_candidates(board),
            Knight => self.unblocked(board, KNIGHT_REACH[self.square.to_index()]),
            Bishop => self.slide(board, Direction::diagonals()),
            Rook => self.slide(board, Direction::straights()),
            Queen => self.slide(board, Direction::iter()),
            King => self.king_candidates(board),
        }
    }

    /// Whether this piece attacks `target` from where it stands, regardless
    /// of whether moving there would be legal.
    pub fn threatens(&self, board: &impl BoardView, target: Square) -> bool {
        let vector = target - self.square;
        match self.kind() {
            Pawn => {
                let offset = vector.offset();
                offset.row == self.color().forward() && offset.column.abs() == 1
            }
            Knight => KNIGHT_REACH[self.square.to_index()].contains(target),
            King => KING_REACH[self.square.to_index()].contains(target),
            Bishop => vector.is_diagonal() && self.sees_through(board, vector.between()),
            Rook => vector.is_straight() && self.sees_through(board, vector.between()),
            Queen => vector.has_direct_path() && self.sees_through(board, vector.between()),
        }
    }

    // An opposing king does not block the line, otherwise it could step
    // back along the line it is attacked on.
    fn sees_through(&self, board: &impl BoardView, lane: Mask) -> bool {
        lane.iter().all(|square| match board.occupant(square) {
            None => true,
            Some(other) => other.kind().is_king() && other.color() != self.color(),
        })
    }

    fn slide(&self, board: &impl BoardView, directions: impl Iterator<Item = Direction>) -> Mask {
        let mut mask = Mask::empty();
        for direction in directions {
            let mut next = self.square + direction;
            while let Some(square) = next {
                if let Some(other) = board.occupant(square) {
                    if other.color() != self.color() {
                        mask |= square;
                    }
                    break;
                }
                mask |= square;
                next = square + direction;
            }
        }
        mask
    }

    fn unblocked(&self, board: &impl BoardView, reach: Mask) -> Mask {
        reach
            .iter()
            .filter(|&square| {
                board
                    .occupant(square)
                    .map_or(true, |other| other.color() != self.color())
            })
            .collect()
    }

    fn pawn_candidates(&self, board: &impl BoardView) -> Mask {
        let mut mask = Mask::empty();
        let step = Offset::new(self.color().forward(), 0);
        let Some(one) = self.square + step else {
            return mask;
        };
        if board.occupant(one).is_none() {
            mask |= one;
            if !self.has_moved {
                if let Some(two) = one + step {
                    if board.occupant(two).is_none() {
                        mask |= two;
                    }
                }
            }
        }
        let en_passant = board.en_passant_offset(self);
        for side in [-1, 1] {
            let Some(diagonal) = one + Offset::new(0, side) else {
                continue;
            };
            match board.occupant(diagonal) {
                Some(other) if other.color() != self.color() => mask |= diagonal,
                None if en_passant == side => mask |= diagonal,
                _ => {}
            }
        }
        mask
    }

    fn king_candidates(&self, board: &impl BoardView) -> Mask {
        let color = self.color();
        let mut mask = self.unblocked(board, KING_REACH[self.square.to_index()]);
        for square in mask.iter() {
            if board.is_threatened(color, square) {
                mask.reset(square);
            }
        }
        if !self.has_moved
            && self.square.column() == KING_COLUMN
            && !board.is_threatened(color, self.square)
        {
            for side in CastleSide::BOTH {
                if self.can_castle(board, side) {
                    mask |= side.king_dest(self.square);
                }
            }
        }
        mask
    }

    fn can_castle(&self, board: &impl BoardView, side: CastleSide) -> bool {
        let rook_ready = match board.occupant(side.rook_src(self.square)) {
            Some(rook) => {
                rook.kind().is_rook() && rook.color() == self.color() && !rook.has_moved()
            }
            None => false,
        };
        rook_ready
            && side.lane(self.square).iter().all(|square| {
                board.occupant(square).is_none() && !board.is_threatened(self.color(), square)
            })
    }
}

static KNIGHT_REACH: Lazy<[Mask; 64]> = Lazy::new(|| {
    const OFFSETS: [Offset; 8] = [
        Offset::new(-2, -1),
        Offset::new(-2, 1),
        Offset::new(2, -1),
        Offset::new(2, 1),
        Offset::new(-1, -2),
        Offset::new(-1, 2),
        Offset::new(1, -2),
        Offset::new(1, 2),
    ];
    let mut array = [Mask::empty(); 64];
    for square in Square::iter() {
        array[square.to_index()] = OFFSETS.iter().filter_map(|offset| square + offset).collect();
    }
    array
});

static KING_REACH: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::empty(); 64];
    for square in Square::iter() {
        array[square.to_index()] = Direction::iter().filter_map(|dir| square + dir).collect();
    }
    array
});

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    fn kings() -> Snapshot {
        Snapshot::new(Color::White)
            .with(E1, Material::WK)
            .with(E8, Material::BK)
    }

    fn candidates(position: &Position, square: Square) -> Mask {
        position.piece_at(square).unwrap().candidates(position)
    }

    #[test]
    fn test_rook_ray_stops_at_first_piece() {
        let position = Position::from_snapshot(
            &kings()
                .with(D4, Material::WR)
                .with(D6, Material::BN)
                .with(F4, Material::WP),
        )
        .unwrap();
        let mask = candidates(&position, D4);
        assert!(mask.contains(D5));
        assert!(mask.contains(D6));
        assert!(!mask.contains(D7));
        assert!(mask.contains(E4));
        assert!(!mask.contains(F4));
        assert!(mask.contains(D1));
        assert!(mask.contains(A4));
        assert_eq!(mask.len(), 2 + 1 + 3 + 3);
    }
    #[test]
    fn test_knight_candidates_skip_own_pieces() {
        let position = Position::from_snapshot(
            &kings().with(B1, Material::WN).with(D2, Material::WP).with(C3, Material::BP),
        )
        .unwrap();
        let mask = candidates(&position, B1);
        assert_eq!(mask, Mask::from_squares([A3, C3]));
    }
    #[test]
    fn test_bishop_threat_sees_through_opposing_king() {
        let position = Position::from_snapshot(
            &Snapshot::new(Color::Black)
                .with(H1, Material::WK)
                .with(C3, Material::BK)
                .with(A1, Material::WB),
        )
        .unwrap();
        let bishop = position.piece_at(A1).unwrap();
        assert!(bishop.threatens(&position, B2));
        assert!(bishop.threatens(&position, D4));
        assert!(!bishop.threatens(&position, A2));
    }
    #[test]
    fn test_rook_threat_is_blocked_by_other_pieces() {
        let position = Position::from_snapshot(
            &kings().with(A4, Material::BR).with(C4, Material::WP),
        )
        .unwrap();
        let rook = position.piece_at(A4).unwrap();
        assert!(rook.threatens(&position, B4));
        assert!(rook.threatens(&position, C4));
        assert!(!rook.threatens(&position, D4));
        assert!(!rook.threatens(&position, A4));
    }
    #[test]
    fn test_pawn_threatens_diagonals_only() {
        let position = Position::new();
        let pawn = position.piece_at(E2).unwrap();
        assert!(pawn.threatens(&position, D3));
        assert!(pawn.threatens(&position, F3));
        assert!(!pawn.threatens(&position, E3));
        let pawn = position.piece_at(D7).unwrap();
        assert!(pawn.threatens(&position, C6));
        assert!(!pawn.threatens(&position, C8));
    }
    #[test]
    fn test_pawn_single_and_double_step() {
        let position = Position::new();
        assert_eq!(candidates(&position, E2), Mask::from_squares([E3, E4]));
        assert_eq!(candidates(&position, B7), Mask::from_squares([B6, B5]));
    }
    #[test]
    fn test_moved_pawn_has_no_double_step() {
        let position = Position::from_snapshot(&kings().with_moved(C3, Material::WP)).unwrap();
        assert_eq!(candidates(&position, C3), Mask::from_squares([C4]));
    }
    #[test]
    fn test_blocked_pawn_has_no_double_step() {
        let position = Position::from_snapshot(
            &kings().with(C2, Material::WP).with(C3, Material::BN).with(D3, Material::BN),
        )
        .unwrap();
        assert_eq!(candidates(&position, C2), Mask::from_squares([D3]));
    }
    #[test]
    fn test_king_avoids_attacked_squares() {
        let position = Position::from_snapshot(&kings().with(A2, Material::BR)).unwrap();
        let mask = candidates(&position, E1);
        assert!(mask.contains(D1));
        assert!(mask.contains(F1));
        assert!(!mask.contains(D2));
        assert!(!mask.contains(E2));
        assert!(!mask.contains(F2));
    }
    #[test]
    fn test_king_offers_both_castles() {
        let position = Position::from_snapshot(
            &kings().with(A1, Material::WR).with(H1, Material::WR),
        )
        .unwrap();
        let mask = candidates(&position, E1);
        assert!(mask.contains(G1));
        assert!(mask.contains(C1));
    }
    #[test]
    fn test_no_castle_with_moved_rook_or_blocked_lane() {
        let position = Position::from_snapshot(
            &kings()
                .with_moved(A1, Material::WR)
                .with(H1, Material::WR)
                .with(G1, Material::WN),
        )
        .unwrap();
        let mask = candidates(&position, E1);
        assert!(!mask.contains(G1));
        assert!(!mask.contains(C1));
    }
    #[test]
    fn test_no_castle_through_attacked_square() {
        let position = Position::from_snapshot(
            &kings()
                .with(A1, Material::WR)
                .with(H1, Material::WR)
                .with(B5, Material::BR)
                .with(F5, Material::BR),
        )
        .unwrap();
        let mask = candidates(&position, E1);
        assert!(!mask.contains(G1));
        assert!(!mask.contains(C1));
    }
    #[test]
    fn test_no_castle_out_of_check() {
        let position = Position::from_snapshot(
            &kings().with(H1, Material::WR).with(E5, Material::BR),
        )
        .unwrap();
        assert!(!candidates(&position, E1).contains(G1));
    }
}
