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

use serde::{Deserialize, Serialize};

use crate::board::{Color, PieceId, PieceKind, Position};

/// Score of a move that mates. Large enough that no material swing within
/// the search horizon can outweigh it.
pub const MATE_SCORE: i32 = 1_000_000;

pub const DEFAULT_DEPTH: usize = 3;

pub const fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight => 3,
        PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 100,
    }
}

/// Material of `color` minus material of its opponent, leaving out
/// `excluded` (the piece a pending move would capture).
pub fn material_balance(position: &Position, color: Color, excluded: Option<PieceId>) -> i32 {
    let total = |side: Color| -> i32 {
        position
            .live_ids(side)
            .iter()
            .filter(|id| Some(**id) != excluded)
            .map(|id| piece_value(position.piece(*id).kind()))
            .sum()
    };
    total(color) - total(!color)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies explored below the current position.
    pub depth: usize,
}

impl SearchConfig {
    pub fn with_depth(depth: usize) -> Self {
        Self { depth }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { depth: DEFAULT_DEPTH }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    #[test]
    fn test_start_is_balanced() {
        let position = Position::new();
        assert_eq!(material_balance(&position, Color::White, None), 0);
        assert_eq!(material_balance(&position, Color::Black, None), 0);
    }
    #[test]
    fn test_excluded_piece_is_not_counted() {
        let position = Position::new();
        let queen = position.piece_id_at(D8);
        assert_eq!(material_balance(&position, Color::White, queen), 9);
        assert_eq!(material_balance(&position, Color::Black, queen), -9);
    }
    #[test]
    fn test_default_depth() {
        assert_eq!(SearchConfig::default().depth, 3);
        assert_eq!(piece_value(PieceKind::King), 100);
    }
}
