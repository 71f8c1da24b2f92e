// Copyright 2026 Tobin Edwards
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

use super::moves::Outcome;
use super::square::{Mask, Square};

/// Castling is only ever offered to a king standing on this column.
pub const KING_COLUMN: usize = 4;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

use CastleSide::*;

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [Kingside, Queenside];

    /// Recognizes a king move of more than one column along its row.
    pub fn from_king_move(from: Square, to: Square) -> Option<Self> {
        if from.row() != to.row() || from.column().abs_diff(to.column()) < 2 {
            return None;
        }
        Some(if to.column() > from.column() { Kingside } else { Queenside })
    }

    #[inline]
    pub const fn king_dest_column(&self) -> usize {
        match self {
            Kingside => 6,
            Queenside => 2,
        }
    }
    #[inline]
    pub const fn rook_src_column(&self) -> usize {
        match self {
            Kingside => 7,
            Queenside => 0,
        }
    }
    #[inline]
    pub const fn rook_dest_column(&self) -> usize {
        match self {
            Kingside => 5,
            Queenside => 3,
        }
    }

    #[inline]
    pub fn king_dest(&self, king: Square) -> Square {
        king.with_column(self.king_dest_column())
    }
    #[inline]
    pub fn rook_src(&self, king: Square) -> Square {
        king.with_column(self.rook_src_column())
    }
    #[inline]
    pub fn rook_dest(&self, king: Square) -> Square {
        king.with_column(self.rook_dest_column())
    }

    /// Squares strictly between the king and its rook. All of them must be
    /// empty and unattacked.
    pub fn lane(&self, king: Square) -> Mask {
        (self.rook_src(king) - king).between()
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Kingside => Outcome::KINGSIDE_CASTLING,
            Queenside => Outcome::QUEENSIDE_CASTLING,
        }
    }
}
