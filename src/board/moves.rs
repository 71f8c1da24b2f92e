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

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

use super::material::{Color, Material, PieceKind};
use super::square::Square;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("No piece on {0}")]
    EmptySquare(Square),
    #[error("It is not {0}'s turn to move")]
    OutOfTurn(Color),
    #[error("Not a legal move: {from} to {to}")]
    IllegalMove { from: Square, to: Square },
    #[error("Moving {from} to {to} leaves the king under attack")]
    KingExposed { from: Square, to: Square },
    #[error("The game is already over")]
    GameOver,
    #[error("Not a valid promotion piece")]
    InvalidPiece,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Expecting exactly one {0} king")]
    KingCount(Color),
    #[error("More than one piece placed on {0}")]
    Occupied(Square),
    #[error("{0} king is in check while the other side is to move")]
    IdleKingAttacked(Color),
}

bitflags! {
    /// What happened during a committed move. Several flags can be set at
    /// once, e.g. a promotion that captures and gives check.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Outcome: u16 {
        const CAPTURE = 1;
        const EN_PASSANT_CAPTURE = 1 << 1;
        const QUEENSIDE_CASTLING = 1 << 2;
        const KINGSIDE_CASTLING = 1 << 3;
        const CHECK = 1 << 4;
        const CHECK_MATE = 1 << 5;
        const DRAW = 1 << 6;
        const PAWN_PROMOTION = 1 << 7;
    }
}

impl Outcome {
    pub const NORMAL: Self = Self::empty();

    #[inline]
    pub fn is_normal(&self) -> bool {
        self.is_empty()
    }
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.intersects(Self::CAPTURE | Self::EN_PASSANT_CAPTURE)
    }
    #[inline]
    pub fn is_castle(&self) -> bool {
        self.intersects(Self::QUEENSIDE_CASTLING | Self::KINGSIDE_CASTLING)
    }
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.intersects(Self::CHECK_MATE | Self::DRAW)
    }
}

/// The piece a pawn is replaced with. `None` is what a promotion
/// collaborator answers when it has no selection, and is rejected.
#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
    None,
}

impl TryFrom<Promotion> for PieceKind {
    type Error = MoveError;

    fn try_from(value: Promotion) -> Result<Self, Self::Error> {
        match value {
            Promotion::Queen => Ok(PieceKind::Queen),
            Promotion::Rook => Ok(PieceKind::Rook),
            Promotion::Bishop => Ok(PieceKind::Bishop),
            Promotion::Knight => Ok(PieceKind::Knight),
            Promotion::None => Err(MoveError::InvalidPiece),
        }
    }
}

/// Answers which piece a pawn reaching `square` should become.
pub trait PawnPromoter: Send + Sync {
    fn promotion(&self, color: Color, square: Square) -> Promotion;
}

/// A fixed answer, used by the search agent and as the default.
impl PawnPromoter for Promotion {
    fn promotion(&self, _color: Color, _square: Square) -> Promotion {
        *self
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    pub fn from_color(color: Color) -> Self {
        match color {
            Color::White => Winner::White,
            Color::Black => Winner::Black,
        }
    }
    pub fn color(&self) -> Option<Color> {
        match self {
            Winner::White => Some(Color::White),
            Winner::Black => Some(Color::Black),
            Winner::Draw => None,
        }
    }
    #[inline]
    pub fn is_decisive(&self) -> bool {
        self.color().is_some()
    }
}

/// One committed move, as handed to the external move log.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRecord {
    pub material: Material,
    pub from: Square,
    pub to: Square,
    pub outcome: Outcome,
}

impl MoveRecord {
    pub fn new(material: Material, from: Square, to: Square, outcome: Outcome) -> Self {
        Self {
            material,
            from,
            to,
            outcome,
        }
    }
}
