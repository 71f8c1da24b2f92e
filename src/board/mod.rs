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

//! Chess rules engine
//!
//! A _position_ holds the state of an 8-by-8 board and decides which
//! moves are legal. The following rules are supported:
//!
//! [x] Standard piece movement and captures
//! [x] Castling on either side
//! [x] En passant, immediately after the double step only
//! [x] Pawn promotion through a pluggable collaborator
//! [x] Check, checkmate and stalemate detection
//! [x] Undo of any number of moves
//! [ ] Repetition and fifty-move draws
//!
//! Some of the key abstractions include:
//!
//! * A `Square` names one of the 64 squares (`A8` .. `H1`). Squares are
//!   indexed row by row starting at Black's back rank, so row 0 holds
//!   `A8` .. `H8` and White's pawns advance toward lower rows.
//!
//! * A `Mask` is a 64-bit (u64) value in which each bit maps to a
//!   square. Legal move destinations and attack lines are masks.
//!
//! * A `MoveVector` is the displacement between two squares and knows
//!   which squares lie strictly between them.
//!
//! * `Material` is a `PieceKind` of a given `Color`. A `Piece` is
//!   material standing on a square, together with whether it has ever
//!   moved and a cache of its legal destinations.
//!
//! * A `Position` owns every piece (live or captured), the grid, whose
//!   turn it is and the result once the game has one. `move_piece` is
//!   the only way to change it and rejects anything illegal.
//!
//! * A `ReversiblePosition` wraps a position and records what each
//!   move changed so that moves can be taken back in reverse order.
//!
//! * A `Snapshot` is a detached copy of a position. It is how custom
//!   layouts are injected and how two positions are compared.
//!

mod castling;
mod material;
mod moves;
mod piece;
mod position;
mod reversible;
mod square;
mod vector;

pub use castling::*;
pub use material::*;
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use reversible::*;
pub use square::*;
pub use vector::*;

pub trait Turn {
    fn turn(&self) -> Color;
}
