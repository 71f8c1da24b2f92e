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
use std::ops::Sub;
use strum::IntoEnumIterator;

use super::square::{Mask, Offset, Square};

/// The displacement from one square to another.
///
/// `to - from` yields the vector that starts at `from` and ends at `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveVector {
    from: Square,
    to: Square,
}

impl MoveVector {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
    #[inline]
    pub fn from(&self) -> Square {
        self.from
    }
    #[inline]
    pub fn to(&self) -> Square {
        self.to
    }
    #[inline]
    pub fn offset(&self) -> Offset {
        Offset::new(
            self.to.row() as isize - self.from.row() as isize,
            self.to.column() as isize - self.from.column() as isize,
        )
    }
    pub fn is_straight(&self) -> bool {
        let offset = self.offset();
        (offset.row == 0) != (offset.column == 0)
    }
    pub fn is_diagonal(&self) -> bool {
        let offset = self.offset();
        offset.row != 0 && offset.row.abs() == offset.column.abs()
    }
    #[inline]
    pub fn has_direct_path(&self) -> bool {
        self.is_straight() || self.is_diagonal()
    }
    /// Chebyshev distance of at most one, i.e. a king could step across it.
    pub fn is_adjacent(&self) -> bool {
        let offset = self.offset();
        offset.row.abs() <= 1 && offset.column.abs() <= 1
    }

    /// The strictly intermediate squares, empty when there is no direct path.
    #[inline]
    pub fn between(&self) -> Mask {
        SQUARES_BETWEEN[self.from.to_index() * 64 + self.to.to_index()]
    }

    /// The strictly intermediate squares in order, walking from `from`
    /// toward `to`.
    pub fn squares(&self) -> Vec<Square> {
        let mut result = Vec::new();
        if let Some(step) = self.offset().to_unit() {
            let mut next = self.from + step;
            while let Some(square) = next {
                if square == self.to {
                    break;
                }
                result.push(square);
                next = square + step;
            }
        }
        result
    }
}

impl Sub for Square {
    type Output = MoveVector;
    fn sub(self, rhs: Self) -> Self::Output {
        MoveVector::new(rhs, self)
    }
}

static SQUARES_BETWEEN: Lazy<[Mask; 64 * 64]> = Lazy::new(|| {
    let mut array = [Mask::empty(); 64 * 64];
    for from in Square::iter() {
        for to in Square::iter() {
            let vector = MoveVector::new(from, to);
            array[from.to_index() * 64 + to.to_index()] = Mask::from_squares(vector.squares());
        }
    }
    array
});
