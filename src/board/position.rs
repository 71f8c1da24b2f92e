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
use log::{debug, trace};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use strum::IntoEnumIterator;

use super::castling::CastleSide;
use super::material::{Color, Material, Pair, PieceKind};
use super::moves::{LayoutError, MoveError, Outcome, PawnPromoter, Promotion, Winner};
use super::piece::{BoardView, Piece, PieceId};
use super::square::{Mask, Square};
use super::Turn;

use Color::*;
use MoveError::*;

/// One live piece as it appears in a `Snapshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub square: Square,
    pub material: Material,
    pub has_moved: bool,
}

/// A detached copy of everything that identifies a position: the live
/// pieces of each color in live-list order, whose turn it is, the result
/// and the most recent move of each color.
///
/// Two positions that compare equal by snapshot behave identically. The
/// same type is used to inject a non-standard layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    placements: Vec<Placement>,
    next_move: Color,
    winner: Option<Winner>,
    recent: Pair<Option<(Square, Square)>>,
}

impl Snapshot {
    pub fn new(next_move: Color) -> Self {
        Self {
            placements: Vec::new(),
            next_move,
            winner: None,
            recent: Pair::default(),
        }
    }

    pub fn standard() -> Self {
        let mut snapshot = Self::new(White);
        for (column, kind) in PieceKind::BACK_RANK.into_iter().enumerate() {
            snapshot = snapshot
                .with(Square::new(White.pawn_row(), column), Material::WP)
                .with(Square::new(White.back_row(), column), Material::white(kind))
                .with(Square::new(Black.back_row(), column), Material::black(kind))
                .with(Square::new(Black.pawn_row(), column), Material::BP);
        }
        snapshot
    }

    pub fn with(self, square: Square, material: Material) -> Self {
        self.place(square, material, false)
    }

    pub fn with_moved(self, square: Square, material: Material) -> Self {
        self.place(square, material, true)
    }

    pub fn with_recent(mut self, color: Color, from: Square, to: Square) -> Self {
        self.recent[color] = Some((from, to));
        self
    }

    fn place(mut self, square: Square, material: Material, has_moved: bool) -> Self {
        self.placements.push(Placement {
            square,
            material,
            has_moved,
        });
        self
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
    pub fn next_move(&self) -> Color {
        self.next_move
    }
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }
    pub fn recent_move(&self, color: Color) -> Option<(Square, Square)> {
        self.recent[color]
    }
}

/// The mutable board and the single authority on move legality.
///
/// Pieces live in an arena owned by the position and are addressed by
/// `PieceId`. Captured pieces stay in the arena (they are only dropped
/// from the grid and from their live list) so that a move can be undone.
#[derive(Clone)]
pub struct Position {
    grid: [Option<PieceId>; 64],
    pieces: Vec<Piece>,
    live: Pair<Vec<PieceId>>,
    kings: Pair<PieceId>,
    attack_lines: BTreeMap<PieceId, Mask>,
    next_move: Color,
    winner: Option<Winner>,
    recent: Pair<Option<(Square, Square)>>,
    promoter: Arc<dyn PawnPromoter>,
}

/// What `apply` changed, with enough detail for `revert` to restore the
/// position exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Delta {
    pub id: PieceId,
    pub from: Square,
    pub to: Square,
    pub had_moved: bool,
    pub captured: Option<Captured>,
    pub promoted: Option<Promoted>,
    pub castled: Option<CastleSide>,
    pub prior_recent: Option<(Square, Square)>,
    pub prior_winner: Option<Winner>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Captured {
    pub id: PieceId,
    pub square: Square,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Promoted {
    pub id: PieceId,
    pub pawn_slot: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Turn for Position {
    #[inline]
    fn turn(&self) -> Color {
        self.next_move
    }
}

impl AsRef<Position> for Position {
    fn as_ref(&self) -> &Position {
        self
    }
}

impl Position {
    /// The standard starting position. Promotions become queens until
    /// another promoter is supplied.
    pub fn new() -> Self {
        // Safety: the standard layout has exactly one king of each color
        Self::from_snapshot(&Snapshot::standard()).unwrap()
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let mut grid = [None; 64];
        let mut pieces = Vec::with_capacity(snapshot.placements().len());
        let mut live: Pair<Vec<PieceId>> = Pair::default();
        let mut kings: Pair<Option<PieceId>> = Pair::default();
        for placement in snapshot.placements() {
            let index = placement.square.to_index();
            if grid[index].is_some() {
                return Err(LayoutError::Occupied(placement.square).into());
            }
            let id = PieceId::new(pieces.len());
            let color = placement.material.color();
            pieces.push(Piece::new(placement.material, placement.square, placement.has_moved));
            grid[index] = Some(id);
            live[color].push(id);
            if placement.material.kind().is_king() && kings[color].replace(id).is_some() {
                return Err(LayoutError::KingCount(color).into());
            }
        }
        let white = kings[White].ok_or(LayoutError::KingCount(White))?;
        let black = kings[Black].ok_or(LayoutError::KingCount(Black))?;
        let mut position = Self {
            grid,
            pieces,
            live,
            kings: Pair::new(white, black),
            attack_lines: BTreeMap::new(),
            next_move: snapshot.next_move(),
            winner: snapshot.winner(),
            recent: snapshot.recent,
            promoter: Arc::new(Promotion::Queen),
        };
        // the side that just moved can't be left in check
        let idle = !position.next_move;
        if position.is_king_attacked(idle) {
            return Err(LayoutError::IdleKingAttacked(idle).into());
        }
        position.attack_lines.clear();
        Ok(position)
    }

    pub fn with_promoter(mut self, promoter: Arc<dyn PawnPromoter>) -> Self {
        self.set_promoter(promoter);
        self
    }

    pub fn set_promoter(&mut self, promoter: Arc<dyn PawnPromoter>) {
        self.promoter = promoter;
    }

    pub(crate) fn promoter(&self) -> Arc<dyn PawnPromoter> {
        Arc::clone(&self.promoter)
    }

    /// Back to the standard starting position, keeping the promoter.
    pub fn setup(&mut self) {
        let promoter = self.promoter();
        *self = Self::new().with_promoter(promoter);
    }

    pub fn snapshot(&self) -> Snapshot {
        let placements = Color::iter()
            .flat_map(|color| self.live_pieces(color))
            .map(|piece| Placement {
                square: piece.square(),
                material: piece.material(),
                has_moved: piece.has_moved(),
            })
            .collect();
        Snapshot {
            placements,
            next_move: self.next_move,
            winner: self.winner,
            recent: self.recent,
        }
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.piece_id_at(square).map(|id| self.piece(id))
    }
    #[inline]
    pub fn piece_id_at(&self, square: Square) -> Option<PieceId> {
        self.grid[square.to_index()]
    }
    #[inline]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.index()]
    }
    pub fn live_ids(&self, color: Color) -> &[PieceId] {
        &self.live[color]
    }
    pub fn live_pieces(&self, color: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.live[color].iter().map(|id| self.piece(*id))
    }
    #[inline]
    pub fn king(&self, color: Color) -> &Piece {
        self.piece(self.kings[color])
    }
    #[inline]
    pub fn next_move(&self) -> Color {
        self.next_move
    }
    #[inline]
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }
    #[inline]
    pub fn recent_move(&self, color: Color) -> Option<(Square, Square)> {
        self.recent[color]
    }
    /// Attack lines into the king most recently checked, keyed by attacker.
    pub fn attack_lines(&self) -> &BTreeMap<PieceId, Mask> {
        &self.attack_lines
    }

    /// The square whose occupant the move `from` to `to` removes, which is
    /// beside the origin rather than on the destination for en passant.
    pub fn capture_square(&self, from: Square, to: Square) -> Option<Square> {
        if self.grid[to.to_index()].is_some() {
            return Some(to);
        }
        let piece = self.piece_at(from)?;
        if piece.kind().is_pawn() && from.column() != to.column() {
            return Some(Square::new(from.row(), to.column()));
        }
        None
    }

    /// Whether an opponent of `color` attacks `square`. When `square` holds
    /// the king of `color`, each attacker's line into it is recorded.
    pub fn is_square_attacked(&mut self, color: Color, square: Square) -> bool {
        let attackers = self.attackers(color, square);
        if self.grid[square.to_index()] == Some(self.kings[color]) {
            for id in &attackers {
                let from = self.piece(*id).square();
                let line = (square - from).between() | from;
                *self.attack_lines.entry(*id).or_default() |= line;
            }
        }
        !attackers.is_empty() || self.next_to_opposing_king(color, square)
    }

    pub fn is_king_attacked(&mut self, color: Color) -> bool {
        self.attack_lines.clear();
        let square = self.king(color).square();
        self.is_square_attacked(color, square)
    }

    pub fn legal_moves(&mut self, id: PieceId) -> Mask {
        let index = id.index();
        if let Some(cached) = self.pieces[index].cached_moves() {
            return cached;
        }
        let piece = self.pieces[index].clone();
        let from = piece.square();
        let mut destinations = piece.candidates(&*self);
        if !piece.kind().is_king() && self.is_king_attacked(piece.color()) {
            destinations = match self.single_attack_line() {
                Some(line) => destinations
                    .iter()
                    .filter(|&to| {
                        line.contains(to)
                            || self
                                .capture_square(from, to)
                                .is_some_and(|square| line.contains(square))
                    })
                    .collect(),
                None => Mask::empty(),
            };
        }
        for to in destinations.iter() {
            if self.exposes_king(id, to) {
                destinations.reset(to);
            }
        }
        self.pieces[index].cache_moves(destinations);
        destinations
    }

    pub fn legal_moves_at(&mut self, square: Square) -> Mask {
        match self.piece_id_at(square) {
            Some(id) => self.legal_moves(id),
            None => Mask::empty(),
        }
    }

    pub fn has_legal_moves(&mut self, color: Color) -> bool {
        for slot in 0..self.live[color].len() {
            let id = self.live[color][slot];
            if !self.legal_moves(id).is_empty() {
                return true;
            }
        }
        false
    }

    /// Every legal move of the side to move, piece by piece in live-list
    /// order. Empty once the game has a result.
    pub fn legal_move_list(&mut self) -> Vec<(Square, Square)> {
        let mut result = Vec::new();
        if self.winner.is_some() {
            return result;
        }
        let ids = self.live[self.next_move].clone();
        for id in ids {
            let from = self.piece(id).square();
            result.extend(self.legal_moves(id).iter().map(|to| (from, to)));
        }
        result
    }

    pub fn move_piece(&mut self, from: Square, to: Square) -> Result<Outcome> {
        let promoter = self.promoter();
        self.move_with(from, to, promoter.as_ref())
    }

    /// Like `move_piece` but asks `promoter` rather than the position's own
    /// promoter should the move promote a pawn.
    pub fn move_with(
        &mut self,
        from: Square,
        to: Square,
        promoter: &dyn PawnPromoter,
    ) -> Result<Outcome> {
        self.apply(from, to, promoter).map(|delta| delta.outcome)
    }

    pub(crate) fn apply(
        &mut self,
        from: Square,
        to: Square,
        promoter: &dyn PawnPromoter,
    ) -> Result<Delta> {
        let id = self.piece_id_at(from).ok_or(EmptySquare(from))?;
        let piece = self.piece(id).clone();
        let color = piece.color();
        if self.winner.is_some() {
            return Err(GameOver.into());
        }
        if color != self.next_move {
            return Err(OutOfTurn(color).into());
        }
        if !self.legal_moves(id).contains(to) {
            return Err(IllegalMove { from, to }.into());
        }
        // resolved before anything changes so a bad answer leaves the
        // position untouched
        let promotion = if piece.kind().is_pawn() && to.row() == color.far_row() {
            Some(PieceKind::try_from(promoter.promotion(color, to))?)
        } else {
            None
        };

        let mut delta = Delta {
            id,
            from,
            to,
            had_moved: piece.has_moved(),
            captured: None,
            promoted: None,
            castled: None,
            prior_recent: self.recent[color],
            prior_winner: self.winner,
            outcome: Outcome::NORMAL,
        };
        self.recent[color] = Some((from, to));

        if let Some(square) = self.capture_square(from, to) {
            if let Some(victim) = self.grid[square.to_index()] {
                let slot = self.remove_live(victim);
                self.grid[square.to_index()] = None;
                delta.captured = Some(Captured { id: victim, square, slot });
                delta.outcome |= if square == to {
                    Outcome::CAPTURE
                } else {
                    Outcome::EN_PASSANT_CAPTURE
                };
            }
        }

        if let Some(kind) = promotion {
            let pawn_slot = self.remove_live(id);
            let promoted = PieceId::new(self.pieces.len());
            self.pieces.push(Piece::new(Material::new(color, kind), to, false));
            self.live[color].push(promoted);
            self.grid[from.to_index()] = None;
            self.grid[to.to_index()] = Some(promoted);
            delta.promoted = Some(Promoted { id: promoted, pawn_slot });
            delta.outcome |= Outcome::PAWN_PROMOTION;
        } else {
            if piece.kind().is_king() && !piece.has_moved() {
                if let Some(side) = CastleSide::from_king_move(from, to) {
                    let rook_src = side.rook_src(from);
                    if let Some(rook) = self.piece_id_at(rook_src) {
                        self.shift(rook, rook_src, side.rook_dest(from));
                        delta.castled = Some(side);
                        delta.outcome |= side.outcome();
                    }
                }
            }
            self.shift(id, from, to);
        }

        self.clear_caches();
        if self.is_king_attacked(color) {
            self.revert(&delta);
            return Err(KingExposed { from, to }.into());
        }
        self.next_move = !color;
        delta.outcome |= self.evaluate();
        trace!("{} {} to {}: {:?}", color, from, to, delta.outcome);
        Ok(delta)
    }

    /// Undoes `delta`, which must be the most recent change applied.
    pub(crate) fn revert(&mut self, delta: &Delta) {
        let color = self.piece(delta.id).color();
        if let Some(promoted) = delta.promoted {
            self.live[color].retain(|id| *id != promoted.id);
            debug_assert_eq!(promoted.id.index() + 1, self.pieces.len());
            self.pieces.truncate(promoted.id.index());
            self.grid[delta.to.to_index()] = None;
            self.live[color].insert(promoted.pawn_slot, delta.id);
        } else {
            if let Some(side) = delta.castled {
                let rook_dest = side.rook_dest(delta.from);
                let rook_src = side.rook_src(delta.from);
                if let Some(rook) = self.grid[rook_dest.to_index()].take() {
                    self.grid[rook_src.to_index()] = Some(rook);
                    self.pieces[rook.index()].restore(rook_src, false);
                }
            }
            self.grid[delta.to.to_index()] = None;
        }
        self.grid[delta.from.to_index()] = Some(delta.id);
        self.pieces[delta.id.index()].restore(delta.from, delta.had_moved);

        if let Some(captured) = delta.captured {
            let victim_color = self.piece(captured.id).color();
            self.live[victim_color].insert(captured.slot, captured.id);
            self.grid[captured.square.to_index()] = Some(captured.id);
        }
        self.next_move = color;
        self.recent[color] = delta.prior_recent;
        self.winner = delta.prior_winner;
        self.attack_lines.clear();
        self.clear_caches();
        trace!("{} took back {} to {}", color, delta.from, delta.to);
    }

    fn evaluate(&mut self) -> Outcome {
        let color = self.next_move;
        let attacked = self.is_king_attacked(color);
        let can_move = self.has_legal_moves(color);
        let (outcome, winner) = match (attacked, can_move) {
            (true, true) => (Outcome::CHECK, None),
            (true, false) => (Outcome::CHECK_MATE, Some(Winner::from_color(!color))),
            (false, false) => (Outcome::DRAW, Some(Winner::Draw)),
            (false, true) => (Outcome::NORMAL, None),
        };
        if attacked {
            debug!("{} king attacked by {} piece(s)", color, self.attack_lines.len());
        }
        if self.winner.is_none() && winner.is_some() {
            debug!("game decided: {:?}", winner);
            self.winner = winner;
        }
        outcome
    }

    fn shift(&mut self, id: PieceId, from: Square, to: Square) {
        self.grid[from.to_index()] = None;
        self.grid[to.to_index()] = Some(id);
        self.pieces[id.index()].relocate(to);
    }

    fn remove_live(&mut self, id: PieceId) -> usize {
        let list = &mut self.live[self.pieces[id.index()].color()];
        // Safety: every piece on the grid is in its color's live list
        let slot = list.iter().position(|other| *other == id).unwrap();
        list.remove(slot);
        slot
    }

    fn clear_caches(&mut self) {
        self.pieces.iter_mut().for_each(Piece::clear_cache);
    }

    fn single_attack_line(&self) -> Option<Mask> {
        if self.attack_lines.len() == 1 {
            self.attack_lines.values().next().copied()
        } else {
            None
        }
    }

    fn attackers(&self, color: Color, square: Square) -> Vec<PieceId> {
        self.live[!color]
            .iter()
            .copied()
            .filter(|id| {
                let piece = self.piece(*id);
                !piece.kind().is_king() && piece.threatens(self, square)
            })
            .collect()
    }

    fn next_to_opposing_king(&self, color: Color, square: Square) -> bool {
        (square - self.king(!color).square()).is_adjacent()
    }

    // Lifts the piece onto `to` (removing whatever the move captures),
    // checks its king, then puts everything back.
    fn exposes_king(&mut self, id: PieceId, to: Square) -> bool {
        let piece = self.piece(id);
        let color = piece.color();
        let from = piece.square();
        let is_king = piece.kind().is_king();
        let king = if is_king { to } else { self.king(color).square() };
        let victim_square = self.capture_square(from, to);
        if !is_king {
            // only a piece on a line with its king can uncover an attack on it
            let in_line = |square: Square| (king - square).has_direct_path();
            let uncovers_victim =
                victim_square.is_some_and(|square| square != to && in_line(square));
            if !in_line(from) && !uncovers_victim {
                return false;
            }
        }
        let victim = victim_square
            .and_then(|square| self.grid[square.to_index()].map(|v| (square, v)));
        let saved = self.grid[to.to_index()];
        self.grid[from.to_index()] = None;
        if let Some((square, _)) = victim {
            self.grid[square.to_index()] = None;
        }
        self.grid[to.to_index()] = Some(id);

        let exposed = self.live[!color].iter().any(|other| {
            let attacker = self.piece(*other);
            victim.map_or(true, |(_, v)| v != *other)
                && !attacker.kind().is_king()
                && attacker.threatens(&*self, king)
        }) || (is_king && self.next_to_opposing_king(color, to));

        self.grid[to.to_index()] = saved;
        if let Some((square, v)) = victim {
            self.grid[square.to_index()] = Some(v);
        }
        self.grid[from.to_index()] = Some(id);
        exposed
    }
}

impl BoardView for Position {
    #[inline]
    fn occupant(&self, square: Square) -> Option<&Piece> {
        self.piece_at(square)
    }

    fn en_passant_offset(&self, pawn: &Piece) -> isize {
        if !pawn.kind().is_pawn() || pawn.color() != self.next_move {
            return 0;
        }
        let Some((from, to)) = self.recent[!pawn.color()] else {
            return 0;
        };
        let passed = match self.piece_at(to) {
            Some(passed) if passed.kind().is_pawn() && passed.color() != pawn.color() => passed,
            _ => return 0,
        };
        if from.row().abs_diff(to.row()) != 2 || passed.square().row() != pawn.square().row() {
            return 0;
        }
        match to.column() as isize - pawn.square().column() as isize {
            side @ (-1 | 1) => side,
            _ => 0,
        }
    }

    fn is_threatened(&self, color: Color, square: Square) -> bool {
        self.live[!color].iter().any(|id| {
            let piece = self.piece(*id);
            !piece.kind().is_king() && piece.threatens(self, square)
        }) || self.next_to_opposing_king(color, square)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..8 {
            for column in 0..8 {
                match self.piece_at(Square::new(row, column)) {
                    Some(piece) => write!(f, "{}", piece.glyph())?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "{} to move", self.next_move)
    }
}
