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
use log::{debug, warn};
use thiserror::Error;

use super::tree::{best_index, MoveNode};
use super::weights::{material_balance, SearchConfig, MATE_SCORE};
use crate::board::{
    Color, MoveError, MoveRecord, Position, Promotion, ReversiblePosition, Snapshot, Square, Turn,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("No move available for {0}")]
    NoMoveAvailable(Color),
}

/// The promotion the agent always chooses for its own pawns.
const AGENT_PROMOTION: Promotion = Promotion::Queen;

/// Plays one color by exhaustive fixed-depth minimax over a private copy of
/// the game. The tree is kept between turns: the branch matching each move
/// actually played becomes the new root and is deepened by one ply.
#[derive(Debug, Clone)]
pub struct Agent {
    color: Color,
    config: SearchConfig,
    board: ReversiblePosition,
    root: Vec<MoveNode>,
}

impl Agent {
    /// An agent for `color` starting from the standard position.
    pub fn new(color: Color, config: SearchConfig) -> Self {
        let mut agent = Self {
            color,
            config,
            board: ReversiblePosition::default(),
            root: Vec::new(),
        };
        agent.build_tree();
        agent
    }

    pub fn from_snapshot(color: Color, config: SearchConfig, snapshot: &Snapshot) -> Result<Self> {
        let mut agent = Self {
            color,
            config,
            board: ReversiblePosition::new(Position::from_snapshot(snapshot)?),
            root: Vec::new(),
        };
        agent.build_tree();
        Ok(agent)
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }
    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
    #[inline]
    pub fn root(&self) -> &[MoveNode] {
        &self.root
    }
    pub fn position(&self) -> &Position {
        self.board.position()
    }

    /// Replaces the private position with `snapshot` and searches afresh.
    pub fn sync(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.board.load_external_position(snapshot)?;
        self.build_tree();
        Ok(())
    }

    pub fn build_tree(&mut self) {
        let mut root = Vec::new();
        self.explorer().build(&mut root, 0);
        debug!(
            "{} built a tree of {} nodes",
            self.color,
            root.iter().map(MoveNode::node_count).sum::<usize>()
        );
        self.root = root;
    }

    /// Extends every leaf short of the configured depth by one ply.
    pub fn fill_tree(&mut self) {
        let mut root = std::mem::take(&mut self.root);
        self.explorer().fill(&mut root, 0);
        self.root = root;
    }

    pub fn best_move(&self) -> Option<&MoveNode> {
        best_index(&self.root).map(|index| &self.root[index])
    }

    /// Plays the best root move on both the private position and
    /// `external`, then keeps the chosen branch as the new tree.
    pub fn do_next_move(&mut self, external: &mut Position) -> Result<MoveRecord> {
        if self.root.is_empty() && self.board.position().winner().is_none() {
            self.build_tree();
        }
        let index = best_index(&self.root).ok_or(SearchError::NoMoveAvailable(self.color))?;
        let (from, to) = (self.root[index].from(), self.root[index].to());
        let material = external
            .piece_at(from)
            .map(|piece| piece.material())
            .ok_or(MoveError::EmptySquare(from))?;
        self.board.move_with(from, to, &AGENT_PROMOTION)?;
        let outcome = match external.move_with(from, to, &AGENT_PROMOTION) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.board.undo();
                return Err(error);
            }
        };

        let chosen = self.root.swap_remove(index);
        debug!(
            "{} plays {} to {} scoring {}",
            self.color,
            from,
            to,
            chosen.effective_score(true)
        );
        self.root = chosen.into_children();
        self.fill_tree();
        Ok(MoveRecord::new(material, from, to, outcome))
    }

    /// Follows a move made by the opponent, reusing the matching branch of
    /// the tree when there is exactly one.
    pub fn register_opponent_move(&mut self, from: Square, to: Square) -> Result<()> {
        self.board.move_piece(from, to)?;
        let matching: Vec<usize> = self
            .root
            .iter()
            .enumerate()
            .filter(|(_, node)| node.matches(from, to))
            .map(|(index, _)| index)
            .collect();
        if let [index] = matching[..] {
            debug!("{} reuses the branch for {} to {}", self.color, from, to);
            self.root = self.root.swap_remove(index).into_children();
            self.fill_tree();
        } else {
            warn!("{} to {} not among the searched replies, rebuilding", from, to);
            self.build_tree();
        }
        Ok(())
    }

    fn explorer(&mut self) -> Explorer<'_> {
        Explorer {
            board: &mut self.board,
            color: self.color,
            depth: self.config.depth,
        }
    }
}

impl Turn for Agent {
    fn turn(&self) -> Color {
        self.board.turn()
    }
}

/// Walks the private position with make/undo while growing a tree.
struct Explorer<'a> {
    board: &'a mut ReversiblePosition,
    color: Color,
    depth: usize,
}

impl Explorer<'_> {
    fn build(&mut self, nodes: &mut Vec<MoveNode>, level: usize) {
        if level >= self.depth {
            return;
        }
        for (from, to) in self.board.position_mut().legal_move_list() {
            let score = self.score(from, to);
            if let Err(error) = self.board.move_with(from, to, &AGENT_PROMOTION) {
                warn!("skipping {} to {}: {}", from, to, error);
                continue;
            }
            let mut node = MoveNode::new(from, to, score);
            if let Some(winner) = self.board.position().winner().and_then(|winner| winner.color()) {
                node.set_score(if winner == self.color { MATE_SCORE } else { -MATE_SCORE });
            }
            self.build(node.children_mut(), level + 1);
            self.board.undo();
            nodes.push(node);
        }
    }

    fn fill(&mut self, nodes: &mut Vec<MoveNode>, level: usize) {
        if level >= self.depth {
            return;
        }
        if nodes.is_empty() {
            self.build(nodes, level);
            return;
        }
        for node in nodes.iter_mut() {
            if self.board.move_with(node.from(), node.to(), &AGENT_PROMOTION).is_err() {
                continue;
            }
            self.fill(node.children_mut(), level + 1);
            self.board.undo();
        }
    }

    // Material before the move, without whatever the move would capture.
    fn score(&self, from: Square, to: Square) -> i32 {
        let position = self.board.position();
        let captured = position
            .capture_square(from, to)
            .and_then(|square| position.piece_id_at(square));
        material_balance(position, self.color, captured)
    }
}
