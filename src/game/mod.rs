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

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::board::{
    Color, Mask, MoveError, MoveRecord, Outcome, PawnPromoter, Piece, Position, Snapshot, Square,
    Turn, Winner,
};
use crate::search::{Agent, SearchConfig};

/// Receives every committed move and, once, the result of the game.
pub trait GameListener {
    fn move_committed(&mut self, _record: &MoveRecord) {}
    fn game_over(&mut self, _winner: Winner) {}
}

/// A game between two external players, or between an external player
/// and an `Agent`. Keeps the visible position and the move log.
pub struct Game {
    position: Position,
    records: Vec<MoveRecord>,
    agent: Option<Agent>,
    listener: Option<Box<dyn GameListener>>,
    reported: bool,
}

impl Game {
    pub fn new(promoter: Arc<dyn PawnPromoter>) -> Self {
        Self {
            position: Position::new().with_promoter(promoter),
            records: Vec::new(),
            agent: None,
            listener: None,
            reported: false,
        }
    }

    pub fn against_agent(
        promoter: Arc<dyn PawnPromoter>,
        agent_color: Color,
        config: SearchConfig,
    ) -> Self {
        let mut game = Self::new(promoter);
        game.agent = Some(Agent::new(agent_color, config));
        game
    }

    pub fn from_snapshot(
        snapshot: &Snapshot,
        promoter: Arc<dyn PawnPromoter>,
        agent: Option<(Color, SearchConfig)>,
    ) -> Result<Self> {
        let agent = match agent {
            Some((color, config)) => Some(Agent::from_snapshot(color, config, snapshot)?),
            None => None,
        };
        Ok(Self {
            position: Position::from_snapshot(snapshot)?.with_promoter(promoter),
            records: Vec::new(),
            agent,
            listener: None,
            reported: snapshot.winner().is_some(),
        })
    }

    pub fn with_listener(mut self, listener: Box<dyn GameListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Lets the agent open when it plays the side to move.
    pub fn start(&mut self) -> Result<Option<MoveRecord>> {
        if !self.agent_to_move() {
            return Ok(None);
        }
        let record = match self.agent.as_mut() {
            Some(agent) => agent.do_next_move(&mut self.position)?,
            None => return Ok(None),
        };
        self.commit(record);
        Ok(Some(record))
    }

    /// Plays a move for the external side, then the agent's reply if there
    /// is an agent and the game goes on.
    pub fn submit_move(&mut self, from: Square, to: Square) -> Result<Outcome> {
        if self.agent_to_move() {
            return Err(MoveError::OutOfTurn(self.position.turn()).into());
        }
        let material = self
            .position
            .piece_at(from)
            .map(Piece::material)
            .ok_or(MoveError::EmptySquare(from))?;
        let outcome = self.position.move_piece(from, to)?;
        self.commit(MoveRecord::new(material, from, to, outcome));

        if self.position.winner().is_some() {
            return Ok(outcome);
        }
        let reply = match self.agent.as_mut() {
            Some(agent) => {
                // the external promotion choice may differ from the agent's
                if outcome.contains(Outcome::PAWN_PROMOTION) {
                    agent.sync(&self.position.snapshot())?;
                } else {
                    agent.register_opponent_move(from, to)?;
                }
                if agent.color() == self.position.turn() {
                    Some(agent.do_next_move(&mut self.position)?)
                } else {
                    None
                }
            }
            None => None,
        };
        if let Some(record) = reply {
            self.commit(record);
        }
        Ok(outcome)
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.position.piece_at(square)
    }
    pub fn legal_moves(&mut self, square: Square) -> Mask {
        self.position.legal_moves_at(square)
    }
    #[inline]
    pub fn winner(&self) -> Option<Winner> {
        self.position.winner()
    }
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }
    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    fn agent_to_move(&self) -> bool {
        self.position.winner().is_none()
            && self
                .agent
                .as_ref()
                .is_some_and(|agent| agent.color() == self.position.turn())
    }

    fn commit(&mut self, record: MoveRecord) {
        if let Some(listener) = self.listener.as_mut() {
            listener.move_committed(&record);
        }
        self.records.push(record);
        if let Some(winner) = self.position.winner() {
            if !self.reported {
                self.reported = true;
                info!("game over after {} moves: {}", self.records.len(), winner);
                if let Some(listener) = self.listener.as_mut() {
                    listener.game_over(winner);
                }
            }
        }
    }
}

impl Turn for Game {
    #[inline]
    fn turn(&self) -> Color {
        self.position.turn()
    }
}

impl AsRef<Position> for Game {
    fn as_ref(&self) -> &Position {
        &self.position
    }
}
