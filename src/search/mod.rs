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

//! Lookahead search
//!
//! An `Agent` plays one color. It keeps a private `ReversiblePosition`
//! in step with the game and a tree of `MoveNode`s rooted at the current
//! ply, explored to a fixed depth with make/undo. Node scores are material
//! balances from the agent's point of view, and mates are scored
//! `MATE_SCORE`. There is no pruning: every legal move is explored.

mod agent;
mod tree;
mod weights;

pub use agent::*;
pub use tree::*;
pub use weights::*;
