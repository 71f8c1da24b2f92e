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

use proptest::prelude::*;
use rand::prelude::*;
use rand::Rng;
use riff_lookahead::*;

/// Plays up to `plies` random legal moves, stopping early if the game ends.
fn random_playout(board: &mut ReversiblePosition, rng: &mut StdRng, plies: usize) -> Vec<Snapshot> {
    let mut before = Vec::new();
    for _ in 0..plies {
        let moves = board.position_mut().legal_move_list();
        if moves.is_empty() {
            break;
        }
        let (from, to) = moves[rng.gen_range(0..moves.len())];
        before.push(board.snapshot());
        board.move_piece(from, to).unwrap();
    }
    before
}

/// Whether the king of `color` would be attacked after moving `from` to
/// `to`, checked on a scratch copy.
fn leaves_king_attacked(position: &Position, from: Square, to: Square) -> bool {
    let mut scratch = position.clone();
    let color = scratch.next_move();
    match scratch.move_piece(from, to) {
        Ok(_) => scratch.is_king_attacked(color),
        Err(_) => true,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every move offered as legal can be played and never exposes the king.
    #[test]
    fn prop_legal_moves_are_sound(seed in any::<u64>(), plies in 1..40usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = ReversiblePosition::default();
        random_playout(&mut board, &mut rng, plies);
        let position = board.position_mut();
        for (from, to) in position.legal_move_list() {
            prop_assert!(!leaves_king_attacked(position, from, to), "{} to {}", from, to);
        }
    }

    /// Undoing every move restores each earlier position exactly.
    #[test]
    fn prop_undo_restores_snapshots(seed in any::<u64>(), plies in 1..60usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = ReversiblePosition::default();
        let mut before = random_playout(&mut board, &mut rng, plies);
        prop_assert_eq!(board.depth(), before.len());
        while let Some(expected) = before.pop() {
            prop_assert!(board.undo().is_some());
            prop_assert_eq!(board.snapshot(), expected);
        }
        prop_assert_eq!(board.undo(), None);
    }

    /// The side to move alternates and the other side can never move.
    #[test]
    fn prop_turns_alternate(seed in any::<u64>(), plies in 1..40usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut position = Position::new();
        for _ in 0..plies {
            let moves = position.legal_move_list();
            if moves.is_empty() {
                break;
            }
            let mover = position.next_move();
            let idle = position.live_pieces(!mover).next().map(|piece| piece.square());
            if let Some(square) = idle {
                let error = position.move_piece(square, square).unwrap_err();
                prop_assert_eq!(
                    error.downcast_ref::<MoveError>(),
                    Some(&MoveError::OutOfTurn(!mover))
                );
            }
            let (from, to) = moves[rng.gen_range(0..moves.len())];
            position.move_piece(from, to).unwrap();
            prop_assert_eq!(position.next_move(), !mover);
        }
    }

    /// The agent's pick scores at least as well as every other root move.
    #[test]
    fn prop_best_move_dominates(seed in any::<u64>(), plies in 1..12usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = ReversiblePosition::default();
        random_playout(&mut board, &mut rng, plies);
        let snapshot = board.snapshot();
        let config = SearchConfig::with_depth(2);
        let agent = Agent::from_snapshot(snapshot.next_move(), config, &snapshot).unwrap();
        if let Some(best) = agent.best_move() {
            let top = best.effective_score(true);
            for node in agent.root() {
                prop_assert!(node.effective_score(true) <= top);
            }
        }
        prop_assert_eq!(agent.position().snapshot(), snapshot);
    }
}
