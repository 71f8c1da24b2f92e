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

use crate::board::Square;

/// A candidate move with its own score and the replies explored below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveNode {
    from: Square,
    to: Square,
    score: i32,
    children: Vec<MoveNode>,
}

impl MoveNode {
    pub fn new(from: Square, to: Square, score: i32) -> Self {
        Self {
            from,
            to,
            score,
            children: Vec::new(),
        }
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
    pub fn score(&self) -> i32 {
        self.score
    }
    pub(crate) fn set_score(&mut self, score: i32) {
        self.score = score;
    }
    #[inline]
    pub fn children(&self) -> &[MoveNode] {
        &self.children
    }
    pub(crate) fn children_mut(&mut self) -> &mut Vec<MoveNode> {
        &mut self.children
    }
    pub fn into_children(self) -> Vec<MoveNode> {
        self.children
    }
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
    #[inline]
    pub fn matches(&self, from: Square, to: Square) -> bool {
        self.from == from && self.to == to
    }

    /// Own score plus the best continuation below it. Children of a node
    /// played by the agent contribute their maximum, children of an
    /// opponent node their minimum, alternating at each level.
    pub fn effective_score(&self, agent_move: bool) -> i32 {
        let continuations = self.children.iter().map(|child| child.effective_score(!agent_move));
        let best = if agent_move {
            continuations.max()
        } else {
            continuations.min()
        };
        self.score + best.unwrap_or(0)
    }

    /// Total number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MoveNode::node_count).sum::<usize>()
    }

    /// Plies below and including this node along the longest branch.
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(MoveNode::height).max().unwrap_or(0)
    }
}

/// Index of the first root node with the greatest effective score.
pub fn best_index(nodes: &[MoveNode]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (index, node) in nodes.iter().enumerate() {
        let score = node.effective_score(true);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    fn node(score: i32, children: Vec<MoveNode>) -> MoveNode {
        let mut node = MoveNode::new(E2, E4, score);
        *node.children_mut() = children;
        node
    }

    #[test]
    fn test_leaf_score() {
        assert_eq!(node(7, vec![]).effective_score(true), 7);
        assert_eq!(node(7, vec![]).effective_score(false), 7);
        assert!(node(7, vec![]).is_leaf());
        assert!(!node(7, vec![node(1, vec![])]).is_leaf());
    }
    #[test]
    fn test_alternating_propagation() {
        let tree = node(
            1,
            vec![
                node(2, vec![node(10, vec![]), node(-4, vec![])]),
                node(5, vec![node(0, vec![])]),
            ],
        );
        // children of the agent node take the max; their children the min
        assert_eq!(tree.effective_score(true), 1 + 5);
        assert_eq!(tree.effective_score(false), 1 + (2 + 10).min(5));
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.height(), 3);
    }
    #[test]
    fn test_first_maximum_wins() {
        let nodes = vec![node(1, vec![]), node(3, vec![]), node(3, vec![]), node(2, vec![])];
        assert_eq!(best_index(&nodes), Some(1));
        assert_eq!(best_index(&[]), None);
    }
}
