//! Mapping between maze cells and Q-table rows, and between action ids and
//! movements.

use crate::environment::{Maze, Movement, Pos};

pub const NUM_ACTIONS: usize = 4;

/// Flattens grid coordinates into a state index, column-major:
/// `x + y * height`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StateCodec {
    height: usize,
    width: usize,
}

impl StateCodec {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn for_maze(maze: &Maze) -> Self {
        Self::new(maze.height(), maze.width())
    }

    pub fn num_states(&self) -> usize {
        self.height * self.width
    }

    pub fn encode(&self, pos: Pos) -> usize {
        pos.x + pos.y * self.height
    }

    pub fn decode(&self, state: usize) -> Option<Pos> {
        if state >= self.num_states() {
            return None;
        }
        Some(Pos::new(state % self.height, state / self.height))
    }
}

/// 0 = up, 1 = down, 2 = left, 3 = right.
pub fn decode_action(action: usize) -> Option<Movement> {
    Movement::from_index(action)
}
