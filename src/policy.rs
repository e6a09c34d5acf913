use std::collections::HashMap;

use crate::codec::{decode_action, StateCodec};
use crate::environment::{Cell, Maze, Movement, Pos};
use crate::q_table::QTable;

// Represents deterministic policy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetPolicy {
    pub policy: HashMap<Pos, Movement>,
}

impl DetPolicy {
    /// Greedy movement for every free cell of the maze.
    pub fn from_q_table(maze: &Maze, codec: &StateCodec, q_table: &QTable) -> Self {
        let mut policy = HashMap::new();
        for pos in maze.iter_all_coordinates() {
            if maze.cell(pos) != Some(Cell::Free) {
                continue;
            }
            if let Some(movement) = decode_action(q_table.greedy_action(codec.encode(pos))) {
                policy.insert(pos, movement);
            }
        }
        Self { policy }
    }

    pub fn action(&self, pos: Pos) -> Option<Movement> {
        self.policy.get(&pos).copied()
    }

    /// Draws the maze with an arrow on every cell that has an action.
    pub fn render(&self, maze: &Maze) -> String {
        let mut out = String::new();
        for x in 0..maze.height() {
            for y in 0..maze.width() {
                let pos = Pos::new(x, y);
                let c = match (maze.cell(pos), self.action(pos)) {
                    (_, Some(movement)) => movement.arrow(),
                    (Some(Cell::Goal), _) => 'G',
                    (Some(Cell::Free), None) => '.',
                    _ => '#',
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}
