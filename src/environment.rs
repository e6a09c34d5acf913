use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};
use tracing::{info, trace};

use crate::error::{Error, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Free,
    Wall,
    Goal,
}

// Action
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Movement {
    Up,
    Down,
    Left,
    Right,
}

/// A cell coordinate. `x` is the row, `y` the column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Movement {
    /// Every movement, ordered by action id.
    pub const ALL: [Movement; 4] = [Movement::Up, Movement::Down, Movement::Left, Movement::Right];

    pub fn into_vector(self) -> (isize, isize) {
        match self {
            Movement::Up => (-1, 0),
            Movement::Down => (1, 0),
            Movement::Left => (0, -1),
            Movement::Right => (0, 1),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Movement::Up => 0,
            Movement::Down => 1,
            Movement::Left => 2,
            Movement::Right => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Movement> {
        Movement::ALL.get(index).copied()
    }

    pub fn arrow(self) -> char {
        match self {
            Movement::Up => '^',
            Movement::Down => 'v',
            Movement::Left => '<',
            Movement::Right => '>',
        }
    }
}

impl Distribution<Movement> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Movement {
        match rng.gen_range(0..4) {
            0 => Movement::Up,
            1 => Movement::Down,
            2 => Movement::Left,
            _ => Movement::Right,
        }
    }
}

impl FromStr for Movement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Movement::Up),
            "d" | "down" => Ok(Movement::Down),
            "l" | "left" => Ok(Movement::Left),
            "r" | "right" => Ok(Movement::Right),
            _ => Err(Error::InvalidDirection {
                input: s.to_string(),
            }),
        }
    }
}

/// Result of a single movement attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub ran_into_wall: bool,
    pub reached_goal: bool,
    /// Cell that was entered, `None` when the move left the grid.
    pub target: Option<Pos>,
}

const CLASSIC: [&str; 7] = [
    "########",
    "#S...#G#",
    "####.#.#",
    "#..#.#.#",
    "#....#.#",
    "#......#",
    "########",
];

#[derive(Debug, Clone)]
pub struct Maze {
    map: Array2<Cell>,
    start: Pos,
    pos: Pos,
    silent: bool,
}

impl Maze {
    /// Builds a maze from a grid and a start cell.
    ///
    /// The start must be a free cell and the grid must hold exactly one goal.
    /// The border is expected to be walled, but that is not checked: leaving
    /// the grid counts as running into a wall.
    pub fn new(map: Array2<Cell>, start: Pos) -> Result<Self> {
        if map.is_empty() {
            return Err(Error::InvalidMaze {
                message: "grid is empty".to_string(),
            });
        }
        match map.get([start.x, start.y]) {
            Some(Cell::Free) => {}
            Some(cell) => {
                return Err(Error::InvalidMaze {
                    message: format!("start {} is a {:?} cell", start, cell),
                })
            }
            None => {
                return Err(Error::InvalidMaze {
                    message: format!("start {} is outside the grid", start),
                })
            }
        }
        let goals = map.iter().filter(|cell| **cell == Cell::Goal).count();
        if goals != 1 {
            return Err(Error::InvalidMaze {
                message: format!("expected exactly one goal, found {}", goals),
            });
        }

        Ok(Self {
            map,
            start,
            pos: start,
            silent: false,
        })
    }

    /// The 7x8 board the game ships with.
    pub fn classic() -> Self {
        let map = Array2::from_shape_fn((CLASSIC.len(), CLASSIC[0].len()), |(x, y)| {
            match CLASSIC[x].as_bytes()[y] {
                b'#' => Cell::Wall,
                b'G' => Cell::Goal,
                _ => Cell::Free,
            }
        });
        let start = Pos::new(1, 1);
        Self {
            map,
            start,
            pos: start,
            silent: false,
        }
    }

    pub fn height(&self) -> usize {
        self.map.nrows()
    }

    pub fn width(&self) -> usize {
        self.map.ncols()
    }

    pub fn start_pos(&self) -> Pos {
        self.start
    }

    pub fn position(&self) -> Pos {
        self.pos
    }

    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        self.map.get([pos.x, pos.y]).copied()
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Turns narration of wall hits and victories off or on. Returns the
    /// previous setting.
    pub fn set_silent(&mut self, silent: bool) -> bool {
        std::mem::replace(&mut self.silent, silent)
    }

    pub fn reset(&mut self) {
        self.pos = self.start;
    }

    /// Parses a direction such as `up` or `l` and moves in it.
    pub fn turn(&mut self, direction: &str) -> Result<Transition> {
        let movement: Movement = direction.parse()?;
        Ok(self.step(movement))
    }

    /// Moves one cell. Landing on a wall or on the goal sends the agent back
    /// to the start before returning.
    pub fn step(&mut self, movement: Movement) -> Transition {
        let target = self.check_movement(self.pos, movement);
        let cell = target.map_or(Cell::Wall, |p| self.map[[p.x, p.y]]);
        trace!(from = %self.pos, ?movement, ?cell, "step");

        match (cell, target) {
            (Cell::Free, Some(new_pos)) => {
                self.pos = new_pos;
                Transition {
                    ran_into_wall: false,
                    reached_goal: false,
                    target,
                }
            }
            (Cell::Goal, _) => {
                if !self.silent {
                    info!("You won!");
                }
                self.pos = self.start;
                Transition {
                    ran_into_wall: false,
                    reached_goal: true,
                    target,
                }
            }
            _ => {
                if !self.silent {
                    info!("You ran into a wall. Resetting.");
                }
                self.pos = self.start;
                Transition {
                    ran_into_wall: true,
                    reached_goal: false,
                    target,
                }
            }
        }
    }

    fn check_movement(&self, pos: Pos, movement: Movement) -> Option<Pos> {
        let (dx, dy) = movement.into_vector();
        let x = pos.x.checked_add_signed(dx)?;
        let y = pos.y.checked_add_signed(dy)?;
        if x < self.height() && y < self.width() {
            Some(Pos { x, y })
        } else {
            None
        }
    }

    pub fn iter_all_coordinates(&self) -> EnvIter {
        EnvIter::new(self.height(), self.width())
    }
}

impl FromStr for Maze {
    type Err = Error;

    /// One row per line: `#` wall, `.` free, `S` start, `G` goal.
    fn from_str(s: &str) -> Result<Self> {
        let rows: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());

        let mut cells = Vec::with_capacity(height * width);
        let mut start = None;
        for (x, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(Error::InvalidMaze {
                    message: format!("row {} has a different width than row 0", x),
                });
            }
            for (y, c) in row.chars().enumerate() {
                let cell = match c {
                    '#' => Cell::Wall,
                    '.' => Cell::Free,
                    'G' => Cell::Goal,
                    'S' => {
                        if start.replace(Pos { x, y }).is_some() {
                            return Err(Error::InvalidMaze {
                                message: "more than one start cell".to_string(),
                            });
                        }
                        Cell::Free
                    }
                    other => {
                        return Err(Error::InvalidMaze {
                            message: format!("unknown cell '{}' at ({}, {})", other, x, y),
                        })
                    }
                };
                cells.push(cell);
            }
        }

        let start = start.ok_or_else(|| Error::InvalidMaze {
            message: "no start cell".to_string(),
        })?;
        let map = Array2::from_shape_vec((height, width), cells).map_err(|err| {
            Error::InvalidMaze {
                message: err.to_string(),
            }
        })?;
        Maze::new(map, start)
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (x, row) in self.map.outer_iter().enumerate() {
            for (y, cell) in row.iter().enumerate() {
                let pos = Pos { x, y };
                let c = if pos == self.pos {
                    '@'
                } else if pos == self.start {
                    'S'
                } else {
                    match cell {
                        Cell::Free => '.',
                        Cell::Wall => '#',
                        Cell::Goal => 'G',
                    }
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct EnvIter {
    currx: usize,
    curry: usize,
    height: usize,
    width: usize,
}

impl EnvIter {
    fn new(height: usize, width: usize) -> EnvIter {
        EnvIter {
            currx: 0,
            curry: 0,
            height,
            width,
        }
    }
}

impl Iterator for EnvIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Pos> {
        if self.currx >= self.height || self.width == 0 {
            return None;
        }
        let pos = Pos { x: self.currx, y: self.curry };
        self.curry += 1;
        if self.curry == self.width {
            self.curry = 0;
            self.currx += 1;
        }
        Some(pos)
    }
}
