//! Human play on a line-based terminal

use std::io::{BufRead, Write};

use crate::environment::Maze;
use crate::error::{Error, Result};

const PROMPT: &str = "Which direction do you want to go? ";
const QUIT_WORDS: [&str; 3] = ["q", "quit", "exit"];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Won { turns: usize },
    Quit,
    InputClosed,
}

/// Reads directions from `input` until the goal is reached, a quit word is
/// typed or the input ends. Bad directions are reported and asked again.
pub fn play_interactive<R: BufRead, W: Write>(maze: &mut Maze, input: R, output: &mut W) -> Result<SessionEnd> {
    let was_silent = maze.set_silent(true);
    let result = run_session(maze, input, output);
    maze.set_silent(was_silent);
    result
}

fn run_session<R: BufRead, W: Write>(maze: &mut Maze, input: R, output: &mut W) -> Result<SessionEnd> {
    let write_err = |e| Error::io("write to terminal", e);
    maze.reset();
    let mut turns = 0;
    let mut lines = input.lines();

    loop {
        write!(output, "{}{}", maze, PROMPT).map_err(write_err)?;
        output.flush().map_err(write_err)?;

        let line = match lines.next() {
            Some(line) => line.map_err(|e| Error::io("read from terminal", e))?,
            None => return Ok(SessionEnd::InputClosed),
        };
        let answer = line.trim();

        if QUIT_WORDS.contains(&answer) {
            writeln!(output, "Ending game.").map_err(write_err)?;
            return Ok(SessionEnd::Quit);
        }

        match maze.turn(answer) {
            Ok(transition) => {
                turns += 1;
                if transition.reached_goal {
                    writeln!(output, "You won!").map_err(write_err)?;
                    return Ok(SessionEnd::Won { turns });
                }
                if transition.ran_into_wall {
                    writeln!(output, "You ran into a wall. Resetting.").map_err(write_err)?;
                }
            }
            Err(Error::InvalidDirection { .. }) => {
                writeln!(
                    output,
                    "Direction must be up, down, left or right. Type 'quit' to quit game."
                )
                .map_err(write_err)?;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn corridor() -> Maze {
        "#####\n#S.G#\n#####".parse().unwrap()
    }

    #[test]
    fn reaching_goal_ends_session() {
        let mut maze = corridor();
        let mut out = Vec::new();
        let end = play_interactive(&mut maze, Cursor::new("right\nr\n"), &mut out).unwrap();
        assert_eq!(end, SessionEnd::Won { turns: 2 });
        assert!(String::from_utf8(out).unwrap().ends_with("You won!\n"));
    }

    #[test]
    fn invalid_direction_reprompts() {
        let mut maze = corridor();
        let mut out = Vec::new();
        let end = play_interactive(&mut maze, Cursor::new("diagonal\nquit\n"), &mut out).unwrap();
        assert_eq!(end, SessionEnd::Quit);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Direction must be up, down, left or right."));
        assert_eq!(text.matches(PROMPT).count(), 2);
    }

    #[test]
    fn wall_hits_are_announced() {
        let mut maze = corridor();
        let mut out = Vec::new();
        let end = play_interactive(&mut maze, Cursor::new("r\nup\n"), &mut out).unwrap();
        assert_eq!(end, SessionEnd::InputClosed);
        assert!(String::from_utf8(out).unwrap().contains("You ran into a wall. Resetting."));
        assert_eq!(maze.position(), maze.start_pos());
        assert!(!maze.is_silent());
    }
}
