//! Snakes-and-ladders random-walk generator.
//!
//! Models the classic 100-cell board as a Markov chain: a cell with a
//! ladder or snake has that jump as its only successor, every other
//! cell has one equally-weighted successor per die face. Cell 100 ends
//! every walk.

use std::fmt;
use std::fmt::Write as _;
use std::num::NonZeroU32;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use log::debug;
use markov_core::model::chain::{Chain, StateId};
use markov_core::model::error::ChainError;
use markov_core::model::payload::Payload;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const BOARD_SIZE: u16 = 100;
const DICE_MAX: u16 = 6;
/// Maximum number of cells in one generated walk.
const MAX_WALK_LENGTH: usize = 60;

const NUM_ARGS_ERROR: &str = "Usage: invalid number of arguments";

/// Ladder and snake jumps as `(from, to)`; `from < to` is a ladder,
/// anything else is a snake.
const TRANSITIONS: [(u16, u16); 20] = [
    (13, 4),
    (85, 17),
    (95, 67),
    (97, 58),
    (66, 89),
    (87, 31),
    (57, 83),
    (91, 25),
    (28, 50),
    (35, 11),
    (8, 30),
    (41, 62),
    (81, 43),
    (69, 32),
    (20, 39),
    (33, 70),
    (79, 99),
    (23, 76),
    (15, 47),
    (61, 14),
];

/// Generate random snakes-and-ladders walks.
#[derive(Parser, Debug)]
#[command(name = "markov-snakes", about = "Generate random snakes-and-ladders walks.")]
struct Args {
    /// RNG seed; the same seed reproduces the same walks.
    seed: u32,
    /// Number of walks to generate.
    num_paths: NonZeroU32,
}

/// One cell of the game board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    /// Cell number, 1..=100.
    number: u16,
    /// Destination of the ladder starting here, if any.
    ladder_to: Option<u16>,
    /// Destination of the snake starting here, if any.
    snake_to: Option<u16>,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.number)
    }
}

impl Payload for Cell {
    /// Reaching the last cell ends the game.
    fn is_terminal(&self) -> bool {
        self.number == BOARD_SIZE
    }
}

/// Builds the 100-cell board with the fixed jump table applied.
fn build_board() -> Vec<Cell> {
    let mut cells: Vec<Cell> = (1..=BOARD_SIZE)
        .map(|number| Cell { number, ladder_to: None, snake_to: None })
        .collect();

    for (from, to) in TRANSITIONS {
        let cell = &mut cells[usize::from(from) - 1];
        if from < to {
            cell.ladder_to = Some(to);
        } else {
            cell.snake_to = Some(to);
        }
    }
    cells
}

/// Interns every cell and observes its outgoing transitions.
///
/// A cell with a jump gets that jump as its single successor; a plain
/// cell gets one successor per die face that stays on the board. The
/// final cell gets none. Returns the id of cell 1, where every walk
/// starts.
fn fill_chain(chain: &mut Chain<Cell>, board: &[Cell]) -> Result<StateId, ChainError> {
    let mut ids = Vec::with_capacity(board.len());
    for cell in board {
        ids.push(chain.intern(cell)?);
    }

    for (cell, &id) in board.iter().zip(&ids) {
        if cell.is_terminal() {
            continue;
        }
        if let Some(to) = cell.ladder_to.or(cell.snake_to) {
            chain.observe(id, ids[usize::from(to) - 1])?;
        } else {
            for face in 1..=DICE_MAX {
                let to = cell.number + face;
                if to > BOARD_SIZE {
                    break;
                }
                chain.observe(id, ids[usize::from(to) - 1])?;
            }
        }
    }

    debug!("board chain holds {} cells", chain.len());
    Ok(ids[0])
}

/// Renders a walk as `[a] -> [b] -> ...`, decorating a step with
/// `ladder to` or `snake to` when it takes the previous cell's jump.
fn render_walk(chain: &Chain<Cell>, walk: &[StateId]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Cell> = None;

    for &id in walk {
        let cell = &chain[id];
        if let Some(previous) = previous {
            if previous.ladder_to == Some(cell.number) {
                out.push_str(" -> ladder to ");
            } else if previous.snake_to == Some(cell.number) {
                out.push_str(" -> snake to ");
            } else {
                out.push_str(" -> ");
            }
        }
        let _ = write!(out, "{cell}");
        previous = Some(cell);
    }
    out
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = err.print();
                    ExitCode::SUCCESS
                }
                ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument => {
                    eprintln!("{NUM_ARGS_ERROR}");
                    ExitCode::FAILURE
                }
                _ => {
                    let _ = err.print();
                    ExitCode::FAILURE
                }
            };
        }
    };

    let board = build_board();
    let mut chain = Chain::new();
    let start = match fill_chain(&mut chain, &board) {
        Ok(start) => start,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed.into());
    for i in 1..=args.num_paths.get() {
        let walk = chain.generate(start, MAX_WALK_LENGTH, &mut rng);
        println!("Random Walk {i}: {}", render_walk(&chain, &walk));
    }

    ExitCode::SUCCESS
}
