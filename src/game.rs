use std::thread::sleep;
use std::time::Duration;

use crate::session::{Outcome, Session, GRID_HEIGHT, GRID_WIDTH};
use crate::snake::Direction::*;
use crate::term::TermManager;
use crate::Cell;

use anyhow::{ensure, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = 'O';

// Each grid cell is two terminal columns wide so cells come out roughly
// square.
const CELL_COLS: u16 = 2;
const PLAYFIELD_COLS: u16 = (GRID_WIDTH as u16 + 1) * CELL_COLS;
const PLAYFIELD_ROWS: u16 = GRID_HEIGHT as u16 + 1;

pub struct SnakeGame {
    term: TermManager,
    session: Session,
    frame: Duration,
}

impl SnakeGame {
    pub fn new(fps: u32, seed: Option<u64>) -> Result<Self> {
        let term = TermManager::new()?;
        let (cols, rows) = term.size();
        ensure!(
            cols >= PLAYFIELD_COLS + 2 && rows >= PLAYFIELD_ROWS + 3,
            "terminal is {}x{} but the playfield needs {}x{}",
            cols,
            rows,
            PLAYFIELD_COLS + 2,
            PLAYFIELD_ROWS + 3
        );

        Ok(SnakeGame {
            term,
            session: Session::new(seed),
            frame: Duration::from_secs(1) / fps,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        self.term.setup()?;
        let result = self.play();
        // Put the terminal back together even when the loop errored out
        self.term.restore()?;
        result
    }

    ///////////////////////////////////////////////////////////////////////////

    fn play(&mut self) -> Result<()> {
        if !self.show_intro()? {
            return Ok(());
        }

        self.term.clear()?;
        self.term.draw_border(PLAYFIELD_COLS + 2, PLAYFIELD_ROWS + 2)?;

        loop {
            sleep(self.frame);

            for key_ev in self.term.drain_key_events()? {
                match &key_ev {
                    ev if is_ctrl_c(ev) => return Ok(()),
                    KeyEvent { code, modifiers: _ } => match code {
                        KeyCode::Char('w') | KeyCode::Up => self.session.steer(Up),
                        KeyCode::Char('a') | KeyCode::Left => self.session.steer(Left),
                        KeyCode::Char('s') | KeyCode::Down => self.session.steer(Down),
                        KeyCode::Char('d') | KeyCode::Right => self.session.steer(Right),
                        KeyCode::Char('r') => {
                            self.session.reset();
                            self.term.hide_message()?;
                        }
                        _ => {}
                    },
                }
            }

            let outcome = self.session.tick(self.frame);

            // The final frame stays on screen under the game-over overlay
            if !self.term.has_message() {
                self.render()?;
            }
            if let Some(outcome) = outcome {
                self.show_game_over(outcome)?;
            }
        }
    }

    fn show_intro(&mut self) -> Result<bool> {
        self.term.show_message(&[
            "Arrow keys or WASD to move",
            "R to restart",
            "CTRL+C to quit",
            "",
            "Press any key to begin",
        ])?;

        let quit = is_ctrl_c(&self.term.read_key_blocking()?);
        self.term.hide_message()?;
        Ok(!quit)
    }

    fn show_game_over(&mut self, outcome: Outcome) -> Result<()> {
        self.term.show_message(&[
            &*outcome.overlay_text(self.session.score()),
            "",
            "press R to play again,",
            "or CTRL+C to quit.",
        ])
    }

    /// Full redraw of the playfield interior and the score line from the
    /// current session state.
    fn render(&mut self) -> Result<()> {
        let mut rows = vec![vec![' '; PLAYFIELD_COLS as usize]; PLAYFIELD_ROWS as usize];

        if let Some((col, row)) = cell_slot(self.session.food()) {
            rows[row][col] = FOOD_CHAR;
        }

        let snake = self.session.snake();
        for &segment in &snake.segments()[1..] {
            if let Some((col, row)) = cell_slot(segment) {
                rows[row][col] = SNAKE_BODY_CHAR;
            }
        }
        // Head last so it stays visible over a bitten body
        if let Some((col, row)) = cell_slot(snake.head()) {
            rows[row][col] = snake.head_char();
        }

        for (y, row) in rows.iter().enumerate() {
            let line: String = row.iter().collect();
            self.term.print_row((1, y as u16 + 1), &line)?;
        }

        self.term.print_row(
            (1, PLAYFIELD_ROWS + 2),
            &format!("score: {:<6}", self.session.score()),
        )?;
        self.term.flush()
    }
}

/// Maps a grid cell to its (column, row) inside the playfield interior, or
/// None when the cell lies off the grid, as the head does after a crash.
fn cell_slot((x, y): Cell) -> Option<(usize, usize)> {
    if x < 0 || y < 0 || x > GRID_WIDTH || y > GRID_HEIGHT {
        return None;
    }
    Some((x as usize * CELL_COLS as usize, y as usize))
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
