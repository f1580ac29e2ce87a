mod game;
mod session;
mod snake;
mod term;

use anyhow::{ensure, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub type GridInt = i16;
pub type Cell = (GridInt, GridInt);

/// Classic grid snake for the terminal.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Frame rate of the render loop. Game speed does not depend on it.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Seed for food placement; random if omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ensure!(cli.fps >= 1, "--fps must be at least 1");

    // Logs go to stderr so they can be redirected away from the game screen.
    // Silent unless RUST_LOG says otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut game = game::SnakeGame::new(cli.fps, cli.seed)?;
    game.run()
}
