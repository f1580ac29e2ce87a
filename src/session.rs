use std::time::Duration;

use crate::snake::{Direction, Snake};
use crate::{Cell, GridInt};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

// Head positions run 0..=GRID_WIDTH and 0..=GRID_HEIGHT, so the playfield is
// one cell wider and taller than the named size. Food spawns in the
// exclusive range only.
pub const GRID_WIDTH: GridInt = 30;
pub const GRID_HEIGHT: GridInt = 30;

const INITIAL_SNAKE_LENGTH: GridInt = 3;
const SNAKE_START: Cell = (2, 0);

const INITIAL_SPEED: u32 = 5;
const MAX_SPEED: u32 = 25;

// One frame at the cadence the speed values are calibrated against. A step
// interval is this times (MAX_SPEED + 1 - speed), so speed 25 steps every
// reference frame and speed 5 roughly three times a second.
const REFERENCE_FRAME: Duration = Duration::from_micros(16_667);

const TOTAL_CELLS: usize = (GRID_WIDTH as usize + 1) * (GRID_HEIGHT as usize + 1);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Lost,
    Won,
}

impl Outcome {
    pub fn overlay_text(self, score: u32) -> String {
        match self {
            Outcome::Lost => format!("you lose! score: {}", score),
            Outcome::Won => format!("you win! score: {}", score),
        }
    }
}

enum Hit {
    Wall,
    Body,
    Food,
}

/// Wall-clock accumulator gating game steps. Frames deposit their elapsed
/// time; a step fires whenever a full interval has built up, keeping the
/// remainder, so the step rate is independent of the frame rate.
struct StepClock {
    accumulated: Duration,
}

impl StepClock {
    fn new() -> Self {
        StepClock { accumulated: Duration::from_secs(0) }
    }

    fn tick(&mut self, elapsed: Duration) {
        self.accumulated += elapsed;
    }

    fn consume(&mut self, interval: Duration) -> bool {
        if self.accumulated >= interval {
            self.accumulated -= interval;
            true
        } else {
            false
        }
    }
}

/// One game session: the snake, the food and the score/speed bookkeeping,
/// created together and replaced together on reset. The controller owns
/// exactly one of these and feeds it frame durations.
pub struct Session {
    snake: Snake,
    food: Cell,
    running: bool,
    score: u32,
    speed: u32,
    time: u64,
    clock: StepClock,
    rng: SmallRng,
}

impl Session {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut session = Session {
            snake: Snake::new(SNAKE_START, INITIAL_SNAKE_LENGTH, Direction::Right),
            food: (0, 0),
            running: true,
            score: 0,
            speed: INITIAL_SPEED,
            time: 0,
            clock: StepClock::new(),
            rng,
        };
        session.reset();
        session
    }

    /// Rebuilds the snake, the food and all counters for a fresh run. The
    /// rng carries over; everything else is replaced wholesale.
    pub fn reset(&mut self) {
        self.snake = Snake::new(SNAKE_START, INITIAL_SNAKE_LENGTH, Direction::Right);
        self.place_food();
        self.running = true;
        self.score = 0;
        self.speed = INITIAL_SPEED;
        self.time = 0;
        self.clock = StepClock::new();
        info!("session started");
    }

    /// Advances the session by one rendered frame. Returns the outcome on
    /// the frame the game ends, and None on every other frame.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Outcome> {
        self.time += 1;
        if !self.running {
            return None;
        }

        self.clock.tick(elapsed);
        while self.clock.consume(self.step_interval()) {
            if let Some(outcome) = self.step() {
                return Some(outcome);
            }
        }
        None
    }

    pub fn steer(&mut self, direction: Direction) {
        self.snake.steer(direction);
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    ///////////////////////////////////////////////////////////////////////////

    fn step_interval(&self) -> Duration {
        REFERENCE_FRAME * (MAX_SPEED + 1 - self.speed)
    }

    /// One collision check followed by one move. The check runs against the
    /// head position left behind by the previous step, so a fatal move is
    /// only noticed one step later, and the move below still runs on the
    /// step that ends the game: the final frame shows the head one cell
    /// past the point of impact.
    fn step(&mut self) -> Option<Outcome> {
        let ended = match self.check_collision() {
            Some(Hit::Wall) | Some(Hit::Body) => Some(self.end(Outcome::Lost)),
            Some(Hit::Food) => self.on_eat(),
            None => None,
        };
        self.snake.advance();
        ended
    }

    /// Wall, then body, then food; the first hit wins.
    fn check_collision(&self) -> Option<Hit> {
        let (x, y) = self.snake.head();
        if x < 0 || y < 0 || x > GRID_WIDTH || y > GRID_HEIGHT {
            Some(Hit::Wall)
        } else if self.snake.hits_self() {
            Some(Hit::Body)
        } else if (x, y) == self.food {
            Some(Hit::Food)
        } else {
            None
        }
    }

    fn on_eat(&mut self) -> Option<Outcome> {
        self.snake.grow();
        self.place_food();
        self.score += 1;
        if self.speed < MAX_SPEED {
            self.speed += 1;
        }
        debug!(score = self.score, speed = self.speed, "ate food");

        if self.snake.len() >= TOTAL_CELLS {
            return Some(self.end(Outcome::Won));
        }
        None
    }

    /// Food lands on a uniformly random cell. Occupancy is not checked, so
    /// it can spawn under the snake and stay hidden until the body clears
    /// the cell.
    fn place_food(&mut self) {
        self.food = (
            self.rng.gen_range(0..GRID_WIDTH),
            self.rng.gen_range(0..GRID_HEIGHT),
        );
    }

    fn end(&mut self, outcome: Outcome) -> Outcome {
        self.running = false;
        info!(?outcome, score = self.score, frames = self.time, "game over");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::*;

    fn session() -> Session {
        Session::new(Some(7))
    }

    #[test]
    fn eating_grows_scores_and_speeds_up() {
        let mut s = session();
        s.food = s.snake.head();

        assert_eq!(s.step(), None);
        assert_eq!(s.snake.len(), 4);
        assert_eq!(s.score, 1);
        assert_eq!(s.speed, INITIAL_SPEED + 1);
        assert!(s.running);
        // the move after the check still carried the head forward
        assert_eq!(s.snake.head(), (3, 0));
    }

    #[test]
    fn speed_stops_rising_at_the_cap() {
        let mut s = session();
        s.speed = MAX_SPEED;
        s.food = s.snake.head();

        s.step();
        assert_eq!(s.score, 1);
        assert_eq!(s.speed, MAX_SPEED);
    }

    #[test]
    fn head_outside_the_grid_loses() {
        let mut s = session();
        s.snake = Snake::from_segments(vec![(-1, 5), (0, 5), (1, 5)], Left);

        assert_eq!(s.step(), Some(Outcome::Lost));
        assert!(!s.running);
    }

    #[test]
    fn the_far_edge_is_still_inside() {
        let mut s = session();
        s.snake = Snake::from_segments(
            vec![(GRID_WIDTH, GRID_HEIGHT), (GRID_WIDTH - 1, GRID_HEIGHT)],
            Right,
        );
        s.food = (0, 0);

        assert_eq!(s.step(), None);
        assert!(s.running);
    }

    #[test]
    fn self_collision_loses_even_when_food_shares_the_cell() {
        let mut s = session();
        s.snake = Snake::from_segments(vec![(5, 5), (6, 5), (6, 6), (5, 6), (5, 5)], Up);
        s.food = (5, 5);

        assert_eq!(s.step(), Some(Outcome::Lost));
        assert_eq!(s.score, 0);
    }

    #[test]
    fn loss_is_detected_one_step_after_leaving_the_grid() {
        let mut s = session();
        s.snake = Snake::from_segments(
            vec![(GRID_WIDTH, 5), (GRID_WIDTH - 1, 5), (GRID_WIDTH - 2, 5)],
            Right,
        );
        s.food = (0, 0);

        // the step that walks off the grid is not the one that loses
        assert_eq!(s.step(), None);
        assert!(s.running);
        assert_eq!(s.snake.head(), (GRID_WIDTH + 1, 5));

        assert_eq!(s.step(), Some(Outcome::Lost));
        // the move still ran on the losing step
        assert_eq!(s.snake.head(), (GRID_WIDTH + 2, 5));
    }

    #[test]
    fn nothing_moves_once_the_game_is_over() {
        let mut s = session();
        s.snake = Snake::from_segments(vec![(-1, 5), (0, 5), (1, 5)], Left);
        s.step();
        assert!(!s.running);

        let segments = s.snake.segments().to_vec();
        let food = s.food;
        let time = s.time;

        for _ in 0..100 {
            assert_eq!(s.tick(Duration::from_secs(1)), None);
        }
        assert_eq!(s.snake.segments(), &segments[..]);
        assert_eq!(s.food, food);
        assert_eq!(s.time, time + 100);
    }

    #[test]
    fn reset_rebuilds_an_identical_fresh_state() {
        let mut s = session();
        for _ in 0..50 {
            s.tick(REFERENCE_FRAME);
        }
        s.steer(Down);

        s.reset();
        let segments = s.snake.segments().to_vec();
        let state = (s.score, s.speed, s.time, s.running);
        let direction = s.snake.direction();

        s.reset();
        assert_eq!(s.snake.segments(), &segments[..]);
        assert_eq!((s.score, s.speed, s.time, s.running), state);
        assert_eq!(s.snake.direction(), direction);

        assert_eq!(segments, vec![(2, 0), (1, 0), (0, 0)]);
        assert_eq!(direction, Right);
        assert!(s.food.0 >= 0 && s.food.0 < GRID_WIDTH);
        assert!(s.food.1 >= 0 && s.food.1 < GRID_HEIGHT);
    }

    #[test]
    fn food_placement_stays_in_bounds() {
        let mut s = session();
        for _ in 0..200 {
            s.place_food();
            let (x, y) = s.food;
            assert!(x >= 0 && x < GRID_WIDTH);
            assert!(y >= 0 && y < GRID_HEIGHT);
        }
    }

    #[test]
    fn filling_the_grid_wins() {
        let mut s = session();
        s.snake = Snake::from_segments(vec![(0, 0); TOTAL_CELLS - 1], Right);

        assert_eq!(s.on_eat(), Some(Outcome::Won));
        assert!(!s.running);
    }

    #[test]
    fn overlay_lines_carry_the_final_score() {
        assert_eq!(Outcome::Lost.overlay_text(3), "you lose! score: 3");
        assert_eq!(Outcome::Won.overlay_text(957), "you win! score: 957");
    }

    #[test]
    fn steps_fire_only_after_the_interval_accumulates() {
        let mut s = session();
        s.food = (GRID_WIDTH - 1, GRID_HEIGHT - 1);
        let start = s.snake.head();

        // at the initial speed a step takes 21 reference frames
        for _ in 0..20 {
            s.tick(REFERENCE_FRAME);
        }
        assert_eq!(s.snake.head(), start);

        s.tick(REFERENCE_FRAME);
        assert_eq!(s.snake.head(), (start.0 + 1, start.1));
    }

    #[test]
    fn a_long_frame_runs_several_steps() {
        let mut s = session();
        s.food = (GRID_WIDTH - 1, GRID_HEIGHT - 1);
        let start = s.snake.head();

        s.tick(REFERENCE_FRAME * 42);
        assert_eq!(s.snake.head(), (start.0 + 2, start.1));
    }

    #[test]
    fn higher_speed_shortens_the_step_interval() {
        let mut s = session();
        let slow = s.step_interval();
        s.speed = MAX_SPEED;
        assert_eq!(s.step_interval(), REFERENCE_FRAME);
        assert!(s.step_interval() < slow);
    }

    #[test]
    fn step_clock_keeps_the_remainder() {
        let mut clock = StepClock::new();
        let interval = Duration::from_millis(350);

        clock.tick(Duration::from_millis(500));
        assert!(clock.consume(interval));
        assert!(!clock.consume(interval));

        clock.tick(Duration::from_millis(200));
        assert!(clock.consume(interval));
    }
}
