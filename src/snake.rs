use crate::{Cell, GridInt};
use Direction::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector in grid coordinates; y grows downwards.
    pub fn vector(self) -> (GridInt, GridInt) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }
}

pub struct Snake {
    segments: Vec<Cell>,
    direction: Direction,
}

impl Snake {
    /// Lays out `size` segments starting at `head`, trailing away opposite
    /// the heading.
    pub fn new(head: Cell, size: GridInt, direction: Direction) -> Self {
        let (dx, dy) = direction.vector();
        let segments = (0..size)
            .map(|i| (head.0 - dx * i, head.1 - dy * i))
            .collect();
        Snake { segments, direction }
    }

    pub fn head(&self) -> Cell {
        self.segments[0]
    }

    pub fn segments(&self) -> &[Cell] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Shifts every trailing segment onto the one ahead of it, processed
    /// back to front so no source cell is overwritten before it is read,
    /// then moves the head one cell along the current heading. No bounds
    /// checking happens here.
    pub fn advance(&mut self) {
        for i in (1..self.segments.len()).rev() {
            self.segments[i] = self.segments[i - 1];
        }
        let (dx, dy) = self.direction.vector();
        self.segments[0].0 += dx;
        self.segments[0].1 += dy;
    }

    /// Appends one trailing segment. Its position is irrelevant: the next
    /// advance pulls it onto the old tail cell before anything can look at
    /// it, so it simply duplicates the tail.
    pub fn grow(&mut self) {
        let tail = *self.segments.last().unwrap();
        self.segments.push(tail);
    }

    pub fn hits_self(&self) -> bool {
        self.segments[1..].contains(&self.head())
    }

    /// Last write wins, except that turning straight back on the current
    /// heading is ignored.
    pub fn steer(&mut self, requested: Direction) {
        match (requested, self.direction) {
            (Up, Down) | (Down, Up) | (Right, Left) | (Left, Right) => {}
            _ => self.direction = requested,
        };
    }

    #[cfg(test)]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }

    #[cfg(test)]
    pub fn from_segments(segments: Vec<Cell>, direction: Direction) -> Self {
        Snake { segments, direction }
    }
}
