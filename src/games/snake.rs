//! Snake on a bounded grid.
//!
//! Pure simulation: the runner in `games::mod` owns the clock and keyboard.
//! One apple at a time; eating grows the snake by one and respawns the apple
//! on a uniformly random cell. The respawn does not re-roll until free, so
//! the apple may land inside the snake - that matches the shipped behavior
//! and keeps the spawn O(1).

use rand::Rng;
use std::collections::VecDeque;

/// A heading on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Result of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeStep {
    Moved,
    Ate,
    Died,
}

#[derive(Debug)]
pub struct SnakeGame {
    width: i32,
    height: i32,
    /// Head at the front.
    snake: VecDeque<(i32, i32)>,
    direction: Direction,
    apple: (i32, i32),
    ticks: u64,
    alive: bool,
}

impl SnakeGame {
    pub fn new(width: usize, height: usize, rng: &mut impl Rng) -> Self {
        let width = width as i32;
        let height = height as i32;
        let mut snake = VecDeque::new();
        snake.push_back((width / 2, height / 2));
        let mut game = Self {
            width,
            height,
            snake,
            direction: Direction::Right,
            apple: (0, 0),
            ticks: 0,
            alive: true,
        };
        game.apple = game.random_cell(rng);
        game
    }

    fn random_cell(&self, rng: &mut impl Rng) -> (i32, i32) {
        (rng.gen_range(0..self.width), rng.gen_range(0..self.height))
    }

    /// Change heading. A direction that exactly reverses the current heading
    /// is ignored - that is the only rejection; there is no collision
    /// lookahead.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction == self.direction.opposite() {
            return;
        }
        self.direction = direction;
    }

    /// Advance one tick.
    pub fn step(&mut self, rng: &mut impl Rng) -> SnakeStep {
        if !self.alive {
            return SnakeStep::Died;
        }
        self.ticks += 1;

        let (dx, dy) = self.direction.delta();
        let head = self.snake.front().copied().expect("snake is never empty");
        let new_head = (head.0 + dx, head.1 + dy);

        let hit_wall = new_head.0 < 0
            || new_head.0 >= self.width
            || new_head.1 < 0
            || new_head.1 >= self.height;
        if hit_wall || self.snake.contains(&new_head) {
            self.alive = false;
            return SnakeStep::Died;
        }

        self.snake.push_front(new_head);
        if new_head == self.apple {
            self.apple = self.random_cell(rng);
            SnakeStep::Ate
        } else {
            self.snake.pop_back();
            SnakeStep::Moved
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn length(&self) -> usize {
        self.snake.len()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn head(&self) -> (i32, i32) {
        *self.snake.front().expect("snake is never empty")
    }

    /// Render the grid as text rows.
    pub fn rows(&self) -> Vec<String> {
        let mut rows = Vec::with_capacity(self.height as usize);
        for y in 0..self.height {
            let mut row = String::with_capacity(self.width as usize);
            for x in 0..self.width {
                let cell = (x, y);
                let c = if cell == self.head() {
                    'O'
                } else if self.snake.contains(&cell) {
                    'o'
                } else if cell == self.apple {
                    '*'
                } else {
                    '·'
                };
                row.push(c);
            }
            rows.push(row);
        }
        rows
    }

    #[cfg(test)]
    fn place_apple(&mut self, cell: (i32, i32)) {
        self.apple = cell;
    }
}
