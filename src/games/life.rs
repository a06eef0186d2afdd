//! Conway's Game of Life on a bounded grid.
//!
//! Standard birth/survival rules (B3/S23), no wraparound. The simulation
//! tracks the last four generations and reports stasis when a new generation
//! exactly matches any of them, which catches still lifes and the common
//! short-period oscillators.

use rand::Rng;
use std::collections::VecDeque;

/// How many past generations are kept for stasis detection.
const STASIS_WINDOW: usize = 4;

#[derive(Debug)]
pub struct LifeGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
    /// Most recent generations, oldest first.
    previous: VecDeque<Vec<bool>>,
    generation: u64,
}

impl LifeGrid {
    /// Seed each cell alive with the given density.
    pub fn new_random(rows: usize, cols: usize, density: f64, rng: &mut impl Rng) -> Self {
        let cells = (0..rows * cols).map(|_| rng.gen_bool(density)).collect();
        Self {
            rows,
            cols,
            cells,
            previous: VecDeque::new(),
            generation: 0,
        }
    }

    /// Deterministic construction from a list of live cells.
    pub fn from_cells(rows: usize, cols: usize, live: &[(usize, usize)]) -> Self {
        let mut cells = vec![false; rows * cols];
        for &(r, c) in live {
            cells[r * cols + c] = true;
        }
        Self {
            rows,
            cols,
            cells,
            previous: VecDeque::new(),
            generation: 0,
        }
    }

    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.cols + col]
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn live_neighbors(&self, row: usize, col: usize) -> usize {
        let mut count = 0;
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = row as i64 + dr;
                let c = col as i64 + dc;
                if r < 0 || c < 0 || r >= self.rows as i64 || c >= self.cols as i64 {
                    continue;
                }
                if self.cells[r as usize * self.cols + c as usize] {
                    count += 1;
                }
            }
        }
        count
    }

    /// Advance one generation. Returns false once the new generation exactly
    /// matches one of the last four (stasis or a short oscillator).
    pub fn step(&mut self) -> bool {
        let mut next = vec![false; self.rows * self.cols];
        for row in 0..self.rows {
            for col in 0..self.cols {
                let neighbors = self.live_neighbors(row, col);
                let alive = self.is_alive(row, col);
                next[row * self.cols + col] = matches!((alive, neighbors), (true, 2) | (_, 3));
            }
        }

        self.previous.push_back(std::mem::take(&mut self.cells));
        if self.previous.len() > STASIS_WINDOW {
            self.previous.pop_front();
        }

        let settled = self.previous.iter().any(|g| *g == next);
        self.cells = next;
        self.generation += 1;
        !settled
    }

    /// Render the grid as text rows.
    pub fn rows_display(&self) -> Vec<String> {
        (0..self.rows)
            .map(|r| {
                (0..self.cols)
                    .map(|c| if self.is_alive(r, c) { '#' } else { ' ' })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn lonely_cell_dies() {
        let mut grid = LifeGrid::from_cells(20, 40, &[(5, 5)]);
        grid.step();
        assert_eq!(grid.live_count(), 0);
    }

    #[test]
    fn overcrowded_cell_dies() {
        // center with 4 neighbors
        let mut grid = LifeGrid::from_cells(
            20,
            40,
            &[(5, 5), (4, 5), (6, 5), (5, 4), (5, 6)],
        );
        grid.step();
        assert!(!grid.is_alive(5, 5));
    }

    #[test]
    fn dead_cell_with_three_neighbors_is_born() {
        let mut grid = LifeGrid::from_cells(20, 40, &[(4, 5), (5, 4), (5, 6)]);
        assert!(!grid.is_alive(4, 4) && !grid.is_alive(5, 5));
        grid.step();
        assert!(grid.is_alive(5, 5));
    }

    #[test]
    fn block_is_stable_and_detected_immediately() {
        let mut grid = LifeGrid::from_cells(20, 40, &[(5, 5), (5, 6), (6, 5), (6, 6)]);
        // the very first step reproduces the same grid, which is stasis
        assert!(!grid.step());
        assert_eq!(grid.live_count(), 4);
        assert!(grid.is_alive(5, 5) && grid.is_alive(6, 6));
    }

    #[test]
    fn blinker_terminates_within_the_window() {
        let mut grid = LifeGrid::from_cells(20, 40, &[(5, 4), (5, 5), (5, 6)]);

        // first step flips it vertical - no repetition yet
        assert!(grid.step());
        assert!(grid.is_alive(4, 5) && grid.is_alive(5, 5) && grid.is_alive(6, 5));

        // second step reproduces the original, which is in the window
        assert!(!grid.step());
        assert_eq!(grid.generation(), 2);
    }

    #[test]
    fn edge_cells_have_fewer_neighbors() {
        // a corner blinker-ish pair simply dies, no wraparound resurrection
        let mut grid = LifeGrid::from_cells(20, 40, &[(0, 0), (0, 39)]);
        grid.step();
        assert_eq!(grid.live_count(), 0);
    }

    #[test]
    fn random_seed_respects_density_roughly() {
        let mut rng = StdRng::seed_from_u64(9);
        let grid = LifeGrid::new_random(20, 40, 0.3, &mut rng);
        let live = grid.live_count() as f64 / 800.0;
        assert!(live > 0.2 && live < 0.4, "density was {live}");
    }

    #[test]
    fn display_matches_dimensions() {
        let grid = LifeGrid::from_cells(20, 40, &[(0, 0)]);
        let rows = grid.rows_display();
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|r| r.chars().count() == 40));
        assert!(rows[0].starts_with('#'));
    }
}
