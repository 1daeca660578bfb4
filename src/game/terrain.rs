//! Destructible terrain: a cell-grid solidity mask plus per-column surface heights

use serde::{Deserialize, Serialize};

use super::Vec2;

/// Read-only terrain queries used by prediction and movement
pub trait TerrainQuery {
    /// Whether the world point is inside solid ground
    fn is_solid(&self, x: f32, y: f32) -> bool;
    /// Top surface at world column `x` (y down, so smaller is higher)
    fn surface_y(&self, x: f32) -> f32;
    fn width(&self) -> f32;
    fn height(&self) -> f32;
}

/// Terrain state, serializable so it can be shipped to the planning worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub width: u32,
    pub height: u32,
    /// Edge length of one solidity cell in world units
    pub cell_size: u32,
    /// World position of the grid origin
    pub offset: Vec2,
    /// Row-major, one byte per cell, non-zero = solid
    pub solid: Vec<u8>,
    /// Surface y per world column
    pub heights: Vec<f32>,
}

impl Terrain {
    /// Build terrain whose surface at column `x` is `surface(x)`
    pub fn from_surface(
        width: u32,
        height: u32,
        cell_size: u32,
        surface: impl Fn(f32) -> f32,
    ) -> Self {
        let cell_size = cell_size.max(1);
        let cols = width.div_ceil(cell_size) as usize;
        let rows = height.div_ceil(cell_size) as usize;
        let mut solid = vec![0u8; cols * rows];

        for col in 0..cols {
            let cx = (col as f32 + 0.5) * cell_size as f32;
            let top = surface(cx);
            for row in 0..rows {
                let cy = (row as f32 + 0.5) * cell_size as f32;
                if cy >= top {
                    solid[row * cols + col] = 1;
                }
            }
        }

        let mut terrain = Self {
            width,
            height,
            cell_size,
            offset: Vec2::ZERO,
            solid,
            heights: vec![height as f32; width as usize],
        };
        terrain.recompute_heights(0, width as usize);
        terrain
    }

    pub fn flat(width: u32, height: u32, ground_y: f32) -> Self {
        Self::from_surface(width, height, 4, |_| ground_y)
    }

    /// Deterministic rolling hills, used by the demo duel. The land slopes
    /// down to the floor near both edges so the water is reachable.
    pub fn rolling_hills(width: u32, height: u32, base_y: f32, amplitude: f32) -> Self {
        let w = width as f32;
        let floor = height as f32;
        let shore = w * 0.08;
        Self::from_surface(width, height, 4, move |x| {
            let t = x / w * std::f32::consts::TAU;
            let hill = base_y - amplitude * (0.6 * (t * 1.5).sin() + 0.4 * (t * 3.7 + 1.3).sin());
            let inland = (x.min(w - x) / shore).clamp(0.0, 1.0);
            floor - (floor - hill) * inland
        })
    }

    fn cols(&self) -> usize {
        self.width.div_ceil(self.cell_size) as usize
    }

    fn rows(&self) -> usize {
        self.height.div_ceil(self.cell_size) as usize
    }

    fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let lx = x - self.offset.x;
        let ly = y - self.offset.y;
        if lx < 0.0 || ly < 0.0 {
            return None;
        }
        let col = (lx / self.cell_size as f32) as usize;
        let row = (ly / self.cell_size as f32) as usize;
        if col >= self.cols() || row >= self.rows() {
            return None;
        }
        Some((col, row))
    }

    /// Remove all solid cells whose centers fall inside the circle
    pub fn carve_circle(&mut self, center: Vec2, radius: f32) {
        if radius <= 0.0 {
            return;
        }
        let cell = self.cell_size as f32;
        let cols = self.cols();
        let rows = self.rows();
        let min_col = (((center.x - radius - self.offset.x) / cell).floor().max(0.0)) as usize;
        let max_col = ((((center.x + radius - self.offset.x) / cell).ceil()) as usize).min(cols);
        let min_row = (((center.y - radius - self.offset.y) / cell).floor().max(0.0)) as usize;
        let max_row = ((((center.y + radius - self.offset.y) / cell).ceil()) as usize).min(rows);
        let r_sq = radius * radius;

        for row in min_row..max_row {
            for col in min_col..max_col {
                let cx = self.offset.x + (col as f32 + 0.5) * cell;
                let cy = self.offset.y + (row as f32 + 0.5) * cell;
                if Vec2::new(cx, cy).distance_sq(center) <= r_sq {
                    self.solid[row * cols + col] = 0;
                }
            }
        }

        let from = (center.x - radius - self.offset.x).floor().max(0.0) as usize;
        let right = (center.x + radius - self.offset.x).ceil().max(0.0) as usize;
        let to = right.min(self.width as usize);
        self.recompute_heights(from, to);
    }

    fn recompute_heights(&mut self, from: usize, to: usize) {
        let cols = self.cols();
        let rows = self.rows();
        let cell = self.cell_size as usize;
        for x in from..to.min(self.heights.len()) {
            let col = (x / cell).min(cols.saturating_sub(1));
            let top_row = (0..rows).find(|&row| self.solid[row * cols + col] != 0);
            self.heights[x] = match top_row {
                Some(row) => self.offset.y + (row * cell) as f32,
                None => self.offset.y + self.height as f32,
            };
        }
    }
}

impl TerrainQuery for Terrain {
    fn is_solid(&self, x: f32, y: f32) -> bool {
        if y >= self.offset.y + self.height as f32 {
            // Bedrock below the map
            return x >= self.offset.x && x < self.offset.x + self.width as f32;
        }
        match self.cell_at(x, y) {
            Some((col, row)) => self.solid[row * self.cols() + col] != 0,
            None => false,
        }
    }

    fn surface_y(&self, x: f32) -> f32 {
        if self.heights.is_empty() {
            return self.offset.y + self.height as f32;
        }
        let idx = (x - self.offset.x).floor().clamp(0.0, (self.heights.len() - 1) as f32) as usize;
        self.heights[idx]
    }

    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_terrain_is_solid_below_ground() {
        let terrain = Terrain::flat(200, 100, 60.0);
        assert!(terrain.is_solid(50.0, 80.0));
        assert!(!terrain.is_solid(50.0, 40.0));
        assert_eq!(terrain.surface_y(50.0), 60.0);
        assert!(!terrain.is_solid(-5.0, 80.0));
    }

    #[test]
    fn carving_lowers_the_surface() {
        let mut terrain = Terrain::flat(200, 100, 60.0);
        terrain.carve_circle(Vec2::new(100.0, 60.0), 20.0);
        assert!(!terrain.is_solid(100.0, 70.0));
        assert!(terrain.surface_y(100.0) > 70.0);
        assert_eq!(terrain.surface_y(10.0), 60.0);
    }
}
