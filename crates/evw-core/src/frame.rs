//! Dense ON/OFF frame pairs

use crate::event::{Event, Polarity, Resolution};

/// Intensity of a cell that holds an event
pub const ACTIVE: u8 = 255;
/// Background intensity
pub const INACTIVE: u8 = 0;

/// A dense `height x width` grid of cell intensities, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    resolution: Resolution,
    cells: Vec<u8>,
}

impl Grid {
    /// Create an all-inactive grid
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            cells: vec![INACTIVE; resolution.cells()],
        }
    }

    /// Grid dimensions
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Cell value at `(x, y)`, `None` when outside the grid
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if self.resolution.contains(x, y) {
            Some(self.cells[self.resolution.index(x, y)])
        } else {
            None
        }
    }

    /// Whether `(x, y)` is active. Out-of-range cells are never active.
    pub fn is_active(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == Some(ACTIVE)
    }

    /// Mark `(x, y)` active. Returns `false` without writing when out of range.
    pub fn set_active(&mut self, x: u32, y: u32) -> bool {
        self.write(x, y, ACTIVE)
    }

    /// Return `(x, y)` to background. Returns `false` without writing when out of range.
    pub fn clear(&mut self, x: u32, y: u32) -> bool {
        self.write(x, y, INACTIVE)
    }

    fn write(&mut self, x: u32, y: u32, value: u8) -> bool {
        if !self.resolution.contains(x, y) {
            return false;
        }
        let idx = self.resolution.index(x, y);
        self.cells[idx] = value;
        true
    }

    /// Set every cell to background
    pub fn reset(&mut self) {
        self.cells.fill(INACTIVE);
    }

    /// Whether every cell is background
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&v| v == INACTIVE)
    }

    /// Number of active cells
    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == ACTIVE).count()
    }

    /// Active cells as `(x, y)` pairs in row-major order
    pub fn active_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.resolution.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == ACTIVE)
            .map(move |(i, _)| ((i % width) as u32, (i / width) as u32))
    }

    /// Raw row-major cell data
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

/// One grid per polarity, the unit a windower hands to its sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePair {
    /// ON events
    pub on: Grid,
    /// OFF events
    pub off: Grid,
}

impl FramePair {
    /// Create a blank frame pair
    pub fn new(resolution: Resolution) -> Self {
        Self {
            on: Grid::new(resolution),
            off: Grid::new(resolution),
        }
    }

    /// Grid dimensions (shared by both grids)
    pub fn resolution(&self) -> Resolution {
        self.on.resolution()
    }

    /// Grid holding events of the given polarity
    pub fn grid(&self, polarity: Polarity) -> &Grid {
        match polarity {
            Polarity::On => &self.on,
            Polarity::Off => &self.off,
        }
    }

    fn grid_mut(&mut self, polarity: Polarity) -> &mut Grid {
        match polarity {
            Polarity::On => &mut self.on,
            Polarity::Off => &mut self.off,
        }
    }

    /// Mark the event's cell active in the grid selected by its polarity
    pub fn mark(&mut self, event: &Event) -> bool {
        self.grid_mut(event.polarity).set_active(event.x, event.y)
    }

    /// Clear the event's cell in the grid selected by its polarity
    pub fn unmark(&mut self, event: &Event) -> bool {
        self.grid_mut(event.polarity).clear(event.x, event.y)
    }

    /// Reset both grids to background
    pub fn reset(&mut self) {
        self.on.reset();
        self.off.reset();
    }

    /// Whether both grids are entirely background
    pub fn is_blank(&self) -> bool {
        self.on.is_blank() && self.off.is_blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(w: u32, h: u32) -> Resolution {
        Resolution::new(w, h).unwrap()
    }

    #[test]
    fn test_new_grid_blank() {
        let grid = Grid::new(res(4, 3));
        assert!(grid.is_blank());
        assert_eq!(grid.as_slice().len(), 12);
    }

    #[test]
    fn test_set_and_clear() {
        let mut grid = Grid::new(res(4, 3));
        assert!(grid.set_active(3, 2));
        assert_eq!(grid.get(3, 2), Some(ACTIVE));
        assert_eq!(grid.as_slice()[2 * 4 + 3], ACTIVE);
        assert!(grid.clear(3, 2));
        assert!(grid.is_blank());
    }

    #[test]
    fn test_out_of_range_writes_refused() {
        let mut grid = Grid::new(res(4, 3));
        assert!(!grid.set_active(4, 0));
        assert!(!grid.set_active(0, 3));
        assert!(grid.is_blank());
        assert_eq!(grid.get(4, 0), None);
    }

    #[test]
    fn test_active_cells_row_major() {
        let mut grid = Grid::new(res(3, 3));
        grid.set_active(2, 0);
        grid.set_active(0, 1);
        grid.set_active(1, 2);
        let cells: Vec<_> = grid.active_cells().collect();
        assert_eq!(cells, vec![(2, 0), (0, 1), (1, 2)]);
        assert_eq!(grid.active_count(), 3);
    }

    #[test]
    fn test_frame_pair_routes_by_polarity() {
        let mut frame = FramePair::new(res(2, 2));
        frame.mark(&Event::on(0, 0, 1.0));
        frame.mark(&Event::off(1, 1, 2.0));
        assert!(frame.on.is_active(0, 0));
        assert!(!frame.off.is_active(0, 0));
        assert!(frame.off.is_active(1, 1));

        frame.unmark(&Event::on(0, 0, 3.0));
        assert!(frame.on.is_blank());
        assert!(!frame.is_blank());

        frame.reset();
        assert!(frame.is_blank());
    }
}
