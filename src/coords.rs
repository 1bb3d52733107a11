use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: GridCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// One diagonal-capable step toward `target`: each axis moves by at most one.
    pub fn step_toward(self, target: GridCoord) -> GridCoord {
        GridCoord {
            x: self.x + (target.x - self.x).signum(),
            y: self.y + (target.y - self.y).signum(),
        }
    }
}

/// Axis-aligned area of cells, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub min: GridCoord,
    pub max: GridCoord,
}

impl GridRect {
    pub fn new(min: GridCoord, max: GridCoord) -> Self {
        assert!(min.x <= max.x && min.y <= max.y, "Invalid GridRect bounds");
        Self { min, max }
    }

    pub fn from_size(width: i32, height: i32) -> Self {
        Self::new(GridCoord::new(0, 0), GridCoord::new(width - 1, height - 1))
    }

    pub fn contains(&self, c: GridCoord) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    pub fn iter_cells(self) -> impl Iterator<Item = GridCoord> {
        let min = self.min;
        let max = self.max;
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| GridCoord { x, y }))
    }

    /// Boustrophedon coverage of the whole area. Row-major sweeps alternate
    /// left/right on each row, column-major sweeps alternate up/down on each
    /// column, so consecutive cells are always adjacent.
    pub fn sweep_path(&self, row_major: bool) -> Vec<GridCoord> {
        let mut path = Vec::with_capacity((self.width() * self.height()) as usize);
        if row_major {
            for (i, y) in (self.min.y..=self.max.y).enumerate() {
                let xs: Vec<i32> = (self.min.x..=self.max.x).collect();
                if i % 2 == 0 {
                    path.extend(xs.into_iter().map(|x| GridCoord { x, y }));
                } else {
                    path.extend(xs.into_iter().rev().map(|x| GridCoord { x, y }));
                }
            }
        } else {
            for (i, x) in (self.min.x..=self.max.x).enumerate() {
                let ys: Vec<i32> = (self.min.y..=self.max.y).collect();
                if i % 2 == 0 {
                    path.extend(ys.into_iter().map(|y| GridCoord { x, y }));
                } else {
                    path.extend(ys.into_iter().rev().map(|y| GridCoord { x, y }));
                }
            }
        }
        path
    }
}
