//! Uniform spatial hash grid.
//!
//! Items are bucketed into every grid square their bounding box touches.
//! The collision pass clears and refills the grid once per tick.

use crate::entity::NodeId;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square bounds around a centre.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, half: f32) -> Self {
        Self {
            min_x: cx - half,
            min_y: cy - half,
            max_x: cx + half,
            max_y: cy + half,
        }
    }

    /// Closed-interval intersection test (touching boxes intersect).
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_y > self.max_y
            || other.max_y < self.min_y)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// An item stored in the grid.
#[derive(Debug, Clone)]
pub struct GridItem {
    pub id: NodeId,
    pub bound: Bounds,
}

impl GridItem {
    /// Item covering the square around a circle.
    #[inline]
    pub fn new(id: NodeId, x: f32, y: f32, radius: f32) -> Self {
        Self {
            id,
            bound: Bounds::from_center(x, y, radius),
        }
    }
}

/// Spatial hash over a fixed world rectangle.
pub struct SpatialGrid {
    items: Vec<GridItem>,
    bounds: Bounds,
    buckets: Vec<Vec<usize>>,
    grid_size: usize,
    cell_w: f32,
    cell_h: f32,
}

impl SpatialGrid {
    /// Create a grid of `grid_size` x `grid_size` squares over `bounds`.
    pub fn new(bounds: Bounds, grid_size: usize) -> Self {
        let grid_size = grid_size.max(1);
        Self {
            items: Vec::with_capacity(1024),
            bounds,
            buckets: vec![Vec::new(); grid_size * grid_size],
            grid_size,
            cell_w: bounds.width() / grid_size as f32,
            cell_h: bounds.height() / grid_size as f32,
        }
    }

    /// Grid used for the arena: 32x32 squares.
    pub fn for_world(bounds: Bounds) -> Self {
        Self::new(bounds, 32)
    }

    #[inline]
    fn column(&self, x: f32) -> usize {
        let g = ((x - self.bounds.min_x) / self.cell_w).floor();
        (g.max(0.0) as usize).min(self.grid_size - 1)
    }

    #[inline]
    fn row(&self, y: f32) -> usize {
        let g = ((y - self.bounds.min_y) / self.cell_h).floor();
        (g.max(0.0) as usize).min(self.grid_size - 1)
    }

    /// Add an item. Items outside the grid land in the edge squares.
    pub fn insert(&mut self, item: GridItem) {
        let idx = self.items.len();
        let (c0, c1) = (self.column(item.bound.min_x), self.column(item.bound.max_x));
        let (r0, r1) = (self.row(item.bound.min_y), self.row(item.bound.max_y));
        for r in r0..=r1 {
            let row_start = r * self.grid_size;
            for c in c0..=c1 {
                self.buckets[row_start + c].push(idx);
            }
        }
        self.items.push(item);
    }

    /// Ids of all items whose bounds intersect `bound`, ascending.
    pub fn find_in_bounds(&self, bound: &Bounds) -> Vec<NodeId> {
        let (c0, c1) = (self.column(bound.min_x), self.column(bound.max_x));
        let (r0, r1) = (self.row(bound.min_y), self.row(bound.max_y));

        let mut result = Vec::with_capacity(16);
        for r in r0..=r1 {
            let row_start = r * self.grid_size;
            for c in c0..=c1 {
                for &idx in &self.buckets[row_start + c] {
                    let item = &self.items[idx];
                    if item.bound.intersects(bound) {
                        result.push(item.id);
                    }
                }
            }
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Ids of all items whose bounds intersect the square around a circle.
    #[inline]
    pub fn find_in_radius(&self, cx: f32, cy: f32, radius: f32) -> Vec<NodeId> {
        self.find_in_bounds(&Bounds::from_center(cx, cy, radius))
    }

    /// Drop all items.
    pub fn clear(&mut self) {
        self.items.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }
}

impl std::fmt::Debug for SpatialGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("items", &self.items.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, 5.0, 15.0, 15.0);
        let c = Bounds::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn test_grid_insert_find() {
        let mut grid = SpatialGrid::for_world(Bounds::new(-100.0, -100.0, 100.0, 100.0));

        grid.insert(GridItem::new(1, 0.0, 0.0, 10.0));
        grid.insert(GridItem::new(2, 50.0, 50.0, 10.0));
        grid.insert(GridItem::new(3, -50.0, -50.0, 10.0));

        assert_eq!(grid.find_in_radius(0.0, 0.0, 20.0), vec![1]);
        assert_eq!(grid.find_in_radius(50.0, 50.0, 20.0), vec![2]);
    }

    #[test]
    fn test_large_item_found_once() {
        let mut grid = SpatialGrid::new(Bounds::new(-100.0, -100.0, 100.0, 100.0), 8);
        grid.insert(GridItem::new(7, 0.0, 0.0, 90.0));
        assert_eq!(grid.find_in_radius(0.0, 0.0, 100.0), vec![7]);
    }

    #[test]
    fn test_clear_empties_every_square() {
        let mut grid = SpatialGrid::for_world(Bounds::new(-100.0, -100.0, 100.0, 100.0));
        grid.insert(GridItem::new(1, 0.0, 0.0, 5.0));
        grid.clear();
        assert!(grid.find_in_radius(0.0, 0.0, 200.0).is_empty());

        grid.insert(GridItem::new(2, 10.0, 0.0, 5.0));
        assert_eq!(grid.find_in_radius(0.0, 0.0, 50.0), vec![2]);
    }

    #[test]
    fn test_items_past_the_edge_are_still_found() {
        let mut grid = SpatialGrid::new(Bounds::new(-100.0, -100.0, 100.0, 100.0), 4);
        grid.insert(GridItem::new(5, 140.0, 0.0, 5.0));
        assert_eq!(grid.find_in_radius(140.0, 0.0, 10.0), vec![5]);
    }
}
