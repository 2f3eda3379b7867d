use fixedbitset::FixedBitSet;
use rand::Rng;

use crate::{Direction, MapError, Result, Shape};

/// One grid position and what it may still become.
#[derive(Clone, Debug)]
pub struct Cell {
    position: (usize, usize),
    collapsed: bool,
    shape: Shape,
    candidates: FixedBitSet,
}

impl Cell {
    /// Fresh, uncollapsed cell offering every pipe shape.
    #[must_use]
    pub fn new(position: (usize, usize)) -> Self {
        let mut candidates = FixedBitSet::with_capacity(Shape::COUNT);
        for shape in Shape::CANDIDATES {
            candidates.insert(shape.index());
        }
        Self {
            position,
            collapsed: false,
            shape: Shape::Unresolved,
            candidates,
        }
    }

    /// Cell already fixed to `shape`.
    pub(crate) fn resolved(position: (usize, usize), shape: Shape) -> Self {
        let mut candidates = FixedBitSet::with_capacity(Shape::COUNT);
        candidates.insert(shape.index());
        Self {
            position,
            collapsed: true,
            shape,
            candidates,
        }
    }

    /// (row, column) of this cell.
    #[must_use]
    pub const fn position(&self) -> (usize, usize) {
        self.position
    }

    /// Whether the cell has been collapsed.
    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Resolved shape, or [`Shape::Unresolved`] before collapse.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Remaining candidate shapes, in table order.
    pub fn candidates(&self) -> impl Iterator<Item = Shape> + '_ {
        self.candidates.ones().filter_map(Shape::from_index)
    }

    /// Number of remaining candidates.
    #[must_use]
    pub fn entropy(&self) -> usize {
        self.candidates.count_ones(..)
    }

    /// Fixes the cell to a uniformly drawn candidate and returns it.
    ///
    /// A collapsed cell keeps its shape.
    ///
    /// # Errors
    ///
    /// [`MapError::EmptySelection`] if no candidate is left; the cell is not modified.
    pub fn collapse(&mut self, rng: &mut impl Rng) -> Result<Shape> {
        if self.collapsed {
            return Ok(self.shape);
        }
        let options: Vec<usize> = self.candidates.ones().collect();
        if options.is_empty() {
            return Err(MapError::EmptySelection {
                position: self.position,
            });
        }
        let choice = options[rng.random_range(0..options.len())];
        let shape = Shape::from_index(choice).ok_or(MapError::EmptySelection {
            position: self.position,
        })?;

        self.collapsed = true;
        self.shape = shape;
        Ok(shape)
    }

    /// Drops candidates that would leave a half-open pipe against a collapsed neighbour.
    ///
    /// `direction` points from the neighbour towards this cell. A candidate
    /// survives when its connector facing the neighbour matches the
    /// neighbour's connector facing back. Returns the number of candidates removed.
    ///
    /// # Errors
    ///
    /// [`MapError::Contradiction`] if no candidate survives.
    pub fn narrow_candidates(&mut self, neighbour: Shape, direction: Direction) -> Result<usize> {
        if self.collapsed {
            return Ok(0);
        }
        let connector = neighbour.has_connector(direction);
        let facing = direction.opposite();
        let removed = self.retain_candidates(|shape| shape.has_connector(facing) == connector);

        if self.candidates.is_clear() {
            return Err(MapError::Contradiction {
                position: self.position,
                direction: facing,
                neighbour,
            });
        }
        Ok(removed)
    }

    /// Keeps only the candidates matching `keep`; never adds any back.
    pub fn retain_candidates(&mut self, mut keep: impl FnMut(Shape) -> bool) -> usize {
        let rejected: Vec<usize> = self
            .candidates
            .ones()
            .filter(|&i| Shape::from_index(i).is_none_or(|shape| !keep(shape)))
            .collect();
        for &i in &rejected {
            self.candidates.remove(i);
        }
        rejected.len()
    }
}
