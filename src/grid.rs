use ndarray::Array2;
use rand::Rng;
use std::{
    fmt::{Display, Formatter},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};

use crate::{ALL_DIRECTIONS, Cell, Direction, MapError, Result, Shape};

/// Lifecycle of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridState {
    /// No cell collapsed yet.
    Building,
    /// Some, but not all, cells collapsed.
    Generating,
    /// Every cell collapsed.
    Resolved,
}

/// Adjacent pair of collapsed cells whose connectors disagree across their shared edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// First cell.
    pub position: (usize, usize),
    /// Direction from the first cell to the second.
    pub direction: Direction,
    /// Second cell.
    pub neighbour: (usize, usize),
}

/// Rectangular arrangement of cells, resolved by wave function collapse.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: Array2<Cell>,
    steps: usize,
}

impl Grid {
    /// Grid of `height` rows by `width` columns, every cell uncollapsed.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let cells = Array2::from_shape_fn((height, width), Cell::new);
        Self { cells, steps: 0 }
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// Collapse steps performed so far.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// All cells, indexed by (row, column).
    #[must_use]
    pub const fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    /// Cell at (row, column), if in bounds.
    #[must_use]
    pub fn cell(&self, position: (usize, usize)) -> Option<&Cell> {
        self.cells.get(position)
    }

    /// Mutable cell at (row, column), if in bounds.
    pub fn cell_mut(&mut self, position: (usize, usize)) -> Option<&mut Cell> {
        self.cells.get_mut(position)
    }

    /// Whether every cell has been collapsed.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cells.iter().all(Cell::is_collapsed)
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn state(&self) -> GridState {
        if self.is_resolved() {
            GridState::Resolved
        } else if self.cells.iter().any(Cell::is_collapsed) {
            GridState::Generating
        } else {
            GridState::Building
        }
    }

    /// In-bounds neighbours of `position`, with the direction leading to each.
    pub fn neighbours(
        &self,
        position: (usize, usize),
    ) -> impl Iterator<Item = (Direction, (usize, usize))> + use<> {
        let (height, width) = self.cells.dim();
        ALL_DIRECTIONS.into_iter().filter_map(move |dir| {
            let (dr, dc) = dir.delta();
            let row = position.0.checked_add_signed(dr).filter(|&r| r < height)?;
            let col = position.1.checked_add_signed(dc).filter(|&c| c < width)?;
            Some((dir, (row, col)))
        })
    }

    /// Collapses one lowest-entropy cell and constrains its neighbours.
    ///
    /// Returns the collapsed position, or `None` once the grid is resolved.
    ///
    /// # Errors
    ///
    /// [`MapError::EmptySelection`] if the chosen cell has no candidates,
    /// [`MapError::Contradiction`] if a neighbour runs out of candidates.
    pub fn step(&mut self, rng: &mut impl Rng) -> Result<Option<(usize, usize)>> {
        let Some(min_count) = self
            .cells
            .iter()
            .filter(|cell| !cell.is_collapsed())
            .map(Cell::entropy)
            .min()
        else {
            return Ok(None);
        };

        let ties: Vec<(usize, usize)> = self
            .cells
            .iter()
            .filter(|cell| !cell.is_collapsed() && cell.entropy() == min_count)
            .map(Cell::position)
            .collect();
        let position = ties[rng.random_range(0..ties.len())];

        let shape = self.cells[position].collapse(rng)?;
        self.steps += 1;
        tracing::trace!(
            row = position.0,
            col = position.1,
            entropy = min_count,
            ties = ties.len(),
            %shape,
            "collapsed cell"
        );

        self.propagate(position, shape)?;
        Ok(Some(position))
    }

    fn propagate(&mut self, position: (usize, usize), shape: Shape) -> Result<()> {
        for (dir, neighbour) in self.neighbours(position) {
            self.cells[neighbour].narrow_candidates(shape, dir)?;
        }
        Ok(())
    }

    /// Runs collapse steps until every cell is resolved.
    ///
    /// # Errors
    ///
    /// Stops at the first [`MapError::Contradiction`] or [`MapError::EmptySelection`].
    pub fn generate(&mut self, rng: &mut impl Rng) -> Result<()> {
        while self.step(rng)?.is_some() {}
        tracing::debug!(
            width = self.width(),
            height = self.height(),
            steps = self.steps,
            "grid resolved"
        );
        Ok(())
    }

    /// Glyph matrix of the current state, `X` marking uncollapsed cells.
    #[must_use]
    pub fn render(&self) -> Array2<char> {
        self.cells.map(|cell| cell.shape().glyph())
    }

    /// Rendered rows as strings.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        self.render()
            .rows()
            .into_iter()
            .map(|row| row.iter().collect())
            .collect()
    }

    /// Writes the rendered grid to `path`, one line per row.
    ///
    /// # Errors
    ///
    /// [`MapError::Export`] if the file cannot be created or written.
    pub fn export_text(&self, path: &Path) -> Result<()> {
        let export_error = |source| MapError::Export {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(export_error)?;
        let mut writer = BufWriter::new(file);
        write!(writer, "{self}").map_err(export_error)?;
        writer.flush().map_err(export_error)?;
        tracing::debug!(path = %path.display(), "exported map");
        Ok(())
    }

    /// Adjacent collapsed cells whose facing connectors disagree.
    #[must_use]
    pub fn mismatches(&self) -> Vec<Mismatch> {
        let mut found = Vec::new();
        for ((row, col), cell) in self.cells.indexed_iter() {
            if !cell.is_collapsed() {
                continue;
            }
            // Right and Down cover every shared edge once.
            for (dir, neighbour) in self.neighbours((row, col)) {
                if !matches!(dir, Direction::Right | Direction::Down) {
                    continue;
                }
                let other = &self.cells[neighbour];
                if other.is_collapsed()
                    && cell.shape().has_connector(dir)
                        != other.shape().has_connector(dir.opposite())
                {
                    found.push(Mismatch {
                        position: (row, col),
                        direction: dir,
                        neighbour,
                    });
                }
            }
        }
        found
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        for row in self.cells.rows() {
            for cell in &row {
                write!(f, "{}", cell.shape())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = MapError;

    /// Reads exported map text; `X` becomes an uncollapsed cell, narrowed by
    /// its collapsed neighbours.
    fn from_str(text: &str) -> Result<Self> {
        // `lines` drops only the final newline; blank rows inside the map stay.
        let lines: Vec<Vec<char>> = text.lines().map(|line| line.chars().collect()).collect();

        let height = lines.len();
        let width = lines.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(height * width);
        for (row, line) in lines.iter().enumerate() {
            if line.len() != width {
                return Err(MapError::RaggedRow {
                    row,
                    expected: width,
                    found: line.len(),
                });
            }
            for (col, &glyph) in line.iter().enumerate() {
                let cell = match Shape::from_glyph(glyph) {
                    Some(Shape::Unresolved) => Cell::new((row, col)),
                    Some(shape) => Cell::resolved((row, col), shape),
                    None => {
                        return Err(MapError::Glyph {
                            row,
                            column: col,
                            glyph,
                        });
                    }
                };
                cells.push(cell);
            }
        }

        let cells = Array2::from_shape_vec((height, width), cells).map_err(|_| {
            MapError::RaggedRow {
                row: height,
                expected: width,
                found: 0,
            }
        })?;
        let collapsed: Vec<((usize, usize), Shape)> = cells
            .iter()
            .filter(|cell| cell.is_collapsed())
            .map(|cell| (cell.position(), cell.shape()))
            .collect();
        let mut grid = Self {
            cells,
            steps: collapsed.len(),
        };
        for (position, shape) in collapsed {
            grid.propagate(position, shape)?;
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn new_grid_is_building() {
        let grid = Grid::new(4, 3);
        assert_eq!((grid.width(), grid.height()), (4, 3));
        assert_eq!(grid.state(), GridState::Building);
        assert_eq!(grid.cell((2, 3)).map(Cell::position), Some((2, 3)));
        assert!(grid.cell((3, 0)).is_none());
        assert_eq!(grid.to_string(), "XXXX\nXXXX\nXXXX\n");
    }

    #[test]
    fn corner_and_centre_neighbours() {
        let grid = Grid::new(3, 3);
        let corner: Vec<_> = grid.neighbours((0, 0)).collect();
        assert_eq!(
            corner,
            vec![(Direction::Right, (0, 1)), (Direction::Down, (1, 0))]
        );
        assert_eq!(grid.neighbours((1, 1)).count(), 4);
        assert_eq!(grid.neighbours((2, 2)).count(), 2);
    }

    #[test]
    fn single_cell_collapses_in_one_step() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = Grid::new(1, 1);
        assert_eq!(grid.step(&mut rng).unwrap(), Some((0, 0)));
        assert_eq!(grid.step(&mut rng).unwrap(), None);
        assert_eq!(grid.steps(), 1);
        assert_eq!(grid.state(), GridState::Resolved);
        let glyph = grid.render()[(0, 0)];
        assert!(Shape::CANDIDATES.iter().any(|s| s.glyph() == glyph));
    }

    #[test]
    fn step_narrows_neighbours_of_collapsed_cell() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut grid = Grid::new(3, 1);
        let position = grid.step(&mut rng).unwrap().unwrap();
        assert_eq!(grid.state(), GridState::Generating);
        for (_, neighbour) in grid.neighbours(position) {
            assert!(grid.cell(neighbour).unwrap().entropy() < 11);
        }
    }

    #[test]
    fn empty_grid_is_already_resolved() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut grid = Grid::new(0, 0);
        grid.generate(&mut rng).unwrap();
        assert_eq!(grid.state(), GridState::Resolved);
        assert_eq!(grid.steps(), 0);
        assert!(grid.rows().is_empty());
    }

    #[test]
    fn injected_empty_cell_fails_loudly() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut grid = Grid::new(3, 3);
        grid.cell_mut((1, 1)).unwrap().retain_candidates(|_| false);
        let err = grid.generate(&mut rng).unwrap_err();
        assert!(matches!(err, MapError::EmptySelection { position: (1, 1) }));
        assert!(err.is_contradiction());
        assert_eq!(grid.steps(), 0);
    }

    #[test]
    fn mismatches_report_half_open_pipes() {
        let good: Grid = "╔╗\n╚╝\n".parse().unwrap();
        assert!(good.mismatches().is_empty());

        let bad: Grid = "╔═\n╚╝\n".parse().unwrap();
        let found = bad.mismatches();
        assert_eq!(
            found,
            vec![Mismatch {
                position: (0, 1),
                direction: Direction::Down,
                neighbour: (1, 1),
            }]
        );
    }

    #[test]
    fn parse_reports_unfillable_holes() {
        let err = " ═ \n║X║\n ═ \n".parse::<Grid>().unwrap_err();
        assert!(matches!(err, MapError::Contradiction { position: (1, 1), .. }));
    }

    #[test]
    fn parse_rejects_unknown_glyphs_and_ragged_rows() {
        assert!(matches!(
            "╔?\n".parse::<Grid>(),
            Err(MapError::Glyph {
                row: 0,
                column: 1,
                glyph: '?'
            })
        ));
        assert!(matches!(
            "╔╗\n║\n".parse::<Grid>(),
            Err(MapError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            "╔╗\n\n╚╝\n".parse::<Grid>(),
            Err(MapError::RaggedRow {
                row: 1,
                expected: 2,
                found: 0
            })
        ));
    }

    #[test]
    fn parse_keeps_unresolved_cells_open() {
        let grid: Grid = "╔X\n".parse().unwrap();
        assert_eq!(grid.state(), GridState::Generating);
        let open = grid.cell((0, 1)).unwrap();
        assert_eq!(open.entropy(), 7);
        assert!(open.candidates().all(|s| s.has_connector(Direction::Left)));
        assert_eq!(grid.to_string(), "╔X\n");
    }
}
