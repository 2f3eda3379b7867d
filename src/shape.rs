use std::fmt::{Display, Formatter};

use crate::Direction;

/// Glyph, then connectors in [Up, Right, Down, Left] order, indexed by `Shape as usize`.
const SHAPE_TABLE: [(char, [bool; 4]); 13] = [
    ('X', [false, false, false, false]),
    (' ', [false, false, false, false]),
    ('╣', [true, false, true, true]),
    ('╠', [true, true, true, false]),
    ('║', [true, false, true, false]),
    ('═', [false, true, false, true]),
    ('╝', [true, false, false, true]),
    ('╚', [true, true, false, false]),
    ('╗', [false, false, true, true]),
    ('╔', [false, true, true, false]),
    ('╩', [true, true, false, true]),
    ('╦', [false, true, true, true]),
    ('╬', [true, true, true, true]),
];

/// Pipe tile kind.
///
/// Every shape has a fixed connector vector saying which of its four sides
/// carries a pipe end, and the box-drawing glyph that draws it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Sentinel for a cell that has not been collapsed yet.
    Unresolved,
    /// Empty tile with no connectors.
    Blank,
    /// `╣`
    UpDownLeft,
    /// `╠`
    UpRightDown,
    /// `║`
    UpDown,
    /// `═`
    RightLeft,
    /// `╝`
    UpLeft,
    /// `╚`
    UpRight,
    /// `╗`
    DownLeft,
    /// `╔`
    RightDown,
    /// `╩`
    UpRightLeft,
    /// `╦`
    RightDownLeft,
    /// `╬`
    UpRightDownLeft,
}

impl Shape {
    /// Number of shapes, sentinel and blank included.
    pub const COUNT: usize = SHAPE_TABLE.len();

    /// Every shape, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Unresolved,
        Self::Blank,
        Self::UpDownLeft,
        Self::UpRightDown,
        Self::UpDown,
        Self::RightLeft,
        Self::UpLeft,
        Self::UpRight,
        Self::DownLeft,
        Self::RightDown,
        Self::UpRightLeft,
        Self::RightDownLeft,
        Self::UpRightDownLeft,
    ];

    /// Shapes a fresh cell may collapse to.
    pub const CANDIDATES: [Self; 11] = [
        Self::UpDownLeft,
        Self::UpRightDownLeft,
        Self::UpDown,
        Self::RightLeft,
        Self::UpLeft,
        Self::UpRight,
        Self::DownLeft,
        Self::RightDown,
        Self::UpRightLeft,
        Self::RightDownLeft,
        Self::UpRightDown,
    ];

    /// Position of this shape in the lookup table.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Shape::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Connector flags in [Up, Right, Down, Left] order.
    #[must_use]
    pub const fn connectors(self) -> [bool; 4] {
        SHAPE_TABLE[self as usize].1
    }

    /// Whether a pipe leaves this shape through the given side.
    #[must_use]
    pub const fn has_connector(self, direction: Direction) -> bool {
        self.connectors()[direction.index()]
    }

    /// Box-drawing character for this shape.
    #[must_use]
    pub const fn glyph(self) -> char {
        SHAPE_TABLE[self as usize].0
    }

    /// Looks a shape up by its glyph.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        SHAPE_TABLE
            .iter()
            .position(|(g, _)| *g == glyph)
            .and_then(Self::from_index)
    }

    /// True for the eleven pipe shapes, false for the sentinel and blank.
    #[must_use]
    pub const fn is_pipe(self) -> bool {
        !matches!(self, Self::Unresolved | Self::Blank)
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
