//! # `PipeMap`
//!
//! `PipeMap` procedurally generates grids of connected pipe tiles using
//! wave function collapse.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

mod cell;
mod direction;
mod error;
mod generator;
mod grid;
mod progress;
pub mod server;
mod settings;
mod shape;

pub use cell::Cell;
pub use direction::{ALL_DIRECTIONS, Direction};
pub use error::{MapError, Result};
pub use generator::Generator;
pub use grid::{Grid, GridState, Mismatch};
pub use settings::Settings;
pub use shape::Shape;
