//! Rectangular sheet packing for panel cutting: guillotine, maximal
//! rectangles and skyline strategies behind one packer interface, plus a
//! job-level solver that groups parts by thickness and builds a cut list.

pub mod config;
pub mod error;
pub mod guillotine;
pub mod maxrects;
pub mod packer;
pub mod render;
pub mod skyline;
pub mod solver;
pub mod types;

pub use config::PackerConfig;
pub use error::{ConfigError, PackError};
pub use packer::{Algorithm, BinPacker, GuillotinePacker, MaxRectsPacker, SkylinePacker};
pub use solver::Solver;
pub use types::{Demand, Placement, Rect, Solution};
