//! Key event tracking, layout interface, and matrix mapping

mod event;
mod tracker;
pub mod layout;
pub mod matrix;

pub use event::KeyTransition;
pub use layout::{GpioPin, KeyGeometry, LayoutInfo, LayoutProvider, MatrixKind, StaticLayout};
pub use matrix::{GpioMapping, MatrixMapping, MatrixMappingResolver};
pub use tracker::{KeyEventTracker, KeyStat};
