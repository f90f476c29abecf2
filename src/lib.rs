#![doc = include_str!("../README.md")]

mod axis;
mod error;
pub mod kdtree;
mod r#type;

pub use axis::{AxisAccessor, FnAxis, IndexAxis};
pub use error::PointIndexError;
pub use r#type::CoordNum;
