//! An implementation of an immutable, balanced K-D Tree over N-dimensional
//! points.

#![warn(missing_docs)]

mod builder;
mod index;
mod r#trait;

pub use builder::KDTreeBuilder;
pub use index::{KDTree, KDTreeRef, SplitPlane};
pub use r#trait::KDTreeIndex;
