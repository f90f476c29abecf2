use std::fmt::Debug;

use num_traits::Float;

/// A trait for types that can be used as point coordinates.
///
/// Queries compare squared distances and the unbounded search radius is
/// represented as infinity, so coordinates are floating-point scalars.
/// Blanket implemented; in practice this means `f32` or `f64`.
///
/// `Send + Sync` keep built trees shareable across threads: queries take
/// `&self` and use only their own working state.
pub trait CoordNum: Float + Debug + Send + Sync {}

impl<N: Float + Debug + Send + Sync> CoordNum for N {}
