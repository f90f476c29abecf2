use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum PointIndexError {
    /// A coordinate read during checked construction was NaN or infinite.
    #[error("non-finite coordinate on axis {axis} of element {index}")]
    NonFiniteCoord {
        /// Position of the offending element in the input collection.
        index: usize,
        /// Axis on which the non-finite coordinate was read.
        axis: usize,
    },
}

pub type Result<T> = std::result::Result<T, PointIndexError>;
