//! Error taxonomy for table construction and evaluation.
//--------------------------------------------------------------------------------------------------

use thiserror::Error;

/// Errors raised by table construction and evaluation.
///
/// `ArithmeticEdge` conditions (division by zero at coincident knots in the
/// derivative recurrence) are not represented here: they are guarded inline
/// and contribute zero rather than propagating as a caller-facing error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError
{
    /// A query coordinate fell outside the half-open support of some axis.
    #[error("coordinate {value} is outside the support of axis {axis} (extent ({lower}, {upper}])")]
    OutOfSupport {
        axis: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },

    /// An evaluation handle was presented to a table other than the one it was derived from.
    #[error("evaluation handle does not match the table it is being used with")]
    InvalidHandle,

    /// A table builder produced arrays that violate the padding or stride invariants.
    #[error("malformed table: {0}")]
    MalformedTable(String),
}
