//! # splinetable
//! ## Introduction
//! Evaluation core for tensor-product B-spline surfaces over an arbitrary
//! number of axes: given a table of knots, orders and coefficients, locate
//! a query point's supporting knot interval on every axis and walk the
//! resulting coefficient window to produce a value, a first derivative
//! along one axis, the full gradient, or a second derivative along one
//! axis.
//!
//! Construction goes through [`TableBuilder`], which is the only way to
//! obtain a [`Table`] and the sole point at which the padding and stride
//! invariants are checked. Evaluation never re-validates a [`Table`]; it is
//! an invariant of the type, not a per-call check.

#![feature(generic_const_exprs)]
#![cfg_attr(feature = "simd", feature(portable_simd))]

//---------------------------------------- Docs ------------------------------------------------- //

mod basis;
mod benchmark;
mod dispatch;
mod error;
mod eval;
mod gradient;
mod search;
mod simd;
mod table;
mod walker;

pub use benchmark::BenchmarkResults;
pub use dispatch::EvaluationHandle;
pub use error::SplineError;
pub use search::search_centers;
pub use table::{AxisSpec, Table, TableBuilder};
