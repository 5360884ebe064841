//! Selects, once at table-construction time, which tensor-walker
//! specialisation a table's evaluations should use.
//!
//! This replaces the reference implementation's table of member-function
//! pointers keyed on `(ndim, order)` with a small tagged enum and a `match`
//! at the one call site that needs it ([`crate::walker::walk`]). The walker
//! specialised for a fixed `(N, O)` and the one specialised for a fixed `N`
//! alone are both expressed as a single generic function parameterised by
//! `const` generics (see `walker.rs`); `DispatchKind` only records *which*
//! monomorphisation to call, it does not carry function pointers.
//--------------------------------------------------------------------------------------------------

use crate::error::SplineError;

/// Orders for which a dedicated `(N, O)` specialisation exists.
const SPECIALISED_ORDERS: [usize; 2] = [2, 3];
/// Dimensions for which a dedicated specialisation (fixed-`N` or fixed-`(N,O)`) exists.
const SPECIALISED_DIM_RANGE: std::ops::RangeInclusive<usize> = 2..=8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DispatchKind
{
    /// No specialisation applies (includes every N=1 table; see Open Questions).
    Generic,
    /// All axes share dimension N, orders may differ.
    Dim(usize),
    /// All axes share dimension N and order O.
    DimOrder(usize, usize),
}
//..................................................................................................

/// Decide which walker specialisation a table with these per-axis orders
/// should use. Called once, at construction, and cached on the table.
pub(crate) fn pick_dispatch(order: &[usize]) -> DispatchKind
{
    let ndim = order.len();
    if !SPECIALISED_DIM_RANGE.contains(&ndim)
    {
        return DispatchKind::Generic;
    }

    let const_order = order[0];
    let uniform = order.iter().all(|&o| o == const_order);

    if uniform && SPECIALISED_ORDERS.contains(&const_order)
    {
        DispatchKind::DimOrder(ndim, const_order)
    }
    else
    {
        DispatchKind::Dim(ndim)
    }
}
//..................................................................................................

/// An opaque, `Copy` dispatch token bound to the [`crate::table::Table`] it
/// was obtained from (the "fast evaluation token" of the reference design).
///
/// Using a handle with any table other than the one that produced it is a
/// programmer error: in debug builds it is caught with a `debug_assert!` at
/// the hot evaluation entry points; release builds trust the caller, since
/// re-validating on every call would defeat the point of pre-binding the
/// dispatch choice. [`crate::table::Table::try_evaluate_with_handle`]
/// offers a checked alternative for callers who would rather pay the
/// comparison than risk the assertion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvaluationHandle
{
    pub(crate) kind: DispatchKind,
    pub(crate) table_id: u64,
}

impl EvaluationHandle
{
    pub(crate) fn check(
        &self,
        table_id: u64,
    ) -> Result<(), SplineError>
    {
        if self.table_id != table_id
        {
            return Err(SplineError::InvalidHandle);
        }
        Ok(())
    }
}
