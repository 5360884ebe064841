//! Locating the knot interval ("center") containing each query coordinate.
//!
//! Support is half-open on the low side and closed on the high side:
//! `knot(center) <= x < knot(center+1)`, except at the very top of an axis's
//! range where `x == upper_extent()` is accepted and folds into the last
//! interval rather than raising an out-of-support error.
//--------------------------------------------------------------------------------------------------

use crate::error::SplineError;
use crate::table::{AxisKnots, Table};

/// Binary search for the span containing `x` on one axis, per the half-open
/// / right-closed convention above. Points only a few knots in from either
/// edge are clamped to the nearest fully-supported center rather than
/// binary-searched: below `knot(order)` clamps to `order`, at or above
/// `knot(naxes)` clamps to `naxes - 1` (the latter is what makes the
/// right-closed upper boundary land on the last valid center instead of one
/// past it). `axis_index` is only used to label a possible
/// [`SplineError::OutOfSupport`].
pub(crate) fn search_axis_center(
    axis: &AxisKnots,
    axis_index: usize,
    naxes: u64,
    x: f64,
) -> Result<usize, SplineError>
{
    let lower = axis.lower_extent();
    let upper = axis.upper_extent();
    if x <= lower || x > upper
    {
        log::warn!(
            "search_centers: x={x} outside support of axis {axis_index} (extent ({lower}, {upper}])"
        );
        return Err(SplineError::OutOfSupport { axis: axis_index, value: x, lower, upper });
    }

    let order = axis.order() as isize;
    let nknots = axis.nknots() as isize;

    // If we're only a few knots in (or out), take the center to be the
    // nearest fully-supported one rather than binary-searching at all.
    if x < axis.get(order)
    {
        return Ok(order as usize);
    }
    if x >= axis.get(naxes as isize)
    {
        return Ok(naxes as usize - 1);
    }

    let mut min = order;
    let mut max = nknots - 2;
    let mut center;

    loop
    {
        center = min + (max - min) / 2;
        if x < axis.get(center)
        {
            max = center - 1;
        }
        else if x >= axis.get(center + 1)
        {
            min = center + 1;
        }
        else
        {
            break;
        }
        if min > max
        {
            center = min.clamp(order, nknots - 2);
            break;
        }
    }

    // B-splines are defined on a half-open interval. For the last point of
    // the interval, move center one point to the left to get the limit of
    // the sum without evaluating absent basis functions. The pre-clamp
    // above already handles this at the exact upper boundary; kept as a
    // belt-and-suspenders fixup in case the search itself lands there.
    if center as u64 >= naxes
    {
        center = naxes as isize - 1;
    }

    Ok(center as usize)
}
//..................................................................................................

/// Locates, per axis, the knot interval containing each coordinate of `x`.
///
/// `x.len()` must equal `table.ndim()`.
pub fn search_centers(
    table: &Table,
    x: &[f64],
) -> Result<Vec<usize>, SplineError>
{
    debug_assert_eq!(x.len(), table.ndim());
    let mut centers = Vec::with_capacity(x.len());
    for (dim, &xi) in x.iter().enumerate()
    {
        centers.push(search_axis_center(&table.axes[dim], dim, table.naxes[dim], xi)?);
    }
    Ok(centers)
}
