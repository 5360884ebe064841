//! Combined value-and-gradient evaluation: computes the table's value and
//! every first partial derivative in one tensor walk, rather than `N+1`
//! separate ones.
//!
//! Each output channel (the value, or the partial along some axis) only
//! ever differs from the others in which axis uses its derivative basis
//! instead of its value basis; that per-channel choice is otherwise
//! completely independent of the other channels, so a single walk can
//! carry all `N+1` channels side by side, using [`crate::simd`]'s width-4
//! lane to do the per-axis multiply for up to four channels at a time.
//--------------------------------------------------------------------------------------------------

use crate::basis;
use crate::simd::{lane_axpy_into, lane_mul_into};
use crate::table::Table;

impl Table
{
    /// Returns `value, d/dx_0, d/dx_1, ..., d/dx_{N-1}` at `x`, given
    /// pre-located `centers`. Produces exactly the values that calling
    /// [`Table::evaluate`] once with an all-`false` mask and once more per
    /// axis with that axis's bit set would produce.
    pub fn evaluate_gradient(
        &self,
        x: &[f64],
        centers: &[usize],
    ) -> Vec<f64>
    {
        let ndim = self.ndim();
        let width = ndim + 1;

        let mut local_vals = Vec::with_capacity(ndim);
        let mut local_ders = Vec::with_capacity(ndim);
        for dim in 0..ndim
        {
            let order = self.order[dim];
            let mut vals = vec![0.0; order + 1];
            let mut ders = vec![0.0; order + 1];
            basis::joint(&self.axes[dim], x[dim], centers[dim] as isize, order, &mut vals, &mut ders);
            local_vals.push(vals);
            local_ders.push(ders);
        }

        walk_gradient(&self.order, &self.strides, centers, &self.coefficients, &local_vals, &local_ders, width)
    }
}
//..................................................................................................

/// `selector(axis, position)[c]` is the value to multiply channel `c`'s
/// running tree by when the walk advances `axis` to `position`: the
/// derivative if `c` is that axis's own channel (`c == axis + 1`), the
/// value otherwise (including for the value channel `c == 0`).
fn selector_row(
    local_vals: &[Vec<f64>],
    local_ders: &[Vec<f64>],
    axis: usize,
    position: usize,
    width: usize,
    out: &mut [f64],
)
{
    let value = local_vals[axis][position];
    let deriv = local_ders[axis][position];
    for c in 0..width
    {
        out[c] = if c == axis + 1 { deriv } else { value };
    }
}
//..................................................................................................

fn walk_gradient(
    order: &[usize],
    strides: &[u64],
    centers: &[usize],
    coefficients: &[f32],
    local_vals: &[Vec<f64>],
    local_ders: &[Vec<f64>],
    width: usize,
) -> Vec<f64>
{
    let ndim = order.len();

    let mut tablepos: i64 = centers.iter().zip(strides).map(|(&c, &s)| c as i64 * s as i64).sum();
    for n in 0..ndim
    {
        tablepos -= order[n] as i64 * strides[n] as i64;
    }

    let mut decomposed = vec![0usize; ndim];

    // tree_levels[n] is the width-wide running product after axes 0..n
    // have been folded in; tree_levels[0] is the empty product (all ones).
    let mut tree_levels = vec![vec![0.0; width]; ndim + 1];
    tree_levels[0] = vec![1.0; width];
    let mut row = vec![0.0; width];
    for n in 0..ndim
    {
        selector_row(local_vals, local_ders, n, 0, width, &mut row);
        let (before, after) = tree_levels.split_at_mut(n + 1);
        lane_mul_into(&before[n], &row, &mut after[0]);
    }

    let mut result = vec![0.0; width];
    loop
    {
        let coef = coefficients[tablepos as usize] as f64;
        lane_axpy_into(&mut result, &tree_levels[ndim], coef);

        let mut n = ndim as isize - 1;
        loop
        {
            if n < 0
            {
                return result;
            }
            let ni = n as usize;
            if decomposed[ni] < order[ni]
            {
                decomposed[ni] += 1;
                tablepos += strides[ni] as i64;

                selector_row(local_vals, local_ders, ni, decomposed[ni], width, &mut row);
                let (before, after) = tree_levels.split_at_mut(ni + 1);
                lane_mul_into(&before[ni], &row, &mut after[0]);

                for i in ni + 1..ndim
                {
                    selector_row(local_vals, local_ders, i, decomposed[i], width, &mut row);
                    let (before, after) = tree_levels.split_at_mut(i + 1);
                    lane_mul_into(&before[i], &row, &mut after[0]);
                }
                break;
            }
            else
            {
                decomposed[ni] = 0;
                tablepos -= order[ni] as i64 * strides[ni] as i64;
                n -= 1;
            }
        }
    }
}
