//! Per-axis B-spline basis evaluation: the nonzero values and first
//! derivatives of the (order+1) basis functions supported at a point, plus
//! slow reference implementations used for cross-checks and tests.
//--------------------------------------------------------------------------------------------------

use crate::table::AxisKnots;

/// Largest polynomial order this core evaluates a vectorised local basis
/// for. An arbitrary but generous bound; raising it only costs stack space.
pub const PMAX: usize = 8;

/// The nonzero-value recurrence (de Boor / Cox-de Boor triangular form),
/// self-contained: computes the `degree+1` nonzero basis values of the
/// B-spline of the given `degree` at `x`, given the span `center` such that
/// `knots[center] <= x < knots[center+1]`.
///
/// Coincident knots never divide by zero: a vanishing denominator means the
/// corresponding term has no support at this `x`, so it contributes zero
/// rather than propagating `NaN`.
fn raw_values(
    axis: &AxisKnots,
    x: f64,
    center: isize,
    degree: usize,
) -> [f64; PMAX + 1]
{
    debug_assert!(degree <= PMAX, "order exceeds PMAX");

    let mut out = [0.0; PMAX + 1];
    out[0] = 1.0;
    if degree == 0
    {
        return out;
    }

    let mut left = [0.0; PMAX];
    let mut right = [0.0; PMAX];
    for j in 1..=degree
    {
        left[j - 1] = x - axis.get(center - degree as isize + j as isize);
        right[j - 1] = axis.get(center + j as isize) - x;
    }

    for j in 1..=degree
    {
        let mut saved = 0.0;
        for r in 0..j
        {
            let ri = right[r];
            let le = left[degree - j + r];
            let denom = ri + le;
            let temp = if denom != 0.0 { out[r] / denom } else { 0.0 };
            out[r] = saved + ri * temp;
            saved = le * temp;
        }
        out[j] = saved;
    }
    out
}
//..................................................................................................

/// Fills `out[0..=order]` with the nonzero B-spline values at `x`.
///
/// `out` must have length at least `order + 1`. Values sum to 1 (partition
/// of unity) and are all non-negative.
pub fn values_only(
    axis: &AxisKnots,
    x: f64,
    center: isize,
    order: usize,
    out: &mut [f64],
)
{
    debug_assert!(out.len() >= order + 1);
    let v = raw_values(axis, x, center, order);
    out[..=order].copy_from_slice(&v[..=order]);
}
//..................................................................................................

/// Fills `out_vals[0..=order]` and `out_ders[0..=order]` with the nonzero
/// B-spline values and first derivatives at `x` in one pass, reusing the
/// intermediate order-`(order-1)` value table for both outputs.
pub fn joint(
    axis: &AxisKnots,
    x: f64,
    center: isize,
    order: usize,
    out_vals: &mut [f64],
    out_ders: &mut [f64],
)
{
    debug_assert!(out_vals.len() >= order + 1);
    debug_assert!(out_ders.len() >= order + 1);

    if order == 0
    {
        out_vals[0] = 1.0;
        out_ders[0] = 0.0;
        return;
    }

    // The order-(order-1) table, shared by both the value extension below
    // and the differentiation identity.
    let lower = raw_values(axis, x, center, order - 1);

    // Extend the triangular recurrence by one more level to get the
    // full-order values, re-deriving the per-level left/right terms (the
    // intermediate `lower` table is reused as the starting row).
    let mut left = [0.0; PMAX];
    let mut right = [0.0; PMAX];
    for j in 1..=order
    {
        left[j - 1] = x - axis.get(center - order as isize + j as isize);
        right[j - 1] = axis.get(center + j as isize) - x;
    }
    let mut vals = lower;
    let mut saved = 0.0;
    for r in 0..order
    {
        let ri = right[r];
        let le = left[r];
        let denom = ri + le;
        let temp = if denom != 0.0 { vals[r] / denom } else { 0.0 };
        vals[r] = saved + ri * temp;
        saved = le * temp;
    }
    vals[order] = saved;
    out_vals[..=order].copy_from_slice(&vals[..=order]);

    // B'_{i,k}(x) = k * [ B_{i,k-1}(x) / (t_{i+k}-t_i) - B_{i+1,k-1}(x) / (t_{i+k+1}-t_{i+1}) ]
    let k = order as f64;
    let mut ders = [0.0; PMAX + 1];
    let mut saved_d = 0.0;
    for r in 0..order
    {
        let denom = axis.get(center + 1 + r as isize) - axis.get(center + 1 + r as isize - order as isize);
        let temp = if denom != 0.0 { (k / denom) * lower[r] } else { 0.0 };
        ders[r] = saved_d - temp;
        saved_d = temp;
    }
    ders[order] = saved_d;
    out_ders[..=order].copy_from_slice(&ders[..=order]);
}
//..................................................................................................

/// Fills `out[0..=order]` with the nonzero first derivatives at `x`.
pub fn derivatives_only(
    axis: &AxisKnots,
    x: f64,
    center: isize,
    order: usize,
    out: &mut [f64],
)
{
    let mut scratch_vals = [0.0; PMAX + 1];
    joint(axis, x, center, order, &mut scratch_vals, out);
}
//..................................................................................................

/// Returns the knot at index `i`, or `0.0` if `i` is out of the slice's
/// bounds (the naive recursive definitions below rely on out-of-range
/// lookups never being reached at `degree == 0`, but guard anyway since the
/// reference-quality routines are explicitly not speed-critical).
fn knot_or(
    knots: &[f64],
    i: isize,
) -> Option<f64>
{
    if i < 0 || i as usize >= knots.len()
    {
        None
    }
    else
    {
        Some(knots[i as usize])
    }
}
//..................................................................................................

/// The naive recursive B-spline definition, for cross-checks against the
/// vectorised recurrence above. Not used on any hot path.
pub fn bspline(
    knots: &[f64],
    x: f64,
    i: isize,
    k: usize,
) -> f64
{
    let (ti, ti1) = match (knot_or(knots, i), knot_or(knots, i + 1))
    {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };

    if k == 0
    {
        return if x >= ti && x < ti1 { 1.0 } else { 0.0 };
    }

    let tik = match knot_or(knots, i + k as isize)
    {
        Some(v) => v,
        None => return 0.0,
    };
    let tik1 = match knot_or(knots, i + k as isize + 1)
    {
        Some(v) => v,
        None => return 0.0,
    };

    let mut result = 0.0;
    let d0 = tik - ti;
    if d0 != 0.0
    {
        result += (x - ti) / d0 * bspline(knots, x, i, k - 1);
    }
    let d1 = tik1 - ti1;
    if d1 != 0.0
    {
        result += (tik1 - x) / d1 * bspline(knots, x, i + 1, k - 1);
    }
    result
}
//..................................................................................................

/// The naive recursive first-derivative definition, for cross-checks.
pub fn bspline_deriv(
    knots: &[f64],
    x: f64,
    i: isize,
    k: usize,
) -> f64
{
    if k == 0
    {
        return 0.0;
    }
    let (ti, tik) = match (knot_or(knots, i), knot_or(knots, i + k as isize))
    {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };
    let (ti1, tik1) = match (knot_or(knots, i + 1), knot_or(knots, i + k as isize + 1))
    {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };

    let kf = k as f64;
    let mut result = 0.0;
    let d0 = tik - ti;
    if d0 != 0.0
    {
        result += kf * bspline(knots, x, i, k - 1) / d0;
    }
    let d1 = tik1 - ti1;
    if d1 != 0.0
    {
        result -= kf * bspline(knots, x, i + 1, k - 1) / d1;
    }
    result
}
//..................................................................................................

/// The naive recursive second-derivative definition. Reference-quality only
/// — used by [`crate::eval`]'s `evaluate_deriv2` path, never by the hot
/// tensor walk.
pub fn bspline_deriv_2(
    knots: &[f64],
    x: f64,
    i: isize,
    k: usize,
) -> f64
{
    if k < 2
    {
        return 0.0;
    }
    let (ti, tik) = match (knot_or(knots, i), knot_or(knots, i + k as isize))
    {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };
    let (ti1, tik1) = match (knot_or(knots, i + 1), knot_or(knots, i + k as isize + 1))
    {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };

    let kf = k as f64;
    let mut result = 0.0;
    let d0 = tik - ti;
    if d0 != 0.0
    {
        result += kf * bspline_deriv(knots, x, i, k - 1) / d0;
    }
    let d1 = tik1 - ti1;
    if d1 != 0.0
    {
        result -= kf * bspline_deriv(knots, x, i + 1, k - 1) / d1;
    }
    result
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::table::{AxisSpec, TableBuilder};
    use approx::assert_relative_eq;

    fn padded_axis(order: usize, visible: &[f64]) -> AxisSpec
    {
        let mut padded = Vec::with_capacity(visible.len() + 2 * order);
        for _ in 0..order
        {
            padded.push(visible[0]);
        }
        padded.extend_from_slice(visible);
        for _ in 0..order
        {
            padded.push(*visible.last().unwrap());
        }
        let naxes = (visible.len() + order - 1) as u64;
        AxisSpec { order, knots: padded, naxes, stride: 1 }
    }

    #[test]
    fn partition_of_unity_and_nonnegativity()
    {
        let visible = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
        let spec = padded_axis(2, &visible);
        let naxes = spec.naxes as usize;
        let table = TableBuilder::new().axis(spec).coefficients(vec![1.0; naxes]).build().unwrap();
        let axis = &table.axes[0];

        for &x in &[0.1, 0.3, 0.5, 0.7, 0.9]
        {
            let centers = crate::search::search_axis_center(axis, 0, naxes as u64, x).unwrap();
            let mut vals = [0.0; PMAX + 1];
            values_only(axis, x, centers as isize, 2, &mut vals);
            let sum: f64 = vals[..=2].iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            assert!(vals[..=2].iter().all(|&v| v >= -1e-15));
        }
    }

    #[test]
    fn derivative_sum_is_zero()
    {
        let visible = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
        let spec = padded_axis(2, &visible);
        let naxes = spec.naxes as usize;
        let table = TableBuilder::new().axis(spec).coefficients(vec![1.0; naxes]).build().unwrap();
        let axis = &table.axes[0];

        for &x in &[0.1, 0.3, 0.5, 0.7, 0.9]
        {
            let centers = crate::search::search_axis_center(axis, 0, naxes as u64, x).unwrap();
            let mut ders = [0.0; PMAX + 1];
            derivatives_only(axis, x, centers as isize, 2, &mut ders);
            let sum: f64 = ders[..=2].iter().sum();
            assert_relative_eq!(sum, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn joint_matches_separate_values_and_derivatives()
    {
        let visible = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
        let spec = padded_axis(2, &visible);
        let naxes = spec.naxes as usize;
        let table = TableBuilder::new().axis(spec).coefficients(vec![1.0; naxes]).build().unwrap();
        let axis = &table.axes[0];

        for &x in &[0.1, 0.3, 0.5, 0.7, 0.9]
        {
            let centers = crate::search::search_axis_center(axis, 0, naxes as u64, x).unwrap();
            let c = centers as isize;

            let mut v1 = [0.0; PMAX + 1];
            values_only(axis, x, c, 2, &mut v1);
            let mut d1 = [0.0; PMAX + 1];
            derivatives_only(axis, x, c, 2, &mut d1);

            let mut v2 = [0.0; PMAX + 1];
            let mut d2 = [0.0; PMAX + 1];
            joint(axis, x, c, 2, &mut v2, &mut d2);

            for i in 0..=2
            {
                assert_relative_eq!(v1[i], v2[i], epsilon = 1e-15);
                assert_relative_eq!(d1[i], d2[i], epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn scalar_bspline_matches_vectorised_values()
    {
        // S1-style knot vector.
        let knots = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
        let order = 2usize;
        let spec = padded_axis(order, &knots);
        let naxes = spec.naxes as usize;
        let table = TableBuilder::new().axis(spec).coefficients(vec![1.0; naxes]).build().unwrap();
        let axis = &table.axes[0];

        for &x in &[0.1, 0.4, 0.6, 0.9]
        {
            let center = crate::search::search_axis_center(axis, 0, naxes as u64, x).unwrap() as isize;
            let mut vals = [0.0; PMAX + 1];
            values_only(axis, x, center, order, &mut vals);

            for offset in -(order as isize)..=0
            {
                let i = center + offset;
                let scalar = bspline(&knots, x, i, order);
                let vectorised = vals[(offset + order as isize) as usize];
                assert_relative_eq!(scalar, vectorised, epsilon = 1e-12);
            }
        }
    }

    // Property tests over a randomly chosen interior query point, run
    // against the same order-2 and order-3 knot vectors already exercised
    // by the fixed-example tests above, with `x` kept clear of the
    // boundary clamp so every accepted point lands in a genuinely
    // fully-supported span. Quantified invariants 1-4.
    mod properties
    {
        use super::*;
        use quickcheck_macros::quickcheck;

        fn table_for_order(order: usize) -> (crate::table::Table, usize)
        {
            let visible = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
            let spec = padded_axis(order, &visible);
            let naxes = spec.naxes as usize;
            let table = TableBuilder::new().axis(spec).coefficients(vec![1.0; naxes]).build().unwrap();
            (table, naxes)
        }

        fn interior_x(raw: u32) -> f64
        {
            0.02 + (raw as f64 / u32::MAX as f64) * 0.96
        }

        #[quickcheck]
        fn partition_of_unity_and_nonnegativity(
            order_raw: u8,
            x_raw: u32,
        ) -> bool
        {
            let order = 1 + (order_raw % 3) as usize;
            let (table, naxes) = table_for_order(order);
            let axis = &table.axes[0];
            let x = interior_x(x_raw);
            let center = crate::search::search_axis_center(axis, 0, naxes as u64, x).unwrap() as isize;

            let mut vals = [0.0; PMAX + 1];
            values_only(axis, x, center, order, &mut vals);
            let sum: f64 = vals[..=order].iter().sum();
            (sum - 1.0).abs() < 1e-9 && vals[..=order].iter().all(|&v| v >= -1e-12)
        }

        #[quickcheck]
        fn derivative_sum_is_zero(
            order_raw: u8,
            x_raw: u32,
        ) -> bool
        {
            let order = 1 + (order_raw % 3) as usize;
            let (table, naxes) = table_for_order(order);
            let axis = &table.axes[0];
            let x = interior_x(x_raw);
            let center = crate::search::search_axis_center(axis, 0, naxes as u64, x).unwrap() as isize;

            let mut ders = [0.0; PMAX + 1];
            derivatives_only(axis, x, center, order, &mut ders);
            ders[..=order].iter().sum::<f64>().abs() < 1e-7
        }

        #[quickcheck]
        fn scalar_matches_vectorised_for_random_x(
            order_raw: u8,
            x_raw: u32,
        ) -> bool
        {
            let order = 1 + (order_raw % 3) as usize;
            let (table, naxes) = table_for_order(order);
            let axis = &table.axes[0];
            let visible = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
            let x = interior_x(x_raw);
            let center = crate::search::search_axis_center(axis, 0, naxes as u64, x).unwrap() as isize;

            let mut vals = [0.0; PMAX + 1];
            values_only(axis, x, center, order, &mut vals);
            let mut ders = [0.0; PMAX + 1];
            derivatives_only(axis, x, center, order, &mut ders);

            (0..=order).all(|offset_from_bottom| {
                let offset = offset_from_bottom as isize - order as isize;
                let i = center + offset;
                let scalar_v = bspline(&visible, x, i, order);
                let scalar_d = bspline_deriv(&visible, x, i, order);
                (scalar_v - vals[offset_from_bottom]).abs() < 1e-9
                    && (scalar_d - ders[offset_from_bottom]).abs() < 1e-6
            })
        }
    }
}
