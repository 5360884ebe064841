//! The tensor-product walk: combines the per-axis local bases with the flat
//! coefficient array to produce a single scalar value (or, when one axis's
//! local basis holds derivatives instead of values, a partial derivative).
//!
//! Three implementations exist, all performing the exact same arithmetic in
//! the exact same order — carry-propagating through the per-axis local
//! window with a running flat offset and an incrementally updated prefix
//! product ("basis tree") — so that switching between them (driven by
//! [`crate::dispatch::DispatchKind`]) never changes a result, only how fast
//! it is produced:
//!
//! - [`walk_generic`]: any `N`, any per-axis order, `Vec`-backed.
//! - [`walk_dim`]: `N` fixed at compile time, per-axis order still dynamic.
//! - [`walk_fixed`]: both `N` and a common order `O` fixed at compile time.
//--------------------------------------------------------------------------------------------------

/// Walk with dynamically-sized per-axis state. Used for every axis count
/// the dispatcher does not have a specialised routine for (including every
/// 1-D table; see Open Questions in the design notes).
pub(crate) fn walk_generic(
    order: &[usize],
    strides: &[u64],
    centers: &[usize],
    coefficients: &[f32],
    local_basis: &[&[f64]],
) -> f64
{
    let ndim = order.len();

    let mut tablepos: i64 = centers.iter().zip(strides).map(|(&c, &s)| c as i64 * s as i64).sum();
    for n in 0..ndim
    {
        tablepos -= order[n] as i64 * strides[n] as i64;
    }

    let mut decomposed = vec![0usize; ndim];
    let mut basis_tree = vec![1.0f64; ndim + 1];
    for n in 0..ndim
    {
        basis_tree[n + 1] = basis_tree[n] * local_basis[n][0];
    }

    let mut result = 0.0;
    loop
    {
        result += basis_tree[ndim] * coefficients[tablepos as usize] as f64;

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
                basis_tree[ni + 1] = basis_tree[ni] * local_basis[ni][decomposed[ni]];
                for i in ni + 1..ndim
                {
                    basis_tree[i + 1] = basis_tree[i] * local_basis[i][decomposed[i]];
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
//..................................................................................................

/// Same walk, specialised to a compile-time-known axis count `D`. Per-axis
/// order is still a runtime array; only the loop bookkeeping moves from
/// `Vec` to stack arrays.
pub(crate) fn walk_dim<const D: usize>(
    order: &[usize; D],
    strides: &[u64; D],
    centers: &[usize; D],
    coefficients: &[f32],
    local_basis: &[&[f64]; D],
) -> f64
where
    [(); D + 1]:,
{
    let mut tablepos: i64 = (0..D).map(|n| centers[n] as i64 * strides[n] as i64).sum();
    for n in 0..D
    {
        tablepos -= order[n] as i64 * strides[n] as i64;
    }

    let mut decomposed = [0usize; D];
    let mut basis_tree = [1.0f64; D + 1];
    for n in 0..D
    {
        basis_tree[n + 1] = basis_tree[n] * local_basis[n][0];
    }

    let mut result = 0.0;
    loop
    {
        result += basis_tree[D] * coefficients[tablepos as usize] as f64;

        let mut n = D as isize - 1;
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
                basis_tree[ni + 1] = basis_tree[ni] * local_basis[ni][decomposed[ni]];
                for i in ni + 1..D
                {
                    basis_tree[i + 1] = basis_tree[i] * local_basis[i][decomposed[i]];
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
//..................................................................................................

/// Same walk again, specialised to both a compile-time axis count `D` and a
/// single compile-time order `O` shared by every axis.
pub(crate) fn walk_fixed<const D: usize, const O: usize>(
    strides: &[u64; D],
    centers: &[usize; D],
    coefficients: &[f32],
    local_basis: &[[f64; O + 1]; D],
) -> f64
where
    [(); D + 1]:,
    [(); O + 1]:,
{
    let mut tablepos: i64 = (0..D).map(|n| centers[n] as i64 * strides[n] as i64).sum();
    for n in 0..D
    {
        tablepos -= O as i64 * strides[n] as i64;
    }

    let mut decomposed = [0usize; D];
    let mut basis_tree = [1.0f64; D + 1];
    for n in 0..D
    {
        basis_tree[n + 1] = basis_tree[n] * local_basis[n][0];
    }

    let mut result = 0.0;
    loop
    {
        result += basis_tree[D] * coefficients[tablepos as usize] as f64;

        let mut n = D as isize - 1;
        loop
        {
            if n < 0
            {
                return result;
            }
            let ni = n as usize;
            if decomposed[ni] < O
            {
                decomposed[ni] += 1;
                tablepos += strides[ni] as i64;
                basis_tree[ni + 1] = basis_tree[ni] * local_basis[ni][decomposed[ni]];
                for i in ni + 1..D
                {
                    basis_tree[i + 1] = basis_tree[i] * local_basis[i][decomposed[i]];
                }
                break;
            }
            else
            {
                decomposed[ni] = 0;
                tablepos -= O as i64 * strides[ni] as i64;
                n -= 1;
            }
        }
    }
}
