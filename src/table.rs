//! The spline table entity: owns knots, coefficients and axis metadata, and
//! exposes the read accessors used by every other component.
//--------------------------------------------------------------------------------------------------

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dispatch::{pick_dispatch, DispatchKind, EvaluationHandle};
use crate::error::SplineError;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// One axis's knot vector, stored with `order` virtual knots of padding on
/// each side of the publicly visible range.
///
/// Visible index `j` (for `j` in `0..nknots`) is the knot a caller would
/// expect from `get_knot(dim, j)`; the basis evaluator and tensor walker
/// additionally reach into the padding on either side, which is why access
/// is through [`AxisKnots::get`] rather than plain slice indexing.
pub(crate) struct AxisKnots
{
    /// Backing storage, length `nknots + 2*order`.
    data: Vec<f64>,
    order: usize,
    nknots: usize,
}

impl AxisKnots
{
    /// `padded` must already include `order` virtual knots on each side of
    /// the `nknots` visible ones and must be non-decreasing throughout.
    fn new(
        padded: Vec<f64>,
        order: usize,
    ) -> Result<Self, SplineError>
    {
        if padded.len() < 2 * order + 1
        {
            return Err(SplineError::MalformedTable(format!(
                "knot vector of length {} cannot hold order-{} padding on both sides",
                padded.len(),
                order
            )));
        }
        if !padded.windows(2).all(|w| w[0] <= w[1])
        {
            return Err(SplineError::MalformedTable(
                "knot vector is not non-decreasing".to_string(),
            ));
        }
        let nknots = padded.len() - 2 * order;
        Ok(Self { data: padded, order, nknots })
    }
    //..............................................................................................

    /// Padded access: `j = 0` is the first visible knot, negative `j` and
    /// `j >= nknots` reach into the padding.
    #[inline]
    pub(crate) fn get(
        &self,
        j: isize,
    ) -> f64
    {
        let idx = j + self.order as isize;
        debug_assert!(idx >= 0 && (idx as usize) < self.data.len(), "knot index out of padded range");
        self.data[idx as usize]
    }
    //..............................................................................................

    /// The raw, padded knot storage (`order` virtual knots on each side of
    /// the visible range). Used by reference-quality routines that index
    /// knots directly rather than through [`AxisKnots::get`].
    pub(crate) fn raw(&self) -> &[f64] { &self.data }

    /// Maps a `get`-style index (`0` = first visible knot) to its position
    /// in [`AxisKnots::raw`].
    pub(crate) fn raw_index(
        &self,
        j: isize,
    ) -> isize
    {
        j + self.order as isize
    }

    pub(crate) fn order(&self) -> usize { self.order }

    pub(crate) fn nknots(&self) -> usize { self.nknots }

    pub(crate) fn lower_extent(&self) -> f64 { self.get(0) }

    pub(crate) fn upper_extent(&self) -> f64 { self.get(self.nknots as isize - 1) }
}
//..................................................................................................

/// An immutable tensor-product B-spline coefficient table.
///
/// Construct one with [`TableBuilder`]. A `Table` never mutates itself after
/// construction, so evaluating it concurrently from many threads is sound;
/// the only requirement is that nothing mutates it (convolution, refitting)
/// while evaluation is in flight, which this core has no way to enforce and
/// therefore does not attempt to.
pub struct Table
{
    id: u64,
    pub(crate) axes: Vec<AxisKnots>,
    pub(crate) order: Vec<usize>,
    pub(crate) naxes: Vec<u64>,
    pub(crate) strides: Vec<u64>,
    pub(crate) coefficients: Vec<f32>,
    pub(crate) dispatch: DispatchKind,
}

impl Table
{
    pub(crate) fn id(&self) -> u64 { self.id }

    /// Number of axes N.
    pub fn ndim(&self) -> usize { self.axes.len() }

    /// Polynomial order of axis `dim`.
    pub fn order(
        &self,
        dim: usize,
    ) -> usize
    {
        self.order[dim]
    }

    /// Number of knots stored for axis `dim` (visible range only).
    pub fn nknots(
        &self,
        dim: usize,
    ) -> usize
    {
        self.axes[dim].nknots()
    }

    /// The `j`'th knot of axis `dim`, `j` in `0..nknots(dim)`.
    pub fn knot(
        &self,
        dim: usize,
        j: usize,
    ) -> f64
    {
        self.axes[dim].get(j as isize)
    }

    pub fn lower_extent(
        &self,
        dim: usize,
    ) -> f64
    {
        self.axes[dim].lower_extent()
    }

    pub fn upper_extent(
        &self,
        dim: usize,
    ) -> f64
    {
        self.axes[dim].upper_extent()
    }

    /// Total number of coefficients.
    pub fn ncoeffs(&self) -> u64 { self.naxes.iter().product() }

    /// Number of coefficients (basis functions) along axis `dim`.
    pub fn ncoeffs_axis(
        &self,
        dim: usize,
    ) -> u64
    {
        self.naxes[dim]
    }

    /// Stride, in coefficients, of axis `dim` in the flat coefficient array.
    pub fn stride(
        &self,
        dim: usize,
    ) -> u64
    {
        self.strides[dim]
    }

    /// Raw access to the flat coefficient array, in last-axis-fastest order.
    pub fn coefficients(&self) -> &[f32] { &self.coefficients }

    /// A reusable dispatch token bound to this table; see [`EvaluationHandle`].
    pub fn evaluation_handle(&self) -> EvaluationHandle
    {
        EvaluationHandle { kind: self.dispatch, table_id: self.id }
    }
}
//..................................................................................................

/// Per-axis input to [`TableBuilder`].
pub struct AxisSpec
{
    /// Polynomial order of this axis.
    pub order: usize,
    /// The knot vector, already padded with `order` virtual knots on each side.
    pub knots: Vec<f64>,
    /// Number of basis functions (coefficients) along this axis.
    pub naxes: u64,
    /// Stride, in coefficients, between adjacent elements along this axis.
    pub stride: u64,
}
//..................................................................................................

/// Collects raw per-axis arrays and a flat coefficient buffer and validates
/// them against the padding and stride invariants before a [`Table`] is
/// allowed to exist. This is the only interface through which the core
/// accepts data from an external producer (a fitter, a file reader); no
/// partially valid `Table` is ever observable.
#[derive(Default)]
pub struct TableBuilder
{
    axes: Vec<AxisSpec>,
    coefficients: Vec<f32>,
}

impl TableBuilder
{
    pub fn new() -> Self { Self::default() }

    pub fn axis(
        mut self,
        spec: AxisSpec,
    ) -> Self
    {
        self.axes.push(spec);
        self
    }

    pub fn coefficients(
        mut self,
        coefficients: Vec<f32>,
    ) -> Self
    {
        self.coefficients = coefficients;
        self
    }

    pub fn build(self) -> Result<Table, SplineError>
    {
        if self.axes.is_empty()
        {
            return Err(SplineError::MalformedTable("table must have at least one axis".to_string()));
        }

        let ndim = self.axes.len();
        let mut order = Vec::with_capacity(ndim);
        let mut naxes = Vec::with_capacity(ndim);
        let mut strides = Vec::with_capacity(ndim);
        let mut axes = Vec::with_capacity(ndim);

        for (i, spec) in self.axes.into_iter().enumerate()
        {
            let padded_len = spec.knots.len();
            let knots = AxisKnots::new(spec.knots, spec.order)?;

            let nknots = knots.nknots();
            // naxes[i] + order[i] + 1 == nknots[i] + 2*order[i]
            let expected_naxes = nknots as i64 + spec.order as i64 - 1;
            if expected_naxes < 1 || spec.naxes as i64 != expected_naxes
            {
                return Err(SplineError::MalformedTable(format!(
                    "axis {i}: naxes={} inconsistent with padding (nknots={nknots}, order={}, padded_len={padded_len})",
                    spec.naxes, spec.order
                )));
            }

            order.push(spec.order);
            naxes.push(spec.naxes);
            strides.push(spec.stride);
            axes.push(knots);
        }

        if *strides.last().unwrap() != 1
        {
            return Err(SplineError::MalformedTable("strides[N-1] must equal 1".to_string()));
        }
        for i in (1..ndim).rev()
        {
            let expected = strides[i] * naxes[i];
            if strides[i - 1] != expected
            {
                return Err(SplineError::MalformedTable(format!(
                    "strides[{}]={} does not equal strides[{}]*naxes[{}] = {}",
                    i - 1,
                    strides[i - 1],
                    i,
                    i,
                    expected
                )));
            }
        }

        let expected_ncoeffs: u64 = naxes.iter().product();
        if self.coefficients.len() as u64 != expected_ncoeffs
        {
            return Err(SplineError::MalformedTable(format!(
                "coefficient array has {} entries, expected {}",
                self.coefficients.len(),
                expected_ncoeffs
            )));
        }

        let dispatch = pick_dispatch(&order);
        let id = NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed);

        log::debug!(
            "constructed {}-D spline table (orders={:?}, ncoeffs={}, dispatch={:?})",
            ndim,
            order,
            expected_ncoeffs,
            dispatch
        );

        Ok(Table { id, axes, order, naxes, strides, coefficients: self.coefficients, dispatch })
    }
}
