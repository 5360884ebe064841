//! A tiny width-4 `f64` lane abstraction used by [`crate::gradient`] to
//! combine the value channel and every partial-derivative channel's
//! per-axis multiply in one vector operation instead of one scalar
//! multiply per channel.
//!
//! The default build uses a plain-array scalar fallback. Building with
//! `--features simd` swaps in a `std::simd`-backed lane on nightly; both
//! implementations perform the same four multiplies and four adds in the
//! same order, so switching between them never changes a result.
//--------------------------------------------------------------------------------------------------

pub(crate) trait Lane: Copy
{
    fn splat(value: f64) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn add(self, rhs: Self) -> Self;
    fn to_array(self) -> [f64; 4];
    fn from_array(a: [f64; 4]) -> Self;
}
//..................................................................................................

#[derive(Copy, Clone)]
pub(crate) struct ScalarLane([f64; 4]);

impl Lane for ScalarLane
{
    fn splat(value: f64) -> Self { Self([value; 4]) }

    fn mul(
        self,
        rhs: Self,
    ) -> Self
    {
        Self(std::array::from_fn(|i| self.0[i] * rhs.0[i]))
    }

    fn add(
        self,
        rhs: Self,
    ) -> Self
    {
        Self(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
    }

    fn to_array(self) -> [f64; 4] { self.0 }

    fn from_array(a: [f64; 4]) -> Self { Self(a) }
}
//..................................................................................................

#[cfg(feature = "simd")]
mod vectorised
{
    use std::simd::f64x4;

    #[derive(Copy, Clone)]
    pub(crate) struct VectorLane(f64x4);

    impl super::Lane for VectorLane
    {
        fn splat(value: f64) -> Self { Self(f64x4::splat(value)) }

        fn mul(
            self,
            rhs: Self,
        ) -> Self
        {
            Self(self.0 * rhs.0)
        }

        fn add(
            self,
            rhs: Self,
        ) -> Self
        {
            Self(self.0 + rhs.0)
        }

        fn to_array(self) -> [f64; 4] { self.0.to_array() }

        fn from_array(a: [f64; 4]) -> Self { Self(f64x4::from_array(a)) }
    }
}

#[cfg(feature = "simd")]
pub(crate) type DefaultLane = vectorised::VectorLane;
#[cfg(not(feature = "simd"))]
pub(crate) type DefaultLane = ScalarLane;
//..................................................................................................

/// `out[i] = a[i] * b[i]` for equal-length slices, processed in width-4
/// chunks (the last chunk padded with zeros and discarded on store).
pub(crate) fn lane_mul_into(
    a: &[f64],
    b: &[f64],
    out: &mut [f64],
)
{
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), out.len());

    let len = a.len();
    let mut i = 0;
    while i < len
    {
        let take = (len - i).min(4);
        let mut abuf = [0.0; 4];
        let mut bbuf = [0.0; 4];
        abuf[..take].copy_from_slice(&a[i..i + take]);
        bbuf[..take].copy_from_slice(&b[i..i + take]);

        let r = DefaultLane::from_array(abuf).mul(DefaultLane::from_array(bbuf)).to_array();
        out[i..i + take].copy_from_slice(&r[..take]);
        i += take;
    }
}
//..................................................................................................

/// `acc[i] += tree[i] * coef` for equal-length slices, processed in
/// width-4 chunks.
pub(crate) fn lane_axpy_into(
    acc: &mut [f64],
    tree: &[f64],
    coef: f64,
)
{
    debug_assert_eq!(acc.len(), tree.len());

    let len = acc.len();
    let coef_lane = DefaultLane::splat(coef);
    let mut i = 0;
    while i < len
    {
        let take = (len - i).min(4);
        let mut tbuf = [0.0; 4];
        let mut abuf = [0.0; 4];
        tbuf[..take].copy_from_slice(&tree[i..i + take]);
        abuf[..take].copy_from_slice(&acc[i..i + take]);

        let product = DefaultLane::from_array(tbuf).mul(coef_lane);
        let sum = DefaultLane::from_array(abuf).add(product).to_array();
        acc[i..i + take].copy_from_slice(&sum[..take]);
        i += take;
    }
}
