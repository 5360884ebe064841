//! Self-timing of the evaluation paths, for comparing specialisations and
//! tracking regressions without a separate harness process.
//--------------------------------------------------------------------------------------------------

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::search::search_centers;
use crate::table::Table;

/// Throughput of the three evaluation paths, in evaluations per second.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkResults
{
    pub single_eval_rate: f64,
    /// Rate of the gradient computed as one value evaluation plus one
    /// derivative evaluation per axis. Faithfully timed as `trial_count *
    /// (ndim + 1)` evaluations even though the value evaluation is only
    /// issued once per trial point and the per-axis ones reuse a handle —
    /// the asymmetry is deliberate, carried over from the routine this
    /// mirrors.
    pub gradient_scalar_rate: f64,
    /// Rate of the gradient computed in one combined walk via
    /// [`Table::evaluate_gradient`].
    pub gradient_combined_rate: f64,
}

impl Table
{
    /// Times `trial_count` evaluations at uniformly sampled points within
    /// this table's support, using a fixed seed so results are comparable
    /// across runs.
    pub fn benchmark(
        &self,
        trial_count: usize,
        verbose: bool,
    ) -> BenchmarkResults
    {
        let ndim = self.ndim();
        let mut rng = StdRng::seed_from_u64(52);

        let points: Vec<Vec<f64>> = (0..trial_count)
            .map(|_| {
                (0..ndim)
                    .map(|dim| {
                        let lo = self.lower_extent(dim);
                        let hi = self.upper_extent(dim);
                        if lo < hi { rng.gen_range(lo..=hi) } else { lo }
                    })
                    .collect()
            })
            .collect();

        let centers: Vec<Vec<usize>> = points
            .iter()
            .map(|p| search_centers(self, p).expect("benchmark point fell outside the table's support"))
            .collect();

        let mask_none = vec![false; ndim];

        let start = Instant::now();
        for i in 0..trial_count
        {
            std::hint::black_box(self.evaluate(&points[i], &centers[i], &mask_none));
        }
        let single_eval_rate = trial_count as f64 / start.elapsed().as_secs_f64();

        let handle = self.evaluation_handle();
        let start = Instant::now();
        for i in 0..trial_count
        {
            std::hint::black_box(self.evaluate(&points[i], &centers[i], &mask_none));
            for axis in 0..ndim
            {
                let mut mask = mask_none.clone();
                mask[axis] = true;
                std::hint::black_box(self.evaluate_with_handle(handle, &points[i], &centers[i], &mask));
            }
        }
        let gradient_scalar_rate = (trial_count * (ndim + 1)) as f64 / start.elapsed().as_secs_f64();

        let start = Instant::now();
        for i in 0..trial_count
        {
            std::hint::black_box(self.evaluate_gradient(&points[i], &centers[i]));
        }
        let gradient_combined_rate = trial_count as f64 / start.elapsed().as_secs_f64();

        if verbose
        {
            log::info!(
                "benchmark: {trial_count} trials over {ndim}-D table, single={single_eval_rate:.1}/s \
                 gradient(scalar)={gradient_scalar_rate:.1}/s gradient(combined)={gradient_combined_rate:.1}/s"
            );
        }

        BenchmarkResults { single_eval_rate, gradient_scalar_rate, gradient_combined_rate }
    }
}
