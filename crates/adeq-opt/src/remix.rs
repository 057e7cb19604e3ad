//! Post-solve hydro redispatch.
//!
//! Reshapes hydro generation across the week to flatten the net-of-hydro
//! load while respecting turbine bounds and the reservoir trajectory. The
//! total of `G + H + D` is preserved hour by hour: every MWh moved from a
//! peak's hydro is given back to a valley, and the valley's unserved
//! energy shrinks by the same amount.
//!
//! Only hours with no spillage and no dispatchable-generation margin
//! (`S(t) + DTG_MRG(t) = 0`) and some hydro-or-unserved energy
//! (`H(t) + D(t) > 0`) are eligible for reshaping.
//!
//! The algorithm is an iterative local improvement: pick the lowest
//! eligible valley, the highest eligible peak, and move the largest
//! feasible quantity between them; the move is bounded by the turbine
//! limits, the unserved energy at the valley, and the room left in the
//! reservoir levels between the two hours. Each applied move strictly
//! shrinks the spread of `G + H`, and an iteration cap backstops
//! termination.

use adeq_core::{CoreError, CoreResult};

/// Inputs of one remix run. All series cover the same timespan.
#[derive(Debug, Clone, Default)]
pub struct RemixInput<'a> {
    /// Non-hydro generation (MW).
    pub generation: &'a [f64],
    /// Hydro generation (MW).
    pub hydro: &'a [f64],
    /// Unserved energy (MW).
    pub unserved: &'a [f64],
    pub hydro_max: &'a [f64],
    pub hydro_min: &'a [f64],
    pub initial_level: f64,
    pub capacity: f64,
    pub inflows: &'a [f64],
    pub overflow: &'a [f64],
    pub pumping: &'a [f64],
    /// Spilled energy (MW); hours with spillage are not reshaped.
    pub spillage: &'a [f64],
    /// Dispatchable-generation margin (MW); same exclusion.
    pub dtg_margin: &'a [f64],
}

/// Outputs: the reshaped hydro and unserved series, plus the reservoir
/// levels computed from the reshaped hydro.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemixOutput {
    pub hydro: Vec<f64>,
    pub unserved: Vec<f64>,
    pub levels: Vec<f64>,
}

const MAX_ROUNDS: usize = 1000;
const SPREAD_EPSILON: f64 = 1e-2;

fn check_input(input: &RemixInput) -> CoreResult<()> {
    let n = input.generation.len();
    if n == 0 {
        return Err(CoreError::InvalidInput(
            "remix input vectors are empty".into(),
        ));
    }
    let lengths = [
        input.hydro.len(),
        input.unserved.len(),
        input.hydro_max.len(),
        input.hydro_min.len(),
        input.inflows.len(),
        input.overflow.len(),
        input.pumping.len(),
        input.spillage.len(),
        input.dtg_margin.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(CoreError::InvalidInput(
            "remix input vectors have different sizes".into(),
        ));
    }
    if input.capacity < input.initial_level {
        return Err(CoreError::InvalidInput(
            "initial level exceeds reservoir capacity".into(),
        ));
    }
    if input
        .hydro
        .iter()
        .zip(input.hydro_max)
        .any(|(h, max)| h > max)
    {
        return Err(CoreError::InvalidInput(
            "H not smaller than Pmax everywhere".into(),
        ));
    }
    if input
        .hydro
        .iter()
        .zip(input.hydro_min)
        .any(|(h, min)| h < min)
    {
        return Err(CoreError::InvalidInput(
            "H not greater than Pmin everywhere".into(),
        ));
    }
    let levels = compute_levels(input, input.hydro);
    if levels
        .iter()
        .any(|&level| level < 0.0 || level > input.capacity)
    {
        return Err(CoreError::InvalidInput(
            "Level computed from input data is out of bounds".into(),
        ));
    }
    Ok(())
}

/// Reservoir trajectory for a hydro series: net inflows are
/// `inflow - overflow + pumping`.
fn compute_levels(input: &RemixInput, hydro: &[f64]) -> Vec<f64> {
    let mut levels = vec![0.0; hydro.len()];
    let mut previous = input.initial_level;
    for (t, level) in levels.iter_mut().enumerate() {
        previous = previous + input.inflows[t] - input.overflow[t] + input.pumping[t] - hydro[t];
        *level = previous;
    }
    levels
}

fn eligible(input: &RemixInput, t: usize) -> bool {
    input.spillage[t] + input.dtg_margin[t] == 0.0
        && input.hydro[t] + input.unserved[t] > 0.0
}

fn find_valley(
    net_load: &[f64],
    unserved: &[f64],
    hydro: &[f64],
    hydro_max: &[f64],
    tried: &[bool],
    eligible_hours: &[bool],
    top: f64,
) -> Option<usize> {
    let mut best_value = top;
    let mut best = None;
    for t in 0..net_load.len() {
        if unserved[t] > 0.0 && hydro[t] < hydro_max[t] && !tried[t] && eligible_hours[t] {
            if net_load[t] < best_value {
                best_value = net_load[t];
                best = Some(t);
            }
        }
    }
    best
}

fn find_peak(
    net_load: &[f64],
    hydro: &[f64],
    hydro_min: &[f64],
    tried: &[bool],
    eligible_hours: &[bool],
    floor: f64,
) -> Option<usize> {
    let mut best_value = 0.0;
    let mut best = None;
    for t in 0..net_load.len() {
        if hydro[t] > hydro_min[t]
            && net_load[t] >= floor + SPREAD_EPSILON
            && !tried[t]
            && eligible_hours[t]
        {
            if net_load[t] > best_value {
                best_value = net_load[t];
                best = Some(t);
            }
        }
    }
    best
}

/// Run the remix. Fails fast on inconsistent input; the solver is never
/// involved.
pub fn remix_hydro(input: &RemixInput) -> CoreResult<RemixOutput> {
    check_input(input)?;

    let n = input.generation.len();
    let mut hydro = input.hydro.to_vec();
    let mut unserved = input.unserved.to_vec();
    let eligible_hours: Vec<bool> = (0..n).map(|t| eligible(input, t)).collect();

    let max_of = |series: &[f64]| series.iter().cloned().fold(f64::MIN, f64::max);
    let top = max_of(input.generation) + max_of(&hydro) + max_of(&unserved) + 1.0;

    let mut net_load: Vec<f64> = input
        .generation
        .iter()
        .zip(&hydro)
        .map(|(g, h)| g + h)
        .collect();
    let mut levels = compute_levels(input, &hydro);

    for _ in 0..MAX_ROUNDS {
        let mut tried_valley = vec![false; n];
        let mut applied = 0.0;

        'valleys: while let Some(valley) = find_valley(
            &net_load,
            &unserved,
            &hydro,
            input.hydro_max,
            &tried_valley,
            &eligible_hours,
            top,
        ) {
            let mut tried_peak = vec![false; n];
            while let Some(peak) = find_peak(
                &net_load,
                &hydro,
                input.hydro_min,
                &tried_peak,
                &eligible_hours,
                net_load[valley],
            ) {
                // Raising the peak-side levels (generation moved later)
                // is bounded by the capacity headroom between the two
                // hours; lowering them by the stored energy.
                let window = &levels[valley.min(peak)..valley.max(peak)];
                let window_max = window.iter().cloned().fold(f64::MIN, f64::max);
                let window_min = window.iter().cloned().fold(f64::MAX, f64::min);

                let max_from_peak =
                    (hydro[peak] - input.hydro_min[peak]).min(input.capacity - window_max);
                let max_into_valley = (input.hydro_max[valley] - hydro[valley])
                    .min(unserved[valley])
                    .min(window_min);
                let half_gap = ((net_load[peak] - net_load[valley]).max(0.0)) / 2.0;

                let delta = max_from_peak.min(max_into_valley).min(half_gap).max(0.0);
                if delta > 0.0 {
                    hydro[peak] -= delta;
                    hydro[valley] += delta;
                    unserved[peak] = input.hydro[peak] + input.unserved[peak] - hydro[peak];
                    unserved[valley] =
                        input.hydro[valley] + input.unserved[valley] - hydro[valley];
                    applied = delta;
                    break 'valleys;
                }
                tried_peak[peak] = true;
            }
            tried_valley[valley] = true;
        }

        if applied == 0.0 {
            break;
        }
        for (t, load) in net_load.iter_mut().enumerate() {
            *load = input.generation[t] + hydro[t];
        }
        levels = compute_levels(input, &hydro);
    }

    Ok(RemixOutput {
        levels: compute_levels(input, &hydro),
        hydro,
        unserved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        generation: Vec<f64>,
        hydro: Vec<f64>,
        unserved: Vec<f64>,
        hydro_max: Vec<f64>,
        hydro_min: Vec<f64>,
        initial_level: f64,
        capacity: f64,
        inflows: Vec<f64>,
        overflow: Vec<f64>,
        pumping: Vec<f64>,
        spillage: Vec<f64>,
        dtg_margin: Vec<f64>,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            Self {
                generation: vec![0.0; n],
                hydro: vec![0.0; n],
                unserved: vec![0.0; n],
                hydro_max: vec![f64::MAX; n],
                hydro_min: vec![0.0; n],
                initial_level: 0.0,
                capacity: 1e9,
                inflows: vec![0.0; n],
                overflow: vec![0.0; n],
                pumping: vec![0.0; n],
                spillage: vec![0.0; n],
                dtg_margin: vec![0.0; n],
            }
        }

        fn input(&self) -> RemixInput<'_> {
            RemixInput {
                generation: &self.generation,
                hydro: &self.hydro,
                unserved: &self.unserved,
                hydro_max: &self.hydro_max,
                hydro_min: &self.hydro_min,
                initial_level: self.initial_level,
                capacity: self.capacity,
                inflows: &self.inflows,
                overflow: &self.overflow,
                pumping: &self.pumping,
                spillage: &self.spillage,
                dtg_margin: &self.dtg_margin,
            }
        }
    }

    fn close(actual: &[f64], expected: &[f64]) -> bool {
        actual.len() == expected.len()
            && actual
                .iter()
                .zip(expected)
                .all(|(a, b)| (a - b).abs() < 1e-3)
    }

    /// A flat thermal stack and a hydro ramp smooth out to a constant.
    #[test]
    fn flat_hydro_smoothing() {
        let mut fx = Fixture::new(5);
        fx.generation = vec![100.0; 5];
        fx.hydro = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        fx.unserved = vec![80.0, 60.0, 40.0, 20.0, 0.0];
        fx.hydro_max = vec![40.0; 5];
        fx.initial_level = 500.0;
        fx.capacity = 1000.0;

        let out = remix_hydro(&fx.input()).unwrap();
        assert!(close(&out.hydro, &[20.0; 5]));
        assert!(close(&out.unserved, &[60.0, 50.0, 40.0, 30.0, 20.0]));
    }

    /// A tight Pmax caps how far the reshape can go; energy is conserved
    /// and no hour ends above its limit.
    #[test]
    fn pmax_clamp_respects_bounds() {
        let mut fx = Fixture::new(5);
        fx.generation = vec![100.0; 5];
        fx.hydro = vec![0.0, 10.0, 20.0, 20.0, 20.0];
        fx.unserved = vec![80.0, 60.0, 40.0, 20.0, 0.0];
        fx.hydro_max = vec![20.0; 5];
        fx.initial_level = 500.0;
        fx.capacity = 1000.0;

        let out = remix_hydro(&fx.input()).unwrap();
        // Hours 0 and 1 still have headroom toward 20, so energy moves
        // from the later (peak) hours down; hours already at Pmax keep it.
        assert!(out.hydro.iter().zip(&fx.hydro_max).all(|(h, max)| h <= max));
        let in_total: f64 = fx.hydro.iter().sum();
        let out_total: f64 = out.hydro.iter().sum();
        assert!((in_total - out_total).abs() < 1e-9);
    }

    /// The reshape stops where further smoothing would overfill the
    /// reservoir mid-week: the result is piecewise flat, not globally
    /// flat.
    #[test]
    fn capacity_limits_reshape() {
        let mut fx = Fixture::new(10);
        fx.hydro = vec![20.0, 10.0, 20.0, 10.0, 20.0, 10.0, 20.0, 10.0, 20.0, 10.0];
        fx.unserved = vec![20.0; 10];
        fx.hydro_max = vec![30.0; 10];
        fx.inflows = vec![25.0, 25.0, 25.0, 25.0, 25.0, 5.0, 5.0, 5.0, 5.0, 5.0];
        fx.initial_level = 100.0;
        fx.capacity = 145.0;

        let out = remix_hydro(&fx.input()).unwrap();
        assert!(close(
            &out.hydro,
            &[16.0, 16.0, 16.0, 16.0, 16.0, 14.0, 14.0, 14.0, 14.0, 14.0]
        ));
        assert!(out.levels.iter().all(|&level| level <= fx.capacity + 1e-9));
    }

    /// H above Pmax is rejected before anything runs.
    #[test]
    fn rejects_h_above_pmax() {
        let mut fx = Fixture::new(5);
        fx.generation = vec![100.0; 5];
        fx.hydro = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        fx.unserved = vec![0.0; 5];
        fx.hydro_max = vec![2.0, 2.0, 2.0, 4.0, 5.0];
        fx.initial_level = 500.0;
        fx.capacity = 1000.0;

        let err = remix_hydro(&fx.input()).unwrap_err();
        assert!(err
            .to_string()
            .contains("H not smaller than Pmax everywhere"));
    }

    #[test]
    fn rejects_mismatched_lengths_and_bad_initial_level() {
        let mut fx = Fixture::new(3);
        fx.inflows = vec![0.0; 2];
        assert!(remix_hydro(&fx.input()).is_err());

        let mut fx = Fixture::new(3);
        fx.initial_level = 10.0;
        fx.capacity = 5.0;
        assert!(remix_hydro(&fx.input()).is_err());
    }

    /// Hours with spillage or DTG margin are untouched.
    #[test]
    fn spillage_and_margin_hours_are_frozen() {
        let mut fx = Fixture::new(5);
        fx.generation = vec![100.0; 5];
        fx.hydro = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        fx.unserved = vec![80.0, 60.0, 40.0, 20.0, 0.0];
        fx.hydro_max = vec![40.0; 5];
        fx.initial_level = 500.0;
        fx.capacity = 1000.0;
        fx.spillage[4] = 1.0;

        let out = remix_hydro(&fx.input()).unwrap();
        assert_eq!(out.hydro[4], 40.0);
    }

    /// Remix of a remix changes nothing.
    #[test]
    fn idempotence() {
        let mut fx = Fixture::new(5);
        fx.generation = vec![100.0; 5];
        fx.hydro = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        fx.unserved = vec![80.0, 60.0, 40.0, 20.0, 0.0];
        fx.hydro_max = vec![40.0; 5];
        fx.initial_level = 500.0;
        fx.capacity = 1000.0;

        let first = remix_hydro(&fx.input()).unwrap();
        let mut again = Fixture::new(5);
        again.generation = fx.generation.clone();
        again.hydro = first.hydro.clone();
        again.unserved = first.unserved.clone();
        again.hydro_max = fx.hydro_max.clone();
        again.initial_level = fx.initial_level;
        again.capacity = fx.capacity;
        let second = remix_hydro(&again.input()).unwrap();

        assert!(close(&second.hydro, &first.hydro));
        assert!(close(&second.unserved, &first.unserved));
    }

    /// Hydro energy and hydro-plus-unserved energy are both conserved.
    #[test]
    fn sum_conservation() {
        let mut fx = Fixture::new(6);
        fx.generation = vec![50.0, 80.0, 20.0, 100.0, 60.0, 40.0];
        fx.hydro = vec![10.0, 0.0, 30.0, 5.0, 15.0, 20.0];
        fx.unserved = vec![5.0, 25.0, 0.0, 30.0, 10.0, 0.0];
        fx.hydro_max = vec![35.0; 6];
        fx.initial_level = 300.0;
        fx.capacity = 1000.0;

        let out = remix_hydro(&fx.input()).unwrap();
        let hydro_in: f64 = fx.hydro.iter().sum();
        let hydro_out: f64 = out.hydro.iter().sum();
        assert!((hydro_in - hydro_out).abs() < 1e-6);

        let total_in: f64 = fx.hydro.iter().zip(&fx.unserved).map(|(h, d)| h + d).sum();
        let total_out: f64 = out.hydro.iter().zip(&out.unserved).map(|(h, d)| h + d).sum();
        assert!((total_in - total_out).abs() < 1e-6);
        assert!(out.unserved.iter().all(|&d| d >= -1e-9));
    }

    /// On a level-unconstrained input, remixing the reversed series gives
    /// the reversed result.
    #[test]
    fn time_reversal_symmetry() {
        let mut fx = Fixture::new(6);
        fx.generation = vec![50.0, 80.0, 20.0, 100.0, 60.0, 40.0];
        fx.hydro = vec![10.0, 0.0, 30.0, 5.0, 15.0, 20.0];
        fx.unserved = vec![5.0, 25.0, 0.0, 30.0, 10.0, 0.0];
        fx.hydro_max = vec![35.0; 6];
        fx.initial_level = 500_000.0;
        fx.capacity = 1_000_000.0;

        let forward = remix_hydro(&fx.input()).unwrap();

        let mut reversed = Fixture::new(6);
        reversed.generation = fx.generation.iter().rev().copied().collect();
        reversed.hydro = fx.hydro.iter().rev().copied().collect();
        reversed.unserved = fx.unserved.iter().rev().copied().collect();
        reversed.hydro_max = fx.hydro_max.clone();
        reversed.initial_level = fx.initial_level;
        reversed.capacity = fx.capacity;
        let backward = remix_hydro(&reversed.input()).unwrap();

        let unreversed: Vec<f64> = backward.hydro.iter().rev().copied().collect();
        // Convergence stops within the spread tolerance, so the two runs
        // may differ by up to that much on tied hours.
        assert!(unreversed
            .iter()
            .zip(&forward.hydro)
            .all(|(a, b)| (a - b).abs() <= 2.0 * SPREAD_EPSILON));
    }

    /// Levels already pinned at the capacity leave no room to move
    /// anything.
    #[test]
    fn capacity_pinned_levels_are_a_no_op() {
        let mut fx = Fixture::new(4);
        fx.generation = vec![10.0, 20.0, 30.0, 40.0];
        fx.hydro = vec![5.0, 5.0, 5.0, 5.0];
        fx.unserved = vec![1.0, 1.0, 1.0, 1.0];
        fx.hydro_max = vec![10.0; 4];
        fx.inflows = vec![5.0; 4];
        fx.initial_level = 100.0;
        fx.capacity = 100.0;

        let out = remix_hydro(&fx.input()).unwrap();
        assert!(close(&out.hydro, &fx.hydro));
    }

    /// Pmin pinned to the current hydro forbids lowering any peak.
    #[test]
    fn pmin_pinned_is_a_no_op() {
        let mut fx = Fixture::new(4);
        fx.generation = vec![10.0, 20.0, 30.0, 40.0];
        fx.hydro = vec![5.0, 6.0, 7.0, 8.0];
        fx.hydro_min = fx.hydro.clone();
        fx.hydro_max = vec![20.0; 4];
        fx.unserved = vec![2.0; 4];
        fx.initial_level = 500.0;
        fx.capacity = 1000.0;

        let out = remix_hydro(&fx.input()).unwrap();
        assert!(close(&out.hydro, &fx.hydro));
    }
}
