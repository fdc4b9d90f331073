/// Metric derivation from flux statistics
use crate::domain::{Metrics, Quantity, Scoring};

/// Divisor applied to the raw tree count
pub const TREE_COUNT_SCALE: f64 = 10_000.0;

/// Amplitude buckets for the amplitude-only tree count, ascending upper bounds
pub static AMPLITUDE_TREE_LADDER: [(f64, u64); 3] = [(0.1, 10), (0.5, 5), (1.0, 1)];

/// `trunc(habitability * 10) + trunc(amplitude * 100)`, saturating at zero
pub fn tree_count(habitability: impl Into<Quantity>, amplitude: impl Into<Quantity>) -> u64 {
    let habitability = habitability.into().as_number();
    let amplitude = amplitude.into().as_number();

    let habitability_term = (habitability * 10.0).trunc() as i64;
    let amplitude_term = (amplitude * 100.0).trunc() as i64;
    habitability_term.saturating_add(amplitude_term).max(0) as u64
}

/// Tree count from amplitude alone: first bucket whose bound exceeds the amplitude
pub fn tree_count_from_amplitude(amplitude: impl Into<Quantity>) -> u64 {
    let amplitude = amplitude.into().as_number();

    AMPLITUDE_TREE_LADDER
        .iter()
        .find(|(bound, _)| amplitude < *bound)
        .or_else(|| AMPLITUDE_TREE_LADDER.last())
        .map(|(_, trees)| *trees)
        .unwrap_or_default()
}

pub fn tree_count_normalized(tree_count: u64) -> f64 {
    tree_count as f64 / TREE_COUNT_SCALE
}

/// `tree_count * 0.1 + amplitude * 0.01`, floored at zero
pub fn habitability_score(tree_count: u64, amplitude: impl Into<Quantity>) -> f64 {
    let amplitude = amplitude.into().as_number();
    let score = tree_count as f64 * 0.1 + amplitude * 0.01;
    if score < 0.0 {
        0.0
    } else {
        score
    }
}

/// Full metric set for one amplitude.
///
/// The amplitude must come from a defined median; undefined statistics are
/// rejected upstream.
pub fn derive(
    baseline_habitability: &Quantity,
    amplitude: impl Into<Quantity>,
    scoring: Scoring,
) -> Metrics {
    let amplitude = amplitude.into().as_number();

    let trees = match scoring {
        Scoring::Habitability => tree_count(baseline_habitability.clone(), amplitude),
        Scoring::Amplitude => tree_count_from_amplitude(amplitude),
    };

    Metrics {
        tree_count: trees,
        tree_count_normalized: tree_count_normalized(trees),
        habitability_score: habitability_score(trees, amplitude),
    }
}
