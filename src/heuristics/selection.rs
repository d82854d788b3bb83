//! Parent selection for the assignment GA.
//!
//! Fitness is a cost (lower is better), so every scheme gives the cheapest chromosomes
//! the largest share of the probability mass. Parents are drawn with replacement.

use crate::error::{GaError, GaResult};
use ordered_float::OrderedFloat;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Offset used by [`SelectionType::ProportionalShifted`] so the worst chromosome keeps a
/// non-zero probability.
pub const SHIFT_EPSILON: f64 = 0.001;

/// Selection method types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionType {
    /// Probability proportional to `1 / cost`
    Proportional,
    /// Probability proportional to `max_cost - cost + epsilon`
    ProportionalShifted,
    /// Probability proportional to `N - rank` (rank 0 = cheapest)
    RankLinear,
    /// Probability proportional to `q^rank`, `0 < q < 1`
    RankNonlinear,
}

impl SelectionType {
    /// Short label used in result file names
    pub fn label(&self) -> &'static str {
        match self {
            SelectionType::Proportional => "proportional",
            SelectionType::ProportionalShifted => "proportional_shifted",
            SelectionType::RankLinear => "rank_linear",
            SelectionType::RankNonlinear => "rank_nonlinear",
        }
    }

    pub fn uses_q(&self) -> bool {
        matches!(self, SelectionType::RankNonlinear)
    }
}

/// Parents for the next generation plus the chromosomes carried over unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// `2N` indices; offspring `i` is bred from `parents[2i]` and `parents[2i + 1]`
    pub parents: Vec<usize>,
    /// Indices of the elite chromosomes, cheapest first (empty without elitism)
    pub elites: Vec<usize>,
}

/// Check the rank-nonlinear shape parameter.
pub fn validate_q(q: f64) -> GaResult<()> {
    if q > 0.0 && q < 1.0 {
        Ok(())
    } else {
        Err(GaError::configuration("q", format!("must lie strictly between 0 and 1, got {}", q)))
    }
}

/// Population indices sorted by increasing cost; ties keep population order.
pub fn rank_order(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by_key(|&i| OrderedFloat(fitness[i]));
    order
}

/// Rank of every chromosome (0 = cheapest)
pub fn ranks(fitness: &[f64]) -> Vec<usize> {
    let mut rank = vec![0; fitness.len()];
    for (r, i) in rank_order(fitness).into_iter().enumerate() {
        rank[i] = r;
    }
    rank
}

/// Selection probability of every chromosome under `mode`.
///
/// The result is non-negative and sums to one.
pub fn selection_probabilities(fitness: &[f64], mode: SelectionType, q: f64) -> GaResult<Vec<f64>> {
    if fitness.is_empty() {
        return Err(GaError::configuration(
            "population_size",
            "cannot select from an empty population",
        ));
    }

    let weights: Vec<f64> = match mode {
        SelectionType::Proportional => {
            if fitness.iter().any(|&f| f <= 0.0) {
                // Zero-cost chromosomes would take infinite weight; they share the mass.
                fitness.iter().map(|&f| if f <= 0.0 { 1.0 } else { 0.0 }).collect()
            } else {
                fitness.iter().map(|&f| 1.0 / f).collect()
            }
        }
        SelectionType::ProportionalShifted => {
            let max = fitness.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            fitness.iter().map(|&f| max - f + SHIFT_EPSILON).collect()
        }
        SelectionType::RankLinear => {
            let n = fitness.len();
            ranks(fitness).into_iter().map(|r| (n - r) as f64).collect()
        }
        SelectionType::RankNonlinear => {
            validate_q(q)?;
            ranks(fitness).into_iter().map(|r| q.powi(r as i32)).collect()
        }
    };

    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(GaError::configuration(
            "fitness",
            format!("selection weights do not form a distribution (total {})", total),
        ));
    }

    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Draw `2N` parents and, when `elitism` is set, pick the `elite_count` cheapest
/// chromosomes to survive unchanged.
pub fn select<R: Rng + ?Sized>(
    fitness: &[f64],
    mode: SelectionType,
    q: f64,
    elitism: bool,
    elite_count: usize,
    rng: &mut R,
) -> GaResult<Selection> {
    let prob = selection_probabilities(fitness, mode, q)?;
    let dist = WeightedIndex::new(&prob)
        .map_err(|e| GaError::configuration("fitness", e.to_string()))?;

    let parents: Vec<usize> = (0..2 * fitness.len()).map(|_| dist.sample(rng)).collect();

    let elites = if elitism {
        rank_order(fitness).into_iter().take(elite_count).collect()
    } else {
        Vec::new()
    };

    Ok(Selection { parents, elites })
}
