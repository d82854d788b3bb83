//! Initial population generation and fitness evaluation.

use crate::instance::AssignmentInstance;
use crate::solution::Chromosome;
use ordered_float::OrderedFloat;
use rand::prelude::*;

/// Ordered collection of chromosomes; the size stays fixed across generations.
pub type Population = Vec<Chromosome>;

/// Give every (chromosome, task) pair one worker drawn uniformly at random.
///
/// Rows are one-hot by construction; worker capacity is not considered.
pub fn generate_population<R: Rng + ?Sized>(
    size: usize,
    tasks: usize,
    workers: usize,
    rng: &mut R,
) -> Population {
    (0..size)
        .map(|_| {
            let assignment: Vec<usize> = (0..tasks).map(|_| rng.gen_range(0..workers)).collect();
            Chromosome::from_assignment(&assignment, workers)
        })
        .collect()
}

/// Total assignment cost of every chromosome (lower is better).
pub fn evaluate(instance: &AssignmentInstance, population: &[Chromosome]) -> Vec<f64> {
    population.iter().map(|c| c.cost(instance)).collect()
}

/// Per-generation view of a fitness vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessSummary {
    pub min: f64,
    pub mean: f64,
    /// Position of the (first) lowest-cost chromosome
    pub argmin: usize,
}

pub fn summarize(fitness: &[f64]) -> Option<FitnessSummary> {
    let (argmin, &min) = fitness
        .iter()
        .enumerate()
        .min_by_key(|&(_, &f)| OrderedFloat(f))?;
    let mean = fitness.iter().sum::<f64>() / fitness.len() as f64;

    Some(FitnessSummary { min, mean, argmin })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_generated_rows_are_one_hot() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let population = generate_population(25, 12, 4, &mut rng);

        assert_eq!(population.len(), 25);
        for chromosome in &population {
            assert_eq!(chromosome.num_tasks(), 12);
            assert_eq!(chromosome.num_workers(), 4);
            assert!(chromosome.is_one_hot());
        }
    }

    #[test]
    fn test_evaluate_contracts_against_costs() {
        let instance = AssignmentInstance::from_rows(
            "small",
            vec![vec![1.0, 5.0], vec![5.0, 1.0], vec![2.0, 2.0]],
            2,
        )
        .unwrap();
        let population = vec![
            Chromosome::from_assignment(&[0, 1, 0], 2),
            Chromosome::from_assignment(&[1, 0, 1], 2),
        ];

        assert_eq!(evaluate(&instance, &population), vec![4.0, 12.0]);
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&[7.0, 3.0, 5.0, 3.0]).unwrap();
        assert_eq!(summary.min, 3.0);
        assert_eq!(summary.argmin, 1);
        assert!((summary.mean - 4.5).abs() < 1e-12);
        assert!(summarize(&[]).is_none());
    }
}
