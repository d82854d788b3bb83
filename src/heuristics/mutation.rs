//! Mutation policies.

use crate::solution::Chromosome;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Mutation operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationType {
    /// Leave offspring untouched
    None,
    /// Hand a task to a different worker, keeping its row one-hot
    Reassign,
}

/// Reassign `task` to one worker drawn uniformly among those not holding it.
///
/// Returns `false` when there is nowhere to move (single worker).
pub fn reassign_task<R: Rng + ?Sized>(
    chromosome: &mut Chromosome,
    task: usize,
    rng: &mut R,
) -> bool {
    let workers = chromosome.num_workers();
    if workers < 2 {
        return false;
    }

    let free: Vec<usize> = (0..workers)
        .filter(|&w| !chromosome.is_assigned(task, w))
        .collect();

    let target = match free.choose(rng) {
        Some(&w) => w,
        None => rng.gen_range(0..workers),
    };
    chromosome.assign(task, target);
    true
}

/// Apply `mutation_type` to every chromosome of `offspring`, each task row
/// independently with probability `mutation_prob`. Returns the number of rows changed.
pub fn mutate<R: Rng + ?Sized>(
    offspring: &mut [Chromosome],
    mutation_type: MutationType,
    mutation_prob: f64,
    rng: &mut R,
) -> usize {
    match mutation_type {
        MutationType::None => 0,
        MutationType::Reassign => {
            let mut changed = 0;
            for chromosome in offspring.iter_mut() {
                for task in 0..chromosome.num_tasks() {
                    if rng.gen::<f64>() < mutation_prob && reassign_task(chromosome, task, rng) {
                        changed += 1;
                    }
                }
            }
            changed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_reassign_moves_to_another_worker() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..50 {
            let mut chromosome = Chromosome::from_assignment(&[1, 0], 4);
            assert!(reassign_task(&mut chromosome, 0, &mut rng));
            let held = chromosome.assigned_workers(0);
            assert_eq!(held.len(), 1);
            assert_ne!(held[0], 1);
            assert_eq!(chromosome.assigned_workers(1), vec![0]);
        }
    }

    #[test]
    fn test_single_worker_is_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut offspring = vec![Chromosome::from_assignment(&[0, 0, 0], 1)];
        let before = offspring.clone();
        assert_eq!(mutate(&mut offspring, MutationType::Reassign, 1.0, &mut rng), 0);
        assert_eq!(offspring, before);
    }

    #[test]
    fn test_certain_mutation_changes_every_row() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let original = Chromosome::from_assignment(&[0, 1, 2, 0, 1], 3);
        let mut offspring = vec![original.clone(); 3];

        let changed = mutate(&mut offspring, MutationType::Reassign, 1.0, &mut rng);
        assert_eq!(changed, 15);
        for chromosome in &offspring {
            assert!(chromosome.is_one_hot());
            for task in 0..5 {
                assert_ne!(chromosome.assigned_workers(task), original.assigned_workers(task));
            }
        }
    }

    #[test]
    fn test_noop_and_zero_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut offspring = vec![Chromosome::from_assignment(&[0, 1, 2], 3); 4];
        let before = offspring.clone();
        assert_eq!(mutate(&mut offspring, MutationType::None, 1.0, &mut rng), 0);
        assert_eq!(mutate(&mut offspring, MutationType::Reassign, 0.0, &mut rng), 0);
        assert_eq!(offspring, before);
    }
}
