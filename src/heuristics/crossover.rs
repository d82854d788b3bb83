//! One-point crossover over the assignment matrix.
//!
//! The three operators differ only in the axis the cut runs along. Cutting between task
//! rows keeps every row one-hot; cutting between worker columns or inside the flattened
//! matrix can leave tasks unassigned or doubly assigned, which repair fixes afterwards.

use crate::heuristics::population::Population;
use crate::heuristics::selection::Selection;
use crate::solution::Chromosome;
use ndarray::s;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Crossover operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossoverType {
    /// Rows `< cut` from the first parent, the rest from the second
    ByTask,
    /// Columns `< cut` from the first parent, the rest from the second
    ByWorker,
    /// Row-major cells `< cut` from the first parent, the rest from the second
    Flattened,
}

impl CrossoverType {
    /// Short label used in result file names
    pub fn label(&self) -> &'static str {
        match self {
            CrossoverType::ByTask => "task",
            CrossoverType::ByWorker => "worker",
            CrossoverType::Flattened => "flatten",
        }
    }

    /// Exclusive upper bound of the cut point for a (tasks x workers) chromosome
    pub fn cut_range(&self, tasks: usize, workers: usize) -> usize {
        match self {
            CrossoverType::ByTask => tasks,
            CrossoverType::ByWorker => workers,
            CrossoverType::Flattened => tasks * workers,
        }
    }
}

/// Combine `first` up to `cut` with `second` after it.
pub fn recombine(
    first: &Chromosome,
    second: &Chromosome,
    cut: usize,
    mode: CrossoverType,
) -> Chromosome {
    let mut child = second.clone();

    match mode {
        CrossoverType::ByTask => {
            child
                .genes_mut()
                .slice_mut(s![..cut, ..])
                .assign(&first.genes().slice(s![..cut, ..]));
        }
        CrossoverType::ByWorker => {
            child
                .genes_mut()
                .slice_mut(s![.., ..cut])
                .assign(&first.genes().slice(s![.., ..cut]));
        }
        CrossoverType::Flattened => {
            for (cell, &gene) in child.genes_mut().iter_mut().zip(first.genes().iter()).take(cut) {
                *cell = gene;
            }
        }
    }

    child
}

/// Build the next population: one offspring per non-elite slot, then the elites
/// unchanged, so the size is conserved.
pub fn crossover<R: Rng + ?Sized>(
    population: &[Chromosome],
    selection: &Selection,
    mode: CrossoverType,
    rng: &mut R,
) -> Population {
    let Some(template) = population.first() else {
        return Vec::new();
    };
    let upper = mode.cut_range(template.num_tasks(), template.num_workers()).max(1);
    let num_offspring = population.len().saturating_sub(selection.elites.len());

    let mut next: Population = Vec::with_capacity(population.len());

    for pair in selection.parents.chunks_exact(2).take(num_offspring) {
        let cut = rng.gen_range(0..upper);
        next.push(recombine(&population[pair[0]], &population[pair[1]], cut, mode));
    }

    next.extend(selection.elites.iter().map(|&e| population[e].clone()));
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    fn parents() -> (Chromosome, Chromosome) {
        (
            Chromosome::from_assignment(&[0, 0, 0], 3),
            Chromosome::from_assignment(&[2, 2, 2], 3),
        )
    }

    #[test]
    fn test_task_cut_keeps_rows_one_hot() {
        let (a, b) = parents();
        let child = recombine(&a, &b, 2, CrossoverType::ByTask);
        assert_eq!(child.assignment(), Some(vec![0, 0, 2]));
    }

    #[test]
    fn test_worker_cut_mixes_columns() {
        let (a, b) = parents();
        // columns 0..1 from a (all tasks on worker 0), column 2 from b (all tasks on worker 2)
        let child = recombine(&a, &b, 1, CrossoverType::ByWorker);
        assert_eq!(child.assigned_workers(0), vec![0, 2]);
        assert!(!child.is_one_hot());

        let child = recombine(&b, &a, 1, CrossoverType::ByWorker);
        assert!(child.assigned_workers(1).is_empty());
    }

    #[test]
    fn test_flattened_cut_splits_inside_a_row() {
        let (a, b) = parents();
        // cells 0..4: row 0 and the first cell of row 1 come from b
        let child = recombine(&b, &a, 4, CrossoverType::Flattened);
        assert_eq!(child.assigned_workers(0), vec![2]);
        assert!(child.assigned_workers(1).is_empty());
        assert_eq!(child.assigned_workers(2), vec![0]);

        let child = recombine(&a, &b, 4, CrossoverType::Flattened);
        assert_eq!(child.assigned_workers(1), vec![0, 2]);
    }

    #[test]
    fn test_zero_cut_copies_second_parent() {
        let (a, b) = parents();
        for mode in [CrossoverType::ByTask, CrossoverType::ByWorker, CrossoverType::Flattened] {
            assert_eq!(recombine(&a, &b, 0, mode), b);
        }
    }

    #[test]
    fn test_size_is_conserved_with_elites() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let population: Population = (0..6)
            .map(|i| Chromosome::from_assignment(&[i % 3, (i + 1) % 3, 0, 1], 3))
            .collect();
        let selection = Selection {
            parents: vec![0, 1, 2, 3, 4, 5, 0, 2, 1, 3, 4, 0],
            elites: vec![4, 5],
        };

        for mode in [CrossoverType::ByTask, CrossoverType::ByWorker, CrossoverType::Flattened] {
            let next = crossover(&population, &selection, mode, &mut rng);
            assert_eq!(next.len(), population.len());
            assert_eq!(next[4], population[4]);
            assert_eq!(next[5], population[5]);
        }
    }
}
