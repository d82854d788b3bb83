//! Feasibility repair.
//!
//! After crossover and mutation a chromosome may hold tasks nobody performs, tasks
//! performed by several workers, and workers above `calls_max`. Repair runs two passes:
//!
//! 1. **Rows**: an unassigned task gets a uniformly random worker; a task held by several
//!    workers keeps one of them, chosen uniformly.
//! 2. **Capacity**: workers are visited in order; an overloaded worker hands tasks, chosen
//!    uniformly without replacement, to the workers that still have spare capacity.
//!
//! When `workers * calls_max >= tasks` the capacity pass always ends with every worker
//! within its limit. Otherwise the leftover violations are only reported.

use crate::solution::Chromosome;
use rand::prelude::*;

/// What a repair pass had to change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Tasks that had no worker
    pub rows_filled: usize,
    /// Tasks that had more than one worker
    pub rows_deduplicated: usize,
    /// Tasks moved off an overloaded worker
    pub tasks_moved: usize,
    /// Chromosomes still above capacity after repair
    pub over_capacity: usize,
}

impl RepairReport {
    pub fn merge(&mut self, other: RepairReport) {
        self.rows_filled += other.rows_filled;
        self.rows_deduplicated += other.rows_deduplicated;
        self.tasks_moved += other.tasks_moved;
        self.over_capacity += other.over_capacity;
    }
}

/// Make every task row hold exactly one worker.
pub fn repair_rows<R: Rng + ?Sized>(chromosome: &mut Chromosome, rng: &mut R) -> RepairReport {
    let mut report = RepairReport::default();
    let workers = chromosome.num_workers();

    for task in 0..chromosome.num_tasks() {
        let held = chromosome.assigned_workers(task);
        match held.len() {
            0 => {
                chromosome.assign(task, rng.gen_range(0..workers));
                report.rows_filled += 1;
            }
            1 => {}
            _ => {
                if let Some(&keep) = held.choose(rng) {
                    chromosome.assign(task, keep);
                    report.rows_deduplicated += 1;
                }
            }
        }
    }

    report
}

/// Move tasks off workers above `calls_max`. Expects one-hot rows.
pub fn repair_capacity<R: Rng + ?Sized>(
    chromosome: &mut Chromosome,
    calls_max: usize,
    rng: &mut R,
) -> RepairReport {
    let mut report = RepairReport::default();
    let workers = chromosome.num_workers();

    for k in 0..workers {
        let loads = chromosome.worker_loads();
        if loads[k] <= calls_max {
            continue;
        }
        let mut overage = loads[k] - calls_max;

        for w in 0..workers {
            if overage == 0 {
                break;
            }
            if w == k || loads[w] >= calls_max {
                continue;
            }

            let count = overage.min(calls_max - loads[w]);
            let held = chromosome.tasks_of(k);
            let moving: Vec<usize> = held.choose_multiple(rng, count).cloned().collect();
            for &task in &moving {
                chromosome.transfer(task, k, w);
            }

            report.tasks_moved += moving.len();
            overage -= moving.len();
        }
    }

    if !chromosome.respects_capacity(calls_max) {
        report.over_capacity = 1;
    }

    report
}

/// Row repair followed by capacity repair.
pub fn repair<R: Rng + ?Sized>(
    chromosome: &mut Chromosome,
    calls_max: usize,
    rng: &mut R,
) -> RepairReport {
    let mut report = repair_rows(chromosome, rng);
    report.merge(repair_capacity(chromosome, calls_max, rng));
    report
}

/// Repair every chromosome in place and log any capacity violation left over.
pub fn repair_population<R: Rng + ?Sized>(
    population: &mut [Chromosome],
    calls_max: usize,
    rng: &mut R,
) -> RepairReport {
    let mut total = RepairReport::default();
    for chromosome in population.iter_mut() {
        total.merge(repair(chromosome, calls_max, rng));
    }

    if total.over_capacity > 0 {
        log::warn!(
            "{} of {} chromosomes still exceed calls_max = {} after repair",
            total.over_capacity,
            population.len(),
            calls_max
        );
    }

    total
}
