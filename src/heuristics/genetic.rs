//! Genetic Algorithm for the worker-task assignment problem.
//!
//! Each generation runs selection, one-point crossover, mutation and feasibility repair
//! over the whole population:
//! - Proportional, shifted-proportional, rank-linear and rank-nonlinear selection
//! - Crossover by task rows, by worker columns or over the flattened matrix
//! - Optional elitism (cheapest chromosomes survive unchanged)
//! - Row and capacity repair after every recombination
//!
//! The run stops after a fixed number of generations; the best assignment seen so far is
//! tracked as a running minimum.

use crate::error::{GaError, GaResult};
use crate::heuristics::crossover::{crossover, CrossoverType};
use crate::heuristics::mutation::{mutate, MutationType};
use crate::heuristics::population::{evaluate, generate_population, summarize, Population};
use crate::heuristics::repair::{repair_population, RepairReport};
use crate::heuristics::selection::{select, validate_q, SelectionType};
use crate::instance::AssignmentInstance;
use crate::solution::{Chromosome, Solution};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Genetic Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub max_generations: usize,
    /// Mutation operator
    pub mutation_type: MutationType,
    /// Per-task mutation probability
    pub mutation_prob: f64,
    /// Selection method
    pub selection_type: SelectionType,
    /// Shape parameter of rank-nonlinear selection
    pub q: f64,
    /// Carry the cheapest chromosomes over unchanged
    pub elitism: bool,
    /// Elite count (used when `elitism` is set)
    pub elite_count: usize,
    /// Crossover operator
    pub crossover_type: CrossoverType,
    /// Random seed
    pub seed: u64,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 100,
            max_generations: 200,
            mutation_type: MutationType::Reassign,
            mutation_prob: 0.002,
            selection_type: SelectionType::RankLinear,
            q: 0.999,
            elitism: false,
            elite_count: 5,
            crossover_type: CrossoverType::ByTask,
            seed: 42,
        }
    }
}

impl GAConfig {
    /// Reject parameter combinations before any generation runs.
    pub fn validate(&self) -> GaResult<()> {
        if self.population_size == 0 {
            return Err(GaError::configuration("population_size", "must be at least 1"));
        }
        if self.elitism && self.elite_count >= self.population_size {
            return Err(GaError::configuration(
                "elite_count",
                format!(
                    "{} elites leave no room for offspring in a population of {}",
                    self.elite_count, self.population_size
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            return Err(GaError::configuration(
                "mutation_prob",
                format!("must lie in [0, 1], got {}", self.mutation_prob),
            ));
        }
        if self.selection_type.uses_q() {
            validate_q(self.q)?;
        }
        Ok(())
    }

    /// Identifier of the parameter combination, shared by all replications
    pub fn cell_label(&self) -> String {
        format!(
            "{}_{}_{}_{}{}_{}",
            self.selection_type.label(),
            self.population_size,
            self.max_generations,
            self.crossover_type.label(),
            if self.elitism { "_elite" } else { "" },
            (self.q * 1000.0).round() as i64
        )
    }

    /// Run identifier encoding the parameters, used to name result files
    pub fn run_label(&self, rep: usize) -> String {
        format!("{}_{}", self.cell_label(), rep)
    }
}

/// Fitness statistics of one generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Cheapest chromosome of this generation
    pub min_fitness: f64,
    /// Cheapest chromosome seen so far
    pub best_fitness: f64,
    /// Average cost of this generation
    pub mean_fitness: f64,
}

/// Breed the next population from the current one.
///
/// Offspring occupy the first `N - k` slots and the `k` elites the last ones; only
/// offspring are mutated. Every chromosome is repaired before it is returned.
pub fn evolve<R: Rng + ?Sized>(
    instance: &AssignmentInstance,
    config: &GAConfig,
    population: &[Chromosome],
    fitness: &[f64],
    rng: &mut R,
) -> GaResult<(Population, RepairReport)> {
    let selection = select(
        fitness,
        config.selection_type,
        config.q,
        config.elitism,
        config.elite_count,
        rng,
    )?;

    let mut next = crossover(population, &selection, config.crossover_type, rng);

    let num_offspring = next.len().saturating_sub(selection.elites.len());
    mutate(&mut next[..num_offspring], config.mutation_type, config.mutation_prob, rng);

    let report = repair_population(&mut next, instance.calls_max, rng);
    Ok((next, report))
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm {
    config: GAConfig,
    instance: AssignmentInstance,
    population: Population,
    fitness: Vec<f64>,
    best_individual: Option<(Chromosome, f64)>,
    history: Vec<GenerationRecord>,
    rng: ChaCha8Rng,
    generation: usize,
    repair_totals: RepairReport,
}

impl GeneticAlgorithm {
    /// Validate the configuration and the instance capacity, then build the solver.
    pub fn new(instance: AssignmentInstance, config: GAConfig) -> GaResult<Self> {
        config.validate()?;
        instance.check_capacity()?;

        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(GeneticAlgorithm {
            config,
            instance,
            population: Vec::new(),
            fitness: Vec::new(),
            best_individual: None,
            history: Vec::new(),
            rng,
            generation: 0,
            repair_totals: RepairReport::default(),
        })
    }

    /// Random population, repaired so that the incumbent is always feasible
    fn initialize_population(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.generation = 0;
        self.history.clear();
        self.best_individual = None;

        self.population = generate_population(
            self.config.population_size,
            self.instance.num_tasks(),
            self.instance.num_workers(),
            &mut self.rng,
        );
        self.repair_totals =
            repair_population(&mut self.population, self.instance.calls_max, &mut self.rng);
        self.fitness = evaluate(&self.instance, &self.population);
        self.record();

        log::info!(
            "[GA] Initialized population of {} ({} tasks x {} workers), best cost {:.2}",
            self.population.len(),
            self.instance.num_tasks(),
            self.instance.num_workers(),
            self.best_fitness().unwrap_or(f64::INFINITY)
        );
    }

    /// Update the incumbent and append this generation's statistics
    fn record(&mut self) {
        let Some(summary) = summarize(&self.fitness) else {
            return;
        };

        let improved = self
            .best_individual
            .as_ref()
            .map_or(true, |(_, best)| summary.min < *best);
        if improved {
            self.best_individual = Some((self.population[summary.argmin].clone(), summary.min));
        }

        let best_fitness = self.best_fitness().unwrap_or(summary.min);
        self.history.push(GenerationRecord {
            generation: self.generation,
            min_fitness: summary.min,
            best_fitness,
            mean_fitness: summary.mean,
        });
    }

    /// Create new generation
    fn step(&mut self) -> GaResult<()> {
        let (next, report) = evolve(
            &self.instance,
            &self.config,
            &self.population,
            &self.fitness,
            &mut self.rng,
        )?;

        self.population = next;
        self.fitness = evaluate(&self.instance, &self.population);
        self.generation += 1;
        self.repair_totals.merge(report);
        self.record();

        if let Some(last) = self.history.last() {
            log::debug!(
                "[GA] Gen {}  Min {:.2}  Best {:.2}  Mean {:.2}  Moved {}  Diversity {:.2}",
                last.generation,
                last.min_fitness,
                last.best_fitness,
                last.mean_fitness,
                report.tasks_moved,
                self.population_diversity()
            );
        }
        Ok(())
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> GaResult<Solution> {
        let start = std::time::Instant::now();

        self.initialize_population();

        while self.generation < self.config.max_generations {
            self.step()?;
        }

        let mut solution = self
            .best_solution()
            .ok_or_else(|| {
                GaError::configuration("population_size", "no chromosome was evaluated")
            })?;
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.generation);

        log::info!(
            "[GA] Finished {} generations in {:.2}s, best cost {:.2} (feasible: {})",
            self.generation,
            solution.computation_time,
            solution.cost,
            solution.feasible
        );

        Ok(solution)
    }

    /// Get current best solution
    pub fn best_solution(&self) -> Option<Solution> {
        self.best_individual.as_ref().map(|(chromosome, _)| {
            Solution::from_chromosome(&self.instance, chromosome, "GeneticAlgorithm")
        })
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.best_individual.as_ref().map(|(_, f)| *f)
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    pub fn instance(&self) -> &AssignmentInstance {
        &self.instance
    }

    /// Repair work accumulated over the run
    pub fn repair_totals(&self) -> RepairReport {
        self.repair_totals
    }

    /// Get population diversity (average number of tasks assigned differently)
    pub fn population_diversity(&self) -> f64 {
        if self.population.len() < 2 {
            return 0.0;
        }

        let sample: Vec<Option<Vec<usize>>> = self
            .population
            .iter()
            .take(20)
            .map(|c| c.assignment())
            .collect();

        let mut total_diff = 0.0;
        let mut count = 0;

        for i in 0..sample.len() {
            for j in i + 1..sample.len() {
                if let (Some(a), Some(b)) = (&sample[i], &sample[j]) {
                    total_diff += a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() as f64;
                    count += 1;
                }
            }
        }

        if count > 0 {
            total_diff / count as f64
        } else {
            0.0
        }
    }

    /// Write the per-generation statistics as CSV
    pub fn export_history_csv<P: AsRef<Path>>(&self, path: P) -> GaResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.history {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
