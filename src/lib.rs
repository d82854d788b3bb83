//! Assignment GA Library
//!
//! A genetic algorithm for the capacitated worker-task assignment problem: every task
//! goes to exactly one worker, no worker takes more than `calls_max` tasks, and the
//! summed task times are minimized.
//!
//! # Features
//!
//! - Binary task x worker chromosomes evaluated against the cost matrix
//! - Proportional, shifted-proportional, rank-linear and rank-nonlinear selection
//! - One-point crossover by task, by worker or over the flattened matrix
//! - Optional elitism and reassign mutation
//! - Row and capacity repair keeping every chromosome feasible
//! - Parameter sweeps with seeded replications and summary statistics
//!
//! # Example
//!
//! ```no_run
//! use assign_ga::instance::AssignmentInstance;
//! use assign_ga::heuristics::genetic::{GAConfig, GeneticAlgorithm};
//! use assign_ga::heuristics::selection::SelectionType;
//!
//! let instance = AssignmentInstance::from_file("task_time.csv", b',', 5).unwrap();
//!
//! let config = GAConfig {
//!     selection_type: SelectionType::RankNonlinear,
//!     q: 0.97,
//!     elitism: true,
//!     ..Default::default()
//! };
//! let mut ga = GeneticAlgorithm::new(instance, config).unwrap();
//! let solution = ga.run().unwrap();
//!
//! println!("Solution cost: {:.2}", solution.cost);
//! ```

pub mod benchmark;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use error::{GaError, GaResult};
pub use instance::AssignmentInstance;
pub use solution::{Chromosome, Solution};
