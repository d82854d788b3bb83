//! Heuristics module for the assignment problem.
//!
//! The genetic algorithm and its operators, plus the greedy construction used as a baseline.

pub mod construction;
pub mod crossover;
pub mod genetic;
pub mod mutation;
pub mod population;
pub mod repair;
pub mod selection;

pub use construction::*;
pub use crossover::{crossover, recombine, CrossoverType};
pub use genetic::*;
pub use mutation::{mutate, MutationType};
pub use population::{evaluate, generate_population, Population};
pub use repair::{repair, repair_population, RepairReport};
pub use selection::{select, selection_probabilities, Selection, SelectionType};
