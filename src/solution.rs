//! Chromosome and solution representations for the assignment problem.
//!
//! A [`Chromosome`] is the binary (tasks x workers) matrix manipulated by the genetic
//! operators; a [`Solution`] is the compact, serializable result reported to callers.

use crate::instance::AssignmentInstance;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// Binary assignment matrix; row `j` marks the worker(s) holding task `j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    genes: Array2<u8>,
}

impl Chromosome {
    /// An all-zero matrix (no task assigned)
    pub fn zeros(tasks: usize, workers: usize) -> Self {
        Chromosome {
            genes: Array2::zeros((tasks, workers)),
        }
    }

    pub fn from_genes(genes: Array2<u8>) -> Self {
        Chromosome { genes }
    }

    /// Build a one-hot chromosome from a worker index per task.
    pub fn from_assignment(assignment: &[usize], workers: usize) -> Self {
        let mut chromosome = Self::zeros(assignment.len(), workers);
        for (task, &worker) in assignment.iter().enumerate() {
            chromosome.genes[[task, worker]] = 1;
        }
        chromosome
    }

    pub fn genes(&self) -> &Array2<u8> {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut Array2<u8> {
        &mut self.genes
    }

    #[inline]
    pub fn num_tasks(&self) -> usize {
        self.genes.nrows()
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.genes.ncols()
    }

    #[inline]
    pub fn is_assigned(&self, task: usize, worker: usize) -> bool {
        self.genes[[task, worker]] == 1
    }

    /// Workers currently holding `task`
    pub fn assigned_workers(&self, task: usize) -> Vec<usize> {
        self.genes
            .row(task)
            .iter()
            .enumerate()
            .filter(|&(_, &g)| g == 1)
            .map(|(w, _)| w)
            .collect()
    }

    /// Tasks currently held by `worker`
    pub fn tasks_of(&self, worker: usize) -> Vec<usize> {
        self.genes
            .column(worker)
            .iter()
            .enumerate()
            .filter(|&(_, &g)| g == 1)
            .map(|(t, _)| t)
            .collect()
    }

    /// Give `task` to `worker` alone, clearing any other holder.
    pub fn assign(&mut self, task: usize, worker: usize) {
        self.genes.row_mut(task).fill(0);
        self.genes[[task, worker]] = 1;
    }

    /// Move `task` from worker `from` to worker `to`.
    pub fn transfer(&mut self, task: usize, from: usize, to: usize) {
        self.genes[[task, from]] = 0;
        self.genes[[task, to]] = 1;
    }

    /// Number of tasks held by each worker (column sums)
    pub fn worker_loads(&self) -> Vec<usize> {
        self.genes
            .columns()
            .into_iter()
            .map(|col| col.iter().filter(|&&g| g == 1).count())
            .collect()
    }

    /// Every task held by exactly one worker
    pub fn is_one_hot(&self) -> bool {
        self.genes
            .rows()
            .into_iter()
            .all(|row| row.iter().filter(|&&g| g == 1).count() == 1)
    }

    pub fn respects_capacity(&self, calls_max: usize) -> bool {
        self.worker_loads().iter().all(|&load| load <= calls_max)
    }

    pub fn is_feasible(&self, calls_max: usize) -> bool {
        self.is_one_hot() && self.respects_capacity(calls_max)
    }

    /// Worker per task, or `None` when some row is not one-hot.
    pub fn assignment(&self) -> Option<Vec<usize>> {
        self.genes
            .rows()
            .into_iter()
            .map(|row| {
                let mut held = row.iter().enumerate().filter(|&(_, &g)| g == 1).map(|(w, _)| w);
                match (held.next(), held.next()) {
                    (Some(worker), None) => Some(worker),
                    _ => None,
                }
            })
            .collect()
    }

    /// Total task-time over the assigned cells.
    pub fn cost(&self, instance: &AssignmentInstance) -> f64 {
        Zip::from(&self.genes)
            .and(&instance.task_time)
            .fold(0.0, |acc, &g, &c| acc + g as f64 * c)
    }
}

/// Represents a solution to the assignment problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Worker index assigned to each task
    pub assignment: Vec<usize>,
    /// Total assignment cost
    pub cost: f64,
    /// Number of tasks per worker
    pub worker_loads: Vec<usize>,
    /// Whether the solution is feasible
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            assignment: Vec::new(),
            cost: f64::INFINITY,
            worker_loads: Vec::new(),
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from an explicit assignment
    pub fn from_assignment(
        instance: &AssignmentInstance,
        assignment: Vec<usize>,
        algorithm: &str,
    ) -> Self {
        let mut solution = Solution {
            assignment,
            algorithm: algorithm.to_string(),
            ..Self::new()
        };
        solution.validate(instance);
        solution
    }

    /// Create a solution from a chromosome. A chromosome that is not one-hot
    /// yields an empty, infeasible solution carrying its matrix cost.
    pub fn from_chromosome(
        instance: &AssignmentInstance,
        chromosome: &Chromosome,
        algorithm: &str,
    ) -> Self {
        match chromosome.assignment() {
            Some(assignment) => Self::from_assignment(instance, assignment, algorithm),
            None => Solution {
                cost: chromosome.cost(instance),
                worker_loads: chromosome.worker_loads(),
                algorithm: algorithm.to_string(),
                ..Self::new()
            },
        }
    }

    /// Recompute cost, loads and feasibility from the assignment
    pub fn validate(&mut self, instance: &AssignmentInstance) {
        let mut loads = vec![0usize; instance.num_workers()];
        let mut in_range = self.assignment.len() == instance.num_tasks();
        for &worker in &self.assignment {
            match loads.get_mut(worker) {
                Some(load) => *load += 1,
                None => in_range = false,
            }
        }

        self.feasible = in_range && loads.iter().all(|&l| l <= instance.calls_max);
        self.cost = if in_range {
            instance.assignment_cost(&self.assignment)
        } else {
            f64::INFINITY
        };
        self.worker_loads = loads;
    }

    /// Convert back into the matrix representation
    pub fn to_chromosome(&self, workers: usize) -> Chromosome {
        Chromosome::from_assignment(&self.assignment, workers)
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Generations: {}", iter)?;
        }
        writeln!(f, "  Worker loads: {:?}", self.worker_loads)?;
        writeln!(f, "  Assignment: {:?}", self.assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> AssignmentInstance {
        AssignmentInstance::from_rows(
            "small",
            vec![vec![1.0, 5.0], vec![5.0, 1.0], vec![2.0, 2.0]],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.assignment.is_empty());
        assert!(!sol.feasible);
        assert_eq!(sol.cost, f64::INFINITY);
    }

    #[test]
    fn test_chromosome_cost_matches_assignment_cost() {
        let instance = instance();
        let chromosome = Chromosome::from_assignment(&[0, 1, 1], 2);
        assert_eq!(chromosome.cost(&instance), 4.0);
        assert_eq!(chromosome.worker_loads(), vec![1, 2]);
        assert!(chromosome.is_feasible(2));
        assert!(!chromosome.is_feasible(1));
    }

    #[test]
    fn test_multi_assigned_row_is_not_one_hot() {
        let mut chromosome = Chromosome::from_assignment(&[0, 1, 0], 2);
        chromosome.genes_mut()[[2, 1]] = 1;
        assert!(!chromosome.is_one_hot());
        assert_eq!(chromosome.assigned_workers(2), vec![0, 1]);
        assert!(chromosome.assignment().is_none());

        chromosome.assign(2, 1);
        assert!(chromosome.is_one_hot());
        assert_eq!(chromosome.assignment(), Some(vec![0, 1, 1]));
    }

    #[test]
    fn test_overloaded_solution_is_infeasible() {
        let instance = instance();
        let sol = Solution::from_assignment(&instance, vec![0, 0, 0], "manual");
        assert!(!sol.feasible);
        assert_eq!(sol.worker_loads, vec![3, 0]);
        assert_eq!(sol.cost, 8.0);
    }

    #[test]
    fn test_out_of_range_worker() {
        let instance = instance();
        let sol = Solution::from_assignment(&instance, vec![0, 1, 7], "manual");
        assert!(!sol.feasible);
        assert_eq!(sol.cost, f64::INFINITY);
    }
}
