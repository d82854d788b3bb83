use crate::instance::AssignmentInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &AssignmentInstance) -> Solution;
    fn name(&self) -> &str;
}

/// Capacity-aware regret greedy
///
/// Tasks are placed in order of decreasing regret (second-cheapest minus cheapest
/// worker cost), each on its cheapest worker that still has room.
pub struct GreedyAssignment;

impl GreedyAssignment {
    pub fn new() -> Self {
        GreedyAssignment
    }

    fn regret(instance: &AssignmentInstance, task: usize) -> f64 {
        let mut costs: Vec<f64> = instance.task_time.row(task).to_vec();
        costs.sort_by_key(|&c| OrderedFloat(c));
        match costs.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    fn cheapest_worker(instance: &AssignmentInstance, task: usize, loads: &[usize]) -> usize {
        let open = (0..instance.num_workers())
            .filter(|&w| loads[w] < instance.calls_max)
            .min_by_key(|&w| OrderedFloat(instance.cost(task, w)));

        // No room left anywhere: fall back to the cheapest worker and let the
        // solution report itself infeasible.
        open.unwrap_or_else(|| {
            (0..instance.num_workers())
                .min_by_key(|&w| OrderedFloat(instance.cost(task, w)))
                .unwrap_or(0)
        })
    }
}

impl Default for GreedyAssignment {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for GreedyAssignment {
    fn construct(&self, instance: &AssignmentInstance) -> Solution {
        let start = std::time::Instant::now();

        let mut order: Vec<usize> = (0..instance.num_tasks()).collect();
        order.sort_by_key(|&t| Reverse(OrderedFloat(Self::regret(instance, t))));

        let mut loads = vec![0usize; instance.num_workers()];
        let mut assignment = vec![0usize; instance.num_tasks()];

        for task in order {
            let worker = Self::cheapest_worker(instance, task, &loads);
            assignment[task] = worker;
            loads[worker] += 1;
        }

        let mut solution = Solution::from_assignment(instance, assignment, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "Greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greedy_finds_optimum_on_small_instance() {
        let instance = AssignmentInstance::from_rows(
            "small",
            vec![vec![1.0, 5.0], vec![5.0, 1.0], vec![2.0, 2.0]],
            2,
        )
        .unwrap();

        let solution = GreedyAssignment::new().construct(&instance);
        assert!(solution.feasible);
        assert_eq!(solution.cost, 4.0);
        assert_eq!(&solution.assignment[..2], &[0, 1]);
    }

    #[test]
    fn test_greedy_respects_capacity() {
        // every task prefers worker 0, which can only take one
        let instance = AssignmentInstance::from_rows(
            "crowded",
            vec![vec![1.0, 9.0, 3.0], vec![1.0, 2.0, 8.0], vec![1.0, 4.0, 4.0]],
            1,
        )
        .unwrap();

        let solution = GreedyAssignment::new().construct(&instance);
        assert!(solution.feasible);
        assert_eq!(solution.worker_loads, vec![1, 1, 1]);
        // regrets 2, 1, 3: task 2 takes worker 0, then task 0 and task 1 fill the rest
        assert_eq!(solution.assignment, vec![2, 1, 0]);
        assert_eq!(solution.cost, 6.0);
    }

    #[test]
    fn test_greedy_on_under_capacity_instance_is_infeasible() {
        let instance = AssignmentInstance::random("under", 5, 2, 10, 2, 1);
        let solution = GreedyAssignment::new().construct(&instance);
        assert!(!solution.feasible);
        assert_eq!(solution.assignment.len(), 5);
    }
}
