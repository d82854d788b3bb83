//! Module for loading and representing worker-task assignment instances.
//!
//! An instance is a task-time matrix (rows = tasks, columns = workers) read from a
//! delimiter-separated text file, together with the per-worker capacity `calls_max`.

use crate::error::{GaError, GaResult};
use ndarray::Array2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Convert a delimiter given as a character into the single byte the CSV reader expects.
pub fn delimiter_byte(delimiter: char) -> GaResult<u8> {
    match u8::try_from(delimiter) {
        Ok(byte) if byte.is_ascii() => Ok(byte),
        _ => Err(GaError::configuration(
            "delimiter",
            format!("'{}' is not a single ASCII character", delimiter),
        )),
    }
}

/// Represents a complete assignment instance
#[derive(Debug, Clone)]
pub struct AssignmentInstance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Cost of task `j` when performed by worker `k`, shape (tasks, workers)
    pub task_time: Array2<f64>,
    /// Maximum number of tasks any single worker may take
    pub calls_max: usize,
}

impl AssignmentInstance {
    /// Build an instance from an existing matrix, checking that every cost is a
    /// finite non-negative number.
    pub fn new(name: &str, task_time: Array2<f64>, calls_max: usize) -> GaResult<Self> {
        let (tasks, workers) = task_time.dim();
        if tasks == 0 || workers == 0 {
            return Err(GaError::InvalidInstance(format!(
                "task-time matrix must be non-empty, got {}x{}",
                tasks, workers
            )));
        }

        if let Some(((task, worker), value)) = task_time
            .indexed_iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(GaError::InvalidInstance(format!(
                "cost of task {} on worker {} is {} (costs must be finite and non-negative)",
                task, worker, value
            )));
        }

        Ok(AssignmentInstance {
            name: name.to_string(),
            task_time,
            calls_max,
        })
    }

    /// Build an instance from row vectors (one per task).
    pub fn from_rows(name: &str, rows: Vec<Vec<f64>>, calls_max: usize) -> GaResult<Self> {
        let tasks = rows.len();
        let workers = rows.first().map(|r| r.len()).unwrap_or(0);

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != workers) {
            return Err(GaError::InvalidInstance(format!(
                "row {} has {} columns, expected {}",
                i + 1,
                row.len(),
                workers
            )));
        }

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let task_time = Array2::from_shape_vec((tasks, workers), flat)
            .map_err(|e| GaError::InvalidInstance(e.to_string()))?;

        Self::new(name, task_time, calls_max)
    }

    /// Parse a task-time matrix from a delimiter-separated file without header.
    ///
    /// Empty fields are ignored so that whitespace-aligned files (several spaces
    /// between columns) load with `delimiter = b' '`.
    pub fn from_file<P: AsRef<Path>>(path: P, delimiter: u8, calls_max: usize) -> GaResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let row = record
                .iter()
                .filter(|field| !field.is_empty())
                .enumerate()
                .map(|(j, field)| {
                    field.parse::<f64>().map_err(|_| {
                        GaError::InvalidInstance(format!(
                            "row {}, column {}: '{}' is not a number",
                            i + 1,
                            j + 1,
                            field
                        ))
                    })
                })
                .collect::<GaResult<Vec<f64>>>()?;

            if !row.is_empty() {
                rows.push(row);
            }
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "instance".to_string());

        let instance = Self::from_rows(&name, rows, calls_max)?;
        log::info!(
            "Loaded instance {} ({} tasks x {} workers, calls_max {})",
            instance.name,
            instance.num_tasks(),
            instance.num_workers(),
            instance.calls_max
        );
        Ok(instance)
    }

    /// Write the task-time matrix back to a delimiter-separated file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P, delimiter: u8) -> GaResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .from_path(path)?;

        for row in self.task_time.rows() {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate a random instance with integer costs in `1..=max_cost`.
    pub fn random(
        name: &str,
        tasks: usize,
        workers: usize,
        max_cost: u32,
        calls_max: usize,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max_cost = max_cost.max(1);
        let task_time =
            Array2::from_shape_fn((tasks, workers), |_| rng.gen_range(1..=max_cost) as f64);

        AssignmentInstance {
            name: name.to_string(),
            task_time,
            calls_max,
        }
    }

    #[inline]
    pub fn num_tasks(&self) -> usize {
        self.task_time.nrows()
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.task_time.ncols()
    }

    #[inline]
    pub fn cost(&self, task: usize, worker: usize) -> f64 {
        self.task_time[[task, worker]]
    }

    /// Total number of tasks the workforce can absorb
    pub fn total_capacity(&self) -> usize {
        self.num_workers().saturating_mul(self.calls_max)
    }

    /// Reject instances whose workers cannot absorb every task.
    pub fn check_capacity(&self) -> GaResult<()> {
        if self.num_tasks() > self.total_capacity() {
            return Err(GaError::CapacityInfeasible {
                tasks: self.num_tasks(),
                workers: self.num_workers(),
                calls_max: self.calls_max,
            });
        }
        Ok(())
    }

    /// Cost of an explicit assignment (worker index per task)
    pub fn assignment_cost(&self, assignment: &[usize]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .map(|(task, &worker)| self.cost(task, worker))
            .sum()
    }

    /// Sum of the cheapest worker per task, ignoring capacity
    pub fn lower_bound(&self) -> f64 {
        self.task_time
            .rows()
            .into_iter()
            .map(|row| row.iter().cloned().fold(f64::INFINITY, f64::min))
            .sum()
    }

    /// Get instance statistics
    pub fn statistics(&self) -> InstanceStatistics {
        let costs: Vec<f64> = self.task_time.iter().cloned().collect();
        let min_cost = costs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_cost = costs.iter().cloned().fold(0.0, f64::max);
        let avg_cost = costs.iter().sum::<f64>() / costs.len().max(1) as f64;

        InstanceStatistics {
            name: self.name.clone(),
            num_tasks: self.num_tasks(),
            num_workers: self.num_workers(),
            calls_max: self.calls_max,
            total_capacity: self.total_capacity(),
            slack: self.total_capacity() as i64 - self.num_tasks() as i64,
            min_cost,
            avg_cost,
            max_cost,
            lower_bound: self.lower_bound(),
        }
    }
}

/// Instance statistics
#[derive(Debug, Clone)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_tasks: usize,
    pub num_workers: usize,
    pub calls_max: usize,
    pub total_capacity: usize,
    pub slack: i64,
    pub min_cost: f64,
    pub avg_cost: f64,
    pub max_cost: f64,
    pub lower_bound: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Tasks: {}", self.num_tasks)?;
        writeln!(f, "  Workers: {}", self.num_workers)?;
        writeln!(f, "  Calls max per worker: {}", self.calls_max)?;
        writeln!(f, "  Total capacity: {} (slack {})", self.total_capacity, self.slack)?;
        writeln!(
            f,
            "  Cost range: {:.2} .. {:.2} (avg {:.2})",
            self.min_cost, self.max_cost, self.avg_cost
        )?;
        writeln!(f, "  Lower bound (capacity ignored): {:.2}", self.lower_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_rows() -> Vec<Vec<f64>> {
        vec![vec![1.0, 5.0], vec![5.0, 1.0], vec![2.0, 2.0]]
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(',').unwrap(), b',');
        assert_eq!(delimiter_byte('\t').unwrap(), b'\t');
        // U+012C would truncate to ','
        for bad in ['\u{12C}', 'é', '→'] {
            assert!(matches!(
                delimiter_byte(bad),
                Err(GaError::Configuration { parameter: "delimiter", .. })
            ));
        }
    }

    #[test]
    fn test_from_rows() {
        let instance = AssignmentInstance::from_rows("small", small_rows(), 2).unwrap();
        assert_eq!(instance.num_tasks(), 3);
        assert_eq!(instance.num_workers(), 2);
        assert_eq!(instance.cost(1, 0), 5.0);
        assert_eq!(instance.lower_bound(), 4.0);
        assert!(instance.check_capacity().is_ok());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        let err = AssignmentInstance::from_rows("bad", rows, 2).unwrap_err();
        assert!(matches!(err, GaError::InvalidInstance(_)));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let rows = vec![vec![1.0, -2.0]];
        let err = AssignmentInstance::from_rows("bad", rows, 2).unwrap_err();
        assert!(matches!(err, GaError::InvalidInstance(_)));
    }

    #[test]
    fn test_under_capacity_detected() {
        let instance = AssignmentInstance::random("under", 5, 2, 10, 2, 7);
        match instance.check_capacity() {
            Err(GaError::CapacityInfeasible { tasks, workers, calls_max }) => {
                assert_eq!((tasks, workers, calls_max), (5, 2, 2));
            }
            other => panic!("expected CapacityInfeasible, got {:?}", other),
        }
    }

    #[test]
    fn test_random_instance_is_seeded() {
        let a = AssignmentInstance::random("a", 6, 3, 20, 2, 11);
        let b = AssignmentInstance::random("b", 6, 3, 20, 2, 11);
        assert_eq!(a.task_time, b.task_time);
        assert!(a.task_time.iter().all(|&c| (1.0..=20.0).contains(&c)));
    }

    #[test]
    fn test_file_round_trip_with_spaces() {
        let path = std::env::temp_dir().join("assign_ga_instance_spaces.txt");
        std::fs::write(&path, "1  5\n5  1\n\n2  2\n").unwrap();

        let instance = AssignmentInstance::from_file(&path, b' ', 2).unwrap();
        assert_eq!(instance.num_tasks(), 3);
        assert_eq!(instance.assignment_cost(&[0, 1, 0]), 4.0);

        let out = std::env::temp_dir().join("assign_ga_instance_out.csv");
        instance.to_file(&out, b',').unwrap();
        let reloaded = AssignmentInstance::from_file(&out, b',', 2).unwrap();
        assert_eq!(reloaded.task_time, instance.task_time);

        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(out);
    }

    #[test]
    fn test_non_numeric_field_rejected() {
        let path = std::env::temp_dir().join("assign_ga_instance_bad.csv");
        std::fs::write(&path, "1,2\n3,abc\n").unwrap();
        let err = AssignmentInstance::from_file(&path, b',', 2).unwrap_err();
        assert!(matches!(err, GaError::InvalidInstance(_)));
        let _ = std::fs::remove_file(path);
    }
}
