//! Benchmarking and experimentation module for the assignment GA.
//!
//! An experiment sweeps a grid of GA parameters (selection scheme and its `q` values,
//! population size, elitism, crossover axis) with several seeded replications per cell,
//! writes one history file per run and aggregates the final costs per cell.

use crate::error::{GaError, GaResult};
use crate::heuristics::construction::{ConstructionHeuristic, GreedyAssignment};
use crate::heuristics::crossover::CrossoverType;
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use crate::heuristics::mutation::MutationType;
use crate::heuristics::selection::SelectionType;
use crate::instance::AssignmentInstance;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Seed distance between consecutive grid cells; also the replication limit per cell
pub const SEED_STRIDE: u64 = 1000;

/// A selection scheme and the `q` values to try with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSweep {
    pub selection_type: SelectionType,
    /// Only meaningful for rank-nonlinear selection; other schemes usually list `[1.0]`
    pub q_values: Vec<f64>,
}

/// Experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub population_sizes: Vec<usize>,
    pub selections: Vec<SelectionSweep>,
    pub elitism: Vec<bool>,
    pub crossover_types: Vec<CrossoverType>,
    /// Number of runs per parameter combination
    pub replications: usize,
    pub max_generations: usize,
    pub mutation_type: MutationType,
    pub mutation_prob: f64,
    pub elite_count: usize,
    /// Replication `r` of cell `c` runs with seed `base_seed + SEED_STRIDE * c + r`
    pub base_seed: u64,
    /// Run the replications of a cell on the rayon pool
    pub parallel: bool,
    /// Write one history file per run
    pub write_histories: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            population_sizes: vec![200],
            selections: vec![
                SelectionSweep {
                    selection_type: SelectionType::Proportional,
                    q_values: vec![1.0],
                },
                SelectionSweep {
                    selection_type: SelectionType::RankLinear,
                    q_values: vec![1.0],
                },
                SelectionSweep {
                    selection_type: SelectionType::RankNonlinear,
                    q_values: vec![0.9, 0.95, 0.97, 0.999],
                },
            ],
            elitism: vec![false],
            crossover_types: vec![CrossoverType::ByTask],
            replications: 5,
            max_generations: 200,
            mutation_type: MutationType::Reassign,
            mutation_prob: 0.002,
            elite_count: 5,
            base_seed: 0,
            parallel: true,
            write_histories: true,
            output_dir: "results".to_string(),
        }
    }
}

impl ExperimentConfig {
    /// Load an experiment grid from JSON; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> GaResult<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Expand the grid, one GA configuration per cell (seed left at 0).
    pub fn cells(&self) -> Vec<GAConfig> {
        let mut cells = Vec::new();

        for sweep in &self.selections {
            for &population_size in &self.population_sizes {
                for &elitism in &self.elitism {
                    for &q in &sweep.q_values {
                        for &crossover_type in &self.crossover_types {
                            cells.push(GAConfig {
                                population_size,
                                max_generations: self.max_generations,
                                mutation_type: self.mutation_type,
                                mutation_prob: self.mutation_prob,
                                selection_type: sweep.selection_type,
                                q,
                                elitism,
                                elite_count: self.elite_count,
                                crossover_type,
                                seed: 0,
                            });
                        }
                    }
                }
            }
        }

        cells
    }

    /// Validate every cell up front so no run starts with a bad grid.
    pub fn validate(&self) -> GaResult<()> {
        if self.replications == 0 {
            return Err(GaError::configuration("replications", "must be at least 1"));
        }
        if self.replications as u64 > SEED_STRIDE {
            return Err(GaError::configuration(
                "replications",
                format!("at most {} per cell, got {}", SEED_STRIDE, self.replications),
            ));
        }
        let cells = self.cells();
        if cells.is_empty() {
            return Err(GaError::configuration("selections", "the parameter grid is empty"));
        }

        // Cells sharing a label would share history files.
        let mut labels = HashSet::new();
        for cell in &cells {
            cell.validate()?;
            let label = cell.cell_label();
            if !labels.insert(label.clone()) {
                return Err(GaError::configuration(
                    "grid",
                    format!("several parameter combinations are labelled '{}'", label),
                ));
            }
        }
        Ok(())
    }

    /// Seed of replication `rep` in cell `cell_index`; wraps around `u64::MAX`.
    pub fn seed_for(&self, cell_index: usize, rep: usize) -> u64 {
        self.base_seed
            .wrapping_add(SEED_STRIDE.wrapping_mul(cell_index as u64))
            .wrapping_add(rep as u64)
    }
}

/// Result of one GA run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Position of the parameter combination in the grid
    pub cell_index: usize,
    pub cell: String,
    pub selection: String,
    pub crossover: String,
    pub population_size: usize,
    pub generations: usize,
    pub elitism: bool,
    pub q: f64,
    pub rep: usize,
    pub seed: u64,
    pub best_cost: f64,
    pub feasible: bool,
    pub time: f64,
}

/// Aggregated statistics for one parameter combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellStatistics {
    pub cell: String,
    pub selection: String,
    pub crossover: String,
    pub population_size: usize,
    pub elitism: bool,
    pub q: f64,
    pub runs: usize,
    pub num_feasible: usize,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub avg_cost: f64,
    pub std_cost: f64,
    pub avg_time: f64,
    /// Average cost relative to the greedy baseline, in percent
    pub gap_to_greedy: Option<f64>,
}

/// Run one replication and, if `history_dir` is set, write its per-generation history.
pub fn run_replication(
    instance: &AssignmentInstance,
    cell: &GAConfig,
    cell_index: usize,
    rep: usize,
    seed: u64,
    history_dir: Option<&Path>,
) -> GaResult<RunResult> {
    let config = GAConfig {
        seed,
        ..cell.clone()
    };
    let label = config.run_label(rep);

    let mut ga = GeneticAlgorithm::new(instance.clone(), config)?;
    let solution = ga.run()?;

    if let Some(dir) = history_dir {
        ga.export_history_csv(dir.join(format!("{}.csv", label)))?;
    }

    Ok(RunResult {
        cell_index,
        cell: cell.cell_label(),
        selection: cell.selection_type.label().to_string(),
        crossover: cell.crossover_type.label().to_string(),
        population_size: cell.population_size,
        generations: cell.max_generations,
        elitism: cell.elitism,
        q: cell.q,
        rep,
        seed,
        best_cost: solution.cost,
        feasible: solution.feasible,
        time: solution.computation_time,
    })
}

/// Experiment engine
pub struct Experiment {
    config: ExperimentConfig,
    results: Vec<RunResult>,
    baseline: Option<Solution>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        Experiment {
            config,
            results: Vec::new(),
            baseline: None,
        }
    }

    /// Run every cell of the grid on `instance`.
    pub fn run(&mut self, instance: &AssignmentInstance) -> GaResult<()> {
        self.config.validate()?;
        instance.check_capacity()?;

        let history_dir: Option<PathBuf> = if self.config.write_histories {
            let dir = PathBuf::from(&self.config.output_dir);
            std::fs::create_dir_all(&dir)?;
            Some(dir)
        } else {
            None
        };

        self.baseline = Some(GreedyAssignment::new().construct(instance));

        let cells = self.config.cells();
        let reps = self.config.replications;
        log::info!(
            "Running experiment on {}: {} cells x {} replications",
            instance.name,
            cells.len(),
            reps
        );

        let progress = ProgressBar::new((cells.len() * reps) as u64);
        let template = "{bar:40} {pos}/{len} runs [{elapsed_precise}] {msg}";
        if let Ok(style) = ProgressStyle::with_template(template) {
            progress.set_style(style);
        }

        for (ci, cell) in cells.iter().enumerate() {
            progress.set_message(cell.cell_label());

            let run_one = |rep: usize| {
                let result = run_replication(
                    instance,
                    cell,
                    ci,
                    rep,
                    self.config.seed_for(ci, rep),
                    history_dir.as_deref(),
                );
                progress.inc(1);
                result
            };

            let outcomes: Vec<GaResult<RunResult>> = if self.config.parallel {
                (0..reps).into_par_iter().map(run_one).collect()
            } else {
                (0..reps).map(run_one).collect()
            };

            for outcome in outcomes {
                let result = outcome?;
                log::debug!("{} rep {}: best {:.2}", result.cell, result.rep, result.best_cost);
                self.results.push(result);
            }
        }

        progress.finish_with_message("done");
        Ok(())
    }

    /// Compute statistics for each cell, in grid order
    pub fn compute_statistics(&self) -> Vec<CellStatistics> {
        let mut groups: BTreeMap<usize, Vec<&RunResult>> = BTreeMap::new();
        for result in &self.results {
            groups.entry(result.cell_index).or_default().push(result);
        }

        let baseline_cost = self
            .baseline
            .as_ref()
            .filter(|b| b.feasible && b.cost > 0.0)
            .map(|b| b.cost);

        groups
            .into_values()
            .filter_map(|runs| {
                let first = *runs.first()?;
                let costs: Vec<f64> = runs
                    .iter()
                    .filter(|r| r.feasible)
                    .map(|r| r.best_cost)
                    .collect();
                let times: Vec<f64> = runs.iter().map(|r| r.time).collect();

                let (best_cost, worst_cost, avg_cost, std_cost) = if costs.is_empty() {
                    (f64::INFINITY, f64::INFINITY, f64::INFINITY, 0.0)
                } else {
                    let best = costs.iter().cloned().fold(f64::INFINITY, f64::min);
                    let worst = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let std = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };
                    (best, worst, costs.iter().mean(), std)
                };

                let gap_to_greedy = baseline_cost
                    .filter(|_| !costs.is_empty())
                    .map(|b| (avg_cost - b) / b * 100.0);

                Some(CellStatistics {
                    cell: first.cell.clone(),
                    selection: first.selection.clone(),
                    crossover: first.crossover.clone(),
                    population_size: first.population_size,
                    elitism: first.elitism,
                    q: first.q,
                    runs: runs.len(),
                    num_feasible: costs.len(),
                    best_cost,
                    worst_cost,
                    avg_cost,
                    std_cost,
                    avg_time: times.iter().mean(),
                    gap_to_greedy,
                })
            })
            .collect()
    }

    /// Export run results to CSV
    pub fn export_runs_csv<P: AsRef<Path>>(&self, path: P) -> GaResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> GaResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self, instance: &AssignmentInstance) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Assignment GA Experiment Report\n");
        report.push_str("========================================\n\n");
        report.push_str(&format!(
            "Generated: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        report.push_str(&format!(
            "Instance: {} ({} tasks x {} workers, calls_max {})\n",
            instance.name,
            instance.num_tasks(),
            instance.num_workers(),
            instance.calls_max
        ));
        report.push_str(&format!(
            "Lower bound (capacity ignored): {:.2}\n",
            instance.lower_bound()
        ));
        if let Some(baseline) = &self.baseline {
            report.push_str(&format!(
                "Greedy baseline: {:.2} (feasible: {})\n",
                baseline.cost, baseline.feasible
            ));
        }
        report.push('\n');

        report.push_str(&format!(
            "{:<42} {:>8} {:>12} {:>12} {:>10} {:>10} {:>10}\n",
            "Cell", "Feasible", "Avg Cost", "Best Cost", "Std", "Gap%", "Avg Time"
        ));
        report.push_str("-".repeat(110).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            let gap_str = stat
                .gap_to_greedy
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<42} {:>8} {:>12.2} {:>12.2} {:>10.2} {:>10} {:>10.4}\n",
                stat.cell,
                format!("{}/{}", stat.num_feasible, stat.runs),
                stat.avg_cost,
                stat.best_cost,
                stat.std_cost,
                gap_str,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(110).as_str());
        report.push('\n');

        if let Some(best) = self
            .results
            .iter()
            .filter(|r| r.feasible)
            .min_by(|a, b| a.best_cost.total_cmp(&b.best_cost))
        {
            report.push_str(&format!(
                "\nBest run: {} rep {} (seed {}) with cost {:.2}\n",
                best.cell, best.rep, best.seed, best.best_cost
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn baseline(&self) -> Option<&Solution> {
        self.baseline.as_ref()
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(output_dir: &Path) -> ExperimentConfig {
        ExperimentConfig {
            population_sizes: vec![10],
            selections: vec![
                SelectionSweep {
                    selection_type: SelectionType::RankLinear,
                    q_values: vec![1.0],
                },
                SelectionSweep {
                    selection_type: SelectionType::RankNonlinear,
                    q_values: vec![0.9, 0.95],
                },
            ],
            elitism: vec![false, true],
            crossover_types: vec![CrossoverType::Flattened],
            replications: 3,
            max_generations: 5,
            elite_count: 2,
            output_dir: output_dir.to_string_lossy().to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_experiment_config_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.replications, 5);
        // 1 + 1 + 4 q values, one population size, one elitism flag, one crossover
        assert_eq!(config.cells().len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grid_with_bad_q_is_rejected() {
        let config = ExperimentConfig {
            selections: vec![SelectionSweep {
                selection_type: SelectionType::RankNonlinear,
                q_values: vec![0.5, 1.0],
            }],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GaError::Configuration { parameter: "q", .. })));
    }

    #[test]
    fn test_q_values_with_the_same_label_are_rejected() {
        let config = ExperimentConfig {
            selections: vec![SelectionSweep {
                selection_type: SelectionType::RankNonlinear,
                q_values: vec![0.9991, 0.9994],
            }],
            replications: 2,
            write_histories: false,
            ..Default::default()
        };
        assert_eq!(config.cells().len(), 2);
        assert!(matches!(
            config.validate(),
            Err(GaError::Configuration { parameter: "grid", .. })
        ));

        let instance = AssignmentInstance::random("labels", 8, 4, 20, 2, 1);
        let mut experiment = Experiment::new(config);
        assert!(experiment.run(&instance).is_err());
        assert!(experiment.results().is_empty());
    }

    #[test]
    fn test_statistics_keep_cells_apart() {
        let run = |cell_index: usize, q: f64, best_cost: f64| RunResult {
            cell_index,
            cell: "rank_nonlinear_10_5_task_999".to_string(),
            selection: "rank_nonlinear".to_string(),
            crossover: "task".to_string(),
            population_size: 10,
            generations: 5,
            elitism: false,
            q,
            rep: 0,
            seed: 0,
            best_cost,
            feasible: true,
            time: 0.0,
        };

        let mut experiment = Experiment::new(ExperimentConfig::default());
        experiment.results = vec![
            run(0, 0.9991, 10.0),
            run(1, 0.9994, 30.0),
            run(0, 0.9991, 20.0),
            run(1, 0.9994, 40.0),
        ];

        let stats = experiment.compute_statistics();
        assert_eq!(stats.len(), 2);
        assert_eq!((stats[0].q, stats[0].runs, stats[0].avg_cost), (0.9991, 2, 15.0));
        assert_eq!((stats[1].q, stats[1].runs, stats[1].avg_cost), (0.9994, 2, 35.0));
    }

    #[test]
    fn test_replication_limit_and_seed_layout() {
        let too_many = ExperimentConfig {
            replications: SEED_STRIDE as usize + 1,
            ..Default::default()
        };
        assert!(matches!(
            too_many.validate(),
            Err(GaError::Configuration { parameter: "replications", .. })
        ));

        let config = ExperimentConfig {
            base_seed: 7,
            replications: SEED_STRIDE as usize,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.seed_for(0, 999), 1006);
        assert_eq!(config.seed_for(1, 0), 1007);

        let wrapping = ExperimentConfig {
            base_seed: u64::MAX,
            ..Default::default()
        };
        assert_eq!(wrapping.seed_for(0, 0), u64::MAX);
        assert_eq!(wrapping.seed_for(0, 1), 0);
        assert_eq!(wrapping.seed_for(2, 3), 2002);
    }

    #[test]
    fn test_json_config_fills_defaults() {
        let path = std::env::temp_dir().join("assign_ga_experiment.json");
        std::fs::write(
            &path,
            r#"{
                "population_sizes": [50, 100],
                "crossover_types": ["by-worker", "flattened"],
                "replications": 2
            }"#,
        )
        .unwrap();

        let config = ExperimentConfig::from_json_file(&path).unwrap();
        assert_eq!(config.population_sizes, vec![50, 100]);
        assert_eq!(config.crossover_types, vec![CrossoverType::ByWorker, CrossoverType::Flattened]);
        assert_eq!(config.max_generations, 200);
        assert_eq!(config.cells().len(), 6 * 2 * 2);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_sweep_runs_every_cell_and_writes_histories() {
        let dir = std::env::temp_dir().join("assign_ga_sweep_test");
        let _ = std::fs::remove_dir_all(&dir);
        let instance = AssignmentInstance::random("sweep", 12, 4, 30, 4, 5);

        let mut experiment = Experiment::new(small_config(&dir));
        experiment.run(&instance).unwrap();

        // (1 + 2 q values) x 2 elitism flags x 3 replications
        assert_eq!(experiment.results().len(), 18);
        assert!(experiment.results().iter().all(|r| r.feasible));
        assert!(dir.join("rank_nonlinear_10_5_flatten_elite_950_2.csv").exists());

        let stats = experiment.compute_statistics();
        assert_eq!(stats.len(), 6);
        assert_eq!(stats[0].cell, "rank_linear_10_5_flatten_1000");
        for stat in &stats {
            assert_eq!(stat.runs, 3);
            assert!(stat.best_cost <= stat.avg_cost && stat.avg_cost <= stat.worst_cost);
        }

        let report = experiment.generate_report(&instance);
        assert!(report.contains("Greedy baseline"));
        assert!(report.contains("rank_linear_10_5_flatten_elite_1000"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let dir = std::env::temp_dir().join("assign_ga_sweep_order");
        let instance = AssignmentInstance::random("order", 10, 3, 20, 4, 8);

        let mut config = small_config(&dir);
        config.write_histories = false;

        let mut parallel = Experiment::new(config.clone());
        parallel.run(&instance).unwrap();

        config.parallel = false;
        let mut sequential = Experiment::new(config);
        sequential.run(&instance).unwrap();

        let a: Vec<(String, usize, u64, f64)> = parallel
            .results()
            .iter()
            .map(|r| (r.cell.clone(), r.rep, r.seed, r.best_cost))
            .collect();
        let b: Vec<(String, usize, u64, f64)> = sequential
            .results()
            .iter()
            .map(|r| (r.cell.clone(), r.rep, r.seed, r.best_cost))
            .collect();
        assert_eq!(a, b);
    }
}
