//! Assignment GA - Command Line Interface
//!
//! Solve a worker-task assignment instance with the genetic algorithm, sweep GA
//! parameters, analyze an instance or generate a random one.

use assign_ga::benchmark::{Experiment, ExperimentConfig};
use assign_ga::error::GaResult;
use assign_ga::heuristics::construction::{ConstructionHeuristic, GreedyAssignment};
use assign_ga::heuristics::crossover::CrossoverType;
use assign_ga::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use assign_ga::heuristics::mutation::MutationType;
use assign_ga::heuristics::selection::SelectionType;
use assign_ga::instance::{delimiter_byte, AssignmentInstance};

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "assign-ga")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "A genetic algorithm solver for the capacitated worker-task assignment problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the genetic algorithm once
    Solve {
        /// Task-time matrix (one row per task, one column per worker)
        #[arg(short, long)]
        instance: PathBuf,

        /// Maximum number of tasks per worker
        #[arg(short, long)]
        calls_max: usize,

        /// Field delimiter of the instance file
        #[arg(long, default_value = ",")]
        delimiter: char,

        #[arg(short, long, default_value = "100")]
        population_size: usize,

        #[arg(short, long, default_value = "200")]
        generations: usize,

        #[arg(long, value_enum, default_value = "rank-linear")]
        selection: Selection,

        /// Shape parameter of rank-nonlinear selection, strictly between 0 and 1
        #[arg(short, long, default_value = "0.999")]
        q: f64,

        /// Keep the cheapest chromosomes unchanged from one generation to the next
        #[arg(long)]
        elitism: bool,

        #[arg(long, default_value = "5")]
        elite_count: usize,

        #[arg(long, value_enum, default_value = "task")]
        crossover: Crossover,

        #[arg(long, value_enum, default_value = "reassign")]
        mutation: Mutation,

        /// Per-task mutation probability
        #[arg(long, default_value = "0.002")]
        mutation_prob: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output solution to file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write per-generation statistics to this CSV file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run a parameter sweep with several replications per combination
    Sweep {
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(short, long)]
        calls_max: usize,

        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Experiment grid (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Override the number of replications per combination
        #[arg(short, long)]
        replications: Option<usize>,

        /// Run replications one after the other
        #[arg(long)]
        sequential: bool,
    },

    /// Analyze an instance and print the greedy baseline
    Analyze {
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(short, long)]
        calls_max: usize,

        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Generate a random instance
    Generate {
        #[arg(short, long)]
        tasks: usize,

        #[arg(short, long)]
        workers: usize,

        /// Costs are drawn uniformly from 1..=max_cost
        #[arg(long, default_value = "100")]
        max_cost: u32,

        /// Print capacity statistics for this calls_max
        #[arg(short, long)]
        calls_max: Option<usize>,

        #[arg(short, long, default_value = "42")]
        seed: u64,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Selection {
    /// Probability proportional to 1 / cost
    Proportional,
    /// Probability proportional to (max cost - cost + 0.001)
    ProportionalShifted,
    /// Probability proportional to N - rank
    RankLinear,
    /// Probability proportional to q^rank
    RankNonlinear,
}

impl From<Selection> for SelectionType {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Proportional => SelectionType::Proportional,
            Selection::ProportionalShifted => SelectionType::ProportionalShifted,
            Selection::RankLinear => SelectionType::RankLinear,
            Selection::RankNonlinear => SelectionType::RankNonlinear,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Crossover {
    /// Cut between task rows
    Task,
    /// Cut between worker columns
    Worker,
    /// Cut anywhere in the row-major flattened matrix
    Flatten,
}

impl From<Crossover> for CrossoverType {
    fn from(crossover: Crossover) -> Self {
        match crossover {
            Crossover::Task => CrossoverType::ByTask,
            Crossover::Worker => CrossoverType::ByWorker,
            Crossover::Flatten => CrossoverType::Flattened,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Mutation {
    None,
    /// Move a task to another worker
    Reassign,
}

impl From<Mutation> for MutationType {
    fn from(mutation: Mutation) -> Self {
        match mutation {
            Mutation::None => MutationType::None,
            Mutation::Reassign => MutationType::Reassign,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            instance,
            calls_max,
            delimiter,
            population_size,
            generations,
            selection,
            q,
            elitism,
            elite_count,
            crossover,
            mutation,
            mutation_prob,
            seed,
            output,
            history,
            verbose,
        } => {
            let config = GAConfig {
                population_size,
                max_generations: generations,
                mutation_type: mutation.into(),
                mutation_prob,
                selection_type: selection.into(),
                q,
                elitism,
                elite_count,
                crossover_type: crossover.into(),
                seed,
            };
            solve_instance(&instance, calls_max, delimiter, config, output, history, verbose)
        }

        Commands::Sweep {
            instance,
            calls_max,
            delimiter,
            config,
            output,
            replications,
            sequential,
        } => run_sweep(&instance, calls_max, delimiter, config, &output, replications, sequential),

        Commands::Analyze {
            instance,
            calls_max,
            delimiter,
        } => analyze_instance(&instance, calls_max, delimiter),

        Commands::Generate {
            tasks,
            workers,
            max_cost,
            calls_max,
            seed,
            output,
        } => generate_instance(tasks, workers, max_cost, calls_max, seed, &output),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_instance(path: &Path, calls_max: usize, delimiter: char) -> GaResult<AssignmentInstance> {
    println!("Loading instance from {:?}...", path);
    AssignmentInstance::from_file(path, delimiter_byte(delimiter)?, calls_max)
}

fn solve_instance(
    path: &Path,
    calls_max: usize,
    delimiter: char,
    config: GAConfig,
    output: Option<PathBuf>,
    history: Option<PathBuf>,
    verbose: bool,
) -> GaResult<()> {
    let instance = load_instance(path, calls_max, delimiter)?;

    if verbose {
        println!("{}", instance.statistics());
        println!("{:#?}", config);
    }

    println!("Solving with genetic algorithm ({})...", config.cell_label());
    let mut ga = GeneticAlgorithm::new(instance, config)?;
    let solution = ga.run()?;

    println!("\n{}", solution);
    if verbose {
        let repairs = ga.repair_totals();
        println!(
            "Repair: {} rows filled, {} rows deduplicated, {} tasks moved",
            repairs.rows_filled, repairs.rows_deduplicated, repairs.tasks_moved
        );
    }

    if let Some(history_path) = history {
        ga.export_history_csv(&history_path)?;
        println!("History saved to {:?}", history_path);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(&out_path, json)?;
        println!("Solution saved to {:?}", out_path);
    }

    Ok(())
}

fn run_sweep(
    path: &Path,
    calls_max: usize,
    delimiter: char,
    config_path: Option<PathBuf>,
    output: &Path,
    replications: Option<usize>,
    sequential: bool,
) -> GaResult<()> {
    let instance = load_instance(path, calls_max, delimiter)?;

    let mut config = match config_path {
        Some(p) => ExperimentConfig::from_json_file(p)?,
        None => ExperimentConfig::default(),
    };
    if let Some(r) = replications {
        config.replications = r;
    }
    if sequential {
        config.parallel = false;
    }
    config.output_dir = output.to_string_lossy().to_string();
    std::fs::create_dir_all(output)?;

    println!(
        "Sweeping {} parameter combinations x {} replications on {}",
        config.cells().len(),
        config.replications,
        instance.name
    );

    let mut experiment = Experiment::new(config);
    experiment.run(&instance)?;

    let runs_path = output.join("runs.csv");
    experiment.export_runs_csv(&runs_path)?;
    println!("\nRuns exported to {:?}", runs_path);

    let summary_path = output.join("summary.csv");
    experiment.export_statistics_csv(&summary_path)?;
    println!("Summary exported to {:?}", summary_path);

    let report = experiment.generate_report(&instance);
    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    println!("\n{}", report);
    Ok(())
}

fn analyze_instance(path: &Path, calls_max: usize, delimiter: char) -> GaResult<()> {
    let instance = load_instance(path, calls_max, delimiter)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    if let Err(e) = instance.check_capacity() {
        println!("\nWarning: {}", e);
    }

    let greedy = GreedyAssignment::new();
    let baseline = greedy.construct(&instance);
    println!("\n{} baseline:", greedy.name());
    println!("{}", baseline);

    Ok(())
}

fn generate_instance(
    tasks: usize,
    workers: usize,
    max_cost: u32,
    calls_max: Option<usize>,
    seed: u64,
    output: &Path,
) -> GaResult<()> {
    let name = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "random".to_string());

    let capacity = calls_max.unwrap_or(tasks);
    let instance = AssignmentInstance::random(&name, tasks, workers, max_cost, capacity, seed);
    instance.to_file(output, b',')?;
    println!("Instance {} ({} tasks x {} workers) written to {:?}", name, tasks, workers, output);

    if calls_max.is_some() {
        println!("\n{}", instance.statistics());
    }
    Ok(())
}
