use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{Level, event};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use isp::config::IspConfig;
use isp::config::meta::IspLogLevel;
use isp::formulation::builder::FormulationParams;
use isp::formulation::{Formulation, Objective, OperationalLimits};
use isp::instance::Instance;
use isp::instance::random::RandomInstance;
use isp::report::{CoverageComparison, SolveSummary, assignments, coverage_ratios};
use isp::solver::optimize::OptimizationBackend;
use isp::solver::{Solution, solve};

/// Overrides shared by `solve` and `compare`.
#[derive(Args, Debug, Clone)]
struct ModelArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    instance: Option<PathBuf>,
    /// Add the workload and consecutive-block constraints.
    #[arg(long)]
    oper_constr: bool,
    #[arg(long)]
    bridging: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum IspCommands {
    /// Write a default config file.
    New { config: Option<PathBuf> },
    /// Build and solve one model.
    Solve {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long)]
        objective: Option<Objective>,
        #[arg(long)]
        time_limit: Option<u64>,
    },
    /// Compare per-session coverage of OF1 against OF2, or against
    /// bridging OF1 with `--bridging`.
    Compare {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long)]
        plot: bool,
    },
    /// Write a random instance.
    Generate {
        /// Falls back to the config's seed, then to a random one.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 6)]
        interpreters: usize,
        #[arg(long, default_value_t = 8)]
        sessions: usize,
        #[arg(long, default_value_t = 4)]
        blocks: usize,
        #[arg(long, default_value_t = 6)]
        languages: usize,
        out: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct IspParams {
    #[command(subcommand)]
    command: IspCommands,
}

fn main() -> anyhow::Result<()> {
    let params = IspParams::parse();
    match params.command {
        IspCommands::New { config } => new(config.unwrap_or(PathBuf::from("./isp.toml"))),
        IspCommands::Solve {
            model,
            objective,
            time_limit,
        } => {
            let mut config = load_config(&model)?;
            if let Some(objective) = objective {
                config.model.objective = objective;
            }
            if let Some(secs) = time_limit {
                config.solver.time_limit_secs = secs;
            }
            run_solve(config)
        }
        IspCommands::Compare { model, plot } => {
            let config = load_config(&model)?;
            compare(config, model.bridging, plot)
        }
        IspCommands::Generate {
            seed,
            config,
            interpreters,
            sessions,
            blocks,
            languages,
            out,
        } => {
            let config = match config {
                Some(path) => IspConfig::load(path)?,
                None => IspConfig::default(),
            };
            init_logging(config.meta.log_level)?;
            let shape = RandomInstance {
                interpreters,
                sessions,
                blocks,
                languages,
                ..Default::default()
            };
            let seed = seed.unwrap_or(u64::from(config.meta.seed));
            let instance = shape.generate(seed);
            fs::write(&out, instance.to_json_string()?)?;
            event!(Level::INFO, "Wrote instance with seed {} to {}", seed, out.display());
            Ok(())
        }
    }
}

fn new(path: PathBuf) -> anyhow::Result<()> {
    let config = IspConfig::default();
    fs::write(path, config.to_toml_string()?)?;
    Ok(())
}

fn load_config(args: &ModelArgs) -> anyhow::Result<IspConfig> {
    let mut config = match &args.config {
        Some(path) => IspConfig::load(path)?,
        None => IspConfig::default(),
    };
    if let Some(instance) = &args.instance {
        config.instance.path = instance.clone();
    }
    if args.oper_constr && config.model.operational.is_none() {
        config.model.operational = Some(OperationalLimits::default());
    }
    if args.bridging {
        config.model.bridging = true;
    }
    Ok(config)
}

fn init_logging(level: IspLogLevel) -> anyhow::Result<()> {
    let level = Level::from(level);
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .from_env()?
        .add_directive(format!("isp={level}").parse()?);
    let indicatif_layer = IndicatifLayer::new();
    let writer = indicatif_layer.get_stderr_writer();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(indicatif_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();
    Ok(())
}

fn solve_one(
    instance: &Instance,
    params: &FormulationParams,
    config: &IspConfig,
) -> anyhow::Result<(Formulation, Solution)> {
    let formulation = params.build(instance)?;
    event!(
        Level::INFO,
        "Model is built: {} ({}) with {} variables and {} constraints",
        formulation.kind(),
        formulation.objective(),
        formulation.variables().len(),
        formulation.constraints().len()
    );
    let solution = solve(
        OptimizationBackend::new(),
        &formulation,
        config.solver.time_limit(),
    )?;
    Ok((formulation, solution))
}

fn run_solve(config: IspConfig) -> anyhow::Result<()> {
    init_logging(config.meta.log_level)?;
    let instance = config.load_instance()?;
    let params = config.resolve()?;
    let (formulation, solution) = solve_one(&instance, &params, &config)?;
    event!(Level::INFO, "{}", SolveSummary::new(&formulation, &solution));
    if !solution.status().has_solution() {
        event!(Level::WARN, "No solution to report: {}", solution.status());
        return Ok(());
    }
    for assignment in assignments(&formulation, &solution)? {
        event!(Level::INFO, "{}", assignment);
    }
    Ok(())
}

fn compare(config: IspConfig, bridging: bool, plot: bool) -> anyhow::Result<()> {
    init_logging(config.meta.log_level)?;
    let instance = config.load_instance()?;
    let base = config
        .resolve()?
        .with_bridging(false)
        .with_objective(Objective::CoveredPairs);
    let (right_label, other) = match bridging {
        true => ("Bridge", base.with_bridging(true)),
        false => ("OF2", base.with_objective(Objective::CoveredSessions)),
    };
    let mut ratios = vec![];
    for params in [&base, &other] {
        let (formulation, solution) = solve_one(&instance, params, &config)?;
        event!(Level::INFO, "{}", SolveSummary::new(&formulation, &solution));
        if !solution.status().has_solution() {
            event!(Level::ERROR, "Cannot compare: {}", solution.status());
            return Ok(());
        }
        ratios.push(coverage_ratios(&instance, &formulation, &solution)?);
    }
    let comparison = CoverageComparison::new("OF1", &ratios[0], right_label, &ratios[1]);
    println!("{comparison}");
    if plot {
        println!();
        print!("{}", comparison.bar_chart());
    }
    Ok(())
}
