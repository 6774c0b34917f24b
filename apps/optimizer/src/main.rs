use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;

use scheduling_cell::{BatchOptimizer, BatchResults, RecommendationService};
use shared_config::{AppConfig, SolverStrategyKind};
use shared_dataset::{demo_roster, load_dataset, DatasetSummary};
use shared_models::{Roster, Weights};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rank rehab appointment options for every patient", long_about = None)]
struct Cli {
    /// Dataset JSON file. The built-in demo week is used when omitted.
    #[arg(value_name = "DATASET")]
    dataset: Option<PathBuf>,
    /// Solver strategy: exact (MILP with greedy fallback) or greedy
    #[arg(long)]
    solver: Option<SolverStrategyKind>,
    /// Wall-clock limit for one exact solve, 0 for none
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    /// Recommendations per patient
    #[arg(long, value_name = "K")]
    top_k: Option<usize>,
    /// Patients solved at once
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
    /// Only recommend for this patient id
    #[arg(long, value_name = "ID")]
    patient: Option<String>,
    /// Print results as JSON instead of the text report
    #[arg(long)]
    json: bool,
    /// Print a dataset summary before the results
    #[arg(long)]
    summary: bool,
}

impl Cli {
    /// Flags win over environment configuration.
    fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(strategy) = self.solver {
            config.solver_strategy = strategy;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.exact_timeout_ms = timeout_ms;
        }
        if let Some(top_k) = self.top_k {
            config.max_recommendations = top_k;
        }
        if let Some(concurrency) = self.concurrency {
            config.batch_concurrency = concurrency.max(1);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.apply_overrides(AppConfig::from_env());

    info!(
        solver = %config.solver_strategy,
        timeout_ms = config.exact_timeout_ms,
        top_k = config.max_recommendations,
        concurrency = config.batch_concurrency,
        "Starting rehab appointment optimizer"
    );

    let roster = match &cli.dataset {
        Some(path) => load_dataset(path)
            .with_context(|| format!("could not load dataset {}", path.display()))?,
        None => {
            info!("No dataset given, using the built-in demo week");
            demo_roster()
        }
    };

    if cli.summary {
        println!("{}\n", DatasetSummary::from_roster(&roster));
    }

    let results = match &cli.patient {
        Some(patient_id) => recommend_one(&config, &roster, patient_id)?,
        None => BatchOptimizer::new(&config)
            .optimize_all_patients_concurrent(Arc::new(roster.clone()), Weights::default())
            .await
            .context("batch optimization failed")?,
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("could not serialize results")?
        );
    } else {
        print!("{}", report::render_report(&roster, &results));
    }

    Ok(())
}

fn recommend_one(config: &AppConfig, roster: &Roster, patient_id: &str) -> Result<BatchResults> {
    let recommendations = RecommendationService::new(config)
        .get_top_k_recommendations(
            patient_id,
            &roster.patients,
            &roster.doctors,
            &roster.timeslots,
            &Weights::default(),
        )
        .with_context(|| format!("could not recommend for patient {}", patient_id))?;

    Ok(BatchResults::from([(patient_id.to_string(), recommendations)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment_config() {
        let cli = Cli::parse_from([
            "rehab-optimizer",
            "data.json",
            "--solver",
            "greedy",
            "--top-k",
            "5",
            "--concurrency",
            "0",
        ]);
        let config = cli.apply_overrides(AppConfig::default());

        assert_eq!(cli.dataset, Some(PathBuf::from("data.json")));
        assert_eq!(config.solver_strategy, SolverStrategyKind::Greedy);
        assert_eq!(config.max_recommendations, 5);
        assert_eq!(config.batch_concurrency, 1);
        assert_eq!(config.exact_timeout_ms, AppConfig::default().exact_timeout_ms);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::parse_from(["rehab-optimizer", "--json"]);
        assert!(cli.json);
        assert!(cli.dataset.is_none());
        assert_eq!(cli.apply_overrides(AppConfig::default()), AppConfig::default());
    }

    #[test]
    fn rejects_unknown_solver() {
        assert!(Cli::try_parse_from(["rehab-optimizer", "--solver", "quantum"]).is_err());
    }
}
