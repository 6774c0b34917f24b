use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_EXACT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 3;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverStrategyKind {
    /// Binary MILP, falling back to greedy when unavailable or out of time.
    #[default]
    Exact,
    Greedy,
}

impl FromStr for SolverStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "milp" => Ok(SolverStrategyKind::Exact),
            "greedy" | "heuristic" => Ok(SolverStrategyKind::Greedy),
            other => Err(format!("unknown solver strategy '{}'", other)),
        }
    }
}

impl fmt::Display for SolverStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStrategyKind::Exact => write!(f, "exact"),
            SolverStrategyKind::Greedy => write!(f, "greedy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub solver_strategy: SolverStrategyKind,
    /// Wall-clock budget for one exact solve; 0 disables the limit.
    pub exact_timeout_ms: u64,
    pub max_recommendations: usize,
    pub batch_concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            solver_strategy: SolverStrategyKind::default(),
            exact_timeout_ms: DEFAULT_EXACT_TIMEOUT_MS,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let solver_strategy = parse_or_default(
            &lookup,
            "OPTIMIZER_SOLVER",
            defaults.solver_strategy,
        );
        let exact_timeout_ms = parse_or_default(
            &lookup,
            "OPTIMIZER_EXACT_TIMEOUT_MS",
            defaults.exact_timeout_ms,
        );
        let max_recommendations = parse_or_default(
            &lookup,
            "OPTIMIZER_TOP_K",
            defaults.max_recommendations,
        );
        let batch_concurrency = parse_or_default(
            &lookup,
            "OPTIMIZER_BATCH_CONCURRENCY",
            defaults.batch_concurrency,
        );

        let config = Self {
            solver_strategy,
            exact_timeout_ms,
            max_recommendations,
            batch_concurrency: batch_concurrency.max(1),
        };

        if config.max_recommendations == 0 {
            warn!("OPTIMIZER_TOP_K is 0 - no recommendations will be produced");
        }

        config
    }

    pub fn exact_timeout(&self) -> Option<Duration> {
        if self.exact_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.exact_timeout_ms))
        }
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        None => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.exact_timeout(), Some(Duration::from_millis(5_000)));
        assert_eq!(config.solver_strategy, SolverStrategyKind::Exact);
    }

    #[test]
    fn reads_all_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPTIMIZER_SOLVER", "greedy"),
            ("OPTIMIZER_EXACT_TIMEOUT_MS", "0"),
            ("OPTIMIZER_TOP_K", "5"),
            ("OPTIMIZER_BATCH_CONCURRENCY", "8"),
        ]));

        assert_eq!(config.solver_strategy, SolverStrategyKind::Greedy);
        assert_eq!(config.exact_timeout(), None);
        assert_eq!(config.max_recommendations, 5);
        assert_eq!(config.batch_concurrency, 8);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPTIMIZER_SOLVER", "quantum"),
            ("OPTIMIZER_TOP_K", "three"),
            ("OPTIMIZER_BATCH_CONCURRENCY", "0"),
        ]));

        assert_eq!(config.solver_strategy, SolverStrategyKind::Exact);
        assert_eq!(config.max_recommendations, DEFAULT_MAX_RECOMMENDATIONS);
        assert_eq!(config.batch_concurrency, 1);
    }

    #[test]
    fn strategy_names_parse_case_insensitively() {
        assert_eq!("MILP".parse::<SolverStrategyKind>(), Ok(SolverStrategyKind::Exact));
        assert_eq!("Greedy".parse::<SolverStrategyKind>(), Ok(SolverStrategyKind::Greedy));
        assert!("".parse::<SolverStrategyKind>().is_err());
    }
}
