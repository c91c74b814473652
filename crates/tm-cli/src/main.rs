use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;
use serde_json::Value;
use tm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use tm_common::{
    AlgorithmKind, BatchConfig, BatchControl, BatchRanker, BulkOptions, Candidate,
    CancellationPolicy, Job, MatchingService, ScoringConfig,
};
use tracing::info;

const APP_NAME: &str = "tm-match";

#[derive(Debug, Parser)]
#[command(
    name = "tm-match",
    about = "Score and rank candidates against job postings from JSON files"
)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score one candidate against one job
    Match {
        #[arg(long)]
        candidate: PathBuf,
        #[arg(long)]
        job: PathBuf,
        #[arg(long, default_value = "ai-hybrid")]
        algorithm: AlgorithmKind,
    },
    /// Rank a JSON array of candidates for one job
    RankCandidates {
        #[arg(long)]
        job: PathBuf,
        #[arg(long)]
        candidates: PathBuf,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Rank a JSON array of jobs for one candidate
    RankJobs {
        #[arg(long)]
        candidate: PathBuf,
        #[arg(long)]
        jobs: PathBuf,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Qualified candidates for every job
    Bulk {
        #[arg(long)]
        jobs: PathBuf,
        #[arg(long)]
        candidates: PathBuf,
        #[arg(long, default_value = "ai-hybrid")]
        algorithm: AlgorithmKind,
        #[arg(long, default_value_t = 50)]
        threshold: u8,
        #[arg(long, default_value_t = 5)]
        per_job_limit: usize,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// List the available algorithms
    Algorithms,
}

#[derive(Debug, clap::Args)]
struct BatchArgs {
    /// Number of results to keep (defaults to TM_BATCH_DEFAULT_LIMIT or 10)
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, default_value = "ai-hybrid")]
    algorithm: AlgorithmKind,

    /// Stop scoring new pairs after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Fail instead of returning partial results when the timeout hits
    #[arg(long, default_value_t = false)]
    fail_on_timeout: bool,
}

impl BatchArgs {
    fn control(&self) -> BatchControl {
        let mut control = BatchControl::default();
        if let Some(ms) = self.timeout_ms {
            control = control.with_deadline(Instant::now() + Duration::from_millis(ms));
        }
        if self.fail_on_timeout {
            control = control.with_policy(CancellationPolicy::FailBatch);
        }
        control
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn read_array(path: &Path) -> Result<Vec<Value>> {
    match read_json(path)? {
        Value::Array(items) => Ok(items),
        other => bail!(
            "{} must contain a JSON array, found {}",
            path.display(),
            json_kind(&other)
        ),
    }
}

fn read_candidate(path: &Path) -> Result<Candidate> {
    Candidate::from_value(read_json(path)?).with_context(|| format!("decoding {}", path.display()))
}

fn read_job(path: &Path) -> Result<Job> {
    Job::from_value(read_json(path)?).with_context(|| format!("decoding {}", path.display()))
}

fn read_all<T>(
    path: &Path,
    decode: impl Fn(Value) -> Result<T, tm_common::MatchError>,
) -> Result<Vec<T>> {
    read_array(path)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            decode(value).with_context(|| format!("decoding {} entry {index}", path.display()))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn ranker(service: MatchingService) -> Result<BatchRanker> {
    let config = BatchConfig::from_env();
    let ranker = BatchRanker::new(service, config).context("starting batch worker pool")?;
    info!(worker_threads = ranker.worker_threads(), "batch ranker ready");
    Ok(ranker)
}

fn run() -> Result<()> {
    dotenv().ok();
    init_tracing_subscriber(APP_NAME);
    install_tracing_panic_hook(APP_NAME);

    let cli = Cli::parse();
    let service = MatchingService::new(ScoringConfig::from_env());

    match cli.command {
        Command::Match {
            candidate,
            job,
            algorithm,
        } => {
            let candidate = read_candidate(&candidate)?;
            let job = read_job(&job)?;
            let result = service.match_candidate_to_job(&candidate, &job, algorithm)?;
            emit(&result, cli.pretty)
        }
        Command::RankCandidates {
            job,
            candidates,
            batch,
        } => {
            let job = read_job(&job)?;
            let records = read_array(&candidates)?;
            let ranking = ranker(service)?.rank_candidate_records(
                &job,
                records,
                batch.limit,
                batch.algorithm,
                &batch.control(),
            )?;
            emit(&ranking, cli.pretty)
        }
        Command::RankJobs {
            candidate,
            jobs,
            batch,
        } => {
            let candidate = read_candidate(&candidate)?;
            let records = read_array(&jobs)?;
            let ranking = ranker(service)?.rank_job_records(
                &candidate,
                records,
                batch.limit,
                batch.algorithm,
                &batch.control(),
            )?;
            emit(&ranking, cli.pretty)
        }
        Command::Bulk {
            jobs,
            candidates,
            algorithm,
            threshold,
            per_job_limit,
            timeout_ms,
        } => {
            let jobs = read_all(&jobs, Job::from_value)?;
            let candidates = read_all(&candidates, Candidate::from_value)?;
            let control = match timeout_ms {
                Some(ms) => BatchControl::default()
                    .with_deadline(Instant::now() + Duration::from_millis(ms)),
                None => BatchControl::default(),
            };
            let options = BulkOptions {
                threshold,
                per_job_limit,
            };
            let result =
                ranker(service)?.bulk_match(&jobs, &candidates, algorithm, options, &control)?;
            emit(&result, cli.pretty)
        }
        Command::Algorithms => {
            let catalog = AlgorithmKind::catalog(&service.config().weights);
            emit(&catalog, cli.pretty)
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{APP_NAME} failed: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rank_candidates_flags() {
        let cli = Cli::try_parse_from([
            "tm-match",
            "rank-candidates",
            "--job",
            "job.json",
            "--candidates",
            "pool.json",
            "--limit",
            "3",
            "--algorithm",
            "skill-based",
            "--fail-on-timeout",
        ])
        .unwrap();

        match cli.command {
            Command::RankCandidates { batch, .. } => {
                assert_eq!(batch.limit, Some(3));
                assert_eq!(batch.algorithm, AlgorithmKind::SkillBased);
                assert_eq!(batch.control().policy, Some(CancellationPolicy::FailBatch));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let parsed = Cli::try_parse_from([
            "tm-match",
            "match",
            "--candidate",
            "c.json",
            "--job",
            "j.json",
            "--algorithm",
            "random-forest",
        ]);
        assert!(parsed.is_err());
    }
}
