use clap::{Parser as _, Subcommand};
use runprops::{ingest, ExtractConfig, Rule};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Extract structured run properties from merge-and-shrink planner logs.
#[derive(clap::Parser, Debug)]
#[command(name = "runprops", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "runprops.toml", global = true)]
    config: PathBuf,

    /// Extra logging (per-rule evaluation, ordering checks)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract properties from one or more run logs
    Parse {
        /// Log files or glob patterns (`.zst` files are decompressed)
        #[arg(required = true, value_name = "LOG")]
        logs: Vec<String>,

        /// Built-in parsers to run (overrides config; repeatable)
        #[arg(short, long = "parser", value_name = "NAME")]
        parsers: Vec<String>,

        /// Merge the record into this properties file (single log only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,

        /// Exit with status 2 if any log has extraction failures
        #[arg(long)]
        strict: bool,
    },
    /// List the resolved rules in evaluation order
    Rules {
        /// Built-in parsers to list (overrides config; repeatable)
        #[arg(short, long = "parser", value_name = "NAME")]
        parsers: Vec<String>,
    },
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}

/// How a successful command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Clean,
    /// `--strict` was given and at least one log had extraction failures.
    StrictFailures,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Clean => ExitCode::SUCCESS,
            Outcome::StrictFailures => ExitCode::from(2),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    tracing::debug!(?cli, "parsed CLI arguments");

    match run(cli) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, Box<dyn std::error::Error>> {
    let mut config = ExtractConfig::load(&cli.config)?;

    match cli.command {
        Command::Parse {
            logs,
            parsers,
            output,
            pretty,
            strict,
        } => {
            if !parsers.is_empty() {
                config.parsers = parsers;
            }
            let parser = config.build_parser()?;
            let paths = ingest::expand_log_paths(&logs)?;
            if output.is_some() && paths.len() != 1 {
                return Err(format!(
                    "--output needs exactly one log, got {}",
                    paths.len()
                )
                .into());
            }

            let mut any_failures = false;
            for path in &paths {
                let record = ingest::extract_file(&parser, path)?;
                for failure in record.failures() {
                    tracing::warn!(log = %path.display(), "{failure}");
                }
                any_failures |= record.has_failures();

                match &output {
                    Some(out) => {
                        ingest::write_properties(out, &record, pretty)?;
                    }
                    None => {
                        let json = if pretty {
                            serde_json::to_string_pretty(&record)?
                        } else {
                            serde_json::to_string(&record)?
                        };
                        println!("{json}");
                    }
                }
            }

            if strict && any_failures {
                return Ok(Outcome::StrictFailures);
            }
            Ok(Outcome::Clean)
        }
        Command::Rules { parsers } => {
            if !parsers.is_empty() {
                config.parsers = parsers;
            }
            let parser = config.build_parser()?;
            for (idx, rule) in parser.rules().iter().enumerate() {
                println!("{:>3}. {}", idx + 1, describe(rule));
            }
            for warning in parser.validate() {
                println!("warning: {warning}");
            }
            Ok(Outcome::Clean)
        }
    }
}

fn describe(rule: &Rule) -> String {
    match rule {
        Rule::Pattern(p) => format!(
            "{} [pattern {}{}] {}",
            p.name(),
            p.value_type(),
            if p.required() { ", required" } else { "" },
            p.pattern()
        ),
        Rule::Function(f) => {
            let mut line = format!("{} [function]", f.name());
            if !rule.reads().is_empty() {
                line.push_str(&format!(" reads: {}", rule.reads().join(", ")));
            }
            if !rule.writes().is_empty() {
                line.push_str(&format!(" writes: {}", rule.writes().join(", ")));
            }
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runprops::{FunctionRule, PatternRule, ValueType};
    use std::path::Path;
    use tempfile::TempDir;

    const SYMMETRIES_LOG: &str = "\
Average bliss time: 0.5
Total bliss calls: 3
Number of attempts to merge for symmetries: 4
Number of times pruning interfered merging for symmetries: 1
Number of applied symmetries: 2
";

    /// Temp dir holding `run.log` and, when given, a `runprops.toml`.
    fn workspace(log: &str, config: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("run.log"), log).unwrap();
        if let Some(config) = config {
            std::fs::write(dir.path().join("runprops.toml"), config).unwrap();
        }
        dir
    }

    fn cli(dir: &Path, args: &[&str]) -> Cli {
        let config = dir.join("runprops.toml");
        let mut argv = vec![
            "runprops".to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    fn path_arg(dir: &Path, name: &str) -> String {
        dir.join(name).display().to_string()
    }

    const REQUIRES_SEARCH_TIME: &str = r#"
parsers = ["symmetries"]

[[pattern]]
name = "search_time"
regex = 'Search time: (.+)s'
type = "float"
required = true
"#;

    #[test]
    fn strict_run_with_failures_exits_with_status_two() {
        let dir = workspace(SYMMETRIES_LOG, Some(REQUIRES_SEARCH_TIME));
        let log = path_arg(dir.path(), "run.log");

        let outcome = run(cli(dir.path(), &["parse", &log, "--strict"])).unwrap();
        assert_eq!(outcome, Outcome::StrictFailures);

        let outcome = run(cli(dir.path(), &["parse", &log])).unwrap();
        assert_eq!(outcome, Outcome::Clean);
    }

    #[test]
    fn strict_run_without_failures_is_clean() {
        let dir = workspace(SYMMETRIES_LOG, None);
        let log = path_arg(dir.path(), "run.log");
        let outcome = run(cli(dir.path(), &["parse", &log, "--strict"])).unwrap();
        assert_eq!(outcome, Outcome::Clean);
    }

    #[test]
    fn output_requires_exactly_one_log() {
        let dir = workspace(SYMMETRIES_LOG, None);
        std::fs::write(dir.path().join("other.log"), SYMMETRIES_LOG).unwrap();
        let pattern = path_arg(dir.path(), "*.log");
        let out = path_arg(dir.path(), "properties");

        let err = run(cli(dir.path(), &["parse", &pattern, "--output", &out])).unwrap_err();
        assert_eq!(err.to_string(), "--output needs exactly one log, got 2");
        assert!(!dir.path().join("properties").exists());
    }

    #[test]
    fn output_merges_record_into_properties_file() {
        let dir = workspace(SYMMETRIES_LOG, None);
        let log = path_arg(dir.path(), "run.log");
        let out = dir.path().join("properties");
        std::fs::write(&out, r#"{"coverage": 1, "ms_linear_order": null}"#).unwrap();

        let outcome = run(cli(
            dir.path(),
            &["parse", &log, "--output", &out.display().to_string()],
        ))
        .unwrap();
        assert_eq!(outcome, Outcome::Clean);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["coverage"], 1);
        assert!(written["ms_linear_order"].is_null());
        assert_eq!(written["bliss_total_calls"], 3);
        assert_eq!(written["merging_for_symmetries_success_ratio_pruning"], 0.75);
    }

    #[test]
    fn parser_flag_overrides_config() {
        let dir = workspace(SYMMETRIES_LOG, Some("parsers = [\"merge_strategies\"]\n"));
        let log = path_arg(dir.path(), "run.log");
        let out = dir.path().join("properties");
        let out_arg = out.display().to_string();

        run(cli(dir.path(), &["parse", &log, "--output", &out_arg])).unwrap();
        let from_config: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert!(from_config.get("bliss_total_calls").is_none());

        std::fs::remove_file(&out).unwrap();
        run(cli(
            dir.path(),
            &["parse", &log, "--parser", "symmetries", "--output", &out_arg],
        ))
        .unwrap();
        let overridden: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(overridden["bliss_total_calls"], 3);
        assert!(overridden.get("ms_one_scc").is_none());
    }

    #[test]
    fn unknown_parser_flag_is_an_error() {
        let dir = workspace(SYMMETRIES_LOG, None);
        let log = path_arg(dir.path(), "run.log");
        let err = run(cli(dir.path(), &["parse", &log, "--parser", "bogus"])).unwrap_err();
        assert!(err.to_string().starts_with("unknown parser \"bogus\""));
    }

    #[test]
    fn rules_command_lists_resolved_registry() {
        let dir = workspace("", Some(REQUIRES_SEARCH_TIME));
        assert_eq!(run(cli(dir.path(), &["rules"])).unwrap(), Outcome::Clean);
    }

    #[test]
    fn cli_parses_parse_subcommand() {
        let cli = Cli::try_parse_from([
            "runprops",
            "parse",
            "runs/*/run.log",
            "--parser",
            "symmetries",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Command::Parse {
                logs,
                parsers,
                strict,
                ..
            } => {
                assert_eq!(logs, vec!["runs/*/run.log"]);
                assert_eq!(parsers, vec!["symmetries"]);
                assert!(strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("runprops.toml"));
    }

    #[test]
    fn cli_requires_a_log() {
        assert!(Cli::try_parse_from(["runprops", "parse"]).is_err());
    }

    #[test]
    fn cli_rejects_verbose_and_quiet() {
        assert!(Cli::try_parse_from(["runprops", "-v", "-q", "rules"]).is_err());
    }

    #[test]
    fn describe_pattern_rule() {
        let rule = Rule::Pattern(
            PatternRule::new("calls", r"calls: (\d+)", true, ValueType::Int).unwrap(),
        );
        assert_eq!(describe(&rule), r"calls [pattern int, required] calls: (\d+)");
    }

    #[test]
    fn describe_function_rule() {
        let rule = Rule::Function(
            FunctionRule::new("ratio", |_, _| {})
                .reads(["attempts"])
                .writes(["ratio"]),
        );
        assert_eq!(describe(&rule), "ratio [function] reads: attempts writes: ratio");
    }
}
