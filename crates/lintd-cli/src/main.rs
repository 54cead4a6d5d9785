//! lintd CLI - run the built-in engine over local files
//!
//! Usage:
//!   lintd src/*.txt                       Analyze files, print issues
//!   lintd --format json a.txt b.txt       Print issues as JSON
//!   lintd --exclude-rule text:TodoComment --property text.maxLineLength=80 a.txt
//!   lintd --rules                         List the available rules

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lintd::{
    AnalysisConfiguration, AnalysisEngine, BasicEngine, Charset, ClientInputFile, EngineConfig,
    Issue, IssueError, IssueListener, TracingLogOutput,
};

/// lintd - line-oriented static analysis
#[derive(Parser, Debug)]
#[command(name = "lintd")]
#[command(about = "Run lintd rules over local files")]
struct Args {
    /// Files to analyze
    #[arg(required_unless_present = "rules")]
    files: Vec<PathBuf>,

    /// Directory relative file paths are resolved against
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Encoding of the input files
    #[arg(long, default_value = "UTF-8")]
    charset: Charset,

    /// Rule key to skip (repeatable)
    #[arg(long = "exclude-rule", value_name = "RULE")]
    excluded_rules: Vec<String>,

    /// Engine property as key=value (repeatable)
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// Glob marking files as test files (repeatable)
    #[arg(long = "test-pattern", value_name = "GLOB")]
    test_patterns: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// List the available rules and exit
    #[arg(long)]
    rules: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

/// One reported issue, as printed.
#[derive(Debug, Serialize)]
struct Finding {
    path: String,
    test: bool,
    rule: String,
    severity: String,
    start_line: i32,
    start_line_offset: i32,
    end_line: i32,
    end_line_offset: i32,
    message: String,
}

/// Collects every issue the engine reports.
#[derive(Debug, Default)]
struct Collector {
    findings: Vec<Finding>,
}

impl IssueListener<()> for Collector {
    fn handle(&mut self, issue: &Issue<'_, ()>) -> Result<(), IssueError> {
        self.findings.push(Finding {
            path: issue.input_file.map(|f| f.path()).unwrap_or_default(),
            test: issue.input_file.is_some_and(|f| f.is_test()),
            rule: issue.rule_key.clone(),
            severity: issue.severity.clone(),
            start_line: issue.start_line,
            start_line_offset: issue.start_line_offset,
            end_line: issue.end_line,
            end_line_offset: issue.end_line_offset,
            message: issue.message.clone(),
        });
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Report {
    files: usize,
    failed_files: Vec<String>,
    issues: Vec<Finding>,
}

fn build_configuration(args: &Args) -> Result<AnalysisConfiguration<()>> {
    let patterns = args
        .test_patterns
        .iter()
        .map(|p| glob::Pattern::new(p).with_context(|| format!("invalid test pattern {:?}", p)))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = AnalysisConfiguration::builder(&args.base_dir);
    for path in &args.files {
        let is_test = patterns.iter().any(|p| p.matches_path(path));
        builder = builder.file(ClientInputFile::resolve(
            &args.base_dir,
            path,
            is_test,
            args.charset,
            (),
        ));
    }
    Ok(builder.build())
}

fn run(args: &Args) -> Result<Report> {
    let engine = BasicEngine::start(&EngineConfig {
        excluded_rules: args.excluded_rules.iter().cloned().collect(),
        properties: args.properties.iter().cloned().collect(),
    })
    .context("failed to start engine")?;

    let config = build_configuration(args)?;
    let mut collector = Collector::default();
    let results = engine
        .analyze(&config, &mut collector, &TracingLogOutput)
        .context("analysis failed")?;

    Ok(Report {
        files: results.file_count,
        failed_files: results.failed_files,
        issues: collector.findings,
    })
}

fn print_rules() -> Result<()> {
    let engine = BasicEngine::start(&EngineConfig::default())?;
    for key in engine.rules() {
        let Some(details) = engine.rule_details(&key) else {
            bail!("rule {} has no details", key);
        };
        println!("{:<24} {:<8} {}", details.key, details.severity, details.name);
    }
    Ok(())
}

fn print_report(report: &Report, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
        Format::Text => {
            for finding in &report.issues {
                println!(
                    "{}:{}:{}: {} [{}] {}",
                    finding.path,
                    finding.start_line,
                    finding.start_line_offset + 1,
                    finding.severity,
                    finding.rule,
                    finding.message
                );
            }
            for path in &report.failed_files {
                eprintln!("lintd: {}: could not be analyzed", path);
            }
        }
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    // Engine log lines surface as tracing events; keep them quiet by default
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let args = Args::parse();

    if args.rules {
        print_rules()?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = run(&args)?;
    print_report(&report, args.format)?;

    if report.issues.is_empty() && report.failed_files.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
