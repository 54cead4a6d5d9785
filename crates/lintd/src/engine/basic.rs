//! The engine shipped with the daemon.

use crate::engine::rules::{ALL_RULES, DEFAULT_MAX_LINE_LENGTH, MAX_LINE_LENGTH_PROPERTY, Rule};
use crate::engine::{
    AnalysisConfiguration, AnalysisEngine, AnalysisResults, EngineConfig, EngineError, RuleDetails,
};
use crate::input::ClientInputFile;
use crate::issue::{Issue, IssueListener};
use crate::log::{Level, LogOutput};

/// A line-oriented text engine.
///
/// Runs a handful of rules over each line of each file. Files that cannot
/// be read or decoded are logged, recorded in
/// [`AnalysisResults::failed_files`] and skipped.
#[derive(Clone, Debug)]
pub struct BasicEngine {
    rules: Vec<Rule>,
    max_line_length: usize,
}

impl BasicEngine {
    fn max_line_length<T>(&self, config: &AnalysisConfiguration<T>) -> Result<usize, EngineError> {
        match config.properties().get(MAX_LINE_LENGTH_PROPERTY) {
            Some(value) => parse_line_length(value),
            None => Ok(self.max_line_length),
        }
    }

    fn analyze_contents<T>(
        &self,
        file: &ClientInputFile<T>,
        contents: &str,
        max_line_length: usize,
        listener: &mut dyn IssueListener<T>,
    ) -> Result<(), EngineError> {
        for (index, line) in contents.lines().enumerate() {
            let line_number = to_i32(index + 1);
            for rule in &self.rules {
                let Some(finding) = rule.check(line, max_line_length) else {
                    continue;
                };
                let issue = Issue {
                    start_line: line_number,
                    start_line_offset: to_i32(finding.start_column),
                    end_line: line_number,
                    end_line_offset: to_i32(finding.end_column),
                    message: finding.message,
                    rule_key: rule.key().to_string(),
                    rule_name: rule.name().to_string(),
                    severity: rule.severity().name().to_string(),
                    input_file: Some(file),
                };
                listener.handle(&issue)?;
            }
        }
        Ok(())
    }
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn parse_line_length(value: &str) -> Result<usize, EngineError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(EngineError::Config(format!(
            "{} must be a positive integer, got {:?}",
            MAX_LINE_LENGTH_PROPERTY, value
        ))),
    }
}

impl AnalysisEngine for BasicEngine {
    fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        if let Some(unknown) = config
            .excluded_rules
            .iter()
            .find(|key| Rule::from_key(key).is_none())
        {
            return Err(EngineError::Config(format!("unknown rule: {}", unknown)));
        }

        let max_line_length = match config.properties.get(MAX_LINE_LENGTH_PROPERTY) {
            Some(value) => parse_line_length(value)?,
            None => DEFAULT_MAX_LINE_LENGTH,
        };

        let rules = ALL_RULES
            .into_iter()
            .filter(|rule| !config.excluded_rules.contains(rule.key()))
            .collect();

        Ok(Self {
            rules,
            max_line_length,
        })
    }

    fn analyze<T>(
        &self,
        config: &AnalysisConfiguration<T>,
        listener: &mut dyn IssueListener<T>,
        log: &dyn LogOutput,
    ) -> Result<AnalysisResults, EngineError> {
        let max_line_length = self.max_line_length(config)?;
        if let Some(work_dir) = config.work_dir() {
            log.log(
                &format!("Using work directory {}", work_dir.display()),
                Level::Debug,
            );
        }
        let mut results = AnalysisResults {
            file_count: config.files().len(),
            failed_files: Vec::new(),
        };

        for file in config.files() {
            log.log(&format!("Analyzing {}", file.path()), Level::Debug);
            let contents = match file.contents() {
                Ok(contents) => contents,
                Err(e) => {
                    log.log(&format!("Skipping {}: {}", file.path(), e), Level::Warn);
                    results.failed_files.push(file.path());
                    continue;
                }
            };
            self.analyze_contents(file, &contents, max_line_length, listener)?;
        }

        log.log(
            &format!(
                "{} file(s) analyzed, {} failed",
                results.file_count,
                results.failed_files.len()
            ),
            Level::Info,
        );
        Ok(results)
    }

    fn rule_details(&self, rule_key: &str) -> Option<RuleDetails> {
        Rule::from_key(rule_key).map(|rule| rule.details())
    }

    fn rules(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.key().to_string()).collect()
    }
}
