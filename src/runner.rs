use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::checker::Outcome;
use crate::config::RunnerConfig;
use crate::interpreter::Session;
use crate::report::Report;
use crate::syntax::statement::Statement;

/// The file extension for source files.
pub const EXTENSION: &str = "lix";

/// What happened to one top-level statement.
#[derive(Clone, Debug, Serialize)]
pub struct StatementReport {
    pub line: u32,
    pub statement: String,

    // None when the statement failed with an error.
    pub outcome: Option<Outcome>,

    pub error: Option<String>,

    // The trace lines the statement produced.
    pub messages: Vec<String>,
}

/// Output from running one source.
#[derive(Debug, Default, Serialize)]
pub struct RunOutput {
    /// Where the source came from, if it was a file.
    pub path: Option<PathBuf>,

    pub reports: Vec<StatementReport>,

    /// A parse error means no statement was run.
    pub parse_error: Option<String>,
}

impl RunOutput {
    pub fn num_errors(&self) -> usize {
        self.reports.iter().filter(|r| r.error.is_some()).count()
    }

    /// How many statements ended with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome == Some(outcome))
            .count()
    }

    pub fn outcomes(&self) -> Vec<Option<Outcome>> {
        self.reports.iter().map(|r| r.outcome).collect()
    }

    /// Unknown and False outcomes are reported, but only errors make a run fail.
    pub fn is_success(&self) -> bool {
        self.parse_error.is_none() && self.num_errors() == 0
    }

    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "<input>".to_string(),
        }
    }

    /// The human-readable form the CLI prints: one line per statement, then its trace indented.
    pub fn lines(&self) -> Vec<String> {
        let name = self.display_name();
        if let Some(e) = &self.parse_error {
            return vec![format!("{}: parse error: {}", name, e)];
        }
        let mut lines = vec![];
        for report in &self.reports {
            match (&report.outcome, &report.error) {
                (_, Some(error)) => {
                    lines.push(format!("{}, line {}: error: {}", name, report.line, error))
                }
                (Some(outcome), None) => lines.push(format!(
                    "{}, line {}: {}: {}",
                    name, report.line, report.statement, outcome
                )),
                (None, None) => {}
            }
            for message in &report.messages {
                lines.push(format!("    {}", message));
            }
        }
        lines
    }
}

/// Whether interactive input forms whole statements yet.
/// That happens once its braces balance and it ends in ';' or '}'.
pub fn is_complete(buffer: &str) -> bool {
    let mut depth = 0i32;
    for c in buffer.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }
    let trimmed = buffer.trim_end();
    depth <= 0 && (trimmed.ends_with(';') || trimmed.ends_with('}'))
}

/// The Runner parses sources and executes them statement by statement.
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runs source text in a fresh session.
    pub fn run_source(&self, text: &str) -> RunOutput {
        let mut session = Session::new(self.config.checker.clone());
        self.run_in(&mut session, text)
    }

    /// Runs source text in an existing session, so earlier statements stay known.
    pub fn run_in(&self, session: &mut Session, text: &str) -> RunOutput {
        let statements = match Statement::parse_all(text) {
            Ok(statements) => statements,
            Err(e) => {
                return RunOutput {
                    parse_error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };

        let mut output = RunOutput::default();
        for statement in &statements {
            let mut report = Report::new();
            let result = session.execute(statement, &mut report);
            let failed = result.is_err();
            let (outcome, error) = match result {
                Ok(outcome) => (Some(outcome), None),
                Err(e) => (None, Some(format!("{}: {}", e.error_type(), e))),
            };
            output.reports.push(StatementReport {
                line: statement.first_line,
                statement: statement.to_string(),
                outcome,
                error,
                messages: report.drain(),
            });
            if failed && self.config.fail_fast {
                debug!(line = statement.first_line, "stopping at the first error");
                break;
            }
        }
        output
    }

    pub fn run_file(&self, path: &Path) -> Result<RunOutput, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
        let mut output = self.run_source(&text);
        output.path = Some(path.to_path_buf());
        Ok(output)
    }

    /// Runs a single file, or every source file under a directory in path order.
    pub fn run_path(&self, path: &Path) -> Result<Vec<RunOutput>, String> {
        if !path.is_dir() {
            return Ok(vec![self.run_file(path)?]);
        }
        let mut files = vec![];
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| format!("error walking {}: {}", path.display(), e))?;
            if entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| ext == EXTENSION)
            {
                files.push(entry.into_path());
            }
        }
        if files.is_empty() {
            warn!(path = %path.display(), "no source files found");
        }
        let mut outputs = vec![];
        for file in files {
            let output = self.run_file(&file)?;
            let failed = !output.is_success();
            outputs.push(output);
            if failed && self.config.fail_fast {
                break;
            }
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use indoc::indoc;

    const SOCRATES: &str = indoc! {"
        def mortal(x);
        def human(x) => {mortal(x)};
        let Socrates: human(Socrates);
        mortal(Socrates);
    "};

    #[test]
    fn test_runner_reports_each_statement() {
        let runner = Runner::new(RunnerConfig::default());
        let output = runner.run_source(SOCRATES);
        assert!(output.is_success());
        assert_eq!(output.reports.len(), 4);
        assert_eq!(output.count(Outcome::True), 4);
        let last = &output.reports[3];
        assert_eq!(last.line, 4);
        assert_eq!(last.statement, "mortal(Socrates);");
        assert!(last.messages.iter().any(|m| m.contains("checked by")));
    }

    #[test]
    fn test_runner_keeps_going_after_errors() {
        let runner = Runner::new(RunnerConfig::default());
        let output = runner.run_source("def p(x); let a; p(b); p(a);");
        assert!(!output.is_success());
        assert_eq!(output.num_errors(), 1);
        assert_eq!(
            output.outcomes(),
            vec![Some(Outcome::True), Some(Outcome::True), None, Some(Outcome::Unknown)]
        );
        assert!(output.reports[2]
            .error
            .as_ref()
            .unwrap()
            .starts_with("UndeclaredVariable"));
    }

    #[test]
    fn test_fail_fast_stops() {
        let config = RunnerConfig {
            fail_fast: true,
            ..Default::default()
        };
        let output = Runner::new(config).run_source("def p(x); p(b); let a;");
        assert_eq!(output.reports.len(), 2);
    }

    #[test]
    fn test_parse_error_runs_nothing() {
        let output = Runner::new(RunnerConfig::default()).run_source("def p(x);\nlet a\n");
        assert!(output.reports.is_empty());
        assert!(output.parse_error.unwrap().starts_with("line 2"));
    }

    #[test]
    fn test_run_path_walks_directories() {
        let temp = TempDir::new().unwrap();
        temp.child("a.lix").write_str(SOCRATES).unwrap();
        temp.child("nested").create_dir_all().unwrap();
        temp.child("nested/b.lix").write_str("def p(x); let a; p(a);").unwrap();
        temp.child("notes.txt").write_str("not a source file").unwrap();

        let runner = Runner::new(RunnerConfig::default());
        let outputs = runner.run_path(temp.path()).unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(outputs[0].display_name().ends_with("a.lix"));
        assert!(outputs[0].is_success());
        assert_eq!(outputs[1].count(Outcome::Unknown), 1);

        let single = runner.run_path(&temp.path().join("a.lix")).unwrap();
        assert_eq!(single.len(), 1);
        assert!(runner.run_path(&temp.path().join("missing.lix")).is_err());
        temp.close().unwrap();
    }

    #[test]
    fn test_output_lines() {
        let output = Runner::new(RunnerConfig::default()).run_source("def p(x);\nlet a;\np(b);\np(a);");
        let lines = output.lines();
        assert_eq!(lines[0], "<input>, line 1: def p(x);: True");
        assert!(lines
            .iter()
            .any(|line| line.starts_with("<input>, line 3: error: UndeclaredVariable")));
        assert_eq!(
            lines.iter().filter(|line| !line.starts_with("    ")).last().map(|l| l.as_str()),
            Some("<input>, line 4: p(a);: Unknown")
        );
        assert!(lines.iter().any(|line| line.starts_with("    ")));

        let broken = Runner::new(RunnerConfig::default()).run_source("let a\n");
        assert_eq!(broken.lines().len(), 1);
        assert!(broken.lines()[0].starts_with("<input>: parse error: "));
    }

    #[test]
    fn test_is_complete() {
        assert!(is_complete("def p(x);\n"));
        assert!(is_complete("{ let a; }\n"));
        assert!(!is_complete("let a\n"));
        assert!(!is_complete("prove p(a) {\n  p(a);\n"));
        assert!(is_complete("prove p(a) {\n  p(a);\n}\n"));
        assert!(!is_complete(""));
    }

    #[test]
    fn test_reports_serialize() {
        let output = Runner::new(RunnerConfig::default()).run_source(SOCRATES);
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"outcome\":\"True\""));
    }
}
