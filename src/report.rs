use std::fmt;

/// The human-readable trace of what the engine did.
///
/// Every core call takes the report it should write into, rather than hiding messages
/// inside the environment. Callers decide what to keep: the runner drains one report per
/// statement, and the proof code folds a nested block's lines into the outer report with
/// a prefix.
#[derive(Clone, Debug, Default)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Report {
        Report { lines: vec![] }
    }

    pub fn note<T: Into<String>>(&mut self, line: T) {
        self.lines.push(line.into());
    }

    /// Appends every line from another report, each one prefixed with a tag like "[prove]".
    pub fn absorb(&mut self, prefix: &str, other: Report) {
        for line in other.lines {
            self.lines.push(format!("{} {}", prefix, line));
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    /// Empties the report, handing back what it held.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
