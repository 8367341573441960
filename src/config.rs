/// Options that affect how the checker evaluates propositions.
#[derive(Clone, Debug)]
pub struct CheckerConfig {
    // How deeply checks may nest before we give up with RecursionLimitExceeded.
    // Each requirement, premise or alternative that gets checked counts as one level.
    pub max_depth: usize,

    // Whether an Unknown atomic check is retried as its negation.
    // Turning this off makes the checker three-valued: it never answers False.
    pub polarity_fallback: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            polarity_fallback: true,
        }
    }
}

/// Options for running whole sources.
#[derive(Clone, Debug, Default)]
pub struct RunnerConfig {
    pub checker: CheckerConfig,

    // Stop at the first statement that errors, instead of reporting and moving on.
    pub fail_fast: bool,
}
