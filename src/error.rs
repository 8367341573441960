use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Structural failures of the engine.
/// "Not provable" is never an error; it is `Outcome::Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // An operator is used that no visible scope declares.
    UndeclaredOperator(String),

    // A fixed argument names a variable that no visible scope declares.
    UndeclaredVariable(String),

    // (operator, expected, got)
    ArityMismatch(String, usize, usize),

    // A variable, operator, composite, pattern variable or lemma is declared twice.
    AlreadyDeclared(String),

    // A requirement layer binds a name that an enclosing layer of the same fact already binds.
    DoubleBoundFreeVariable(String),

    // Negated implications carry no derivable consequences.
    CannotCheckNegatedImplication(String),
    CannotStoreNegatedImplication(String),

    // The checker recursed past the configured ceiling.
    RecursionLimitExceeded(usize),

    // A "by" statement names a lemma that was never recorded.
    UnknownLemma(String),

    // A pattern variable carries a regular expression that does not compile.
    InvalidPattern(String, String),

    // Something went wrong that the categories above don't cover.
    EvaluationError(String),
}

impl Error {
    pub fn evaluation<T: Into<String>>(s: T) -> Error {
        Error::EvaluationError(s.into())
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Error::UndeclaredOperator(_) => "UndeclaredOperator",
            Error::UndeclaredVariable(_) => "UndeclaredVariable",
            Error::ArityMismatch(..) => "ArityMismatch",
            Error::AlreadyDeclared(_) => "AlreadyDeclared",
            Error::DoubleBoundFreeVariable(_) => "DoubleBoundFreeVariable",
            Error::CannotCheckNegatedImplication(_) => "CannotCheckNegatedImplication",
            Error::CannotStoreNegatedImplication(_) => "CannotStoreNegatedImplication",
            Error::RecursionLimitExceeded(_) => "RecursionLimitExceeded",
            Error::UnknownLemma(_) => "UnknownLemma",
            Error::InvalidPattern(..) => "InvalidPattern",
            Error::EvaluationError(_) => "EvaluationError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UndeclaredOperator(name) => write!(f, "operator '{}' is not declared", name),
            Error::UndeclaredVariable(name) => write!(f, "variable '{}' is not declared", name),
            Error::ArityMismatch(name, expected, got) => write!(
                f,
                "'{}' requires {} arguments, but {} were given",
                name, expected, got
            ),
            Error::AlreadyDeclared(name) => write!(
                f,
                "'{}' is already declared in this environment or a parent environment",
                name
            ),
            Error::DoubleBoundFreeVariable(name) => write!(
                f,
                "free variable '{}' is bound by more than one layer of the same fact",
                name
            ),
            Error::CannotCheckNegatedImplication(s) => {
                write!(f, "cannot check a negated implication: {}", s)
            }
            Error::CannotStoreNegatedImplication(s) => {
                write!(f, "cannot store a negated implication: {}", s)
            }
            Error::RecursionLimitExceeded(depth) => {
                write!(f, "recursion limit of {} exceeded while checking", depth)
            }
            Error::UnknownLemma(name) => write!(f, "no known fact is named '{}'", name),
            Error::InvalidPattern(name, message) => {
                write!(f, "invalid pattern for '{}': {}", name, message)
            }
            Error::EvaluationError(s) => write!(f, "evaluation error: {}", s),
        }
    }
}

impl std::error::Error for Error {}
