//! Error types for parsing, assigning and validating configuration records.

use crate::value::ValueKind;

/// Lexing or grammar failure in a configuration file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Failure while evaluating the right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("name `{0}` is not defined")]
    UnknownName(String),

    #[error("unsupported operand types for {op}: {lhs} and {rhs}")]
    BadOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("bad operand type for unary {op}: {operand}")]
    BadOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("result is not a finite number")]
    NotFinite,
}

/// Failure assigning a value to a named option.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown option `{0}`")]
    UnknownKey(String),

    #[error("option `{key}` expects {expected}, got {found}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: String,
    },

    #[error("option `{key}` must be non-negative, got {value}")]
    Negative { key: String, value: i64 },

    #[error("malformed override `{0}` (expected --key=value)")]
    MalformedOverride(String),
}

/// Failure turning a parsed file into a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("line {line}: {source}")]
    Eval {
        line: usize,
        #[source]
        source: EvalError,
    },

    #[error("line {line}: {source}")]
    Assign {
        line: usize,
        #[source]
        source: ConfigError,
    },
}

/// Structural rule violated by a resolved record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("`{key}` must be positive, got {value}")]
    NotPositive { key: &'static str, value: u64 },

    #[error("n_embd ({n_embd}) must be divisible by n_head ({n_head})")]
    HeadsDoNotDivide { n_embd: u64, n_head: u64 },

    #[error("Invalid dropout: {0} (must be in [0.0, 1.0))")]
    InvalidDropout(f64),

    #[error("Invalid learning rate: {0} (must be > 0.0)")]
    InvalidLearningRate(f64),

    #[error("Invalid min_lr: {min_lr} (must be in [0.0, learning_rate = {learning_rate}])")]
    InvalidMinLr { min_lr: f64, learning_rate: f64 },

    #[error("Invalid {key}: {value} (must be in [0.0, 1.0))")]
    InvalidBeta { key: &'static str, value: f64 },

    #[error("Invalid {key}: {value} (must be >= 0.0)")]
    NegativeFloat { key: &'static str, value: f64 },

    #[error("Invalid device: {0} (must be one of: cpu, cuda, cuda:<N>, mps)")]
    InvalidDevice(String),

    #[error("Invalid dtype: {0} (must be one of: float32, bfloat16, float16)")]
    InvalidDtype(String),

    #[error("Invalid init_from: {0} (must be one of: scratch, resume, gpt2, gpt2-medium, gpt2-large, gpt2-xl)")]
    InvalidInitFrom(String),

    #[error("Invalid backend: {0} (must be one of: nccl, gloo)")]
    InvalidBackend(String),

    #[error("`{0}` cannot be empty")]
    Empty(&'static str),

    #[error("warmup_iters ({warmup_iters}) exceeds lr_decay_iters ({lr_decay_iters})")]
    WarmupPastDecay {
        warmup_iters: u64,
        lr_decay_iters: u64,
    },
}
