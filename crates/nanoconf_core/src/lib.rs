//! Nanoconf Core
//!
//! Typed model of the flat training-configuration files read by the
//! character-level GPT trainer: parsing, overrides, validation and a few
//! derived views (learning-rate schedule, size estimates).

pub mod error;
pub mod estimate;
pub mod loader;
pub mod overrides;
pub mod parser;
pub mod presets;
pub mod record;
pub mod render;
pub mod schedule;
pub mod validate;
pub mod value;

pub use error::{ConfigError, EvalError, LoadError, ParseError, ValidationError};
pub use estimate::{MemoryEstimate, MemoryTier, SizeEstimate};
pub use loader::{apply_file, load_config, write_config};
pub use overrides::{resolve_args, Resolved, Source};
pub use parser::{Assignment, ConfigFile, Expr};
pub use presets::Preset;
pub use record::{FieldDiff, TrainConfig};
pub use render::{render_json, render_python};
pub use schedule::LrSchedule;
pub use validate::{lint_config, validate_config, Lint};
pub use value::{Value, ValueKind};
