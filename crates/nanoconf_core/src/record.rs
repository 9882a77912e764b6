//! TrainConfig - the Training Configuration Record
//!
//! One field per option the trainer reads. Defaults are the trainer's own
//! defaults, so a configuration file only needs to list what it changes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::value::{Value, ValueKind};

/// Conversion between a typed field and a loosely typed [`Value`].
trait FieldValue: Sized {
    const KIND: ValueKind;
    fn to_value(&self) -> Value;
    fn from_value(key: &str, value: Value) -> Result<Self, ConfigError>;
}

fn mismatch(key: &str, expected: ValueKind, found: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: format!("{} ({})", found.render_python(), found.type_name()),
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(key: &str, value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(key, Self::KIND, &other)),
        }
    }
}

impl FieldValue for u64 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        // counts never get near i64::MAX in practice; saturate rather than wrap
        Value::Int(i64::try_from(*self).unwrap_or(i64::MAX))
    }

    fn from_value(key: &str, value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Int(i) => u64::try_from(i).map_err(|_| ConfigError::Negative {
                key: key.to_string(),
                value: i,
            }),
            other => Err(mismatch(key, Self::KIND, &other)),
        }
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(key: &str, value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Float(x) => Ok(x),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch(key, Self::KIND, &other)),
        }
    }
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Str;

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(key: &str, value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(key, Self::KIND, &other)),
        }
    }
}

/// One option whose value differs between two records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub key: &'static str,
    pub left: Value,
    pub right: Value,
}

macro_rules! train_config {
    ($( $(#[$meta:meta])* $name:ident : $ty:ty = $default:expr ),* $(,)?) => {
        /// Training Configuration Record
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct TrainConfig {
            $( $(#[$meta])* pub $name: $ty, )*
        }

        impl Default for TrainConfig {
            fn default() -> Self {
                Self { $( $name: $default, )* }
            }
        }

        impl TrainConfig {
            /// Option names in canonical order.
            pub const KEYS: &'static [&'static str] = &[ $( stringify!($name), )* ];

            /// Expected type of an option, `None` for unknown names.
            pub fn kind_of(key: &str) -> Option<ValueKind> {
                match key {
                    $( stringify!($name) => Some(<$ty as FieldValue>::KIND), )*
                    _ => None,
                }
            }

            /// Reads an option by name.
            pub fn get(&self, key: &str) -> Option<Value> {
                match key {
                    $( stringify!($name) => Some(self.$name.to_value()), )*
                    _ => None,
                }
            }

            /// Assigns an option by name. Integers are accepted for float
            /// options; every other type must match exactly.
            pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
                match key {
                    $(
                        stringify!($name) => {
                            self.$name = <$ty as FieldValue>::from_value(key, value)?;
                            Ok(())
                        }
                    )*
                    _ => Err(ConfigError::UnknownKey(key.to_string())),
                }
            }
        }
    };
}

train_config! {
    // I/O
    out_dir: String = "out".to_string(),
    eval_interval: u64 = 2000,
    log_interval: u64 = 1,
    eval_iters: u64 = 200,
    /// Exit right after the first evaluation
    eval_only: bool = false,
    always_save_checkpoint: bool = true,
    /// `scratch`, `resume` or a `gpt2*` checkpoint name
    init_from: String = "scratch".to_string(),

    // wandb logging
    wandb_log: bool = false,
    wandb_project: String = "owt".to_string(),
    wandb_run_name: String = "gpt2".to_string(),

    // data
    dataset: String = "openwebtext".to_string(),
    gradient_accumulation_steps: u64 = 40,
    batch_size: u64 = 12,
    block_size: u64 = 1024,

    // model
    n_layer: u64 = 12,
    n_head: u64 = 12,
    n_embd: u64 = 768,
    dropout: f64 = 0.0,
    bias: bool = false,

    // adamw optimizer
    learning_rate: f64 = 6e-4,
    max_iters: u64 = 600_000,
    weight_decay: f64 = 1e-1,
    beta1: f64 = 0.9,
    beta2: f64 = 0.95,
    /// 0.0 disables clipping
    grad_clip: f64 = 1.0,

    // learning rate decay
    decay_lr: bool = true,
    warmup_iters: u64 = 2000,
    lr_decay_iters: u64 = 600_000,
    min_lr: f64 = 6e-5,

    // system
    backend: String = "nccl".to_string(),
    device: String = "cuda".to_string(),
    dtype: String = "bfloat16".to_string(),
    compile: bool = true,
}

impl TrainConfig {
    pub fn keys() -> &'static [&'static str] {
        Self::KEYS
    }

    pub fn is_known(key: &str) -> bool {
        Self::kind_of(key).is_some()
    }

    /// Options whose values differ, in canonical order.
    pub fn diff(&self, other: &TrainConfig) -> Vec<FieldDiff> {
        Self::KEYS
            .iter()
            .filter_map(|&key| {
                let left = self.get(key)?;
                let right = other.get(key)?;
                (left != right).then_some(FieldDiff { key, left, right })
            })
            .collect()
    }

    /// Options that differ from the trainer defaults.
    pub fn changed_from_default(&self) -> Vec<FieldDiff> {
        Self::default().diff(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
