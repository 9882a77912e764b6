//! Configuration validation
//!
//! Hard rules the trainer would trip over (`validate_config`) and softer
//! advisories worth printing but not failing on (`lint_config`).

use std::fmt;

use crate::error::ValidationError;
use crate::record::TrainConfig;

const DTYPES: &[&str] = &["float32", "bfloat16", "float16"];
const INIT_FROM: &[&str] = &[
    "scratch",
    "resume",
    "gpt2",
    "gpt2-medium",
    "gpt2-large",
    "gpt2-xl",
];
const BACKENDS: &[&str] = &["nccl", "gloo"];

/// `cpu`, `mps`, `cuda` or `cuda:<index>`.
pub fn is_known_device(device: &str) -> bool {
    match device {
        "cpu" | "cuda" | "mps" => true,
        _ => device
            .strip_prefix("cuda:")
            .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit())),
    }
}

/// Validate a resolved configuration record
///
/// Checks, in order:
/// - counts and sizes are positive
/// - attention heads divide the embedding width
/// - rates and coefficients are in range
/// - string options name something the trainer knows
pub fn validate_config(config: &TrainConfig) -> Result<(), ValidationError> {
    let positive = [
        ("n_layer", config.n_layer),
        ("n_head", config.n_head),
        ("n_embd", config.n_embd),
        ("block_size", config.block_size),
        ("batch_size", config.batch_size),
        ("gradient_accumulation_steps", config.gradient_accumulation_steps),
        ("eval_interval", config.eval_interval),
        ("log_interval", config.log_interval),
        ("eval_iters", config.eval_iters),
        ("max_iters", config.max_iters),
    ];
    for (key, value) in positive {
        if value == 0 {
            return Err(ValidationError::NotPositive { key, value });
        }
    }

    if config.n_embd % config.n_head != 0 {
        return Err(ValidationError::HeadsDoNotDivide {
            n_embd: config.n_embd,
            n_head: config.n_head,
        });
    }

    if !(0.0..1.0).contains(&config.dropout) {
        return Err(ValidationError::InvalidDropout(config.dropout));
    }

    if config.learning_rate.is_nan() || config.learning_rate <= 0.0 {
        return Err(ValidationError::InvalidLearningRate(config.learning_rate));
    }
    if !(0.0..=config.learning_rate).contains(&config.min_lr) {
        return Err(ValidationError::InvalidMinLr {
            min_lr: config.min_lr,
            learning_rate: config.learning_rate,
        });
    }

    for (key, value) in [("beta1", config.beta1), ("beta2", config.beta2)] {
        if !(0.0..1.0).contains(&value) {
            return Err(ValidationError::InvalidBeta { key, value });
        }
    }
    for (key, value) in [
        ("weight_decay", config.weight_decay),
        ("grad_clip", config.grad_clip),
    ] {
        if value.is_nan() || value < 0.0 {
            return Err(ValidationError::NegativeFloat { key, value });
        }
    }

    if !is_known_device(&config.device) {
        return Err(ValidationError::InvalidDevice(config.device.clone()));
    }
    if !DTYPES.contains(&config.dtype.as_str()) {
        return Err(ValidationError::InvalidDtype(config.dtype.clone()));
    }
    if !INIT_FROM.contains(&config.init_from.as_str()) {
        return Err(ValidationError::InvalidInitFrom(config.init_from.clone()));
    }
    if !BACKENDS.contains(&config.backend.as_str()) {
        return Err(ValidationError::InvalidBackend(config.backend.clone()));
    }

    if config.out_dir.trim().is_empty() {
        return Err(ValidationError::Empty("out_dir"));
    }
    if config.dataset.trim().is_empty() {
        return Err(ValidationError::Empty("dataset"));
    }

    if config.decay_lr && config.warmup_iters > config.lr_decay_iters {
        return Err(ValidationError::WarmupPastDecay {
            warmup_iters: config.warmup_iters,
            lr_decay_iters: config.lr_decay_iters,
        });
    }

    Ok(())
}

/// A soft advisory about a record that is valid but probably unintended.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Lint {
    pub key: &'static str,
    pub message: String,
}

impl fmt::Display for Lint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

pub fn lint_config(config: &TrainConfig) -> Vec<Lint> {
    let mut lints = Vec::new();

    if config.decay_lr && config.lr_decay_iters != config.max_iters {
        lints.push(Lint {
            key: "lr_decay_iters",
            message: format!(
                "{} differs from max_iters ({}); usually they are equal",
                config.lr_decay_iters, config.max_iters
            ),
        });
    }

    let expected_min = config.learning_rate / 10.0;
    if config.decay_lr && (config.min_lr - expected_min).abs() > expected_min * 1e-6 {
        lints.push(Lint {
            key: "min_lr",
            message: format!(
                "{} is not learning_rate / 10 ({expected_min})",
                config.min_lr
            ),
        });
    }

    if config.wandb_log && config.wandb_run_name.trim().is_empty() {
        lints.push(Lint {
            key: "wandb_run_name",
            message: "wandb_log is on but the run has no name".to_string(),
        });
    }

    if config.compile && config.device == "cpu" {
        lints.push(Lint {
            key: "compile",
            message: "model compilation rarely pays off on cpu".to_string(),
        });
    }

    if config.warmup_iters >= config.max_iters {
        lints.push(Lint {
            key: "warmup_iters",
            message: format!(
                "{} covers the whole run (max_iters = {})",
                config.warmup_iters, config.max_iters
            ),
        });
    }

    lints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TrainConfig {
        TrainConfig {
            device: "cpu".to_string(),
            compile: false,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&TrainConfig::default()).is_ok());
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_zero_layers() {
        let mut config = valid();
        config.n_layer = 0;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::NotPositive {
                key: "n_layer",
                value: 0
            })
        );
    }

    #[test]
    fn test_heads_must_divide_embedding() {
        let mut config = valid();
        config.n_embd = 50;
        config.n_head = 3;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::HeadsDoNotDivide { .. })
        ));
    }

    #[test]
    fn test_dropout_range() {
        let mut config = valid();
        config.dropout = 1.0;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::InvalidDropout(1.0))
        );
        config.dropout = -0.1;
        assert!(validate_config(&config).is_err());
        config.dropout = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_learning_rates() {
        let mut config = valid();
        config.learning_rate = 0.0;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidLearningRate(_))
        ));

        let mut config = valid();
        config.min_lr = config.learning_rate * 2.0;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidMinLr { .. })
        ));
    }

    #[test]
    fn test_betas() {
        let mut config = valid();
        config.beta2 = 1.0;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::InvalidBeta {
                key: "beta2",
                value: 1.0
            })
        );
    }

    #[test]
    fn test_devices() {
        for ok in ["cpu", "cuda", "cuda:1", "mps"] {
            assert!(is_known_device(ok), "{ok}");
        }
        for bad in ["gpu", "cuda:", "cuda:x", "CPU"] {
            assert!(!is_known_device(bad), "{bad}");
        }
        let mut config = valid();
        config.device = "tpu".to_string();
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::InvalidDevice("tpu".to_string()))
        );
    }

    #[test]
    fn test_string_enums() {
        let mut config = valid();
        config.dtype = "float64".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidDtype(_))
        ));

        let mut config = valid();
        config.init_from = "gpt3".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidInitFrom(_))
        ));

        let mut config = valid();
        config.out_dir = " ".to_string();
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::Empty("out_dir"))
        );
    }

    #[test]
    fn test_warmup_only_checked_when_decaying() {
        let mut config = valid();
        config.warmup_iters = 10;
        config.lr_decay_iters = 5;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::WarmupPastDecay { .. })
        ));
        config.decay_lr = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_beta1_range() {
        let mut config = valid();
        config.beta1 = -0.1;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::InvalidBeta {
                key: "beta1",
                value: -0.1
            })
        );
        config.beta1 = 1.0;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidBeta { key: "beta1", .. })
        ));
    }

    #[test]
    fn test_negative_weight_decay() {
        let mut config = valid();
        config.weight_decay = -0.01;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::NegativeFloat {
                key: "weight_decay",
                value: -0.01
            })
        );
    }

    #[test]
    fn test_negative_grad_clip() {
        let mut config = valid();
        config.grad_clip = -1.0;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::NegativeFloat {
                key: "grad_clip",
                value: -1.0
            })
        );
        config.grad_clip = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_backend() {
        let mut config = valid();
        config.backend = "mpi".to_string();
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::InvalidBackend("mpi".to_string()))
        );
        config.backend = "gloo".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_dataset() {
        let mut config = valid();
        config.dataset = String::new();
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::Empty("dataset"))
        );
    }

    fn lint_keys(config: &TrainConfig) -> Vec<&'static str> {
        lint_config(config).into_iter().map(|l| l.key).collect()
    }

    #[test]
    fn test_lint_min_lr_not_a_tenth() {
        let mut config = TrainConfig::default();
        config.min_lr = 0.0;
        assert_eq!(lint_keys(&config), vec!["min_lr"]);

        config.decay_lr = false;
        assert!(lint_keys(&config).is_empty());
    }

    #[test]
    fn test_lint_wandb_without_run_name() {
        let mut config = TrainConfig::default();
        config.wandb_log = true;
        assert!(lint_keys(&config).is_empty());
        config.wandb_run_name = "  ".to_string();
        assert_eq!(lint_keys(&config), vec!["wandb_run_name"]);
    }

    #[test]
    fn test_lint_warmup_covers_run() {
        let mut config = TrainConfig::default();
        config.max_iters = 1000;
        config.lr_decay_iters = 1000;
        config.warmup_iters = 1000;
        assert_eq!(lint_keys(&config), vec!["warmup_iters"]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_lints() {
        let config = TrainConfig::default();
        assert!(lint_config(&config).is_empty());

        let mut config = TrainConfig::default();
        config.lr_decay_iters = 1000;
        config.device = "cpu".to_string();
        let keys: Vec<_> = lint_config(&config).into_iter().map(|l| l.key).collect();
        assert_eq!(keys, vec!["lr_decay_iters", "compile"]);
    }
}
