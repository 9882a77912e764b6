//! Command-line configurator
//!
//! Arguments are processed left to right. A bare argument names a
//! configuration file that is applied immediately; `--key=value` overrides a
//! single option. Values are read as plain literals when possible and fall
//! back to strings, so `--device=cpu` and `--device='cpu'` mean the same.
//! Arithmetic is not evaluated: `--n_layer=2*3` is the string `'2*3'`.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

use crate::error::ConfigError;
use crate::loader::apply_file;
use crate::parser::parse_expr;
use crate::record::TrainConfig;
use crate::value::Value;

/// Where a piece of the resolved record came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    File(PathBuf),
    Override { key: String, value: Value },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "file {}", path.display()),
            Source::Override { key, value } => {
                write!(f, "override {key} = {}", value.render_python())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub config: TrainConfig,
    pub sources: Vec<Source>,
}

/// Splits `--key=value` and reads the value.
pub fn parse_override(arg: &str) -> Result<(String, Value), ConfigError> {
    let body = arg
        .strip_prefix("--")
        .ok_or_else(|| ConfigError::MalformedOverride(arg.to_string()))?;
    let (key, raw) = body
        .split_once('=')
        .ok_or_else(|| ConfigError::MalformedOverride(arg.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::MalformedOverride(arg.to_string()));
    }
    Ok((key.to_string(), override_value(raw)))
}

fn override_value(raw: &str) -> Value {
    parse_expr(raw)
        .ok()
        .filter(|expr| expr.is_literal())
        .and_then(|expr| expr.eval_literal().ok())
        .unwrap_or_else(|| Value::Str(raw.to_string()))
}

/// Applies a single override, checking the key and type.
pub fn apply_override(config: &mut TrainConfig, arg: &str) -> Result<(String, Value), ConfigError> {
    let (key, value) = parse_override(arg)?;
    if !TrainConfig::is_known(&key) {
        return Err(ConfigError::UnknownKey(key));
    }
    config.set(&key, value.clone())?;
    Ok((key, value))
}

/// Resolves configurator arguments on top of `base`.
pub fn resolve_onto<I, S>(base: TrainConfig, args: I) -> Result<Resolved>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = base;
    let mut sources = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        if arg.starts_with("--") {
            let (key, value) = apply_override(&mut config, arg)?;
            info!("Overriding: {} = {}", key, value.render_python());
            sources.push(Source::Override { key, value });
        } else {
            let path = PathBuf::from(arg);
            info!("Overriding config with {}", path.display());
            apply_file(&path, &mut config)?;
            sources.push(Source::File(path));
        }
    }

    Ok(Resolved { config, sources })
}

/// Resolves configurator arguments on top of the trainer defaults.
pub fn resolve_args<I, S>(args: I) -> Result<Resolved>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    resolve_onto(TrainConfig::default(), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override_values() {
        assert_eq!(
            parse_override("--batch_size=32").unwrap(),
            ("batch_size".to_string(), Value::Int(32))
        );
        assert_eq!(
            parse_override("--compile=False").unwrap().1,
            Value::Bool(false)
        );
        assert_eq!(parse_override("--device=cpu").unwrap().1, Value::from("cpu"));
        assert_eq!(
            parse_override("--device='cuda:1'").unwrap().1,
            Value::from("cuda:1")
        );
        assert_eq!(
            parse_override("--out_dir=out-shakespeare").unwrap().1,
            Value::from("out-shakespeare")
        );
        assert_eq!(
            parse_override("--learning_rate=1e-3").unwrap().1,
            Value::Float(1e-3)
        );
        assert_eq!(parse_override("--wandb_run_name=").unwrap().1, Value::from(""));
        assert_eq!(parse_override("--min_lr=-1e-4").unwrap().1, Value::Float(-1e-4));
    }

    #[test]
    fn test_override_arithmetic_is_not_evaluated() {
        assert_eq!(parse_override("--n_layer=2*3").unwrap().1, Value::from("2*3"));
        assert_eq!(
            parse_override("--max_iters=(5000)").unwrap().1,
            Value::from("(5000)")
        );

        let mut config = TrainConfig::default();
        assert!(matches!(
            apply_override(&mut config, "--n_layer=2*3"),
            Err(ConfigError::TypeMismatch { .. })
        ));
        assert_eq!(config.n_layer, 12);
    }

    #[test]
    fn test_malformed_overrides() {
        for bad in ["--batch_size", "batch_size=3", "--=3"] {
            assert!(
                matches!(parse_override(bad), Err(ConfigError::MalformedOverride(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_apply_override_checks_key_and_type() {
        let mut config = TrainConfig::default();
        assert_eq!(
            apply_override(&mut config, "--n_layers=3").unwrap_err(),
            ConfigError::UnknownKey("n_layers".to_string())
        );
        assert!(matches!(
            apply_override(&mut config, "--batch_size=big"),
            Err(ConfigError::TypeMismatch { .. })
        ));
        apply_override(&mut config, "--dropout=0").unwrap();
        assert_eq!(config.dropout, 0.0);
    }

    #[test]
    fn test_resolve_in_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("c.py");
        std::fs::write(&path, "batch_size = 64\nn_layer = 3\n")?;
        let path_str = path.to_string_lossy().to_string();

        let resolved = resolve_args(["--batch_size=8", path_str.as_str(), "--n_layer=6"])?;
        // the file was applied after the first override and wins for batch_size
        assert_eq!(resolved.config.batch_size, 64);
        assert_eq!(resolved.config.n_layer, 6);
        assert_eq!(resolved.sources.len(), 3);
        assert_eq!(resolved.sources[1], Source::File(path));
        Ok(())
    }
}
