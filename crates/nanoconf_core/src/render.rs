//! Emitting configuration records as assignment files or JSON.

use crate::record::TrainConfig;

/// One `key = literal` line per option in canonical order. With
/// `only_changed`, options still at their default are left out.
pub fn render_python(config: &TrainConfig, only_changed: bool) -> String {
    let defaults = TrainConfig::default();
    let mut out = String::new();
    for key in TrainConfig::keys() {
        let Some(value) = config.get(key) else {
            continue;
        };
        if only_changed && defaults.get(key).as_ref() == Some(&value) {
            continue;
        }
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(&value.render_python());
        out.push('\n');
    }
    out
}

pub fn render_json(config: &TrainConfig) -> serde_json::Result<String> {
    serde_json::to_string_pretty(config)
}
