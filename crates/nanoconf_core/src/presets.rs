//! Shipped configuration files
//!
//! The two files under `configs/` are embedded so the CLI can list and
//! materialize them without the source tree at hand.

use crate::error::LoadError;
use crate::parser::ConfigFile;
use crate::record::TrainConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Baby character-level shakespeare model
    ShakespeareCharMini,
    /// Same model, annotated against the bbycroft.net/llm walkthrough
    ShakespeareCharBbycroft,
}

impl Preset {
    pub fn all() -> &'static [Preset] {
        &[Preset::ShakespeareCharMini, Preset::ShakespeareCharBbycroft]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::ShakespeareCharMini => "shakespeare_char_mini",
            Preset::ShakespeareCharBbycroft => "shakespeare_char_bbycroft",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Preset::ShakespeareCharMini => "train_shakespeare_char_mini.py",
            Preset::ShakespeareCharBbycroft => "train_shakespeare_char_bbycroft.py",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Preset::ShakespeareCharMini => {
                include_str!("../../../configs/train_shakespeare_char_mini.py")
            }
            Preset::ShakespeareCharBbycroft => {
                include_str!("../../../configs/train_shakespeare_char_bbycroft.py")
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Preset> {
        let name = name.trim_end_matches(".py");
        let name = name.strip_prefix("train_").unwrap_or(name);
        Self::all().iter().copied().find(|p| p.name() == name)
    }

    /// Parses and resolves the embedded file on top of the trainer defaults.
    pub fn config(&self) -> Result<TrainConfig, LoadError> {
        ConfigFile::parse(self.source())?.resolve()
    }
}
