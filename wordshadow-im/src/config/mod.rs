//! Engine configuration

mod settings;

pub use settings::{ConnectionSettings, DictionarySettings, InputSettings, PipelineSettings, Settings};
