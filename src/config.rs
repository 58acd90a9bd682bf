//! Input loading: values documents, rules files and project settings

pub mod rules_file;
pub mod settings;
pub mod values;

pub use settings::{GenerateSettings, SETTINGS_FILE, Settings, ValidateSettings};
