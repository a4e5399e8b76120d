use crate::renderer::MAX_VERTEX_LIMIT;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Capacity of every batch handed out by the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "BatchSettings::default_vertex_limit")]
    pub vertex_limit: usize,
    #[serde(default = "BatchSettings::default_index_limit")]
    pub index_limit: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            vertex_limit: Self::default_vertex_limit(),
            index_limit: Self::default_index_limit(),
        }
    }
}

impl BatchSettings {
    pub fn load() -> Self {
        Self::load_from_path("batch_settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<BatchSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded batch settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default batch settings.",
                        path, err
                    );
                    BatchSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Batch settings file {:?} not found. Using default settings.",
                    path
                );
                BatchSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default batch settings.",
                    path, err
                );
                BatchSettings::default()
            }
        }
    }

    pub(crate) fn validate(mut self) -> Self {
        if self.vertex_limit == 0 {
            warn!("Vertex limit must be greater than zero. Using default value.");
            self.vertex_limit = Self::default_vertex_limit();
        }

        if self.vertex_limit > MAX_VERTEX_LIMIT {
            warn!(
                "Vertex limit {} exceeds what 16-bit indices can address. Clamping to {}.",
                self.vertex_limit, MAX_VERTEX_LIMIT
            );
            self.vertex_limit = MAX_VERTEX_LIMIT;
        }

        if self.index_limit == 0 {
            warn!("Index limit must be greater than zero. Using default value.");
            self.index_limit = Self::default_index_limit();
        }

        self
    }

    const fn default_vertex_limit() -> usize {
        4096
    }

    const fn default_index_limit() -> usize {
        6144
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("geometry_batcher_{}_{}", std::process::id(), name))
    }

    #[test]
    fn validate_replaces_zero_limits() {
        let validated = BatchSettings {
            vertex_limit: 0,
            index_limit: 0,
        }
        .validate();

        assert_eq!(validated, BatchSettings::default());
    }

    #[test]
    fn validate_clamps_vertex_limit() {
        let validated = BatchSettings {
            vertex_limit: 1 << 20,
            index_limit: 300,
        }
        .validate();

        assert_eq!(validated.vertex_limit, MAX_VERTEX_LIMIT);
        assert_eq!(validated.index_limit, 300);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings: BatchSettings = serde_json::from_str(r#"{ "index_limit": 96 }"#).unwrap();
        assert_eq!(settings.vertex_limit, BatchSettings::default().vertex_limit);
        assert_eq!(settings.index_limit, 96);
    }

    #[test]
    fn load_from_path_reads_and_validates() {
        let path = temp_path("valid.json");
        fs::write(&path, r#"{ "vertex_limit": 0, "index_limit": 120 }"#).unwrap();

        let settings = BatchSettings::load_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(settings.vertex_limit, BatchSettings::default().vertex_limit);
        assert_eq!(settings.index_limit, 120);
    }

    #[test]
    fn unparsable_or_missing_file_falls_back_to_defaults() {
        let path = temp_path("broken.json");
        fs::write(&path, "vertex_limit = 12").unwrap();
        let broken = BatchSettings::load_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(broken, BatchSettings::default());
        assert_eq!(
            BatchSettings::load_from_path(temp_path("does_not_exist.json")),
            BatchSettings::default()
        );
    }
}
