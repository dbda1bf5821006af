use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};

/// BodySide selects which kinematic chain is annotated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodySide {
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationConfig {
    pub side: BodySide,
    pub frame_label_origin: (i32, i32),
    pub frame_label_scale: f64,
    pub angle_label_scale: f64,
    pub thickness: i32,
}

impl AnnotationConfig {
    pub fn new() -> Self {
        AnnotationConfig {
            side: BodySide::Left,
            frame_label_origin: (10, 60),
            frame_label_scale: 0.7,
            angle_label_scale: 0.5,
            thickness: 2,
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        AnnotationConfig::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub annotation: AnnotationConfig,
    pub fourcc: String,
}

impl PipelineConfig {
    pub fn new() -> Self {
        PipelineConfig {
            annotation: AnnotationConfig::new(),
            fourcc: "mp4v".to_string(),
        }
    }

    /// from_json_file loads a pipeline configuration from disk.
    ///
    /// # Arguments
    /// * `path` - path of a JSON document with the same shape as `PipelineConfig`
    ///
    /// # Returns
    /// * `Result<PipelineConfig, Error>`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("cannot open pipeline config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))?;
        if config.fourcc.chars().count() != 4 {
            return Err(Error::msg(format!("codec tag `{}` must have exactly four characters", config.fourcc)))
        }
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::new()
    }
}
