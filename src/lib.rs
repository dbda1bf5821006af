pub mod utils;
pub mod pipeline;
pub mod config;
pub mod helper;
pub mod modules;

pub use crate::config::config::{AnnotationConfig, BodySide, PipelineConfig};
pub use crate::modules::pose_detector::{PoseDetector, ReplayDetector};
pub use crate::pipeline::pipeline::{artifact_names, PipelineReport, PipelineState, PosePipeline};
pub use crate::utils::coordinate::{FrameLandmarks, Landmark, LandmarkSequence, PoseLandmark};
