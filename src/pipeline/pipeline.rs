use std::path::Path;
use anyhow::Error;
use log::{info, warn};
use crate::config::config::PipelineConfig;
use crate::helper::pose_helper::PoseAnnotator;
use crate::modules::pose_detector::PoseDetector;
use crate::modules::video_io::{FrameSink, FrameSinkFactory, FrameSource, FrameSourceFactory, VideoFile, VideoFileSinkFactory, VideoInfo};
use crate::pipeline::extraction::extract_pose_landmarks;
use crate::utils::coordinate::LandmarkSequence;
use crate::utils::serialization::write_landmarks;

/// PipelineState tracks the progress of one run; transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Serialized,
    Rendering,
    Done,
}

/// PipelineReport summarizes a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub video: VideoInfo,
    pub frames_read: usize,
    pub frames_detected: usize,
    pub frames_written: usize,
    pub landmarks: LandmarkSequence,
}

/// ArtifactNames are the published names of the two outputs of one input video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub video: String,
    pub landmarks: String,
}

/// artifact_names derives `{stem}-video.mp4` and `{stem}-landmarks.json` from the input path.
pub fn artifact_names<P: AsRef<Path>>(input_path: P) -> Result<ArtifactNames, Error> {
    let input_path = input_path.as_ref();
    let stem = match input_path.file_stem().and_then(|stem| stem.to_str()) {
        None => return Err(Error::msg(format!("cannot derive a base name from {}", input_path.display()))),
        Some(stem) => stem,
    };
    Ok(ArtifactNames {
        video: format!("{stem}-video.mp4"),
        landmarks: format!("{stem}-landmarks.json"),
    })
}

/// CreatedOutputs records which artifacts the current run has produced.
#[derive(Debug, Default)]
struct CreatedOutputs {
    landmarks: bool,
    video: bool,
}

#[derive(Debug, Clone)]
pub struct PosePipeline<D: PoseDetector> {
    detector: D,
    annotator: PoseAnnotator,
    config: PipelineConfig,
    state: PipelineState,
}

impl<D: PoseDetector> PosePipeline<D> {

    /// new initializes new instance of the pipeline
    pub fn new(detector: D, config: PipelineConfig) -> Self {
        PosePipeline {
            detector,
            annotator: PoseAnnotator::new(config.annotation.clone()),
            config,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    fn transition(&mut self, next: PipelineState) {
        info!("pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// process_video annotates a video file and writes its landmark file.
    ///
    /// # Arguments
    /// * `input_path` - source video
    /// * `output_path` - annotated video to create
    /// * `landmark_path` - JSON landmark file to create
    ///
    /// # Returns
    /// * `Result<PipelineReport, Error>`
    pub async fn process_video<P: AsRef<Path>>(&mut self, input_path: P, output_path: P, landmark_path: P) -> Result<PipelineReport, Error> {
        let source = VideoFile::new(input_path.as_ref());
        let sinks = VideoFileSinkFactory::new(output_path.as_ref(), &self.config.fourcc);
        self.run(&source, &sinks, landmark_path.as_ref()).await
    }

    /// run executes extraction, serialization and rendering in sequence.
    ///
    /// If the input cannot be opened the run fails while still `Idle` and
    /// nothing is written. A failure after that point removes the outputs this
    /// run created, so either both artifacts exist or neither does. Files left
    /// at the output paths by an earlier run are only replaced once this run
    /// writes its own.
    ///
    /// # Arguments
    /// * `source` - opens read passes over the input video
    /// * `sinks` - creates the annotated video sink
    /// * `landmark_path` - JSON landmark file to create
    ///
    /// # Returns
    /// * `Result<PipelineReport, Error>`
    pub async fn run<F, K>(&mut self, source: &F, sinks: &K, landmark_path: &Path) -> Result<PipelineReport, Error>
    where
        F: FrameSourceFactory,
        K: FrameSinkFactory,
    {
        self.state = PipelineState::Idle;
        let capture = source.open()?;

        let mut created = CreatedOutputs::default();
        let result = self.run_passes(capture, source, sinks, landmark_path, &mut created).await;
        if let Err(e) = &result {
            warn!("pipeline failed in state {:?}: {e}", self.state);
            if created.video {
                if let Err(cleanup) = sinks.discard() {
                    warn!("cannot remove partial video output: {cleanup}");
                }
            }
            if created.landmarks {
                if let Err(cleanup) = std::fs::remove_file(landmark_path) {
                    warn!("cannot remove partial landmark file {}: {cleanup}", landmark_path.display());
                }
            }
        }
        result
    }

    async fn run_passes<F, K>(&mut self, mut capture: F::Source, source: &F, sinks: &K, landmark_path: &Path, created: &mut CreatedOutputs) -> Result<PipelineReport, Error>
    where
        F: FrameSourceFactory,
        K: FrameSinkFactory,
    {
        self.transition(PipelineState::Extracting);
        let landmarks = extract_pose_landmarks(&mut capture, &mut self.detector).await?;
        drop(capture);

        write_landmarks(landmark_path, &landmarks)?;
        created.landmarks = true;
        self.transition(PipelineState::Serialized);

        let mut capture = source.open()?;
        let video = capture.info();
        let mut sink = sinks.create(&video)?;
        created.video = true;
        self.transition(PipelineState::Rendering);
        let frames_written = self.annotator.render(&mut capture, &landmarks, &mut sink)?;
        sink.release()?;
        self.transition(PipelineState::Done);

        Ok(PipelineReport {
            video,
            frames_read: landmarks.len(),
            frames_detected: landmarks.iter().filter(|entry| entry.is_some()).count(),
            frames_written,
            landmarks,
        })
    }
}
