use std::collections::VecDeque;
use anyhow::Error;
use ndarray::Array2;
use opencv::core::Mat;
use crate::utils::coordinate::LandmarkSequence;
use crate::utils::image::convert_frame_landmarks_to_ndarray;

/// PoseDetector is the boundary to the pose estimation model.
///
/// `detect` receives one RGB frame and returns either a `(33, 4)` tensor whose
/// rows follow `PoseLandmark::ALL` and whose columns are `x, y, z, visibility`,
/// or `None` when no subject is visible. The pipeline calls it exactly once per
/// frame, in frame order, so stateful (tracking) detectors are allowed.
#[allow(async_fn_in_trait)]
pub trait PoseDetector {
    async fn detect(&mut self, img: &Mat) -> Result<Option<Array2<f32>>, Error>;
}

/// ReplayDetector answers with a previously recorded landmark sequence.
///
/// Useful to re-render a video from an existing landmark file without
/// running the model again, and as a deterministic stand-in in tests.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    outputs: VecDeque<Option<Array2<f32>>>,
    calls: usize,
}

impl ReplayDetector {
    pub fn new(outputs: Vec<Option<Array2<f32>>>) -> Self {
        ReplayDetector { outputs: outputs.into(), calls: 0 }
    }

    /// from_sequence replays the detections stored in a landmark sequence.
    pub fn from_sequence(sequence: &LandmarkSequence) -> Self {
        let outputs = sequence
            .iter()
            .map(|entry| entry.as_ref().map(convert_frame_landmarks_to_ndarray))
            .collect();
        ReplayDetector::new(outputs)
    }

    /// calls returns how many frames were submitted so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl PoseDetector for ReplayDetector {
    async fn detect(&mut self, _img: &Mat) -> Result<Option<Array2<f32>>, Error> {
        self.calls += 1;
        // Frames past the recording have no subject.
        Ok(self.outputs.pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use opencv::core::Mat;
    use crate::modules::pose_detector::{PoseDetector, ReplayDetector};
    use crate::utils::coordinate::{FrameLandmarks, Landmark, LandmarkSequence, NUM_POSE_LANDMARKS};

    #[tokio::test]
    async fn test_replay_detector_follows_recording() {
        let sequence: LandmarkSequence = vec![
            None,
            Some(FrameLandmarks::new(1, [Landmark::new(0.5, 0.5, 0.0, 1.0); NUM_POSE_LANDMARKS])),
        ];
        let mut detector = ReplayDetector::from_sequence(&sequence);
        let img = Mat::default();

        assert!(detector.detect(&img).await.unwrap().is_none());
        let output = detector.detect(&img).await.unwrap().unwrap();
        assert_eq!(output.dim(), (33, 4));
        assert_eq!(output[[0, 0]], 0.5);
        assert!(detector.detect(&img).await.unwrap().is_none());
        assert_eq!(detector.calls(), 3);
    }

    #[tokio::test]
    async fn test_replay_detector_from_raw_outputs() {
        let mut detector = ReplayDetector::new(vec![Some(Array2::zeros((33, 4)))]);
        let output = detector.detect(&Mat::default()).await.unwrap();
        assert_eq!(output, Some(Array2::zeros((33, 4))));
    }
}
