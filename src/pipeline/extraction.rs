use anyhow::Error;
use log::{debug, info};
use crate::modules::pose_detector::PoseDetector;
use crate::modules::video_io::FrameSource;
use crate::utils::coordinate::LandmarkSequence;
use crate::utils::image::{convert_bgr_to_rgb, convert_ndarray_to_frame_landmarks};

/// extract_pose_landmarks runs the detector once on every frame of `source`.
///
/// The returned sequence has exactly one entry per frame read, in read order.
/// Frames where the detector sees nobody are recorded as `None`; that is an
/// expected outcome, so the frame is never retried.
///
/// # Arguments
/// * `source` - a fresh read pass over the input video
/// * `detector` - pose detector
///
/// # Returns
/// * `Result<LandmarkSequence, Error>`
pub async fn extract_pose_landmarks<S: FrameSource, D: PoseDetector>(source: &mut S, detector: &mut D) -> Result<LandmarkSequence, Error> {
    let mut landmarks_per_frame: LandmarkSequence = Vec::new();
    let mut frame_idx = 0usize;

    while let Some(frame) = source.read_frame()? {
        let img_rgb = convert_bgr_to_rgb(&frame)?;
        match detector.detect(&img_rgb).await? {
            Some(output) => {
                landmarks_per_frame.push(Some(convert_ndarray_to_frame_landmarks(frame_idx, &output)?));
            }
            None => {
                debug!("frame {frame_idx}: no subject detected");
                landmarks_per_frame.push(None);
            }
        }
        frame_idx += 1;
    }

    let detected = landmarks_per_frame.iter().filter(|entry| entry.is_some()).count();
    info!("extracted landmarks from {frame_idx} frames, subject found in {detected}");
    Ok(landmarks_per_frame)
}

#[cfg(test)]
mod tests {
    use anyhow::Error;
    use ndarray::Array2;
    use opencv::core::{Mat, MatTraitConst, Scalar, Vec3b, CV_8UC3};
    use crate::modules::pose_detector::{PoseDetector, ReplayDetector};
    use crate::modules::video_io::{FrameSourceFactory, MemoryVideo, VideoInfo};
    use crate::pipeline::extraction::extract_pose_landmarks;
    use crate::utils::coordinate::PoseLandmark;

    fn video(frames: usize) -> MemoryVideo {
        let info = VideoInfo { fps: 30.0, width: 4, height: 4 };
        let frame = Mat::new_rows_cols_with_default(4, 4, CV_8UC3, Scalar::new(255.0, 0.0, 0.0, 0.0)).unwrap();
        MemoryVideo::new(info, vec![frame; frames])
    }

    /// Records the channel order of every frame it receives.
    struct ChannelCheckingDetector {
        seen: Vec<[u8; 3]>,
    }

    impl PoseDetector for ChannelCheckingDetector {
        async fn detect(&mut self, img: &Mat) -> Result<Option<Array2<f32>>, Error> {
            let pixel = img.at_2d::<Vec3b>(0, 0)?;
            self.seen.push([pixel[0], pixel[1], pixel[2]]);
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_extraction_keeps_frame_alignment() {
        let outputs = vec![
            Some(Array2::from_elem((33, 4), 0.25)),
            None,
            Some(Array2::from_elem((33, 4), 0.75)),
            None,
        ];
        let mut detector = ReplayDetector::new(outputs);
        let mut source = video(4).open().unwrap();

        let sequence = extract_pose_landmarks(&mut source, &mut detector).await.unwrap();
        assert_eq!(sequence.len(), 4);
        assert_eq!(detector.calls(), 4);
        assert!(sequence[1].is_none() && sequence[3].is_none());

        let first = sequence[0].as_ref().unwrap();
        assert_eq!(first.frame, 0);
        assert_eq!(first[PoseLandmark::LeftWrist].visibility, 0.25);
        let third = sequence[2].as_ref().unwrap();
        assert_eq!(third.frame, 2);
        assert_eq!(third[PoseLandmark::Nose].x, 0.75);
    }

    #[tokio::test]
    async fn test_extraction_feeds_rgb_frames() {
        let mut detector = ChannelCheckingDetector { seen: vec![] };
        let mut source = video(2).open().unwrap();

        let sequence = extract_pose_landmarks(&mut source, &mut detector).await.unwrap();
        assert_eq!(sequence, vec![None, None]);
        assert_eq!(detector.seen, vec![[0, 0, 255], [0, 0, 255]]);
    }

    #[tokio::test]
    async fn test_extraction_rejects_malformed_detector_output() {
        let mut detector = ReplayDetector::new(vec![Some(Array2::zeros((17, 2)))]);
        let mut source = video(1).open().unwrap();
        assert!(extract_pose_landmarks(&mut source, &mut detector).await.is_err());
    }

    #[tokio::test]
    async fn test_extraction_of_empty_video() {
        let mut detector = ReplayDetector::new(vec![]);
        let mut source = video(0).open().unwrap();
        let sequence = extract_pose_landmarks(&mut source, &mut detector).await.unwrap();
        assert!(sequence.is_empty());
        assert_eq!(detector.calls(), 0);
    }
}
