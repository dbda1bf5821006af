use std::ops::Index;

/// Number of body points reported by the pose detector for one subject.
pub const NUM_POSE_LANDMARKS: usize = 33;

/// PoseLandmark enumerates the body points in the detector's positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl PoseLandmark {
    /// Every landmark, in the order the detector emits them.
    pub const ALL: [PoseLandmark; NUM_POSE_LANDMARKS] = [
        PoseLandmark::Nose,
        PoseLandmark::LeftEyeInner,
        PoseLandmark::LeftEye,
        PoseLandmark::LeftEyeOuter,
        PoseLandmark::RightEyeInner,
        PoseLandmark::RightEye,
        PoseLandmark::RightEyeOuter,
        PoseLandmark::LeftEar,
        PoseLandmark::RightEar,
        PoseLandmark::MouthLeft,
        PoseLandmark::MouthRight,
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::RightElbow,
        PoseLandmark::LeftWrist,
        PoseLandmark::RightWrist,
        PoseLandmark::LeftPinky,
        PoseLandmark::RightPinky,
        PoseLandmark::LeftIndex,
        PoseLandmark::RightIndex,
        PoseLandmark::LeftThumb,
        PoseLandmark::RightThumb,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        PoseLandmark::LeftKnee,
        PoseLandmark::RightKnee,
        PoseLandmark::LeftAnkle,
        PoseLandmark::RightAnkle,
        PoseLandmark::LeftHeel,
        PoseLandmark::RightHeel,
        PoseLandmark::LeftFootIndex,
        PoseLandmark::RightFootIndex,
    ];

    /// index returns the landmark's row in the detector output.
    pub fn index(self) -> usize {
        self as usize
    }

    /// name returns the identifier used as the key in the landmark document.
    pub fn name(self) -> &'static str {
        match self {
            PoseLandmark::Nose => "NOSE",
            PoseLandmark::LeftEyeInner => "LEFT_EYE_INNER",
            PoseLandmark::LeftEye => "LEFT_EYE",
            PoseLandmark::LeftEyeOuter => "LEFT_EYE_OUTER",
            PoseLandmark::RightEyeInner => "RIGHT_EYE_INNER",
            PoseLandmark::RightEye => "RIGHT_EYE",
            PoseLandmark::RightEyeOuter => "RIGHT_EYE_OUTER",
            PoseLandmark::LeftEar => "LEFT_EAR",
            PoseLandmark::RightEar => "RIGHT_EAR",
            PoseLandmark::MouthLeft => "MOUTH_LEFT",
            PoseLandmark::MouthRight => "MOUTH_RIGHT",
            PoseLandmark::LeftShoulder => "LEFT_SHOULDER",
            PoseLandmark::RightShoulder => "RIGHT_SHOULDER",
            PoseLandmark::LeftElbow => "LEFT_ELBOW",
            PoseLandmark::RightElbow => "RIGHT_ELBOW",
            PoseLandmark::LeftWrist => "LEFT_WRIST",
            PoseLandmark::RightWrist => "RIGHT_WRIST",
            PoseLandmark::LeftPinky => "LEFT_PINKY",
            PoseLandmark::RightPinky => "RIGHT_PINKY",
            PoseLandmark::LeftIndex => "LEFT_INDEX",
            PoseLandmark::RightIndex => "RIGHT_INDEX",
            PoseLandmark::LeftThumb => "LEFT_THUMB",
            PoseLandmark::RightThumb => "RIGHT_THUMB",
            PoseLandmark::LeftHip => "LEFT_HIP",
            PoseLandmark::RightHip => "RIGHT_HIP",
            PoseLandmark::LeftKnee => "LEFT_KNEE",
            PoseLandmark::RightKnee => "RIGHT_KNEE",
            PoseLandmark::LeftAnkle => "LEFT_ANKLE",
            PoseLandmark::RightAnkle => "RIGHT_ANKLE",
            PoseLandmark::LeftHeel => "LEFT_HEEL",
            PoseLandmark::RightHeel => "RIGHT_HEEL",
            PoseLandmark::LeftFootIndex => "LEFT_FOOT_INDEX",
            PoseLandmark::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }

    /// from_name is the inverse of `name`.
    pub fn from_name(name: &str) -> Option<PoseLandmark> {
        PoseLandmark::ALL.iter().copied().find(|lmk| lmk.name() == name)
    }
}

/// Landmark is one normalized keypoint with the detector confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Landmark { x, y, z, visibility }
    }

    /// nan returns a landmark where every field is not-a-number.
    pub fn nan() -> Self {
        Landmark::new(f32::NAN, f32::NAN, f32::NAN, f32::NAN)
    }

    /// point3 returns the normalized 3D position used for angle math.
    pub fn point3(&self) -> [f64; 3] {
        [self.x as f64, self.y as f64, self.z as f64]
    }

    /// to_pixel projects the normalized position into a `width` x `height` frame.
    ///
    /// # Arguments
    /// * `width` - frame width in pixels
    /// * `height` - frame height in pixels
    ///
    /// # Returns
    /// * `(f64, f64)`
    pub fn to_pixel(&self, width: i32, height: i32) -> (f64, f64) {
        (self.x as f64 * width as f64, self.y as f64 * height as f64)
    }
}

/// FrameLandmarks holds the full landmark set detected in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLandmarks {
    pub frame: usize,
    landmarks: [Landmark; NUM_POSE_LANDMARKS],
}

impl FrameLandmarks {
    pub fn new(frame: usize, landmarks: [Landmark; NUM_POSE_LANDMARKS]) -> Self {
        FrameLandmarks { frame, landmarks }
    }

    pub fn get(&self, name: PoseLandmark) -> &Landmark {
        &self.landmarks[name.index()]
    }

    /// iter walks the landmarks in detector order together with their names.
    pub fn iter(&self) -> impl Iterator<Item = (PoseLandmark, &Landmark)> {
        PoseLandmark::ALL.iter().copied().zip(self.landmarks.iter())
    }
}

impl Index<PoseLandmark> for FrameLandmarks {
    type Output = Landmark;

    fn index(&self, name: PoseLandmark) -> &Landmark {
        self.get(name)
    }
}

/// LandmarkSequence has one entry per source frame; `None` marks a frame without a subject.
pub type LandmarkSequence = Vec<Option<FrameLandmarks>>;

#[cfg(test)]
mod tests {
    use crate::utils::coordinate::{FrameLandmarks, Landmark, NUM_POSE_LANDMARKS, PoseLandmark};

    #[test]
    fn test_landmark_table_matches_detector_order() {
        assert_eq!(PoseLandmark::ALL.len(), NUM_POSE_LANDMARKS);
        for (idx, lmk) in PoseLandmark::ALL.iter().enumerate() {
            assert_eq!(lmk.index(), idx);
            assert_eq!(PoseLandmark::from_name(lmk.name()), Some(*lmk));
        }
        assert_eq!(PoseLandmark::LeftShoulder.index(), 11);
        assert_eq!(PoseLandmark::LeftIndex.index(), 19);
        assert_eq!(PoseLandmark::RightFootIndex.index(), 32);
        assert_eq!(PoseLandmark::from_name("left_shoulder"), None);
    }

    #[test]
    fn test_frame_landmarks_lookup() {
        let mut landmarks = [Landmark::new(0.0, 0.0, 0.0, 1.0); NUM_POSE_LANDMARKS];
        landmarks[PoseLandmark::LeftKnee.index()] = Landmark::new(0.25, 0.75, -0.1, 0.9);
        let frame = FrameLandmarks::new(4, landmarks);

        assert_eq!(frame[PoseLandmark::LeftKnee], Landmark::new(0.25, 0.75, -0.1, 0.9));
        assert_eq!(frame.iter().count(), NUM_POSE_LANDMARKS);
        assert_eq!(frame.frame, 4);
    }

    #[test]
    fn test_landmark_to_pixel() {
        let lmk = Landmark::new(0.5, 0.25, 0.0, 1.0);
        assert_eq!(lmk.to_pixel(640, 480), (320.0, 120.0));

        let (x, y) = Landmark::nan().to_pixel(640, 480);
        assert!(x.is_nan() && y.is_nan());
    }
}
