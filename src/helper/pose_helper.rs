use anyhow::Error;
use log::{debug, info};
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc::{FONT_HERSHEY_SIMPLEX, LINE_8, line, put_text};
use crate::config::config::{AnnotationConfig, BodySide};
use crate::modules::video_io::{FrameSink, FrameSource};
use crate::utils::coordinate::{FrameLandmarks, LandmarkSequence, PoseLandmark};
use crate::utils::geometry::{calculate_angle, is_valid_angle, is_valid_point};

/// BGR colors of the overlay elements.
const FRAME_LABEL_COLOR: (u8, u8, u8) = (0, 255, 255);
const ELBOW_COLOR: (u8, u8, u8) = (0, 255, 0);
const WRIST_COLOR: (u8, u8, u8) = (255, 100, 0);
const SHOULDER_COLOR: (u8, u8, u8) = (0, 255, 255);
const HIP_COLOR: (u8, u8, u8) = (255, 0, 0);
const KNEE_COLOR: (u8, u8, u8) = (0, 255, 0);
const ELBOW_FLARING_COLOR: (u8, u8, u8) = (100, 200, 255);

const INDEX_WRIST_COLOR: (u8, u8, u8) = (150, 50, 255);
const WRIST_ELBOW_COLOR: (u8, u8, u8) = (0, 255, 255);
const ELBOW_SHOULDER_COLOR: (u8, u8, u8) = (0, 255, 0);
const SHOULDER_HIP_COLOR: (u8, u8, u8) = (255, 0, 0);
const HIP_KNEE_COLOR: (u8, u8, u8) = (0, 0, 255);
const KNEE_ANKLE_COLOR: (u8, u8, u8) = (0, 165, 255);
const SHOULDER_ELBOW_COLOR: (u8, u8, u8) = (255, 255, 0);
const HIP_ELBOW_COLOR: (u8, u8, u8) = (0, 255, 255);

/// Offset of an angle label from its joint, in pixels.
const ANGLE_LABEL_OFFSET: (i32, i32) = (30, 20);
const ELBOW_FLARING_LABEL_OFFSET: (i32, i32) = (30, 40);

/// KinematicChain names the landmarks of one body side used for annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KinematicChain {
    pub shoulder: PoseLandmark,
    pub elbow: PoseLandmark,
    pub wrist: PoseLandmark,
    pub hip: PoseLandmark,
    pub knee: PoseLandmark,
    pub ankle: PoseLandmark,
    pub index_finger: PoseLandmark,
}

impl KinematicChain {
    pub fn for_side(side: BodySide) -> Self {
        match side {
            BodySide::Left => KinematicChain {
                shoulder: PoseLandmark::LeftShoulder,
                elbow: PoseLandmark::LeftElbow,
                wrist: PoseLandmark::LeftWrist,
                hip: PoseLandmark::LeftHip,
                knee: PoseLandmark::LeftKnee,
                ankle: PoseLandmark::LeftAnkle,
                index_finger: PoseLandmark::LeftIndex,
            },
            BodySide::Right => KinematicChain {
                shoulder: PoseLandmark::RightShoulder,
                elbow: PoseLandmark::RightElbow,
                wrist: PoseLandmark::RightWrist,
                hip: PoseLandmark::RightHip,
                knee: PoseLandmark::RightKnee,
                ankle: PoseLandmark::RightAnkle,
                index_finger: PoseLandmark::RightIndex,
            },
        }
    }
}

/// JointAngles holds the six annotated angles in degrees; NaN means unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngles {
    pub elbow: f64,
    pub wrist: f64,
    pub shoulder: f64,
    pub hip: f64,
    pub knee: f64,
    pub elbow_flaring: f64,
}

/// compute_joint_angles evaluates the joint angles of one side's chain.
///
/// # Arguments
/// * `landmarks` - &FrameLandmarks
/// * `chain` - &KinematicChain
///
/// # Returns
/// * `JointAngles`
pub fn compute_joint_angles(landmarks: &FrameLandmarks, chain: &KinematicChain) -> JointAngles {
    let shoulder = landmarks[chain.shoulder].point3();
    let elbow = landmarks[chain.elbow].point3();
    let wrist = landmarks[chain.wrist].point3();
    let hip = landmarks[chain.hip].point3();
    let knee = landmarks[chain.knee].point3();
    let ankle = landmarks[chain.ankle].point3();
    let index_finger = landmarks[chain.index_finger].point3();

    JointAngles {
        elbow: calculate_angle(shoulder, elbow, wrist),
        wrist: calculate_angle(elbow, wrist, index_finger),
        shoulder: calculate_angle(elbow, shoulder, hip),
        hip: calculate_angle(shoulder, hip, knee),
        knee: calculate_angle(hip, knee, ankle),
        elbow_flaring: calculate_angle(shoulder, elbow, hip),
    }
}

/// Overlay is a single drawing primitive on an output frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Text {
        text: String,
        origin: (i32, i32),
        scale: f64,
        color: (u8, u8, u8),
    },
    Line {
        from: (i32, i32),
        to: (i32, i32),
        color: (u8, u8, u8),
    },
}

fn to_scalar(color: (u8, u8, u8)) -> Scalar {
    Scalar::new(color.0 as f64, color.1 as f64, color.2 as f64, 0.0)
}

/// to_pixel_point truncates a projection to drawing coordinates, or `None` when
/// it is not finite or does not fit in an `i32`.
fn to_pixel_point(point: (f64, f64)) -> Option<(i32, i32)> {
    let in_range = |v: f64| v >= i32::MIN as f64 && v <= i32::MAX as f64;
    if !is_valid_point(point) || !in_range(point.0) || !in_range(point.1) {
        return None
    }
    Some((point.0 as i32, point.1 as i32))
}

#[derive(Debug, Clone)]
pub struct PoseAnnotator {
    config: AnnotationConfig,
    chain: KinematicChain,
}

impl PoseAnnotator {

    /// new initializes the annotator for the configured body side.
    pub fn new(config: AnnotationConfig) -> Self {
        let chain = KinematicChain::for_side(config.side);
        PoseAnnotator { config, chain }
    }

    /// plan_overlays decides what to draw on frame `frame_idx`.
    ///
    /// The frame label is always present. Without landmarks nothing else is
    /// drawn. Otherwise each angle label needs a joint projection that is
    /// finite and fits the pixel range plus a non-NaN angle, and each segment
    /// needs two such end points.
    ///
    /// # Arguments
    /// * `frame_idx` - index of the frame in the source video
    /// * `landmarks` - landmarks detected in that frame, if any
    /// * `width` - frame width in pixels
    /// * `height` - frame height in pixels
    ///
    /// # Returns
    /// * `Vec<Overlay>`
    pub fn plan_overlays(&self, frame_idx: usize, landmarks: Option<&FrameLandmarks>, width: i32, height: i32) -> Vec<Overlay> {
        let mut overlays: Vec<Overlay> = Vec::with_capacity(15);
        overlays.push(Overlay::Text {
            text: format!("Frame: {frame_idx}"),
            origin: self.config.frame_label_origin,
            scale: self.config.frame_label_scale,
            color: FRAME_LABEL_COLOR,
        });

        let landmarks = match landmarks {
            None => return overlays,
            Some(landmarks) => landmarks,
        };

        let chain = &self.chain;
        let shoulder = landmarks[chain.shoulder].to_pixel(width, height);
        let elbow = landmarks[chain.elbow].to_pixel(width, height);
        let wrist = landmarks[chain.wrist].to_pixel(width, height);
        let hip = landmarks[chain.hip].to_pixel(width, height);
        let knee = landmarks[chain.knee].to_pixel(width, height);
        let ankle = landmarks[chain.ankle].to_pixel(width, height);
        let index_finger = landmarks[chain.index_finger].to_pixel(width, height);

        let angles = compute_joint_angles(landmarks, chain);

        let labels = [
            ("Elbow", angles.elbow, elbow, ANGLE_LABEL_OFFSET, ELBOW_COLOR),
            ("Wrist", angles.wrist, wrist, ANGLE_LABEL_OFFSET, WRIST_COLOR),
            ("Shoulder", angles.shoulder, shoulder, ANGLE_LABEL_OFFSET, SHOULDER_COLOR),
            ("Hip", angles.hip, hip, ANGLE_LABEL_OFFSET, HIP_COLOR),
            ("Knee", angles.knee, knee, ANGLE_LABEL_OFFSET, KNEE_COLOR),
            ("Elbow Flaring", angles.elbow_flaring, elbow, ELBOW_FLARING_LABEL_OFFSET, ELBOW_FLARING_COLOR),
        ];
        for (name, angle, joint, offset, color) in labels {
            if !is_valid_angle(angle) {
                continue
            }
            let (x, y) = match to_pixel_point(joint) {
                None => continue,
                Some(point) => point,
            };
            overlays.push(Overlay::Text {
                text: format!("{name}: {}°", angle as i32),
                origin: (x.saturating_sub(offset.0), y.saturating_sub(offset.1)),
                scale: self.config.angle_label_scale,
                color,
            });
        }

        // shoulder-elbow and hip-elbow are drawn on top of the main chain on purpose.
        let segments = [
            (index_finger, wrist, INDEX_WRIST_COLOR),
            (wrist, elbow, WRIST_ELBOW_COLOR),
            (elbow, shoulder, ELBOW_SHOULDER_COLOR),
            (shoulder, hip, SHOULDER_HIP_COLOR),
            (hip, knee, HIP_KNEE_COLOR),
            (knee, ankle, KNEE_ANKLE_COLOR),
            (shoulder, elbow, SHOULDER_ELBOW_COLOR),
            (hip, elbow, HIP_ELBOW_COLOR),
        ];
        for (from, to, color) in segments {
            if let (Some(from), Some(to)) = (to_pixel_point(from), to_pixel_point(to)) {
                overlays.push(Overlay::Line { from, to, color });
            }
        }

        overlays
    }

    /// draw_overlays paints the planned primitives onto `img` in order.
    pub fn draw_overlays(&self, img: &mut Mat, overlays: &[Overlay]) -> Result<(), Error> {
        for overlay in overlays {
            match overlay {
                Overlay::Text { text, origin, scale, color } => {
                    put_text(
                        img,
                        text,
                        Point::new(origin.0, origin.1),
                        FONT_HERSHEY_SIMPLEX,
                        *scale,
                        to_scalar(*color),
                        self.config.thickness,
                        LINE_8,
                        false,
                    )?;
                }
                Overlay::Line { from, to, color } => {
                    line(
                        img,
                        Point::new(from.0, from.1),
                        Point::new(to.0, to.1),
                        to_scalar(*color),
                        self.config.thickness,
                        LINE_8,
                        0,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// annotate_frame draws the overlays for `frame_idx` directly on `img`.
    pub fn annotate_frame(&self, img: &mut Mat, frame_idx: usize, landmarks: Option<&FrameLandmarks>, width: i32, height: i32) -> Result<(), Error> {
        let overlays = self.plan_overlays(frame_idx, landmarks, width, height);
        self.draw_overlays(img, &overlays)
    }

    /// render runs the annotation pass over a freshly opened source.
    ///
    /// Frame `i` is paired with `sequence[i]`. The pass ends at whichever of
    /// the source and the sequence runs out first.
    ///
    /// # Arguments
    /// * `source` - a new read pass over the input video
    /// * `sequence` - landmarks produced by the extraction pass
    /// * `sink` - destination of the annotated frames
    ///
    /// # Returns
    /// * `Result<usize, Error>` - number of frames written
    pub fn render<S: FrameSource, K: FrameSink>(&self, source: &mut S, sequence: &LandmarkSequence, sink: &mut K) -> Result<usize, Error> {
        let info = source.info();
        let mut frame_idx = 0usize;

        while frame_idx < sequence.len() {
            let mut frame = match source.read_frame()? {
                None => break,
                Some(frame) => frame,
            };
            let landmarks = sequence[frame_idx].as_ref();
            if landmarks.is_none() {
                debug!("frame {frame_idx}: no subject, writing frame label only");
            }
            self.annotate_frame(&mut frame, frame_idx, landmarks, info.width, info.height)?;
            sink.write_frame(&frame)?;
            frame_idx += 1;
        }

        info!("annotated {frame_idx} frames ({} landmark records)", sequence.len());
        Ok(frame_idx)
    }
}
