use anyhow::Error;
use ndarray::Array2;
use opencv::core::Mat;
use opencv::imgproc::{COLOR_BGR2RGB, cvt_color};
use crate::utils::coordinate::{FrameLandmarks, Landmark, NUM_POSE_LANDMARKS, PoseLandmark};

/// Number of values the detector reports per landmark: x, y, z, visibility.
pub const LANDMARK_VALUES: usize = 4;

/// convert_bgr_to_rgb converts a decoded video frame into the detector's channel layout.
///
/// # Arguments
/// * `img` - BGR OpenCV matrix
///
/// # Returns
/// * `Result<Mat, Error>`
pub fn convert_bgr_to_rgb(img: &Mat) -> Result<Mat, Error> {
    let mut img_rgb = Mat::default();
    match cvt_color(img, &mut img_rgb, COLOR_BGR2RGB, 0) {
        Ok(_) => {}
        Err(e) => return Err(Error::from(e))
    };
    Ok(img_rgb)
}

/// convert_ndarray_to_frame_landmarks maps a `(33, 4)` detector tensor onto the landmark table.
///
/// Row `i` belongs to `PoseLandmark::ALL[i]`, columns are `x, y, z, visibility`.
///
/// # Arguments
/// * `frame_idx` - index of the frame the tensor was detected in
/// * `output` - detector output
///
/// # Returns
/// * `Result<FrameLandmarks, Error>`
pub fn convert_ndarray_to_frame_landmarks(frame_idx: usize, output: &Array2<f32>) -> Result<FrameLandmarks, Error> {
    if output.dim() != (NUM_POSE_LANDMARKS, LANDMARK_VALUES) {
        return Err(Error::msg(format!(
            "pose detector returned a {:?} landmark tensor, expected ({}, {})",
            output.dim(), NUM_POSE_LANDMARKS, LANDMARK_VALUES,
        )))
    }

    let mut landmarks = [Landmark::nan(); NUM_POSE_LANDMARKS];
    for (landmark, row) in landmarks.iter_mut().zip(output.rows()) {
        *landmark = Landmark::new(row[0], row[1], row[2], row[3]);
    }
    Ok(FrameLandmarks::new(frame_idx, landmarks))
}

/// convert_frame_landmarks_to_ndarray is the inverse of `convert_ndarray_to_frame_landmarks`.
pub fn convert_frame_landmarks_to_ndarray(frame: &FrameLandmarks) -> Array2<f32> {
    Array2::from_shape_fn((NUM_POSE_LANDMARKS, LANDMARK_VALUES), |(row, col)| {
        let lmk = frame.get(PoseLandmark::ALL[row]);
        match col {
            0 => lmk.x,
            1 => lmk.y,
            2 => lmk.z,
            _ => lmk.visibility,
        }
    })
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use opencv::core::{Mat, MatTraitConst, Scalar, Vec3b, CV_8UC3};
    use crate::utils::coordinate::{Landmark, PoseLandmark};
    use crate::utils::image::{convert_bgr_to_rgb, convert_frame_landmarks_to_ndarray, convert_ndarray_to_frame_landmarks};

    #[test]
    fn test_convert_bgr_to_rgb() {
        let img = Mat::new_rows_cols_with_default(4, 6, CV_8UC3, Scalar::new(10.0, 20.0, 30.0, 0.0)).unwrap();
        let rgb = convert_bgr_to_rgb(&img).unwrap();
        let pixel = rgb.at_2d::<Vec3b>(2, 3).unwrap();
        assert_eq!([pixel[0], pixel[1], pixel[2]], [30, 20, 10]);
    }

    #[test]
    fn test_convert_ndarray_to_frame_landmarks() {
        let output = Array2::from_shape_fn((33, 4), |(row, col)| (row * 4 + col) as f32);
        let frame = convert_ndarray_to_frame_landmarks(7, &output).unwrap();

        assert_eq!(frame.frame, 7);
        assert_eq!(frame[PoseLandmark::Nose], Landmark::new(0.0, 1.0, 2.0, 3.0));
        assert_eq!(frame[PoseLandmark::LeftElbow], Landmark::new(52.0, 53.0, 54.0, 55.0));
        assert_eq!(convert_frame_landmarks_to_ndarray(&frame), output);
    }

    #[test]
    fn test_convert_ndarray_rejects_wrong_shape() {
        let output = Array2::<f32>::zeros((17, 3));
        assert!(convert_ndarray_to_frame_landmarks(0, &output).is_err());
    }
}
