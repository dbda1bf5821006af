pub mod pose_detector;
pub mod video_io;
