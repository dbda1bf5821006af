use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use anyhow::Error;
use log::{debug, warn};
use opencv::core::{Mat, MatTraitConst, Size};
use opencv::videoio::{
    CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH, VideoCapture,
    VideoCaptureTrait, VideoCaptureTraitConst, VideoWriter, VideoWriterTrait, VideoWriterTraitConst,
};

/// VideoInfo is the stream metadata the annotated output must reproduce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub fps: f64,
    pub width: i32,
    pub height: i32,
}

/// FrameSource yields decoded frames in read order until end-of-stream.
pub trait FrameSource {
    fn info(&self) -> VideoInfo;

    /// read_frame returns `None` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<Mat>, Error>;
}

/// FrameSourceFactory opens independent read passes over the same video.
pub trait FrameSourceFactory {
    type Source: FrameSource;

    fn open(&self) -> Result<Self::Source, Error>;
}

/// FrameSink accepts frames in order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<(), Error>;

    /// release flushes and closes the sink. Dropping a sink also releases it.
    fn release(&mut self) -> Result<(), Error>;
}

/// FrameSinkFactory creates the output sink once the source metadata is known.
pub trait FrameSinkFactory {
    type Sink: FrameSink;

    fn create(&self, info: &VideoInfo) -> Result<Self::Sink, Error>;

    /// discard removes the output of a sink created by a run that then failed.
    fn discard(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// VideoFile opens a video file through OpenCV.
#[derive(Debug, Clone)]
pub struct VideoFile {
    path: PathBuf,
}

impl VideoFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        VideoFile { path: path.as_ref().to_path_buf() }
    }
}

impl FrameSourceFactory for VideoFile {
    type Source = VideoFileSource;

    fn open(&self) -> Result<VideoFileSource, Error> {
        VideoFileSource::open(&self.path)
    }
}

pub struct VideoFileSource {
    cap: VideoCapture,
    info: VideoInfo,
}

impl VideoFileSource {
    /// open starts a read pass and fails if OpenCV cannot open the file.
    ///
    /// # Arguments
    /// * `path` - path of the input video
    ///
    /// # Returns
    /// * `Result<VideoFileSource, Error>`
    pub fn open(path: &Path) -> Result<Self, Error> {
        let path_str = match path.to_str() {
            None => return Err(Error::msg(format!("video path {} is not valid UTF-8", path.display()))),
            Some(path_str) => path_str,
        };

        let cap = VideoCapture::from_file(path_str, CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(Error::msg(format!("cannot open video {}", path.display())))
        }

        let info = VideoInfo {
            fps: cap.get(CAP_PROP_FPS)?,
            width: cap.get(CAP_PROP_FRAME_WIDTH)? as i32,
            height: cap.get(CAP_PROP_FRAME_HEIGHT)? as i32,
        };
        debug!("opened {} ({}x{} @ {} fps)", path.display(), info.width, info.height, info.fps);
        Ok(VideoFileSource { cap, info })
    }
}

impl FrameSource for VideoFileSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Result<Option<Mat>, Error> {
        let mut frame = Mat::default();
        if !self.cap.read(&mut frame)? || frame.empty() {
            return Ok(None)
        }
        Ok(Some(frame))
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.cap.release() {
            warn!("failed to release video capture: {e}");
        }
    }
}

/// VideoFileSinkFactory writes the annotated video with a fixed codec tag.
#[derive(Debug, Clone)]
pub struct VideoFileSinkFactory {
    path: PathBuf,
    fourcc: String,
}

impl VideoFileSinkFactory {
    pub fn new<P: AsRef<Path>>(path: P, fourcc: &str) -> Self {
        VideoFileSinkFactory {
            path: path.as_ref().to_path_buf(),
            fourcc: fourcc.to_string(),
        }
    }
}

/// fourcc_code packs a four character codec tag such as `mp4v`.
pub fn fourcc_code(tag: &str) -> Result<i32, Error> {
    let chars: Vec<char> = tag.chars().collect();
    if chars.len() != 4 {
        return Err(Error::msg(format!("codec tag `{tag}` must have exactly four characters")))
    }
    Ok(VideoWriter::fourcc(chars[0], chars[1], chars[2], chars[3])?)
}

impl FrameSinkFactory for VideoFileSinkFactory {
    type Sink = VideoFileSink;

    fn create(&self, info: &VideoInfo) -> Result<VideoFileSink, Error> {
        let path_str = match self.path.to_str() {
            None => return Err(Error::msg(format!("video path {} is not valid UTF-8", self.path.display()))),
            Some(path_str) => path_str,
        };

        let writer = VideoWriter::new(
            path_str,
            fourcc_code(&self.fourcc)?,
            info.fps,
            Size::new(info.width, info.height),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(Error::msg(format!("cannot open video writer for {}", self.path.display())))
        }
        Ok(VideoFileSink { writer })
    }

    fn discard(&self) -> Result<(), Error> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

pub struct VideoFileSink {
    writer: VideoWriter,
}

impl FrameSink for VideoFileSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<(), Error> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), Error> {
        self.writer.release()?;
        Ok(())
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.release() {
            warn!("failed to release video writer: {e}");
        }
    }
}

/// MemoryVideo serves a fixed list of frames, for synthetic inputs and embedding.
#[derive(Clone)]
pub struct MemoryVideo {
    info: VideoInfo,
    frames: Vec<Mat>,
}

impl MemoryVideo {
    pub fn new(info: VideoInfo, frames: Vec<Mat>) -> Self {
        MemoryVideo { info, frames }
    }
}

impl FrameSourceFactory for MemoryVideo {
    type Source = MemoryFrameSource;

    fn open(&self) -> Result<MemoryFrameSource, Error> {
        let mut frames = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            frames.push(frame.try_clone()?);
        }
        Ok(MemoryFrameSource { info: self.info, frames: frames.into_iter() })
    }
}

pub struct MemoryFrameSource {
    info: VideoInfo,
    frames: std::vec::IntoIter<Mat>,
}

impl FrameSource for MemoryFrameSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Result<Option<Mat>, Error> {
        Ok(self.frames.next())
    }
}

/// MemorySinkFactory collects written frames so callers can inspect them afterwards.
#[derive(Clone, Default)]
pub struct MemorySinkFactory {
    frames: Rc<RefCell<Vec<Mat>>>,
    info: Rc<RefCell<Option<VideoInfo>>>,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        MemorySinkFactory::default()
    }

    /// frames returns the frames written so far.
    pub fn frames(&self) -> Vec<Mat> {
        self.frames.borrow().clone()
    }

    /// info returns the metadata the sink was created with.
    pub fn info(&self) -> Option<VideoInfo> {
        *self.info.borrow()
    }
}

impl FrameSinkFactory for MemorySinkFactory {
    type Sink = MemorySink;

    fn create(&self, info: &VideoInfo) -> Result<MemorySink, Error> {
        self.frames.borrow_mut().clear();
        *self.info.borrow_mut() = Some(*info);
        Ok(MemorySink { frames: Rc::clone(&self.frames) })
    }

    fn discard(&self) -> Result<(), Error> {
        self.frames.borrow_mut().clear();
        Ok(())
    }
}

pub struct MemorySink {
    frames: Rc<RefCell<Vec<Mat>>>,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Mat) -> Result<(), Error> {
        self.frames.borrow_mut().push(frame.try_clone()?);
        Ok(())
    }

    fn release(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use opencv::core::{Mat, MatTraitConstManual, Scalar, CV_8UC3};
    use crate::modules::video_io::{
        fourcc_code, FrameSink, FrameSinkFactory, FrameSource, FrameSourceFactory, MemorySinkFactory,
        MemoryVideo, VideoFile, VideoInfo,
    };

    fn info() -> VideoInfo {
        VideoInfo { fps: 30.0, width: 8, height: 6 }
    }

    fn frame(value: f64) -> Mat {
        Mat::new_rows_cols_with_default(6, 8, CV_8UC3, Scalar::all(value)).unwrap()
    }

    #[test]
    fn test_memory_video_opens_independent_passes() {
        let video = MemoryVideo::new(info(), vec![frame(1.0), frame(2.0)]);

        let mut first = video.open().unwrap();
        assert!(first.read_frame().unwrap().is_some());
        assert!(first.read_frame().unwrap().is_some());
        assert!(first.read_frame().unwrap().is_none());

        let mut second = video.open().unwrap();
        assert_eq!(second.info(), info());
        let frame = second.read_frame().unwrap().unwrap();
        assert_eq!(frame.data_bytes().unwrap()[0], 1);
    }

    #[test]
    fn test_memory_sink_collects_frames() {
        let sinks = MemorySinkFactory::new();
        let mut sink = sinks.create(&info()).unwrap();
        sink.write_frame(&frame(3.0)).unwrap();
        sink.write_frame(&frame(4.0)).unwrap();
        sink.release().unwrap();

        assert_eq!(sinks.frames().len(), 2);
        assert_eq!(sinks.info(), Some(info()));
        sinks.discard().unwrap();
        assert!(sinks.frames().is_empty());
    }

    #[test]
    fn test_fourcc_code() {
        let expected = ('m' as i32) | ('p' as i32) << 8 | ('4' as i32) << 16 | ('v' as i32) << 24;
        assert_eq!(fourcc_code("mp4v").unwrap(), expected);
        assert!(fourcc_code("mp4").is_err());
    }

    #[test]
    fn test_missing_video_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let video = VideoFile::new(dir.path().join("missing.mp4"));
        assert!(video.open().is_err());
    }
}
