//! Replay of recorded depth streams.
//!
//! A recording is a plain concatenation of frames, each `width * height`
//! little-endian `u16` millimetre readings in row-major order.

use super::{CameraIntrinsics, CapturedFrame, DepthClip, DepthFrame, DepthMap, DepthSource, WorldPoint};
use crate::Result;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// Depth source reading fixed-size raw frames from a byte stream
pub struct RawDepthReader<R: Read> {
    reader: R,
    captured: CapturedFrame,
    buffer: Vec<u8>,
    frames_read: usize,
    exhausted: bool,
}

impl RawDepthReader<BufReader<File>> {
    /// Open a recording on disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened
    pub fn open<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        intrinsics: CameraIntrinsics,
        clip: DepthClip,
    ) -> Result<Self> {
        info!("Opening raw depth recording: {}", path.as_ref().display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), width, height, intrinsics, clip))
    }
}

impl<R: Read> RawDepthReader<R> {
    pub fn new(reader: R, width: u32, height: u32, intrinsics: CameraIntrinsics, clip: DepthClip) -> Self {
        Self {
            reader,
            captured: CapturedFrame::empty(width, height, intrinsics, clip),
            buffer: vec![0; width as usize * height as usize * 2],
            frames_read: 0,
            exhausted: false,
        }
    }

    /// Number of complete frames delivered so far
    #[must_use]
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// True once the stream has ended
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn read_frame(&mut self) -> Result<Option<DepthMap>> {
        match self.reader.read_exact(&mut self.buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let millimetres = self
            .buffer
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let map = self.captured.map();
        DepthMap::new(map.width(), map.height(), millimetres, *map.intrinsics()).map(Some)
    }
}

impl<R: Read> DepthSource for RawDepthReader<R> {
    fn update(&mut self) {
        self.captured.mark_stale();
        if self.exhausted {
            return;
        }
        match self.read_frame() {
            Ok(Some(map)) => {
                self.captured.replace(map);
                self.frames_read += 1;
                debug!("Loaded raw depth frame {}", self.frames_read);
            }
            Ok(None) => {
                info!("End of depth recording after {} frames", self.frames_read);
                self.exhausted = true;
            }
            Err(e) => {
                warn!("Failed to read depth frame: {}", e);
                self.exhausted = true;
            }
        }
    }

    fn is_frame_new(&self) -> bool {
        self.captured.is_fresh()
    }

    fn depth_frame(&self) -> &DepthFrame {
        self.captured.frame()
    }

    fn world_coordinate_at(&self, x: u32, y: u32) -> WorldPoint {
        self.captured.map().world_coordinate_at(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(frames: &[Vec<u16>]) -> Vec<u8> {
        frames
            .iter()
            .flat_map(|f| f.iter().flat_map(|v| v.to_le_bytes()))
            .collect()
    }

    #[test]
    fn test_reads_frames_until_eof() {
        let bytes = encode(&[vec![1000; 4], vec![2000; 4]]);
        let mut reader = RawDepthReader::new(
            Cursor::new(bytes),
            2,
            2,
            CameraIntrinsics::default(),
            DepthClip::default(),
        );

        assert!(!reader.is_frame_new());

        reader.update();
        assert!(reader.is_frame_new());
        assert_eq!(reader.world_coordinate_at(0, 0).z, 1000.0);

        reader.update();
        assert!(reader.is_frame_new());
        assert_eq!(reader.world_coordinate_at(1, 1).z, 2000.0);

        reader.update();
        assert!(!reader.is_frame_new());
        assert!(reader.is_exhausted());
        assert_eq!(reader.frames_read(), 2);
    }

    #[test]
    fn test_truncated_frame_is_end_of_stream() {
        let mut bytes = encode(&[vec![1000; 4]]);
        bytes.extend_from_slice(&[0, 1, 2]);
        let mut reader = RawDepthReader::new(
            Cursor::new(bytes),
            2,
            2,
            CameraIntrinsics::default(),
            DepthClip::default(),
        );
        reader.update();
        reader.update();
        assert!(!reader.is_frame_new());
        assert_eq!(reader.frames_read(), 1);
    }

    #[test]
    fn test_depth_frame_uses_clip() {
        let bytes = encode(&[vec![500, 4000, 0, 9000]]);
        let mut reader = RawDepthReader::new(
            Cursor::new(bytes),
            2,
            2,
            CameraIntrinsics::default(),
            DepthClip::default(),
        );
        reader.update();
        assert_eq!(reader.depth_frame().pixels(), &[255, 1, 0, 0]);
    }
}
