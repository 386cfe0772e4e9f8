use std::io::Write;

use log::debug;

use crate::error::Error;
use crate::frame::Frame;
use crate::track::Track;

/// Side-effect hooks run alongside track collection.
pub trait Extension {
    fn before_processing(&mut self, source: &str) -> Result<(), Error>;
    fn process_frame(&mut self, frame: &Frame) -> Result<(), Error>;
    fn after_processing(&mut self) -> Result<(), Error>;
}

/// Feeds every frame through `extensions` and builds the track of `source`.
///
/// Every extension sees every frame, empty ones included.
pub fn collect_track<I>(
    source: &str,
    frames: I,
    extensions: &mut [Box<dyn Extension>],
) -> Result<Track, Error>
where
    I: IntoIterator<Item = Frame>,
{
    for ext in extensions.iter_mut() {
        ext.before_processing(source)?;
    }

    let mut collected = Vec::new();
    for frame in frames {
        for ext in extensions.iter_mut() {
            ext.process_frame(&frame)?;
        }

        if !frame.is_empty() {
            collected.push(frame);
        }
    }

    let track = Track::from_frames(collected);
    debug!("{}: collected {} frames with detections", source, track.len());

    for ext in extensions.iter_mut() {
        ext.after_processing()?;
    }

    Ok(track)
}

/// Writes frames with detections as `<millis>:<json>` lines.
pub struct DetectionDump<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> DetectionDump<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Extension for DetectionDump<W> {
    fn before_processing(&mut self, source: &str) -> Result<(), Error> {
        debug!("dumping detections of {}", source);
        self.written = 0;

        Ok(())
    }

    fn process_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        if frame.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "{}", frame.to_line()?)?;
        self.written += 1;

        Ok(())
    }

    fn after_processing(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        debug!("dumped {} frames", self.written);

        Ok(())
    }
}
