use std::io::BufRead;

use crate::detection::Detection;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub timestamp: f64, // in seconds
    pub detections: Vec<Detection>,
}

impl Frame {
    #[inline]
    pub fn new(timestamp: f64, detections: Vec<Detection>) -> Self {
        Self {
            timestamp,
            detections,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Parses a `<millis>:<json array of detections>` line.
    pub fn parse_line(line: &str) -> Result<Self, Error> {
        let idx = line
            .find(':')
            .ok_or_else(|| Error::Parse(format!("missing ':' separator in {:?}", line)))?;

        let (ts, vector) = line.split_at(idx);
        let ts: u64 = ts
            .trim()
            .parse()
            .map_err(|err| Error::Parse(format!("wrong timestamp {:?}: {}", ts, err)))?;

        let detections = serde_json::from_str(&vector[1..])?;

        Ok(Self::new(ts as f64 / 1000.0, detections))
    }

    pub fn to_line(&self) -> Result<String, Error> {
        if !self.timestamp.is_finite() || self.timestamp < 0.0 {
            return Err(Error::Parse(format!(
                "timestamp {} is not a non-negative time",
                self.timestamp
            )));
        }

        let millis = (self.timestamp * 1000.0).round() as u64;

        Ok(format!(
            "{}:{}",
            millis,
            serde_json::to_string(&self.detections)?
        ))
    }
}

/// Reads every frame of a detections file, skipping blank lines.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<Frame>, Error> {
    let mut frames = Vec::new();

    for line in reader.lines() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        frames.push(Frame::parse_line(&line)?);
    }

    Ok(frames)
}
