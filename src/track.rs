use std::collections::BTreeSet;

use log::warn;

use crate::detection::{Detection, TrackId};
use crate::frame::Frame;
use crate::smoother::Smoother;

/// Detection field a track can be grouped or filtered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    TrackId,
    Class,
}

impl AttributeKey {
    #[inline]
    pub fn value_of(&self, det: &Detection) -> Option<Attribute> {
        match self {
            AttributeKey::TrackId => Some(Attribute::TrackId(det.track_id)),
            AttributeKey::Class => det.class.map(Attribute::Class),
        }
    }
}

/// Attribute together with the value it should be equal to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    TrackId(TrackId),
    Class(i32),
}

impl Attribute {
    #[inline]
    pub fn key(&self) -> AttributeKey {
        match self {
            Attribute::TrackId(_) => AttributeKey::TrackId,
            Attribute::Class(_) => AttributeKey::Class,
        }
    }

    #[inline]
    pub fn matches(&self, det: &Detection) -> bool {
        self.key().value_of(det).as_ref() == Some(self)
    }
}

/// Time-ordered detections of a clip.
///
/// Frames without detections are never stored, so `times`, `frames` and
/// `sizes` are always index-aligned and timestamps may be irregular.
/// The size of a frame is taken from its first detection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    times: Vec<f64>,
    frames: Vec<Vec<Detection>>,
    sizes: Vec<(f32, f32)>,
}

impl Track {
    pub fn new<T, D>(times: T, detections: D) -> Self
    where
        T: IntoIterator<Item = f64>,
        D: IntoIterator<Item = Vec<Detection>>,
    {
        let (times, frames): (Vec<_>, Vec<_>) = times
            .into_iter()
            .zip(detections)
            .filter(|(_, dets)| !dets.is_empty())
            .unzip();

        let sizes = frames.iter().map(|dets| dets[0].size()).collect();

        Self {
            times,
            frames,
            sizes,
        }
    }

    pub fn from_frames<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        let (times, detections): (Vec<_>, Vec<_>) = frames
            .into_iter()
            .map(|frame| (frame.timestamp, frame.detections))
            .unzip();

        Self::new(times, detections)
    }

    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn sizes(&self) -> &[(f32, f32)] {
        &self.sizes
    }

    #[inline]
    pub fn frames(&self) -> &[Vec<Detection>] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[Detection])> {
        self.times
            .iter()
            .zip(self.frames.iter())
            .map(|(&ts, dets)| (ts, dets.as_slice()))
    }

    /// Keeps only the detections matching `attr`, dropping frames left empty.
    pub fn filter_by(&self, attr: Attribute) -> Track {
        let detections = self.frames.iter().map(|dets| {
            dets.iter()
                .filter(|det| attr.matches(det))
                .copied()
                .collect::<Vec<_>>()
        });

        Track::new(self.times.iter().copied(), detections)
    }

    #[inline]
    pub fn filter_by_track_id(&self, track_id: TrackId) -> Track {
        self.filter_by(Attribute::TrackId(track_id))
    }

    pub fn unique_values(&self, key: AttributeKey) -> BTreeSet<Attribute> {
        self.frames
            .iter()
            .flatten()
            .filter_map(|det| key.value_of(det))
            .collect()
    }

    pub fn track_ids(&self) -> BTreeSet<TrackId> {
        self.frames.iter().flatten().map(|det| det.track_id).collect()
    }

    /// Smooths every identity's detection sequence on its own.
    ///
    /// Frame count, timestamps and per-frame detection order are preserved.
    pub fn smooth<S: Smoother + ?Sized>(&self, smoother: &S) -> Track {
        let mut frames = self.frames.clone();

        for track_id in self.track_ids() {
            let positions: Vec<(usize, usize)> = self
                .frames
                .iter()
                .enumerate()
                .flat_map(|(fidx, dets)| {
                    dets.iter()
                        .enumerate()
                        .filter(move |(_, det)| det.track_id == track_id)
                        .map(move |(didx, _)| (fidx, didx))
                })
                .collect();

            let sequence: Vec<Detection> = positions
                .iter()
                .map(|&(fidx, didx)| self.frames[fidx][didx])
                .collect();

            let smoothed = smoother.smooth(&sequence);
            if smoothed.len() != sequence.len() {
                warn!(
                    "smoother changed length of track {} ({} -> {}), keeping raw boxes",
                    track_id,
                    sequence.len(),
                    smoothed.len()
                );
                continue;
            }

            for (&(fidx, didx), det) in positions.iter().zip(smoothed) {
                frames[fidx][didx] = det;
            }
        }

        Track::new(self.times.iter().copied(), frames)
    }
}
