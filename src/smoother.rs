use std::collections::VecDeque;

use crate::bbox::BBox;
use crate::detection::Detection;

/// Temporal filter over one identity's ordered detections.
///
/// Implementations must return exactly one detection per input detection,
/// in the same order.
pub trait Smoother {
    fn smooth(&self, detections: &[Detection]) -> Vec<Detection>;
}

/// Trailing moving average of box corners over the last `length` detections
///
/// The window counts detections, not frames: frames where the identity is
/// missing are not part of the slice and don't shorten the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverageSmoother {
    length: usize,
}

impl MovingAverageSmoother {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for MovingAverageSmoother {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Smoother for MovingAverageSmoother {
    fn smooth(&self, detections: &[Detection]) -> Vec<Detection> {
        let mut history: VecDeque<[f32; 4]> = VecDeque::with_capacity(self.length);

        detections
            .iter()
            .map(|det| {
                if history.len() == self.length {
                    history.pop_front();
                }
                history.push_back(*det.bbox.as_slice());

                let mut corners = [0.0f32; 4];
                for bbox in &history {
                    corners.iter_mut().zip(bbox).for_each(|(acc, v)| *acc += v);
                }

                let n = history.len() as f32;
                corners.iter_mut().for_each(|acc| *acc /= n);

                Detection {
                    bbox: BBox::assigned(&corners),
                    ..*det
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dets(sides: &[f32]) -> Vec<Detection> {
        sides
            .iter()
            .map(|&s| Detection::new(1, BBox::ltrb(0.0, 0.0, s, s)))
            .collect()
    }

    #[test]
    fn test_length_one_is_identity() {
        let input = dets(&[10.0, 30.0, 20.0]);

        assert_eq!(MovingAverageSmoother::new(1).smooth(&input), input);
    }

    #[test]
    fn test_trailing_average() {
        let out = MovingAverageSmoother::new(2).smooth(&dets(&[10.0, 20.0, 40.0]));

        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[0].width(), 10.0);
        assert_relative_eq!(out[1].width(), 15.0);
        assert_relative_eq!(out[2].width(), 30.0);
    }

    #[test]
    fn test_keeps_identity_fields() {
        let mut input = dets(&[10.0, 12.0]);
        input[1].confidence = Some(0.9);
        input[1].class = Some(3);

        let out = MovingAverageSmoother::default().smooth(&input);

        assert_eq!(out[1].track_id, 1);
        assert_eq!(out[1].confidence, Some(0.9));
        assert_eq!(out[1].class, Some(3));
    }

    #[test]
    fn test_zero_length_is_clamped() {
        assert_eq!(MovingAverageSmoother::new(0).length(), 1);
    }
}
