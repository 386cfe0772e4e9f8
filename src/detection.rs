use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// Identity assigned by the external tracker
pub type TrackId = u32;

/// Contains bbox corners (x_min, y_min, x_max, y_max) in px and the tracker identity
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "id")]
    pub track_id: TrackId,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<i32>,
}

impl Detection {
    #[inline]
    pub fn new(track_id: TrackId, bbox: BBox<Ltrb>) -> Self {
        Self {
            bbox,
            track_id,
            confidence: None,
            class: None,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.bbox.width()
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.bbox.height()
    }

    /// (width, height) in px
    #[inline(always)]
    pub fn size(&self) -> (f32, f32) {
        self.bbox.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_short_names() {
        let det: Detection =
            serde_json::from_str(r#"{"bbox":[10,10,30,25],"id":7,"p":0.8,"c":0}"#).unwrap();

        assert_eq!(det.track_id, 7);
        assert_eq!(det.size(), (20.0, 15.0));
        assert_eq!(det.confidence, Some(0.8));
        assert_eq!(det.class, Some(0));
    }

    #[test]
    fn test_optional_fields_are_skipped() {
        let det = Detection::new(3, BBox::ltrb(0.0, 0.0, 2.0, 2.0));
        let json = serde_json::to_string(&det).unwrap();

        assert_eq!(json, r#"{"bbox":[0.0,0.0,2.0,2.0],"id":3}"#);
    }
}
