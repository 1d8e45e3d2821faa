//! Confirmed-photo accumulator.
//!
//! Owns every confirmed photo exclusively. One photo per step, keyed by
//! step id, never overwritten once confirmed; retakes only ever discard the
//! pending review artifact upstream of this type.

use crate::types::CapturedPhoto;

#[derive(Debug, Default)]
pub struct SessionAccumulator {
    photos: Vec<CapturedPhoto>,
}

impl SessionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a confirmed photo. Idempotent per step id: a duplicate confirm
    /// leaves the list unchanged and returns false.
    pub fn confirm(&mut self, photo: CapturedPhoto) -> bool {
        if self.contains(&photo.step_id) {
            log::debug!("step {} already confirmed, ignoring duplicate", photo.step_id);
            return false;
        }
        self.photos.push(photo);
        true
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.photos.iter().any(|p| p.step_id == step_id)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photos(&self) -> &[CapturedPhoto] {
        &self.photos
    }

    /// Hand the ordered list to the downstream consumer.
    pub fn into_photos(self) -> Vec<CapturedPhoto> {
        self.photos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn photo(step_id: &str) -> CapturedPhoto {
        CapturedPhoto {
            step_id: step_id.to_string(),
            label: step_id.to_string(),
            width: 4,
            height: 4,
            image_data: vec![0xFF, 0xD8],
            quality_score: 50.0,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let mut acc = SessionAccumulator::new();
        assert!(acc.confirm(photo("front")));
        assert!(!acc.confirm(photo("front")));
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_order_preserved() {
        let mut acc = SessionAccumulator::new();
        acc.confirm(photo("a"));
        acc.confirm(photo("b"));
        acc.confirm(photo("c"));
        let ids: Vec<_> = acc.into_photos().into_iter().map(|p| p.step_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
