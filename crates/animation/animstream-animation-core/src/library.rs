//! Shared, immutable animation storage resolved by name.

use std::sync::Arc;

use hashbrown::HashMap;
use log::{error, info};

use crate::config::Config;
use crate::error::LoadError;
use crate::ids::{AnimId, IdAllocator};
use crate::stored_animation::parse_animations_json;
use crate::track::Track;

/// Name-to-track resolution consumed by the engine.
pub trait TrackSource {
    fn resolve_track(&self, name: &str) -> Option<Arc<Track>>;
}

/// Result of loading a multi-animation document: bad entries fail alone.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, LoadError)>,
}

#[derive(Debug, Default)]
pub struct AnimationLibrary {
    ids: IdAllocator,
    by_name: HashMap<String, AnimId>,
    tracks: HashMap<AnimId, Arc<Track>>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a track under its name. Playbacks already holding the
    /// previous track keep it until they finish.
    pub fn insert(&mut self, track: Track) -> AnimId {
        let id = match self.by_name.get(&track.name) {
            Some(id) => *id,
            None => {
                let id = self.ids.alloc_anim();
                self.by_name.insert(track.name.clone(), id);
                id
            }
        };
        self.tracks.insert(id, Arc::new(track));
        id
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.by_name.remove(name) {
            Some(id) => self.tracks.remove(&id).is_some(),
            None => false,
        }
    }

    pub fn id_of(&self, name: &str) -> Option<AnimId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: AnimId) -> Option<&Arc<Track>> {
        self.tracks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(|k| k.as_str())
    }

    /// Load every animation in a JSON document. Only an unparsable document is an error.
    pub fn load_json(&mut self, json: &str, cfg: &Config) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();
        for parsed in parse_animations_json(json, cfg)? {
            match parsed.result {
                Ok(track) => {
                    self.insert(track);
                    report.loaded.push(parsed.name);
                }
                Err(e) => {
                    error!("failed to load animation '{}': {e}", parsed.name);
                    report.failed.push((parsed.name, e));
                }
            }
        }
        info!(
            "animation library: loaded {}, failed {}",
            report.loaded.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

impl TrackSource for AnimationLibrary {
    fn resolve_track(&self, name: &str) -> Option<Arc<Track>> {
        self.id_of(name).and_then(|id| self.tracks.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;

    #[test]
    fn replacing_keeps_the_same_id() {
        let mut lib = AnimationLibrary::new();
        let a = lib.insert(Track::from_keyframes("wave", vec![Keyframe::event(0, "a")]));
        let b = lib.insert(Track::from_keyframes("wave", vec![Keyframe::event(0, "b")]));
        assert_eq!(a, b);
        assert_eq!(lib.len(), 1);
        assert!(lib.resolve_track("wave").is_some());
        assert!(lib.resolve_track("nope").is_none());
        assert!(lib.remove("wave"));
        assert!(lib.resolve_track("wave").is_none());
    }
}
