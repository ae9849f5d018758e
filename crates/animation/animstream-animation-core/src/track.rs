//! Tracks: per-channel keyframe sequences sharing one animation clock.

use serde::{Deserialize, Serialize};

use crate::keyframe::Keyframe;

/// Independent sub-tracks, listed in the order they are processed each tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Channel {
    Head,
    Lift,
    Body,
    Face,
    Audio,
    Backpack,
    Event,
}

pub const CHANNEL_COUNT: usize = 7;

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Head,
        Channel::Lift,
        Channel::Body,
        Channel::Face,
        Channel::Audio,
        Channel::Backpack,
        Channel::Event,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A named animation. Immutable once built; shared across playbacks behind an `Arc`.
#[derive(Clone, Debug, Default)]
pub struct Track {
    pub name: String,
    channels: [Vec<Keyframe>; CHANNEL_COUNT],
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Default::default(),
        }
    }

    /// Build from keyframes in any order; each lands on its own channel.
    pub fn from_keyframes(name: impl Into<String>, keyframes: Vec<Keyframe>) -> Self {
        let mut track = Self::new(name);
        for kf in keyframes {
            track.push(kf);
        }
        track.sort();
        track
    }

    /// Append without re-sorting. Call `sort` before playback if order is unknown.
    pub fn push(&mut self, keyframe: Keyframe) {
        self.channels[keyframe.channel().index()].push(keyframe);
    }

    /// Stable sort each channel by trigger time.
    pub fn sort(&mut self) {
        for ch in self.channels.iter_mut() {
            ch.sort_by_key(|kf| kf.trigger_time_ms);
        }
    }

    #[inline]
    pub fn keyframes(&self, channel: Channel) -> &[Keyframe] {
        &self.channels[channel.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(|c| c.is_empty())
    }

    pub fn keyframe_count(&self) -> usize {
        self.channels.iter().map(|c| c.len()).sum()
    }

    /// Latest trigger time plus duration over all channels.
    pub fn last_keyframe_end_ms(&self) -> u32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|kf| kf.trigger_time_ms.saturating_add(kf.duration_ms()))
            .max()
            .unwrap_or(0)
    }
}
