//! One playing instance of a track: per-channel cursors over a shared clock.

use std::sync::Arc;

use log::debug;

use animstream_api_core::DeviceMessage;

use crate::ids::{AnimId, InstId};
use crate::keyframe::{KeyframeContext, KeyframeState};
use crate::track::{Channel, Track, CHANNEL_COUNT};

/// Position of one channel within its keyframe list.
#[derive(Clone, Debug, Default)]
pub struct ChannelCursor {
    pub index: usize,
    pub state: KeyframeState,
}

impl ChannelCursor {
    fn advance(&mut self) {
        self.index += 1;
        self.state.reset();
    }
}

/// Playback of one track. Cursors only move forward within a pass.
#[derive(Debug)]
pub struct PlaybackInstance {
    pub id: InstId,
    pub anim: Option<AnimId>,
    track: Arc<Track>,
    cursors: [ChannelCursor; CHANNEL_COUNT],
    /// Animation-relative time of the next tick driven through `advance`.
    time_ms: u32,
    last_tick_ms: Option<u32>,
    /// `None` loops forever.
    loops_remaining: Option<u32>,
    loops_completed: u32,
}

/// Outcome of a tick once the track has no keyframes left.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PassState {
    Running,
    Looped,
    Finished,
}

impl PlaybackInstance {
    /// `num_loops == 0` repeats until aborted.
    pub fn new(id: InstId, anim: Option<AnimId>, track: Arc<Track>, num_loops: u32) -> Self {
        Self {
            id,
            anim,
            track,
            cursors: Default::default(),
            time_ms: 0,
            last_tick_ms: None,
            loops_remaining: (num_loops > 0).then_some(num_loops),
            loops_completed: 0,
        }
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    pub fn name(&self) -> &str {
        &self.track.name
    }

    pub fn cursor(&self, channel: Channel) -> usize {
        self.cursors[channel.index()].index
    }

    pub fn keyframe_state(&self, channel: Channel) -> &KeyframeState {
        &self.cursors[channel.index()].state
    }

    pub fn time_ms(&self) -> u32 {
        self.time_ms
    }

    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    /// All channels have moved past their last keyframe.
    pub fn is_exhausted(&self) -> bool {
        Channel::ALL
            .iter()
            .all(|ch| self.cursor(*ch) >= self.track.keyframes(*ch).len())
    }

    /// Stream everything due at `elapsed_ms` (animation-relative). Earlier
    /// times than a previous tick are treated as that tick's time.
    pub fn tick(
        &mut self,
        elapsed_ms: u32,
        ctx: &mut KeyframeContext<'_>,
        out: &mut Vec<(Channel, DeviceMessage)>,
    ) {
        let now = match self.last_tick_ms {
            Some(last) if elapsed_ms < last => {
                debug!(
                    "playback {:?}: non-monotonic tick {elapsed_ms} < {last}, holding clock",
                    self.id
                );
                last
            }
            _ => elapsed_ms,
        };
        self.last_tick_ms = Some(now);
        self.time_ms = now;
        ctx.now_ms = now;

        let track = Arc::clone(&self.track);
        for channel in Channel::ALL {
            let keyframes = track.keyframes(channel);
            let cursor = &mut self.cursors[channel.index()];
            while let Some(kf) = keyframes.get(cursor.index) {
                if !kf.is_time_to_play(now) {
                    break;
                }
                let next = keyframes.get(cursor.index + 1);
                if let Some(msg) = kf.stream_message(&mut cursor.state, next, ctx) {
                    out.push((channel, msg));
                }
                if !kf.is_done(&mut cursor.state, ctx) {
                    break;
                }
                cursor.advance();
            }
        }
    }

    /// Tick at the instance's own clock, then move that clock forward by `dt_ms`.
    /// Restarts the pass when the track is exhausted and loops remain.
    pub fn advance(
        &mut self,
        dt_ms: u32,
        ctx: &mut KeyframeContext<'_>,
        out: &mut Vec<(Channel, DeviceMessage)>,
    ) -> PassState {
        self.tick(self.time_ms, ctx, out);
        self.time_ms = self.time_ms.saturating_add(dt_ms);
        if !self.is_exhausted() {
            return PassState::Running;
        }
        self.loops_completed = self.loops_completed.saturating_add(1);
        match self.loops_remaining.as_mut() {
            Some(n) if *n <= 1 => PassState::Finished,
            Some(n) => {
                *n -= 1;
                self.restart();
                PassState::Looped
            }
            None => {
                self.restart();
                PassState::Looped
            }
        }
    }

    fn restart(&mut self) {
        self.cursors = Default::default();
        self.time_ms = 0;
        self.last_tick_ms = None;
    }
}
