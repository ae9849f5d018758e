//! Per-object light state: one stack of playing anims per priority layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use animstream_api_core::ObjectLights;

use crate::callbacks::CallbackHandle;
use crate::pattern::{LightAnim, LightPattern};

/// Priority tiers, highest first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LightLayer {
    /// Game and SDK requests.
    User,
    /// Internal behaviors and actions.
    Behavior,
    /// Ambient state-driven lights; always has something to show.
    Default,
}

pub const LAYER_COUNT: usize = 3;

impl LightLayer {
    pub const ALL: [LightLayer; LAYER_COUNT] =
        [LightLayer::User, LightLayer::Behavior, LightLayer::Default];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// True when `self` outranks or equals `other`.
    #[inline]
    pub fn at_least(self, other: LightLayer) -> bool {
        self.index() <= other.index()
    }
}

/// What happened when a displayed anim was stepped to the current time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    Playing,
    Finished,
}

/// One anim playing on one layer of one object.
#[derive(Clone, Debug)]
pub struct CurrentAnimInfo {
    pub name: String,
    pub trigger: String,
    anim: Arc<LightAnim>,
    pub pattern_index: usize,
    /// `None` while the current pattern plays until stopped.
    pub pattern_end_ms: Option<u64>,
    paused_at_ms: Option<u64>,
    pub can_be_overridden: bool,
    pub callback: Option<CallbackHandle>,
    pub is_blended: bool,
    pub stop_now: bool,
    pub owner_tag: Option<u32>,
}

impl CurrentAnimInfo {
    pub fn new(trigger: &str, anim: Arc<LightAnim>, now_ms: u64) -> Self {
        let mut info = Self {
            name: anim.name.clone(),
            trigger: trigger.to_string(),
            can_be_overridden: anim.can_be_overridden(),
            anim,
            pattern_index: 0,
            pattern_end_ms: None,
            paused_at_ms: None,
            callback: None,
            is_blended: false,
            stop_now: false,
            owner_tag: None,
        };
        info.pattern_end_ms = info.end_from(now_ms);
        info
    }

    fn end_from(&self, start_ms: u64) -> Option<u64> {
        self.pattern()
            .map(|p| p.duration_ms as u64)
            .filter(|d| *d > 0)
            .map(|d| start_ms + d)
    }

    pub fn anim(&self) -> &Arc<LightAnim> {
        &self.anim
    }

    pub fn pattern(&self) -> Option<&LightPattern> {
        self.anim.patterns.get(self.pattern_index)
    }

    pub fn lights(&self) -> Option<&ObjectLights> {
        self.pattern().map(|p| &p.lights)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    pub fn pause(&mut self, now_ms: u64) {
        if self.paused_at_ms.is_none() {
            self.paused_at_ms = Some(now_ms);
        }
    }

    /// Continue the same pattern, pushing its end out by the time spent paused.
    pub fn resume(&mut self, now_ms: u64) {
        if let Some(paused_at) = self.paused_at_ms.take() {
            let paused_for = now_ms.saturating_sub(paused_at);
            self.pattern_end_ms = self.pattern_end_ms.map(|e| e + paused_for);
        }
    }

    /// Advance through every pattern whose end has passed. Each following
    /// pattern starts at the previous end so timing does not drift with the tick.
    pub fn step(&mut self, now_ms: u64) -> Step {
        while let Some(end) = self.pattern_end_ms {
            if now_ms < end {
                break;
            }
            self.pattern_index += 1;
            if self.pattern_index >= self.anim.len() {
                return Step::Finished;
            }
            self.pattern_end_ms = self.end_from(end);
        }
        if self.pattern_index >= self.anim.len() {
            Step::Finished
        } else {
            Step::Playing
        }
    }
}

/// Stack of anims on one layer; the most recent push is on top.
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    entries: Vec<CurrentAnimInfo>,
}

impl LayerStack {
    pub fn push(&mut self, info: CurrentAnimInfo) {
        self.entries.push(info);
    }

    pub fn pop(&mut self) -> Option<CurrentAnimInfo> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<&CurrentAnimInfo> {
        self.entries.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut CurrentAnimInfo> {
        self.entries.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrentAnimInfo> + '_ {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CurrentAnimInfo> + '_ {
        self.entries.iter_mut()
    }

    /// Remove entries flagged `stop_now`, returning them top-down.
    pub fn take_stopped(&mut self) -> Vec<CurrentAnimInfo> {
        let mut stopped = Vec::new();
        let mut i = self.entries.len();
        while i > 0 {
            i -= 1;
            if self.entries[i].stop_now {
                stopped.push(self.entries.remove(i));
            }
        }
        stopped
    }

    pub fn drain(&mut self) -> impl Iterator<Item = CurrentAnimInfo> + '_ {
        self.entries.drain(..)
    }
}

/// Light state of one physical object.
#[derive(Clone, Debug)]
pub struct ObjectLightState {
    pub current_layer: LightLayer,
    stacks: [LayerStack; LAYER_COUNT],
    /// Modified and blended anims built for this object, dropped once unreferenced.
    synthesized: [Vec<Arc<LightAnim>>; LAYER_COUNT],
    pub only_game_layer: bool,
    pub(crate) last_sent: Option<ObjectLights>,
}

impl Default for ObjectLightState {
    fn default() -> Self {
        Self {
            current_layer: LightLayer::Default,
            stacks: Default::default(),
            synthesized: Default::default(),
            only_game_layer: false,
            last_sent: None,
        }
    }
}

impl ObjectLightState {
    pub fn stack(&self, layer: LightLayer) -> &LayerStack {
        &self.stacks[layer.index()]
    }

    pub fn stack_mut(&mut self, layer: LightLayer) -> &mut LayerStack {
        &mut self.stacks[layer.index()]
    }

    pub fn last_sent(&self) -> Option<&ObjectLights> {
        self.last_sent.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.stacks.iter().all(|s| s.is_empty())
    }

    pub(crate) fn keep_synthesized(&mut self, layer: LightLayer, anim: Arc<LightAnim>) {
        self.synthesized[layer.index()].push(anim);
    }

    pub fn synthesized_count(&self, layer: LightLayer) -> usize {
        self.synthesized[layer.index()].len()
    }

    /// Release synthesized anims no stack entry refers to anymore.
    pub fn collect_synthesized(&mut self) {
        for list in self.synthesized.iter_mut() {
            list.retain(|a| Arc::strong_count(a) > 1);
        }
    }

    fn layer_enabled(&self, layer: LightLayer) -> bool {
        !self.only_game_layer || layer == LightLayer::User
    }

    /// Highest-priority enabled layer with something on it.
    pub fn highest_active_layer(&self) -> Option<LightLayer> {
        LightLayer::ALL
            .into_iter()
            .find(|l| self.layer_enabled(*l) && !self.stack(*l).is_empty())
    }

    /// Re-derive the current layer and make the displayed entry the only running one.
    pub fn settle(&mut self, now_ms: u64) {
        self.current_layer = self.highest_active_layer().unwrap_or(LightLayer::Default);
        let current = self.current_layer;
        for layer in LightLayer::ALL {
            let stack = &mut self.stacks[layer.index()];
            let top = stack.len().checked_sub(1);
            for (i, entry) in stack.iter_mut().enumerate() {
                if layer == current && Some(i) == top {
                    entry.resume(now_ms);
                } else {
                    entry.pause(now_ms);
                }
            }
        }
    }

    pub fn displayed(&self) -> Option<&CurrentAnimInfo> {
        if !self.layer_enabled(self.current_layer) {
            return None;
        }
        self.stack(self.current_layer).top()
    }

    pub fn displayed_mut(&mut self) -> Option<&mut CurrentAnimInfo> {
        if !self.layer_enabled(self.current_layer) {
            return None;
        }
        self.stacks[self.current_layer.index()].top_mut()
    }

    /// Pop the displayed entry (after it finished).
    pub fn pop_displayed(&mut self) -> Option<CurrentAnimInfo> {
        self.stacks[self.current_layer.index()].pop()
    }

    /// Pull every entry flagged `stop_now` off every layer.
    pub fn take_stopped(&mut self) -> Vec<CurrentAnimInfo> {
        self.stacks.iter_mut().flat_map(|s| s.take_stopped()).collect()
    }

    /// Tear down all layers, returning the removed entries.
    pub fn take_all(&mut self) -> Vec<CurrentAnimInfo> {
        self.stacks.iter_mut().flat_map(|s| s.drain().collect::<Vec<_>>()).collect()
    }
}
