//! Cube light scheduler: per-object layer stacks resolved once per tick into
//! `SetObjectLights` messages.
//!
//! Play requests take effect immediately (the new top is shown in the same
//! tick if its layer is current). Stops are logical: entries are flagged and
//! removed at the start of the next `update`.

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};

use animstream_api_core::{CubeLightsFrame, DeviceMessage, ObjectId, ObjectLights, PoseState, PoseStateProvider};

use crate::callbacks::{Callback, CallbackHandle, CallbackRegistry};
use crate::config::LightsConfig;
use crate::error::PlayError;
use crate::layer::{CurrentAnimInfo, LightLayer, ObjectLightState, Step};
use crate::library::LightAnimSource;

/// Which objects a stop or mode change applies to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ObjectSelector {
    All,
    One(ObjectId),
}

impl ObjectSelector {
    fn matches(self, object: ObjectId) -> bool {
        match self {
            ObjectSelector::All => true,
            ObjectSelector::One(o) => o == object,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SleepMode {
    Fade,
    NoFade,
}

#[derive(Clone, Debug, Default)]
pub struct PlayOptions {
    /// Recolor every pattern; durations stay as authored.
    pub modifier: Option<ObjectLights>,
    /// Fill unset colors from what the object currently shows.
    pub blend: bool,
    /// Invoked once when the anim completes or is stopped.
    pub callback: Option<CallbackHandle>,
    pub owner_tag: Option<u32>,
}

impl PlayOptions {
    pub fn with_callback(callback: CallbackHandle) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    pub fn blended() -> Self {
        Self {
            blend: true,
            ..Self::default()
        }
    }
}

pub struct CubeLightScheduler {
    cfg: LightsConfig,
    library: Box<dyn LightAnimSource>,
    pose: Box<dyn PoseStateProvider>,
    callbacks: CallbackRegistry,
    objects: IndexMap<ObjectId, ObjectLightState>,
    now_ms: u64,
    outbox: Vec<DeviceMessage>,
    sleep: Option<SleepMode>,
}

impl CubeLightScheduler {
    pub fn new(
        cfg: LightsConfig,
        library: Box<dyn LightAnimSource>,
        pose: Box<dyn PoseStateProvider>,
    ) -> Self {
        Self {
            cfg,
            library,
            pose,
            callbacks: CallbackRegistry::new(),
            objects: IndexMap::new(),
            now_ms: 0,
            outbox: Vec::new(),
            sleep: None,
        }
    }

    pub fn config(&self) -> &LightsConfig {
        &self.cfg
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn set_pose_provider(&mut self, pose: Box<dyn PoseStateProvider>) {
        self.pose = pose;
    }

    pub fn register_callback(&mut self, callback: Callback) -> CallbackHandle {
        self.callbacks.register(callback)
    }

    pub fn invalidate_callback(&mut self, handle: CallbackHandle) -> bool {
        self.callbacks.invalidate(handle)
    }

    pub fn callback_is_valid(&self, handle: CallbackHandle) -> bool {
        self.callbacks.is_valid(handle)
    }

    /// Play `trigger` on `layer`. Failures are logged and reported as `false`.
    pub fn play(
        &mut self,
        object: ObjectId,
        trigger: &str,
        layer: LightLayer,
        opts: PlayOptions,
    ) -> bool {
        self.try_play(object, trigger, layer, opts).is_ok()
    }

    /// Like [`play`](Self::play) with the refusal reason. A refused request
    /// invalidates its callback so it never fires.
    pub fn try_play(
        &mut self,
        object: ObjectId,
        trigger: &str,
        layer: LightLayer,
        opts: PlayOptions,
    ) -> Result<(), PlayError> {
        let result = self.push_anim(object, trigger, layer, &opts);
        if let Err(err) = &result {
            warn!("light play {object:?} '{trigger}' on {layer:?} refused: {err}");
            if let Some(handle) = opts.callback {
                self.callbacks.invalidate(handle);
            }
        }
        result
    }

    fn push_anim(
        &mut self,
        object: ObjectId,
        trigger: &str,
        layer: LightLayer,
        opts: &PlayOptions,
    ) -> Result<(), PlayError> {
        let (_, mut anim) = self
            .library
            .resolve(trigger)
            .ok_or_else(|| PlayError::UnknownTrigger(trigger.to_string()))?;
        let now = self.now_ms;
        let state = self.objects.entry(object).or_default();

        if state.only_game_layer && layer != LightLayer::User {
            return Err(PlayError::LayerDisabled { layer });
        }
        if let Some(top) = state.stack(layer).top() {
            if !top.can_be_overridden && !top.stop_now {
                return Err(PlayError::NotOverridable {
                    layer,
                    anim: top.name.clone(),
                });
            }
        }

        let mut synthesized = false;
        if let Some(modifier) = &opts.modifier {
            anim = Arc::new(anim.with_modifier(modifier));
            synthesized = true;
        }

        let mut is_blended = false;
        if opts.blend {
            if let Some(shown) = state.last_sent().cloned() {
                let target_top = state.stack(layer).top();
                let top_blended = target_top.is_some_and(|t| t.is_blended);
                let prev = target_top
                    .or_else(|| state.displayed())
                    .map_or_else(|| "off".to_string(), |d| d.name.clone());
                if let Some(blended) = anim.blended_over(&shown, &prev) {
                    if top_blended {
                        return Err(PlayError::AlreadyBlended {
                            anim: anim.name.clone(),
                        });
                    }
                    anim = Arc::new(blended);
                    is_blended = true;
                    synthesized = true;
                }
            }
        }

        // A hold-forever anim replaces whatever was on the layer instead of stacking on it.
        let holds_forever = anim.patterns.first().is_some_and(|p| p.duration_ms == 0);
        if !is_blended && holds_forever {
            let replaced: Vec<CurrentAnimInfo> = state.stack_mut(layer).drain().collect();
            for entry in replaced {
                if let Some(handle) = entry.callback {
                    self.callbacks.invalidate(handle);
                }
            }
        }

        let mut info = CurrentAnimInfo::new(trigger, anim.clone(), now);
        info.callback = opts.callback;
        info.is_blended = is_blended;
        info.owner_tag = opts.owner_tag;
        if synthesized {
            state.keep_synthesized(layer, anim);
        }
        debug!("light {object:?}: '{}' pushed on {layer:?}", info.name);
        state.stack_mut(layer).push(info);

        refresh(object, state, now, &self.cfg, &mut self.outbox);
        Ok(())
    }

    /// Flag every entry playing `trigger` on `layer`. Removed on the next update.
    pub fn stop(&mut self, selector: ObjectSelector, trigger: &str, layer: LightLayer) -> bool {
        let mut found = false;
        for (object, state) in self.objects.iter_mut() {
            if !selector.matches(*object) {
                continue;
            }
            for entry in state.stack_mut(layer).iter_mut() {
                if entry.trigger == trigger {
                    entry.stop_now = true;
                    found = true;
                }
            }
        }
        if !found {
            warn!("light stop: '{trigger}' not playing on {layer:?} for {selector:?}");
        }
        found
    }

    pub fn stop_all_on_layer(&mut self, selector: ObjectSelector, layer: LightLayer) {
        for (object, state) in self.objects.iter_mut() {
            if selector.matches(*object) {
                for entry in state.stack_mut(layer).iter_mut() {
                    entry.stop_now = true;
                }
            }
        }
    }

    pub fn stop_and_play(
        &mut self,
        object: ObjectId,
        stop_trigger: &str,
        play_trigger: &str,
        layer: LightLayer,
        opts: PlayOptions,
    ) -> bool {
        self.stop(ObjectSelector::One(object), stop_trigger, layer);
        self.play(object, play_trigger, layer, opts)
    }

    /// Forget an object. Pending callbacks are discarded, never invoked.
    pub fn remove_object(&mut self, object: ObjectId) -> bool {
        let Some(mut state) = self.objects.shift_remove(&object) else {
            return false;
        };
        for entry in state.take_all() {
            if let Some(handle) = entry.callback {
                self.callbacks.invalidate(handle);
            }
        }
        debug!("light {object:?}: removed");
        true
    }

    /// While enabled only the User layer is shown or accepted; when it runs
    /// empty the object goes dark.
    pub fn enable_game_layer_only(&mut self, selector: ObjectSelector, enabled: bool) {
        if let ObjectSelector::One(object) = selector {
            self.objects.entry(object).or_default();
        }
        for (object, state) in self.objects.iter_mut() {
            if !selector.matches(*object) {
                continue;
            }
            state.only_game_layer = enabled;
            if enabled {
                for layer in [LightLayer::Behavior, LightLayer::Default] {
                    for entry in state.stack_mut(layer).iter_mut() {
                        entry.stop_now = true;
                    }
                }
            }
        }
    }

    /// Switch default-layer selection to the sleep anims (or back). Current
    /// default anims are stopped so the next update picks again.
    pub fn enable_cube_sleep(&mut self, enabled: bool, skip_fade: bool) {
        self.sleep = match (enabled, skip_fade) {
            (false, _) => None,
            (true, false) => Some(SleepMode::Fade),
            (true, true) => Some(SleepMode::NoFade),
        };
        self.stop_all_on_layer(ObjectSelector::All, LightLayer::Default);
    }

    pub fn sleep_mode(&self) -> Option<SleepMode> {
        self.sleep
    }

    pub fn object_connected(&mut self, object: ObjectId) -> bool {
        self.objects.entry(object).or_default();
        let trigger = self.cfg.wake_up_trigger.clone();
        self.play(object, &trigger, LightLayer::Default, PlayOptions::default())
    }

    /// Re-pick the ambient anim when the default layer is the one showing.
    pub fn on_pose_state_changed(&mut self, object: ObjectId, old: PoseState, new: PoseState) {
        if old == new {
            return;
        }
        let Some(state) = self.objects.get_mut(&object) else {
            return;
        };
        if state.current_layer == LightLayer::Default {
            debug!("light {object:?}: pose {old:?} -> {new:?}, re-picking default");
            for entry in state.stack_mut(LightLayer::Default).iter_mut() {
                entry.stop_now = true;
            }
        }
    }

    pub fn anim_duration(&self, trigger: &str) -> Option<u64> {
        self.library.resolve(trigger).map(|(_, anim)| anim.duration_ms())
    }

    pub fn current_anim_info(&self, object: ObjectId, layer: LightLayer) -> Option<&CurrentAnimInfo> {
        self.objects.get(&object)?.stack(layer).top()
    }

    pub fn current_layer(&self, object: ObjectId) -> Option<LightLayer> {
        self.objects.get(&object).map(|s| s.current_layer)
    }

    pub fn object_state(&self, object: ObjectId) -> Option<&ObjectLightState> {
        self.objects.get(&object)
    }

    pub fn last_sent(&self, object: ObjectId) -> Option<&ObjectLights> {
        self.objects.get(&object)?.last_sent()
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Messages produced by play requests since the last `update`.
    pub fn take_pending_messages(&mut self) -> Vec<DeviceMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Wire form of a cube light state under this scheduler's config.
    pub fn encode(&self, lights: &ObjectLights) -> CubeLightsFrame {
        lights.to_wire(self.cfg.led_frame_ms, self.cfg.white_balance_green_blue_scale)
    }

    /// Advance every object by `dt_ms` and return the messages to send, in
    /// object registration order.
    pub fn update(&mut self, dt_ms: u32) -> Vec<DeviceMessage> {
        self.now_ms += dt_ms as u64;
        let objects: Vec<ObjectId> = self.objects.keys().copied().collect();
        for object in objects {
            self.update_object(object);
        }
        std::mem::take(&mut self.outbox)
    }

    fn update_object(&mut self, object: ObjectId) {
        let now = self.now_ms;
        let Some(state) = self.objects.get_mut(&object) else {
            return;
        };

        let mut finished: Vec<CallbackHandle> = state
            .take_stopped()
            .into_iter()
            .filter_map(|entry| entry.callback)
            .collect();

        loop {
            state.settle(now);
            let Some(top) = state.displayed_mut() else {
                break;
            };
            if top.step(now) == Step::Playing {
                break;
            }
            if let Some(done) = state.pop_displayed() {
                debug!("light {object:?}: '{}' finished", done.name);
                finished.extend(done.callback);
            }
        }
        state.collect_synthesized();

        let pick_default = state.is_idle() && !state.only_game_layer;
        if pick_default {
            let table = &self.cfg.default_table;
            let trigger = match self.sleep {
                Some(SleepMode::Fade) => table.sleep.clone(),
                Some(SleepMode::NoFade) => table.sleep_no_fade.clone(),
                None => table.lookup(self.pose.pose_state(object)).to_string(),
            };
            self.play(object, &trigger, LightLayer::Default, PlayOptions::default());
        }

        if let Some(state) = self.objects.get_mut(&object) {
            refresh(object, state, now, &self.cfg, &mut self.outbox);
        }
        for handle in finished {
            self.callbacks.invoke(handle);
        }
    }
}

/// Send the displayed lights, encoded for the device, when they differ from
/// what was last sent. The comparison is on the logical lights.
fn refresh(
    object: ObjectId,
    state: &mut ObjectLightState,
    now: u64,
    cfg: &LightsConfig,
    outbox: &mut Vec<DeviceMessage>,
) {
    state.settle(now);
    let lights = state
        .displayed()
        .and_then(|d| d.lights().cloned())
        .unwrap_or_else(ObjectLights::off);
    if state.last_sent.as_ref() == Some(&lights) {
        return;
    }
    let frame = lights.to_wire(cfg.led_frame_ms, cfg.white_balance_green_blue_scale);
    state.last_sent = Some(lights);
    outbox.push(DeviceMessage::SetObjectLights { object, lights: frame });
}
