use std::cell::{Cell, RefCell};
use std::rc::Rc;

use animstream_api_core::{
    CubeLightsFrame, DeviceMessage, ObjectId, ObjectLights, PoseState, PoseStateProvider, Rgba,
};
use animstream_lights_core::{
    CubeLightScheduler, LightAnimLibrary, LightAnimSource, LightLayer, LightsConfig,
    ObjectSelector, PlayError, PlayOptions,
};

const OBJ: ObjectId = ObjectId(7);

#[derive(Clone)]
struct SharedPose(Rc<RefCell<PoseState>>);

impl PoseStateProvider for SharedPose {
    fn pose_state(&self, _object: ObjectId) -> PoseState {
        *self.0.borrow()
    }
}

fn library() -> LightAnimLibrary {
    let json = animstream_test_fixtures::lights::json("cube-lights").expect("fixture");
    let mut lib = LightAnimLibrary::new();
    lib.load_json(&json).expect("library parses");
    lib
}

fn pattern_lights(lib: &LightAnimLibrary, anim: &str, index: usize) -> ObjectLights {
    lib.anim(anim).expect("anim").patterns[index].lights.clone()
}

fn wire(lights: &ObjectLights) -> CubeLightsFrame {
    let cfg = LightsConfig::default();
    lights.to_wire(cfg.led_frame_ms, cfg.white_balance_green_blue_scale)
}

fn frame(lib: &LightAnimLibrary, anim: &str, index: usize) -> CubeLightsFrame {
    wire(&pattern_lights(lib, anim, index))
}

fn scheduler_with_pose(pose: SharedPose) -> (CubeLightScheduler, LightAnimLibrary) {
    let lib = library();
    let s = CubeLightScheduler::new(LightsConfig::default(), Box::new(lib.clone()), Box::new(pose));
    (s, lib)
}

fn scheduler() -> (CubeLightScheduler, LightAnimLibrary) {
    scheduler_with_pose(SharedPose(Rc::new(RefCell::new(PoseState::Connected))))
}

fn lights_for(msgs: &[DeviceMessage], object: ObjectId) -> Vec<CubeLightsFrame> {
    msgs.iter()
        .filter_map(|m| match m {
            DeviceMessage::SetObjectLights { object: o, lights } if *o == object => Some(lights.clone()),
            _ => None,
        })
        .collect()
}

fn counter(s: &mut CubeLightScheduler) -> (Rc<Cell<u32>>, animstream_lights_core::CallbackHandle) {
    let hits = Rc::new(Cell::new(0));
    let h = {
        let hits = hits.clone();
        s.register_callback(Box::new(move || hits.set(hits.get() + 1)))
    };
    (hits, h)
}

#[test]
fn fixture_library_loads_every_anim_and_trigger() {
    let json = animstream_test_fixtures::lights::json("cube-lights").unwrap();
    let mut lib = LightAnimLibrary::new();
    let report = lib.load_json(&json).unwrap();
    assert_eq!(report.anims_loaded.len(), 8);
    assert_eq!(report.triggers_loaded.len(), 9);
    assert!(report.failed.is_empty());
    assert!(lib.resolve("Broken").is_none());
    assert_eq!(lib.resolve("Blink").map(|(_, a)| a.duration_ms()), Some(600));
}

#[test]
fn blink_then_stop_falls_back_to_the_default_layer() {
    let (mut s, lib) = scheduler();
    let (hits, h) = counter(&mut s);

    assert!(s.play(OBJ, "Blink", LightLayer::Behavior, PlayOptions::with_callback(h)));
    let shown = lights_for(&s.take_pending_messages(), OBJ);
    assert_eq!(shown, vec![frame(&lib, "blink_red", 0)]);
    assert_eq!(s.current_layer(OBJ), Some(LightLayer::Behavior));

    assert!(s.stop(ObjectSelector::One(OBJ), "Blink", LightLayer::Behavior));
    let shown = lights_for(&s.update(33), OBJ);
    assert_eq!(shown, vec![frame(&lib, "connected_blue", 0)]);
    assert_eq!(s.current_layer(OBJ), Some(LightLayer::Default));
    assert_eq!(hits.get(), 1);
    assert!(!s.callback_is_valid(h));
}

#[test]
fn stopped_overlay_resumes_the_layer_beneath_at_its_pattern() {
    let (mut s, lib) = scheduler();
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    assert!(s.play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::default()));
    s.update(150);
    assert_eq!(s.current_anim_info(OBJ, LightLayer::Behavior).unwrap().pattern_index, 1);

    assert!(s.play(OBJ, "Blink", LightLayer::User, PlayOptions::default()));
    s.update(50);
    assert_eq!(s.current_layer(OBJ), Some(LightLayer::User));
    let behavior = s.current_anim_info(OBJ, LightLayer::Behavior).unwrap();
    assert_eq!(behavior.pattern_index, 1);
    assert!(behavior.is_paused());

    s.stop(ObjectSelector::All, "Blink", LightLayer::User);
    let shown = lights_for(&s.update(100), OBJ);
    assert_eq!(shown, vec![frame(&lib, "tap_spin", 1)]);
    let behavior = s.current_anim_info(OBJ, LightLayer::Behavior).unwrap();
    assert_eq!(behavior.pattern_index, 1);
    // 50 ms of pattern 1 were left when it was paused at t=150.
    assert_eq!(behavior.pattern_end_ms, Some(350));

    let shown = lights_for(&s.update(50), OBJ);
    assert_eq!(shown, vec![frame(&lib, "tap_spin", 2)]);
}

#[test]
fn unchanged_state_is_sent_once_per_tick() {
    let (mut s, _) = scheduler();
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    let first = s.update(0);
    let second = s.update(0);
    assert_eq!(lights_for(&first, OBJ).len(), 1);
    assert!(second.is_empty());
    assert!(s.update(1_000).is_empty());
}

#[test]
fn completion_callback_runs_once_when_the_anim_ends() {
    let (mut s, _) = scheduler();
    let (hits, h) = counter(&mut s);
    assert!(s.play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::with_callback(h)));
    for _ in 0..2 {
        s.update(100);
    }
    assert_eq!(hits.get(), 0);
    for _ in 0..5 {
        s.update(100);
    }
    assert_eq!(hits.get(), 1);
    assert_eq!(s.current_layer(OBJ), Some(LightLayer::Default));
}

#[test]
fn removing_an_object_discards_callbacks() {
    let (mut s, _) = scheduler();
    let (hits, h) = counter(&mut s);
    assert!(s.play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::with_callback(h)));
    assert!(s.remove_object(OBJ));
    assert!(!s.callback_is_valid(h));
    let msgs = s.update(1_000);
    assert!(lights_for(&msgs, OBJ).is_empty());
    assert_eq!(hits.get(), 0);
    assert!(!s.remove_object(OBJ));
}

#[test]
fn game_layer_only_refuses_lower_layers_and_goes_dark() {
    let (mut s, lib) = scheduler();
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    s.update(0);

    s.enable_game_layer_only(ObjectSelector::One(OBJ), true);
    assert_eq!(
        s.try_play(OBJ, "Blink", LightLayer::Behavior, PlayOptions::default()),
        Err(PlayError::LayerDisabled {
            layer: LightLayer::Behavior
        })
    );
    assert_eq!(lights_for(&s.update(33), OBJ), vec![wire(&ObjectLights::off())]);
    assert!(s.update(33).is_empty());

    assert!(s.play(OBJ, "Blink", LightLayer::User, PlayOptions::default()));
    assert_eq!(lights_for(&s.update(0), OBJ), vec![frame(&lib, "blink_red", 0)]);

    s.enable_game_layer_only(ObjectSelector::All, false);
    s.update(600);
    assert_eq!(s.current_layer(OBJ), Some(LightLayer::Default));
    assert_eq!(s.last_sent(OBJ), Some(&pattern_lights(&lib, "connected_blue", 0)));
}

#[test]
fn sleep_mode_swaps_the_default_anim() {
    let (mut s, lib) = scheduler();
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    s.update(0);

    s.enable_cube_sleep(true, false);
    assert_eq!(lights_for(&s.update(33), OBJ), vec![frame(&lib, "sleep_fade", 0)]);
    assert_eq!(lights_for(&s.update(600), OBJ), vec![frame(&lib, "sleep_fade", 1)]);

    s.enable_cube_sleep(false, false);
    assert_eq!(
        lights_for(&s.update(33), OBJ),
        vec![frame(&lib, "connected_blue", 0)]
    );
}

#[test]
fn wake_up_cannot_be_overridden_until_it_finishes() {
    let (mut s, lib) = scheduler();
    assert!(s.object_connected(OBJ));
    assert_eq!(
        lights_for(&s.take_pending_messages(), OBJ),
        vec![frame(&lib, "wake_up", 0)]
    );
    assert!(matches!(
        s.try_play(OBJ, "Visible", LightLayer::Default, PlayOptions::default()),
        Err(PlayError::NotOverridable { .. })
    ));
    assert_eq!(
        lights_for(&s.update(400), OBJ),
        vec![frame(&lib, "connected_blue", 0)]
    );
}

#[test]
fn pose_change_repicks_the_default_anim() {
    let pose = SharedPose(Rc::new(RefCell::new(PoseState::Connected)));
    let (mut s, lib) = scheduler_with_pose(pose.clone());
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    s.update(0);

    *pose.0.borrow_mut() = PoseState::Visible;
    s.on_pose_state_changed(OBJ, PoseState::Connected, PoseState::Visible);
    assert_eq!(
        lights_for(&s.update(33), OBJ),
        vec![frame(&lib, "visible_green", 0)]
    );
}

#[test]
fn blending_inherits_shown_colors_once() {
    let (mut s, _) = scheduler();
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    s.update(0);

    assert!(s.play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::blended()));
    let info = s.current_anim_info(OBJ, LightLayer::Behavior).unwrap();
    assert!(info.is_blended);
    assert_eq!(info.name, "connected_blue+tap_spin");
    let shown = s.last_sent(OBJ).unwrap();
    assert_eq!(shown.on_colors, [Rgba::RED, Rgba::BLUE, Rgba::BLUE, Rgba::BLUE]);
    assert_eq!(shown.off_colors, [Rgba::BLUE; 4]);
    assert_eq!(
        s.object_state(OBJ).unwrap().synthesized_count(LightLayer::Behavior),
        1
    );

    assert!(matches!(
        s.try_play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::blended()),
        Err(PlayError::AlreadyBlended { .. })
    ));

    s.update(300);
    assert_eq!(
        s.object_state(OBJ).unwrap().synthesized_count(LightLayer::Behavior),
        0
    );
}

#[test]
fn modifier_recolors_without_changing_duration() {
    let (mut s, _) = scheduler();
    let mut modifier = ObjectLights::off();
    modifier.on_colors = [Rgba::GREEN; 4];
    let opts = PlayOptions {
        modifier: Some(modifier),
        ..PlayOptions::default()
    };
    assert!(s.play(OBJ, "Blink", LightLayer::User, opts));
    assert_eq!(s.last_sent(OBJ).unwrap().on_colors, [Rgba::GREEN; 4]);
    assert_eq!(
        s.current_anim_info(OBJ, LightLayer::User).unwrap().anim().duration_ms(),
        s.anim_duration("Blink").unwrap()
    );
    assert_eq!(s.anim_duration("Broken"), None);
}

#[test]
fn stop_and_play_swaps_anims_on_one_layer() {
    let (mut s, lib) = scheduler();
    assert!(s.play(OBJ, "Blink", LightLayer::Behavior, PlayOptions::default()));
    assert!(s.stop_and_play(OBJ, "Blink", "TapSpin", LightLayer::Behavior, PlayOptions::default()));
    s.update(0);
    assert_eq!(s.current_anim_info(OBJ, LightLayer::Behavior).unwrap().trigger, "TapSpin");
    assert_eq!(s.object_state(OBJ).unwrap().stack(LightLayer::Behavior).len(), 1);
    assert_eq!(s.last_sent(OBJ), Some(&pattern_lights(&lib, "tap_spin", 0)));
}

#[test]
fn emitted_lights_are_encoded_for_the_device() {
    let (mut s, _) = scheduler();
    assert!(s.play(OBJ, "Blink", LightLayer::Behavior, PlayOptions::default()));
    let shown = lights_for(&s.take_pending_messages(), OBJ);
    assert_eq!(shown.len(), 1);
    // 150 ms periods at 30 ms per LED frame.
    assert_eq!(shown[0].on_frames, [5; 4]);
    assert_eq!(shown[0].off_frames, [5; 4]);
    assert_eq!(shown[0].on_colors, [Rgba::RED; 4]);

    assert!(s.play(OBJ, "Carrying", LightLayer::User, PlayOptions::default()));
    let shown = lights_for(&s.take_pending_messages(), OBJ);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].on_colors, [Rgba::from_bytes(255, 153, 153, 255); 4]);
    assert_eq!(shown[0].on_frames, [255; 4]);
    // The logical lights stay unscaled.
    assert_eq!(s.last_sent(OBJ).unwrap().on_colors, [Rgba::WHITE; 4]);
}

#[test]
fn blended_top_on_another_layer_does_not_block_blending() {
    let (mut s, _) = scheduler();
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    s.update(0);

    assert!(s.play(OBJ, "TapSpin", LightLayer::User, PlayOptions::blended()));
    assert!(s.current_anim_info(OBJ, LightLayer::User).unwrap().is_blended);

    assert_eq!(
        s.try_play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::blended()),
        Ok(())
    );
    let behavior = s.current_anim_info(OBJ, LightLayer::Behavior).unwrap();
    assert!(behavior.is_blended);
    assert_eq!(s.current_layer(OBJ), Some(LightLayer::User));
}

#[test]
fn hold_forever_anim_drops_the_layer_and_invalidates_its_callbacks() {
    let (mut s, _) = scheduler();
    let (hits, h) = counter(&mut s);
    assert!(s.play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::with_callback(h)));
    assert!(s.play(OBJ, "Connected", LightLayer::Behavior, PlayOptions::default()));

    assert_eq!(s.object_state(OBJ).unwrap().stack(LightLayer::Behavior).len(), 1);
    assert!(!s.callback_is_valid(h));
    s.update(10);
    s.update(1_000);
    assert_eq!(hits.get(), 0);
    assert_eq!(
        s.current_anim_info(OBJ, LightLayer::Behavior).unwrap().trigger,
        "Connected"
    );
}

#[test]
fn stopping_a_layer_fires_every_callback_and_reveals_the_default() {
    let (mut s, lib) = scheduler();
    let (blink_hits, blink) = counter(&mut s);
    let (spin_hits, spin) = counter(&mut s);
    assert!(s.play(OBJ, "Connected", LightLayer::Default, PlayOptions::default()));
    assert!(s.play(OBJ, "Blink", LightLayer::Behavior, PlayOptions::with_callback(blink)));
    assert!(s.play(OBJ, "TapSpin", LightLayer::Behavior, PlayOptions::with_callback(spin)));
    s.take_pending_messages();

    s.stop_all_on_layer(ObjectSelector::One(OBJ), LightLayer::Behavior);
    let shown = lights_for(&s.update(10), OBJ);
    assert_eq!(blink_hits.get(), 1);
    assert_eq!(spin_hits.get(), 1);
    assert_eq!(s.current_layer(OBJ), Some(LightLayer::Default));
    assert_eq!(shown, vec![frame(&lib, "connected_blue", 0)]);
}
