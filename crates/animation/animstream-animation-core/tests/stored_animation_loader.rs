use animstream_animation_core::{
    AnimationLibrary, Channel, Config, DeviceMessage, Engine, Inputs, KeyframeKind, LoadError,
    TrackSource,
};
use animstream_api_core::{EyeParam, Rgba, TurnToHeading};

#[test]
fn loads_shared_fixture_into_channels() {
    let json = animstream_test_fixtures::animations::json("basic-moves").expect("load basic-moves");
    let mut lib = AnimationLibrary::new();
    let report = lib.load_json(&json, &Config::default()).expect("document parses");
    assert!(report.failed.is_empty(), "{:?}", report.failed);
    assert_eq!(lib.len(), 3);

    let nod = lib.resolve_track("nod").expect("nod");
    assert_eq!(nod.keyframes(Channel::Head).len(), 2);
    assert_eq!(nod.keyframes(Channel::Lift).len(), 1);
    assert_eq!(nod.keyframes(Channel::Event).len(), 1);

    let spin = lib.resolve_track("spin").expect("spin");
    let body = spin.keyframes(Channel::Body);
    assert_eq!(body.len(), 3);
    assert!(matches!(body[0].kind, KeyframeKind::RecordHeading));
    match &body[2].kind {
        KeyframeKind::TurnToRecordedHeading {
            accel_deg_per_sec2,
            decel_deg_per_sec2,
            ..
        } => {
            assert_eq!(*accel_deg_per_sec2, 10_000);
            assert_eq!(*decel_deg_per_sec2, 500);
        }
        other => panic!("unexpected {other:?}"),
    }

    let chirp = lib.resolve_track("chirp").expect("chirp");
    match &chirp.keyframes(Channel::Face)[0].kind {
        KeyframeKind::FaceAnimation { animation_name, .. } => assert_eq!(animation_name, "chirp_face"),
        other => panic!("unexpected {other:?}"),
    }
    match &chirp.keyframes(Channel::Face)[2].kind {
        KeyframeKind::ProceduralFace { face } => {
            assert_eq!(face.face_angle_deg, 20.0);
            assert_eq!(face.left(EyeParam::Angle), 0.0);
            assert_eq!(face.left(EyeParam::ScaleY), 0.5);
            // Unlisted parameters stay neutral.
            assert_eq!(face.right(EyeParam::UpperLidY), 0.0);
        }
        other => panic!("unexpected {other:?}"),
    }
    match &chirp.keyframes(Channel::Audio)[0].kind {
        KeyframeKind::RobotAudio { references } => {
            assert_eq!(references.len(), 2);
            assert!(references.iter().all(|r| r.has_alternates && r.volume == 0.8));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn bad_animations_fail_alone() {
    let json = animstream_test_fixtures::animations::json("mixed-validity").expect("load mixed-validity");
    let mut lib = AnimationLibrary::new();
    let report = lib.load_json(&json, &Config::default()).expect("document parses");
    assert_eq!(report.loaded, vec!["good_blink".to_string()]);
    assert_eq!(report.failed.len(), 2);
    for (name, err) in &report.failed {
        match name.as_str() {
            "bad_probabilities" => assert!(matches!(err, LoadError::ProbabilitySumExceeded { .. })),
            "bad_radius" => assert!(matches!(err, LoadError::UnknownRadius { .. })),
            other => panic!("unexpected failure {other}"),
        }
    }
    assert!(lib.resolve_track("bad_radius").is_none());
}

#[test]
fn invalid_document_is_rejected() {
    let mut lib = AnimationLibrary::new();
    assert!(matches!(
        lib.load_json("[1, 2]", &Config::default()),
        Err(LoadError::Json(_))
    ));
    assert!(lib.is_empty());
}

#[test]
fn loaded_spin_streams_clamped_wire_messages() {
    let json = animstream_test_fixtures::animations::json("basic-moves").expect("load basic-moves");
    let mut engine = Engine::new(Config {
        rng_seed: Some(3),
        ..Config::default()
    });
    engine.load_animations_json(&json).expect("document parses");

    let out = engine.update(33, Inputs::play("spin"));
    let first: Vec<&DeviceMessage> = out.messages.iter().map(|m| &m.message).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0], &DeviceMessage::RecordHeading);
    assert_eq!(
        first[1],
        &DeviceMessage::BodyMotion {
            speed_mmps: 300,
            accel_mmps2: 0,
            curvature_radius_mm: 0
        }
    );
    match first[2] {
        DeviceMessage::BackpackLights(lights) => {
            assert_eq!(lights.on_colors[0], Rgba::RED);
            assert_eq!(lights.on_colors[4], Rgba::OFF);
        }
        other => panic!("unexpected {other:?}"),
    }

    // Body stop at 500 ms, then the recorded-heading turn at 600 ms.
    let mut later = Vec::new();
    for _ in 0..20 {
        let out = engine.update(33, Inputs::default());
        later.extend(out.on_channel(Channel::Body).cloned());
    }
    assert_eq!(
        later,
        vec![
            DeviceMessage::BodyMotion {
                speed_mmps: 0,
                accel_mmps2: 0,
                curvature_radius_mm: 0
            },
            DeviceMessage::TurnToRecordedHeading(TurnToHeading {
                offset_deg: 0,
                speed_deg_per_sec: 200,
                accel_deg_per_sec2: 10_000,
                decel_deg_per_sec2: 500,
                tolerance_deg: 2,
                num_half_revs: 0,
                use_shortest_dir: true,
            }),
        ]
    );
}
