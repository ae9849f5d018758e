use log::warn;

use animstream_api_core::{DeviceMessage, DeviceTransport};

use crate::diagnostics::PhaseTimer;

/// Hand one message to the transport and tally the outcome.
fn send(transport: &mut dyn DeviceTransport, message: &DeviceMessage, sent: &mut usize, failed: &mut usize) {
    if transport.send(message) {
        *sent += 1;
    } else {
        *failed += 1;
        warn!("transport dropped {:?}", message.kind());
    }
}

/// One control tick:
///   timeline engine -> cube lights -> backpack lights -> frame
///
/// Messages are sent in production order; a failed send is counted and the
/// tick carries on.
pub fn run_tick(orchestrator: &mut crate::Orchestrator, dt_ms: u32) -> crate::StreamFrame {
    let mut timer = PhaseTimer::new(&orchestrator.cfg.diagnostics);
    let mut sent = 0usize;
    let mut failed = 0usize;
    let transport = orchestrator.transport.as_mut();

    // Timeline phase
    let inputs = std::mem::take(&mut orchestrator.pending);
    let out = orchestrator.engine.update(dt_ms, inputs);
    for streamed in &out.messages {
        send(transport, &streamed.message, &mut sent, &mut failed);
    }
    let events = out.events.clone();
    timer.mark("animation");

    // Cube lights phase
    for message in orchestrator.cube_lights.update(dt_ms) {
        send(transport, &message, &mut sent, &mut failed);
    }
    timer.mark("cube_lights");

    // Backpack phase
    if let Some(message) = orchestrator.backpack.update() {
        send(transport, &message, &mut sent, &mut failed);
    }
    timer.mark("backpack");

    crate::StreamFrame {
        epoch: orchestrator.epoch,
        dt_ms,
        sent,
        failed,
        events,
        timings_ms: timer.finish(),
    }
}
