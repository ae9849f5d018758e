#![allow(dead_code)]
//! Output contracts from the timeline engine.
//!
//! Outputs carry the device messages streamed this tick, in channel order per
//! instance, and a separate list of semantic playback events.

use serde::{Deserialize, Serialize};

use animstream_api_core::DeviceMessage;

use crate::ids::InstId;
use crate::track::Channel;

/// One device message together with the playback and channel that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamedMessage {
    pub inst: InstId,
    pub channel: Channel,
    pub message: DeviceMessage,
}

/// Discrete playback signals emitted during stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    PlaybackStarted { inst: InstId, animation: String },
    LoopCompleted { inst: InstId, loops_completed: u32 },
    PlaybackEnded { inst: InstId, animation: String },
    PlaybackAborted { inst: InstId, animation: String },
    Error { message: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    pub messages: Vec<StreamedMessage>,
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    pub fn clear(&mut self) {
        self.messages.clear();
        self.events.clear();
    }

    pub fn push_message(&mut self, inst: InstId, channel: Channel, message: DeviceMessage) {
        self.messages.push(StreamedMessage {
            inst,
            channel,
            message,
        });
    }

    pub fn push_event(&mut self, ev: CoreEvent) {
        self.events.push(ev);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.events.is_empty()
    }

    /// Messages of one channel, in emission order.
    pub fn on_channel(&self, channel: Channel) -> impl Iterator<Item = &DeviceMessage> + '_ {
        self.messages
            .iter()
            .filter(move |m| m.channel == channel)
            .map(|m| &m.message)
    }
}
