// Communication channels
// Control events use a blocking channel the scheduler can select on;
// voice triggers reach the audio callback through a lock-free ring buffer.

use crate::audio::mixer::VoiceTrigger;
use crate::messaging::command::ControlEvent;
use crossbeam::channel::{Receiver, Sender};
use ringbuf::{HeapRb, traits::Split};

pub type ControlSender = Sender<ControlEvent>;
pub type ControlReceiver = Receiver<ControlEvent>;

pub fn create_control_channel() -> (ControlSender, ControlReceiver) {
    crossbeam::channel::unbounded()
}

pub type VoiceProducer = ringbuf::HeapProd<VoiceTrigger>;
pub type VoiceConsumer = ringbuf::HeapCons<VoiceTrigger>;

pub fn create_voice_channel(capacity: usize) -> (VoiceProducer, VoiceConsumer) {
    let rb = HeapRb::<VoiceTrigger>::new(capacity);
    rb.split()
}
