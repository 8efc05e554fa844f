//! Cross-thread frame delivery.
//!
//! Producers may push frames faster than the pipeline updates. The receiver
//! folds everything pending into a single frame, so each update cycle sees
//! one consolidated change set.

use super::Frame;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Producer half. Cheap to clone and safe to move to other threads.
#[derive(Debug, Clone)]
pub struct FrameSender {
    sender: Sender<Frame>,
}

impl FrameSender {
    /// Queue a frame. Returns false if the receiver has been dropped.
    pub fn send(&self, frame: Frame) -> bool {
        self.sender.send(frame).is_ok()
    }
}

/// Consumer half, owned by the thread that drives the pipeline.
#[derive(Debug)]
pub struct FrameReceiver {
    receiver: Receiver<Frame>,
}

impl FrameReceiver {
    /// Merge every pending frame, oldest first, into one.
    ///
    /// Returns `None` when nothing is pending.
    pub fn drain(&self) -> Option<Frame> {
        let mut merged: Option<Frame> = None;
        let mut count = 0usize;
        while let Ok(frame) = self.receiver.try_recv() {
            count += 1;
            match merged.as_mut() {
                Some(m) => m.merge(frame),
                None => merged = Some(frame),
            }
        }
        if count > 1 {
            tracing::trace!("Merged {} pending frames", count);
        }
        merged
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

/// Create a connected sender/receiver pair.
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    let (sender, receiver) = unbounded();
    (FrameSender { sender }, FrameReceiver { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_drain_empty() {
        let (_tx, rx) = frame_channel();
        assert!(rx.drain().is_none());
    }

    #[test]
    fn test_drain_merges_in_order() {
        let (tx, rx) = frame_channel();
        tx.send(Frame::new().with("a", 1.0f32).with("b", 1.0f32));
        tx.send(Frame::new().with("a", 2.0f32));
        assert_eq!(rx.pending(), 2);

        let merged = rx.drain().unwrap();
        assert_eq!(merged.get("a"), Some(&Value::Float(2.0)));
        assert_eq!(merged.get("b"), Some(&Value::Float(1.0)));
        assert!(rx.drain().is_none());
    }

    #[test]
    fn test_send_from_other_thread() {
        let (tx, rx) = frame_channel();
        let producer = tx.clone();
        std::thread::spawn(move || {
            producer.send(Frame::new().with("x", true));
        })
        .join()
        .unwrap();
        assert_eq!(rx.drain().unwrap().get("x"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_send_after_drop_fails() {
        let (tx, rx) = frame_channel();
        drop(rx);
        assert!(!tx.send(Frame::new()));
    }
}
