//! Delivery capabilities handed to the router by the transport layer.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Accepts encoded envelope payloads.
///
/// Implementations must not assume anything about the calling thread. The
/// router holds no lock while calling `accept`, so a sink may register or
/// release subscriptions from inside it. Whether a sink buffers, blocks or
/// drops is its own business.
pub trait Sink: Send + Sync {
    fn accept(&self, payload: &[u8]);
}

/// Sink backed by a closure.
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(&[u8]) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        FnSink(f)
    }
}

impl<F> Sink for FnSink<F>
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn accept(&self, payload: &[u8]) {
        (self.0)(payload)
    }
}

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSink")
    }
}

/// Sink that forwards payloads into a bounded channel.
///
/// A full or disconnected channel drops the payload. Drops are counted so
/// the owner can decide whether to cut the subscriber off.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<Vec<u8>>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its buffer.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Vec<u8>>) {
        let (sender, receiver) = bounded(capacity);
        let sink = ChannelSink {
            sender,
            dropped: AtomicU64::new(0),
        };
        (sink, receiver)
    }

    /// Number of payloads dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Sink for ChannelSink {
    fn accept(&self, payload: &[u8]) {
        match self.sender.try_send(payload.to_vec()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
