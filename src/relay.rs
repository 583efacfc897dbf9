// src/relay.rs
//! Live fan-out of decoded fixes to connected subscribers

use crate::{error::Result, gps::Fix};
use log::{debug, info, warn};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::mpsc::{self, error::TrySendError};

pub type SubscriberId = u64;

/// A serialized fix, shared by every subscriber it is delivered to
pub type Frame = Arc<str>;

/// Frames a subscriber may fall behind by before it is dropped
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Receiving half handed to a connected subscriber
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Frame>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next frame; `None` once the relay has dropped this subscriber
    /// and the queue is drained
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    /// Take a frame if one is already queued
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// Mark the subscriber closed; the next broadcast prunes it
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

#[derive(Debug, Default)]
struct Subscribers {
    next_id: SubscriberId,
    senders: HashMap<SubscriberId, mpsc::Sender<Frame>>,
}

/// Set of open subscribers.
///
/// Clones share the same set. All add, remove and iterate operations go
/// through one mutex, so a broadcast works on the set as it was when the
/// lock was taken. Each subscriber has a bounded queue; one that is closed
/// or full when a frame arrives is removed.
#[derive(Debug, Clone)]
pub struct Relay {
    subscribers: Arc<Mutex<Subscribers>>,
    capacity: usize,
}

impl Default for Relay {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a relay whose subscribers may queue up to `capacity` frames
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber
    pub fn connect(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let mut subscribers = self.lock();

        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.senders.insert(id, sender);

        info!("Subscriber {} connected ({} open)", id, subscribers.senders.len());
        Subscription { id, receiver }
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn disconnect(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.lock();
        let removed = subscribers.senders.remove(&id).is_some();

        if removed {
            info!("Subscriber {} disconnected ({} open)", id, subscribers.senders.len());
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().senders.len()
    }

    /// Serialize `fix` and deliver it to every open subscriber.
    ///
    /// Returns the number of subscribers the frame was handed to.
    pub fn broadcast(&self, fix: &Fix) -> Result<usize> {
        let frame: Frame = serde_json::to_string(fix)?.into();
        Ok(self.broadcast_frame(frame))
    }

    /// Deliver a pre-serialized frame without waiting on any subscriber.
    ///
    /// Subscribers whose channel is closed or whose queue is full are dropped.
    pub fn broadcast_frame(&self, frame: Frame) -> usize {
        let capacity = self.capacity;
        let mut subscribers = self.lock();
        let mut delivered = 0;

        subscribers.senders.retain(|id, sender| match sender.try_send(Arc::clone(&frame)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!("Subscriber {} dropped, {} frames behind", id, capacity);
                false
            }
            Err(TrySendError::Closed(_)) => {
                info!("Subscriber {} dropped after failed send", id);
                false
            }
        });

        debug!("Broadcast frame to {} subscribers", delivered);
        delivered
    }
}
