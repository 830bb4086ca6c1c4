use domain::LiveEvent;
use futures::stream::Stream;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, warn};

/// Per-room broadcast channels for live delivery.
///
/// A channel exists only while at least one [`Subscription`] for the room is
/// alive; the last one to drop removes it. Each listener's subscriptions can
/// also be ended on their own, when that user leaves the room.
#[derive(Clone)]
pub struct RoomHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    channels: Mutex<HashMap<String, RoomChannel>>,
    capacity: usize,
}

struct RoomChannel {
    tx: broadcast::Sender<LiveEvent>,
    // user id -> (shared stop token, open subscriptions)
    listeners: HashMap<String, (CancellationToken, usize)>,
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: Mutex::new(HashMap::new()),
                capacity: capacity.max(1),
            }),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, RoomChannel>> {
        // the map stays consistent even if a holder panicked
        self.inner
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, room_id: &str, user_id: &str) -> Subscription {
        let (rx, stop) = {
            let mut channels = self.channels();
            let channel = channels
                .entry(room_id.to_string())
                .or_insert_with(|| RoomChannel {
                    tx: broadcast::channel(self.inner.capacity).0,
                    listeners: HashMap::new(),
                });
            let listener = channel
                .listeners
                .entry(user_id.to_string())
                .or_insert_with(|| (CancellationToken::new(), 0));
            listener.1 += 1;
            (channel.tx.subscribe(), listener.0.clone())
        };
        debug!(room_id, user_id, "Live subscriber added");
        Subscription {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            stream: Some(BroadcastStream::new(rx)),
            stopped: Box::pin(stop.clone().cancelled_owned()),
            stop,
            hub: self.clone(),
        }
    }

    /// Best-effort fan-out. Returns how many subscriptions the event reached.
    pub fn publish(&self, event: LiveEvent) -> usize {
        let channels = self.channels();
        match channels.get(event.room_id()) {
            Some(channel) => channel.tx.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Tells subscribers the room is gone and ends their streams.
    pub fn close_room(&self, room_id: &str) {
        let channel = self.channels().remove(room_id);
        if let Some(channel) = channel {
            let _ = channel.tx.send(LiveEvent::RoomClosed {
                room_id: room_id.to_string(),
            });
        }
    }

    /// Ends every subscription `user_id` holds on the room. Returns whether
    /// there was any.
    pub fn disconnect(&self, room_id: &str, user_id: &str) -> bool {
        let listener = self
            .channels()
            .get_mut(room_id)
            .and_then(|channel| channel.listeners.remove(user_id));
        match listener {
            Some((stop, open)) => {
                stop.cancel();
                debug!(room_id, user_id, open, "Live subscriber disconnected");
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.channels()
            .get(room_id)
            .map(|channel| channel.tx.receiver_count())
            .unwrap_or(0)
    }

    pub fn active_rooms(&self) -> usize {
        self.channels().len()
    }

    // `counted` is false once the user was disconnected; their entry is
    // already gone and a newer one must not be touched.
    fn release(&self, room_id: &str, user_id: &str, counted: bool) {
        let mut channels = self.channels();
        let Some(channel) = channels.get_mut(room_id) else {
            return;
        };
        if let Some(listener) = channel.listeners.get_mut(user_id).filter(|_| counted) {
            listener.1 = listener.1.saturating_sub(1);
            if listener.1 == 0 {
                channel.listeners.remove(user_id);
            }
        }
        if channel.tx.receiver_count() == 0 {
            channels.remove(room_id);
            debug!(room_id, "Live channel released");
        }
    }
}

/// One live connection's view of a room.
pub struct Subscription {
    room_id: String,
    user_id: String,
    stream: Option<BroadcastStream<LiveEvent>>,
    stopped: Pin<Box<WaitForCancellationFutureOwned>>,
    stop: CancellationToken,
    hub: RoomHub,
}

impl Subscription {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }
}

impl Stream for Subscription {
    type Item = LiveEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.stream.is_none() {
            return Poll::Ready(None);
        }
        if this.stopped.as_mut().poll(cx).is_ready() {
            this.stream = None;
            return Poll::Ready(None);
        }
        let Some(stream) = this.stream.as_mut() else {
            return Poll::Ready(None);
        };
        loop {
            match Pin::new(&mut *stream).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(n)))) => {
                    warn!(room_id = %this.room_id, skipped = n, "Live subscriber lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // drop the receiver before checking whether anyone is left
        self.stream.take();
        self.hub
            .release(&self.room_id, &self.user_id, !self.stop.is_cancelled());
    }
}
