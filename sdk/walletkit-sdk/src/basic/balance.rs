use futures::future::{BoxFuture, Either, FutureExt};
use futures::stream::{BoxStream, Stream, StreamExt};
use futures::task::{waker_ref, ArcWake};
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::basic::cache::BalanceCache;
use crate::core::connection::{BalanceStream, BoxError, SolConnection};
use crate::error::{classify_boxed, WalletKitError};
use crate::types::{BalanceKey, Lamports, SlotBalance, SolanaChain};

/// Where a delivered balance came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// One-shot fetch made when the subscription opened
    Initial,
    /// Push notification from the transport
    Live,
    /// Re-fetch triggered by a cache invalidation
    Refetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub key: BalanceKey,

    /// Position in this subscription's delivery order, starting at 0
    pub sequence: u64,

    /// Slot the balance was observed at
    pub slot: u64,

    pub lamports: Option<Lamports>,
    pub origin: UpdateOrigin,
}

pub type BalanceItem = Result<BalanceUpdate, WalletKitError>;

type Registry = Mutex<HashMap<BalanceKey, Arc<Channel>>>;

/// Opens live balance subscriptions and keeps the shared cache current.
///
/// Subscriptions are shared per (address, chain): the first subscriber for a
/// key opens the transport watch, later ones join it, and the watch is torn
/// down and the cached balance evicted when the last one cancels or drops.
#[derive(Clone, Default)]
pub struct BalanceSubscriptionManager {
    cache: BalanceCache,
    registry: Arc<Registry>,
}

impl BalanceSubscriptionManager {
    pub fn new(cache: BalanceCache) -> Self {
        Self {
            cache,
            registry: Arc::default(),
        }
    }

    pub fn cache(&self) -> &BalanceCache {
        &self.cache
    }

    /// Live subscribers for `key`
    pub fn subscriber_count(&self, key: &BalanceKey) -> usize {
        self.registry
            .lock()
            .get(key)
            .map(|channel| channel.state.lock().queues.len())
            .unwrap_or(0)
    }

    /// Subscribe to the balance of `address` on `chain`.
    ///
    /// The first item is the result of a one-shot fetch; later items are
    /// live changes and re-fetches after invalidation, in delivery order.
    /// A subscriber joining a key that is already watched first receives the
    /// last delivered balance. Transport failures arrive as `Err` items.
    /// Nothing is retried here.
    ///
    /// Sequencing: the live watch and the initial fetch start together and
    /// the fetch is never held back by the watch. The fetched value is
    /// delivered first. A notification that raced ahead of the fetch is
    /// delivered after it, and any value observed at an older slot than the
    /// last delivered one is dropped. If the watch attaches only after the
    /// fetch completed, the balance is fetched once more so that no change
    /// falls between the two. At worst the consumer sees the same balance twice.
    pub fn subscribe(
        &self,
        connection: Arc<dyn SolConnection>,
        address: Pubkey,
        chain: SolanaChain,
    ) -> BalanceSubscription {
        let key = BalanceKey::new(address, chain);
        let mut registry = self.registry.lock();

        if let Some(channel) = registry.get(&key) {
            if let Some(id) = channel.join() {
                debug!(%key, "joining balance subscription");
                return BalanceSubscription::new(id, channel.clone());
            }
        }

        debug!(%key, "opening balance subscription");
        let feed = Feed {
            key,
            connection,
            cache: self.cache.clone(),
            phase: Phase::Opening,
            queued: VecDeque::new(),
            sequence: 0,
            last_slot: None,
        };
        let channel = Arc::new(Channel {
            key,
            registry: Arc::downgrade(&self.registry),
            cache: self.cache.clone(),
            state: Mutex::new(ChannelState {
                feed: Some(feed.into_stream()),
                queues: HashMap::new(),
                next_id: 0,
                last: None,
            }),
            wakers: Arc::new(Wakers::default()),
        });
        let id = channel.join().unwrap_or_default();
        registry.insert(key, channel.clone());
        BalanceSubscription::new(id, channel)
    }
}

//=============================================================================
// Channel: one feed per key, fanned out to every subscriber
//=============================================================================

struct Channel {
    key: BalanceKey,
    registry: Weak<Registry>,
    cache: BalanceCache,
    state: Mutex<ChannelState>,
    wakers: Arc<Wakers>,
}

struct ChannelState {
    /// `None` once the feed ended or the last subscriber left
    feed: Option<BoxStream<'static, BalanceItem>>,
    queues: HashMap<u64, VecDeque<BalanceItem>>,
    next_id: u64,
    last: Option<BalanceUpdate>,
}

/// Wakes every subscriber of a channel, whichever one polled the feed last.
#[derive(Default)]
struct Wakers {
    by_id: Mutex<HashMap<u64, Waker>>,
}

impl Wakers {
    fn register(&self, id: u64, waker: &Waker) {
        let mut by_id = self.by_id.lock();
        match by_id.get(&id) {
            Some(current) if current.will_wake(waker) => {},
            _ => {
                by_id.insert(id, waker.clone());
            },
        }
    }

    fn wake_others(&self, id: u64) {
        for (other, waker) in self.by_id.lock().iter() {
            if *other != id {
                waker.wake_by_ref();
            }
        }
    }
}

impl ArcWake for Wakers {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        for waker in arc_self.by_id.lock().values() {
            waker.wake_by_ref();
        }
    }
}

impl Channel {
    /// Add a subscriber, seeded with the last delivered balance.
    /// Returns `None` if the feed has already ended.
    fn join(&self) -> Option<u64> {
        let mut state = self.state.lock();
        state.feed.as_ref()?;
        let id = state.next_id;
        state.next_id += 1;
        let seed = state.last.clone().map(Ok).into_iter().collect();
        state.queues.insert(id, seed);
        Some(id)
    }

    fn poll_item(&self, id: u64, cx: &mut Context<'_>) -> Poll<Option<BalanceItem>> {
        self.wakers.register(id, cx.waker());
        let mut state = self.state.lock();

        if let Some(item) = state.queues.get_mut(&id).and_then(VecDeque::pop_front) {
            return Poll::Ready(Some(item));
        }
        let Some(feed) = state.feed.as_mut() else {
            return Poll::Ready(None);
        };

        let waker = waker_ref(&self.wakers);
        let mut fanout = Context::from_waker(&waker);
        match feed.poll_next_unpin(&mut fanout) {
            Poll::Ready(Some(item)) => {
                if let Ok(update) = &item {
                    state.last = Some(update.clone());
                }
                for (other, queue) in state.queues.iter_mut() {
                    if *other != id {
                        queue.push_back(item.clone());
                    }
                }
                drop(state);
                self.wakers.wake_others(id);
                Poll::Ready(Some(item))
            },
            Poll::Ready(None) => {
                state.feed = None;
                drop(state);
                self.wakers.wake_others(id);
                Poll::Ready(None)
            },
            Poll::Pending => Poll::Pending,
        }
    }

    /// Remove a subscriber. The last one out tears the feed down.
    fn leave(&self, id: u64) {
        let waker = self.wakers.by_id.lock().remove(&id);
        let registry = self.registry.upgrade();
        let mut registry = registry.as_ref().map(|r| r.lock());

        let (emptied, feed) = {
            let mut state = self.state.lock();
            state.queues.remove(&id);
            if state.queues.is_empty() {
                (true, state.feed.take())
            } else {
                (false, None)
            }
        };

        if emptied {
            // A newer channel may have replaced this one after its feed ended.
            let current = registry.as_mut().map_or(true, |registry| {
                let current = registry
                    .get(&self.key)
                    .is_some_and(|channel| std::ptr::eq(Arc::as_ptr(channel), self));
                if current {
                    registry.remove(&self.key);
                }
                current
            });
            if current {
                self.cache.evict(&self.key);
            }
            debug!(key = %self.key, "balance subscription closed");
        }
        drop(registry);

        // Dropping the feed releases the transport watch.
        drop(feed);
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

//=============================================================================
// Subscriber handles
//=============================================================================

struct Subscriber {
    id: u64,
    channel: Arc<Channel>,
    cancelled: AtomicBool,
}

impl Subscriber {
    fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.channel.leave(self.id);
        debug!(key = %self.channel.key, subscriber = self.id, "balance subscription cancelled");
        true
    }
}

/// Idempotent cancellation handle for one subscriber
#[derive(Clone)]
pub struct CancelHandle {
    subscriber: Arc<Subscriber>,
}

impl CancelHandle {
    /// Returns `true` only for the call that actually cancelled the subscriber.
    pub fn cancel(&self) -> bool {
        self.subscriber.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.subscriber.cancelled.load(Ordering::Acquire)
    }
}

/// Stream of balance values for one (address, chain) key.
///
/// Dropping the subscription cancels it.
pub struct BalanceSubscription {
    subscriber: Arc<Subscriber>,
}

impl BalanceSubscription {
    fn new(id: u64, channel: Arc<Channel>) -> Self {
        Self {
            subscriber: Arc::new(Subscriber {
                id,
                channel,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    pub fn key(&self) -> BalanceKey {
        self.subscriber.channel.key
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            subscriber: self.subscriber.clone(),
        }
    }

    pub fn cancel(&self) -> bool {
        self.subscriber.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.subscriber.cancelled.load(Ordering::Acquire)
    }

    /// Most recent balance delivered for this key
    pub fn last_known(&self) -> Option<BalanceUpdate> {
        self.subscriber.channel.state.lock().last.clone()
    }
}

impl Stream for BalanceSubscription {
    type Item = BalanceItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let subscriber = &self.subscriber;
        if subscriber.cancelled.load(Ordering::Acquire) {
            return Poll::Ready(None);
        }
        let polled = subscriber.channel.poll_item(subscriber.id, cx);
        if subscriber.cancelled.load(Ordering::Acquire) {
            return Poll::Ready(None);
        }
        polled
    }
}

impl Drop for BalanceSubscription {
    fn drop(&mut self) {
        self.subscriber.cancel();
    }
}

//=============================================================================
// Feed: initial fetch + live notifications + invalidation re-fetches
//=============================================================================

type Attach = BoxFuture<'static, Result<BalanceStream, BoxError>>;

enum Phase {
    Opening,
    /// Initial value delivered, live watch still connecting
    Attaching {
        attach: Attach,
        invalidations: Option<broadcast::Receiver<BalanceKey>>,
    },
    Live {
        updates: BalanceStream,
        invalidations: Option<broadcast::Receiver<BalanceKey>>,
    },
    Closed,
}

enum Event {
    Notification(Option<Result<SlotBalance, BoxError>>),
    Invalidated(Result<BalanceKey, RecvError>),
}

struct Feed {
    key: BalanceKey,
    connection: Arc<dyn SolConnection>,
    cache: BalanceCache,
    phase: Phase,
    queued: VecDeque<BalanceItem>,
    sequence: u64,
    last_slot: Option<u64>,
}

impl Feed {
    fn into_stream(self) -> BoxStream<'static, BalanceItem> {
        futures::stream::unfold(self, |mut feed| async move {
            let item = feed.next_item().await?;
            Some((item, feed))
        })
        .boxed()
    }

    async fn next_item(&mut self) -> Option<BalanceItem> {
        loop {
            if let Some(item) = self.queued.pop_front() {
                return Some(item);
            }

            match std::mem::replace(&mut self.phase, Phase::Closed) {
                Phase::Opening => self.open().await,
                Phase::Attaching {
                    mut attach,
                    mut invalidations,
                } => {
                    let event = tokio::select! {
                        watch = &mut attach => Either::Left(watch),
                        key = next_invalidation(&mut invalidations) => Either::Right(key),
                    };

                    match event {
                        Either::Left(watch) => {
                            // Changes between the fetch and the attach would be lost otherwise.
                            if self.attach(watch, invalidations) {
                                self.fetch(UpdateOrigin::Refetch).await;
                            }
                        },
                        Either::Right(key) => {
                            self.on_invalidation(key, &mut invalidations).await;
                            self.phase = Phase::Attaching {
                                attach,
                                invalidations,
                            };
                        },
                    }
                },
                Phase::Live {
                    mut updates,
                    mut invalidations,
                } => {
                    let event = tokio::select! {
                        notification = updates.next() => Event::Notification(notification),
                        key = next_invalidation(&mut invalidations) => Event::Invalidated(key),
                    };

                    match event {
                        Event::Notification(None) => {
                            debug!(key = %self.key, "balance transport closed");
                            continue;
                        },
                        Event::Notification(Some(Ok(observed))) => {
                            // Notifications without a balance carry nothing to show.
                            if observed.lamports.is_some() {
                                self.deliver(observed, UpdateOrigin::Live);
                            }
                        },
                        Event::Notification(Some(Err(e))) => {
                            warn!(key = %self.key, error = %e, "balance notification failed");
                            self.queued.push_back(Err(classify_boxed(e)));
                        },
                        Event::Invalidated(key) => {
                            self.on_invalidation(key, &mut invalidations).await;
                        },
                    }

                    self.phase = Phase::Live {
                        updates,
                        invalidations,
                    };
                },
                Phase::Closed => return None,
            }
        }
    }

    /// Start the watch and the initial fetch together; deliver the fetch
    /// as soon as it resolves.
    async fn open(&mut self) {
        let invalidations = self.cache.subscribe_invalidations();
        let connection = self.connection.clone();
        let address = self.key.address;
        let mut attach: Attach = async move { connection.watch_balance(&address).await }.boxed();
        let mut attached = None;

        let fetched = {
            let mut fetch = self.connection.get_balance(&address);
            loop {
                tokio::select! {
                    biased;
                    watch = &mut attach, if attached.is_none() => attached = Some(watch),
                    fetched = &mut fetch => break fetched,
                }
            }
        };
        self.settle(fetched, UpdateOrigin::Initial);

        match attached {
            Some(watch) => {
                self.attach(watch, Some(invalidations));
            },
            None => {
                debug!(key = %self.key, "initial balance delivered before watch attached");
                self.phase = Phase::Attaching {
                    attach,
                    invalidations: Some(invalidations),
                };
            },
        }
    }

    /// Go live on success. Returns whether the watch is now attached.
    fn attach(
        &mut self,
        watch: Result<BalanceStream, BoxError>,
        invalidations: Option<broadcast::Receiver<BalanceKey>>,
    ) -> bool {
        match watch {
            Ok(updates) => {
                self.phase = Phase::Live {
                    updates,
                    invalidations,
                };
                true
            },
            Err(e) => {
                warn!(key = %self.key, error = %e, "balance watch could not be attached");
                self.queued.push_back(Err(classify_boxed(e)));
                false
            },
        }
    }

    async fn on_invalidation(
        &mut self,
        key: Result<BalanceKey, RecvError>,
        invalidations: &mut Option<broadcast::Receiver<BalanceKey>>,
    ) {
        match key {
            Ok(key) if key == self.key => self.fetch(UpdateOrigin::Refetch).await,
            Ok(_) => {},
            // Missed notifications may have included this key.
            Err(RecvError::Lagged(_)) => self.fetch(UpdateOrigin::Refetch).await,
            Err(RecvError::Closed) => *invalidations = None,
        }
    }

    async fn fetch(&mut self, origin: UpdateOrigin) {
        let fetched = self.connection.get_balance(&self.key.address).await;
        self.settle(fetched, origin);
    }

    fn settle(&mut self, fetched: Result<SlotBalance, BoxError>, origin: UpdateOrigin) {
        match fetched {
            Ok(observed) => self.deliver(observed, origin),
            Err(e) => {
                warn!(key = %self.key, error = %e, "balance fetch failed");
                self.queued.push_back(Err(classify_boxed(e)));
            },
        }
    }

    fn deliver(&mut self, observed: SlotBalance, origin: UpdateOrigin) {
        if let Some(last) = self.last_slot {
            if observed.slot < last {
                debug!(key = %self.key, slot = observed.slot, last, "dropping out-of-order balance");
                return;
            }
        }

        self.last_slot = Some(observed.slot);
        self.cache.store(self.key, observed);
        self.queued.push_back(Ok(BalanceUpdate {
            key: self.key,
            sequence: self.sequence,
            slot: observed.slot,
            lamports: observed.lamports,
            origin,
        }));
        self.sequence += 1;
    }
}

async fn next_invalidation(
    invalidations: &mut Option<broadcast::Receiver<BalanceKey>>,
) -> Result<BalanceKey, RecvError> {
    match invalidations {
        Some(rx) => rx.recv().await,
        None => futures::future::pending().await,
    }
}
