// queue.rs - Listener registry and the double-buffered dispatch loop

use crate::event::{Event, EventEnvelope, EventKind};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Handle returned by [`EventQueue::add_listener`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Listener = Box<dyn FnMut(&EventEnvelope, &mut EventContext)>;

/// Outcome of one [`EventQueue::process`] pass.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events taken from the read buffer and dispatched.
    pub dispatched: usize,
    /// Events pushed back to the next pass because the budget ran out.
    pub deferred: usize,
    pub elapsed: Duration,
}

/// Handed to listeners so they can raise events while a dispatch is running.
#[derive(Default)]
pub struct EventContext {
    queued: Vec<EventEnvelope>,
    triggered: VecDeque<EventEnvelope>,
}

impl EventContext {
    /// Queue an event for the next pass.
    pub fn queue_event<E: Event>(&mut self, event: E) {
        self.queued.push(EventEnvelope::new(event));
    }

    /// Dispatch an event once the current listeners have run, before the
    /// outer dispatch returns.
    ///
    /// Delivery is not immediate: every remaining listener of the event being
    /// dispatched sees it first, and this call returns before any listener of
    /// `event` runs. Triggered events are delivered in the order raised.
    pub fn trigger_event<E: Event>(&mut self, event: E) {
        self.triggered.push_back(EventEnvelope::new(event));
    }
}

/// Listener registry plus two event buffers that swap roles every pass.
pub struct EventQueue {
    next_listener: u32,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
    buffers: [VecDeque<EventEnvelope>; 2],
    read: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            next_listener: 0,
            listeners: HashMap::new(),
            buffers: [VecDeque::new(), VecDeque::new()],
            read: 0,
        }
    }

    #[inline]
    fn write(&self) -> usize {
        self.read ^ 1
    }

    /// Register a listener for events of type `E`. Listeners run in
    /// registration order.
    pub fn add_listener<E, F>(&mut self, mut listener: F) -> ListenerId
    where
        E: Event,
        F: FnMut(&E, &mut EventContext) + 'static,
    {
        let kind = EventKind::of::<E>();
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;

        let erased: Listener = Box::new(move |envelope: &EventEnvelope, ctx: &mut EventContext| {
            if let Some(event) = envelope.downcast_ref::<E>() {
                listener(event, ctx);
            }
        });
        self.listeners.entry(kind).or_default().push((id, erased));
        trace!("{} listener {} added", kind, id);
        id
    }

    /// Remove a listener. Unknown ids are logged and ignored.
    pub fn remove_listener<E: Event>(&mut self, id: ListenerId) -> bool {
        let kind = EventKind::of::<E>();
        let removed = match self.listeners.get_mut(&kind) {
            Some(list) => {
                let before = list.len();
                list.retain(|(existing, _)| *existing != id);
                list.len() != before
            }
            None => false,
        };

        if removed {
            trace!("Removed {} listener {}", kind, id);
        } else {
            warn!("Tried to remove {} listener {} but it does not exist", kind, id);
        }
        removed
    }

    pub fn listener_count<E: Event>(&self) -> usize {
        self.listeners
            .get(&EventKind::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Dispatch an event to the current listeners right away.
    ///
    /// Returns false when no listener exists; the event is then discarded.
    pub fn trigger_event<E: Event>(&mut self, event: E) -> bool {
        self.dispatch(EventEnvelope::new(event))
    }

    /// Append an event to the write buffer for the next pass.
    pub fn queue_event<E: Event>(&mut self, event: E) {
        let envelope = EventEnvelope::new(event);
        trace!("Queued {}", envelope.kind());
        let write = self.write();
        self.buffers[write].push_back(envelope);
    }

    /// Swap the buffers and dispatch everything in the new read buffer.
    ///
    /// With a budget, dispatch stops once the elapsed time reaches it; the
    /// undispatched events are moved, in order, to the front of the write
    /// buffer. A zero budget therefore defers every event.
    pub fn process(&mut self, budget: Option<Duration>) -> DispatchReport {
        self.read ^= 1;

        let mut report = DispatchReport::default();
        if self.buffers[self.read].is_empty() {
            return report;
        }

        let start = Instant::now();
        loop {
            if self.buffers[self.read].is_empty() {
                break;
            }
            if budget.is_some_and(|budget| start.elapsed() >= budget) {
                report.deferred = self.defer_remaining();
                trace!(
                    "Processing aborted with {} events in the queue",
                    report.deferred
                );
                break;
            }

            let Some(envelope) = self.buffers[self.read].pop_front() else {
                break;
            };
            self.dispatch(envelope);
            report.dispatched += 1;
        }

        report.elapsed = start.elapsed();
        trace!(
            "Processed {} events in {:.4}s",
            report.dispatched,
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Remove the oldest pending event of type `E`.
    pub fn abort_first_event<E: Event>(&mut self) -> bool {
        let kind = EventKind::of::<E>();
        let write = self.write();
        let Some(position) = self.buffers[write].iter().position(|e| e.kind() == kind) else {
            return false;
        };

        self.buffers[write].remove(position);
        trace!("Aborted {}", kind);
        true
    }

    /// Remove every pending event of type `E`.
    pub fn abort_events<E: Event>(&mut self) -> usize {
        let kind = EventKind::of::<E>();
        let write = self.write();
        let before = self.buffers[write].len();
        self.buffers[write].retain(|e| e.kind() != kind);

        let count = before - self.buffers[write].len();
        if count > 0 {
            trace!("Aborted {} events of type {}", count, kind);
        }
        count
    }

    pub fn abort_all_events(&mut self) -> usize {
        let write = self.write();
        let count = self.buffers[write].len();
        self.buffers[write].clear();
        if count > 0 {
            trace!("Cleared {} events from queue", count);
        }
        count
    }

    /// Events waiting for the next pass, oldest first.
    pub fn pending_events(&self) -> impl Iterator<Item = &EventEnvelope> + '_ {
        self.buffers[self.write()].iter()
    }

    pub fn pending_count(&self) -> usize {
        self.buffers[self.write()].len()
    }

    /// Drop all listeners and buffered events.
    pub fn shutdown(&mut self) {
        let listeners: usize = self.listeners.values().map(Vec::len).sum();
        let pending = self.buffers[0].len() + self.buffers[1].len();
        self.listeners.clear();
        self.buffers[0].clear();
        self.buffers[1].clear();
        debug!(
            "Event queue shut down, dropped {} listeners and {} events",
            listeners, pending
        );
    }

    fn defer_remaining(&mut self) -> usize {
        let write = self.write();
        let mut remaining = std::mem::take(&mut self.buffers[self.read]);
        let deferred = remaining.len();
        remaining.append(&mut self.buffers[write]);
        self.buffers[write] = remaining;
        deferred
    }

    fn dispatch(&mut self, envelope: EventEnvelope) -> bool {
        let mut ctx = EventContext::default();
        let mut work = VecDeque::from([envelope]);
        let mut delivered = None;

        while let Some(envelope) = work.pop_front() {
            let reached = self.deliver(&envelope, &mut ctx);
            delivered.get_or_insert(reached);
            work.append(&mut ctx.triggered);
        }

        let write = self.write();
        self.buffers[write].extend(ctx.queued);
        delivered.unwrap_or(false)
    }

    fn deliver(&mut self, envelope: &EventEnvelope, ctx: &mut EventContext) -> bool {
        let kind = envelope.kind();
        match self.listeners.get_mut(&kind) {
            Some(listeners) if !listeners.is_empty() => {
                trace!("Dispatching {}", kind);
                for (_, listener) in listeners.iter_mut() {
                    listener(envelope, ctx);
                }
                true
            }
            _ => {
                trace!("Discarding {}, no listeners", kind);
                false
            }
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("listener_kinds", &self.listeners.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u32);
    impl Event for Ping {}

    #[derive(Debug, Clone, PartialEq)]
    struct Pong(u32);
    impl Event for Pong {}

    fn record_pings(queue: &mut EventQueue) -> Rc<RefCell<Vec<u32>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        queue.add_listener::<Ping, _>(move |ping, _| sink.borrow_mut().push(ping.0));
        seen
    }

    #[test]
    fn trigger_reaches_listeners_in_registration_order() {
        let mut queue = EventQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b"] {
            let sink = Rc::clone(&seen);
            queue.add_listener::<Ping, _>(move |ping, _| sink.borrow_mut().push((tag, ping.0)));
        }

        assert!(queue.trigger_event(Ping(1)));

        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1)]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn trigger_without_listeners_discards() {
        let mut queue = EventQueue::new();
        let seen = record_pings(&mut queue);

        assert!(!queue.trigger_event(Pong(1)));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn queued_events_wait_for_next_pass_in_fifo_order() {
        let mut queue = EventQueue::new();
        let seen = record_pings(&mut queue);

        queue.queue_event(Ping(1));
        queue.queue_event(Ping(2));
        queue.queue_event(Ping(3));
        assert!(seen.borrow().is_empty());

        let report = queue.process(None);

        assert_eq!(report.dispatched, 3);
        assert_eq!(report.deferred, 0);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn events_queued_during_dispatch_run_next_pass() {
        let mut queue = EventQueue::new();
        let seen = record_pings(&mut queue);
        queue.add_listener::<Ping, _>(|ping, ctx| {
            if ping.0 < 3 {
                ctx.queue_event(Ping(ping.0 + 1));
            }
        });

        queue.queue_event(Ping(1));
        queue.process(None);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(queue.pending_count(), 1);

        queue.process(None);
        assert_eq!(*seen.borrow(), vec![1, 2]);

        queue.process(None);
        queue.process(None);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn nested_trigger_completes_before_outer_returns() {
        let mut queue = EventQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        queue.add_listener::<Ping, _>(move |ping, ctx| {
            sink.borrow_mut().push(format!("ping {}", ping.0));
            ctx.trigger_event(Pong(ping.0));
        });
        let sink = Rc::clone(&seen);
        queue.add_listener::<Pong, _>(move |pong, _| {
            sink.borrow_mut().push(format!("pong {}", pong.0));
        });

        queue.trigger_event(Ping(7));

        assert_eq!(*seen.borrow(), vec!["ping 7", "pong 7"]);
    }

    #[test]
    fn nested_trigger_waits_for_remaining_listeners() {
        let mut queue = EventQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        queue.add_listener::<Ping, _>(move |ping, ctx| {
            ctx.trigger_event(Pong(ping.0));
            sink.borrow_mut().push(format!("first {}", ping.0));
        });
        let sink = Rc::clone(&seen);
        queue.add_listener::<Ping, _>(move |ping, _| {
            sink.borrow_mut().push(format!("second {}", ping.0));
        });
        let sink = Rc::clone(&seen);
        queue.add_listener::<Pong, _>(move |pong, _| {
            sink.borrow_mut().push(format!("pong {}", pong.0));
        });

        queue.trigger_event(Ping(3));

        assert_eq!(*seen.borrow(), vec!["first 3", "second 3", "pong 3"]);
    }

    #[test]
    fn zero_budget_defers_everything_in_order() {
        let mut queue = EventQueue::new();
        let seen = record_pings(&mut queue);
        queue.queue_event(Ping(1));
        queue.queue_event(Ping(2));

        let report = queue.process(Some(Duration::ZERO));

        assert_eq!(report.dispatched, 0);
        assert_eq!(report.deferred, 2);
        assert!(seen.borrow().is_empty());
        let pending: Vec<u32> = queue
            .pending_events()
            .filter_map(|e| e.downcast_ref::<Ping>().map(|p| p.0))
            .collect();
        assert_eq!(pending, vec![1, 2]);

        queue.process(None);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn deferred_events_precede_newly_queued_ones() {
        let mut queue = EventQueue::new();
        let seen = record_pings(&mut queue);
        queue.queue_event(Ping(1));
        queue.queue_event(Ping(2));
        queue.process(Some(Duration::ZERO));

        queue.queue_event(Ping(3));
        queue.process(None);

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn budget_stops_mid_pass() {
        let mut queue = EventQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        queue.add_listener::<Ping, _>(move |ping, _| {
            sink.borrow_mut().push(ping.0);
            std::thread::sleep(Duration::from_millis(5));
        });
        for n in 1..=3 {
            queue.queue_event(Ping(n));
        }

        let report = queue.process(Some(Duration::from_millis(1)));

        assert_eq!(report.dispatched, 1);
        assert_eq!(report.deferred, 2);
        assert_eq!(*seen.borrow(), vec![1]);

        queue.process(None);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_pass_still_flips_buffers() {
        let mut queue = EventQueue::new();
        let seen = record_pings(&mut queue);

        queue.process(None);
        queue.queue_event(Ping(9));
        queue.process(None);

        assert_eq!(*seen.borrow(), vec![9]);
    }

    #[test]
    fn abort_operations_touch_pending_buffer() {
        let mut queue = EventQueue::new();
        queue.queue_event(Ping(1));
        queue.queue_event(Pong(1));
        queue.queue_event(Ping(2));
        queue.queue_event(Ping(3));

        assert!(queue.abort_first_event::<Ping>());
        let first: Vec<u32> = queue
            .pending_events()
            .filter_map(|e| e.downcast_ref::<Ping>().map(|p| p.0))
            .collect();
        assert_eq!(first, vec![2, 3]);

        assert_eq!(queue.abort_events::<Ping>(), 2);
        assert!(!queue.abort_first_event::<Ping>());
        assert_eq!(queue.abort_all_events(), 1);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn remove_listener_stops_delivery() {
        let mut queue = EventQueue::new();
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let id = queue.add_listener::<Ping, _>(move |_, _| *sink.borrow_mut() += 1);

        queue.trigger_event(Ping(1));
        assert!(queue.remove_listener::<Ping>(id));
        queue.trigger_event(Ping(2));

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(queue.listener_count::<Ping>(), 0);
    }

    #[test]
    fn remove_unknown_listener_is_a_noop() {
        let mut queue = EventQueue::new();
        let id = queue.add_listener::<Ping, _>(|_, _| {});

        assert!(!queue.remove_listener::<Pong>(id));
        assert_eq!(queue.listener_count::<Ping>(), 1);
    }

    #[test]
    fn shutdown_clears_listeners_and_buffers() {
        let mut queue = EventQueue::new();
        let seen = record_pings(&mut queue);
        queue.queue_event(Ping(1));
        queue.process(Some(Duration::ZERO));
        queue.queue_event(Ping(2));

        queue.shutdown();
        queue.process(None);

        assert!(seen.borrow().is_empty());
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.listener_count::<Ping>(), 0);
    }
}
