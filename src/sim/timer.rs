/// Timer service on a logical millisecond clock.
///
/// The game loop advances the clock by real elapsed time; tests advance it
/// by hand. Due timers are popped one at a time, ordered by due time and
/// then by schedule order, so a handler that cancels another timer stops it
/// from firing later in the same advance.

/// Opaque id of a scheduled timer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TimerHandle(u64);

/// A timer that has come due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    pub at: u64,
    pub payload: T,
}

#[derive(Clone, Debug)]
struct Entry<T> {
    handle: TimerHandle,
    due: u64,
    /// `Some` for repeating timers.
    interval: Option<u64>,
    payload: T,
}

pub struct TimerService<T> {
    now: u64,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T: Clone> TimerService<T> {
    pub fn new() -> Self {
        TimerService {
            now: 0,
            next_id: 0,
            entries: Vec::with_capacity(4),
        }
    }

    /// Current clock time in ms.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Fire `payload` once, `delay` ms from now.
    pub fn schedule_once(&mut self, delay: u64, payload: T) -> TimerHandle {
        self.push(delay, None, payload)
    }

    /// Fire `payload` every `interval` ms, first time `interval` ms from now.
    /// A zero interval is treated as 1 ms.
    pub fn schedule_repeating(&mut self, interval: u64, payload: T) -> TimerHandle {
        let interval = interval.max(1);
        self.push(interval, Some(interval), payload)
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    #[allow(dead_code)]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. When nothing is due the clock moves to `until` and
    /// `None` is returned.
    pub fn pop_due(&mut self, until: u64) -> Option<Fired<T>> {
        let idx = self.entries.iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.handle.0))
            .map(|(i, _)| i);

        let i = match idx {
            Some(i) => i,
            None => {
                self.now = self.now.max(until);
                return None;
            }
        };

        let entry = &self.entries[i];
        let fired = Fired {
            handle: entry.handle,
            at: entry.due,
            payload: entry.payload.clone(),
        };
        let interval = entry.interval;
        self.now = self.now.max(fired.at);
        match interval {
            Some(interval) => self.entries[i].due += interval,
            None => {
                self.entries.remove(i);
            }
        }
        Some(fired)
    }

    fn push(&mut self, delay: u64, interval: Option<u64>, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            due: self.now + delay,
            interval,
            payload,
        });
        handle
    }
}
