/// # timer
///
/// Delay and sound timers.
///
/// The timers are the only state shared between threads: the executor reads
/// and overwrites them, the ticker counts them down at a fixed rate no matter
/// how fast instructions are running.
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// the two 8-bit countdown timers
#[derive(Debug, Default)]
pub struct Timers {
    delay: AtomicU8,
    sound: AtomicU8,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(&self) -> u8 {
        self.delay.load(Ordering::Acquire)
    }

    pub fn sound(&self) -> u8 {
        self.sound.load(Ordering::Acquire)
    }

    pub fn set_delay(&self, value: u8) {
        self.delay.store(value, Ordering::Release);
    }

    pub fn set_sound(&self, value: u8) {
        self.sound.store(value, Ordering::Release);
    }

    /// count both timers down by one, stopping at zero
    pub fn tick(&self) {
        decrement(&self.delay);
        decrement(&self.sound);
    }
}

// a racing store from the executor wins outright; it is never lost to the decrement
fn decrement(timer: &AtomicU8) {
    let _ = timer.fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| t.checked_sub(1));
}

/// Background thread ticking a [`Timers`] at a fixed rate until dropped.
pub struct TimerTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TimerTicker {
    pub fn spawn(timers: Arc<Timers>, hz: u32) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs(1) / hz.max(1);
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            debug!("timer ticker running every {:?}", period);
            let mut next = std::time::Instant::now() + period;
            while !flag.load(Ordering::Relaxed) {
                let now = std::time::Instant::now();
                if next > now {
                    spin_sleep::sleep(next - now);
                }
                timers.tick();
                next += period;
            }
            debug!("timer ticker stopped");
        });
        TimerTicker {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TimerTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_down_to_zero() {
        let t = Timers::new();
        t.set_delay(3);
        t.set_sound(1);
        let mut seen = Vec::new();
        for _ in 0..5 {
            t.tick();
            seen.push((t.delay(), t.sound()));
        }
        assert_eq!(seen, [(2, 0), (1, 0), (0, 0), (0, 0), (0, 0)]);
    }

    #[test]
    fn test_tick_leaves_zero_alone() {
        let t = Timers::new();
        t.tick();
        assert_eq!((t.delay(), t.sound()), (0, 0));
    }

    #[test]
    fn test_ticker_thread_drains_timers() {
        let timers = Arc::new(Timers::new());
        timers.set_delay(5);
        timers.set_sound(5);
        let mut ticker = TimerTicker::spawn(Arc::clone(&timers), 1000);
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while (timers.delay() != 0 || timers.sound() != 0) && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        ticker.stop();
        assert_eq!((timers.delay(), timers.sound()), (0, 0));
    }

    #[test]
    fn test_ticker_stops_on_drop() {
        let timers = Arc::new(Timers::new());
        {
            let _ticker = TimerTicker::spawn(Arc::clone(&timers), 1000);
        }
        timers.set_delay(10);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(timers.delay(), 10);
    }
}
