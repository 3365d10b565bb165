use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use std::time::Instant;

use log::debug;

/// Keeps track of the time spent in named phases of a computation.
#[derive(Default)]
pub struct Timing {
    results: Rc<RefCell<Vec<(String, Duration)>>>,
}

/// A single running timer, obtained from [Timing::start]. The elapsed time is
/// only recorded when [Timer::finish] is called.
pub struct Timer {
    name: String,
    start: Instant,
    results: Rc<RefCell<Vec<(String, Duration)>>>,
    registered: bool,
}

impl Timing {
    /// Creates a new timing object to track timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new timer with the given name.
    pub fn start(&mut self, name: &str) -> Timer {
        Timer {
            name: name.to_string(),
            start: Instant::now(),
            results: self.results.clone(),
            registered: false,
        }
    }

    /// Returns the recorded duration of the phase with the given name.
    pub fn duration(&self, name: &str) -> Option<Duration> {
        self.results
            .borrow()
            .iter()
            .find(|(other, _)| other == name)
            .map(|(_, duration)| *duration)
    }

    /// Prints all the finished timers to the standard error.
    pub fn print(&self) {
        eprint!("{}", self);
    }
}

impl Timer {
    /// Stops the timer and registers the elapsed time.
    pub fn finish(&mut self) {
        let elapsed = self.start.elapsed();
        debug!("Time {}: {:.3}s", self.name, elapsed.as_secs_f64());

        if !self.registered {
            self.results.borrow_mut().push((self.name.clone(), elapsed));
            self.registered = true;
        }
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, duration) in self.results.borrow().iter() {
            writeln!(f, "Time {}: {:.3}s", name, duration.as_secs_f64())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_timing() {
        let mut timing = Timing::new();

        let mut first = timing.start("first");
        first.finish();
        first.finish();

        let _unfinished = timing.start("second");

        assert!(timing.duration("first").is_some());
        assert!(timing.duration("second").is_none());
        assert_eq!(timing.to_string().lines().count(), 1);
    }
}
