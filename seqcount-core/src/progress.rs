use log::info;

/// Receives progress notifications. Implementations must not affect results.
pub trait ProgressSink {
    fn progress(&mut self, done: u64, total: u64);
}

/// Logs each notification at info level.
pub struct LogProgress {
    message: String,
}

impl LogProgress {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ProgressSink for LogProgress {
    fn progress(&mut self, done: u64, total: u64) {
        let percent = if total == 0 { 100 } else { done * 100 / total };
        info!("{} {percent}% ({done} of {total} bytes)", self.message);
    }
}

/// Accumulates processed bytes and notifies its sink each time an interval
/// boundary is crossed. The default interval is 1% of `total`.
pub struct ProgressReporter {
    sink: Box<dyn ProgressSink>,
    total: u64,
    interval: u64,
    done: u64,
    next: u64,
}

impl ProgressReporter {
    pub fn new(mut sink: Box<dyn ProgressSink>, total: u64) -> Self {
        let interval = (total / 100).max(1);
        sink.progress(0, total);
        Self {
            sink,
            total,
            interval,
            done: 0,
            next: interval,
        }
    }

    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self.next = self.done - self.done % self.interval + self.interval;
        self
    }

    pub fn add(&mut self, bytes: u64) {
        self.done += bytes;
        if self.done >= self.next {
            self.sink.progress(self.done, self.total);
            self.next = self.done - self.done % self.interval + self.interval;
        }
    }

    pub fn finish(&mut self) {
        self.sink.progress(self.total.max(self.done), self.total);
    }
}
