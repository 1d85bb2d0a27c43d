use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Observes ingestion progress in bytes. Implementations are purely
/// observational and must never fail the run.
pub trait ProgressReporter: Send {
    fn report(&mut self, bytes_done: u64, bytes_total: u64);

    fn finish(&mut self) {}
}

/// Which 10% bucket `bytes_done` has reached, 0 through 10. An unknown or
/// zero total counts as complete.
#[inline]
pub fn decile_of(bytes_done: u64, bytes_total: u64) -> u8 {
    if bytes_total == 0 {
        return 10;
    }

    let capped = bytes_done.min(bytes_total);
    u8::try_from(u128::from(capped) * 10 / u128::from(bytes_total)).unwrap_or(10)
}

/// Forwards to the wrapped reporter only when the cumulative byte count
/// crosses the next 10% boundary, so a full pass emits at most ten reports.
#[derive(Debug)]
pub struct DecileProgress<R> {
    inner: R,
    last_decile: u8,
}

impl<R: ProgressReporter> DecileProgress<R> {
    #[inline]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            last_decile: 0,
        }
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ProgressReporter> ProgressReporter for DecileProgress<R> {
    #[inline]
    fn report(&mut self, bytes_done: u64, bytes_total: u64) {
        let decile = decile_of(bytes_done, bytes_total);
        if decile > self.last_decile {
            self.last_decile = decile;
            self.inner.report(bytes_done, bytes_total);
        }
    }

    #[inline]
    fn finish(&mut self) {
        self.inner.finish();
    }
}

/// Logs progress through the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    #[inline]
    fn report(&mut self, bytes_done: u64, bytes_total: u64) {
        let percent = if bytes_total == 0 {
            100u128
        } else {
            u128::from(bytes_done.min(bytes_total)) * 100 / u128::from(bytes_total)
        };
        info!(
            "Processed {} of {} bytes ({}%)",
            bytes_done, bytes_total, percent
        );
    }
}

/// Byte progress bar for attended terminals; hidden when stderr is not a
/// terminal.
#[derive(Debug)]
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    #[inline]
    pub fn new() -> Self {
        let bar = if console::user_attended_stderr() {
            ProgressBar::no_length().with_style(
                ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} ({percent}%)")
                    .expect("style template is valid"),
            )
        } else {
            ProgressBar::hidden()
        };

        Self { bar }
    }
}

impl Default for BarProgress {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    #[inline]
    fn report(&mut self, bytes_done: u64, bytes_total: u64) {
        self.bar.set_length(bytes_total);
        self.bar.set_position(bytes_done);
    }

    #[inline]
    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Discards all progress reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    #[inline]
    fn report(&mut self, _bytes_done: u64, _bytes_total: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        reports: Vec<(u64, u64)>,
        finished: bool,
    }

    impl ProgressReporter for Recorder {
        fn report(&mut self, bytes_done: u64, bytes_total: u64) {
            self.reports.push((bytes_done, bytes_total));
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn decile_boundaries() {
        assert_eq!(decile_of(0, 100), 0);
        assert_eq!(decile_of(9, 100), 0);
        assert_eq!(decile_of(10, 100), 1);
        assert_eq!(decile_of(95, 100), 9);
        assert_eq!(decile_of(100, 100), 10);
        assert_eq!(decile_of(150, 100), 10);
        assert_eq!(decile_of(0, 0), 10);
        assert_eq!(decile_of(5, 0), 10);
    }

    #[test]
    fn fires_once_per_crossed_decile() {
        let mut progress = DecileProgress::new(Recorder::default());
        for done in 1..=100 {
            progress.report(done, 100);
        }

        let recorder = progress.into_inner();
        assert_eq!(recorder.reports.len(), 10);
        assert_eq!(recorder.reports[0], (10, 100));
        assert_eq!(recorder.reports[9], (100, 100));
    }

    #[test]
    fn repeated_reports_within_decile_suppressed() {
        let mut progress = DecileProgress::new(Recorder::default());
        progress.report(10, 100);
        progress.report(11, 100);
        progress.report(19, 100);

        assert_eq!(progress.into_inner().reports, vec![(10, 100)]);
    }

    #[test]
    fn jump_reports_highest_decile_once() {
        let mut progress = DecileProgress::new(Recorder::default());
        progress.report(95, 100);
        progress.report(100, 100);

        let recorder = progress.into_inner();
        assert_eq!(recorder.reports, vec![(95, 100), (100, 100)]);
    }

    #[test]
    fn finish_propagates_to_inner() {
        let mut progress = DecileProgress::new(Recorder::default());
        progress.finish();

        assert!(progress.into_inner().finished);
    }
}
