/// ProgressReporter port for user-facing progress during a catalog run
///
/// Progress is separate from logging: it is meant for a person watching
/// the terminal and can be silenced entirely with `--quiet`.
pub trait ProgressReporter: Send + Sync {
    /// Reports a step of the run, e.g. opening the source
    fn report(&self, message: &str);

    /// Reports how many of `total` analyzers have been merged
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports a non-fatal problem such as a failed analyzer
    fn report_error(&self, message: &str);

    /// Reports the end of the run
    fn report_completion(&self, message: &str);
}
