//! Progress tracking and callbacks for training runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Snapshot of one training iteration.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Iteration number, starting at 1.
    pub iteration: usize,
    /// Iteration budget, if known.
    pub total_iterations: Option<usize>,
    /// Loss at this iteration.
    pub loss: f64,
    /// Time since the run started.
    pub elapsed: Duration,
    /// Estimated time left.
    pub estimated_remaining: Option<Duration>,
    /// Learning rate used for the update.
    pub learning_rate: f64,
    /// Named loss components.
    pub metrics: Vec<(String, f64)>,
}

impl ProgressInfo {
    /// Snapshot with no metrics and no time estimate.
    pub fn new(
        iteration: usize,
        total_iterations: Option<usize>,
        loss: f64,
        elapsed: Duration,
        learning_rate: f64,
    ) -> Self {
        Self {
            iteration,
            total_iterations,
            loss,
            elapsed,
            estimated_remaining: None,
            learning_rate,
            metrics: Vec::new(),
        }
    }

    /// Fraction of the budget completed, in percent.
    pub fn progress_percent(&self) -> Option<f64> {
        self.total_iterations
            .filter(|&total| total > 0)
            .map(|total| (self.iteration as f64 / total as f64) * 100.0)
    }

    /// Extrapolate the remaining time from the mean iteration time.
    pub fn calculate_remaining(&mut self) {
        if let Some(total) = self.total_iterations {
            if self.iteration > 0 {
                let per_iteration = self.elapsed.as_secs_f64() / self.iteration as f64;
                let remaining = total.saturating_sub(self.iteration);
                self.estimated_remaining =
                    Some(Duration::from_secs_f64(per_iteration * remaining as f64));
            }
        }
    }

    /// Attach a named loss component.
    pub fn add_metric(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.push((name.into(), value));
    }

    /// Look up a named metric.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

/// Observer of training progress.
pub trait ProgressCallback: Send + Sync {
    /// Called after every optimizer step.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called once before the first iteration.
    fn on_start(&self) {}

    /// Called once after the loop ends.
    fn on_complete(&self, _info: &ProgressInfo) {}

    /// Called when an iteration produced a non-finite loss.
    fn on_error(&self, _error: &str) {}

    /// Whether the run should end after the current iteration.
    fn should_stop(&self) -> bool {
        false
    }
}

/// Logs progress through `tracing` every `log_interval` iterations.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    /// Iterations between log lines.
    pub log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self { log_interval: 50 }
    }
}

impl ConsoleProgressCallback {
    /// Log every `log_interval` iterations (at least 1).
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.iteration % self.log_interval == 0 || info.total_iterations == Some(info.iteration)
        {
            let remaining = info
                .estimated_remaining
                .map(|d| format!("{:.1}s", d.as_secs_f64()))
                .unwrap_or_else(|| "N/A".to_string());

            tracing::info!(
                "Iter {}/{} ({:.1}%) | Loss: {:.6} | LR: {:.2e} | ETA: {}",
                info.iteration,
                info.total_iterations
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                info.progress_percent().unwrap_or(0.0),
                info.loss,
                info.learning_rate,
                remaining
            );
            for (name, value) in &info.metrics {
                tracing::debug!("  {}: {:.6}", name, value);
            }
        }
    }

    fn on_start(&self) {
        tracing::info!("Training started");
    }

    fn on_complete(&self, info: &ProgressInfo) {
        tracing::info!(
            "Training finished after {} iterations in {:.2}s with loss {:.6}",
            info.iteration,
            info.elapsed.as_secs_f64(),
            info.loss
        );
    }

    fn on_error(&self, error: &str) {
        tracing::warn!("{}", error);
    }
}

/// Records every snapshot for later inspection.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl HistoryCallback {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded snapshots in iteration order.
    pub fn history(&self) -> Vec<ProgressInfo> {
        lock(&self.history).clone()
    }

    /// Loss values in iteration order.
    pub fn losses(&self) -> Vec<f64> {
        lock(&self.history).iter().map(|info| info.loss).collect()
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        lock(&self.history).push(info.clone());
    }
}

#[derive(Debug)]
struct EarlyStoppingState {
    best_loss: f64,
    stale: usize,
    stop: bool,
}

impl Default for EarlyStoppingState {
    fn default() -> Self {
        Self {
            best_loss: f64::INFINITY,
            stale: 0,
            stop: false,
        }
    }
}

/// Requests a stop once the loss stops improving or reaches a threshold.
#[derive(Debug, Clone)]
pub struct EarlyStoppingCallback {
    /// Smallest decrease that counts as an improvement.
    pub min_improvement: f64,
    /// Iterations without improvement tolerated before stopping.
    pub patience: usize,
    /// Stop as soon as the loss drops to this value.
    pub min_loss: Option<f64>,
    state: Arc<Mutex<EarlyStoppingState>>,
}

impl EarlyStoppingCallback {
    /// Stop after `patience` iterations without a decrease larger than `min_improvement`.
    pub fn new(min_improvement: f64, patience: usize) -> Self {
        Self {
            min_improvement,
            patience,
            min_loss: None,
            state: Arc::new(Mutex::new(EarlyStoppingState::default())),
        }
    }

    /// Also stop once the loss reaches `min_loss`.
    pub fn with_min_loss(mut self, min_loss: f64) -> Self {
        self.min_loss = Some(min_loss);
        self
    }

    /// Forget the best loss and clear any stop request.
    pub fn reset(&self) {
        *lock(&self.state) = EarlyStoppingState::default();
    }
}

impl ProgressCallback for EarlyStoppingCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        let mut state = lock(&self.state);
        if state.stop || !info.loss.is_finite() {
            return;
        }

        if let Some(min_loss) = self.min_loss {
            if info.loss <= min_loss {
                state.stop = true;
                tracing::info!(
                    "Early stopping: loss {:.6} reached threshold {:.6}",
                    info.loss,
                    min_loss
                );
                return;
            }
        }

        if state.best_loss - info.loss > self.min_improvement {
            state.best_loss = info.loss;
            state.stale = 0;
        } else {
            state.stale += 1;
        }

        if state.stale >= self.patience {
            state.stop = true;
            tracing::info!(
                "Early stopping: no improvement for {} iterations (best {:.6}, current {:.6})",
                self.patience,
                state.best_loss,
                info.loss
            );
        }
    }

    fn should_stop(&self) -> bool {
        lock(&self.state).stop
    }
}

/// Fans progress events out to registered callbacks.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    start_time: Arc<Mutex<Option<Instant>>>,
}

impl ProgressTracker {
    /// Tracker with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    /// Start the clock and notify callbacks.
    pub fn start(&self) {
        *lock(&self.start_time) = Some(Instant::now());
        for callback in &self.callbacks {
            callback.on_start();
        }
    }

    fn elapsed(&self) -> Duration {
        lock(&self.start_time)
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Report one iteration with its named loss components.
    pub fn update(
        &self,
        iteration: usize,
        total_iterations: Option<usize>,
        loss: f64,
        learning_rate: f64,
        metrics: Vec<(String, f64)>,
    ) {
        let mut info =
            ProgressInfo::new(iteration, total_iterations, loss, self.elapsed(), learning_rate);
        info.metrics = metrics;
        info.calculate_remaining();

        for callback in &self.callbacks {
            callback.on_progress(&info);
        }
    }

    /// Whether any callback asked to stop.
    pub fn should_stop(&self) -> bool {
        self.callbacks.iter().any(|c| c.should_stop())
    }

    /// Notify callbacks that the run ended after `iterations` iterations.
    pub fn complete(&self, iterations: usize, final_loss: f64, learning_rate: f64) {
        let info = ProgressInfo::new(
            iterations,
            Some(iterations),
            final_loss,
            self.elapsed(),
            learning_rate,
        );
        for callback in &self.callbacks {
            callback.on_complete(&info);
        }
    }

    /// Forward an error message to every callback.
    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }
}
