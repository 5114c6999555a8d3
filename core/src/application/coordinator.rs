//! Concurrent scan execution.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::adapters::{requires_elevation, running_as_root};
use crate::domain::{CommandOutcome, OutcomeKind};
use crate::error::{Error, Result};
use crate::ports::{ExecutionHooks, NoopHooks, ProcessRunner};

/// Default number of commands allowed to run at once.
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Default time budget for a single command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for a [`ConcurrentScanCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Upper bound on simultaneously executing commands.
    pub max_workers: usize,
    /// Time budget per command.
    pub timeout: Duration,
    /// Emit an advisory when a batch needs privileges the process lacks.
    pub warn_about_privileges: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            warn_about_privileges: true,
        }
    }
}

impl CoordinatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_privilege_warning(mut self, enabled: bool) -> Self {
        self.warn_about_privileges = enabled;
        self
    }

    /// Reject settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Human-readable notices raised while running batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// A batch asked for elevated privileges the process does not have.
    ElevationRequired { command: String },
    /// A command ran out of time. Raised at most once per coordinator.
    Timeout { command: String, timeout: Duration },
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::ElevationRequired { command } => write!(
                f,
                "`{}` asks for sudo but the process is not running as root; sudo may prompt \
                 for a password, and without root nmap falls back to a TCP scan instead \
                 of ARP or ICMP and MAC addresses are not reported",
                command
            ),
            Advisory::Timeout { command, timeout } => write!(
                f,
                "`{}` did not finish within {}s; consider raising the timeout \
                 (further timeouts are not reported)",
                command,
                timeout.as_secs_f64()
            ),
        }
    }
}

/// State shared between the coordinator and its running tasks.
#[derive(Default)]
struct Shared {
    timeout_warned: AtomicBool,
    advisories: RwLock<Vec<Advisory>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Shared {
    fn advise(&self, advisory: Advisory) {
        warn!("{}", advisory);
        self.advisories.write().push(advisory);
    }

    /// Only the first caller wins the flag.
    fn warn_timeout_once(&self, command: &str, timeout: Duration) {
        if self
            .timeout_warned
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.advise(Advisory::Timeout {
                command: command.to_string(),
                timeout,
            });
        }
    }

    fn task_started(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn task_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs batches of independent commands with bounded parallelism.
///
/// Each task goes through `hooks.before`, the runner, then `hooks.after`.
/// A failing or timed-out task only affects its own [`CommandOutcome`].
pub struct ConcurrentScanCoordinator<R: ProcessRunner> {
    runner: Arc<R>,
    options: CoordinatorOptions,
    privileged: bool,
    shared: Arc<Shared>,
}

impl<R: ProcessRunner + 'static> ConcurrentScanCoordinator<R> {
    /// Create a coordinator; privileges are probed from the current process.
    pub fn new(runner: R, options: CoordinatorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            runner: Arc::new(runner),
            options,
            privileged: running_as_root(),
            shared: Arc::new(Shared::default()),
        })
    }

    /// Override the privilege probe.
    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    /// Run every command and wait for all of them.
    ///
    /// Outcomes come back in completion order. Only an empty batch is an
    /// error; command failures are reported through their outcomes.
    pub async fn run_batch<H>(
        &self,
        commands: Vec<String>,
        hooks: Arc<H>,
    ) -> Result<Vec<CommandOutcome>>
    where
        H: ExecutionHooks + 'static,
    {
        let Some(first) = commands.first() else {
            return Err(Error::EmptyBatch);
        };
        self.check_privileges(first);
        self.shared.peak_in_flight.store(0, Ordering::SeqCst);

        let batch_size = commands.len();
        debug!(
            batch_size,
            max_workers = self.options.max_workers,
            "dispatching batch"
        );

        let slots = Arc::new(Semaphore::new(self.options.max_workers));
        let mut tasks = JoinSet::new();

        for command in commands {
            // Wait for a free slot before the task exists at all.
            let permit = Arc::clone(&slots)
                .acquire_owned()
                .await
                .map_err(|e| Error::InvalidConfig(format!("worker pool closed: {}", e)))?;

            let runner = Arc::clone(&self.runner);
            let hooks = Arc::clone(&hooks);
            let shared = Arc::clone(&self.shared);
            let timeout = self.options.timeout;

            tasks.spawn(async move {
                let handle = hooks.before(&command);

                shared.task_started();
                let outcome = runner.run(&command, timeout).await;
                shared.task_finished();

                match outcome.kind() {
                    OutcomeKind::Succeeded => debug!(command = %command, "task succeeded"),
                    OutcomeKind::Failed => warn!(
                        command = %command,
                        exit_code = outcome.exit_code(),
                        stderr = %outcome.stderr(),
                        "task failed"
                    ),
                    OutcomeKind::TimedOut => shared.warn_timeout_once(&command, timeout),
                }

                hooks.after(&outcome, handle);
                drop(permit);
                outcome
            });
        }

        let mut outcomes = Vec::with_capacity(batch_size);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "scan task panicked"),
            }
        }

        debug!(completed = outcomes.len(), batch_size, "batch finished");
        Ok(outcomes)
    }

    /// Run a single command without hooks.
    pub async fn run_one(&self, command: impl Into<String>) -> Result<CommandOutcome> {
        let command = command.into();
        self.run_batch(vec![command.clone()], Arc::new(NoopHooks))
            .await?
            .pop()
            .ok_or_else(|| Error::CommandFailed(format!("`{}` did not complete", command)))
    }

    /// Get and clear pending advisories.
    pub fn take_advisories(&self) -> Vec<Advisory> {
        std::mem::take(&mut *self.shared.advisories.write())
    }

    /// Highest number of commands observed executing at the same time during
    /// the most recent batch.
    pub fn peak_in_flight(&self) -> usize {
        self.shared.peak_in_flight.load(Ordering::SeqCst)
    }

    fn check_privileges(&self, first_command: &str) {
        if self.options.warn_about_privileges
            && !self.privileged
            && requires_elevation(first_command)
        {
            self.shared.advise(Advisory::ElevationRequired {
                command: first_command.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Mock runner: commands containing "slow" time out, "fail" exits 1.
    struct MockRunner {
        delay: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockRunner {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl ProcessRunner for MockRunner {
        async fn run(&self, command: &str, timeout: Duration) -> CommandOutcome {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            if command.contains("slow") {
                CommandOutcome::timed_out(command, timeout)
            } else if command.contains("fail") {
                CommandOutcome::completed(command, "", "boom", Some(1))
            } else {
                CommandOutcome::completed(command, "ok", "", Some(0))
            }
        }
    }

    /// Hooks that count calls and hand out sequential handles.
    #[derive(Default)]
    struct CountingHooks {
        before: AtomicUsize,
        after: AtomicUsize,
        handles: RwLock<HashSet<usize>>,
    }

    impl ExecutionHooks for CountingHooks {
        type Handle = usize;

        fn before(&self, _command: &str) -> usize {
            self.before.fetch_add(1, Ordering::SeqCst)
        }

        fn after(&self, _outcome: &CommandOutcome, handle: usize) {
            self.after.fetch_add(1, Ordering::SeqCst);
            self.handles.write().insert(handle);
        }
    }

    fn commands(n: usize, name: &str) -> Vec<String> {
        (0..n).map(|i| format!("nmap {} 10.0.0.{}", name, i)).collect()
    }

    fn coordinator(delay: Duration, max_workers: usize) -> ConcurrentScanCoordinator<MockRunner> {
        let options = CoordinatorOptions::new()
            .with_max_workers(max_workers)
            .with_timeout(Duration::from_secs(1));
        ConcurrentScanCoordinator::new(MockRunner::new(delay), options)
            .unwrap()
            .with_privileged(true)
    }

    #[test]
    fn test_options_validation() {
        assert!(CoordinatorOptions::default().validate().is_ok());
        assert_eq!(CoordinatorOptions::default().max_workers, 20);
        assert!(matches!(
            CoordinatorOptions::new().with_max_workers(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            CoordinatorOptions::new().with_timeout(Duration::ZERO).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(ConcurrentScanCoordinator::new(
            MockRunner::new(Duration::ZERO),
            CoordinatorOptions::new().with_max_workers(0)
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_is_error() {
        let coordinator = coordinator(Duration::ZERO, 4);
        let result = coordinator.run_batch(Vec::new(), Arc::new(NoopHooks)).await;
        assert!(matches!(result, Err(Error::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_small_batch_runs_every_task() {
        let coordinator = coordinator(Duration::from_millis(5), 20);
        let hooks = Arc::new(CountingHooks::default());

        let outcomes = coordinator
            .run_batch(commands(7, "-sn"), Arc::clone(&hooks))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 7);
        assert!(outcomes.iter().all(CommandOutcome::succeeded));
        assert_eq!(hooks.before.load(Ordering::SeqCst), 7);
        assert_eq!(hooks.after.load(Ordering::SeqCst), 7);
        // Every handle from `before` came back through `after`.
        assert_eq!(hooks.handles.read().len(), 7);

        let mut seen: Vec<_> = outcomes.iter().map(|o| o.command().to_string()).collect();
        seen.sort();
        let mut expected = commands(7, "-sn");
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_large_batch_respects_worker_bound() {
        let coordinator = coordinator(Duration::from_millis(20), 20);
        let hooks = Arc::new(CountingHooks::default());

        let outcomes = coordinator
            .run_batch(commands(65, "-F"), Arc::clone(&hooks))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 65);
        assert_eq!(hooks.after.load(Ordering::SeqCst), 65);
        assert_eq!(coordinator.peak_in_flight(), 20);
        assert_eq!(coordinator.runner.peak.load(Ordering::SeqCst), 20);

        // The next batch starts counting from zero.
        coordinator
            .run_batch(commands(1, "-F"), Arc::new(NoopHooks))
            .await
            .unwrap();
        assert_eq!(coordinator.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_bound_of_one_serializes() {
        let coordinator = coordinator(Duration::from_millis(2), 1);
        let outcomes = coordinator
            .run_batch(commands(5, "-sn"), Arc::new(NoopHooks))
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 5);
        assert_eq!(coordinator.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let coordinator = coordinator(Duration::from_millis(1), 20);
        let mut batch = commands(4, "-sn");
        batch.push("nmap fail 10.0.0.99".to_string());

        let outcomes = coordinator.run_batch(batch, Arc::new(NoopHooks)).await.unwrap();

        assert_eq!(outcomes.len(), 5);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.succeeded()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind(), OutcomeKind::Failed);
        assert_eq!(failed[0].stderr(), "boom");
        assert!(coordinator.take_advisories().is_empty());
    }

    #[tokio::test]
    async fn test_single_timeout_advisory() {
        let coordinator = coordinator(Duration::from_millis(1), 20);
        let mut batch = commands(9, "-sn");
        batch.push("nmap slow 10.0.0.200".to_string());
        batch.push("nmap slow 10.0.0.201".to_string());
        batch.push("nmap slow 10.0.0.202".to_string());

        let outcomes = coordinator.run_batch(batch, Arc::new(NoopHooks)).await.unwrap();

        assert_eq!(outcomes.iter().filter(|o| o.is_timeout()).count(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.succeeded()).count(), 9);

        let advisories = coordinator.take_advisories();
        assert_eq!(advisories.len(), 1);
        assert!(matches!(advisories[0], Advisory::Timeout { .. }));

        // Still suppressed on the next batch of the same coordinator.
        coordinator
            .run_batch(vec!["nmap slow again".to_string()], Arc::new(NoopHooks))
            .await
            .unwrap();
        assert!(coordinator.take_advisories().is_empty());
    }

    #[tokio::test]
    async fn test_elevation_advisory_when_unprivileged() {
        let coordinator = coordinator(Duration::ZERO, 4).with_privileged(false);
        let batch = vec![
            "sudo nmap -sn 10.0.0.0/24".to_string(),
            "sudo nmap -sn 10.0.1.0/24".to_string(),
        ];

        let outcomes = coordinator.run_batch(batch, Arc::new(NoopHooks)).await.unwrap();

        // Dispatch proceeds regardless of the advisory.
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            coordinator.take_advisories(),
            vec![Advisory::ElevationRequired {
                command: "sudo nmap -sn 10.0.0.0/24".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_no_elevation_advisory_when_privileged_or_disabled() {
        let privileged = coordinator(Duration::ZERO, 4).with_privileged(true);
        privileged.run_one("sudo nmap --version").await.unwrap();
        assert!(privileged.take_advisories().is_empty());

        let options = CoordinatorOptions::new().with_privilege_warning(false);
        let quiet = ConcurrentScanCoordinator::new(MockRunner::new(Duration::ZERO), options)
            .unwrap()
            .with_privileged(false);
        quiet.run_one("sudo nmap --version").await.unwrap();
        assert!(quiet.take_advisories().is_empty());
    }

    #[tokio::test]
    async fn test_run_one() {
        let coordinator = coordinator(Duration::ZERO, 4);
        let outcome = coordinator.run_one("nmap --version").await.unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.stdout(), "ok");
    }
}
