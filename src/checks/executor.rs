use crate::checks::checker::Checker;
use crate::checks::types::{CheckResult, CheckResultType, PackageCheckResults};
use crate::pip::ResolvedPackage;
use crate::progress::{ProgressChannel, ProgressSink};
use crate::pypi::client::RegistryApi;
use crate::pypi::verify::{verify_release, PendingVerification, ReleaseVerification};
use crate::report::escape_markup;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinSet};

/// Result of one run over the resolved install list
#[derive(Debug)]
pub enum CheckOutcome {
    /// No directly requested packages; nothing was looked up
    NothingToCheck,
    /// One entry per requested package, in install-list order
    Completed(Vec<PackageCheckResults>),
}

/// Runs every checker against every requested package concurrently
pub struct CheckExecutor {
    registry: Arc<dyn RegistryApi>,
    checkers: Vec<Arc<dyn Checker>>,
}

/// Aborts the tracked tasks when dropped
#[derive(Default)]
struct TaskGuard(Vec<AbortHandle>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

impl CheckExecutor {
    /// Create a new executor running `checkers` in the given order
    pub fn new(registry: Arc<dyn RegistryApi>, checkers: Vec<Arc<dyn Checker>>) -> Self {
        Self { registry, checkers }
    }

    /// Check the directly requested packages.
    ///
    /// Every (package, checker) pair yields exactly one result: a checker that returns an
    /// error or panics is reported as [`CheckResultType::Error`]. Dropping the returned
    /// future cancels all in-flight lookups.
    pub async fn execute(&self, packages: &[ResolvedPackage], progress: &dyn ProgressSink) -> CheckOutcome {
        let requested: Vec<Arc<ResolvedPackage>> = packages
            .iter()
            .filter(|p| p.requested)
            .cloned()
            .map(Arc::new)
            .collect();
        if requested.is_empty() {
            return CheckOutcome::NothingToCheck;
        }
        tracing::debug!(
            "Checking {} requested package(s) with {} checker(s)",
            requested.len(),
            self.checkers.len()
        );

        let mut verification_tasks = TaskGuard::default();
        let verifications: Vec<PendingVerification> = requested
            .iter()
            .map(|package| {
                let registry = Arc::clone(&self.registry);
                let package = Arc::clone(package);
                let handle = tokio::spawn(async move { Arc::new(verify_release(registry.as_ref(), &package).await) });
                verification_tasks.0.push(handle.abort_handle());
                async move {
                    handle.await.unwrap_or_else(|e| {
                        tracing::warn!("Release verification task failed: {}", e);
                        Arc::new(ReleaseVerification::Unverifiable)
                    })
                }
                .boxed()
                .shared()
            })
            .collect();

        let channels: Vec<Box<dyn ProgressChannel>> = self
            .checkers
            .iter()
            .map(|checker| progress.add_channel(checker.description(), requested.len() as u64))
            .collect();

        let mut join_set = JoinSet::new();
        for (checker_idx, checker) in self.checkers.iter().enumerate() {
            for (package_idx, package) in requested.iter().enumerate() {
                let checker = Arc::clone(checker);
                let package = Arc::clone(package);
                let verification = verifications[package_idx].clone();
                join_set.spawn(async move {
                    let result = run_check(checker.as_ref(), &package, verification).await;
                    (package_idx, checker_idx, result)
                });
            }
        }

        let mut grid: Vec<Vec<Option<CheckResult>>> = vec![vec![None; self.checkers.len()]; requested.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((package_idx, checker_idx, result)) => {
                    channels[checker_idx].advance(result.result_type);
                    grid[package_idx][checker_idx] = Some(result);
                }
                // Panics are caught inside the task, so this is only reachable through abort
                Err(e) => tracing::warn!("Check task failed: {}", e),
            }
        }
        for channel in &channels {
            channel.finish();
        }

        let results = requested
            .iter()
            .zip(grid)
            .map(|(package, row)| PackageCheckResults {
                pinned_requirement: package.pinned_requirement(),
                results: row
                    .into_iter()
                    .zip(&self.checkers)
                    .map(|(result, checker)| {
                        result.unwrap_or_else(|| {
                            CheckResult::new(CheckResultType::Error, "Check did not complete", checker.priority())
                        })
                    })
                    .collect(),
            })
            .collect();
        CheckOutcome::Completed(results)
    }
}

async fn run_check(checker: &dyn Checker, package: &ResolvedPackage, verification: PendingVerification) -> CheckResult {
    match AssertUnwindSafe(checker.check(package, verification)).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::warn!(
                "{} failed for {}: {}",
                checker.description(),
                package.pinned_requirement(),
                e
            );
            CheckResult::new(
                CheckResultType::Error,
                format!("Check failed: {}", escape_markup(&e.to_string())),
                checker.priority(),
            )
        }
        Err(_) => {
            tracing::warn!(
                "{} panicked for {}",
                checker.description(),
                package.pinned_requirement()
            );
            CheckResult::new(CheckResultType::Error, "Check failed unexpectedly", checker.priority())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{package, release, release_file, FakeRegistry, PACKAGE_HASH};
    use crate::core::{PipguardError, PipguardResult};
    use crate::progress::NoProgress;
    use crate::pypi::models::{
        DistributionsResponse, ProjectInfo, PublisherAttestation, ReleaseResponse,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Reports the verified project name, or failure when unverifiable
    struct NameChecker(u32);

    #[async_trait]
    impl Checker for NameChecker {
        fn description(&self) -> &'static str {
            "Checking name"
        }

        fn priority(&self) -> u32 {
            self.0
        }

        async fn check(&self, package: &ResolvedPackage, verification: PendingVerification) -> PipguardResult<CheckResult> {
            let verification = verification.await;
            Ok(match verification.verified() {
                Some(verified) => self.result(
                    CheckResultType::Success,
                    format!("{} is {}", package.name, verified.name()),
                ),
                None => self.no_release_info(),
            })
        }
    }

    struct FailingChecker;

    #[async_trait]
    impl Checker for FailingChecker {
        fn description(&self) -> &'static str {
            "Failing"
        }

        fn priority(&self) -> u32 {
            99
        }

        async fn check(&self, _: &ResolvedPackage, _: PendingVerification) -> PipguardResult<CheckResult> {
            Err(PipguardError::Io(std::io::Error::other("service [red]exploded")))
        }
    }

    struct PanickingChecker;

    #[async_trait]
    impl Checker for PanickingChecker {
        fn description(&self) -> &'static str {
            "Panicking"
        }

        fn priority(&self) -> u32 {
            98
        }

        async fn check(&self, _: &ResolvedPackage, _: PendingVerification) -> PipguardResult<CheckResult> {
            panic!("checker bug");
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        channels: Mutex<Vec<(String, u64)>>,
        events: Arc<Mutex<Vec<(String, CheckResultType)>>>,
    }

    struct RecordingChannel {
        label: String,
        events: Arc<Mutex<Vec<(String, CheckResultType)>>>,
    }

    impl ProgressSink for RecordingProgress {
        fn add_channel(&self, label: &str, total: u64) -> Box<dyn ProgressChannel> {
            self.channels.lock().unwrap().push((label.to_string(), total));
            Box::new(RecordingChannel {
                label: label.to_string(),
                events: Arc::clone(&self.events),
            })
        }
    }

    impl ProgressChannel for RecordingChannel {
        fn advance(&self, result_type: CheckResultType) {
            self.events.lock().unwrap().push((self.label.clone(), result_type));
        }

        fn finish(&self) {}
    }

    fn registry() -> Arc<FakeRegistry> {
        Arc::new(FakeRegistry {
            release: Some(release(
                ProjectInfo::default(),
                vec![release_file("package-1.0.0.tar.gz", None)],
                Vec::new(),
            )),
            ..FakeRegistry::default()
        })
    }

    #[tokio::test]
    async fn test_one_result_per_package_and_checker() {
        let executor = CheckExecutor::new(
            registry(),
            vec![Arc::new(NameChecker(1)), Arc::new(NameChecker(2))],
        );
        let packages = vec![
            package(),
            ResolvedPackage::new("other", "2.0").with_hash("sha256", PACKAGE_HASH),
            ResolvedPackage::new("dep", "0.1").with_hash("sha256", PACKAGE_HASH).transitive(),
        ];

        let CheckOutcome::Completed(results) = executor.execute(&packages, &NoProgress).await else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].pinned_requirement, "package==1.0.0");
        assert_eq!(results[1].pinned_requirement, "other==2.0");
        for package_results in &results {
            let priorities: Vec<u32> = package_results.results.iter().map(|r| r.priority).collect();
            assert_eq!(priorities, vec![1, 2]);
        }
        assert_eq!(results[1].results[0].message, "other is package");
    }

    #[tokio::test]
    async fn test_nothing_to_check() {
        let executor = CheckExecutor::new(registry(), vec![Arc::new(NameChecker(1))]);
        let packages = vec![package().transitive()];
        assert!(matches!(
            executor.execute(&packages, &NoProgress).await,
            CheckOutcome::NothingToCheck
        ));
        assert!(matches!(
            executor.execute(&[], &NoProgress).await,
            CheckOutcome::NothingToCheck
        ));
    }

    #[tokio::test]
    async fn test_faulty_checkers_become_errors() {
        let executor = CheckExecutor::new(
            registry(),
            vec![
                Arc::new(NameChecker(1)),
                Arc::new(FailingChecker),
                Arc::new(PanickingChecker),
            ],
        );

        let CheckOutcome::Completed(results) = executor.execute(&[package()], &NoProgress).await else {
            panic!("expected results");
        };
        let results = &results[0].results;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].result_type, CheckResultType::Success);
        assert_eq!(results[1].result_type, CheckResultType::Error);
        assert_eq!(results[1].message, "Check failed: IO error: service \\[red]exploded");
        assert_eq!(results[1].priority, 99);
        assert_eq!(results[2].result_type, CheckResultType::Error);
        assert_eq!(results[2].priority, 98);
    }

    #[tokio::test]
    async fn test_unverifiable_package_still_checked() {
        let executor = CheckExecutor::new(Arc::new(FakeRegistry::default()), vec![Arc::new(NameChecker(1))]);

        let CheckOutcome::Completed(results) = executor.execute(&[package()], &NoProgress).await else {
            panic!("expected results");
        };
        assert_eq!(results[0].results[0].result_type, CheckResultType::Failure);
        assert_eq!(results[0].results[0].message, "No release information available");
    }

    #[tokio::test]
    async fn test_progress_reports_each_completion_once() {
        let executor = CheckExecutor::new(
            registry(),
            vec![Arc::new(NameChecker(1)), Arc::new(FailingChecker)],
        );
        let progress = RecordingProgress::default();
        let packages = vec![package(), ResolvedPackage::new("other", "2.0")];

        executor.execute(&packages, &progress).await;

        let channels = progress.channels.lock().unwrap().clone();
        assert_eq!(
            channels,
            vec![("Checking name".to_string(), 2), ("Failing".to_string(), 2)]
        );
        let events = progress.events.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events.iter().filter(|(label, _)| label == "Failing").count(),
            2
        );
        assert!(events
            .iter()
            .filter(|(label, _)| label == "Failing")
            .all(|(_, result_type)| *result_type == CheckResultType::Error));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_verification_fetched_once_per_package() {
        let registry = registry();
        let checkers: Vec<Arc<dyn Checker>> = (0..6).map(|i| Arc::new(NameChecker(i)) as Arc<dyn Checker>).collect();
        let executor = CheckExecutor::new(registry.clone(), checkers);

        executor.execute(&[package()], &NoProgress).await;
        assert_eq!(registry.release_calls(), 1);
    }

    /// Sets its flag when dropped
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// A registry and checker whose lookups never finish
    #[derive(Default)]
    struct Hanging {
        started: AtomicUsize,
        lookup_dropped: Arc<AtomicBool>,
        check_dropped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RegistryApi for Hanging {
        async fn get_release(&self, _: &str, _: &str) -> Option<ReleaseResponse> {
            let _flag = DropFlag(Arc::clone(&self.lookup_dropped));
            self.started.fetch_add(1, Ordering::SeqCst);
            futures::future::pending().await
        }

        async fn get_distribution_files(&self, _: &str) -> Option<DistributionsResponse> {
            None
        }

        async fn get_attestations(&self, _: &str, _: &str, _: &str) -> Option<PublisherAttestation> {
            None
        }
    }

    #[async_trait]
    impl Checker for Hanging {
        fn description(&self) -> &'static str {
            "Hanging"
        }

        fn priority(&self) -> u32 {
            1
        }

        async fn check(&self, _: &ResolvedPackage, _: PendingVerification) -> PipguardResult<CheckResult> {
            let _flag = DropFlag(Arc::clone(&self.check_dropped));
            self.started.fetch_add(1, Ordering::SeqCst);
            futures::future::pending().await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropping_execution_cancels_inflight_work() {
        let hanging = Arc::new(Hanging::default());
        let executor = CheckExecutor::new(hanging.clone(), vec![hanging.clone() as Arc<dyn Checker>]);

        let run = tokio::spawn(async move { executor.execute(&[package()], &NoProgress).await });
        tokio::time::timeout(Duration::from_secs(5), async {
            while hanging.started.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("lookups should start");

        run.abort();
        assert!(run.await.unwrap_err().is_cancelled());
        tokio::time::timeout(Duration::from_secs(5), async {
            while !(hanging.lookup_dropped.load(Ordering::SeqCst) && hanging.check_dropped.load(Ordering::SeqCst)) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("in-flight lookups should be cancelled");
    }
}
