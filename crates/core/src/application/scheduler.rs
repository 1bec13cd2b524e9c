//! Task Scheduler - runs every registered instance task on a fixed tick
//!
//! Each tick lists the known instances, skips the ones the control plane
//! reports as stopped, and runs all tasks against the rest concurrently.
//! Failures are logged and counted; the next tick is the retry.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::application::cancellation::CancelToken;
use crate::application::task::InstanceTask;
use crate::domain::Instance;
use crate::error::Result;
use crate::port::{InstanceManager, InstanceStorage};

/// Outcome counters of a single tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Task runs that returned Ok
    pub succeeded: usize,
    /// Task runs that failed, panicked or were cancelled
    pub failed: usize,
    /// Instances not probed because they are not running
    pub skipped: usize,
}

/// Scheduler owning the registered instance tasks
pub struct TaskScheduler {
    storage: Arc<dyn InstanceStorage>,
    manager: Arc<dyn InstanceManager>,
    tasks: Vec<Arc<dyn InstanceTask>>,
    interval: Duration,
}

impl TaskScheduler {
    pub fn new(
        storage: Arc<dyn InstanceStorage>,
        manager: Arc<dyn InstanceManager>,
        interval: Duration,
    ) -> Self {
        Self {
            storage,
            manager,
            tasks: Vec::new(),
            interval,
        }
    }

    /// Register a task to run against every instance
    pub fn register(&mut self, task: Arc<dyn InstanceTask>) {
        info!(task = task.name(), "Task registered");
        self.tasks.push(task);
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name().to_string()).collect()
    }

    /// Run all tasks against all running instances once
    ///
    /// # Errors
    /// Only listing instances can fail; task failures are counted in the report.
    pub async fn run_once(&self, cancel: &CancelToken) -> Result<TickReport> {
        let instances = self.storage.list_instances().await?;
        let mut report = TickReport::default();
        let mut runs = JoinSet::new();

        for instance in instances {
            if !self.manager.is_running(&instance).await {
                debug!(instance = %instance.name, "Instance not running, skipping");
                report.skipped += 1;
                continue;
            }

            let instance = Arc::new(instance);
            for task in &self.tasks {
                let task = Arc::clone(task);
                let instance = Arc::clone(&instance);
                let cancel = cancel.clone();

                // Spawned so a panicking task cannot take down the scheduler
                runs.spawn(async move {
                    let result = task.run(&cancel, &instance).await;
                    (task.name().to_string(), instance, result)
                });
            }
        }

        while let Some(joined) = runs.join_next().await {
            match joined {
                Ok((_, _, Ok(()))) => report.succeeded += 1,
                Ok((task, instance, Err(e))) => {
                    report.failed += 1;
                    warn!(
                        task = %task,
                        instance = %instance.name,
                        error = %e,
                        "Task run failed"
                    );
                }
                Err(join_err) => {
                    report.failed += 1;
                    if join_err.is_panic() {
                        error!("Task panicked: {:?}", join_err);
                    } else {
                        error!("Task aborted: {:?}", join_err);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Run the tick loop until `cancel` fires
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(&self, cancel: CancelToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            tasks = ?self.task_names(),
            "Task scheduler started"
        );

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {},
                _ = cancel.cancelled() => {
                    info!("Task scheduler interrupted while idle");
                    break;
                }
            }

            match self.run_once(&cancel).await {
                Ok(report) => debug!(
                    succeeded = report.succeeded,
                    failed = report.failed,
                    skipped = report.skipped,
                    "Scheduler tick completed"
                ),
                Err(e) => error!(error = %e, "Scheduler tick failed"),
            }

            if cancel.is_cancelled() {
                break;
            }
        }

        info!("Task scheduler stopped");
    }

    /// Run every task against a single instance, bypassing the running check
    pub async fn run_for(
        &self,
        cancel: &CancelToken,
        instance: &Instance,
    ) -> Vec<(String, Result<()>)> {
        let mut results = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            results.push((task.name().to_string(), task.run(cancel, instance).await));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cancellation::cancel_channel;
    use crate::error::AppError;
    use crate::port::instance_storage::mocks::StaticInstances;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Task recording which instances it ran against
    struct CountingTask {
        name: &'static str,
        fail_for: Option<&'static str>,
        seen: Mutex<Vec<String>>,
        runs: AtomicUsize,
    }

    impl CountingTask {
        fn new(name: &'static str, fail_for: Option<&'static str>) -> Self {
            Self {
                name,
                fail_for,
                seen: Mutex::new(Vec::new()),
                runs: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InstanceTask for CountingTask {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, _cancel: &CancelToken, instance: &Instance) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(instance.name.clone());
            if self.fail_for == Some(instance.name.as_str()) {
                return Err(AppError::UnexpectedStatus {
                    address: instance.ip.clone(),
                    status: 500,
                });
            }
            Ok(())
        }
    }

    struct PanickingTask;

    #[async_trait]
    impl InstanceTask for PanickingTask {
        fn name(&self) -> &str {
            "Panicking"
        }

        async fn run(&self, _cancel: &CancelToken, _instance: &Instance) -> Result<()> {
            panic!("task blew up");
        }
    }

    fn instances() -> Arc<StaticInstances> {
        Arc::new(StaticInstances::new(vec![
            Instance::new("node1", "s1", "10.0.0.5"),
            Instance::new("node2", "s1", "10.0.0.6"),
            Instance::new("node3", "s2", "10.0.1.5"),
        ]))
    }

    #[tokio::test]
    async fn test_run_once_runs_every_task_for_running_instances() {
        let instances = instances();
        instances.stop("node3");

        let first = Arc::new(CountingTask::new("First", None));
        let second = Arc::new(CountingTask::new("Second", Some("node2")));

        let mut scheduler =
            TaskScheduler::new(instances.clone(), instances, Duration::from_secs(60));
        scheduler.register(first.clone());
        scheduler.register(second.clone());

        let report = scheduler.run_once(&CancelToken::never()).await.unwrap();

        assert_eq!(
            report,
            TickReport {
                succeeded: 3,
                failed: 1,
                skipped: 1
            }
        );
        let mut seen = first.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["node1", "node2"]);
        assert_eq!(second.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_task_is_isolated() {
        let instances = instances();
        let counting = Arc::new(CountingTask::new("Counting", None));

        let mut scheduler =
            TaskScheduler::new(instances.clone(), instances, Duration::from_secs(60));
        scheduler.register(Arc::new(PanickingTask));
        scheduler.register(counting.clone());

        let report = scheduler.run_once(&CancelToken::never()).await.unwrap();

        assert_eq!(report.failed, 3);
        assert_eq!(report.succeeded, 3);
        assert_eq!(counting.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_cancel() {
        let instances = instances();
        let counting = Arc::new(CountingTask::new("Counting", None));

        let mut scheduler =
            TaskScheduler::new(instances.clone(), instances, Duration::from_millis(10));
        scheduler.register(counting.clone());
        let scheduler = Arc::new(scheduler);

        let (source, token) = cancel_channel();
        let handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run(token).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        source.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler should stop after cancel")
            .unwrap();
        assert!(counting.runs.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_run_for_single_instance() {
        let instances = instances();
        let mut scheduler =
            TaskScheduler::new(instances.clone(), instances, Duration::from_secs(60));
        scheduler.register(Arc::new(CountingTask::new("A", Some("node1"))));
        scheduler.register(Arc::new(CountingTask::new("B", None)));

        let results = scheduler
            .run_for(&CancelToken::never(), &Instance::new("node1", "s1", "10.0.0.5"))
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "A");
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
    }
}
