#[cfg(test)]
mod tests {
    use kazi::{
        errors::{ExecutorError, JobError, SpawnError},
        executor::ParallelJob,
        handle::Interrupt,
        job::{job_fn, Job},
        log::{LogLevel, Logger},
        model::Outcome,
        pool::{ThreadPool, ThreadPoolInner},
    };
    use std::{
        fmt::Arguments,
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc, Mutex,
        },
        thread,
        time::Duration,
    };

    #[derive(Default)]
    struct CountingJob {
        calls: AtomicUsize,
    }

    impl CountingJob {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Job for CountingJob {
        fn execute(&self) -> Result<(), JobError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingJob;

    impl Job for FailingJob {
        fn execute(&self) -> Result<(), JobError> {
            Err("Failing Job exception".into())
        }
    }

    #[derive(Default)]
    struct StateJob {
        executed: AtomicBool,
    }

    impl Job for StateJob {
        fn execute(&self) -> Result<(), JobError> {
            self.executed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct SleepingJob {
        delay: Duration,
        done: AtomicBool,
    }

    impl SleepingJob {
        fn new(delay: Duration) -> Self {
            Self { delay, done: AtomicBool::new(false) }
        }
    }

    impl Job for SleepingJob {
        fn execute(&self) -> Result<(), JobError> {
            thread::sleep(self.delay);
            self.done.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        entries: Mutex<Vec<(LogLevel, String)>>,
    }

    impl RecordingLogger {
        fn at(&self, level: LogLevel) -> Vec<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Logger for RecordingLogger {
        fn log(&self, level: LogLevel, args: Arguments<'_>) {
            self.entries.lock().unwrap().push((level, args.to_string()));
        }
    }

    #[test]
    fn test_missing_job_list() {
        let err = ParallelJob::builder().build().err().unwrap();
        assert!(matches!(err, ExecutorError::MissingDependency(_)));
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_empty_job_list() {
        let jobs: Vec<CountingJob> = Vec::new();
        let err = ParallelJob::new(jobs).err().unwrap();
        assert!(matches!(err, ExecutorError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_pool() {
        let job = Arc::new(CountingJob::default());
        let err = ParallelJob::with_pool(vec![job.clone()], None::<ThreadPool>).err().unwrap();
        assert!(matches!(err, ExecutorError::MissingDependency("executor pool")));
        assert_eq!(job.calls(), 0);
    }

    #[test]
    fn test_empty_list_is_checked_before_pool() {
        let jobs: Vec<CountingJob> = Vec::new();
        let err = ParallelJob::with_pool(jobs, None::<ThreadPool>).err().unwrap();
        assert!(matches!(err, ExecutorError::InvalidArgument(_)));
    }

    #[test]
    fn test_non_positive_pool_size() {
        let job = Arc::new(CountingJob::default());
        for size in [-1, 0, isize::MIN] {
            let err = ParallelJob::with_pool_size(vec![job.clone()], size).err().unwrap();
            assert!(matches!(err, ExecutorError::InvalidArgument(_)), "size {size}");
        }
        assert_eq!(job.calls(), 0);
    }

    #[test]
    fn test_pool_and_pool_size_are_exclusive() {
        let pool = ThreadPoolInner::new(2);
        let err = ParallelJob::builder()
            .jobs(vec![CountingJob::default()])
            .pool(pool)
            .pool_size(2)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ExecutorError::InvalidArgument(_)));
    }

    #[test]
    fn test_single_job() {
        let job = Arc::new(CountingJob::default());
        let parallel = ParallelJob::new(vec![job.clone()]).unwrap();
        assert!(parallel.ownership().is_owned());

        parallel.execute().unwrap();
        assert_eq!(job.calls(), 1);
    }

    #[test]
    fn test_max_pool_size() {
        let job = Arc::new(CountingJob::default());
        let parallel = ParallelJob::with_pool_size(vec![job.clone()], isize::MAX).unwrap();

        parallel.execute().unwrap();
        assert_eq!(job.calls(), 1);

        let metrics = parallel.ownership().pool().metrics();
        assert!(metrics.total_spawned == 1);
    }

    #[test]
    fn test_same_job_many_times() {
        let job = Arc::new(CountingJob::default());
        let parallel = ParallelJob::new(vec![job.clone(); 4]).unwrap();

        parallel.execute().unwrap();
        assert_eq!(job.calls(), 4);
    }

    #[test]
    fn test_default_pool_runs_in_submission_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let jobs: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let order = order.clone();
                job_fn(move || {
                    order.lock().unwrap().push(name);
                    Ok(())
                })
            })
            .collect();

        ParallelJob::new(jobs).unwrap().execute().unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_all_jobs_executed_on_single_thread() {
        let jobs: Vec<_> = (0..100).map(|_| Arc::new(StateJob::default())).collect();
        let parallel = ParallelJob::with_pool_size(jobs.clone(), 1).unwrap();

        parallel.execute().unwrap();
        for job in &jobs {
            assert!(job.executed.load(Ordering::SeqCst));
        }
    }

    #[test]
    fn test_failing_job() {
        let parallel = ParallelJob::new(vec![FailingJob]).unwrap();
        let err = parallel.execute().unwrap_err();

        assert!(err.is_job_failure());
        assert!(!err.is_construction_error());
        let message = err.to_string();
        assert!(message.contains("Failing Job exception"), "{message}");
        assert!(message.contains("All unfinished jobs will be cancelled"), "{message}");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Failing Job exception");
    }

    #[test]
    fn test_panicking_job_is_a_job_failure() {
        let parallel = ParallelJob::new(vec![job_fn(|| panic!("boom"))]).unwrap();
        let err = parallel.execute().unwrap_err();
        assert!(err.is_job_failure());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_failure_cancels_queued_jobs() {
        let pool = ThreadPoolInner::new(1);
        let later = Arc::new(SleepingJob::new(Duration::from_millis(10)));

        let mut jobs: Vec<Arc<dyn Job>> = vec![Arc::new(FailingJob)];
        jobs.extend((0..50).map(|_| later.clone() as Arc<dyn Job>));
        let counting: Vec<Arc<CountingJob>> = (0..50).map(|_| Arc::new(CountingJob::default())).collect();
        jobs.extend(counting.iter().map(|j| j.clone() as Arc<dyn Job>));

        let parallel = ParallelJob::with_pool(jobs, pool.clone()).unwrap();
        assert!(parallel.execute().unwrap_err().is_job_failure());

        pool.await_termination();
        let ran: usize = counting.iter().map(|j| j.calls()).sum();
        assert_eq!(ran, 0, "queued jobs must not run after a failure");
        assert!(pool.metrics().cancelled_tasks > 0);
    }

    #[test]
    fn test_handles_are_checked_in_submission_order() {
        let slow = Arc::new(SleepingJob::new(Duration::from_millis(100)));
        let jobs: Vec<Arc<dyn Job>> = vec![slow.clone(), Arc::new(FailingJob)];
        let parallel = ParallelJob::with_pool_size(jobs, 2).unwrap();

        let err = parallel.execute().unwrap_err();
        assert!(err.is_job_failure());
        assert!(slow.done.load(Ordering::SeqCst), "earlier job is awaited before the later failure is seen");
    }

    #[test]
    fn test_borrowed_pool_survives_success() {
        let pool = ThreadPoolInner::new(4);
        let job = Arc::new(CountingJob::default());
        let parallel = ParallelJob::with_pool(vec![job.clone(); 8], pool.clone()).unwrap();
        assert!(!parallel.ownership().is_owned());

        parallel.execute().unwrap();
        assert!(!pool.is_shutdown());

        parallel.execute().unwrap();
        assert_eq!(job.calls(), 16);

        pool.shutdown();
        pool.await_termination();
        assert!(pool.is_terminated());
    }

    #[test]
    fn test_borrowed_pool_is_shut_down_on_failure() {
        let pool = ThreadPoolInner::new(2);
        let parallel = ParallelJob::with_pool(vec![FailingJob], pool.clone()).unwrap();

        assert!(parallel.execute().is_err());
        assert!(pool.is_shutdown());
        assert_eq!(pool.submit(|| ()).err(), Some(SpawnError::Rejected));
    }

    #[test]
    fn test_owned_pool_is_not_reusable() {
        let job = Arc::new(CountingJob::default());
        let parallel = ParallelJob::with_pool_size(vec![job.clone()], 2).unwrap();

        parallel.execute().unwrap();
        assert!(parallel.ownership().pool().is_shutdown());

        let err = parallel.execute().unwrap_err();
        assert!(matches!(err, ExecutorError::Submit(SpawnError::Rejected)));
        assert_eq!(job.calls(), 1);
    }

    #[test]
    fn test_interrupt_is_swallowed() {
        let (release_tx, release_rx) = crossbeam::channel::bounded::<()>(0);
        let (started_tx, started_rx) = crossbeam::channel::bounded::<()>(1);
        let blocking = job_fn(move || {
            let _ = started_tx.send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });

        let logger = Arc::new(RecordingLogger::default());
        let parallel = Arc::new(
            ParallelJob::builder()
                .jobs(vec![blocking])
                .logger(logger.clone())
                .build()
                .unwrap(),
        );
        let interrupt = parallel.interrupt_handle();

        let runner = {
            let parallel = parallel.clone();
            thread::spawn(move || parallel.execute())
        };

        started_rx.recv().unwrap();
        interrupt.interrupt();

        assert!(runner.join().unwrap().is_ok());
        assert!(!logger.at(LogLevel::Warn).is_empty());
        assert!(parallel.ownership().pool().is_shutdown());

        let _ = release_tx.send(());
    }

    #[test]
    fn test_interrupt_leaves_borrowed_pool_running() {
        let pool = ThreadPoolInner::new(2);
        let (release_tx, release_rx) = crossbeam::channel::bounded::<()>(0);
        let (started_tx, started_rx) = crossbeam::channel::bounded::<()>(1);
        let blocking = job_fn(move || {
            let _ = started_tx.send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });

        let parallel = Arc::new(ParallelJob::with_pool(vec![blocking], pool.clone()).unwrap());
        assert!(!parallel.ownership().is_owned());
        let interrupt = parallel.interrupt_handle();

        let runner = {
            let parallel = parallel.clone();
            thread::spawn(move || parallel.execute_with_outcome())
        };

        started_rx.recv().unwrap();
        interrupt.interrupt();

        assert_eq!(runner.join().unwrap().unwrap(), Outcome::Interrupted);
        assert!(!pool.is_shutdown());
        assert_eq!(pool.submit(|| 5).unwrap().join(), Ok(5));

        let _ = release_tx.send(());
        pool.shutdown();
        pool.await_termination();
    }

    #[test]
    fn test_interrupt_is_visible_in_outcome() {
        let interrupt = Interrupt::new();
        interrupt.interrupt();

        let job = Arc::new(CountingJob::default());
        let parallel = ParallelJob::builder()
            .jobs(vec![job.clone()])
            .interrupt(interrupt)
            .build()
            .unwrap();

        assert_eq!(parallel.execute_with_outcome().unwrap(), Outcome::Interrupted);

        // задачи уже в пуле и дорабатывают после graceful shutdown
        let pool = parallel.ownership().pool().clone();
        pool.await_termination();
        assert_eq!(job.calls(), 1);
    }

    #[test]
    fn test_completed_outcome() {
        let parallel = ParallelJob::with_pool_size(vec![CountingJob::default()], 3).unwrap();
        assert_eq!(parallel.execute_with_outcome().unwrap(), Outcome::Completed);
    }

    #[test]
    fn test_failure_is_logged_as_error() {
        let logger = Arc::new(RecordingLogger::default());
        let parallel = ParallelJob::builder()
            .jobs(vec![FailingJob])
            .logger(logger.clone())
            .build()
            .unwrap();

        assert!(parallel.execute().is_err());
        let errors = logger.at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Failing Job exception"));
    }

    #[test]
    fn test_nested_parallel_jobs() {
        let job = Arc::new(CountingJob::default());
        let inner: Vec<_> = (0..3)
            .map(|_| ParallelJob::with_pool_size(vec![job.clone(); 5], 2).unwrap())
            .collect();

        let outer = ParallelJob::with_pool_size(inner, 3).unwrap();
        outer.execute().unwrap();
        assert_eq!(job.calls(), 15);
    }

    #[test]
    fn test_nested_failure_propagates() {
        let inner = ParallelJob::new(vec![FailingJob]).unwrap();
        let outer = ParallelJob::new(vec![inner]).unwrap();

        let err = outer.execute().unwrap_err();
        assert!(err.is_job_failure());
        assert!(err.to_string().contains("Failing Job exception"));
    }
}
