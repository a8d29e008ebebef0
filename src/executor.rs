use super::{
    adapter::JobTask,
    errors::{ExecutorError, JobError},
    handle::{Interrupt, Interrupted, JoinHandle},
    job::Job,
    log::{Logger, TracingLogger},
    model::Outcome,
    pool::{Config, ThreadPool, ThreadPoolInner},
};
use crate::{log_debug, log_error, log_warn};
use std::sync::Arc;


/// Кто отвечает за жизненный цикл пула
pub enum PoolOwnership {
    /// Пул создан исполнителем; закрывается после каждого запуска
    Owned(ThreadPool),
    /// Пул передан вызывающим; закрывается (принудительно) только при ошибке задачи
    Borrowed(ThreadPool),
}

impl PoolOwnership {
    #[inline]
    pub fn pool(&self) -> &ThreadPool {
        match self {
            PoolOwnership::Owned(pool) | PoolOwnership::Borrowed(pool) => pool,
        }
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, PoolOwnership::Owned(_))
    }

    /// Штатное освобождение в конце запуска
    fn release(&self) {
        match self {
            PoolOwnership::Owned(pool) => pool.shutdown(),
            PoolOwnership::Borrowed(_) => {}
        }
    }

    /// Fail-fast: отменяет незапущенные задачи независимо от владельца
    fn abort(&self) -> usize {
        match self {
            PoolOwnership::Owned(pool) | PoolOwnership::Borrowed(pool) => pool.shutdown_now(),
        }
    }
}

struct ReleaseGuard<'a>(&'a PoolOwnership);

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}


/// Параллельное выполнение набора [`Job`] на пуле потоков.
///
/// `execute` ставит все задачи в пул в исходном порядке и ждёт их handles
/// в том же порядке. Первая замеченная ошибка останавливает пул
/// (`shutdown_now`) и возвращается как [`ExecutorError::JobFailed`].
/// Прерывание ожидающего потока ([`Interrupt`]) ошибкой не считается:
/// `execute` возвращает `Ok(())`, а [`execute_with_outcome`](Self::execute_with_outcome)
/// - `Outcome::Interrupted`.
///
/// Переданный снаружи пул при ошибке задачи тоже останавливается принудительно.
pub struct ParallelJob {
    tasks: Vec<JobTask>,
    pool: PoolOwnership,
    interrupt: Interrupt,
    logger: Arc<dyn Logger>,
}

impl ParallelJob {
    /// Пул на один поток, задачи выполняются последовательно
    pub fn new<I>(jobs: I) -> Result<Self, ExecutorError>
    where
        I: IntoIterator,
        I::Item: Job + 'static,
    {
        Self::builder().jobs(jobs).build()
    }

    /// Использует чужой пул; `None` - ошибка
    pub fn with_pool<I, P>(jobs: I, pool: P) -> Result<Self, ExecutorError>
    where
        I: IntoIterator,
        I::Item: Job + 'static,
        P: Into<Option<ThreadPool>>,
    {
        let builder = Self::builder().jobs(jobs);
        let builder = match pool.into() {
            Some(pool) => builder.pool(pool),
            None => builder.missing_pool(),
        };
        builder.build()
    }

    /// Собственный пул из `pool_size` потоков
    pub fn with_pool_size<I>(jobs: I, pool_size: isize) -> Result<Self, ExecutorError>
    where
        I: IntoIterator,
        I::Item: Job + 'static,
    {
        Self::builder().jobs(jobs).pool_size(pool_size).build()
    }

    pub fn builder() -> ParallelJobBuilder {
        ParallelJobBuilder::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[inline]
    pub fn ownership(&self) -> &PoolOwnership {
        &self.pool
    }

    /// Сигнал, которым другой поток может прервать ожидание в `execute`
    #[inline]
    pub fn interrupt_handle(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Выполняет все задачи и ждёт их завершения.
    ///
    /// Прерывание поглощается: по результату нельзя отличить полное выполнение
    /// от прерванного ожидания. Для этого есть `execute_with_outcome`.
    pub fn execute(&self) -> Result<(), ExecutorError> {
        self.execute_with_outcome().map(|_| ())
    }

    pub fn execute_with_outcome(&self) -> Result<Outcome, ExecutorError> {
        log_debug!(self.logger, "Executing a parallel job with {} jobs", self.tasks.len());

        let _release = ReleaseGuard(&self.pool);
        let pool = self.pool.pool();

        let mut handles: Vec<JoinHandle<Result<(), JobError>>> = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            match pool.submit(task.clone().into_fn()) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    for handle in &handles {
                        handle.cancel();
                    }
                    log_error!(self.logger, "Could not submit job {} of {}: {}", handles.len() + 1, self.tasks.len(), err);
                    return Err(err.into());
                }
            }
        }

        for (index, handle) in handles.into_iter().enumerate() {
            let failure: JobError = match handle.join_interruptible(&self.interrupt) {
                Ok(Ok(Ok(()))) => continue,
                Ok(Ok(Err(job_err))) => job_err,
                Ok(Err(spawn_err)) => Box::new(spawn_err),
                Err(Interrupted) => {
                    log_warn!(
                        self.logger,
                        "Job interrupted while waiting on job {} of {}, unfinished jobs are not awaited",
                        index + 1,
                        self.tasks.len()
                    );
                    return Ok(Outcome::Interrupted);
                }
            };

            let cancelled = self.pool.abort();
            log_error!(
                self.logger,
                "Job {} of {} failed: {}; cancelled {} queued jobs",
                index + 1,
                self.tasks.len(),
                failure,
                cancelled
            );
            return Err(ExecutorError::job_failed(failure));
        }

        log_debug!(self.logger, "Parallel job done");
        Ok(Outcome::Completed)
    }
}

impl Job for ParallelJob {
    fn execute(&self) -> Result<(), JobError> {
        ParallelJob::execute(self).map_err(Into::into)
    }
}


/// Построитель [`ParallelJob`]; проверки выполняются в `build`
pub struct ParallelJobBuilder {
    tasks: Option<Vec<JobTask>>,
    pool: Option<Option<ThreadPool>>,
    pool_size: Option<isize>,
    config: Config,
    interrupt: Option<Interrupt>,
    logger: Arc<dyn Logger>,
}

impl Default for ParallelJobBuilder {
    fn default() -> Self {
        Self {
            tasks: None,
            pool: None,
            pool_size: None,
            config: Config::single_thread(),
            interrupt: None,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl ParallelJobBuilder {
    pub fn jobs<I>(mut self, jobs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Job + 'static,
    {
        self.tasks = Some(jobs.into_iter().map(JobTask::new).collect());
        self
    }

    /// Уже разделяемые задачи, без дополнительной обёртки
    pub fn shared_jobs<I>(mut self, jobs: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Job>>,
    {
        self.tasks = Some(jobs.into_iter().map(JobTask::from_shared).collect());
        self
    }

    pub fn pool(mut self, pool: ThreadPool) -> Self {
        self.pool = Some(Some(pool));
        self
    }

    fn missing_pool(mut self) -> Self {
        self.pool = Some(None);
        self
    }

    pub fn pool_size(mut self, pool_size: isize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    /// Настройки собственного пула; `pool_size` имеет приоритет над `num_threads`
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<ParallelJob, ExecutorError> {
        let tasks = self.tasks.ok_or(ExecutorError::MissingDependency("job list"))?;
        if tasks.is_empty() {
            return Err(ExecutorError::InvalidArgument(
                "a job list can not be empty".to_string(),
            ));
        }

        let pool = match (self.pool, self.pool_size) {
            (Some(_), Some(_)) => {
                return Err(ExecutorError::InvalidArgument(
                    "an executor pool and a pool size are mutually exclusive".to_string(),
                ));
            }
            (Some(None), None) => return Err(ExecutorError::MissingDependency("executor pool")),
            (Some(Some(pool)), None) => PoolOwnership::Borrowed(pool),
            (None, pool_size) => {
                let num_threads = match pool_size {
                    Some(size) => positive_pool_size(size)?,
                    None if self.config.num_threads > 0 => self.config.num_threads,
                    None => positive_pool_size(0)?,
                };
                log_debug!(self.logger, "Created an executor with pool size: {}", num_threads);
                PoolOwnership::Owned(ThreadPoolInner::with_config(Config {
                    num_threads,
                    ..self.config
                }))
            }
        };

        log_debug!(self.logger, "Created a parallel job with {} jobs", tasks.len());

        Ok(ParallelJob {
            tasks,
            pool,
            interrupt: self.interrupt.unwrap_or_default(),
            logger: self.logger,
        })
    }
}

fn positive_pool_size(size: isize) -> Result<usize, ExecutorError> {
    if size > 0 {
        Ok(size as usize)
    } else {
        Err(ExecutorError::InvalidArgument(format!(
            "a pool size has to be a positive integer, got {size}"
        )))
    }
}
