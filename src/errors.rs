use thiserror::Error;

/// Ошибка, которую возвращает [`Job::execute`](crate::job::Job::execute)
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type SpawnResult<T> = Result<T, SpawnError>;

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Error)]
pub enum SpawnError {
    #[error("task panicked: {0}")]
    Panic(String),
    #[error("task result channel closed")]
    ChannelClosed,
    #[error("task cancelled before it started")]
    Cancelled,
    #[error("pool is shut down and rejects new tasks")]
    Rejected,
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(String),
}

/// Ошибки построения и выполнения [`ParallelJob`](crate::executor::ParallelJob)
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Обязательная зависимость не передана (список задач или пул)
    #[error("{0} can not be absent")]
    MissingDependency(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Первая замеченная ошибка задачи; остальные задачи отменены
    #[error("Job execution failed: {message}. All unfinished jobs will be cancelled.")]
    JobFailed {
        message: String,
        #[source]
        source: JobError,
    },

    #[error("failed to submit job to pool: {0}")]
    Submit(#[from] SpawnError),
}

impl ExecutorError {
    pub(crate) fn job_failed(source: JobError) -> Self {
        Self::JobFailed {
            message: source.to_string(),
            source,
        }
    }

    #[inline]
    pub fn is_job_failure(&self) -> bool {
        matches!(self, Self::JobFailed { .. })
    }

    #[inline]
    pub fn is_construction_error(&self) -> bool {
        matches!(self, Self::MissingDependency(_) | Self::InvalidArgument(_))
    }
}
