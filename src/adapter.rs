use super::{
    errors::JobError,
    job::Job,
};
use std::{fmt, sync::Arc};


/// Адаптер [`Job`] к задаче пула.
///
/// Один вызов задачи - ровно один вызов `Job::execute`, ошибка пробрасывается как есть.
#[derive(Clone)]
pub struct JobTask {
    job: Arc<dyn Job>,
}

impl JobTask {
    pub fn new<J>(job: J) -> Self
    where
        J: Job + 'static,
    {
        Self { job: Arc::new(job) }
    }

    pub fn from_shared(job: Arc<dyn Job>) -> Self {
        Self { job }
    }

    #[inline(always)]
    pub fn run(&self) -> Result<(), JobError> {
        self.job.execute()
    }

    /// Замыкание для [`ThreadPoolInner::submit`](crate::pool::ThreadPoolInner::submit)
    #[inline]
    pub fn into_fn(self) -> impl FnOnce() -> Result<(), JobError> + Send + 'static {
        move || self.run()
    }
}

impl fmt::Debug for JobTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobTask").finish_non_exhaustive()
    }
}
