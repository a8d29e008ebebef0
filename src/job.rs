use super::errors::JobError;
use std::{fmt, sync::Arc};


/// Независимая единица работы.
///
/// Ошибка сигнализируется через `Err`; результат не возвращается.
/// Разные экземпляры могут выполняться одновременно на разных потоках пула,
/// общее состояние между задачами синхронизирует сам автор задачи.
pub trait Job: Send + Sync {
    fn execute(&self) -> Result<(), JobError>;
}

impl<J: Job + ?Sized> Job for Arc<J> {
    #[inline]
    fn execute(&self) -> Result<(), JobError> {
        (**self).execute()
    }
}

impl<J: Job + ?Sized> Job for Box<J> {
    #[inline]
    fn execute(&self) -> Result<(), JobError> {
        (**self).execute()
    }
}


/// Задача из замыкания
#[derive(Clone)]
pub struct FnJob<F> {
    f: F,
}

impl<F> FnJob<F>
where
    F: Fn() -> Result<(), JobError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Job for FnJob<F>
where
    F: Fn() -> Result<(), JobError> + Send + Sync,
{
    #[inline]
    fn execute(&self) -> Result<(), JobError> {
        (self.f)()
    }
}

impl<F> fmt::Debug for FnJob<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnJob").finish_non_exhaustive()
    }
}

#[inline]
pub fn job_fn<F>(f: F) -> FnJob<F>
where
    F: Fn() -> Result<(), JobError> + Send + Sync,
{
    FnJob::new(f)
}
