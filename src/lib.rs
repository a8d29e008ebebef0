//! Параллельное выполнение независимых задач на ограниченном пуле потоков
//!
//! # Features
//! - `Job` - единица работы с единственной операцией `execute`
//! - Пул OS-потоков с ленивым созданием воркеров
//! - Ожидание всех задач в порядке постановки, fail-fast при первой ошибке
//! - Прерывание ожидания извне без ошибки для вызывающего
//! - Собственный или переданный снаружи пул
//! - Внедряемый логгер поверх `tracing`

pub mod adapter;
pub mod errors;
pub mod executor;
pub mod handle;
pub mod job;
pub mod log;
pub mod model;
pub mod pool;

pub use adapter::JobTask;
pub use errors::{ExecutorError, JobError, SpawnError, SpawnResult};
pub use executor::{ParallelJob, ParallelJobBuilder, PoolOwnership};
pub use handle::{Interrupt, Interrupted, JoinHandle};
pub use job::{job_fn, FnJob, Job};
pub use model::{Outcome, PoolMetrics};
pub use pool::{Config, ThreadPool, ThreadPoolInner};
