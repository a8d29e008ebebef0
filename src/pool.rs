use super::{
    errors::{SpawnError, SpawnResult},
    handle::{
        JoinHandle,
        Task,
        TaskState,
    },
    model::PoolMetrics,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    pin::pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
};
use crossbeam::deque::{Injector, Steal};
use futures::{executor::block_on, future};
use tokio::sync::{oneshot, Notify};
use tokio_util::sync::CancellationToken;


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    /// Верхняя граница числа воркеров; потоки создаются по мере надобности
    pub num_threads: usize,
    pub thread_name: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name: "kazi-worker".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn single_thread() -> Self {
        Self::fixed(1)
    }

    pub fn fixed(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }
}


pub type ThreadPool = Arc<ThreadPoolInner>;

#[inline(always)]
fn unlikely(b: bool) -> bool {
    #[cold]
    fn cold() {}
    if b { cold() }
    b
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in pool task".to_string()
    }
}

/// Пул OS-потоков фиксированного максимального размера.
///
/// Задачи попадают в общую очередь и забираются воркерами в порядке FIFO.
/// `shutdown` перестаёт принимать задачи и даёт очереди доработать,
/// `shutdown_now` дополнительно отменяет всё, что ещё не начато.
pub struct ThreadPoolInner {
    inject: Injector<Task>,
    notify: Notify,
    closing: CancellationToken,
    terminate: CancellationToken,
    live_workers: AtomicUsize,
    idle_workers: AtomicUsize,
    spawned_threads: AtomicUsize,
    active_tasks: AtomicUsize,
    queued_tasks: AtomicUsize,
    total_spawned: AtomicUsize,
    completed_tasks: AtomicUsize,
    failed_tasks: AtomicUsize,
    cancelled_tasks: AtomicUsize,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    config: Config,
}

impl ThreadPoolInner {
    pub fn new(num_threads: usize) -> ThreadPool {
        Self::with_config(Config::fixed(num_threads))
    }

    pub fn with_config(mut config: Config) -> ThreadPool {
        config.num_threads = config.num_threads.max(1);
        Arc::new(ThreadPoolInner {
            inject: Injector::new(),
            notify: Notify::new(),
            closing: CancellationToken::new(),
            terminate: CancellationToken::new(),
            live_workers: AtomicUsize::new(0),
            idle_workers: AtomicUsize::new(0),
            spawned_threads: AtomicUsize::new(0),
            active_tasks: AtomicUsize::new(0),
            queued_tasks: AtomicUsize::new(0),
            total_spawned: AtomicUsize::new(0),
            completed_tasks: AtomicUsize::new(0),
            failed_tasks: AtomicUsize::new(0),
            cancelled_tasks: AtomicUsize::new(0),
            workers: Mutex::new(Vec::new()),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ставит задачу в очередь и возвращает handle на её результат.
    ///
    /// Паника внутри `f` перехватывается и превращается в [`SpawnError::Panic`].
    pub fn submit<T, F>(self: &Arc<Self>, f: F) -> SpawnResult<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if unlikely(self.closing.is_cancelled()) {
            return Err(SpawnError::Rejected);
        }

        let (tx, rx) = oneshot::channel::<SpawnResult<T>>();
        let cancel_token = CancellationToken::new();
        let ct = cancel_token.clone();

        let run = Box::new(move || {
            if ct.is_cancelled() {
                let _ = tx.send(Err(SpawnError::Cancelled));
                return TaskState::Cancelled;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(f))
                .map_err(|payload| SpawnError::Panic(panic_message(payload.as_ref())));
            let state = if result.is_ok() {
                TaskState::Completed
            } else {
                TaskState::Failed
            };
            let _ = tx.send(result);
            state
        });

        self.total_spawned.fetch_add(1, Ordering::Relaxed);
        let queued = self.push_task(Task { cancel_token: cancel_token.clone(), run });

        // Разбуженный воркер остаётся в idle_workers, пока не заберёт задачу,
        // поэтому пул растёт, пока очередь длиннее числа простаивающих
        if queued > self.idle_workers.load(Ordering::Acquire) {
            if let Err(err) = self.try_spawn_worker() {
                self.cancel_queued();
                return Err(err);
            }
        }

        // shutdown мог проскочить между проверкой и push: воркеров, которые
        // разберут очередь, уже может не быть
        if unlikely(self.closing.is_cancelled())
            && (self.terminate.is_cancelled() || self.live_workers.load(Ordering::Acquire) == 0)
        {
            self.cancel_queued();
        }

        Ok(JoinHandle::new(cancel_token, rx))
    }

    /// Возвращает длину очереди с учётом новой задачи
    #[inline(always)]
    fn push_task(&self, task: Task) -> usize {
        let queued = self.queued_tasks.fetch_add(1, Ordering::AcqRel) + 1;
        self.inject.push(task);
        self.notify.notify_one();
        queued
    }

    fn try_spawn_worker(self: &Arc<Self>) -> SpawnResult<()> {
        let mut live = self.live_workers.load(Ordering::Acquire);
        loop {
            if live >= self.config.num_threads {
                return Ok(());
            }
            match self.live_workers.compare_exchange_weak(
                live,
                live + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(current) => live = current,
            }
        }

        let index = self.spawned_threads.fetch_add(1, Ordering::Relaxed);
        let mut builder = thread::Builder::new()
            .name(format!("{}-{}", self.config.thread_name, index));
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        let pool = Arc::clone(self);
        match builder.spawn(move || pool.worker_loop()) {
            Ok(handle) => {
                tracing::trace!(worker = index, "spawned pool worker");
                self.workers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(handle);
                Ok(())
            }
            Err(err) => {
                self.live_workers.fetch_sub(1, Ordering::AcqRel);
                // Пока есть хотя бы один воркер, очередь всё равно будет разобрана
                if live == 0 {
                    Err(SpawnError::ThreadSpawn(err.to_string()))
                } else {
                    tracing::debug!(error = %err, live, "could not grow pool, reusing existing workers");
                    Ok(())
                }
            }
        }
    }

    fn worker_loop(&self) {
        loop {
            if self.terminate.is_cancelled() {
                break;
            }

            match self.inject.steal() {
                Steal::Success(task) => {
                    self.queued_tasks.fetch_sub(1, Ordering::AcqRel);
                    self.run_task(task);
                }
                Steal::Retry => continue,
                Steal::Empty => {
                    if self.closing.is_cancelled() {
                        break;
                    }

                    // Регистрируемся в Notify до того, как submit увидит нас простаивающими:
                    // иначе два notify_one подряд схлопнутся в один permit
                    let mut notified = pin!(self.notify.notified());
                    if notified.as_mut().enable() {
                        continue;
                    }

                    self.idle_workers.fetch_add(1, Ordering::AcqRel);
                    let closing = pin!(self.closing.cancelled());
                    block_on(future::select(notified, closing));
                    self.idle_workers.fetch_sub(1, Ordering::AcqRel);
                }
            }
        }

        // Последний воркер отменяет то, что успели поставить уже после shutdown
        if self.live_workers.fetch_sub(1, Ordering::AcqRel) == 1 && !self.inject.is_empty() {
            self.cancel_queued();
        }
        tracing::trace!("pool worker exited");
    }

    #[inline]
    fn run_task(&self, task: Task) {
        self.active_tasks.fetch_add(1, Ordering::Relaxed);
        let state = (task.run)();
        self.active_tasks.fetch_sub(1, Ordering::Relaxed);
        self.record(state);
    }

    #[inline]
    fn record(&self, state: TaskState) {
        let counter = match state {
            TaskState::Completed => &self.completed_tasks,
            TaskState::Failed => &self.failed_tasks,
            TaskState::Cancelled => &self.cancelled_tasks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn cancel_queued(&self) -> usize {
        let mut cancelled = 0;
        loop {
            match self.inject.steal() {
                Steal::Success(task) => {
                    self.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                    self.record(task.abort());
                    cancelled += 1;
                }
                Steal::Retry => continue,
                Steal::Empty => break,
            }
        }
        cancelled
    }

    /// Перестаёт принимать задачи; уже поставленные в очередь доработают.
    /// Повторный вызов ничего не делает.
    pub fn shutdown(&self) {
        if !self.closing.is_cancelled() {
            tracing::debug!(queued = self.queued_tasks.load(Ordering::Relaxed), "pool shutdown requested");
        }
        self.closing.cancel();
    }

    /// Перестаёт принимать задачи и отменяет все ещё не начатые.
    /// Выполняющиеся задачи доработают. Возвращает число отменённых задач.
    pub fn shutdown_now(&self) -> usize {
        self.closing.cancel();
        self.terminate.cancel();
        let cancelled = self.cancel_queued();
        tracing::debug!(
            cancelled,
            active = self.active_tasks.load(Ordering::Relaxed),
            "pool forcefully shut down"
        );
        cancelled
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.closing.is_cancelled()
    }

    /// Пул остановлен и все воркеры вышли
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.is_shutdown() && self.live_workers.load(Ordering::Acquire) == 0
    }

    /// Дожидается выхода всех воркеров. Имеет смысл только после `shutdown`,
    /// и не должен вызываться из задачи этого пула.
    pub fn await_termination(&self) {
        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            let _ = worker.join();
        }
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            live_workers: self.live_workers.load(Ordering::Relaxed),
            idle_workers: self.idle_workers.load(Ordering::Relaxed),
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            total_spawned: self.total_spawned.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            cancelled_tasks: self.cancelled_tasks.load(Ordering::Relaxed),
        }
    }
}
