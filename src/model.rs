#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub live_workers: usize,
    pub idle_workers: usize,
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub total_spawned: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub cancelled_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.live_workers == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.live_workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }

    /// Задачи, которые уже не будут выполнены или уже выполнены
    pub fn finished(&self) -> usize {
        self.completed_tasks + self.failed_tasks + self.cancelled_tasks
    }
}


/// Итог одного запуска [`ParallelJob`](crate::executor::ParallelJob)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Все задачи завершились успешно
    Completed,
    /// Ожидающий поток прерван; завершение всех задач не подтверждено
    Interrupted,
}

impl Outcome {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}
