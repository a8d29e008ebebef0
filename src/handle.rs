use super::errors::{SpawnError, SpawnResult};
use std::{
    future::Future,
    pin::{pin, Pin},
    task::{Context, Poll},
};
use futures::{
    executor::block_on,
    future::{self, Either},
};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskState {
    Completed,
    Failed,
    Cancelled,
}

/// Задача в очереди пула
pub(crate) struct Task {
    pub(crate) cancel_token: CancellationToken,
    pub(crate) run: Box<dyn FnOnce() -> TaskState + Send + 'static>,
}

impl Task {
    /// Отменяет задачу и уведомляет её handle, не запуская пользовательский код
    #[inline]
    pub(crate) fn abort(self) -> TaskState {
        self.cancel_token.cancel();
        (self.run)()
    }
}


/// Ожидание прервано извне
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Сигнал прерывания ожидающего потока.
///
/// Клоны разделяют одно состояние: `interrupt()` из любого потока будит
/// все ожидания через [`JoinHandle::join_interruptible`]. Прерывание не сбрасывается.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    token: CancellationToken,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn interrupt(&self) {
        self.token.cancel();
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn interrupted(&self) {
        self.token.cancelled().await
    }
}


/// Handle на задачу с поддержкой отмены и блокирующего ожидания
pub struct JoinHandle<T> {
    cancel_token: CancellationToken,
    receiver: oneshot::Receiver<SpawnResult<T>>,
}

impl<T> JoinHandle<T> {

    pub(crate) fn new
    (
        cancel_token: CancellationToken,
        receiver: oneshot::Receiver<SpawnResult<T>>,
    ) -> Self {
        Self {
            cancel_token,
            receiver
        }
    }

    /// Задача, ещё не взятая воркером, не будет запущена.
    /// Уже выполняющуюся задачу отмена не останавливает.
    #[inline]
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Блокирует текущий поток до завершения задачи
    pub fn join(self) -> SpawnResult<T> {
        block_on(self)
    }

    /// Как [`join`](Self::join), но возвращает `Err(Interrupted)`, если ожидающий
    /// поток прерван. Уже выставленное прерывание срабатывает сразу.
    pub fn join_interruptible(self, interrupt: &Interrupt) -> Result<SpawnResult<T>, Interrupted> {
        if interrupt.is_interrupted() {
            return Err(Interrupted);
        }

        let interrupted = pin!(interrupt.interrupted());
        match block_on(future::select(self, interrupted)) {
            Either::Left((result, _)) => Ok(result),
            Either::Right(_) => Err(Interrupted),
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = SpawnResult<T>;

    /// Воркер, уронивший отправитель без ответа, даёт `ChannelClosed`
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SpawnError::ChannelClosed)))
    }
}
