use crate::compositor::Compositor;
use crate::foundation::error::{TileStoreError, TileStoreResult};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{JoinHandle, ThreadId};

type Task = Box<dyn FnOnce(&mut dyn Compositor) + Send>;

enum Msg {
    Run(Task),
    Shutdown,
}

#[derive(Clone)]
enum Target {
    Thread {
        tx: mpsc::Sender<Msg>,
        thread: ThreadId,
    },
    Inline(Arc<Mutex<Box<dyn Compositor>>>),
}

/// Posts typed tasks to the display context that owns the compositor.
///
/// `post` is fire-and-forget; `post_sync` blocks until the task ran and returns its result.
/// Cloning shares the same context.
#[derive(Clone)]
pub struct DisplayHandle {
    target: Target,
}

impl DisplayHandle {
    /// Handle that runs every task immediately on the calling thread.
    pub fn inline(compositor: Box<dyn Compositor>) -> Self {
        Self {
            target: Target::Inline(Arc::new(Mutex::new(compositor))),
        }
    }

    /// Queue `f` on the display context without waiting.
    pub fn post(
        &self,
        f: impl FnOnce(&mut dyn Compositor) + Send + 'static,
    ) -> TileStoreResult<()> {
        match &self.target {
            Target::Thread { tx, .. } => tx
                .send(Msg::Run(Box::new(f)))
                .map_err(|_| TileStoreError::dispatch("display context has stopped")),
            Target::Inline(c) => {
                let mut guard = c.lock().unwrap_or_else(|e| e.into_inner());
                f(&mut **guard);
                Ok(())
            }
        }
    }

    /// Run `f` on the display context and wait for its result.
    ///
    /// Fails when called from the display thread itself, since that would wait on its own queue.
    pub fn post_sync<R: Send + 'static>(
        &self,
        f: impl FnOnce(&mut dyn Compositor) -> R + Send + 'static,
    ) -> TileStoreResult<R> {
        match &self.target {
            Target::Thread { tx, thread } => {
                if std::thread::current().id() == *thread {
                    return Err(TileStoreError::dispatch(
                        "synchronous dispatch from the display thread",
                    ));
                }
                let (done_tx, done_rx) = mpsc::sync_channel::<R>(1);
                tx.send(Msg::Run(Box::new(move |c| {
                    let _ = done_tx.send(f(c));
                })))
                .map_err(|_| TileStoreError::dispatch("display context has stopped"))?;
                done_rx.recv().map_err(|_| {
                    TileStoreError::dispatch("display context dropped a synchronous task")
                })
            }
            Target::Inline(c) => {
                let mut guard = c.lock().unwrap_or_else(|e| e.into_inner());
                Ok(f(&mut **guard))
            }
        }
    }
}

impl std::fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.target {
            Target::Thread { .. } => "thread",
            Target::Inline(_) => "inline",
        };
        f.debug_struct("DisplayHandle").field("kind", &kind).finish()
    }
}

/// A dedicated display thread draining a task queue against one compositor.
///
/// Dropping the context runs every task already queued, then joins the thread.
pub struct DisplayContext {
    handle: DisplayHandle,
    tx: mpsc::Sender<Msg>,
    join: Option<JoinHandle<()>>,
}

impl DisplayContext {
    /// Start the display thread.
    pub fn spawn(compositor: Box<dyn Compositor>) -> TileStoreResult<Self> {
        let (tx, rx) = mpsc::channel::<Msg>();
        let join = std::thread::Builder::new()
            .name("tilestore-display".to_string())
            .spawn(move || {
                let mut compositor = compositor;
                while let Ok(msg) = rx.recv() {
                    match msg {
                        Msg::Run(task) => task(&mut *compositor),
                        Msg::Shutdown => break,
                    }
                }
                compositor.destroy_resources();
                tracing::debug!("display context stopped");
            })
            .map_err(|e| TileStoreError::dispatch(format!("spawn display thread: {e}")))?;

        let handle = DisplayHandle {
            target: Target::Thread {
                tx: tx.clone(),
                thread: join.thread().id(),
            },
        };
        Ok(Self {
            handle,
            tx,
            join: Some(join),
        })
    }

    /// Handle for posting tasks.
    pub fn handle(&self) -> DisplayHandle {
        self.handle.clone()
    }
}

impl Drop for DisplayContext {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(j) = self.join.take()
            && j.join().is_err()
        {
            tracing::warn!("display thread panicked");
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/dispatch.rs"]
mod tests;
