//! Main-thread dispatcher.
//!
//! Network tasks run on the tokio runtime; the turn flow runs on the consumer
//! thread. The dispatcher is the only structure both sides touch: any thread
//! may enqueue a deferred task, and the consumer drains the queue once per
//! tick, running tasks in enqueue order.

use tokio::sync::mpsc;

use crate::core::SessionEvents;

type Task<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// Consumer end of the queue. Not `Clone`: there is exactly one consumer.
pub struct Dispatcher<C: ?Sized> {
    tx: mpsc::UnboundedSender<Task<C>>,
    rx: mpsc::UnboundedReceiver<Task<C>>,
}

/// Thread-safe producer end of the queue.
pub struct DispatchHandle<C: ?Sized> {
    tx: mpsc::UnboundedSender<Task<C>>,
}

/// Dispatcher carrying network events to a session.
pub type SessionDispatcher = Dispatcher<dyn SessionEvents>;

/// Producer handle used by the network tasks.
pub type SessionHandle = DispatchHandle<dyn SessionEvents>;

impl<C: ?Sized> Clone for DispatchHandle<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for DispatchHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle").finish_non_exhaustive()
    }
}

impl<C: ?Sized> DispatchHandle<C> {
    /// Queue `task` for the next drain. Returns `false` if the dispatcher is gone.
    pub fn enqueue<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

impl<C: ?Sized> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Dispatcher<C> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn handle(&self) -> DispatchHandle<C> {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run every task queued before this call, in order, on the calling thread.
    ///
    /// Tasks enqueued while draining (by a task, or by another thread) wait for
    /// the next drain, so one call is one bounded flush. Returns how many ran.
    pub fn drain(&mut self, ctx: &mut C) -> usize {
        let ready = self.rx.len();
        let mut ran = 0;
        while ran < ready {
            let Ok(task) = self.rx.try_recv() else {
                break;
            };
            task(&mut *ctx);
            ran += 1;
        }
        ran
    }

    /// Tasks currently queued.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_runs_in_fifo_order() {
        let mut dispatcher: Dispatcher<Vec<u32>> = Dispatcher::new();
        let handle = dispatcher.handle();
        for i in 0..5 {
            assert!(handle.enqueue(move |log: &mut Vec<u32>| log.push(i)));
        }

        let mut log = Vec::new();
        assert_eq!(dispatcher.drain(&mut log), 5);
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert_eq!(dispatcher.drain(&mut log), 0);
    }

    #[test]
    fn test_tasks_enqueued_during_drain_wait_for_next_tick() {
        let mut dispatcher: Dispatcher<Vec<&'static str>> = Dispatcher::new();
        let handle = dispatcher.handle();
        let inner = handle.clone();
        handle.enqueue(move |log: &mut Vec<&'static str>| {
            log.push("first");
            inner.enqueue(|log: &mut Vec<&'static str>| log.push("later"));
        });

        let mut log = Vec::new();
        assert_eq!(dispatcher.drain(&mut log), 1);
        assert_eq!(log, vec!["first"]);
        assert_eq!(dispatcher.pending(), 1);
        assert_eq!(dispatcher.drain(&mut log), 1);
        assert_eq!(log, vec!["first", "later"]);
    }

    #[test]
    fn test_enqueue_from_other_threads_preserves_per_thread_order() {
        let mut dispatcher: Dispatcher<Vec<(u32, u32)>> = Dispatcher::new();
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let handle = dispatcher.handle();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        handle.enqueue(move |log: &mut Vec<(u32, u32)>| log.push((t, i)));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let mut log = Vec::new();
        assert_eq!(dispatcher.drain(&mut log), 400);
        for t in 0..4 {
            let seq: Vec<u32> = log.iter().filter(|(th, _)| *th == t).map(|(_, i)| *i).collect();
            assert_eq!(seq, (0..100).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_enqueue_fails_once_dispatcher_dropped() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        let handle = dispatcher.handle();
        drop(dispatcher);
        assert!(!handle.enqueue(|_: &mut ()| {}));
    }
}
