//! Bounded dispatch worker pool.
//!
//! Messages are dispatched on a fixed set of worker threads fed from a
//! bounded queue, so one slow external command cannot block unrelated
//! messages and a burst cannot spawn unbounded concurrent processes. When
//! the queue is full, `submit` blocks until a slot frees up.
//!
//! The action table is shared as an atomic snapshot: a reload installs a
//! whole new table, and each dispatch keeps the snapshot it loaded at the
//! start. No locks are taken on the table itself.

use crate::actions::ActionTable;
use crate::dispatch::{self, DispatchLimits};
use crate::error::{RelayError, Result};
use arc_swap::ArcSwap;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Atomically swappable action table.
///
/// Readers take a cheap snapshot per dispatch; an external reload
/// collaborator calls [`SharedTable::install`] with a fully built table and
/// never mutates one in place.
#[derive(Debug)]
pub struct SharedTable {
    inner: ArcSwap<ActionTable>,
}

impl SharedTable {
    pub fn new(table: ActionTable) -> Arc<Self> {
        Arc::new(Self {
            inner: ArcSwap::from_pointee(table),
        })
    }

    /// Replace the table for all future dispatches. In-flight dispatches
    /// keep the snapshot they already loaded.
    pub fn install(&self, table: ActionTable) {
        self.inner.store(Arc::new(table));
    }

    pub fn snapshot(&self) -> Arc<ActionTable> {
        self.inner.load_full()
    }
}

struct Job {
    raw: String,
    respond: Box<dyn FnOnce(String) + Send>,
}

/// Fixed-size worker pool over a bounded job queue.
pub struct DispatchPool {
    sender: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl DispatchPool {
    /// Start `workers` dispatch threads with room for `queue_depth` queued
    /// messages beyond the ones currently executing.
    pub fn new(
        workers: usize,
        queue_depth: usize,
        table: Arc<SharedTable>,
        limits: DispatchLimits,
    ) -> Result<Self> {
        let (sender, receiver) = sync_channel::<Job>(queue_depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let worker_count = workers.max(1);
        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let receiver = Arc::clone(&receiver);
            let table = Arc::clone(&table);
            let limits = limits.clone();
            let handle = thread::Builder::new()
                .name(format!("dispatch-{index}"))
                .spawn(move || worker_loop(&receiver, &table, &limits))
                .map_err(|e| {
                    RelayError::Dispatch(format!("failed to start dispatch worker: {e}"))
                })?;
            handles.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    /// Queue one message for dispatch. Blocks while the queue is full; the
    /// reply callback runs on a worker thread once the dispatch completes.
    pub fn submit(&self, raw: String, respond: impl FnOnce(String) + Send + 'static) -> Result<()> {
        let Some(sender) = &self.sender else {
            return Err(RelayError::Dispatch("dispatch pool is shut down".to_string()));
        };
        sender
            .send(Job {
                raw,
                respond: Box::new(respond),
            })
            .map_err(|_| RelayError::Dispatch("dispatch pool is shut down".to_string()))
    }
}

impl Drop for DispatchPool {
    fn drop(&mut self) {
        // Closing the channel lets workers drain queued jobs and exit.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(receiver: &Mutex<Receiver<Job>>, table: &SharedTable, limits: &DispatchLimits) {
    loop {
        let job = {
            let Ok(guard) = receiver.lock() else {
                return;
            };
            guard.recv()
        };
        let Ok(job) = job else {
            debug!("dispatch queue closed, worker exiting");
            return;
        };

        let snapshot = table.snapshot();
        let reply = dispatch::dispatch_reply(&snapshot, limits, &job.raw);
        (job.respond)(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionDefinition, ActionEntry, CommandTemplate};
    use std::sync::mpsc;
    use std::time::Duration;

    fn table_with_echo(name: &str, text: &str) -> ActionTable {
        let mut table = ActionTable::with_builtins();
        table.insert(ActionEntry::Command(ActionDefinition {
            name: name.to_string(),
            template: CommandTemplate::parse(&format!("echo {text}")).unwrap(),
            description: None,
            working_dir: None,
            timeout: None,
        }));
        table
    }

    #[test]
    fn pool_dispatches_and_replies() {
        let table = SharedTable::new(table_with_echo("greet", "hello"));
        let pool = DispatchPool::new(2, 8, Arc::clone(&table), DispatchLimits::default()).unwrap();

        let (tx, rx) = mpsc::channel();
        pool.submit("[greet]".to_string(), move |reply| {
            tx.send(reply).unwrap();
        })
        .unwrap();

        let reply = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(reply.contains("hello"));
    }

    #[test]
    fn pool_processes_queued_messages_in_order_per_worker() {
        let table = SharedTable::new(table_with_echo("greet", "hi"));
        // Single worker: everything queues behind it and all must complete.
        let pool = DispatchPool::new(1, 4, Arc::clone(&table), DispatchLimits::default()).unwrap();

        let (tx, rx) = mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            pool.submit(format!("[greet]\nindex = {i}"), move |reply| {
                tx.send((i, reply)).unwrap();
            })
            .unwrap();
        }
        drop(tx);

        let mut seen: Vec<i32> = rx.iter().map(|(i, _)| i).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn installed_table_is_visible_to_later_dispatches() {
        let table = SharedTable::new(table_with_echo("old", "old"));
        let pool = DispatchPool::new(1, 4, Arc::clone(&table), DispatchLimits::default()).unwrap();

        table.install(table_with_echo("fresh", "fresh"));

        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();
        pool.submit("[fresh]".to_string(), move |reply| {
            tx.send(reply).unwrap();
        })
        .unwrap();
        pool.submit("[old]".to_string(), move |reply| {
            tx2.send(reply).unwrap();
        })
        .unwrap();

        let first = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(first.contains("fresh"));
        // The replaced table no longer knows the old action.
        assert!(second.contains("Action 'old' not found."));
    }

    #[test]
    fn drop_drains_queued_jobs() {
        let table = SharedTable::new(table_with_echo("greet", "bye"));
        let (tx, rx) = mpsc::channel();
        {
            let pool = DispatchPool::new(1, 8, Arc::clone(&table), DispatchLimits::default()).unwrap();
            for _ in 0..3 {
                let tx = tx.clone();
                pool.submit("[greet]".to_string(), move |reply| {
                    tx.send(reply).unwrap();
                })
                .unwrap();
            }
            // Pool dropped here; all three replies must still arrive.
        }
        drop(tx);
        assert_eq!(rx.iter().count(), 3);
    }

    #[test]
    fn submit_after_shutdown_is_an_error() {
        let table = SharedTable::new(ActionTable::default());
        let mut pool = DispatchPool::new(1, 1, table, DispatchLimits::default()).unwrap();
        pool.sender.take();
        pool.workers.drain(..).for_each(|w| {
            let _ = w.join();
        });

        assert!(pool.submit("[x]".to_string(), |_| {}).is_err());
    }
}
