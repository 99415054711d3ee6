//! Thread-backed task queue
//!
//! A [`TaskQueue`] owns one named thread that runs posted closures in
//! order. Handles are cheap to clone; when the last one is dropped the
//! thread finishes whatever is still queued and is joined.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    name: String,
    sender: Option<Sender<Task>>,
    thread_id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Serial execution context backed by a dedicated thread
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl TaskQueue {
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (sender, receiver) = unbounded::<Task>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(receiver))?;
        debug!(queue = name, "Task queue started");

        Ok(TaskQueue {
            inner: Arc::new(Inner {
                name: name.to_string(),
                sender: Some(sender),
                thread_id: handle.thread().id(),
                handle: Mutex::new(Some(handle)),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Queue `task` to run after everything posted before it
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = match &self.inner.sender {
            Some(sender) => sender.send(Box::new(task)).is_ok(),
            None => false,
        };
        if !sent {
            warn!(queue = %self.inner.name, "Task queue stopped, task dropped");
        }
    }

    /// True when called from this queue's thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.inner.thread_id
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("name", &self.inner.name)
            .finish()
    }
}

fn run(receiver: Receiver<Task>) {
    while let Ok(task) = receiver.recv() {
        task();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Disconnecting the channel lets the thread drain and exit
        self.sender.take();
        let handle = self.handle.get_mut().take();
        if let Some(handle) = handle {
            if thread::current().id() == self.thread_id {
                // Last handle dropped by one of our own tasks
                return;
            }
            if handle.join().is_err() {
                warn!(queue = %self.name, "Task queue thread panicked");
            }
        }
        debug!(queue = %self.name, "Task queue stopped");
    }
}
