use thiserror::Error;

use super::models::{Message, Thread, ThreadId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("thread not found: {0}")]
    ThreadNotFound(ThreadId),
}

/// In-memory collection of threads, newest first, plus the current selection
#[derive(Debug, Default)]
pub struct ChatStore {
    threads: Vec<Thread>,
    selected: Option<ThreadId>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn thread(&self, id: &str) -> Option<&Thread> {
        self.threads.iter().find(|thread| thread.id() == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The currently selected thread, if any
    pub fn selected(&self) -> Option<&Thread> {
        self.selected_id().and_then(|id| self.thread(id))
    }

    /// Insert a new empty thread at the front and select it
    pub fn create_thread(&mut self) -> ThreadId {
        let thread = Thread::new();
        let id = thread.id().to_string();
        self.threads.insert(0, thread);
        self.selected = Some(id.clone());
        id
    }

    pub fn select_thread(&mut self, id: &str) -> Result<(), StoreError> {
        if self.thread(id).is_none() {
            return Err(StoreError::ThreadNotFound(id.to_string()));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Remove a thread, clearing the selection if it pointed at it
    pub fn delete_thread(&mut self, id: &str) -> Result<Thread, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::ThreadNotFound(id.to_string()))?;
        let removed = self.threads.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(removed)
    }

    pub fn append_message(&mut self, thread_id: &str, message: Message) -> Result<(), StoreError> {
        let thread = self
            .threads
            .iter_mut()
            .find(|thread| thread.id() == thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
        thread.push(message);
        Ok(())
    }

    /// Move the selection one thread down the list, wrapping around
    pub fn select_next(&mut self) {
        self.step_selection(1);
    }

    /// Move the selection one thread up the list, wrapping around
    pub fn select_previous(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, delta: isize) {
        if self.threads.is_empty() {
            return;
        }
        let len = self.threads.len() as isize;
        let next = match self.selected_id().and_then(|id| self.position(id)) {
            Some(index) => (index as isize + delta).rem_euclid(len),
            None if delta >= 0 => 0,
            None => len - 1,
        };
        self.selected = Some(self.threads[next as usize].id().to_string());
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.threads.iter().position(|thread| thread.id() == id)
    }
}
