//! Submission queue - FIFO of tasks waiting for a free slot

use crate::task::Task;
use std::collections::VecDeque;

/// Tasks waiting to be dispatched, in submission order
#[derive(Debug, Default)]
pub struct SubmissionQueue {
    tasks: VecDeque<Task>,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task at the tail
    pub fn submit(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Take the oldest task
    pub fn pop_front(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Argument vectors of queued tasks, oldest first
    pub fn list(&self) -> impl Iterator<Item = &[String]> + '_ {
        self.tasks.iter().map(Task::argv)
    }

    /// Queued tasks, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(arg: &str) -> Task {
        Task::new(["echo", arg]).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = SubmissionQueue::new();
        queue.submit(task("a"));
        queue.submit(task("b"));
        queue.submit(task("c"));

        let popped: Vec<String> = std::iter::from_fn(|| queue.pop_front())
            .map(|t| t.argv()[1].clone())
            .collect();
        assert_eq!(popped, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_list_is_non_destructive() {
        let mut queue = SubmissionQueue::new();
        queue.submit(task("first"));
        queue.submit(task("second"));

        let listed: Vec<&[String]> = queue.list().collect();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], &["echo", "first"]);
        assert_eq!(listed[1], &["echo", "second"]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_pop_empty() {
        let mut queue = SubmissionQueue::new();
        assert!(queue.pop_front().is_none());
        assert_eq!(queue.list().count(), 0);
    }
}
