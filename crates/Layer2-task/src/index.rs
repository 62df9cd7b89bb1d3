//! Running index - every live process keyed by pid
//!
//! An unbalanced binary search tree ordered by pid. Pre-order traversal is
//! also the reporting order. The tree never holds more entries than there
//! are slots, so it is not rebalanced.
//!
//! Removal does not use classic BST deletion: the removed node's two
//! subtrees are re-attached by descending from the root with each subtree
//! root's pid, exactly like `insert`. Every key of a detached subtree lies
//! inside the key range of the removed node, so the descent lands on the
//! vacated position (or below the first re-attached subtree) and ordering
//! is preserved.

use crate::process::Pid;
use crate::task::Task;
use chrono::{DateTime, Utc};

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    entry: RunningEntry,
    left: Link,
    right: Link,
}

/// A running process and the task it was spawned from
#[derive(Debug)]
pub struct RunningEntry {
    pid: Pid,
    task: Task,
    started_at: DateTime<Utc>,
}

impl RunningEntry {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock time since spawn
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    pub fn into_task(self) -> Task {
        self.task
    }
}

/// BST of running processes
#[derive(Debug, Default)]
pub struct RunningIndex {
    root: Link,
    len: usize,
}

impl RunningIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly spawned process.
    ///
    /// Smaller pids go left, everything else right. Pids are unique while
    /// the process lives, so a duplicate only lands to the right of its twin.
    pub fn insert(&mut self, pid: Pid, task: Task) {
        let node = Box::new(Node {
            entry: RunningEntry {
                pid,
                task,
                started_at: Utc::now(),
            },
            left: None,
            right: None,
        });
        attach(&mut self.root, node);
        self.len += 1;
    }

    /// Pre-order walk over all entries
    pub fn iter(&self) -> Iter<'_> {
        let mut stack = Vec::with_capacity(self.len);
        if let Some(root) = self.root.as_deref() {
            stack.push(root);
        }
        Iter { stack }
    }

    /// `(pid, task)` pairs in pre-order, for reporting
    pub fn list(&self) -> impl Iterator<Item = (Pid, &Task)> + '_ {
        self.iter().map(|entry| (entry.pid, &entry.task))
    }

    /// Remove the first terminated entry.
    ///
    /// Walks the tree depth-first (node, left, right) and asks `is_terminated`
    /// about each pid. The first pid it confirms is detached, its subtrees
    /// are spliced back, and the entry is returned. Returns `None` when no
    /// visited process has terminated; the tree is left untouched.
    pub fn reap_one<F>(&mut self, mut is_terminated: F) -> Option<RunningEntry>
    where
        F: FnMut(Pid) -> bool,
    {
        let node = detach_first(&mut self.root, &mut is_terminated)?;
        let Node { entry, left, right } = *node;
        self.len -= 1;

        if let Some(subtree) = left {
            attach(&mut self.root, subtree);
        }
        if let Some(subtree) = right {
            attach(&mut self.root, subtree);
        }

        debug_assert!(self.is_ordered());
        Some(entry)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        let mut link = &self.root;
        while let Some(node) = link {
            if pid == node.entry.pid {
                return true;
            }
            link = if pid < node.entry.pid {
                &node.left
            } else {
                &node.right
            };
        }
        false
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree (0 when empty)
    pub fn depth(&self) -> usize {
        fn depth_of(link: &Link) -> usize {
            match link {
                Some(node) => 1 + depth_of(&node.left).max(depth_of(&node.right)),
                None => 0,
            }
        }
        depth_of(&self.root)
    }

    /// Check the search-tree property over the whole tree
    pub fn is_ordered(&self) -> bool {
        fn check(link: &Link, low: Option<Pid>, high: Option<Pid>) -> bool {
            let Some(node) = link else {
                return true;
            };
            let pid = node.entry.pid;
            if low.is_some_and(|low| pid < low) || high.is_some_and(|high| pid >= high) {
                return false;
            }
            check(&node.left, low, Some(pid)) && check(&node.right, Some(pid), high)
        }
        check(&self.root, None, None)
    }
}

/// Hang `node` (with whatever subtrees it carries) at the leaf position its
/// pid descends to.
fn attach(link: &mut Link, node: Box<Node>) {
    match link {
        Some(current) => {
            let next = if node.entry.pid < current.entry.pid {
                &mut current.left
            } else {
                &mut current.right
            };
            attach(next, node);
        }
        None => *link = Some(node),
    }
}

fn detach_first<F>(link: &mut Link, is_terminated: &mut F) -> Option<Box<Node>>
where
    F: FnMut(Pid) -> bool,
{
    let node = link.as_mut()?;
    if is_terminated(node.entry.pid) {
        return link.take();
    }
    if let Some(found) = detach_first(&mut node.left, is_terminated) {
        return Some(found);
    }
    detach_first(&mut node.right, is_terminated)
}

/// Pre-order iterator over a [`RunningIndex`]
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a RunningEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(right) = node.right.as_deref() {
            self.stack.push(right);
        }
        if let Some(left) = node.left.as_deref() {
            self.stack.push(left);
        }
        Some(&node.entry)
    }
}
