use std::collections::HashMap;

use log::debug;
use parking_lot::RwLock;

use crate::api::{Comment, Thread};
use crate::matcher;

/// Cache of the current page's threads and, lazily, their comments.
/// Threads stay in fetch order and are unique by number; the comment list
/// for a thread is kept in arrival order. The store is reset on every
/// page navigation, so everything in it is scoped to "current page".
pub struct ThreadStore {
    threads: RwLock<Vec<Thread>>,
    comments: RwLock<HashMap<i64, Vec<Comment>>>,
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadStore {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(Vec::new()),
            comments: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the whole thread cache, used after a full page fetch.
    pub fn set_all_threads(&self, threads: Vec<Thread>) {
        debug!("store: replacing thread cache with {} threads", threads.len());
        *self.threads.write() = threads;
    }

    /// Append a thread, replacing any existing entry with the same number
    /// in place.
    pub fn add_thread(&self, thread: Thread) {
        let mut threads = self.threads.write();
        match threads.iter_mut().find(|t| t.number == thread.number) {
            Some(existing) => *existing = thread,
            None => threads.push(thread),
        }
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.threads.read().clone()
    }

    pub fn thread(&self, number: i64) -> Option<Thread> {
        self.threads
            .read()
            .iter()
            .find(|t| t.number == number)
            .cloned()
    }

    /// Threads whose recorded context matches `section`, in cache order.
    pub fn threads_for_section(&self, section: &str) -> Vec<Thread> {
        matcher::matching_threads(section, &self.threads.read())
    }

    /// Replace the comment list for one thread with the server's answer.
    pub fn set_comments(&self, number: i64, comments: Vec<Comment>) {
        self.comments.write().insert(number, comments);
    }

    /// Optimistic local append. Deduped by comment id: re-adding an id
    /// already present replaces the entry instead of duplicating it.
    pub fn add_comment(&self, number: i64, comment: Comment) {
        let mut comments = self.comments.write();
        let list = comments.entry(number).or_default();
        match list.iter_mut().find(|c| c.id == comment.id) {
            Some(existing) => *existing = comment,
            None => list.push(comment),
        }
    }

    pub fn comments(&self, number: i64) -> Option<Vec<Comment>> {
        self.comments.read().get(&number).cloned()
    }

    /// Comment count for a thread: the cached list length once comments
    /// were loaded, else the static counter the thread carried at fetch
    /// time. The two can diverge until the next comment load; that window
    /// is expected.
    pub fn comment_count(&self, number: i64) -> i64 {
        if let Some(comments) = self.comments.read().get(&number) {
            return comments.len() as i64;
        }
        self.thread(number).map(|t| t.comments).unwrap_or(0)
    }

    /// Clear everything. Called on page navigation before the refetch.
    pub fn reset(&self) {
        debug!("store: reset");
        self.threads.write().clear();
        self.comments.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ThreadContext;

    fn thread(number: i64, section: &str, comments: i64) -> Thread {
        Thread {
            id: number,
            number,
            title: format!("Thread #{}", number),
            body: String::new(),
            user: Default::default(),
            context: ThreadContext {
                filename: "page.md".into(),
                section: section.into(),
            },
            comments,
        }
    }

    fn comment(id: i64, number: i64, body: &str) -> Comment {
        Comment {
            id,
            thread: number,
            body: body.into(),
            user: Default::default(),
        }
    }

    #[test]
    fn add_thread_is_idempotent_by_number() {
        let store = ThreadStore::new();
        store.add_thread(thread(1, "alpha", 0));
        let mut updated = thread(1, "alpha", 0);
        updated.title = "Renamed".into();
        store.add_thread(updated);
        let threads = store.threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].title, "Renamed");
    }

    #[test]
    fn comment_count_falls_back_to_static_counter() {
        let store = ThreadStore::new();
        store.add_thread(thread(1, "alpha", 5));
        assert_eq!(store.comment_count(1), 5);

        store.set_comments(1, vec![comment(10, 1, "a"), comment(11, 1, "b")]);
        assert_eq!(store.comment_count(1), 2);
    }

    #[test]
    fn comment_count_unknown_thread_is_zero() {
        let store = ThreadStore::new();
        assert_eq!(store.comment_count(42), 0);
    }

    #[test]
    fn add_comment_dedupes_by_id() {
        let store = ThreadStore::new();
        store.add_comment(1, comment(10, 1, "draft"));
        store.add_comment(1, comment(10, 1, "final"));
        let comments = store.comments(1).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "final");
    }

    #[test]
    fn threads_for_section_uses_cache_order() {
        let store = ThreadStore::new();
        store.set_all_threads(vec![
            thread(2, "shared words here", 0),
            thread(1, "different thing", 0),
            thread(3, "shared words here", 0),
        ]);
        let matched = store.threads_for_section("shared words here");
        let numbers: Vec<i64> = matched.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn reset_clears_threads_and_comments() {
        let store = ThreadStore::new();
        store.add_thread(thread(1, "alpha", 0));
        store.set_comments(1, vec![comment(10, 1, "a")]);
        store.reset();
        assert!(store.threads().is_empty());
        assert!(store.comments(1).is_none());
    }
}
