use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use log::debug;
use parking_lot::RwLock;

use crate::api::{Comment, Thread};
use crate::data::ThreadService;
use crate::store::ThreadStore;

/// Orchestrates fetch-then-cache and optimistic-post-then-reconcile flows
/// between the remote store and the local cache.
///
/// Every fetch captures the page epoch before going to the network and
/// re-checks it before writing, so a response that arrives after the user
/// navigated away is dropped instead of poisoning the new page's cache.
/// Failed fetches leave the cache untouched; failed posts leave the
/// optimistic entry in place. Neither is retried here.
pub struct SyncCoordinator {
    service: Arc<dyn ThreadService>,
    store: Arc<ThreadStore>,
    page: RwLock<Option<String>>,
    epoch: AtomicU64,
    next_temp_id: AtomicI64,
}

impl SyncCoordinator {
    pub fn new(service: Arc<dyn ThreadService>, store: Arc<ThreadStore>) -> Self {
        Self {
            service,
            store,
            page: RwLock::new(None),
            epoch: AtomicU64::new(0),
            next_temp_id: AtomicI64::new(-1),
        }
    }

    pub fn store(&self) -> &ThreadStore {
        &self.store
    }

    pub fn page(&self) -> Option<String> {
        self.page.read().clone()
    }

    /// Switch to a new page: the cache is cleared and every in-flight
    /// response for the old page becomes stale.
    pub fn set_page(&self, filename: &str) {
        debug!("sync: page changed to {}", filename);
        *self.page.write() = Some(filename.to_string());
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.reset();
    }

    /// Fetch the current page's thread list and replace the cache with it.
    pub fn load_threads(&self) -> Result<()> {
        let (filename, epoch) = self.current_page()?;
        let threads = self.service.list_threads(&filename)?;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("sync: discarding stale thread list for {}", filename);
            return Ok(());
        }
        self.store.set_all_threads(threads);
        Ok(())
    }

    /// Fetch one thread's comments and replace its cached list.
    pub fn load_comments(&self, number: i64) -> Result<()> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let comments = self.service.list_comments(number)?;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("sync: discarding stale comments for thread #{}", number);
            return Ok(());
        }
        self.store.set_comments(number, comments);
        Ok(())
    }

    /// Create a thread anchored to `section`, cache the returned record,
    /// and load its (empty) comment list so the thread view is consistent
    /// straight away.
    pub fn create_thread(&self, title: &str, body: &str, section: &str) -> Result<Thread> {
        let (filename, _) = self.current_page()?;
        let thread = self
            .service
            .create_thread(&filename, title, body, section)?;
        self.store.add_thread(thread.clone());
        self.load_comments(thread.number)?;
        Ok(thread)
    }

    /// Post a comment: an optimistic copy with a synthesized id goes into
    /// the cache first, then the post, then a full reload of the thread's
    /// comments reconciles with the server's ordering. A failed post
    /// leaves the optimistic copy in place; the next successful reload
    /// flushes it.
    pub fn post_comment(&self, number: i64, body: &str) -> Result<Comment> {
        let temp = Comment {
            id: self.next_temp_id.fetch_sub(1, Ordering::SeqCst),
            thread: number,
            body: body.to_string(),
            user: Default::default(),
        };
        self.store.add_comment(number, temp);

        let comment = self.service.create_comment(number, body)?;
        self.load_comments(number)?;
        Ok(comment)
    }

    fn current_page(&self) -> Result<(String, u64)> {
        let page = self.page.read().clone();
        match page {
            Some(filename) => Ok((filename, self.epoch.load(Ordering::SeqCst))),
            None => bail!("sync: no page loaded"),
        }
    }
}
