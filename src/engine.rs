use std::sync::Arc;

use anyhow::{bail, Result};
use log::warn;

use crate::api::{Comment, Thread};
use crate::area::{AreaController, SubView};
use crate::data::ThreadService;
use crate::page::{self, Section};
use crate::store::ThreadStore;
use crate::sync::SyncCoordinator;

pub struct Options {
    pub service: Arc<dyn ThreadService>,
    pub highlight_commented: bool,
}

/// Everything a marker badge and its expandable panel need to render one
/// section. Derived on demand from the cache; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub index: usize,
    pub match_count: usize,
    /// Opening posts plus replies across the matched threads.
    pub comment_total: i64,
    pub is_open: bool,
    pub sub_view: Option<SubView>,
    pub marker: String,
    pub highlight: bool,
}

/// Ties sections, the matcher-backed cache, the open-area state machine
/// and the sync coordinator together behind the interface the rendering
/// layer consumes.
pub struct Engine {
    store: Arc<ThreadStore>,
    sync: SyncCoordinator,
    areas: AreaController,
    sections: Vec<Section>,
    highlight_commented: bool,
}

impl Engine {
    pub fn new(options: Options) -> Self {
        let store = Arc::new(ThreadStore::new());
        let sync = SyncCoordinator::new(options.service, store.clone());
        Self {
            store,
            sync,
            areas: AreaController::new(),
            sections: Vec::new(),
            highlight_commented: options.highlight_commented,
        }
    }

    pub fn store(&self) -> &ThreadStore {
        &self.store
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Swap in a new page: re-derive sections, collapse any open panel,
    /// clear the cache and fetch the page's threads.
    pub fn load_page(&mut self, filename: &str, markdown: &str) -> Result<()> {
        self.sections = page::sections(markdown);
        self.areas.on_page_change();
        self.sync.set_page(filename);
        self.sync.load_threads()
    }

    /// Marker/panel state for every section, in page order.
    pub fn section_views(&self) -> Vec<SectionView> {
        self.sections
            .iter()
            .map(|section| {
                let threads = self.store.threads_for_section(&section.text);
                let comment_total: i64 = threads
                    .iter()
                    .map(|thread| 1 + self.store.comment_count(thread.number))
                    .sum();
                let is_open = self.areas.is_open(section.index);
                SectionView {
                    index: section.index,
                    match_count: threads.len(),
                    comment_total,
                    is_open,
                    sub_view: is_open.then(|| SubView::for_match_count(threads.len())),
                    marker: if comment_total > 0 {
                        comment_total.to_string()
                    } else {
                        "+".to_string()
                    },
                    highlight: self.highlight_commented && comment_total > 0,
                }
            })
            .collect()
    }

    /// Threads matched to one section, for the panel's list view.
    pub fn threads_for_section(&self, index: usize) -> Vec<Thread> {
        match self.sections.get(index) {
            Some(section) => self.store.threads_for_section(&section.text),
            None => Vec::new(),
        }
    }

    pub fn comments_for(&self, number: i64) -> Option<Vec<Comment>> {
        self.store.comments(number)
    }

    /// Expand or collapse one section's panel. Opening a section with a
    /// single matching thread goes straight to its comment view, so the
    /// comments are fetched on the spot.
    pub fn toggle_area(&mut self, index: usize) -> Result<()> {
        if index >= self.sections.len() {
            warn!("engine: toggle for unknown section {}", index);
            return Ok(());
        }
        self.areas.toggle(index);
        if self.areas.is_open(index) {
            let threads = self.threads_for_section(index);
            if let [thread] = threads.as_slice() {
                self.sync.load_comments(thread.number)?;
            }
        }
        Ok(())
    }

    /// Select a thread from the list view: fetch its comments on demand.
    pub fn open_thread(&self, number: i64) -> Result<()> {
        self.sync.load_comments(number)
    }

    /// Post a new thread anchored to the open area's section text.
    pub fn submit_new_thread(&mut self, title: &str, body: &str) -> Result<Thread> {
        let index = match self.areas.open_area() {
            Some(index) => index,
            None => bail!("engine: no open area to anchor a thread to"),
        };
        let section = match self.sections.get(index) {
            Some(section) => section.text.clone(),
            None => bail!("engine: open area {} has no section", index),
        };
        self.sync.create_thread(title, body, &section)
    }

    pub fn submit_comment(&self, number: i64, body: &str) -> Result<Comment> {
        self.sync.post_comment(number, body)
    }
}
