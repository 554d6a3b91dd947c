use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::RwLock;

use crate::api::{self, Comment, Thread, ThreadContext, User, UserUrls};

pub trait ThreadService: Send + Sync {
    fn list_threads(&self, filename: &str) -> Result<Vec<Thread>>;
    fn create_thread(
        &self,
        filename: &str,
        title: &str,
        body: &str,
        section: &str,
    ) -> Result<Thread>;
    fn list_comments(&self, number: i64) -> Result<Vec<Comment>>;
    fn create_comment(&self, number: i64, body: &str) -> Result<Comment>;
}

pub struct HttpThreadService {
    client: Arc<api::Client>,
}

impl HttpThreadService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl ThreadService for HttpThreadService {
    fn list_threads(&self, filename: &str) -> Result<Vec<Thread>> {
        self.client.threads(filename).context("fetch thread list")
    }

    fn create_thread(
        &self,
        filename: &str,
        title: &str,
        body: &str,
        section: &str,
    ) -> Result<Thread> {
        self.client
            .create_thread(filename, title, body, section)
            .context("create thread")
    }

    fn list_comments(&self, number: i64) -> Result<Vec<Comment>> {
        self.client.comments(number).context("fetch comments")
    }

    fn create_comment(&self, number: i64, body: &str) -> Result<Comment> {
        self.client
            .create_comment(number, body)
            .context("create comment")
    }
}

/// In-memory backend used by the offline mode and by tests. Behaves like
/// the real store: created threads get sequential numbers, comments land
/// on the addressed thread, unknown numbers fail.
pub struct MockThreadService {
    state: RwLock<MockState>,
}

struct MockState {
    threads: Vec<Thread>,
    comments: HashMap<i64, Vec<Comment>>,
    next_number: i64,
    next_comment_id: i64,
}

impl Default for MockThreadService {
    fn default() -> Self {
        Self {
            state: RwLock::new(MockState {
                threads: Vec::new(),
                comments: HashMap::new(),
                next_number: 1,
                next_comment_id: 1,
            }),
        }
    }
}

impl MockThreadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with one thread per `(title, section)` entry; the
    /// section text becomes the thread's recorded context.
    pub fn seeded(filename: &str, sections: &[(&str, &str)]) -> Self {
        let service = Self::new();
        for (title, section) in sections {
            service
                .create_thread(filename, title, "", section)
                .expect("seed mock thread");
        }
        service
    }
}

impl ThreadService for MockThreadService {
    fn list_threads(&self, filename: &str) -> Result<Vec<Thread>> {
        let state = self.state.read();
        Ok(state
            .threads
            .iter()
            .filter(|thread| thread.context.filename == filename)
            .cloned()
            .collect())
    }

    fn create_thread(
        &self,
        filename: &str,
        title: &str,
        body: &str,
        section: &str,
    ) -> Result<Thread> {
        if title.trim().is_empty() {
            bail!(api::ApiError::ValidationFailure(
                "thread title is required".into()
            ));
        }
        let mut state = self.state.write();
        let number = state.next_number;
        state.next_number += 1;
        let thread = Thread {
            id: number,
            number,
            title: title.to_string(),
            body: body.to_string(),
            user: mock_user(),
            context: ThreadContext {
                filename: filename.to_string(),
                section: section.to_string(),
            },
            comments: 0,
        };
        state.threads.push(thread.clone());
        state.comments.insert(number, Vec::new());
        Ok(thread)
    }

    fn list_comments(&self, number: i64) -> Result<Vec<Comment>> {
        let state = self.state.read();
        match state.comments.get(&number) {
            Some(comments) => Ok(comments.clone()),
            None => bail!(api::ApiError::NotFound(format!("thread #{}", number))),
        }
    }

    fn create_comment(&self, number: i64, body: &str) -> Result<Comment> {
        if body.trim().is_empty() {
            bail!(api::ApiError::ValidationFailure(
                "comment body is required".into()
            ));
        }
        let mut state = self.state.write();
        if !state.comments.contains_key(&number) {
            bail!(api::ApiError::NotFound(format!("thread #{}", number)));
        }
        let id = state.next_comment_id;
        state.next_comment_id += 1;
        let comment = Comment {
            id,
            thread: number,
            body: body.to_string(),
            user: mock_user(),
        };
        if let Some(list) = state.comments.get_mut(&number) {
            list.push(comment.clone());
        }
        if let Some(thread) = state.threads.iter_mut().find(|t| t.number == number) {
            thread.comments += 1;
        }
        Ok(comment)
    }
}

fn mock_user() -> User {
    User {
        name: "marginalia".into(),
        urls: UserUrls {
            avatar: String::new(),
            profile: String::new(),
        },
    }
}
