use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;

use crate::api;
use crate::config;
use crate::data::{self, ThreadService};
use crate::engine::{Engine, Options};
use crate::page;

pub struct RunOptions {
    pub page: PathBuf,
    /// Filename the remote store keys threads on; defaults to the page's
    /// file name.
    pub filename: Option<String>,
    /// Use the in-memory backend instead of the configured remote.
    pub offline: bool,
}

pub fn run(options: RunOptions) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    debug!("config path: {:?}", config::default_path());

    let markdown = fs::read_to_string(&options.page)
        .with_context(|| format!("read page {}", options.page.display()))?;
    let filename = match options.filename {
        Some(filename) => filename,
        None => options
            .page
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| options.page.display().to_string()),
    };

    let service: Arc<dyn ThreadService> = if options.offline {
        Arc::new(offline_service(&filename, &markdown)?)
    } else {
        let client = api::Client::new(api::ClientConfig {
            user_agent: cfg.remote.user_agent.clone(),
            base_url: Some(cfg.remote.base_url.clone()),
            timeout: Some(cfg.remote.timeout),
            http_client: None,
        })
        .context("create comments client")?;
        Arc::new(data::HttpThreadService::new(Arc::new(client)))
    };

    let mut engine = Engine::new(Options {
        service,
        highlight_commented: cfg.ui.highlight_commented,
    });
    engine.load_page(&filename, &markdown)?;

    let views = engine.section_views();
    println!(
        "{}: {} sections, {} threads",
        filename,
        views.len(),
        engine.store().threads().len()
    );
    for view in views {
        let text = engine
            .sections()
            .get(view.index)
            .map(|section| section.text.as_str())
            .unwrap_or_default();
        println!(
            "  {:>3} [{}] {} thread(s)  {}",
            view.index,
            view.marker,
            view.match_count,
            preview(text, 60)
        );
    }

    Ok(())
}

/// Seed the in-memory backend with a discussion on the first section so
/// an offline run has something to show.
fn offline_service(filename: &str, markdown: &str) -> Result<data::MockThreadService> {
    let mock = data::MockThreadService::new();
    if let Some(first) = page::sections(markdown).first() {
        let thread = mock.create_thread(filename, "Does this still hold?", "", &first.text)?;
        mock.create_comment(thread.number, "Verified against the latest release.")?;
    }
    Ok(mock)
}

fn preview(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
    }
}
