//! HTML page generation.
//!
//! Renders three kinds of page from placeholder templates:
//!
//! | Template                 | Output                      | Placeholders                                                    |
//! |--------------------------|-----------------------------|-----------------------------------------------------------------|
//! | `post.html.template`     | `p/<id>.html`               | `POST_TITLE`, `POST_DATE`, `POST_BODY_HTML`, `PERMALINK`        |
//! | `index.html.template`    | `index.html`                | `RECENT_POSTS_LIST`, `TOTAL_POSTS_COUNT`                        |
//! | `archive.html.template`  | `archive/index.html`        | `ALL_POSTS_LIST`                                                |
//!
//! `SITE_TITLE` and `BASE_URL` are available everywhere. Templates are read
//! from `<source>/templates/`; a missing file falls back to a built-in
//! default rendered with [maud](https://maud.lambda.xyz/).
//!
//! Substitution is a single left-to-right pass: a `{{NAME}}` with a known
//! name is replaced, anything else is copied through, and inserted values
//! are never scanned again. Text values are HTML-escaped; the post body is
//! already HTML and goes in verbatim.
//!
//! Every page is minified and written with a `.br` sibling where that pays
//! off.

use crate::compress::{self, Artifact};
use crate::config::SiteConfig;
use crate::minify::minify_html;
use crate::types::{PostRecord, sort_newest_first};
use maud::{DOCTYPE, Markup, html};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagesError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Post id is not a safe file name: {0:?}")]
    UnsafeId(String),
    #[error("Duplicate post id: {0:?}")]
    DuplicateId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Post,
    Index,
    Archive,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [Self::Post, Self::Index, Self::Archive];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Post => "post.html.template",
            Self::Index => "index.html.template",
            Self::Archive => "archive.html.template",
        }
    }

    fn builtin(self) -> Markup {
        match self {
            Self::Post => builtin_post(),
            Self::Index => builtin_index(),
            Self::Archive => builtin_archive(),
        }
    }
}

/// The three page templates, as raw text with `{{NAME}}` placeholders.
#[derive(Debug, Clone)]
pub struct Templates {
    pub post: String,
    pub index: String,
    pub archive: String,
}

impl Templates {
    /// The built-in defaults.
    pub fn builtin() -> Self {
        Self {
            post: TemplateKind::Post.builtin().into_string(),
            index: TemplateKind::Index.builtin().into_string(),
            archive: TemplateKind::Archive.builtin().into_string(),
        }
    }

    /// Load templates from `dir`, using the built-in default for each file
    /// that does not exist.
    pub fn load(dir: &Path) -> Result<Self, PagesError> {
        let mut templates = Self::builtin();
        for kind in TemplateKind::ALL {
            let path = dir.join(kind.file_name());
            match fs::read_to_string(&path) {
                Ok(text) => *templates.slot(kind) = text,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "template missing, using built-in");
                }
                Err(source) => return Err(PagesError::Template { path, source }),
            }
        }
        Ok(templates)
    }

    fn slot(&mut self, kind: TemplateKind) -> &mut String {
        match kind {
            TemplateKind::Post => &mut self.post,
            TemplateKind::Index => &mut self.index,
            TemplateKind::Archive => &mut self.archive,
        }
    }
}

// ============================================================================
// Built-in templates
// ============================================================================

fn page_shell(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href="{{BASE_URL}}/css/style.css";
            }
            body {
                header.site-header {
                    a href="{{BASE_URL}}/" { "{{SITE_TITLE}}" }
                }
                (content)
            }
        }
    }
}

fn builtin_post() -> Markup {
    let content = html! {
        main {
            article.post {
                h1 { "{{POST_TITLE}}" }
                p.post-meta { "{{POST_DATE}}" }
                "{{POST_BODY_HTML}}"
            }
        }
    };
    page_shell("{{POST_TITLE}} - {{SITE_TITLE}}", content)
}

fn builtin_index() -> Markup {
    let content = html! {
        main {
            input id="search" type="search" placeholder="Search posts";
            ul id="search-results" {}
            ul.post-list { "{{RECENT_POSTS_LIST}}" }
            p { a href="archive/" { "All {{TOTAL_POSTS_COUNT}} posts" } }
        }
        script src="{{BASE_URL}}/search-index.js" defer {}
        script src="{{BASE_URL}}/js/search.js" defer {}
    };
    page_shell("{{SITE_TITLE}}", content)
}

fn builtin_archive() -> Markup {
    let content = html! {
        main {
            h1 { "Archive" }
            ul.post-list { "{{ALL_POSTS_LIST}}" }
        }
    };
    page_shell("Archive - {{SITE_TITLE}}", content)
}

// ============================================================================
// Rendering
// ============================================================================

/// Replace every `{{NAME}}` whose name appears in `values`, in one pass.
pub fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let replacement = after_open.find("}}").and_then(|end| {
            let name = &after_open[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match replacement {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after_open[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// `<li>` entries for a post list, links prefixed with `link_prefix`.
pub fn post_list_html(posts: &[PostRecord], link_prefix: &str) -> String {
    html! {
        @for post in posts {
            li {
                h2 { a href={ (link_prefix) (post.permalink) } { (post.title) } }
                p.post-meta { (post.date) }
            }
        }
    }
    .into_string()
}

pub fn render_post(template: &str, site: &SiteConfig, post: &PostRecord) -> String {
    let site_title = escape(&site.site_title);
    let base_url = escape(&site.base_url);
    let title = escape(&post.title);
    let date = escape(&post.date);
    let permalink = escape(&post.permalink);
    substitute(
        template,
        &[
            ("SITE_TITLE", &site_title),
            ("BASE_URL", &base_url),
            ("POST_TITLE", &title),
            ("POST_DATE", &date),
            ("POST_BODY_HTML", &post.body_html),
            ("PERMALINK", &permalink),
        ],
    )
}

/// Render the home page. `posts` must already be sorted newest first.
pub fn render_index(template: &str, site: &SiteConfig, posts: &[PostRecord]) -> String {
    let recent = &posts[..posts.len().min(site.pages.recent_posts)];
    let site_title = escape(&site.site_title);
    let base_url = escape(&site.base_url);
    let list = post_list_html(recent, "");
    let total = posts.len().to_string();
    substitute(
        template,
        &[
            ("SITE_TITLE", &site_title),
            ("BASE_URL", &base_url),
            ("RECENT_POSTS_LIST", &list),
            ("TOTAL_POSTS_COUNT", &total),
        ],
    )
}

/// Render the archive page. `posts` must already be sorted newest first.
pub fn render_archive(template: &str, site: &SiteConfig, posts: &[PostRecord]) -> String {
    let site_title = escape(&site.site_title);
    let base_url = escape(&site.base_url);
    let list = post_list_html(posts, "../");
    substitute(
        template,
        &[
            ("SITE_TITLE", &site_title),
            ("BASE_URL", &base_url),
            ("ALL_POSTS_LIST", &list),
        ],
    )
}

/// A post id must be usable as a single file name.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0'])
}

/// A written post page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub id: String,
    pub title: String,
    pub artifact: Artifact,
}

/// Summary of a pages stage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagesReport {
    /// One page per post, newest first.
    pub posts: Vec<PostPage>,
    pub index: Artifact,
    pub archive: Artifact,
}

/// Render and write every post page, the home page and the archive.
pub fn generate_pages(
    posts: &[PostRecord],
    templates: &Templates,
    site: &SiteConfig,
    output_dir: &Path,
) -> Result<PagesReport, PagesError> {
    let mut sorted = posts.to_vec();
    sort_newest_first(&mut sorted);
    if let Some(bad) = sorted.iter().find(|post| !is_safe_id(&post.id)) {
        return Err(PagesError::UnsafeId(bad.id.clone()));
    }
    let mut seen = HashSet::with_capacity(sorted.len());
    if let Some(dup) = sorted.iter().find(|post| !seen.insert(post.id.as_str())) {
        return Err(PagesError::DuplicateId(dup.id.clone()));
    }

    let post_dir = output_dir.join("p");
    let post_pages = sorted
        .par_iter()
        .map(|post| -> io::Result<PostPage> {
            if !post.has_body() {
                tracing::warn!(id = %post.id, "post has no body");
            }
            let page = minify_html(&render_post(&templates.post, site, post));
            let path = post_dir.join(format!("{}.html", post.id));
            let artifact = compress::write_artifact(&path, page.as_bytes(), &site.compression)?;
            Ok(PostPage {
                id: post.id.clone(),
                title: post.title.clone(),
                artifact,
            })
        })
        .collect::<io::Result<Vec<_>>>()?;

    let index = minify_html(&render_index(&templates.index, site, &sorted));
    let index = compress::write_artifact(
        &output_dir.join("index.html"),
        index.as_bytes(),
        &site.compression,
    )?;

    let archive = minify_html(&render_archive(&templates.archive, site, &sorted));
    let archive = compress::write_artifact(
        &output_dir.join("archive").join("index.html"),
        archive.as_bytes(),
        &site.compression,
    )?;

    Ok(PagesReport {
        posts: post_pages,
        index,
        archive,
    })
}

// ============================================================================
// Tests
// ============================================================================
