use serde::Serialize;

use crate::map::MarkerHandle;
use crate::places::Place;

pub const PENDING_TEXT: &str = "Pending search...";
pub const NO_ARTICLES_TEXT: &str = "No articles found";
pub const ARTICLE_FAILED_TEXT: &str = "Failed to get resources";

/// The panel the popup content is rendered into.
pub trait PopupView: Send + Sync {
    /// Shows the popup anchored on `anchor`, replacing any open popup.
    fn open(&self, anchor: Option<MarkerHandle>, html: &str);
    fn set_content(&self, html: &str);
    fn close(&self);
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopupFragment {
    Address { text: String },
    Article { title: String, url: String },
    NoArticles,
    ArticleFailed,
}

impl PopupFragment {
    fn render_into(&self, out: &mut String) {
        match self {
            Self::Address { text } => out.push_str(&escape_html(text)),
            Self::Article { title, url } => {
                out.push_str("<h4>Related Article:</h4><p><a href=\"");
                out.push_str(&escape_html(url));
                out.push_str("\">");
                out.push_str(&escape_html(title));
                out.push_str("</a></p>");
            }
            Self::NoArticles => {
                out.push_str("<p>");
                out.push_str(NO_ARTICLES_TEXT);
                out.push_str("</p>");
            }
            Self::ArticleFailed => {
                out.push_str("<p>");
                out.push_str(ARTICLE_FAILED_TEXT);
                out.push_str("</p>");
            }
        }
    }
}

/// Content of the one open popup. Fragments are only ever appended.
#[derive(Clone, Debug, Serialize)]
pub struct PopupState {
    pub place: Place,
    pub generation: u64,
    fragments: Vec<PopupFragment>,
}

impl PopupState {
    pub fn new(place: Place, generation: u64) -> Self {
        Self {
            place,
            generation,
            fragments: Vec::new(),
        }
    }

    pub fn fragments(&self) -> &[PopupFragment] {
        &self.fragments
    }

    pub fn append(&mut self, fragment: PopupFragment) {
        self.fragments.push(fragment);
    }

    /// Title first, then the pending line until something has arrived, then
    /// fragments in arrival order.
    pub fn render(&self) -> String {
        let mut html = String::new();
        html.push_str("<h1>");
        html.push_str(&escape_html(&self.place.name));
        html.push_str("</h1>");
        if self.fragments.is_empty() {
            html.push_str("<p>");
            html.push_str(PENDING_TEXT);
            html.push_str("</p>");
        }
        for fragment in &self.fragments {
            fragment.render_into(&mut html);
        }
        html
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
