use scraper::{ElementRef, Html, Node, Selector};

/// A snapshot of a rendered page
///
/// `html` is the serialized DOM and `text` the page's visible text, as a
/// browser's `document.body.innerText` would report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
    pub text: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            text: text.into(),
        }
    }

    /// Builds a snapshot from raw HTML, deriving the visible text from the markup
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let text = visible_text(&Html::parse_document(&html));
        Self {
            url: url.into(),
            html,
            text,
        }
    }

    /// Parses the DOM for querying
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements whose boundaries separate the text on either side
const BLOCK_ELEMENTS: &[&str] = &[
    "html", "body", "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

/// Text accumulator collapsing every run of whitespace to one space
#[derive(Default)]
struct TextBuffer {
    out: String,
    separate: bool,
}

impl TextBuffer {
    fn push(&mut self, fragment: &str) {
        for ch in fragment.chars() {
            if ch.is_whitespace() {
                self.separate = true;
                continue;
            }
            if self.separate && !self.out.is_empty() {
                self.out.push(' ');
            }
            self.separate = false;
            self.out.push(ch);
        }
    }

    fn boundary(&mut self) {
        self.separate = true;
    }
}

fn collect_text(element: ElementRef<'_>, buffer: &mut TextBuffer) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        buffer.boundary();
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buffer.push(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, buffer);
                }
            }
            _ => {}
        }
    }
    if block {
        buffer.boundary();
    }
}

/// Collects the rendered text under `<body>`
///
/// Script, style and template contents are skipped. Text split across
/// inline elements is joined as written, block boundaries separate words
/// and whitespace collapses to single spaces.
pub fn visible_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut buffer = TextBuffer::default();
    collect_text(root, &mut buffer);
    buffer.out
}
