use std::sync::Arc;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use tracing::debug;

use crate::capability::Capability;
use crate::config::MarkdownConfig;

pub const CONVERTER_NAME: &str = "pulldown-cmark";

/// Converts task text into renderable markup.
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;
}

/// Optional CommonMark syntax extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownExtension {
    Strikethrough,
    Tables,
    Tasklists,
    SmartPunctuation,
}

impl MarkdownExtension {
    pub const NAMES: &'static [&'static str] =
        &["strikethrough", "tables", "tasklists", "smart_punctuation"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strikethrough" => Some(MarkdownExtension::Strikethrough),
            "tables" => Some(MarkdownExtension::Tables),
            "tasklists" => Some(MarkdownExtension::Tasklists),
            "smart_punctuation" => Some(MarkdownExtension::SmartPunctuation),
            _ => None,
        }
    }

    fn option(self) -> Options {
        match self {
            MarkdownExtension::Strikethrough => Options::ENABLE_STRIKETHROUGH,
            MarkdownExtension::Tables => Options::ENABLE_TABLES,
            MarkdownExtension::Tasklists => Options::ENABLE_TASKLISTS,
            MarkdownExtension::SmartPunctuation => Options::ENABLE_SMART_PUNCTUATION,
        }
    }
}

/// CommonMark renderer backed by pulldown-cmark.
#[derive(Debug, Clone)]
pub struct CmarkConverter {
    extensions: Vec<MarkdownExtension>,
}

impl CmarkConverter {
    pub fn new(extensions: &[MarkdownExtension]) -> Self {
        Self {
            extensions: extensions.to_vec(),
        }
    }

    fn options(&self) -> Options {
        self.extensions
            .iter()
            .fold(Options::empty(), |acc, ext| acc | ext.option())
    }
}

impl MarkdownConverter for CmarkConverter {
    fn to_html(&self, markdown: &str) -> String {
        let events: Vec<Event<'_>> = Parser::new_ext(markdown, self.options()).collect();

        // A lone paragraph is a one-line title; render its inline content only.
        let body = if is_single_paragraph(&events) {
            &events[1..events.len() - 1]
        } else {
            &events[..]
        };

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, body.iter().cloned());
        out
    }
}

fn is_single_paragraph(events: &[Event<'_>]) -> bool {
    let mut depth = 0usize;
    let mut blocks = 0usize;
    for event in events {
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    blocks += 1;
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ if depth == 0 => blocks += 1,
            _ => {}
        }
    }

    blocks == 1
        && matches!(events.first(), Some(Event::Start(Tag::Paragraph)))
        && matches!(events.last(), Some(Event::End(TagEnd::Paragraph)))
}

/// Load the converter described by `config`.
///
/// Extension names are checked during config validation; unknown names that
/// slip through are ignored here.
pub fn load(config: &MarkdownConfig) -> Capability<Arc<dyn MarkdownConverter>> {
    if !config.enabled {
        return Capability::disabled(CONVERTER_NAME, "disabled in configuration");
    }

    let extensions: Vec<MarkdownExtension> = config
        .extensions
        .iter()
        .filter_map(|name| MarkdownExtension::from_name(name))
        .collect();
    debug!(?extensions, "markdown converter loaded");
    Capability::Available(Arc::new(CmarkConverter::new(&extensions)))
}
