// Markdown rendering for README documents.
// Resolves relative links against the document's location and sanitizes the HTML.

use std::borrow::Cow;

use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, html};
use tracing::warn;
use url::Url;

/// Resolves README-relative targets to absolute URLs.
///
/// Page links resolve against the rendered blob location; images resolve
/// against the raw download location.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    page_base: Option<Url>,
    asset_base: Option<Url>,
}

impl LinkRewriter {
    pub fn new(page_base: &str, asset_base: &str) -> Self {
        Self {
            page_base: parse_base(page_base),
            asset_base: parse_base(asset_base),
        }
    }

    /// Bases derived from a README's `html_url` and `download_url`.
    pub fn for_document(html_url: &str, download_url: &str) -> Self {
        Self::new(directory_of(html_url), directory_of(download_url))
    }

    pub fn rewrite_link(&self, href: &str) -> String {
        resolve(self.page_base.as_ref(), href)
    }

    pub fn rewrite_image(&self, src: &str) -> String {
        resolve(self.asset_base.as_ref(), src)
    }

    /// The Markdown source with inline link and image targets made absolute.
    ///
    /// Reference definitions and targets written with escapes are left alone.
    pub fn rewrite_markdown(&self, markdown: &str) -> String {
        let mut edits: Vec<(usize, usize, String)> = Vec::new();
        for (event, range) in Parser::new_ext(markdown, markdown_options()).into_offset_iter() {
            let (dest, resolved) = match &event {
                Event::Start(Tag::Link {
                    link_type: LinkType::Inline,
                    dest_url,
                    ..
                }) => (&**dest_url, self.rewrite_link(dest_url)),
                Event::Start(Tag::Image {
                    link_type: LinkType::Inline,
                    dest_url,
                    ..
                }) => (&**dest_url, self.rewrite_image(dest_url)),
                _ => continue,
            };
            if resolved == dest {
                continue;
            }
            // The target follows the link text, so search from the end.
            let Some(offset) = markdown[range.clone()].rfind(dest) else {
                continue;
            };
            let start = range.start + offset;
            edits.push((start, start + dest.len(), resolved));
        }

        edits.sort_by_key(|(start, _, _)| *start);
        let mut out = String::with_capacity(markdown.len());
        let mut cursor = 0;
        for (start, end, replacement) in edits {
            if start < cursor {
                continue;
            }
            out.push_str(&markdown[cursor..start]);
            out.push_str(&replacement);
            cursor = end;
        }
        out.push_str(&markdown[cursor..]);
        out
    }
}

fn parse_base(base: &str) -> Option<Url> {
    match Url::parse(base) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(base, error = %e, "unusable link base, relative links left as-is");
            None
        }
    }
}

/// Everything up to and including the last `/`.
fn directory_of(url: &str) -> &str {
    match url.rfind('/') {
        Some(i) => &url[..=i],
        None => url,
    }
}

fn passes_through(target: &str) -> bool {
    target.is_empty()
        || target.starts_with('#')
        || target.to_ascii_lowercase().starts_with("mailto:")
        || Url::parse(target).is_ok()
}

fn resolve(base: Option<&Url>, target: &str) -> String {
    if passes_through(target) {
        return target.to_string();
    }
    let Some(base) = base else {
        return target.to_string();
    };

    let cleaned = target.strip_prefix("./").unwrap_or(target);
    match base.join(cleaned) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!(target, error = %e, "could not resolve relative link");
            target.to_string()
        }
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Opening tag for a Markdown link. Same-document fragments stay in place;
/// everything else opens in a new context.
fn link_open_tag(href: &str, title: &str) -> CowStr<'static> {
    let mut tag = format!("<a href=\"{}\"", escape_html(href));
    if !title.is_empty() {
        tag.push_str(&format!(" title=\"{}\"", escape_html(title)));
    }
    if !href.starts_with('#') {
        tag.push_str(" target=\"_blank\"");
    }
    tag.push('>');
    tag.into()
}

/// Turns Markdown into HTML that is safe to embed.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str, links: &LinkRewriter) -> String;
}

/// CommonMark (GitHub extensions) via pulldown-cmark, sanitized with ammonia.
#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkRenderer;

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str, links: &LinkRewriter) -> String {
        let events = Parser::new_ext(markdown, markdown_options()).map(|event| match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            }) => {
                let href = match link_type {
                    LinkType::Email => format!("mailto:{}", dest_url),
                    _ => links.rewrite_link(&dest_url),
                };
                Event::InlineHtml(link_open_tag(&href, &title))
            }
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: links.rewrite_image(&dest_url).into(),
                title,
                id,
            }),
            other => other,
        });
        let mut raw = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut raw, events);

        // Runs on raw HTML embedded in the README as well as rendered Markdown.
        let links = links.clone();
        let mut builder = ammonia::Builder::default();
        builder
            .link_rel(Some("noopener noreferrer"))
            .add_tag_attributes("a", &["target"])
            .add_tag_attributes("code", &["class"])
            .attribute_filter(move |element, attribute, value| {
                match (element, attribute) {
                    ("a", "href") => Some(Cow::Owned(links.rewrite_link(value))),
                    ("a", "target") => Some(Cow::Borrowed("_blank")),
                    ("img", "src") => Some(Cow::Owned(links.rewrite_image(value))),
                    _ => Some(Cow::Borrowed(value)),
                }
            });
        builder.clean(&raw).to_string()
    }
}

/// Escape text for inclusion in HTML content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    ammonia::clean_text(text)
}
