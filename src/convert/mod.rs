//! Markdown to Confluence storage format conversion.
//!
//! The body is rendered with `pulldown-cmark`; a few constructs are rewritten
//! into Confluence macros on the way:
//!
//! - local images → attachment image macros (listed in [`ConvertedDocument::images`])
//! - `data:` URI images → attachment image macros with an in-memory payload
//! - links to other Markdown files → URLs of the pages they were published to
//! - fenced code → `code` macro; fenced `mermaid` → rendered diagram attachment

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Document, IdentityMap};

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("valid regex"));

/// Safe attachment name for an image reference.
#[must_use]
pub fn attachment_name(name: &str) -> String {
    UNSAFE_NAME_CHARS.replace_all(name, "_").into_owned()
}

/// Converter behavior switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Render unresolvable Markdown links as plain text instead of failing
    pub ignore_invalid_url: bool,
    /// Turn fenced `mermaid` blocks into rendered PNG attachments
    pub render_mermaid: bool,
    /// Text of an info panel placed at the top of every page
    pub generated_by: Option<String>,
}

/// A diagram awaiting rendering, referenced from the markup by `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    pub name: String,
    pub source: String,
}

/// Output of a conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertedDocument {
    /// Confluence storage format markup
    pub xhtml: String,
    /// Image paths relative to the document's directory
    pub images: Vec<String>,
    /// Attachment name → payload for images carried inside the document
    pub embedded_images: BTreeMap<String, Vec<u8>>,
    /// Diagrams to render into attachments before publishing
    pub diagrams: Vec<Diagram>,
}

struct PendingImage {
    dest: String,
    alt: String,
}

struct PendingCode {
    language: Option<String>,
    text: String,
}

/// Markdown to storage format converter.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConverterOptions,
}

impl Converter {
    #[must_use]
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    /// Convert a parsed document located at `path`.
    ///
    /// `pages` resolves links between documents of the same run.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLink` for a link to a Markdown file that is not
    /// part of `pages`, unless invalid links are ignored.
    pub fn convert(
        &self,
        document: &Document,
        path: &Path,
        pages: &IdentityMap,
    ) -> Result<ConvertedDocument> {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut converted = ConvertedDocument::default();
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut image: Option<PendingImage> = None;
        let mut code: Option<PendingCode> = None;
        let mut open_links: Vec<bool> = Vec::new();

        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;

        for event in Parser::new_ext(&document.body, options) {
            if let Some(pending) = image.as_mut() {
                match event {
                    Event::End(TagEnd::Image) => {
                        if let Some(pending) = image.take() {
                            let markup = self.image_markup(&pending, &mut converted);
                            events.push(Event::Html(CowStr::from(markup)));
                        }
                    }
                    Event::Text(text) | Event::Code(text) => pending.alt.push_str(&text),
                    _ => {}
                }
                continue;
            }

            if let Some(pending) = code.as_mut() {
                match event {
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(pending) = code.take() {
                            let markup = self.code_markup(pending, &mut converted);
                            events.push(Event::Html(CowStr::from(markup)));
                        }
                    }
                    Event::Text(text) => pending.text.push_str(&text),
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::Image { dest_url, .. }) => {
                    image = Some(PendingImage {
                        dest: dest_url.to_string(),
                        alt: String::new(),
                    });
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split(|c: char| c.is_whitespace() || c == ',')
                            .next()
                            .filter(|l| !l.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some(PendingCode {
                        language,
                        text: String::new(),
                    });
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => match self.resolve_link(&dest_url, base_dir, path, pages)? {
                    Some(url) => {
                        open_links.push(true);
                        events.push(Event::Start(Tag::Link {
                            link_type,
                            dest_url: CowStr::from(url),
                            title,
                            id,
                        }));
                    }
                    None => open_links.push(false),
                },
                Event::End(TagEnd::Link) => {
                    if open_links.pop().unwrap_or(true) {
                        events.push(Event::End(TagEnd::Link));
                    }
                }
                other => events.push(other),
            }
        }

        if let Some(generated_by) = &self.options.generated_by {
            converted.xhtml.push_str(&info_macro(generated_by));
        }
        html::push_html(&mut converted.xhtml, events.into_iter());

        debug!(
            path = %path.display(),
            images = converted.images.len(),
            embedded = converted.embedded_images.len(),
            diagrams = converted.diagrams.len(),
            "Converted document"
        );
        Ok(converted)
    }

    /// Map a link target; `None` drops the link and keeps its text.
    fn resolve_link(
        &self,
        dest: &str,
        base_dir: &Path,
        path: &Path,
        pages: &IdentityMap,
    ) -> Result<Option<String>> {
        if dest.is_empty() || dest.starts_with('#') || URL_SCHEME.is_match(dest) {
            return Ok(Some(dest.to_string()));
        }

        let (target, fragment) = match dest.split_once('#') {
            Some((target, fragment)) => (target, Some(fragment)),
            None => (dest, None),
        };
        if !target.ends_with(".md") {
            return Ok(Some(dest.to_string()));
        }

        let decoded = urlencoding::decode(target).map_or_else(|_| target.to_string(), |d| d.into_owned());
        let absolute = normalize_path(&base_dir.join(decoded));

        if let Some(metadata) = pages.get(&absolute) {
            let mut url = metadata.url();
            if let Some(fragment) = fragment {
                url.push('#');
                url.push_str(fragment);
            }
            return Ok(Some(url));
        }

        if self.options.ignore_invalid_url {
            warn!(path = %path.display(), link = dest, "Skipping link to unpublished document");
            Ok(None)
        } else {
            Err(Error::InvalidLink {
                path: path.to_path_buf(),
                link: dest.to_string(),
            })
        }
    }

    fn image_markup(&self, image: &PendingImage, converted: &mut ConvertedDocument) -> String {
        let alt = escape(&image.alt);

        if let Some(data) = image.dest.strip_prefix("data:") {
            return match decode_data_uri(data) {
                Some((extension, bytes)) => {
                    let name = format!("embedded_{}.{extension}", short_hash(&bytes));
                    converted.embedded_images.insert(name.clone(), bytes);
                    attachment_image(&name, &alt)
                }
                None => {
                    warn!(alt = %image.alt, "Skipping image with malformed data URI");
                    alt
                }
            };
        }

        if URL_SCHEME.is_match(&image.dest) {
            return format!(
                r#"<ac:image ac:alt="{alt}"><ri:url ri:value="{}" /></ac:image>"#,
                escape(&image.dest)
            );
        }

        let relative = urlencoding::decode(&image.dest)
            .map_or_else(|_| image.dest.clone(), |d| d.into_owned());
        let name = attachment_name(&relative);
        if !converted.images.contains(&relative) {
            converted.images.push(relative);
        }
        attachment_image(&name, &alt)
    }

    fn code_markup(&self, code: PendingCode, converted: &mut ConvertedDocument) -> String {
        if self.options.render_mermaid && code.language.as_deref() == Some("mermaid") {
            let name = format!("embedded_{}.png", short_hash(code.text.as_bytes()));
            if !converted.diagrams.iter().any(|d| d.name == name) {
                converted.diagrams.push(Diagram {
                    name: name.clone(),
                    source: code.text,
                });
            }
            return attachment_image(&name, "");
        }

        let mut markup = String::from(r#"<ac:structured-macro ac:name="code">"#);
        if let Some(language) = &code.language {
            markup.push_str(&format!(
                r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
                escape(language)
            ));
        }
        markup.push_str("<ac:plain-text-body><![CDATA[");
        markup.push_str(&code.text.replace("]]>", "]]]]><![CDATA[>"));
        markup.push_str("]]></ac:plain-text-body></ac:structured-macro>\n");
        markup
    }
}

fn attachment_image(name: &str, alt: &str) -> String {
    format!(
        r#"<ac:image ac:alt="{alt}"><ri:attachment ri:filename="{}" /></ac:image>"#,
        escape(name)
    )
}

fn info_macro(text: &str) -> String {
    format!(
        r#"<ac:structured-macro ac:name="info"><ac:parameter ac:name="icon">false</ac:parameter><ac:rich-text-body><p>{}</p></ac:rich-text-body></ac:structured-macro>"#,
        escape(text)
    )
}

/// Decode `image/png;base64,....` into an extension and payload.
fn decode_data_uri(data: &str) -> Option<(String, Vec<u8>)> {
    let (header, payload) = data.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let extension = mime
        .split_once('/')
        .map(|(_, subtype)| subtype.split('+').next().unwrap_or(subtype))
        .filter(|s| !s.is_empty())?
        .to_string();
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((extension, bytes))
}

fn short_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")[..16].to_string()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Resolve `.` and `..` components without touching the file system.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
