use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// One paragraph-level unit of rendered page content. The index is the
/// paragraph's position in document order and doubles as the area key;
/// the text is the flattened inline content the matcher runs against.
/// Sections are rebuilt from scratch on every page change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub index: usize,
    pub text: String,
}

/// Split a markdown document into its comment-bearing sections.
///
/// Only paragraphs count: headings, code blocks and tight list items have
/// no paragraph node in the rendered page and therefore carry no comment
/// marker. Paragraphs nested in block quotes or loose lists do. Inline
/// markup is flattened to its text content, line breaks inside a
/// paragraph collapse to a single space.
pub fn sections(input: &str) -> Vec<Section> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_FOOTNOTES);

    let mut sections = Vec::new();
    let mut buffer = String::new();
    let mut depth = 0usize;

    for event in Parser::new_ext(input, opts) {
        match event {
            Event::Start(Tag::Paragraph) => {
                depth += 1;
                buffer.clear();
            }
            Event::End(TagEnd::Paragraph) => {
                if depth > 0 {
                    depth -= 1;
                    let text = buffer.trim().to_string();
                    if !text.is_empty() {
                        sections.push(Section {
                            index: sections.len(),
                            text,
                        });
                    }
                    buffer.clear();
                }
            }
            Event::Text(text) if depth > 0 => buffer.push_str(&text),
            Event::Code(code) if depth > 0 => buffer.push_str(&code),
            Event::SoftBreak | Event::HardBreak if depth > 0 => buffer.push(' '),
            _ => {}
        }
    }

    sections
}
