//! Markup tokenizer.
//!
//! [`MarkupParser`] drives quick-xml over the template source to find the
//! boundaries of every construct, then rescans each construct by hand to
//! report exact spans (names, whitespace, operators, quotes) to a
//! [`MarkupHandler`]. Nothing is copied: spans point into the shared source.
//!
//! Content of HTML raw-text elements (`<script>`, `<style>`, `<textarea>`...)
//! is not markup and is scanned manually up to the matching close tag.

use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use weft_markup::event::AttributeValueQuotes;
use weft_markup::{ElementDefinitions, ElementType, Location, TemplateMode};

use crate::error::ProcessingError;

/// A region of the source and where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupSpan {
    pub offset: usize,
    pub len: usize,
    pub line: usize,
    pub col: usize,
}

impl MarkupSpan {
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.line, self.col)
    }
}

/// Spans of one attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpans {
    pub name: MarkupSpan,
    /// `=` with any surrounding whitespace.
    pub operator: Option<MarkupSpan>,
    /// Value without its quotes.
    pub value: Option<MarkupSpan>,
    pub quotes: AttributeValueQuotes,
}

/// Spans of a DOCTYPE clause.
#[derive(Debug, Clone, Copy)]
pub struct DocTypeSpans {
    pub outer: MarkupSpan,
    pub keyword: MarkupSpan,
    pub element_name: MarkupSpan,
    pub doc_type_type: Option<MarkupSpan>,
    pub public_id: Option<MarkupSpan>,
    pub system_id: Option<MarkupSpan>,
    pub internal_subset: Option<MarkupSpan>,
}

/// Spans of an XML declaration.
#[derive(Debug, Clone, Copy)]
pub struct XmlDeclarationSpans {
    pub outer: MarkupSpan,
    pub keyword: MarkupSpan,
    pub version: Option<MarkupSpan>,
    pub encoding: Option<MarkupSpan>,
    pub standalone: Option<MarkupSpan>,
}

/// Spans of a processing instruction.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingInstructionSpans {
    pub outer: MarkupSpan,
    pub target: MarkupSpan,
    pub content: Option<MarkupSpan>,
}

/// Receiver of tokenizer callbacks.
///
/// Every callback gets the shared source buffer and the spans of the
/// construct. Tags are reported as a start callback, any number of
/// attribute and whitespace callbacks, then an end callback.
pub trait MarkupHandler {
    fn handle_document_start(&mut self) -> Result<(), ProcessingError>;

    fn handle_document_end(&mut self) -> Result<(), ProcessingError>;

    fn handle_text(&mut self, buffer: &Arc<str>, text: MarkupSpan) -> Result<(), ProcessingError>;

    fn handle_comment(
        &mut self,
        buffer: &Arc<str>,
        outer: MarkupSpan,
        content: MarkupSpan,
    ) -> Result<(), ProcessingError>;

    fn handle_cdata_section(
        &mut self,
        buffer: &Arc<str>,
        outer: MarkupSpan,
        content: MarkupSpan,
    ) -> Result<(), ProcessingError>;

    fn handle_doc_type(&mut self, buffer: &Arc<str>, spans: &DocTypeSpans) -> Result<(), ProcessingError>;

    fn handle_xml_declaration(
        &mut self,
        buffer: &Arc<str>,
        spans: &XmlDeclarationSpans,
    ) -> Result<(), ProcessingError>;

    fn handle_processing_instruction(
        &mut self,
        buffer: &Arc<str>,
        spans: &ProcessingInstructionSpans,
    ) -> Result<(), ProcessingError>;

    fn handle_open_element_start(&mut self, buffer: &Arc<str>, name: MarkupSpan) -> Result<(), ProcessingError>;

    fn handle_open_element_end(&mut self, buffer: &Arc<str>, name: MarkupSpan) -> Result<(), ProcessingError>;

    fn handle_standalone_element_start(
        &mut self,
        buffer: &Arc<str>,
        name: MarkupSpan,
    ) -> Result<(), ProcessingError>;

    fn handle_standalone_element_end(
        &mut self,
        buffer: &Arc<str>,
        name: MarkupSpan,
        minimized: bool,
    ) -> Result<(), ProcessingError>;

    fn handle_attribute(&mut self, buffer: &Arc<str>, spans: &AttributeSpans) -> Result<(), ProcessingError>;

    fn handle_inner_whitespace(&mut self, buffer: &Arc<str>, whitespace: MarkupSpan) -> Result<(), ProcessingError>;

    fn handle_close_element(&mut self, buffer: &Arc<str>, name: MarkupSpan) -> Result<(), ProcessingError>;
}

/// Byte offset to line/column translation.
struct Lines<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> Lines<'a> {
    fn new(source: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    fn location(&self, offset: usize) -> Location {
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line - 1];
        let col = self
            .source
            .get(line_start..offset)
            .map_or(1, |prefix| prefix.chars().count() + 1);
        Location::new(line, col)
    }

    fn span(&self, offset: usize, len: usize) -> MarkupSpan {
        let Location { line, col } = self.location(offset);
        MarkupSpan { offset, len, line, col }
    }

    fn range(&self, start: usize, end: usize) -> MarkupSpan {
        self.span(start, end - start)
    }
}

fn position(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}

fn skip_whitespace(source: &str, mut pos: usize, end: usize) -> usize {
    let bytes = source.as_bytes();
    while pos < end && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn skip_until(source: &str, mut pos: usize, end: usize, stop: impl Fn(u8) -> bool) -> usize {
    let bytes = source.as_bytes();
    while pos < end && !stop(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// Tokenizer for one template mode.
pub struct MarkupParser {
    template_mode: TemplateMode,
    element_definitions: Arc<ElementDefinitions>,
}

impl MarkupParser {
    #[must_use]
    pub fn new(template_mode: TemplateMode, element_definitions: Arc<ElementDefinitions>) -> Self {
        Self {
            template_mode,
            element_definitions,
        }
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    /// Tokenize `source`, reporting every construct to `handler` in order.
    pub fn parse(
        &self,
        template_name: &str,
        source: &Arc<str>,
        handler: &mut dyn MarkupHandler,
    ) -> Result<(), ProcessingError> {
        let mut scan = Scan {
            template_name,
            template_mode: self.template_mode,
            source,
            lines: Lines::new(source),
            handler,
        };
        scan.handler.handle_document_start()?;

        let mut base = 0;
        while let Some(resume) = self.parse_from(&mut scan, base)? {
            base = resume;
        }

        scan.handler.handle_document_end()
    }

    /// Parse from `base` until the end of the source, or until the content
    /// of a raw-text element was consumed manually. Returns where to resume.
    fn parse_from(&self, scan: &mut Scan<'_, '_>, base: usize) -> Result<Option<usize>, ProcessingError> {
        let buffer = Arc::clone(scan.source);
        let source: &str = &buffer;
        let mut reader = Reader::from_str(&source[base..]);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;
        config.expand_empty_elements = false;

        let mut pending_text: Option<usize> = None;
        loop {
            let start = base + position(reader.buffer_position());
            let event = reader.read_event().map_err(|err| {
                let offset = base + position(reader.error_position());
                ProcessingError::parse(scan.template_name, scan.lines.location(offset), err.to_string())
            })?;
            let end = base + position(reader.buffer_position());

            if matches!(event, Event::Text(_) | Event::GeneralRef(_)) {
                pending_text.get_or_insert(start);
                continue;
            }
            if let Some(text_start) = pending_text.take() {
                scan.text(text_start, start)?;
            }

            match event {
                Event::Eof => return Ok(None),
                Event::Comment(_) => scan.delimited(start, end, 4, 3, false)?,
                Event::CData(_) => scan.delimited(start, end, 9, 3, true)?,
                Event::DocType(_) => scan.doc_type(start, end)?,
                Event::Decl(_) => scan.xml_declaration(start, end)?,
                Event::PI(_) => scan.processing_instruction(start, end)?,
                Event::Empty(_) => {
                    scan.tag(start, end, true)?;
                }
                Event::Start(_) => {
                    let name = scan.tag(start, end, false)?;
                    if self.is_raw_text(&source[name.offset..name.end()])? {
                        return scan.raw_text(end, &source[name.offset..name.end()]).map(Some);
                    }
                }
                Event::End(_) => scan.close_tag(start, end)?,
                Event::Text(_) | Event::GeneralRef(_) => {}
            }
        }
    }

    fn is_raw_text(&self, name: &str) -> Result<bool, ProcessingError> {
        if !self.template_mode.is_html() {
            return Ok(false);
        }
        let definition = self.element_definitions.for_html_name(name)?;
        Ok(matches!(
            definition.element_type(),
            ElementType::RawText | ElementType::EscapableRawText
        ))
    }
}

/// Per-parse state: the source and the handler being fed.
struct Scan<'a, 'h> {
    template_name: &'a str,
    template_mode: TemplateMode,
    source: &'a Arc<str>,
    lines: Lines<'a>,
    handler: &'h mut dyn MarkupHandler,
}

impl Scan<'_, '_> {
    fn error(&self, offset: usize, message: &str) -> ProcessingError {
        ProcessingError::parse(self.template_name, self.lines.location(offset), message)
    }

    fn text(&mut self, start: usize, end: usize) -> Result<(), ProcessingError> {
        if start < end {
            let span = self.lines.range(start, end);
            self.handler.handle_text(self.source, span)?;
        }
        Ok(())
    }

    fn delimited(
        &mut self,
        start: usize,
        end: usize,
        prefix_len: usize,
        suffix_len: usize,
        cdata: bool,
    ) -> Result<(), ProcessingError> {
        let outer = self.lines.range(start, end);
        let content = self.lines.range(start + prefix_len, end - suffix_len);
        if cdata {
            self.handler.handle_cdata_section(self.source, outer, content)
        } else {
            self.handler.handle_comment(self.source, outer, content)
        }
    }

    /// Scan `<name attributes (/)?>` and report it. Returns the name span.
    fn tag(&mut self, start: usize, end: usize, standalone: bool) -> Result<MarkupSpan, ProcessingError> {
        let source: &str = self.source;
        let bytes = source.as_bytes();
        let minimized = source[start..end].ends_with("/>");
        let limit = if minimized { end - 2 } else { end - 1 };

        let name_end = skip_until(source, start + 1, limit, |b| b.is_ascii_whitespace() || b == b'/');
        if name_end == start + 1 {
            return Err(self.error(start, "Element name cannot be empty"));
        }
        let name = self.lines.range(start + 1, name_end);

        if standalone {
            self.handler.handle_standalone_element_start(self.source, name)?;
        } else {
            self.handler.handle_open_element_start(self.source, name)?;
        }

        let mut pos = name_end;
        while pos < limit {
            let whitespace_end = skip_whitespace(source, pos, limit);
            if whitespace_end > pos {
                let whitespace = self.lines.range(pos, whitespace_end);
                self.handler.handle_inner_whitespace(self.source, whitespace)?;
                pos = whitespace_end;
                continue;
            }
            // stray slash inside a non-minimized tag
            if bytes[pos] == b'/' {
                pos += 1;
                continue;
            }

            let attribute_end = skip_until(source, pos, limit, |b| b.is_ascii_whitespace() || b == b'=');
            let attribute_name = self.lines.range(pos, attribute_end);
            pos = attribute_end;

            let after_whitespace = skip_whitespace(source, pos, limit);
            if after_whitespace >= limit || bytes[after_whitespace] != b'=' {
                self.handler.handle_attribute(
                    self.source,
                    &AttributeSpans {
                        name: attribute_name,
                        operator: None,
                        value: None,
                        quotes: AttributeValueQuotes::Double,
                    },
                )?;
                continue;
            }

            let value_start = skip_whitespace(source, after_whitespace + 1, limit);
            let operator = self.lines.range(pos, value_start);
            let (value, quotes, value_end) = match bytes.get(value_start) {
                Some(&quote @ (b'"' | b'\'')) if value_start < limit => {
                    let close = skip_until(source, value_start + 1, limit, |b| b == quote);
                    if close >= limit {
                        return Err(self.error(value_start, "Unterminated attribute value"));
                    }
                    let quotes = if quote == b'"' {
                        AttributeValueQuotes::Double
                    } else {
                        AttributeValueQuotes::Single
                    };
                    (self.lines.range(value_start + 1, close), quotes, close + 1)
                }
                _ => {
                    if !self.template_mode.is_html() {
                        return Err(self.error(value_start, "Attribute values must be quoted"));
                    }
                    let value_end = skip_until(source, value_start, limit, |b| b.is_ascii_whitespace());
                    (
                        self.lines.range(value_start, value_end),
                        AttributeValueQuotes::None,
                        value_end,
                    )
                }
            };
            self.handler.handle_attribute(
                self.source,
                &AttributeSpans {
                    name: attribute_name,
                    operator: Some(operator),
                    value: Some(value),
                    quotes,
                },
            )?;
            pos = value_end;
        }

        if standalone {
            self.handler.handle_standalone_element_end(self.source, name, minimized)?;
        } else {
            self.handler.handle_open_element_end(self.source, name)?;
        }
        Ok(name)
    }

    fn close_tag(&mut self, start: usize, end: usize) -> Result<(), ProcessingError> {
        let name_end = skip_until(self.source, start + 2, end - 1, |b| b.is_ascii_whitespace());
        let name = self.lines.range(start + 2, name_end);
        self.handler.handle_close_element(self.source, name)
    }

    /// Consume raw-text content after an open tag ending at `from`, up to and
    /// including the close tag of `name`. Returns where parsing resumes.
    fn raw_text(&mut self, from: usize, name: &str) -> Result<usize, ProcessingError> {
        let buffer = Arc::clone(self.source);
        let source: &str = &buffer;
        let close = source[from..]
            .match_indices("</")
            .map(|(i, _)| from + i)
            .find(|&i| {
                let candidate = i + 2;
                source
                    .get(candidate..candidate + name.len())
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
                    && source
                        .as_bytes()
                        .get(candidate + name.len())
                        .is_some_and(|&b| b == b'>' || b.is_ascii_whitespace())
            });

        let Some(close) = close else {
            self.text(from, source.len())?;
            return Ok(source.len());
        };
        self.text(from, close)?;
        let close_end = source[close..]
            .find('>')
            .map_or(source.len(), |i| close + i + 1);
        let name_span = self.lines.span(close + 2, name.len());
        self.handler.handle_close_element(self.source, name_span)?;
        Ok(close_end)
    }

    fn doc_type(&mut self, start: usize, end: usize) -> Result<(), ProcessingError> {
        let source: &str = self.source;
        let bytes = source.as_bytes();
        let limit = end - 1;
        let outer = self.lines.range(start, end);
        let keyword = self.lines.span(start + 2, "DOCTYPE".len());

        let mut pos = skip_whitespace(source, keyword.end(), limit);
        let name_end = skip_until(source, pos, limit, |b| b.is_ascii_whitespace() || b == b'[');
        let element_name = self.lines.range(pos, name_end);
        pos = skip_whitespace(source, name_end, limit);

        let mut spans = DocTypeSpans {
            outer,
            keyword,
            element_name,
            doc_type_type: None,
            public_id: None,
            system_id: None,
            internal_subset: None,
        };

        if pos < limit && bytes[pos] != b'[' {
            let type_end = skip_until(source, pos, limit, |b| b.is_ascii_whitespace());
            let doc_type_type = self.lines.range(pos, type_end);
            let is_public = source[pos..type_end].eq_ignore_ascii_case("PUBLIC");
            spans.doc_type_type = Some(doc_type_type);
            pos = skip_whitespace(source, type_end, limit);

            let mut ids = Vec::with_capacity(2);
            while pos < limit && matches!(bytes[pos], b'"' | b'\'') {
                let quote = bytes[pos];
                let close = skip_until(source, pos + 1, limit, |b| b == quote);
                if close >= limit {
                    return Err(self.error(pos, "Unterminated DOCTYPE identifier"));
                }
                ids.push(self.lines.range(pos + 1, close));
                pos = skip_whitespace(source, close + 1, limit);
            }
            match (is_public, ids.as_slice()) {
                (true, [public]) => spans.public_id = Some(*public),
                (true, [public, system]) => {
                    spans.public_id = Some(*public);
                    spans.system_id = Some(*system);
                }
                (false, [system]) => spans.system_id = Some(*system),
                _ => {}
            }
        }

        if pos < limit && bytes[pos] == b'[' {
            let close = source[pos..limit].rfind(']').map_or(limit, |i| pos + i);
            spans.internal_subset = Some(self.lines.range(pos + 1, close));
        }

        self.handler.handle_doc_type(self.source, &spans)
    }

    /// Find `name="value"` inside a declaration and return the value span.
    fn pseudo_attribute(&self, start: usize, end: usize, name: &str) -> Option<MarkupSpan> {
        let source: &str = self.source;
        let mut from = start;
        while let Some(found) = source[from..end].find(name) {
            let name_start = from + found;
            from = name_start + name.len();
            let preceded_by_space = source.as_bytes()[name_start - 1].is_ascii_whitespace();
            let equals = skip_whitespace(source, from, end);
            if !preceded_by_space || source.as_bytes().get(equals) != Some(&b'=') {
                continue;
            }
            let quote_pos = skip_whitespace(source, equals + 1, end);
            let quote = *source.as_bytes().get(quote_pos)?;
            if quote != b'"' && quote != b'\'' {
                return None;
            }
            let close = skip_until(source, quote_pos + 1, end, |b| b == quote);
            return (close < end).then(|| self.lines.range(quote_pos + 1, close));
        }
        None
    }

    fn xml_declaration(&mut self, start: usize, end: usize) -> Result<(), ProcessingError> {
        let limit = end - 2;
        let spans = XmlDeclarationSpans {
            outer: self.lines.range(start, end),
            keyword: self.lines.span(start + 2, 3),
            version: self.pseudo_attribute(start + 5, limit, "version"),
            encoding: self.pseudo_attribute(start + 5, limit, "encoding"),
            standalone: self.pseudo_attribute(start + 5, limit, "standalone"),
        };
        self.handler.handle_xml_declaration(self.source, &spans)
    }

    fn processing_instruction(&mut self, start: usize, end: usize) -> Result<(), ProcessingError> {
        let limit = end - 2;
        let target_end = skip_until(self.source, start + 2, limit, |b| b.is_ascii_whitespace());
        let content_start = skip_whitespace(self.source, target_end, limit);
        let spans = ProcessingInstructionSpans {
            outer: self.lines.range(start, end),
            target: self.lines.range(start + 2, target_end),
            content: (content_start < limit).then(|| self.lines.range(content_start, limit)),
        };
        self.handler.handle_processing_instruction(self.source, &spans)
    }
}
