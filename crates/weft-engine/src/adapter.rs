//! Tokenizer-to-event adapter.
//!
//! Turns [`MarkupHandler`] callbacks into [`TemplateEvent`](weft_markup::TemplateEvent)s
//! and feeds them to a handler chain. Names are resolved through the shared
//! definition registries, and elements are balanced:
//!
//! - a close tag closes every element opened after its matching open tag,
//!   emitting auto-close tags for them
//! - a close tag without an open tag becomes an unmatched close tag
//! - elements still open at the end of the document are auto-closed
//! - HTML void elements become non-minimized standalone tags
//! - an HTML `<tr>` directly inside `<table>` gets an auto-opened `<tbody>`

use std::sync::Arc;

use weft_markup::event::{
    AutoCloseElementTag, AutoOpenElementTag, CdataSection, CloseElementTag, Comment, DocType,
    DocTypeParts, ElementAttributes, ElementTag, OpenElementTag, ProcessableTag,
    ProcessingInstruction, StandaloneElementTag, Text, UnmatchedCloseElementTag, XmlDeclaration,
    XmlDeclarationParts,
};
use weft_markup::{
    AttributeDefinitions, ElementDefinition, ElementDefinitions, Location, MarkupError, TemplateMode,
};

use crate::error::ProcessingError;
use crate::handler::TemplateHandler;
use crate::parser::{
    AttributeSpans, DocTypeSpans, MarkupHandler, MarkupSpan, ProcessingInstructionSpans,
    XmlDeclarationSpans,
};

fn slice(buffer: &str, span: MarkupSpan) -> &str {
    &buffer[span.offset..span.end()]
}

/// An open tag whose attributes are still being reported.
struct PendingTag {
    definition: Arc<ElementDefinition>,
    name: String,
    attributes: ElementAttributes,
    location: Location,
}

/// An element waiting for its close tag.
struct OpenElement {
    definition: Arc<ElementDefinition>,
    name: String,
}

pub struct TemplateHandlerAdapter<'h> {
    template_name: String,
    template_mode: TemplateMode,
    element_definitions: Arc<ElementDefinitions>,
    attribute_definitions: Arc<AttributeDefinitions>,
    handler: &'h mut dyn TemplateHandler,
    pending: Option<PendingTag>,
    open_elements: Vec<OpenElement>,
}

impl<'h> TemplateHandlerAdapter<'h> {
    pub fn new(
        template_name: &str,
        template_mode: TemplateMode,
        element_definitions: Arc<ElementDefinitions>,
        attribute_definitions: Arc<AttributeDefinitions>,
        handler: &'h mut dyn TemplateHandler,
    ) -> Self {
        Self {
            template_name: template_name.to_owned(),
            template_mode,
            element_definitions,
            attribute_definitions,
            handler,
            pending: None,
            open_elements: Vec::new(),
        }
    }

    /// Attach a source location to a construction error.
    fn malformed(&self, location: Location, err: &MarkupError) -> ProcessingError {
        ProcessingError::parse(&self.template_name, location, err.to_string())
    }

    fn start_tag(&mut self, buffer: &Arc<str>, name: MarkupSpan) -> Result<(), ProcessingError> {
        let definition = self
            .element_definitions
            .for_buffer(self.template_mode, buffer, name.offset, name.len)
            .map_err(|err| self.malformed(name.location(), &err))?;
        self.pending = Some(PendingTag {
            definition,
            name: slice(buffer, name).to_owned(),
            attributes: ElementAttributes::new(self.template_mode, Arc::clone(&self.attribute_definitions)),
            location: name.location(),
        });
        Ok(())
    }

    fn finish_tag(&mut self, name: MarkupSpan) -> Result<ProcessableTag, ProcessingError> {
        let Some(pending) = self.pending.take() else {
            return Err(ProcessingError::parse(
                &self.template_name,
                name.location(),
                "Tag end reported without a tag start",
            ));
        };
        Ok(ProcessableTag::new(
            pending.definition,
            &pending.name,
            pending.attributes,
            Some(pending.location),
        ))
    }

    fn pending_attributes(&mut self, location: Location) -> Result<&mut ElementAttributes, ProcessingError> {
        match self.pending.as_mut() {
            Some(pending) => Ok(&mut pending.attributes),
            None => Err(ProcessingError::parse(
                &self.template_name,
                location,
                "Attribute reported outside of a tag",
            )),
        }
    }

    fn auto_open_tbody(&mut self, tag: &ProcessableTag) -> Result<(), ProcessingError> {
        let inside_table = self
            .open_elements
            .last()
            .is_some_and(|parent| parent.definition.name().complete_name() == "table");
        if !self.template_mode.is_html() || !inside_table || tag.name().complete_name() != "tr" {
            return Ok(());
        }

        let definition = self.element_definitions.for_html_name("tbody")?;
        let attributes = ElementAttributes::new(self.template_mode, Arc::clone(&self.attribute_definitions));
        let mut auto_open = AutoOpenElementTag::new(ProcessableTag::new(
            Arc::clone(&definition),
            "tbody",
            attributes,
            tag.location(),
        ));
        self.open_elements.push(OpenElement {
            definition,
            name: "tbody".to_owned(),
        });
        self.handler.handle_auto_open_element(&mut auto_open)
    }

    /// Auto-close the innermost open element.
    fn auto_close(&mut self, location: Option<Location>) -> Result<(), ProcessingError> {
        if let Some(open) = self.open_elements.pop() {
            let mut tag = AutoCloseElementTag::new(ElementTag::new(open.definition, &open.name, location));
            self.handler.handle_auto_close_element(&mut tag)?;
        }
        Ok(())
    }
}

impl MarkupHandler for TemplateHandlerAdapter<'_> {
    fn handle_document_start(&mut self) -> Result<(), ProcessingError> {
        self.open_elements.clear();
        self.handler.handle_template_start()
    }

    fn handle_document_end(&mut self) -> Result<(), ProcessingError> {
        while !self.open_elements.is_empty() {
            self.auto_close(None)?;
        }
        self.handler.handle_template_end()
    }

    fn handle_text(&mut self, buffer: &Arc<str>, text: MarkupSpan) -> Result<(), ProcessingError> {
        let mut event = Text::from_buffer(buffer, text.offset, text.len, Some(text.location()))
            .map_err(|err| self.malformed(text.location(), &err))?;
        self.handler.handle_text(&mut event)
    }

    fn handle_comment(
        &mut self,
        buffer: &Arc<str>,
        outer: MarkupSpan,
        content: MarkupSpan,
    ) -> Result<(), ProcessingError> {
        let mut event = Comment::from_buffer(
            buffer,
            outer.offset,
            outer.len,
            content.offset,
            content.len,
            Some(outer.location()),
        )
        .map_err(|err| self.malformed(outer.location(), &err))?;
        self.handler.handle_comment(&mut event)
    }

    fn handle_cdata_section(
        &mut self,
        buffer: &Arc<str>,
        outer: MarkupSpan,
        content: MarkupSpan,
    ) -> Result<(), ProcessingError> {
        let mut event = CdataSection::from_buffer(
            buffer,
            outer.offset,
            outer.len,
            content.offset,
            content.len,
            Some(outer.location()),
        )
        .map_err(|err| self.malformed(outer.location(), &err))?;
        self.handler.handle_cdata_section(&mut event)
    }

    fn handle_doc_type(&mut self, buffer: &Arc<str>, spans: &DocTypeSpans) -> Result<(), ProcessingError> {
        let optional = |span: Option<MarkupSpan>| span.map(|s| slice(buffer, s));
        let parts = DocTypeParts {
            doc_type: slice(buffer, spans.outer),
            keyword: slice(buffer, spans.keyword),
            element_name: slice(buffer, spans.element_name),
            doc_type_type: optional(spans.doc_type_type),
            public_id: optional(spans.public_id),
            system_id: optional(spans.system_id),
            internal_subset: optional(spans.internal_subset),
        };
        let mut event = DocType::from_parts(&parts, Some(spans.outer.location()));
        self.handler.handle_doc_type(&mut event)
    }

    fn handle_xml_declaration(
        &mut self,
        buffer: &Arc<str>,
        spans: &XmlDeclarationSpans,
    ) -> Result<(), ProcessingError> {
        let optional = |span: Option<MarkupSpan>| span.map(|s| slice(buffer, s));
        let parts = XmlDeclarationParts {
            xml_declaration: slice(buffer, spans.outer),
            keyword: slice(buffer, spans.keyword),
            version: optional(spans.version).unwrap_or_default(),
            encoding: optional(spans.encoding),
            standalone: optional(spans.standalone),
        };
        let mut event = XmlDeclaration::from_parts(&parts, Some(spans.outer.location()))
            .map_err(|err| self.malformed(spans.outer.location(), &err))?;
        self.handler.handle_xml_declaration(&mut event)
    }

    fn handle_processing_instruction(
        &mut self,
        buffer: &Arc<str>,
        spans: &ProcessingInstructionSpans,
    ) -> Result<(), ProcessingError> {
        let mut event = ProcessingInstruction::from_parts(
            slice(buffer, spans.outer),
            slice(buffer, spans.target),
            spans.content.map(|s| slice(buffer, s)),
            Some(spans.outer.location()),
        )
        .map_err(|err| self.malformed(spans.outer.location(), &err))?;
        self.handler.handle_processing_instruction(&mut event)
    }

    fn handle_open_element_start(&mut self, buffer: &Arc<str>, name: MarkupSpan) -> Result<(), ProcessingError> {
        self.start_tag(buffer, name)
    }

    fn handle_open_element_end(&mut self, _buffer: &Arc<str>, name: MarkupSpan) -> Result<(), ProcessingError> {
        let tag = self.finish_tag(name)?;
        if self.template_mode.is_html() && tag.element_definition().element_type().is_void() {
            let mut standalone = StandaloneElementTag::new(tag, false);
            return self.handler.handle_standalone_element(&mut standalone);
        }

        self.auto_open_tbody(&tag)?;
        self.open_elements.push(OpenElement {
            definition: Arc::clone(tag.element_definition()),
            name: tag.element_name().to_owned(),
        });
        let mut open = OpenElementTag::new(tag);
        self.handler.handle_open_element(&mut open)
    }

    fn handle_standalone_element_start(
        &mut self,
        buffer: &Arc<str>,
        name: MarkupSpan,
    ) -> Result<(), ProcessingError> {
        self.start_tag(buffer, name)
    }

    fn handle_standalone_element_end(
        &mut self,
        _buffer: &Arc<str>,
        name: MarkupSpan,
        minimized: bool,
    ) -> Result<(), ProcessingError> {
        let tag = self.finish_tag(name)?;
        let mut standalone = StandaloneElementTag::new(tag, minimized);
        self.handler.handle_standalone_element(&mut standalone)
    }

    fn handle_attribute(&mut self, buffer: &Arc<str>, spans: &AttributeSpans) -> Result<(), ProcessingError> {
        let location = spans.name.location();
        let definition = self
            .attribute_definitions
            .for_buffer(self.template_mode, buffer, spans.name.offset, spans.name.len)
            .map_err(|err| self.malformed(location, &err))?;
        self.pending_attributes(location)?.add_parsed_attribute(
            definition,
            slice(buffer, spans.name),
            spans.operator.map(|s| slice(buffer, s)),
            spans.value.map(|s| slice(buffer, s)),
            spans.quotes,
            Some(location),
        );
        Ok(())
    }

    fn handle_inner_whitespace(&mut self, buffer: &Arc<str>, whitespace: MarkupSpan) -> Result<(), ProcessingError> {
        self.pending_attributes(whitespace.location())?
            .add_inner_whitespace(slice(buffer, whitespace));
        Ok(())
    }

    fn handle_close_element(&mut self, buffer: &Arc<str>, name: MarkupSpan) -> Result<(), ProcessingError> {
        let location = Some(name.location());
        let definition = self
            .element_definitions
            .for_buffer(self.template_mode, buffer, name.offset, name.len)
            .map_err(|err| self.malformed(name.location(), &err))?;
        let tag = ElementTag::new(Arc::clone(&definition), slice(buffer, name), location);

        let matching = self
            .open_elements
            .iter()
            .rposition(|open| Arc::ptr_eq(&open.definition, &definition));
        let Some(index) = matching else {
            let mut unmatched = UnmatchedCloseElementTag::new(tag);
            return self.handler.handle_unmatched_close_element(&mut unmatched);
        };

        while self.open_elements.len() > index + 1 {
            self.auto_close(location)?;
        }
        self.open_elements.pop();
        let mut close = CloseElementTag::new(tag);
        self.handler.handle_close_element(&mut close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CollectingHandler;
    use crate::parser::MarkupParser;
    use pretty_assertions::assert_eq;
    use weft_markup::TemplateEvent;

    fn events(mode: TemplateMode, source: &str) -> Vec<TemplateEvent> {
        let elements = Arc::new(ElementDefinitions::new(&[]).unwrap());
        let attributes = Arc::new(AttributeDefinitions::new(&[]).unwrap());
        let mut collector = CollectingHandler::new();
        {
            let mut adapter =
                TemplateHandlerAdapter::new("test", mode, Arc::clone(&elements), attributes, &mut collector);
            MarkupParser::new(mode, elements)
                .parse("test", &Arc::from(source), &mut adapter)
                .unwrap();
        }
        collector.into_events()
    }

    /// Event kinds, with names for tags.
    fn kinds(events: &[TemplateEvent]) -> Vec<String> {
        events
            .iter()
            .map(|event| match event {
                TemplateEvent::Text(t) => format!("text:{}", t.text()),
                TemplateEvent::OpenElement(t) => format!("open:{}", t.element_name()),
                TemplateEvent::StandaloneElement(t) => format!("standalone:{}", t.element_name()),
                TemplateEvent::CloseElement(t) => format!("close:{}", t.element_name()),
                TemplateEvent::AutoOpenElement(t) => format!("auto-open:{}", t.element_name()),
                TemplateEvent::AutoCloseElement(t) => format!("auto-close:{}", t.element_name()),
                TemplateEvent::UnmatchedCloseElement(t) => format!("unmatched:{}", t.element_name()),
                other => other.to_string(),
            })
            .collect()
    }

    fn render(events: &[TemplateEvent]) -> String {
        events.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_round_trips_source_exactly() {
        let source = "<!DOCTYPE html>\n<html lang=en>\n<body class='x'  hidden>\n<!-- c --><p>a &amp; b<br>\n<img src=\"a.png\" /></p></body></html>";
        assert_eq!(render(&events(TemplateMode::Html, source)), source);
    }

    #[test]
    fn test_xml_round_trip() {
        let source = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<?style href=\"s.css\"?><r a=\"1\"><![CDATA[<x>]]><e/></r>";
        assert_eq!(render(&events(TemplateMode::Xml, source)), source);
    }

    #[test]
    fn test_void_elements_become_standalone() {
        let kinds = kinds(&events(TemplateMode::Html, "<p><br><input/></p>"));
        assert_eq!(kinds, ["open:p", "standalone:br", "standalone:input", "close:p"]);
    }

    #[test]
    fn test_close_tag_auto_closes_unclosed_children() {
        let kinds = kinds(&events(TemplateMode::Html, "<div><span><em>x</div>"));
        assert_eq!(
            kinds,
            ["open:div", "open:span", "open:em", "text:x", "auto-close:em", "auto-close:span", "close:div"]
        );
    }

    #[test]
    fn test_unmatched_close_and_document_end() {
        let events = events(TemplateMode::Html, "</b><ul><li>x");
        assert_eq!(kinds(&events), ["unmatched:b", "open:ul", "open:li", "text:x", "auto-close:li", "auto-close:ul"]);
        // auto-close tags render nothing, unmatched close tags are kept
        assert_eq!(render(&events), "</b><ul><li>x");
    }

    #[test]
    fn test_html_close_tags_match_case_insensitively() {
        let kinds = kinds(&events(TemplateMode::Html, "<DIV>x</div>"));
        assert_eq!(kinds, ["open:DIV", "text:x", "close:div"]);
    }

    #[test]
    fn test_xml_close_tags_are_case_sensitive() {
        let kinds = kinds(&events(TemplateMode::Xml, "<a>x</A></a>"));
        assert_eq!(kinds, ["open:a", "text:x", "unmatched:A", "close:a"]);
    }

    #[test]
    fn test_tbody_auto_opened_for_rows() {
        let events = events(TemplateMode::Html, "<table><tr><td>1</td></tr></table>");
        assert_eq!(
            kinds(&events),
            [
                "open:table",
                "auto-open:tbody",
                "open:tr",
                "open:td",
                "text:1",
                "close:td",
                "close:tr",
                "auto-close:tbody",
                "close:table",
            ]
        );
        assert_eq!(render(&events), "<table><tr><td>1</td></tr></table>");
    }

    #[test]
    fn test_attributes_keep_locations_and_quotes() {
        let events = events(TemplateMode::Html, "<a\n  href='x'>y</a>");
        let TemplateEvent::OpenElement(tag) = &events[0] else {
            panic!("expected an open tag, got {:?}", events[0]);
        };
        let href = tag.attributes().attribute("href").unwrap();
        assert_eq!(href.location(), Some(Location::new(2, 3)));
        assert_eq!(href.value(), Some("x"));
    }

    #[test]
    fn test_invalid_xml_declaration_reports_location() {
        let elements = Arc::new(ElementDefinitions::new(&[]).unwrap());
        let attributes = Arc::new(AttributeDefinitions::new(&[]).unwrap());
        let mut collector = CollectingHandler::new();
        let mut adapter = TemplateHandlerAdapter::new(
            "bad",
            TemplateMode::Xml,
            Arc::clone(&elements),
            attributes,
            &mut collector,
        );
        let err = MarkupParser::new(TemplateMode::Xml, elements)
            .parse("bad", &Arc::from("<?xml encoding=\"UTF-8\"?><r/>"), &mut adapter)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Parse { line: 1, col: 1, .. }), "{err}");
    }
}
