//! Output handler: writes every event it receives.

use std::fmt::Display;
use std::io::Write;

use weft_markup::Location;
use weft_markup::event::{
    AutoCloseElementTag, AutoOpenElementTag, CdataSection, CloseElementTag, Comment, DocType,
    OpenElementTag, ProcessingInstruction, StandaloneElementTag, Text, UnmatchedCloseElementTag,
    XmlDeclaration,
};

use crate::error::ProcessingError;
use crate::handler::TemplateHandler;

/// Last handler of the chain, serializing events to a writer.
///
/// Auto-balanced tags are skipped: they were never part of the source.
pub struct OutputTemplateHandler<'w> {
    template_name: String,
    writer: &'w mut dyn Write,
}

impl<'w> OutputTemplateHandler<'w> {
    pub fn new(template_name: &str, writer: &'w mut dyn Write) -> Self {
        Self {
            template_name: template_name.to_owned(),
            writer,
        }
    }

    fn write(&mut self, event: &dyn Display, location: Option<Location>) -> Result<(), ProcessingError> {
        write!(self.writer, "{event}")
            .map_err(|source| ProcessingError::output(&self.template_name, location, source))
    }
}

impl TemplateHandler for OutputTemplateHandler<'_> {
    fn handle_template_end(&mut self) -> Result<(), ProcessingError> {
        self.writer
            .flush()
            .map_err(|source| ProcessingError::output(&self.template_name, None, source))
    }

    fn handle_text(&mut self, text: &mut Text) -> Result<(), ProcessingError> {
        self.write(text, text.location())
    }

    fn handle_comment(&mut self, comment: &mut Comment) -> Result<(), ProcessingError> {
        self.write(comment, comment.location())
    }

    fn handle_cdata_section(&mut self, cdata_section: &mut CdataSection) -> Result<(), ProcessingError> {
        self.write(cdata_section, cdata_section.location())
    }

    fn handle_doc_type(&mut self, doc_type: &mut DocType) -> Result<(), ProcessingError> {
        self.write(doc_type, doc_type.location())
    }

    fn handle_xml_declaration(&mut self, xml_declaration: &mut XmlDeclaration) -> Result<(), ProcessingError> {
        self.write(xml_declaration, xml_declaration.location())
    }

    fn handle_processing_instruction(
        &mut self,
        processing_instruction: &mut ProcessingInstruction,
    ) -> Result<(), ProcessingError> {
        self.write(processing_instruction, processing_instruction.location())
    }

    fn handle_open_element(&mut self, tag: &mut OpenElementTag) -> Result<(), ProcessingError> {
        self.write(tag, tag.location())
    }

    fn handle_standalone_element(&mut self, tag: &mut StandaloneElementTag) -> Result<(), ProcessingError> {
        self.write(tag, tag.location())
    }

    fn handle_close_element(&mut self, tag: &mut CloseElementTag) -> Result<(), ProcessingError> {
        self.write(tag, tag.location())
    }

    fn handle_auto_open_element(&mut self, _tag: &mut AutoOpenElementTag) -> Result<(), ProcessingError> {
        Ok(())
    }

    fn handle_auto_close_element(&mut self, _tag: &mut AutoCloseElementTag) -> Result<(), ProcessingError> {
        Ok(())
    }

    fn handle_unmatched_close_element(
        &mut self,
        tag: &mut UnmatchedCloseElementTag,
    ) -> Result<(), ProcessingError> {
        self.write(tag, tag.location())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_literal_forms() {
        let mut out = Vec::new();
        {
            let mut handler = OutputTemplateHandler::new("t", &mut out);
            handler.handle_doc_type(&mut DocType::html5()).unwrap();
            handler.handle_comment(&mut Comment::new("hi")).unwrap();
            handler.handle_text(&mut Text::new("text")).unwrap();
            handler.handle_template_end().unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "<!DOCTYPE html><!--hi-->text");
    }

    #[test]
    fn test_write_error_carries_template_and_location() {
        let mut writer = FailingWriter;
        let mut handler = OutputTemplateHandler::new("page", &mut writer);
        let buffer: std::sync::Arc<str> = std::sync::Arc::from("abc");
        let mut text = Text::from_buffer(&buffer, 0, 3, Some(Location::new(2, 9))).unwrap();
        match handler.handle_text(&mut text) {
            Err(ProcessingError::Output { template, line, col, .. }) => {
                assert_eq!((template.as_str(), line, col), ("page", 2, 9));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
