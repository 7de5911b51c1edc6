use std::cell::OnceCell;
use std::fmt;

use super::Location;
use crate::error::MarkupError;

/// A processing instruction (`<?target content?>`).
#[derive(Debug, Clone)]
pub struct ProcessingInstruction {
    target: String,
    content: Option<String>,
    processing_instruction: OnceCell<String>,
    location: Option<Location>,
}

fn validate_target(target: &str) -> Result<(), MarkupError> {
    if target.trim().is_empty() {
        return Err(MarkupError::invalid_argument(
            "Processing instruction target cannot be empty",
        ));
    }
    if target.eq_ignore_ascii_case("xml") {
        return Err(MarkupError::invalid_argument(
            "Processing instruction target cannot be \"xml\"",
        ));
    }
    Ok(())
}

impl ProcessingInstruction {
    pub fn new(target: &str, content: Option<&str>) -> Result<Self, MarkupError> {
        validate_target(target)?;
        Ok(Self {
            target: target.to_owned(),
            content: content.map(str::to_owned),
            processing_instruction: OnceCell::new(),
            location: None,
        })
    }

    /// Keep a parsed instruction as written.
    pub fn from_parts(
        processing_instruction: &str,
        target: &str,
        content: Option<&str>,
        location: Option<Location>,
    ) -> Result<Self, MarkupError> {
        validate_target(target)?;
        Ok(Self {
            target: target.to_owned(),
            content: content.map(str::to_owned),
            processing_instruction: OnceCell::from(processing_instruction.to_owned()),
            location,
        })
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// The full instruction.
    #[must_use]
    pub fn processing_instruction(&self) -> &str {
        self.processing_instruction.get_or_init(|| match &self.content {
            Some(content) => format!("<?{} {content}?>", self.target),
            None => format!("<?{}?>", self.target),
        })
    }

    pub fn set_target(&mut self, target: &str) -> Result<(), MarkupError> {
        validate_target(target)?;
        target.clone_into(&mut self.target);
        self.processing_instruction.take();
        Ok(())
    }

    pub fn set_content(&mut self, content: Option<&str>) {
        self.content = content.map(str::to_owned);
        self.processing_instruction.take();
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }
}

impl PartialEq for ProcessingInstruction {
    fn eq(&self, other: &Self) -> bool {
        self.processing_instruction() == other.processing_instruction()
            && self.location == other.location
    }
}

impl fmt::Display for ProcessingInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.processing_instruction())
    }
}
