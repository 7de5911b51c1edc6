use std::cell::OnceCell;
use std::fmt;

use super::Location;
use crate::error::MarkupError;

const KEYWORD: &str = "xml";

/// Fields of an XML declaration as written in a source buffer.
#[derive(Debug, Clone, Copy)]
pub struct XmlDeclarationParts<'a> {
    /// The whole declaration, `<?` and `?>` included.
    pub xml_declaration: &'a str,
    pub keyword: &'a str,
    pub version: &'a str,
    pub encoding: Option<&'a str>,
    pub standalone: Option<&'a str>,
}

/// An XML declaration (`<?xml version="1.0"?>`).
#[derive(Debug, Clone)]
pub struct XmlDeclaration {
    keyword: String,
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
    xml_declaration: OnceCell<String>,
    location: Option<Location>,
}

fn validate(
    keyword: &str,
    version: &str,
    standalone: Option<&str>,
) -> Result<(), MarkupError> {
    if keyword != KEYWORD {
        return Err(MarkupError::invalid_argument(format!(
            "XML declaration keyword must be \"{KEYWORD}\", got \"{keyword}\""
        )));
    }
    if version.trim().is_empty() {
        return Err(MarkupError::invalid_argument("XML declaration version cannot be empty"));
    }
    if let Some(standalone) = standalone
        && standalone != "yes"
        && standalone != "no"
    {
        return Err(MarkupError::invalid_argument(format!(
            "XML declaration standalone must be \"yes\" or \"no\", got \"{standalone}\""
        )));
    }
    Ok(())
}

impl XmlDeclaration {
    pub fn new(
        version: &str,
        encoding: Option<&str>,
        standalone: Option<&str>,
    ) -> Result<Self, MarkupError> {
        validate(KEYWORD, version, standalone)?;
        Ok(Self {
            keyword: KEYWORD.to_owned(),
            version: version.to_owned(),
            encoding: encoding.map(str::to_owned),
            standalone: standalone.map(str::to_owned),
            xml_declaration: OnceCell::new(),
            location: None,
        })
    }

    /// Keep a parsed declaration as written.
    pub fn from_parts(
        parts: &XmlDeclarationParts<'_>,
        location: Option<Location>,
    ) -> Result<Self, MarkupError> {
        validate(parts.keyword, parts.version, parts.standalone)?;
        Ok(Self {
            keyword: parts.keyword.to_owned(),
            version: parts.version.to_owned(),
            encoding: parts.encoding.map(str::to_owned),
            standalone: parts.standalone.map(str::to_owned),
            xml_declaration: OnceCell::from(parts.xml_declaration.to_owned()),
            location,
        })
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    #[must_use]
    pub fn standalone(&self) -> Option<&str> {
        self.standalone.as_deref()
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// The full declaration.
    #[must_use]
    pub fn xml_declaration(&self) -> &str {
        self.xml_declaration.get_or_init(|| {
            let mut out = format!("<?{} version=\"{}\"", self.keyword, self.version);
            if let Some(encoding) = &self.encoding {
                out.push_str(&format!(" encoding=\"{encoding}\""));
            }
            if let Some(standalone) = &self.standalone {
                out.push_str(&format!(" standalone=\"{standalone}\""));
            }
            out.push_str("?>");
            out
        })
    }

    pub fn set_version(&mut self, version: &str) -> Result<(), MarkupError> {
        validate(&self.keyword, version, self.standalone.as_deref())?;
        version.clone_into(&mut self.version);
        self.xml_declaration.take();
        Ok(())
    }

    pub fn set_encoding(&mut self, encoding: Option<&str>) {
        self.encoding = encoding.map(str::to_owned);
        self.xml_declaration.take();
    }

    pub fn set_standalone(&mut self, standalone: Option<&str>) -> Result<(), MarkupError> {
        validate(&self.keyword, &self.version, standalone)?;
        self.standalone = standalone.map(str::to_owned);
        self.xml_declaration.take();
        Ok(())
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            keyword: KEYWORD.to_owned(),
            version: "1.0".to_owned(),
            encoding: None,
            standalone: None,
            xml_declaration: OnceCell::new(),
            location: None,
        }
    }
}

impl PartialEq for XmlDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.xml_declaration() == other.xml_declaration() && self.location == other.location
    }
}

impl fmt::Display for XmlDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xml_declaration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_all_fields() {
        let declaration = XmlDeclaration::new("1.0", Some("UTF-8"), Some("yes")).unwrap();
        assert_eq!(
            declaration.to_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"
        );
    }

    #[test]
    fn test_validation() {
        assert!(XmlDeclaration::new("", None, None).is_err());
        assert!(XmlDeclaration::new("1.0", None, Some("maybe")).is_err());
        let parts = XmlDeclarationParts {
            xml_declaration: "<?XML version=\"1.0\"?>",
            keyword: "XML",
            version: "1.0",
            encoding: None,
            standalone: None,
        };
        assert!(matches!(
            XmlDeclaration::from_parts(&parts, None),
            Err(MarkupError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parsed_form_kept_until_modified() {
        let source = "<?xml version='1.1'   encoding='ISO-8859-1'?>";
        let parts = XmlDeclarationParts {
            xml_declaration: source,
            keyword: "xml",
            version: "1.1",
            encoding: Some("ISO-8859-1"),
            standalone: None,
        };
        let mut declaration = XmlDeclaration::from_parts(&parts, None).unwrap();
        assert_eq!(declaration.to_string(), source);
        declaration.set_encoding(Some("UTF-8"));
        assert_eq!(
            declaration.to_string(),
            "<?xml version=\"1.1\" encoding=\"UTF-8\"?>"
        );
    }

    #[test]
    fn test_reset_as_clone_of() {
        let original = XmlDeclaration::new("1.0", Some("UTF-8"), None).unwrap();
        let mut pooled = XmlDeclaration::default();
        pooled.reset_as_clone_of(&original);
        assert_eq!(pooled, original);
        assert_eq!(pooled.encoding(), Some("UTF-8"));
    }
}
