//! Standard HTML vocabularies.
//!
//! These seed the lock-free partition of the HTML definition repositories.

use crate::definition::ElementType;

/// Standard HTML elements and their content models.
pub(crate) const HTML_ELEMENTS: &[(&str, ElementType)] = &[
    ("html", ElementType::Normal),
    ("head", ElementType::Normal),
    ("title", ElementType::EscapableRawText),
    ("base", ElementType::Void),
    ("link", ElementType::Void),
    ("meta", ElementType::Void),
    ("style", ElementType::RawText),
    ("script", ElementType::RawText),
    ("noscript", ElementType::Normal),
    ("body", ElementType::Normal),
    ("article", ElementType::Normal),
    ("section", ElementType::Normal),
    ("nav", ElementType::Normal),
    ("aside", ElementType::Normal),
    ("h1", ElementType::Normal),
    ("h2", ElementType::Normal),
    ("h3", ElementType::Normal),
    ("h4", ElementType::Normal),
    ("h5", ElementType::Normal),
    ("h6", ElementType::Normal),
    ("hgroup", ElementType::Normal),
    ("header", ElementType::Normal),
    ("footer", ElementType::Normal),
    ("address", ElementType::Normal),
    ("main", ElementType::Normal),
    ("p", ElementType::Normal),
    ("hr", ElementType::Void),
    ("pre", ElementType::Normal),
    ("blockquote", ElementType::Normal),
    ("ol", ElementType::Normal),
    ("ul", ElementType::Normal),
    ("li", ElementType::Normal),
    ("dl", ElementType::Normal),
    ("dt", ElementType::Normal),
    ("dd", ElementType::Normal),
    ("figure", ElementType::Normal),
    ("figcaption", ElementType::Normal),
    ("div", ElementType::Normal),
    ("a", ElementType::Normal),
    ("em", ElementType::Normal),
    ("strong", ElementType::Normal),
    ("small", ElementType::Normal),
    ("s", ElementType::Normal),
    ("cite", ElementType::Normal),
    ("g", ElementType::Normal),
    ("dfn", ElementType::Normal),
    ("abbr", ElementType::Normal),
    ("time", ElementType::Normal),
    ("code", ElementType::Normal),
    ("var", ElementType::Normal),
    ("samp", ElementType::Normal),
    ("kbd", ElementType::Normal),
    ("sub", ElementType::Normal),
    ("sup", ElementType::Normal),
    ("i", ElementType::Normal),
    ("b", ElementType::Normal),
    ("u", ElementType::Normal),
    ("mark", ElementType::Normal),
    ("ruby", ElementType::Normal),
    ("rb", ElementType::Normal),
    ("rt", ElementType::Normal),
    ("rtc", ElementType::Normal),
    ("rp", ElementType::Normal),
    ("bdi", ElementType::Normal),
    ("bdo", ElementType::Normal),
    ("br", ElementType::Void),
    ("wbr", ElementType::Void),
    ("span", ElementType::Normal),
    ("ins", ElementType::Normal),
    ("del", ElementType::Normal),
    ("img", ElementType::Void),
    ("iframe", ElementType::Normal),
    ("embed", ElementType::Void),
    ("object", ElementType::Normal),
    ("param", ElementType::Void),
    ("video", ElementType::Normal),
    ("audio", ElementType::Normal),
    ("source", ElementType::Void),
    ("track", ElementType::Void),
    ("canvas", ElementType::Normal),
    ("map", ElementType::Normal),
    ("area", ElementType::Void),
    ("table", ElementType::Normal),
    ("caption", ElementType::Normal),
    ("colgroup", ElementType::Normal),
    ("col", ElementType::Void),
    ("tbody", ElementType::Normal),
    ("thead", ElementType::Normal),
    ("tfoot", ElementType::Normal),
    ("tr", ElementType::Normal),
    ("td", ElementType::Normal),
    ("th", ElementType::Normal),
    ("form", ElementType::Normal),
    ("fieldset", ElementType::Normal),
    ("legend", ElementType::Normal),
    ("label", ElementType::Normal),
    ("input", ElementType::Void),
    ("button", ElementType::Normal),
    ("select", ElementType::Normal),
    ("datalist", ElementType::Normal),
    ("optgroup", ElementType::Normal),
    ("option", ElementType::Normal),
    ("textarea", ElementType::EscapableRawText),
    ("keygen", ElementType::Void),
    ("output", ElementType::Normal),
    ("progress", ElementType::Normal),
    ("meter", ElementType::Normal),
    ("details", ElementType::Normal),
    ("summary", ElementType::Normal),
    ("command", ElementType::Normal),
    ("menu", ElementType::Normal),
    ("menuitem", ElementType::Void),
    ("dialog", ElementType::Normal),
    ("template", ElementType::RawText),
    ("element", ElementType::Normal),
    ("decorator", ElementType::Normal),
    ("content", ElementType::Normal),
    ("shadow", ElementType::Normal),
];

/// Standard HTML attribute names.
pub(crate) const HTML_ATTRIBUTES: &[&str] = &[
    "abbr", "accept", "accept-charset", "accesskey", "action", "align", "alt", "archive",
    "async", "autocomplete", "autofocus", "autoplay", "axis", "border", "cellpadding",
    "cellspacing", "challenge", "char", "charoff", "charset", "checked", "cite", "class",
    "classid", "codebase", "codetype", "cols", "colspan", "command", "content",
    "contenteditable", "contextmenu", "controls", "coords", "data", "datetime", "declare",
    "default", "defer", "dir", "disabled", "draggable", "dropzone", "enctype", "for", "form",
    "formaction", "formenctype", "formmethod", "formnovalidate", "formtarget", "frame",
    "headers", "height", "hidden", "high", "href", "hreflang", "http-equiv", "icon", "id",
    "ismap", "keytype", "kind", "label", "lang", "list", "longdesc", "loop", "low", "max",
    "maxlength", "media", "method", "min", "multiple", "muted", "name", "nohref", "novalidate",
    "nowrap", "onabort", "onafterprint", "onbeforeprint", "onbeforeunload", "onblur",
    "oncanplay", "oncanplaythrough", "onchange", "onclick", "oncontextmenu", "oncuechange",
    "ondblclick", "ondrag", "ondragend", "ondragenter", "ondragleave", "ondragover",
    "ondragstart", "ondrop", "ondurationchange", "onemptied", "onended", "onerror", "onfocus",
    "onformchange", "onforminput", "onhaschange", "oninput", "oninvalid", "onkeydown",
    "onkeypress", "onkeyup", "onload", "onloadeddata", "onloadedmetadata", "onloadstart",
    "onmessage", "onmousedown", "onmousemove", "onmouseout", "onmouseover", "onmouseup",
    "onmousewheel", "onoffline", "ononline", "onpagehide", "onpageshow", "onpause", "onplay",
    "onplaying", "onpopstate", "onprogress", "onratechange", "onredo", "onreset", "onresize",
    "onscroll", "onseeked", "onseeking", "onselect", "onstalled", "onstorage", "onsubmit",
    "onsuspend", "ontimeupdate", "onundo", "onunload", "onvolumechange", "onwaiting", "open",
    "optimum", "pattern", "placeholder", "poster", "preload", "profile", "pubdate",
    "radiogroup", "readonly", "rel", "required", "rev", "reversed", "rows", "rowspan", "rules",
    "scheme", "scope", "scoped", "seamless", "selected", "shape", "size", "span", "spellcheck",
    "src", "srclang", "standby", "style", "summary", "tabindex", "title", "translate", "type",
    "usemap", "valign", "value", "valuetype", "width", "xml:lang", "xml:space", "xmlns",
];

/// HTML attributes whose mere presence means `true`.
pub(crate) const HTML_BOOLEAN_ATTRIBUTES: &[&str] = &[
    "async", "autofocus", "autoplay", "checked", "controls", "declare", "default", "defer",
    "disabled", "formnovalidate", "hidden", "ismap", "loop", "multiple", "novalidate", "nowrap",
    "open", "pubdate", "readonly", "required", "reversed", "scoped", "seamless", "selected",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tables_have_no_duplicates() {
        let elements: HashSet<_> = HTML_ELEMENTS.iter().map(|(name, _)| *name).collect();
        assert_eq!(elements.len(), HTML_ELEMENTS.len());
        let attributes: HashSet<_> = HTML_ATTRIBUTES.iter().collect();
        assert_eq!(attributes.len(), HTML_ATTRIBUTES.len());
    }

    #[test]
    fn test_boolean_attributes_are_standard() {
        for name in HTML_BOOLEAN_ATTRIBUTES {
            assert!(HTML_ATTRIBUTES.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_names_are_lowercase() {
        for (name, _) in HTML_ELEMENTS {
            assert_eq!(*name, name.to_lowercase());
        }
        for name in HTML_ATTRIBUTES {
            assert_eq!(*name, name.to_lowercase());
        }
    }
}
