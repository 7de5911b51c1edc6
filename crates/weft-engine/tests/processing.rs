//! End-to-end processing through the tokenizer, the processor handler and
//! the output handler.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use weft_config::Config;
use weft_engine::{
    Dialect, DialectConfiguration, EngineConfiguration, ProcessingError, TemplateEngine,
};
use weft_markup::event::{Comment, ProcessableTag, Text};
use weft_markup::{
    AttributeName, CommentProcessor, ElementStructureHandler, ElementTagProcessor, LocalVariables,
    MarkupError, MatchingAttributeName, Processor, ProcessorContext, ProcessorRegistration,
    TemplateMode, TextProcessor,
};

/// What a demo attribute does to its element.
#[derive(Clone, Copy)]
enum Command {
    With,
    If,
    Each,
    Text,
    Remove,
    Replace,
}

impl Command {
    const ALL: [(Self, &'static str, i32); 6] = [
        (Self::With, "with", 10),
        (Self::If, "if", 20),
        (Self::Each, "each", 30),
        (Self::Text, "text", 40),
        (Self::Remove, "remove", 50),
        (Self::Replace, "replace", 60),
    ];
}

struct DemoAttribute {
    command: Command,
    complete_name: String,
    matching: MatchingAttributeName,
    template_mode: TemplateMode,
    precedence: i32,
}

fn lookup(context: &ProcessorContext<'_>, expression: &str) -> Value {
    let mut parts = expression.trim().split('.');
    let Some(root) = parts.next().and_then(|name| context.variables().variable(name)) else {
        return Value::Null;
    };
    parts
        .try_fold(root, |value, key| value.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

impl Processor for DemoAttribute {
    fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    fn precedence(&self) -> i32 {
        self.precedence
    }
}

impl ElementTagProcessor for DemoAttribute {
    fn matching_attribute_name(&self) -> Option<&MatchingAttributeName> {
        Some(&self.matching)
    }

    fn process(
        &self,
        context: &ProcessorContext<'_>,
        tag: &mut ProcessableTag,
        structure_handler: &mut ElementStructureHandler,
    ) -> Result<(), MarkupError> {
        let value = tag.attribute_value(&self.complete_name).unwrap_or_default().to_owned();
        tag.remove_attribute(&self.complete_name);

        match self.command {
            Command::With => {
                let (name, expression) = value
                    .split_once('=')
                    .ok_or_else(|| MarkupError::processor(format!("Invalid assignment: {value}")))?;
                let assigned = match lookup(context, expression) {
                    Value::Null => Value::String(expression.trim().to_owned()),
                    found => found,
                };
                structure_handler.set_local_variable(name.trim(), assigned);
            }
            Command::If => {
                if !truthy(&lookup(context, &value)) {
                    structure_handler.remove_element();
                }
            }
            Command::Each => {
                let (variable, expression) = value
                    .split_once(':')
                    .ok_or_else(|| MarkupError::processor(format!("Invalid iteration: {value}")))?;
                let variable = variable.trim();
                let items = match lookup(context, expression) {
                    Value::Array(items) => items,
                    Value::Null => Vec::new(),
                    single => vec![single],
                };
                let status = format!("{variable}Stat");
                structure_handler.iterate_element(variable, Some(&status), items);
            }
            Command::Text => {
                structure_handler.set_body_text(&display(&lookup(context, &value)), false);
            }
            Command::Remove => match value.as_str() {
                "all" => structure_handler.remove_element(),
                "tag" => structure_handler.remove_tags(),
                "body" => structure_handler.remove_body(),
                "all-but-first" => structure_handler.remove_all_but_first_child(),
                other => return Err(MarkupError::processor(format!("Unknown removal: {other}"))),
            },
            Command::Replace => {
                let model = context
                    .model_factory()
                    .element_with_text("span", &[("class", "replaced")], &value)?;
                structure_handler.replace_with(model, false);
            }
        }
        Ok(())
    }
}

/// Replaces `[[name]]` with the variable's value.
fn inline(context: &ProcessorContext<'_>, input: &str) -> Option<String> {
    let start = input.find("[[")?;
    let end = start + input[start..].find("]]")?;
    let value = display(&lookup(context, &input[start + 2..end]));
    let rest = &input[end + 2..];
    let rest = inline(context, rest).unwrap_or_else(|| rest.to_owned());
    Some(format!("{}{value}{rest}", &input[..start]))
}

struct Inliner(TemplateMode);

impl Processor for Inliner {
    fn template_mode(&self) -> TemplateMode {
        self.0
    }

    fn precedence(&self) -> i32 {
        1
    }
}

impl TextProcessor for Inliner {
    fn process(&self, context: &ProcessorContext<'_>, text: &mut Text) -> Result<(), MarkupError> {
        if let Some(inlined) = inline(context, text.text()) {
            text.set_text(&inlined);
        }
        Ok(())
    }
}

impl CommentProcessor for Inliner {
    fn process(&self, context: &ProcessorContext<'_>, comment: &mut Comment) -> Result<(), MarkupError> {
        if let Some(inlined) = inline(context, comment.content()) {
            comment.set_content(&inlined);
        }
        Ok(())
    }
}

struct DemoDialect;

impl Dialect for DemoDialect {
    fn name(&self) -> &str {
        "demo"
    }

    fn prefix(&self) -> Option<&str> {
        Some("th")
    }

    fn processors(&self, prefix: Option<&str>) -> Vec<ProcessorRegistration> {
        let mut registrations = Vec::new();
        for template_mode in TemplateMode::ALL {
            for (command, name, precedence) in Command::ALL {
                let complete_name = match prefix {
                    Some(prefix) => format!("{prefix}:{name}"),
                    None => name.to_owned(),
                };
                let attribute_name = AttributeName::parse(template_mode, &complete_name).unwrap();
                registrations.push(ProcessorRegistration::element_tag(DemoAttribute {
                    command,
                    complete_name,
                    matching: MatchingAttributeName::for_attribute_name(template_mode, attribute_name),
                    template_mode,
                    precedence,
                }));
            }
            registrations.push(ProcessorRegistration::text(Inliner(template_mode)));
            registrations.push(ProcessorRegistration::comment(Inliner(template_mode)));
        }
        registrations
    }
}

fn engine() -> TemplateEngine {
    let dialects = [DialectConfiguration::new(Arc::new(DemoDialect))];
    TemplateEngine::new(EngineConfiguration::new(TemplateMode::Html, &dialects).unwrap())
}

fn render(source: &str, variables: Value) -> String {
    let Value::Object(map) = variables else {
        panic!("variables must be an object");
    };
    let mut out = Vec::new();
    engine()
        .process_with_variables("page", source, LocalVariables::with_variables(map), &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_page_with_every_decision() {
    let source = r#"<!DOCTYPE html>
<html>
<body>
<h1 th:text="title">Placeholder</h1>
<p th:if="admin">Admin only</p>
<ul>
  <li th:each="user : users" th:text="user.name">Someone</li>
</ul>
<div th:remove="tag"><b>kept</b></div>
<section th:remove="body">dropped</section>
<nav th:replace="menu">old</nav>
</body>
</html>"#;
    let expected = r#"<!DOCTYPE html>
<html>
<body>
<h1>Users</h1>

<ul>
  <li>Ann</li><li>Bob</li>
</ul>
<b>kept</b>
<section></section>
<span class="replaced">menu</span>
</body>
</html>"#;
    let variables = json!({
        "title": "Users",
        "admin": false,
        "users": [{"name": "Ann"}, {"name": "Bob"}],
    });
    assert_eq!(render(source, variables), expected);
}

#[test]
fn test_nested_iteration_with_status() {
    let source = "<table><tr th:each=\"row : rows\"><td th:each=\"cell : row\">[[rowStat.count]]/[[cell]]</td></tr></table>";
    let rendered = render(source, json!({"rows": [["a", "b"], ["c"]]}));
    assert_eq!(
        rendered,
        "<table><tr><td>1/a</td><td>1/b</td></tr><tr><td>2/c</td></tr></table>"
    );
}

#[test]
fn test_local_variables_end_with_their_element() {
    let source = "<div th:with=\"greeting=hello\"><p th:text=\"greeting\">-</p></div><p th:text=\"greeting\">-</p>";
    assert_eq!(render(source, json!({})), "<div><p>hello</p></div><p></p>");
}

#[test]
fn test_inlining_in_text_and_comments() {
    let rendered = render(
        "<p>Hello [[name]]!</p><!-- by [[name]] -->",
        json!({"name": "Weft"}),
    );
    assert_eq!(rendered, "<p>Hello Weft!</p><!-- by Weft -->");
}

#[test]
fn test_remove_all_but_first_child() {
    let rendered = render(
        "<ul th:remove=\"all-but-first\">\n  <li>one</li>\n  <li>two</li>\n</ul>",
        json!({}),
    );
    assert_eq!(rendered, "<ul>\n  <li>one</li>\n  \n</ul>");
}

#[test]
fn test_unbalanced_markup_is_written_as_is() {
    let source = "<div><p>open<span>deep</div></em><br>";
    assert_eq!(render(source, json!({})), source);
}

#[test]
fn test_processor_error_reports_location() {
    let err = engine()
        .process_to_string("broken", "<div>\n<p th:remove=\"everything\">x</p>\n</div>")
        .unwrap_err();
    match err {
        ProcessingError::Processor { template, line, col, message } => {
            assert_eq!((template.as_str(), line, col), ("broken", 2, 1));
            assert!(message.contains("everything"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_xml_mode_with_configured_prefix() {
    let config = Config::from_toml_str(
        r#"
[engine]
template_mode = "xml"

[dialects.demo]
prefix = "w"
"#,
    )
    .unwrap();
    let configuration = EngineConfiguration::from_config(&config, vec![Arc::new(DemoDialect)]).unwrap();
    let engine = TemplateEngine::new(configuration);

    let mut out = Vec::new();
    engine
        .process_with_variables(
            "feed",
            "<?xml version=\"1.0\"?><Feed><Item w:each=\"i : items\" w:text=\"i\"/><th:x/></Feed>",
            LocalVariables::with_variables([("items", json!([1, 2]))]),
            &mut out,
        )
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<?xml version=\"1.0\"?><Feed><Item>1</Item><Item>2</Item><th:x/></Feed>"
    );
}

#[test]
fn test_disabled_dialect_leaves_attributes_alone() {
    let config = Config::from_toml_str("[dialects.demo]\nenabled = false\n").unwrap();
    let engine =
        TemplateEngine::new(EngineConfiguration::from_config(&config, vec![Arc::new(DemoDialect)]).unwrap());
    let source = "<p th:text=\"x\">kept</p>";
    assert_eq!(engine.process_to_string("page", source).unwrap(), source);
}

#[test]
fn test_config_loaded_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weft.toml");
    std::fs::write(&path, "[dialects.demo]\nprefix = \"data\"\n").unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    let engine =
        TemplateEngine::new(EngineConfiguration::from_config(&config, vec![Arc::new(DemoDialect)]).unwrap());
    let mut out = Vec::new();
    engine
        .process_with_variables(
            "page",
            "<b data:text=\"who\">?</b>",
            LocalVariables::with_variables([("who", json!("me"))]),
            &mut out,
        )
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "<b>me</b>");
}

#[test]
fn test_registering_a_dialect_twice_fails() {
    let dialect: Arc<dyn Dialect> = Arc::new(DemoDialect);
    let result = EngineConfiguration::new(
        TemplateMode::Html,
        &[
            DialectConfiguration::new(Arc::clone(&dialect)),
            DialectConfiguration::with_prefix(dialect, Some("other")),
        ],
    );
    assert!(matches!(
        result,
        Err(ProcessingError::Markup(MarkupError::Configuration(_)))
    ));
}

#[test]
fn test_engine_is_shared_across_threads() {
    let engine = engine();
    let outputs: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = engine.clone();
                scope.spawn(move || {
                    let mut out = Vec::new();
                    engine
                        .process_with_variables(
                            "page",
                            "<custom-tag th:text=\"n\">-</custom-tag>",
                            LocalVariables::with_variables([("n", json!(i))]),
                            &mut out,
                        )
                        .unwrap();
                    String::from_utf8(out).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(
        outputs,
        (0..4)
            .map(|i| format!("<custom-tag>{i}</custom-tag>"))
            .collect::<Vec<_>>()
    );
}
