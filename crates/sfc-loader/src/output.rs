//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8Path;
use serde::Serialize;
use serde_json::Value;
use sfc_loader::{LoadedModule, StyleBlock};
use sfc_parser::Section;
use std::error::Error;

/// A compiled module as printed by `compile --output json`.
#[derive(Debug, Serialize)]
struct ModuleOutput<'a> {
    path: &'a str,
    code: &'a str,
    template: Option<&'a str>,
    styles: &'a [StyleBlock],
    map: Value,
}

/// Formats command output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats extracted sections.
    pub fn sections(&self, file: &Utf8Path, sections: &[Section]) -> String {
        match self.format {
            OutputFormat::Human => {
                let mut output = String::new();
                for section in sections {
                    let attributes: String = section
                        .attributes
                        .iter()
                        .map(|(name, value)| format!(" {name}={value:?}"))
                        .collect();
                    output.push_str(&format!(
                        "{}:{} <{}{}>\n",
                        file, section.offset, section.tag, attributes
                    ));
                    output.push_str(&section.text);
                    if !section.text.ends_with('\n') {
                        output.push('\n');
                    }
                    output.push('\n');
                }
                output
            }
            OutputFormat::Json => to_json(&sections),
        }
    }

    /// Formats a compiled module.
    pub fn module(&self, module: &LoadedModule) -> String {
        match self.format {
            OutputFormat::Human => {
                let mut output = module.code.clone();
                if let Some(map) = &module.map {
                    if !output.ends_with('\n') {
                        output.push('\n');
                    }
                    output.push_str("//# sourceMappingURL=");
                    output.push_str(&map.to_data_url());
                    output.push('\n');
                }
                output
            }
            OutputFormat::Json => {
                let map = module
                    .map
                    .as_ref()
                    .and_then(|map| serde_json::from_str(&map.to_json()).ok())
                    .unwrap_or(Value::Null);
                to_json(&ModuleOutput {
                    path: module.path.as_str(),
                    code: &module.code,
                    template: module.template.as_deref(),
                    styles: &module.styles,
                    map,
                })
            }
        }
    }
}

/// Formats an error and its causes on one line.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfc_parser::extract;

    #[test]
    fn test_human_sections() {
        let sections = extract("<script lang=\"ts\">\nlet a = 1\n</script>", &["script"]).unwrap();
        let output = Formatter::new(OutputFormat::Human).sections(Utf8Path::new("App.vue"), &sections);
        assert_eq!(output, "App.vue:1 <script lang=\"ts\">\n\nlet a = 1\n\n");
    }

    #[test]
    fn test_json_sections() {
        let sections = extract("<style scoped>a{}</style>", &["style"]).unwrap();
        let output = Formatter::new(OutputFormat::Json).sections(Utf8Path::new("App.vue"), &sections);
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["tag"], "style");
        assert_eq!(value[0]["text"], "a{}");
        assert_eq!(value[0]["offset"], 1);
        assert_eq!(value[0]["attributes"]["scoped"], "");
    }

    #[test]
    fn test_human_module_inlines_map() {
        let map = source_map::SourceMap::builder().file("App.vue").build();
        let module = LoadedModule {
            path: "App.vue".into(),
            code: "let a".to_string(),
            map: Some(map.clone()),
            template: None,
            styles: Vec::new(),
        };
        let output = Formatter::new(OutputFormat::Human).module(&module);
        assert_eq!(
            output,
            format!("let a\n//# sourceMappingURL={}\n", map.to_data_url())
        );
        assert!(output.contains("sourceMappingURL=data:application/json;charset=utf-8;base64,"));
    }

    #[test]
    fn test_error_chain() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(error_chain(&err), "missing");
    }
}
