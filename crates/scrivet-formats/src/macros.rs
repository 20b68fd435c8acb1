// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashMap;

use scrivet_engine::{ParseError, RenderError, Template, TemplateMacro, Value};

/// A macro whose body is itself a template.
///
/// The source is parsed once at construction; each invocation renders the
/// parsed template with the argument map as root context, so `$arg(user)`
/// becomes `${user}` inside the macro body. Arguments arrive pre-rendered as
/// strings and missing names fall back to the empty string, like any other
/// root-context miss.
pub struct SourceMacro {
    template: Template,
}

impl SourceMacro {
    /// Parses `source` into a reusable macro body.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            template: Template::parse(source)?,
        })
    }
}

impl TemplateMacro for SourceMacro {
    fn apply(&self, args: &HashMap<String, String>) -> Result<String, RenderError> {
        let context: HashMap<String, Value> = args
            .iter()
            .map(|(name, text)| (name.clone(), Value::from(text.clone())))
            .collect();
        self.template.render(&context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_body_with_arguments_as_context() {
        let mac = SourceMacro::parse("Dear ${name}, your ${thing} is ready.").unwrap();
        let mut args = HashMap::new();
        args.insert("name".to_string(), "Ada".to_string());
        args.insert("thing".to_string(), "report".to_string());
        assert_eq!(
            mac.apply(&args).unwrap(),
            "Dear Ada, your report is ready."
        );
    }

    #[test]
    fn missing_arguments_render_as_empty() {
        let mac = SourceMacro::parse("[${absent}]").unwrap();
        assert_eq!(mac.apply(&HashMap::new()).unwrap(), "[]");
    }

    #[test]
    fn broken_source_fails_at_construction() {
        assert!(SourceMacro::parse("$if(x) unclosed").is_err());
    }
}
