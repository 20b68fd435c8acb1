// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::ast::{MacroArg, Node};
use crate::error::ParseError;

/// Parses template source into a node list.
///
/// Single pass, no backtracking beyond fixed-length keyword matching: at a
/// `$` the dispatcher tries each keyword in order and the first hit wins.
/// Error positions are zero-based character offsets.
pub(crate) fn parse_source(source: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser::new(source);
    parser.parse_nodes(BodyEnd::Eof)
}

/// What terminates the node list currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyEnd {
    /// Top level: stop at end of input.
    Eof,
    /// Block body: stop at `$end` (consumed), end of input is an error.
    EndDirective,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn parse_nodes(&mut self, end: BodyEnd) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            if self.is_at_end() {
                return match end {
                    BodyEnd::Eof => Ok(nodes),
                    BodyEnd::EndDirective => Err(ParseError::expected("$end", self.pos)),
                };
            }
            if end == BodyEnd::EndDirective && self.match_keyword("$end") {
                self.trim_whitespaces();
                return Ok(nodes);
            }
            if self.peek() == Some('$') {
                nodes.push(self.parse_directive()?);
            } else {
                nodes.push(self.parse_text());
            }
        }
    }

    /// Dispatches one `$`-prefixed construct. Keywords that are prefixes of
    /// other keywords are tried after the longer form (`$if_eq(` before
    /// `$if(`, `$greater_than_or_eq(` before `$greater_than(`).
    fn parse_directive(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;

        if self.match_keyword("$$") {
            return Ok(Node::Text {
                text: "$".to_string(),
            });
        }
        if self.match_keyword("${") {
            return self.parse_variable();
        }
        if self.match_keyword("$--") {
            return self.parse_comment();
        }
        if self.match_keyword("$if_eq(") {
            return self.parse_eq_block(|variable, literal, body| Node::IfEq {
                variable,
                literal,
                body,
            });
        }
        if self.match_keyword("$unless_eq(") {
            return self.parse_eq_block(|variable, literal, body| Node::UnlessEq {
                variable,
                literal,
                body,
            });
        }
        if self.match_keyword("$if_has_many(") {
            return self.parse_name_block(|iterable, body| Node::IfHasMany { iterable, body });
        }
        if self.match_keyword("$unless_has_many(") {
            return self.parse_name_block(|iterable, body| Node::UnlessHasMany { iterable, body });
        }
        if self.match_keyword("$greater_than_or_eq(") {
            return self.parse_cmp_block(|variable, literal, body| Node::GreaterThanOrEq {
                variable,
                literal,
                body,
            });
        }
        if self.match_keyword("$less_than_or_eq(") {
            return self.parse_cmp_block(|variable, literal, body| Node::LessThanOrEq {
                variable,
                literal,
                body,
            });
        }
        if self.match_keyword("$greater_than(") {
            return self.parse_cmp_block(|variable, literal, body| Node::GreaterThan {
                variable,
                literal,
                body,
            });
        }
        if self.match_keyword("$less_than(") {
            return self.parse_cmp_block(|variable, literal, body| Node::LessThan {
                variable,
                literal,
                body,
            });
        }
        if self.match_keyword("$if(") {
            return self.parse_name_block(|condition, body| Node::IfTrue { condition, body });
        }
        if self.match_keyword("$unless(") {
            return self.parse_name_block(|condition, body| Node::IfFalse { condition, body });
        }
        if self.match_keyword("$each(") {
            return self.parse_name_block(|iterable, body| Node::Loop { iterable, body });
        }
        if self.match_keyword("$first(") {
            return self.parse_name_block(|iterable, body| Node::First { iterable, body });
        }
        if self.match_keyword("$last(") {
            return self.parse_name_block(|iterable, body| Node::Last { iterable, body });
        }
        if self.match_keyword("$call(") {
            return self.parse_call();
        }
        if self.match_keyword("$include(") {
            let path = self.take_until(')', ")")?;
            self.advance();
            self.trim_whitespaces();
            return Ok(Node::Include {
                path: path.trim().to_string(),
            });
        }
        if self.match_keyword("$length(") {
            // Leaf directive: no whitespace trim after the terminator.
            let iterable = self.take_until(')', ")")?;
            self.advance();
            return Ok(Node::Length {
                iterable: iterable.trim().to_string(),
            });
        }
        if self.match_keyword("$index(") {
            return self.parse_index();
        }

        Err(ParseError::new("Unknown directive", start))
    }

    fn parse_text(&mut self) -> Node {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '$' {
                break;
            }
            text.push(c);
            self.advance();
        }
        Node::Text { text }
    }

    /// `${` already consumed: name up to `}` or `|`, then an optional format
    /// pattern up to `}`. Names are opaque — dots, slashes and spaces are all
    /// legal and looked up verbatim.
    fn parse_variable(&mut self) -> Result<Node, ParseError> {
        let mut name = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::expected("}", self.pos)),
                Some('}') => {
                    self.advance();
                    return Ok(Node::Variable { name, format: None });
                }
                Some('|') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
            }
        }

        let mut format = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::expected("}", self.pos)),
                Some('}') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    format.push(c);
                    self.advance();
                }
            }
        }

        let format = format.trim();
        Ok(Node::Variable {
            name,
            format: if format.is_empty() {
                None
            } else {
                Some(format.to_string())
            },
        })
    }

    /// `$--` already consumed: scan to the first `--$`. The comment
    /// terminator does not eat trailing whitespace.
    fn parse_comment(&mut self) -> Result<Node, ParseError> {
        loop {
            if self.match_keyword("--$") {
                return Ok(Node::Comment);
            }
            if self.advance().is_none() {
                return Err(ParseError::new("Expected '--$' to close comment", self.pos));
            }
        }
    }

    /// Header of the form `name)` followed by a block body.
    fn parse_name_block(
        &mut self,
        make: impl FnOnce(String, Vec<Node>) -> Node,
    ) -> Result<Node, ParseError> {
        let name = self.parse_raw_header_name()?;
        let body = self.parse_block_body()?;
        Ok(make(name, body))
    }

    /// Header of the form `name, "literal")` followed by a block body. The
    /// literal is raw text up to the closing quote — no escapes.
    fn parse_eq_block(
        &mut self,
        make: impl FnOnce(String, String, Vec<Node>) -> Node,
    ) -> Result<Node, ParseError> {
        let variable = self.take_until(',', ",")?;
        self.advance();
        self.skip_whitespaces();
        self.expect_char('"', "\"")?;
        let literal = self.take_until('"', "\"")?;
        self.advance();
        self.skip_whitespaces();
        self.expect_char(')', ")")?;
        let body = self.parse_block_body()?;
        Ok(make(variable.trim().to_string(), literal, body))
    }

    /// Header of the form `name, 123)` followed by a block body.
    fn parse_cmp_block(
        &mut self,
        make: impl FnOnce(String, i64, Vec<Node>) -> Node,
    ) -> Result<Node, ParseError> {
        let variable = self.take_until(',', ",")?;
        self.advance();
        self.skip_whitespaces();
        let literal = self.parse_int_literal()?;
        self.skip_whitespaces();
        self.expect_char(')', ")")?;
        let body = self.parse_block_body()?;
        Ok(make(variable.trim().to_string(), literal, body))
    }

    /// `$call(` already consumed. The body holds only `$arg(name) ... $end`
    /// blocks; between them whitespace (newlines included) is skipped
    /// entirely, unlike the single-newline trim used after block headers.
    fn parse_call(&mut self) -> Result<Node, ParseError> {
        let name = self.parse_raw_header_name()?;
        self.skip_whitespaces();

        let mut args = Vec::new();
        loop {
            if self.match_keyword("$end") {
                self.trim_whitespaces();
                return Ok(Node::Macro { name, args });
            }
            if self.match_keyword("$arg(") {
                let arg_name = self.parse_raw_header_name()?;
                let body = self.parse_block_body()?;
                args.push(MacroArg {
                    name: arg_name,
                    body,
                });
                self.skip_whitespaces();
                continue;
            }
            if self.is_at_end() {
                return Err(ParseError::expected("$end", self.pos));
            }
            return Err(ParseError::expected("$arg(", self.pos));
        }
    }

    /// `$index(` already consumed: collection name, then an optional index
    /// argument. `$index(items)` and an empty argument both mean "no index".
    fn parse_index(&mut self) -> Result<Node, ParseError> {
        let mut variable = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::expected(")", self.pos)),
                Some(')') => {
                    self.advance();
                    return Ok(Node::Index {
                        variable: variable.trim().to_string(),
                        index: None,
                    });
                }
                Some(',') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    variable.push(c);
                    self.advance();
                }
            }
        }

        let raw = self.take_until(')', ")")?;
        self.advance();
        let raw = raw.trim();
        Ok(Node::Index {
            variable: variable.trim().to_string(),
            index: if raw.is_empty() {
                None
            } else {
                Some(raw.to_string())
            },
        })
    }

    fn parse_raw_header_name(&mut self) -> Result<String, ParseError> {
        let name = self.take_until(')', ")")?;
        self.advance();
        Ok(name.trim().to_string())
    }

    /// Body of a block directive: the post-terminator newline trim, then
    /// nodes up to `$end`.
    fn parse_block_body(&mut self) -> Result<Vec<Node>, ParseError> {
        self.trim_whitespaces();
        self.parse_nodes(BodyEnd::EndDirective)
    }

    fn parse_int_literal(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(ParseError::new("Expected integer literal", start));
        }
        digits
            .parse()
            .map_err(|_| ParseError::new("Expected integer literal", start))
    }

    /// Consumes up to but not including `stop`; end of input is an error
    /// naming `what`.
    fn take_until(&mut self, stop: char, what: &str) -> Result<String, ParseError> {
        let mut taken = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::expected(what, self.pos)),
                Some(c) if c == stop => return Ok(taken),
                Some(c) => {
                    taken.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Skips whitespace but stops right after the first consumed newline —
    /// the policy that keeps directives on their own lines out of the output.
    fn trim_whitespaces(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    /// Skips all whitespace, newlines included.
    fn skip_whitespaces(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn expect_char(&mut self, expected: char, what: &str) -> Result<(), ParseError> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::expected(what, self.pos))
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        let mut end = self.pos;
        for expected in keyword.chars() {
            if self.chars.get(end) != Some(&expected) {
                return false;
            }
            end += 1;
        }
        self.pos = end;
        true
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Node> {
        parse_source(source).expect("template should parse")
    }

    fn parse_err(source: &str) -> ParseError {
        parse_source(source).expect_err("template should fail to parse")
    }

    #[test]
    fn plain_text_is_one_node() {
        let nodes = parse("hello\nworld");
        assert_eq!(
            nodes,
            vec![Node::Text {
                text: "hello\nworld".to_string()
            }]
        );
    }

    #[test]
    fn double_dollar_escapes_to_a_single_dollar() {
        let nodes = parse("a$$b");
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[1],
            Node::Text {
                text: "$".to_string()
            }
        );
    }

    #[test]
    fn variable_names_are_taken_verbatim() {
        let nodes = parse("${user.name / alias}");
        assert_eq!(
            nodes,
            vec![Node::Variable {
                name: "user.name / alias".to_string(),
                format: None
            }]
        );
    }

    #[test]
    fn variable_format_is_trimmed_and_never_empty() {
        let nodes = parse("${total| #,##0.00 }");
        assert_eq!(
            nodes,
            vec![Node::Variable {
                name: "total".to_string(),
                format: Some("#,##0.00".to_string())
            }]
        );

        let nodes = parse("${total|}");
        assert_eq!(
            nodes,
            vec![Node::Variable {
                name: "total".to_string(),
                format: None
            }]
        );
    }

    #[test]
    fn unterminated_variable_reports_missing_brace() {
        let err = parse_err("${name");
        assert_eq!(err.to_string(), "Expected '}' at position: 6");
    }

    #[test]
    fn dispatch_prefers_longer_keywords() {
        let nodes = parse("$if_eq(x, \"1\")a$end");
        assert!(matches!(nodes[0], Node::IfEq { .. }));

        let nodes = parse("$greater_than_or_eq(x, 1)a$end");
        assert!(matches!(nodes[0], Node::GreaterThanOrEq { .. }));

        let nodes = parse("$if_has_many(x)a$end");
        assert!(matches!(nodes[0], Node::IfHasMany { .. }));
    }

    #[test]
    fn unknown_directive_is_reported_at_the_dollar() {
        let err = parse_err("$unknown(x)");
        assert_eq!(err.to_string(), "Unknown directive at position: 0");

        let err = parse_err("ab $wat");
        assert_eq!(err.position, 3);
    }

    #[test]
    fn unclosed_block_reports_missing_end() {
        let err = parse_err("$if(condition) Some text");
        assert_eq!(err.to_string(), "Expected '$end' at position: 24");
    }

    #[test]
    fn missing_integer_literal_is_reported_after_the_comma() {
        let err = parse_err("$greater_than(x, abc) $end");
        assert_eq!(err.to_string(), "Expected integer literal at position: 17");
    }

    #[test]
    fn comparison_headers_allow_leading_whitespace_before_the_literal() {
        let nodes = parse("$less_than_or_eq(count,   10)x$end");
        assert_eq!(
            nodes,
            vec![Node::LessThanOrEq {
                variable: "count".to_string(),
                literal: 10,
                body: vec![Node::Text {
                    text: "x".to_string()
                }],
            }]
        );
    }

    #[test]
    fn eq_literal_is_raw_up_to_the_closing_quote() {
        let nodes = parse("$if_eq(name, \"a \\ b\")x$end");
        match &nodes[0] {
            Node::IfEq { literal, .. } => assert_eq!(literal, "a \\ b"),
            other => panic!("expected IfEq, got {other}"),
        }
    }

    #[test]
    fn block_header_eats_the_following_newline_only() {
        let nodes = parse("$if(x)\n  body\n$end");
        match &nodes[0] {
            Node::IfTrue { body, .. } => {
                assert_eq!(
                    body,
                    &vec![Node::Text {
                        text: "  body\n".to_string()
                    }]
                );
            }
            other => panic!("expected IfTrue, got {other}"),
        }
    }

    #[test]
    fn end_terminator_eats_the_following_newline_only() {
        let nodes = parse("$if(x)a$end\n\nrest");
        assert_eq!(
            nodes[1],
            Node::Text {
                text: "\nrest".to_string()
            }
        );
    }

    #[test]
    fn length_keeps_the_following_newline() {
        let nodes = parse("$length(items)\nrest");
        assert_eq!(
            nodes,
            vec![
                Node::Length {
                    iterable: "items".to_string()
                },
                Node::Text {
                    text: "\nrest".to_string()
                },
            ]
        );
    }

    #[test]
    fn comment_keeps_trailing_whitespace() {
        let nodes = parse("Hello $-- note --$ World");
        assert_eq!(
            nodes,
            vec![
                Node::Text {
                    text: "Hello ".to_string()
                },
                Node::Comment,
                Node::Text {
                    text: " World".to_string()
                },
            ]
        );
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        let err = parse_err("$-- dangling");
        assert_eq!(
            err.to_string(),
            "Expected '--$' to close comment at position: 12"
        );
    }

    #[test]
    fn index_parses_all_argument_shapes() {
        assert_eq!(
            parse("$index(items, 2)")[0],
            Node::Index {
                variable: "items".to_string(),
                index: Some("2".to_string())
            }
        );
        assert_eq!(
            parse("$index(map, ${key})")[0],
            Node::Index {
                variable: "map".to_string(),
                index: Some("${key}".to_string())
            }
        );
        assert_eq!(
            parse("$index(items)")[0],
            Node::Index {
                variable: "items".to_string(),
                index: None
            }
        );
        assert_eq!(
            parse("$index(items, )")[0],
            Node::Index {
                variable: "items".to_string(),
                index: None
            }
        );
    }

    #[test]
    fn call_collects_arg_blocks_across_newlines() {
        let nodes = parse("$call(signature)\n  $arg(name)${user}$end\n  $arg(role)boss$end\n$end");
        match &nodes[0] {
            Node::Macro { name, args } => {
                assert_eq!(name, "signature");
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].name, "name");
                assert_eq!(args[1].name, "role");
                assert_eq!(
                    args[1].body,
                    vec![Node::Text {
                        text: "boss".to_string()
                    }]
                );
            }
            other => panic!("expected Macro, got {other}"),
        }
    }

    #[test]
    fn call_rejects_stray_content_between_args() {
        let err = parse_err("$call(m)stray$end");
        assert_eq!(err.to_string(), "Expected '$arg(' at position: 8");
    }

    #[test]
    fn nested_blocks_close_innermost_first() {
        let nodes = parse("$each(xs)$if(it)${it}$end$end");
        match &nodes[0] {
            Node::Loop { body, .. } => {
                assert!(matches!(body[0], Node::IfTrue { .. }));
            }
            other => panic!("expected Loop, got {other}"),
        }
    }

    #[test]
    fn positions_count_characters_not_bytes() {
        // "é" is two bytes but one character.
        let err = parse_err("é$nope");
        assert_eq!(err.position, 1);
    }
}
