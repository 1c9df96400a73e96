//! Syntax trees and type tables for tests
//!
//! [`parse`] understands one statement per line out of a tiny subset of
//! TypeScript: `[await] <number|name()|name|[...]>;` and
//! `for [await] (const x of [...]) {}`. Blank lines and `//` lines are trivia,
//! and so are spaces and block comments between `await` and its operand.
//! Numbers, calls and array literals get `number`, `Promise<Response>` and
//! `number[]` respectively; plain names stay `any`.

use crate::ast::{skip_trivia, NodeId, NodeKind, SourceFile, SourceFileBuilder, TextRange};
use crate::diagnostic::{Failure, Severity};
use crate::rule::{RuleConstructor, RuleContext, RuleError};
use crate::semantic::{Signature, TypeChecker, TypeId, TypeStore, WellKnownSymbol};
use serde_json::Value;

pub struct Fixture {
    pub file: SourceFile,
    pub types: TypeStore,
    /// Operand of the last `await` or `for await` in the file
    pub target: NodeId,
}

pub fn await_literal() -> Fixture {
    parse("await 5;").expect("fixture parses")
}

pub fn await_thenable_call() -> Fixture {
    parse("await fetchData();").expect("fixture parses")
}

pub fn for_await_array() -> Fixture {
    parse("for await (const x of [1,2,3]) {}").expect("fixture parses")
}

pub fn parse(text: &str) -> Option<Fixture> {
    parse_named("test.ts", text)
}

pub fn parse_named(file_name: &str, text: &str) -> Option<Fixture> {
    let mut parser = Parser::new(SourceFile::builder(file_name, text));
    let mut prev_end = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let code = line.trim_end();
        let indent = code.len() - code.trim_start().len();
        let code = code.trim_start();
        if code.is_empty() || code.starts_with("//") {
            continue;
        }
        let start = line_start + indent;
        parser.statement(prev_end, start, code)?;
        prev_end = start + code.len();
    }
    let file = parser.builder.finish().ok()?;
    Some(Fixture {
        file,
        types: parser.types,
        target: parser.target,
    })
}

/// Run one rule on a file without going through the linter
pub fn run_rule(
    name: &str,
    constructor: &dyn RuleConstructor,
    file: &SourceFile,
    program: Option<&dyn TypeChecker>,
) -> Result<Vec<Failure>, RuleError> {
    let options = Value::Null;
    let mut ctx = RuleContext::new(file, name, &options, Severity::Error).with_program(program);
    let mut rule = constructor.create(&ctx)?;
    rule.apply(&mut ctx)?;
    Ok(ctx.into_failures())
}

struct Parser {
    builder: SourceFileBuilder,
    types: TypeStore,
    target: NodeId,
    number: TypeId,
    promise: TypeId,
    array: TypeId,
}

impl Parser {
    fn new(builder: SourceFileBuilder) -> Self {
        let mut types = TypeStore::new();
        let number = types.primitive("number");
        let number_object = types.object("Number").build();
        types.set_apparent_type(number, number_object);
        let then = types.function(Signature::new(&["onfulfilled", "onrejected"]));
        let promise = types.object("Promise<Response>").property("then", then).build();
        let iterator = types.function(Signature::default());
        let array = types
            .object("number[]")
            .symbol_property(WellKnownSymbol::Iterator, iterator)
            .build();
        Self {
            builder,
            types,
            target: NodeId(0),
            number,
            promise,
            array,
        }
    }

    fn statement(&mut self, pos: usize, start: usize, code: &str) -> Option<NodeId> {
        if code.starts_with("for ") {
            return self.for_of(pos, start, code);
        }
        let expression = code.strip_suffix(';')?;
        let statement = self.builder.open(pos);
        let expression = self.expression(pos, start, expression)?;
        Some(self.builder.close(
            statement,
            NodeKind::ExpressionStatement { expression },
            start + code.len(),
        ))
    }

    fn for_of(&mut self, pos: usize, start: usize, code: &str) -> Option<NodeId> {
        let await_modifier = code
            .starts_with("for await (")
            .then(|| TextRange::new(start + 3, start + 9));
        let open = code.find('(')?;
        let of = code.find(" of ")?;
        let close = code.find(") ")?;

        let node = self.builder.open(pos);
        let initializer = self.builder.leaf(
            NodeKind::VariableDeclarationList,
            start + open + 1,
            start + of,
        );
        let expression = self
            .builder
            .leaf(NodeKind::ArrayLiteral, start + of + 3, start + close);
        self.types.set_node_type(expression, self.array);
        let statement = self
            .builder
            .leaf(NodeKind::Block, start + close + 1, start + code.len());
        if await_modifier.is_some() {
            self.target = expression;
        }
        Some(self.builder.close(
            node,
            NodeKind::ForOfStatement {
                await_modifier,
                initializer,
                expression,
                statement,
            },
            start + code.len(),
        ))
    }

    fn expression(&mut self, pos: usize, start: usize, text: &str) -> Option<NodeId> {
        let end = start + text.len();
        let awaits = text
            .strip_prefix("await")
            .is_some_and(|rest| rest.starts_with(char::is_whitespace) || rest.starts_with("/*"));
        if awaits {
            let operand = skip_trivia(text, 5);
            let node = self.builder.open(pos);
            let expression = self.expression(start + 5, start + operand, &text[operand..])?;
            self.target = expression;
            return Some(
                self.builder
                    .close(node, NodeKind::AwaitExpression { expression }, end),
            );
        }
        if let Some(callee) = text.strip_suffix("()") {
            let node = self.builder.open(pos);
            let callee = self
                .builder
                .leaf(NodeKind::Identifier, pos, start + callee.len());
            let node = self
                .builder
                .close(node, NodeKind::CallExpression { callee }, end);
            self.types.set_node_type(node, self.promise);
            return Some(node);
        }
        if text.parse::<f64>().is_ok() {
            let node = self.builder.leaf(NodeKind::NumericLiteral, pos, end);
            self.types.set_node_type(node, self.number);
            return Some(node);
        }
        if text.starts_with('[') {
            let node = self.builder.leaf(NodeKind::ArrayLiteral, pos, end);
            self.types.set_node_type(node, self.array);
            return Some(node);
        }
        if !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Some(self.builder.leaf(NodeKind::Identifier, pos, end));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offsets() {
        let fixture = parse("await 5;\nfetchData();").unwrap();
        let nodes = fixture.file.nodes();
        let kinds: Vec<&str> = nodes.iter().map(|n| n.kind.name()).collect();
        assert_eq!(
            kinds,
            vec![
                "ExpressionStatement",
                "AwaitExpression",
                "NumericLiteral",
                "ExpressionStatement",
                "CallExpression",
                "Identifier"
            ]
        );
        assert_eq!((nodes[2].pos, nodes[2].end), (5, 7));
        assert_eq!((nodes[3].pos, nodes[3].end), (8, 21));
        assert_eq!(nodes[3].start(&fixture.file), 9);
        assert_eq!(fixture.target, NodeId(2));
        assert!(parse("let x = 1").is_none());
    }

    #[test]
    fn test_parse_await_trivia() {
        let fixture = parse("await /* c */ 5;").unwrap();
        let literal = fixture.file.node(fixture.target);
        assert_eq!((literal.pos, literal.end), (5, 15));
        assert_eq!(literal.start(&fixture.file), 14);
        assert!(parse("awaitx;").unwrap().file.nodes()[1].kind == NodeKind::Identifier);
    }
}
