//! expression builder
//!
//! Generated attribute values are assembled from pieces of the source document without evaluating them.
//! [Tokens] is a small tree of the few expression shapes we generate (objects, arrays, function calls and
//! comprehensions) with verbatim source text at the leaves. It is rendered with two space indentation and then
//! parsed back into a [hcl_edit] expression, so a generated value is always valid HCL before it is inserted.
use crate::error::Issue;
use hcl_edit::expr::Expression;
use hcl_edit::structure::{Body, Structure};
use hcl_edit::Decorate;
use indexmap::IndexMap;
use std::fmt::Write;

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
pub enum Tokens {
    /// verbatim expression text
    Raw(String),
    Object(ObjectTokens),
    Array(Vec<Tokens>),
    Call(&'static str, Vec<Tokens>),
    /// `[for <intro> : <body> if <cond>]`, or with braces for object comprehensions
    For {
        brace: bool,
        intro: String,
        body: Box<Tokens>,
        cond: Option<String>,
    },
    /// `<prefix> <tokens>`, e.g. the condition of a conditional expression
    Prefixed(String, Box<Tokens>),
}

impl Tokens {
    pub fn raw(text: impl Into<String>) -> Self {
        Tokens::Raw(text.into())
    }

    /// Source text of `expr` without its surrounding whitespace and comments
    pub fn expr(expr: &Expression) -> Self {
        Tokens::Raw(expr_text(expr))
    }

    pub fn array(items: impl IntoIterator<Item = ObjectTokens>) -> Self {
        Tokens::Array(items.into_iter().map(Tokens::Object).collect())
    }

    pub fn array_single(object: ObjectTokens) -> Self {
        Tokens::Array(vec![Tokens::Object(object)])
    }

    pub fn flatten(tokens: Tokens) -> Self {
        Tokens::Call("flatten", vec![tokens])
    }

    /// `concat(...)` of all arguments, a single argument is returned as is
    pub fn concat(mut args: Vec<Tokens>) -> Self {
        if args.len() == 1 {
            return args.remove(0);
        }
        Tokens::Call("concat", args)
    }

    pub fn merge(args: Vec<Tokens>) -> Self {
        Tokens::Call("merge", args)
    }

    /// `[for <intro> : <body>]`
    pub fn for_array(intro: impl Into<String>, body: Tokens) -> Self {
        Tokens::For {
            brace: false,
            intro: intro.into(),
            body: Box::new(body),
            cond: None,
        }
    }

    /// `{for <intro> : <body>}`
    pub fn for_object(intro: impl Into<String>, body: Tokens) -> Self {
        Tokens::For {
            brace: true,
            intro: intro.into(),
            body: Box::new(body),
            cond: None,
        }
    }

    /// Adds an `if` clause, only meaningful for comprehensions
    pub fn with_condition(self, condition: impl Into<String>) -> Self {
        match self {
            Tokens::For {
                brace, intro, body, ..
            } => Tokens::For {
                brace,
                intro,
                body,
                cond: Some(condition.into()),
            },
            other => other,
        }
    }

    pub fn prefixed(prefix: impl Into<String>, tokens: Tokens) -> Self {
        Tokens::Prefixed(prefix.into(), Box::new(tokens))
    }

    /// Renders the expression text as it appears at nesting level `level`
    pub fn render(&self, level: usize) -> String {
        let mut out = String::new();
        self.render_into(&mut out, level);
        out
    }

    fn render_into(&self, out: &mut String, level: usize) {
        let pad = INDENT.repeat(level);
        let inner = INDENT.repeat(level + 1);

        match self {
            Tokens::Raw(text) => out.push_str(text),
            Tokens::Object(object) => {
                if object.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str("{\n");
                for (key, value) in object.iter() {
                    let _ = write!(out, "{inner}{key} = ");
                    value.render_into(out, level + 1);
                    out.push('\n');
                }
                out.push_str(&pad);
                out.push('}');
            }
            Tokens::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                out.push_str("[\n");
                for (index, item) in items.iter().enumerate() {
                    out.push_str(&inner);
                    item.render_into(out, level + 1);
                    if index + 1 < items.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&pad);
                out.push(']');
            }
            Tokens::Call(name, args) => {
                out.push_str(name);
                if let [arg] = args.as_slice() {
                    out.push('(');
                    arg.render_into(out, level);
                    out.push(')');
                    return;
                }
                out.push_str("(\n");
                for (index, arg) in args.iter().enumerate() {
                    out.push_str(&inner);
                    arg.render_into(out, level + 1);
                    if index + 1 < args.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&pad);
                out.push(')');
            }
            Tokens::For {
                brace,
                intro,
                body,
                cond,
            } => {
                let (open, close) = if *brace { ('{', '}') } else { ('[', ']') };
                let _ = write!(out, "{open}\n{inner}for {intro} : ");
                body.render_into(out, level + 1);
                if let Some(cond) = cond {
                    let _ = write!(out, " if {cond}");
                }
                let _ = write!(out, "\n{pad}{close}");
            }
            Tokens::Prefixed(prefix, tokens) => {
                out.push_str(prefix);
                out.push(' ');
                tokens.render_into(out, level);
            }
        }
    }

    /// Renders and parses the tokens into an expression for attribute `name` at nesting level `level`
    pub fn to_expression(&self, name: &str, level: usize) -> Result<Expression, Issue> {
        self.render(level)
            .parse::<Expression>()
            .map_err(|err| Issue::InvalidExpression {
                name: name.to_owned(),
                reason: err.to_string(),
            })
    }
}

/// Attributes of a generated object, in insertion order
///
/// Setting an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectTokens {
    entries: IndexMap<String, Tokens>,
}

impl ObjectTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Tokens) -> &mut Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: Tokens) -> Self {
        self.set(key, value);
        self
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tokens> {
        self.entries.get_mut(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tokens)> {
        self.entries.iter()
    }

    /// Sorts entries by key, nested objects included
    pub fn sorted(mut self) -> Self {
        self.entries.sort_keys();
        for value in self.entries.values_mut() {
            if let Tokens::Object(object) = value {
                *object = std::mem::take(object).sorted();
            }
        }
        self
    }
}

/// Attributes keep their source text, nested blocks become nested objects
impl From<&Body> for ObjectTokens {
    fn from(body: &Body) -> Self {
        let mut object = ObjectTokens::new();
        for structure in body.iter() {
            match structure {
                Structure::Attribute(attr) => {
                    object.set(attr.key.value().as_str(), Tokens::expr(&attr.value));
                }
                Structure::Block(block) => {
                    object.set(
                        block.ident.value().as_str(),
                        Tokens::Object(ObjectTokens::from(&block.body)),
                    );
                }
            }
        }
        object
    }
}

/// Source text of `expr` without its surrounding whitespace and comments
pub fn expr_text(expr: &Expression) -> String {
    let mut expr = expr.clone();
    *expr.decor_mut() = Default::default();
    expr.to_string().trim().to_owned()
}
