//! configuration documents
//!
//! A [Document] is a parsed terraform file ([hcl_edit::structure::Body]). Parsing with [hcl_edit] keeps every
//! whitespace and comment, so everything we do not touch serializes back exactly as it was written.
//!
//! [BodyExt] and [BlockExt] add the handful of operations the conversions need on top of [hcl_edit]:
//! reading, popping and replacing attributes by name, draining nested blocks by name and relabeling blocks.
use crate::error::{ConvertError, Issue};
use crate::tokens::Tokens;
use hcl_edit::expr::Expression;
use hcl_edit::structure::{Attribute, Block, BlockLabel, Body, Structure};
use hcl_edit::{Decor, Decorate, Decorated, Ident};

/// Nesting level of attributes inside a top-level block
pub const BLOCK_LEVEL: usize = 1;

#[derive(Debug)]
pub struct Document {
    body: Body,
}

impl Document {
    pub fn parse(input: &str) -> Result<Self, ConvertError> {
        let body = hcl_edit::parser::parse_body(input)?;
        Ok(Self { body })
    }

    /// Calls `update` for every top-level block, in document order
    ///
    /// Stops at the first error.
    pub fn update_blocks<F>(&mut self, mut update: F) -> Result<(), ConvertError>
    where
        F: FnMut(&mut Block) -> Result<(), ConvertError>,
    {
        for index in 0..self.body.len() {
            let mut structure = self.body.remove(index);
            let result = match &mut structure {
                Structure::Block(block) => update(block),
                Structure::Attribute(_) => Ok(()),
            };
            self.body.insert(index, structure);
            result?;
        }
        Ok(())
    }

    /// Parses `snippet` and appends its structures to the end of the document
    pub fn append(&mut self, snippet: &str) -> Result<(), ConvertError> {
        for structure in hcl_edit::parser::parse_body(snippet)? {
            self.body.push(structure);
        }
        Ok(())
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.body, f)
    }
}

/// Position and decoration (surrounding whitespace and comments) of a removed structure
///
/// A generated attribute placed into a slot takes over the place of what was removed.
#[derive(Debug, Clone)]
pub struct Slot {
    index: usize,
    decor: Decor,
}

impl Slot {
    pub fn new(index: usize, block: &Block) -> Self {
        Self {
            index,
            decor: block.decor().clone(),
        }
    }
}

pub trait BodyExt {
    fn attr(&self, name: &str) -> Option<&Expression>;
    fn attr_position(&self, name: &str) -> Option<usize>;
    /// Removes attribute `name` and returns its value
    fn pop_attr(&mut self, name: &str) -> Option<Expression>;
    fn rename_attr(&mut self, from: &str, to: &str) -> bool;
    /// Replaces the value of attribute `name` in place, or appends a new attribute
    fn set_attr(&mut self, name: &str, value: Expression);
    /// Renders `tokens` as the value of attribute `name`, see [BodyExt::place_attr]
    fn set_tokens(&mut self, name: &str, tokens: &Tokens, slot: Option<Slot>) -> Result<(), Issue>;
    /// Inserts attribute `name` into `slot`, or sets it when there is no slot
    fn place_attr(&mut self, name: &str, value: Expression, slot: Option<Slot>);

    fn first_block(&self, ident: &str) -> Option<&Block>;
    fn block_position<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&Block) -> bool;
    /// Slot of the first block matching `predicate`
    fn slot_where<P>(&self, predicate: P) -> Option<Slot>
    where
        P: Fn(&Block) -> bool;
    /// Removes all blocks matching `predicate`, in source order
    fn take_blocks_where<P>(&mut self, predicate: P) -> Vec<Block>
    where
        P: Fn(&Block) -> bool;

    fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    fn remove_attr(&mut self, name: &str) -> bool {
        self.pop_attr(name).is_some()
    }

    /// Removes all blocks named `ident` and the slot of the first one
    fn take_blocks(&mut self, ident: &str) -> (Option<Slot>, Vec<Block>) {
        let slot = self.slot_where(|block| block.is_named(ident));
        let blocks = self.take_blocks_where(|block| block.is_named(ident));
        (slot, blocks)
    }

    fn take_first_block(&mut self, ident: &str) -> Option<(Slot, Block)> {
        let index = self.block_position(|block| block.is_named(ident))?;
        let block = self.take_block_at(index)?;
        Some((Slot::new(index, &block), block))
    }

    fn take_block_at(&mut self, index: usize) -> Option<Block>;
}

impl BodyExt for Body {
    fn attr(&self, name: &str) -> Option<&Expression> {
        self.attributes()
            .find(|attr| attr.key.value().as_str() == name)
            .map(|attr| &attr.value)
    }

    fn attr_position(&self, name: &str) -> Option<usize> {
        self.iter().position(|structure| {
            matches!(structure, Structure::Attribute(attr) if attr.key.value().as_str() == name)
        })
    }

    fn pop_attr(&mut self, name: &str) -> Option<Expression> {
        let index = self.attr_position(name)?;
        match self.remove(index) {
            Structure::Attribute(attr) => Some(attr.value),
            structure => {
                self.insert(index, structure);
                None
            }
        }
    }

    fn rename_attr(&mut self, from: &str, to: &str) -> bool {
        let Some(index) = self.attr_position(from) else {
            return false;
        };
        if let Structure::Attribute(mut attr) = self.remove(index) {
            let mut key = Decorated::new(Ident::new(to));
            *key.decor_mut() = attr.key.decor().clone();
            attr.key = key;
            self.insert(index, Structure::Attribute(attr));
        }
        true
    }

    fn set_attr(&mut self, name: &str, value: Expression) {
        match self.attr_position(name) {
            Some(index) => {
                if let Structure::Attribute(mut attr) = self.remove(index) {
                    attr.value = decorated_value(value);
                    self.insert(index, Structure::Attribute(attr));
                }
            }
            None => {
                let mut attr = new_attr(name, value);
                attr.decor_mut().set_prefix("  ");
                self.push(Structure::Attribute(attr));
            }
        }
    }

    fn set_tokens(&mut self, name: &str, tokens: &Tokens, slot: Option<Slot>) -> Result<(), Issue> {
        let value = tokens.to_expression(name, BLOCK_LEVEL)?;
        self.place_attr(name, value, slot);
        Ok(())
    }

    fn place_attr(&mut self, name: &str, value: Expression, slot: Option<Slot>) {
        let Some(Slot { mut index, decor }) = slot else {
            return self.set_attr(name, value);
        };
        if let Some(existing) = self.attr_position(name) {
            self.remove(existing);
            if existing < index {
                index -= 1;
            }
        }

        let mut attr = new_attr(name, value);
        *attr.decor_mut() = decor;
        self.insert(index.min(self.len()), Structure::Attribute(attr));
    }

    fn first_block(&self, ident: &str) -> Option<&Block> {
        self.blocks().find(|block| block.is_named(ident))
    }

    fn block_position<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&Block) -> bool,
    {
        self.iter()
            .position(|structure| matches!(structure, Structure::Block(block) if predicate(block)))
    }

    fn slot_where<P>(&self, predicate: P) -> Option<Slot>
    where
        P: Fn(&Block) -> bool,
    {
        self.iter()
            .enumerate()
            .find_map(|(index, structure)| match structure {
                Structure::Block(block) if predicate(block) => Some(Slot::new(index, block)),
                _ => None,
            })
    }

    fn take_blocks_where<P>(&mut self, predicate: P) -> Vec<Block>
    where
        P: Fn(&Block) -> bool,
    {
        let mut blocks = vec![];
        while let Some(index) = self.block_position(&predicate) {
            match self.take_block_at(index) {
                Some(block) => blocks.push(block),
                None => break,
            }
        }
        blocks
    }

    fn take_block_at(&mut self, index: usize) -> Option<Block> {
        match self.remove(index) {
            Structure::Block(block) => Some(block),
            structure => {
                self.insert(index, structure);
                None
            }
        }
    }
}

/// First block of `body`, used for snippets we parse ourselves
pub(crate) fn into_first_block(body: Body) -> Option<Block> {
    body.into_iter().find_map(|structure| match structure {
        Structure::Block(block) => Some(block),
        Structure::Attribute(_) => None,
    })
}

fn new_attr(name: &str, value: Expression) -> Attribute {
    let mut key = Decorated::new(Ident::new(name));
    key.decor_mut().set_suffix(" ");
    Attribute::new(key, decorated_value(value))
}

fn decorated_value(mut value: Expression) -> Expression {
    *value.decor_mut() = Decor::default();
    value.decor_mut().set_prefix(" ");
    value
}

pub trait BlockExt {
    fn is_named(&self, ident: &str) -> bool;
    /// `resource "<type>" ...` or `data "<type>" ...`
    fn is_kind(&self, kind: &str, type_name: &str) -> bool;
    fn label(&self, index: usize) -> Option<&str>;
    /// Replaces the label at `index`, keeping its decoration
    fn set_label(&mut self, index: usize, value: &str);
    /// Appends `# <line>` comments at the end of the block body, after a blank line
    fn append_comments(&mut self, lines: &[&str]) -> Result<(), ConvertError>;
}

impl BlockExt for Block {
    fn is_named(&self, ident: &str) -> bool {
        self.ident.value().as_str() == ident
    }

    fn is_kind(&self, kind: &str, type_name: &str) -> bool {
        self.is_named(kind) && self.label(0) == Some(type_name)
    }

    fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|label| label.as_str())
    }

    fn set_label(&mut self, index: usize, value: &str) {
        let Some(old) = self.labels.get_mut(index) else {
            return;
        };
        let mut label = BlockLabel::String(Decorated::new(value.to_owned()));
        *label.decor_mut() = old.decor().clone();
        *old = label;
    }

    fn append_comments(&mut self, lines: &[&str]) -> Result<(), ConvertError> {
        // without its own decor the last `}` is the closing brace, trailing comments are restored below
        let mut block = self.clone();
        *block.decor_mut() = Decor::default();
        block.body.set_prefer_oneline(false);

        let mut wrapper = Body::default();
        wrapper.push(Structure::Block(block));
        let text = wrapper.to_string();

        let Some(close) = text.rfind('}') else {
            return Ok(());
        };
        let mut commented = text[..close].trim_end_matches([' ', '\t']).to_owned();
        if !commented.ends_with('\n') {
            commented.push('\n');
        }
        commented.push('\n');
        for line in lines {
            commented.push_str("  # ");
            commented.push_str(line);
            commented.push('\n');
        }
        commented.push_str(&text[close..]);

        let parsed = hcl_edit::parser::parse_body(&commented)?;
        if let Some(mut block) = into_first_block(parsed) {
            *block.decor_mut() = self.decor().clone();
            *self = block;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(input: &str) -> Body {
        hcl_edit::parser::parse_body(input).expect("body must parse")
    }

    fn first_block(input: &str) -> Block {
        into_first_block(body(input)).expect("one block")
    }

    #[test]
    fn untouched_documents_round_trip() {
        let input = r#"
# leading comment
resource "aws_instance" "web" {
  ami           = "ami-123" # trailing comment
  tags = {
    Name = "${var.name}-web"
  }
}

variable "name" {}
"#;
        let mut document = Document::parse(input).expect("valid document");
        document.update_blocks(|_| Ok(())).expect("no error");

        assert_eq!(document.to_string(), input);
    }

    #[test]
    fn invalid_documents_fail() {
        let error = Document::parse("resource {").expect_err("must fail");
        assert!(matches!(error, ConvertError::Syntax(_)));
    }

    #[test]
    fn attributes() {
        let mut body = body("a = 1\nb = var.b\nnested {\n  c = 3\n}\n");

        assert!(body.has_attr("a"));
        assert!(!body.has_attr("c"));
        assert_eq!(body.attr_position("b"), Some(1));

        let popped = body.pop_attr("b").expect("attribute exists");
        assert_eq!(crate::tokens::expr_text(&popped), "var.b");
        assert!(!body.has_attr("b"));
        assert!(body.pop_attr("b").is_none());

        assert!(body.rename_attr("a", "z"));
        assert!(!body.rename_attr("a", "y"));
        assert_eq!(body.attr_position("z"), Some(0));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut body = body("a = 1\nb = 2\n");
        body.set_attr("a", "var.a".parse().unwrap());
        body.set_attr("c", "3".parse().unwrap());

        let keys: Vec<_> = body
            .attributes()
            .map(|attr| attr.key.value().to_string())
            .collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(crate::tokens::expr_text(body.attr("a").unwrap()), "var.a");
    }

    #[test]
    fn take_blocks_in_source_order() {
        let mut body = body(
            r#"
            a = 1
            spec { n = 1 }
            other {}
            spec { n = 2 }
            "#,
        );

        let (slot, blocks) = body.take_blocks("spec");
        let slot = slot.expect("blocks found");

        assert_eq!(slot.index, 1);
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks
                .iter()
                .map(|block| crate::tokens::expr_text(block.body.attr("n").unwrap()))
                .collect::<Vec<_>>(),
            ["1", "2"]
        );
        assert_eq!(body.len(), 2);

        body.place_attr("spec", "[]".parse().unwrap(), Some(slot));
        assert_eq!(body.attr_position("spec"), Some(1));
    }

    #[test]
    fn take_blocks_none_found() {
        let mut body = body("a = 1\n");
        let (slot, blocks) = body.take_blocks("spec");

        assert!(slot.is_none());
        assert!(blocks.is_empty());
    }

    #[test]
    fn labels() {
        let mut block = first_block(r#"resource "mongodbatlas_cluster" "this" {}"#);

        assert!(block.is_kind("resource", "mongodbatlas_cluster"));
        assert!(!block.is_kind("data", "mongodbatlas_cluster"));
        assert_eq!(block.label(1), Some("this"));
        assert_eq!(block.label(2), None);

        block.set_label(0, "mongodbatlas_advanced_cluster");
        assert!(block.is_kind("resource", "mongodbatlas_advanced_cluster"));
    }

    #[test]
    fn comments_are_appended() {
        let mut block = first_block("resource \"a\" \"b\" {\n  x = 1\n}\n");
        block.append_comments(&["first", "second"]).expect("valid block");

        let mut body = Body::default();
        body.push(Structure::Block(block));
        let text = body.to_string();

        assert!(
            text.contains("  x = 1\n\n  # first\n  # second\n}"),
            "unexpected output: {text}"
        );
    }

    #[test]
    fn comments_are_appended_to_oneline_blocks() {
        let mut document = Document::parse(
            "data \"a\" \"b\" { x = var.x }\n\ndata \"a\" \"c\" {\n  y = 1\n} # end of {c}\n",
        )
        .expect("valid document");
        document
            .update_blocks(|block| block.append_comments(&["note"]))
            .expect("comments can be appended");

        let text = document.to_string();
        assert_eq!(text.matches("# note\n").count(), 2, "{text}");
        assert!(text.contains("} # end of {c}\n"), "{text}");

        let reparsed = hcl::parse(&text).expect("valid output");
        assert_eq!(reparsed.blocks().count(), 2);
    }

    #[test]
    fn appended_snippets() {
        let mut document = Document::parse("a = 1\n").expect("valid document");
        document
            .append("\nmoved {\n  from = a.b\n  to   = c.b\n}\n")
            .expect("valid snippet");

        let reparsed = hcl::parse(&document.to_string()).expect("valid output");
        assert_eq!(reparsed.blocks().count(), 1);
        assert_eq!(reparsed.attributes().count(), 1);
    }
}
