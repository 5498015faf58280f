//! dynamic blocks
//!
//! A dynamic block generates one nested block per element of a collection:
//! ```hcl
//! dynamic "tags" {
//!   for_each = var.tags
//!   content {
//!     key   = tags.key
//!     value = tags.value
//!   }
//! }
//! ```
//! Inside `content` the current element is referenced as `<label>.key` and `<label>.value`. When a dynamic block is
//! turned into a `for` comprehension those references are renamed to the comprehension variables.
use crate::document::{BlockExt, BodyExt, Slot};
use crate::error::Issue;
use crate::schema::{CONTENT, DYNAMIC, FOR_EACH};
use crate::tokens::expr_text;
use crate::visit::{VisitAttributesMut, VisitMut};
use hcl_edit::expr::Expression;
use hcl_edit::structure::{Attribute, Block, Body};
use hcl_edit::Decorate;

/// A dynamic block taken out of its body
#[derive(Debug)]
pub struct DynamicBlock {
    pub slot: Slot,
    pub for_each: Expression,
    pub content: Body,
}

impl DynamicBlock {
    /// Source text of the `for_each` collection
    pub fn collection(&self) -> String {
        expr_text(&self.for_each)
    }
}

/// Label of a `dynamic "<label>"` block
pub fn dynamic_label(block: &Block) -> Option<&str> {
    if !block.is_named(DYNAMIC) {
        return None;
    }
    block.label(0)
}

pub fn is_dynamic(block: &Block, name: &str) -> bool {
    dynamic_label(block) == Some(name)
}

/// Finds the dynamic block generating `name` blocks
///
/// With `exclusive` set, a dynamic block must not be mixed with static `name` blocks in the same body.
pub fn find_dynamic_block<'b>(
    body: &'b Body,
    name: &str,
    exclusive: bool,
) -> Result<Option<&'b Block>, Issue> {
    let Some(block) = body.blocks().find(|block| is_dynamic(block, name)) else {
        return Ok(None);
    };

    if exclusive && body.first_block(name).is_some() {
        return Err(Issue::MixedDynamicBlock(name.to_owned()));
    }
    if !block.body.has_attr(FOR_EACH) {
        return Err(Issue::IncompleteDynamicBlock {
            block: name.to_owned(),
            missing: FOR_EACH,
        });
    }
    if block.body.first_block(CONTENT).is_none() {
        return Err(Issue::IncompleteDynamicBlock {
            block: name.to_owned(),
            missing: CONTENT,
        });
    }

    Ok(Some(block))
}

/// Like [find_dynamic_block], but removes the dynamic block from `body`
pub fn take_dynamic_block(
    body: &mut Body,
    name: &str,
    exclusive: bool,
) -> Result<Option<DynamicBlock>, Issue> {
    if find_dynamic_block(body, name, exclusive)?.is_none() {
        return Ok(None);
    }
    let Some(index) = body.block_position(|block| is_dynamic(block, name)) else {
        return Ok(None);
    };
    let Some(mut block) = body.take_block_at(index) else {
        return Ok(None);
    };
    let slot = Slot::new(index, &block);

    let incomplete = |missing| Issue::IncompleteDynamicBlock {
        block: name.to_owned(),
        missing,
    };
    let for_each = block
        .body
        .pop_attr(FOR_EACH)
        .ok_or_else(|| incomplete(FOR_EACH))?;
    let (_, content) = block
        .body
        .take_first_block(CONTENT)
        .ok_or_else(|| incomplete(CONTENT))?;

    tracing::trace!(name, "dynamic block found");
    Ok(Some(DynamicBlock {
        slot,
        for_each,
        content: content.body,
    }))
}

/// Fails for any dynamic block in `body` whose label is not in `allowed`
pub fn check_allowed_dynamic_blocks(body: &Body, allowed: &[&str]) -> Result<(), Issue> {
    for block in body.blocks() {
        if let Some(label) = dynamic_label(block) {
            if !allowed.contains(&label) {
                return Err(Issue::UnsupportedDynamicBlock(label.to_owned()));
            }
        }
    }
    Ok(())
}

/// Rewrites `<block_name>.value.` to `<var_name>.` in every attribute of `body`, recursively
pub fn rename_iteration_variable(
    body: &mut Body,
    block_name: &str,
    var_name: &str,
) -> Result<(), Issue> {
    let mut renamer =
        ReferenceRenamer::new(format!("{block_name}.value."), format!("{var_name}."));
    body.visit_attributes_mut(&mut renamer);
    renamer.finish()
}

/// Plain text replacement of references
///
/// This also matches inside string literals and longer identifiers ending in the same name, which is how
/// the provider's own upgrade guide describes the rename.
pub fn replace_reference(text: &str, from: &str, to: &str) -> String {
    text.replace(from, to)
}

#[derive(derive_new::new)]
pub(crate) struct ReferenceRenamer {
    from: String,
    to: String,
    #[new(default)]
    error: Option<Issue>,
}

impl ReferenceRenamer {
    pub fn finish(self) -> Result<(), Issue> {
        match self.error {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }
}

impl VisitMut<Attribute> for ReferenceRenamer {
    #[tracing::instrument(level = "trace", skip_all)]
    fn visit_mut(&mut self, attr: &mut Attribute) {
        if self.error.is_some() {
            return;
        }

        let text = expr_text(&attr.value);
        if !text.contains(&self.from) {
            return;
        }

        let renamed = replace_reference(&text, &self.from, &self.to);
        match renamed.parse::<Expression>() {
            Ok(mut value) => {
                *value.decor_mut() = attr.value.decor().clone();
                attr.value = value;
            }
            Err(err) => {
                self.error = Some(Issue::InvalidExpression {
                    name: attr.key.value().to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }
}
