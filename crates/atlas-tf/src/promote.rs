//! block to attribute promotion
//!
//! The advanced cluster schema declares its nested objects as attributes:
//! ```hcl
//! timeouts {            # becomes    timeouts = {
//!   create = "60m"      #              create = "60m"
//! }                     #            }
//! ```
//! `tags` and `labels` are repeated `{ key, value }` blocks that collapse into a single map.
use crate::document::{BlockExt, BodyExt};
use crate::dynamic::{is_dynamic, replace_reference, take_dynamic_block, DynamicBlock};
use crate::error::Issue;
use crate::literal::Literal;
use crate::schema::{
    ADVANCED_CONFIGURATION, BI_CONNECTOR_CONFIG, DEPRECATED_ADVANCED_CONFIGURATION, KEY, LABELS,
    PINNED_FCV, TAGS, TIMEOUTS, VALUE,
};
use crate::tokens::{expr_text, ObjectTokens, Tokens};
use hcl_edit::expr::Expression;
use hcl_edit::structure::{Block, Body, Structure};

/// Promotes the optional blocks both cluster schemas share
pub fn promote_optional_blocks(body: &mut Body) -> Result<(), Issue> {
    for name in [TAGS, LABELS] {
        promote_map_blocks(body, name)?;
    }

    strip_deprecated(body, ADVANCED_CONFIGURATION, &DEPRECATED_ADVANCED_CONFIGURATION);
    for name in [
        ADVANCED_CONFIGURATION,
        BI_CONNECTOR_CONFIG,
        PINNED_FCV,
        TIMEOUTS,
    ] {
        promote_block(body, name)?;
    }
    Ok(())
}

/// Replaces the first `name` block with an attribute holding the same object
pub fn promote_block(body: &mut Body, name: &str) -> Result<(), Issue> {
    let Some((slot, block)) = body.take_first_block(name) else {
        return Ok(());
    };

    tracing::trace!(name, "promoting block");
    let object = ObjectTokens::from(&block.body);
    body.set_tokens(name, &Tokens::Object(object), Some(slot))
}

/// Removes `attrs` from the first `block_name` block
pub fn strip_deprecated(body: &mut Body, block_name: &str, attrs: &[&str]) {
    let Some(index) = body.block_position(|block| block.is_named(block_name)) else {
        return;
    };
    let Some(mut block) = body.take_block_at(index) else {
        return;
    };

    for attr in attrs {
        if block.body.remove_attr(attr) {
            tracing::debug!(block = block_name, attr, "removed deprecated attribute");
        }
    }
    body.insert(index, Structure::Block(block));
}

/// Collapses `name { key = .., value = .. }` blocks and a `dynamic "name"` block into one map attribute
///
/// When both are present the maps are merged, individual entries take precedence.
pub fn promote_map_blocks(body: &mut Body, name: &str) -> Result<(), Issue> {
    let slot = body.slot_where(|block| block.is_named(name) || is_dynamic(block, name));
    let dynamic = take_dynamic_block(body, name, false)?;
    let (_, blocks) = body.take_blocks(name);

    let dynamic_map = dynamic
        .map(|dynamic| map_from_dynamic(name, &dynamic))
        .transpose()?;
    let individual_map = if blocks.is_empty() {
        None
    } else {
        Some(map_from_blocks(name, &blocks)?)
    };

    let tokens = match (dynamic_map, individual_map) {
        (Some(dynamic_map), Some(individual_map)) => {
            Tokens::merge(vec![dynamic_map, individual_map])
        }
        (Some(map), None) | (None, Some(map)) => map,
        (None, None) => return Ok(()),
    };

    tracing::trace!(name, "promoting map blocks");
    body.set_tokens(name, &tokens, slot)
}

fn map_from_blocks(name: &str, blocks: &[Block]) -> Result<Tokens, Issue> {
    let mut map = ObjectTokens::new();
    for block in blocks {
        let (Some(key), Some(value)) = (block.body.attr(KEY), block.body.attr(VALUE)) else {
            return Err(Issue::MissingKeyValue(name.to_owned()));
        };
        map.set(map_key(key), Tokens::expr(value));
    }
    Ok(Tokens::Object(map))
}

fn map_from_dynamic(name: &str, dynamic: &DynamicBlock) -> Result<Tokens, Issue> {
    let (Some(key), Some(value)) = (dynamic.content.attr(KEY), dynamic.content.attr(VALUE)) else {
        return Err(Issue::MissingKeyValue(format!("dynamic block {name}")));
    };

    let key = replace_reference(&expr_text(key), &format!("{name}.{KEY}"), KEY);
    let value = replace_reference(&expr_text(value), &format!("{name}.{VALUE}"), VALUE);
    let collection = dynamic.collection();

    if key == KEY && value == VALUE {
        return Ok(Tokens::raw(collection));
    }
    Ok(Tokens::for_object(
        format!("{KEY}, {VALUE} in {collection}"),
        Tokens::raw(format!("{key} => {value}")),
    ))
}

const KEYWORDS: [&str; 6] = ["for", "if", "in", "true", "false", "null"];

/// Object key for a map entry
///
/// Literal identifiers are written bare, other literals quoted and everything else in parentheses so it is
/// evaluated instead of taken as a name. Keywords are quoted as well, a bare `for` starts a `for` expression.
fn map_key(key: &Expression) -> String {
    match Literal::of(key) {
        Some(Literal::String(name))
            if hcl::Identifier::new(name.as_str()).is_ok() && !KEYWORDS.contains(&name.as_str()) =>
        {
            name
        }
        Some(Literal::String(_)) => expr_text(key),
        _ => format!("({})", expr_text(key)),
    }
}
