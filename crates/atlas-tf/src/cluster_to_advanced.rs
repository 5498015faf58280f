//! `mongodbatlas_cluster` to `mongodbatlas_advanced_cluster`
//!
//! The legacy cluster keeps its hardware settings at the top level and describes the topology with
//! `replication_specs` / `regions_config` blocks:
//! ```hcl
//! resource "mongodbatlas_cluster" "this" {
//!   project_id                  = var.project_id
//!   name                        = "cluster"
//!   provider_name               = "AWS"
//!   provider_instance_size_name = "M10"
//!   replication_specs {
//!     num_shards = 1
//!     regions_config {
//!       region_name     = "US_EAST_1"
//!       electable_nodes = 3
//!       priority        = 7
//!     }
//!   }
//! }
//! ```
//! The advanced cluster lists every shard and every region with its own hardware specs:
//! ```hcl
//! resource "mongodbatlas_advanced_cluster" "this" {
//!   project_id = var.project_id
//!   name       = "cluster"
//!   replication_specs = [
//!     {
//!       region_configs = [
//!         {
//!           provider_name = "AWS"
//!           region_name   = "US_EAST_1"
//!           priority      = 7
//!           electable_specs = {
//!             node_count    = 3
//!             instance_size = "M10"
//!           }
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//! Top-level hardware attributes ([RootAttrs]) are copied into every generated spec. Clusters without
//! `replication_specs` are free tier clusters and get a single region config.
//!
//! Data sources are only renamed. Both get a comment pointing out that references need review.
use crate::document::{BlockExt, BodyExt, Document};
use crate::dynamic::{check_allowed_dynamic_blocks, rename_iteration_variable, take_dynamic_block};
use crate::error::{ConvertError, Issue};
use crate::literal;
use crate::promote::promote_optional_blocks;
use crate::schema::*;
use crate::shards::{expand_shards, sort_by_priority, RegionConfig, Shard, ShardCount};
use crate::tokens::{expr_text, ObjectTokens, Tokens};
use hcl_edit::structure::{Block, Body};

const GENERATED_COMMENTS: [&str; 2] = [
    "Generated by atlas-tf.",
    "Please review the changes and confirm that references to this resource are updated.",
];

const MOVED_HEADER: &str = "# Moved blocks
# Note: Remember to remove or comment out the old cluster definitions.";

const ALLOWED_DYNAMIC_BLOCKS: [&str; 3] = [TAGS, LABELS, REPLICATION_SPECS];

const FREE_CLUSTER: &str = "free cluster (because no replication_specs)";
const SETTING_REPLICATION_SPECS: &str = "setting replication_specs";

/// Converts all `mongodbatlas_cluster` resources and data sources in `config`
///
/// With `include_moved`, a `moved` block is appended for every converted resource so terraform keeps
/// managing the existing cluster instead of replacing it.
#[tracing::instrument(level = "trace", skip_all)]
pub fn cluster_to_advanced_cluster(config: &str, include_moved: bool) -> Result<String, ConvertError> {
    let mut document = Document::parse(config)?;
    let mut moved = vec![];

    document.update_blocks(|block| {
        let converted = if block.is_kind(RESOURCE, CLUSTER) {
            convert_resource(block)?;
            if include_moved {
                moved.extend(block.label(1).map(str::to_owned));
            }
            true
        } else {
            convert_data_source(block)
        };

        if converted {
            block.append_comments(&GENERATED_COMMENTS)?;
        }
        Ok(())
    })?;

    if !moved.is_empty() {
        document.append(&moved_blocks(&moved))?;
    }
    Ok(document.to_string())
}

fn convert_resource(block: &mut Block) -> Result<(), ConvertError> {
    tracing::debug!(name = ?block.label(1), "converting cluster resource");

    fill_cluster(&mut block.body).map_err(|issue| ConvertError::validation(block, issue))?;
    block.set_label(0, ADVANCED_CLUSTER);
    Ok(())
}

fn convert_data_source(block: &mut Block) -> bool {
    let renamed = if block.is_kind(DATA, CLUSTER) {
        ADVANCED_CLUSTER
    } else if block.is_kind(DATA, CLUSTERS) {
        ADVANCED_CLUSTERS
    } else {
        return false;
    };

    tracing::debug!(name = ?block.label(1), renamed, "renaming data source");
    block.set_label(0, renamed);
    true
}

fn moved_blocks(names: &[String]) -> String {
    let blocks = names
        .iter()
        .map(|name| {
            format!("{MOVED} {{\n  from = {CLUSTER}.{name}\n  to   = {ADVANCED_CLUSTER}.{name}\n}}\n")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("\n{MOVED_HEADER}\n\n{blocks}")
}

fn fill_cluster(body: &mut Body) -> Result<(), Issue> {
    check_allowed_dynamic_blocks(body, &ALLOWED_DYNAMIC_BLOCKS)?;

    if is_free_cluster(body) {
        fill_free_cluster(body)?;
    } else {
        fill_replication_specs(body)?;
    }
    promote_optional_blocks(body)
}

fn is_free_cluster(body: &Body) -> bool {
    body.first_block(REPLICATION_SPECS).is_none()
        && body
            .block_position(|block| crate::dynamic::is_dynamic(block, REPLICATION_SPECS))
            .is_none()
}

fn fill_free_cluster(body: &mut Body) -> Result<(), Issue> {
    tracing::trace!("filling free cluster");

    let region_name = pop_required(body, PROVIDER_REGION_NAME, FREE_CLUSTER)?;
    let provider_name = pop_required(body, PROVIDER_NAME, FREE_CLUSTER)?;
    let backing_provider_name = pop_required(body, BACKING_PROVIDER_NAME, FREE_CLUSTER)?;
    let instance_size = pop_required(body, PROVIDER_INSTANCE_SIZE_NAME, FREE_CLUSTER)?;

    let config = ObjectTokens::new()
        .with(PRIORITY, Tokens::raw(MAX_PRIORITY.to_string()))
        .with(REGION_NAME, region_name)
        .with(PROVIDER_NAME, provider_name)
        .with(BACKING_PROVIDER_NAME, backing_provider_name)
        .with(
            ELECTABLE_SPECS,
            Tokens::Object(ObjectTokens::new().with(INSTANCE_SIZE, instance_size)),
        );
    let spec = ObjectTokens::new().with(REGION_CONFIGS, Tokens::array_single(config));

    body.set_tokens(CLUSTER_TYPE, &Tokens::raw(REPLICA_SET), None)?;
    body.set_tokens(REPLICATION_SPECS, &Tokens::array_single(spec), None)
}

/// Top-level attributes moved into every generated region config
#[derive(Debug)]
struct RootAttrs {
    provider_name: Tokens,
    instance_size: Tokens,
    disk_size_gb: Option<Tokens>,
    ebs_volume_type: Option<Tokens>,
    disk_iops: Option<Tokens>,
    auto_scaling: ObjectTokens,
}

impl RootAttrs {
    fn pop(body: &mut Body) -> Result<Self, Issue> {
        let provider_name = pop_required(body, PROVIDER_NAME, SETTING_REPLICATION_SPECS)?;
        let instance_size =
            pop_required(body, PROVIDER_INSTANCE_SIZE_NAME, SETTING_REPLICATION_SPECS)?;

        let mut auto_scaling = ObjectTokens::new();
        for (source, target) in AUTO_SCALING_RENAMES {
            if let Some(value) = pop_optional(body, source) {
                auto_scaling.set(target, value);
            }
        }

        // node counts are only meaningful per region
        for name in [ELECTABLE_NODES, READ_ONLY_NODES, ANALYTICS_NODES] {
            body.remove_attr(name);
        }

        Ok(Self {
            provider_name,
            instance_size,
            disk_size_gb: pop_optional(body, DISK_SIZE_GB),
            ebs_volume_type: pop_optional(body, PROVIDER_VOLUME_TYPE),
            disk_iops: pop_optional(body, PROVIDER_DISK_IOPS),
            auto_scaling,
        })
    }
}

fn pop_required(body: &mut Body, name: &'static str, context: &'static str) -> Result<Tokens, Issue> {
    pop_optional(body, name).ok_or(Issue::MissingAttribute { context, name })
}

fn pop_optional(body: &mut Body, name: &str) -> Option<Tokens> {
    body.pop_attr(name).map(|value| Tokens::expr(&value))
}

fn fill_replication_specs(body: &mut Body) -> Result<(), Issue> {
    let root = RootAttrs::pop(body)?;
    body.remove_attr(NUM_SHARDS);
    body.rename_attr(CLOUD_BACKUP, BACKUP_ENABLED);

    if let Some(dynamic) = take_dynamic_block(body, REPLICATION_SPECS, true)? {
        tracing::trace!("filling replication_specs from dynamic block");

        let collection = dynamic.collection();
        let mut content = dynamic.content;
        rename_iteration_variable(&mut content, REPLICATION_SPECS, SPEC)?;
        let shard = replication_spec(&mut content, &root)?;

        let tokens = Tokens::flatten(Tokens::for_array(
            format!("{SPEC} in {collection}"),
            shard.expand(),
        ));
        return body.set_tokens(REPLICATION_SPECS, &tokens, Some(dynamic.slot));
    }

    let (slot, blocks) = body.take_blocks(REPLICATION_SPECS);
    let shards = blocks
        .into_iter()
        .map(|mut block| replication_spec(&mut block.body, &root))
        .collect::<Result<Vec<_>, _>>()?;

    body.set_tokens(REPLICATION_SPECS, &expand_shards(shards), slot)
}

fn replication_spec(spec_body: &mut Body, root: &RootAttrs) -> Result<Shard, Issue> {
    let mut spec = ObjectTokens::new();
    if let Some(zone_name) = spec_body.attr(ZONE_NAME) {
        spec.set(ZONE_NAME, Tokens::expr(zone_name));
    }

    let num_shards = spec_body.attr(NUM_SHARDS).ok_or(Issue::MissingAttribute {
        context: SETTING_REPLICATION_SPECS,
        name: NUM_SHARDS,
    })?;
    let count = ShardCount::classify(Some(num_shards))?;

    spec.set(REGION_CONFIGS, region_configs(spec_body, root)?);
    Ok(Shard::new(count, spec))
}

fn region_configs(spec_body: &mut Body, root: &RootAttrs) -> Result<Tokens, Issue> {
    if let Some(dynamic) = take_dynamic_block(spec_body, REGIONS_CONFIG, true)? {
        let collection = dynamic.collection();
        let mut content = dynamic.content;
        rename_iteration_variable(&mut content, REGIONS_CONFIG, REGION)?;

        let priority = content.attr(PRIORITY).map(expr_text).ok_or(Issue::MissingAttribute {
            context: SETTING_REPLICATION_SPECS,
            name: PRIORITY,
        })?;
        let config = region_config(&content, root, true)?;

        // priorities are only known at plan time, so regions are grouped by every possible priority
        let regions = Tokens::for_array(format!("{REGION} in {collection}"), Tokens::Object(config))
            .with_condition(format!("{PRIORITY} == {priority}"));
        return Ok(Tokens::flatten(Tokens::for_array(
            format!("{PRIORITY} in range({MAX_PRIORITY}, {}, -1)", MIN_PRIORITY - 1),
            regions,
        )));
    }

    let (_, blocks) = spec_body.take_blocks(REGIONS_CONFIG);
    if blocks.is_empty() {
        return Err(Issue::MissingBlock {
            context: SETTING_REPLICATION_SPECS,
            name: REGIONS_CONFIG,
        });
    }

    let configs = blocks
        .into_iter()
        .map(|block| {
            let priority = block.body.attr(PRIORITY).and_then(literal::integer);
            let config = region_config(&block.body, root, false)?;
            Ok(RegionConfig::new(priority, config))
        })
        .collect::<Result<Vec<_>, Issue>>()?;

    Ok(Tokens::array(sort_by_priority(configs)))
}

fn region_config(
    config_body: &Body,
    root: &RootAttrs,
    in_dynamic_block: bool,
) -> Result<ObjectTokens, Issue> {
    let missing = |name| Issue::MissingAttribute {
        context: SETTING_REPLICATION_SPECS,
        name,
    };

    let region_name = config_body.attr(REGION_NAME).ok_or_else(|| missing(REGION_NAME))?;
    let priority = config_body.attr(PRIORITY).ok_or_else(|| missing(PRIORITY))?;
    if let Some(value) = literal::integer(priority) {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&value) {
            return Err(Issue::PriorityOutOfRange(value));
        }
    }

    let mut config = ObjectTokens::new()
        .with(PROVIDER_NAME, root.provider_name.clone())
        .with(REGION_NAME, Tokens::expr(region_name))
        .with(PRIORITY, Tokens::expr(priority));

    let specs = [
        (ELECTABLE_NODES, ELECTABLE_SPECS, true),
        (READ_ONLY_NODES, READ_ONLY_SPECS, false),
        (ANALYTICS_NODES, ANALYTICS_SPECS, false),
    ];
    for (count_name, spec_name, required) in specs {
        let Some(count) = config_body.attr(count_name) else {
            if required {
                return Err(missing(count_name));
            }
            continue;
        };
        if let Some(spec) = node_spec(count, root, in_dynamic_block) {
            config.set(spec_name, spec);
        }
    }

    if !root.auto_scaling.is_empty() {
        config.set(AUTO_SCALING, Tokens::Object(root.auto_scaling.clone()));
    }
    Ok(config)
}

/// Hardware spec for `count` nodes, `None` when the count is a literal zero
///
/// Inside a dynamic block a symbolic count may still turn out to be zero, the spec is then set to `null`.
fn node_spec(
    count: &hcl_edit::expr::Expression,
    root: &RootAttrs,
    in_dynamic_block: bool,
) -> Option<Tokens> {
    let literal_count = literal::integer(count);
    if literal_count == Some(0) {
        return None;
    }

    let mut spec = ObjectTokens::new()
        .with(NODE_COUNT, Tokens::expr(count))
        .with(INSTANCE_SIZE, root.instance_size.clone());
    let optional = [
        (DISK_SIZE_GB, &root.disk_size_gb),
        (EBS_VOLUME_TYPE, &root.ebs_volume_type),
        (DISK_IOPS, &root.disk_iops),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            spec.set(name, value.clone());
        }
    }

    let spec = Tokens::Object(spec);
    if in_dynamic_block && literal_count.is_none() {
        return Some(Tokens::prefixed(format!("{} == 0 ? null :", expr_text(count)), spec));
    }
    Some(spec)
}
