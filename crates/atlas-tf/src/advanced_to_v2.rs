//! `mongodbatlas_advanced_cluster` blocks to attributes
//!
//! Version 2 of the advanced cluster schema declares every nested object as an attribute. The topology keeps its
//! shape but `replication_specs` and `region_configs` turn into lists of objects, and each shard is listed on its
//! own instead of being counted by `num_shards`. A top-level `disk_size_gb` moves into the hardware specs of every
//! region.
//!
//! Resources already using attributes are left untouched, so running the conversion twice is harmless.
use crate::document::{BlockExt, BodyExt, Document};
use crate::dynamic::{find_dynamic_block, rename_iteration_variable, take_dynamic_block};
use crate::error::{ConvertError, Issue};
use crate::literal;
use crate::promote::promote_optional_blocks;
use crate::schema::*;
use crate::shards::{expand_shards, sort_by_priority, RegionConfig, Shard, ShardCount};
use crate::tokens::{ObjectTokens, Tokens};
use hcl_edit::structure::{Block, Body};

const UPDATED_COMMENTS: [&str; 1] = ["Updated by atlas-tf, please review the changes."];

/// Attributes that only exist in the new schema
const UPDATED_ATTRIBUTES: [&str; 7] = [
    REPLICATION_SPECS,
    TAGS,
    LABELS,
    ADVANCED_CONFIGURATION,
    BI_CONNECTOR_CONFIG,
    PINNED_FCV,
    TIMEOUTS,
];

const HARDWARE_SPECS: [&str; 3] = [ELECTABLE_SPECS, READ_ONLY_SPECS, ANALYTICS_SPECS];

/// Converts all `mongodbatlas_advanced_cluster` resources in `config` that still use blocks
#[tracing::instrument(level = "trace", skip_all)]
pub fn advanced_cluster_to_v2(config: &str) -> Result<String, ConvertError> {
    let mut document = Document::parse(config)?;

    document.update_blocks(|block| {
        if update_resource(block)? {
            block.append_comments(&UPDATED_COMMENTS)?;
        }
        Ok(())
    })?;
    Ok(document.to_string())
}

fn update_resource(block: &mut Block) -> Result<bool, ConvertError> {
    if !block.is_kind(RESOURCE, ADVANCED_CLUSTER) {
        return Ok(false);
    }
    if is_updated(&block.body) {
        tracing::debug!(name = ?block.label(1), "advanced cluster already uses attributes, skipping");
        return Ok(false);
    }

    tracing::debug!(name = ?block.label(1), "updating advanced cluster");
    update_cluster(&mut block.body).map_err(|issue| ConvertError::validation(block, issue))?;
    Ok(true)
}

fn is_updated(body: &Body) -> bool {
    UPDATED_ATTRIBUTES.iter().any(|name| body.has_attr(name))
}

fn update_cluster(body: &mut Body) -> Result<(), Issue> {
    let disk_size_gb = body.pop_attr(DISK_SIZE_GB).map(|value| Tokens::expr(&value));
    update_replication_specs(body, disk_size_gb.as_ref())?;
    promote_optional_blocks(body)
}

fn update_replication_specs(body: &mut Body, disk_size_gb: Option<&Tokens>) -> Result<(), Issue> {
    if let Some(dynamic) = take_dynamic_block(body, REPLICATION_SPECS, true)? {
        tracing::trace!("updating replication_specs from dynamic block");

        let collection = dynamic.collection();
        let mut content = dynamic.content;
        rename_iteration_variable(&mut content, REPLICATION_SPECS, SPEC)?;
        let shard = replication_spec(&mut content, disk_size_gb)?;

        let tokens = Tokens::flatten(Tokens::for_array(
            format!("{SPEC} in {collection}"),
            shard.expand(),
        ));
        return body.set_tokens(REPLICATION_SPECS, &tokens, Some(dynamic.slot));
    }

    let (slot, blocks) = body.take_blocks(REPLICATION_SPECS);
    if blocks.is_empty() {
        return Err(Issue::NoBlocks {
            parent: RESOURCE,
            name: REPLICATION_SPECS,
        });
    }

    let shards = blocks
        .into_iter()
        .map(|mut block| replication_spec(&mut block.body, disk_size_gb))
        .collect::<Result<Vec<_>, _>>()?;
    body.set_tokens(REPLICATION_SPECS, &expand_shards(shards), slot)
}

/// The spec keeps its own attributes, `region_configs` is always the last one
fn replication_spec(spec_body: &mut Body, disk_size_gb: Option<&Tokens>) -> Result<Shard, Issue> {
    let count = ShardCount::classify(spec_body.pop_attr(NUM_SHARDS).as_ref())?;
    let region_configs = region_configs(spec_body, disk_size_gb)?;

    let mut spec = ObjectTokens::from(&*spec_body);
    spec.set(REGION_CONFIGS, region_configs);
    Ok(Shard::new(count, spec))
}

fn region_configs(spec_body: &mut Body, disk_size_gb: Option<&Tokens>) -> Result<Tokens, Issue> {
    // older configurations still generate `regions_config` dynamically
    if spec_body.first_block(REGION_CONFIGS).is_some()
        && find_dynamic_block(spec_body, REGIONS_CONFIG, false)?.is_some()
    {
        return Err(Issue::MixedDynamicBlock(REGIONS_CONFIG.to_owned()));
    }

    for name in [REGION_CONFIGS, REGIONS_CONFIG] {
        let Some(dynamic) = take_dynamic_block(spec_body, name, true)? else {
            continue;
        };

        let collection = dynamic.collection();
        let mut content = dynamic.content;
        rename_iteration_variable(&mut content, name, REGION)?;
        let config = region_config(&content, disk_size_gb).sorted();
        return Ok(Tokens::for_array(
            format!("{REGION} in {collection}"),
            Tokens::Object(config),
        ));
    }

    let (_, blocks) = spec_body.take_blocks(REGION_CONFIGS);
    if blocks.is_empty() {
        return Err(Issue::NoBlocks {
            parent: REPLICATION_SPECS,
            name: REGION_CONFIGS,
        });
    }

    let configs = blocks
        .iter()
        .map(|block| {
            let priority = block.body.attr(PRIORITY).and_then(literal::integer);
            RegionConfig::new(priority, region_config(&block.body, disk_size_gb))
        })
        .collect();
    Ok(Tokens::array(sort_by_priority(configs)))
}

fn region_config(config_body: &Body, disk_size_gb: Option<&Tokens>) -> ObjectTokens {
    let mut config = ObjectTokens::from(config_body);
    let Some(disk_size_gb) = disk_size_gb else {
        return config;
    };

    for name in HARDWARE_SPECS {
        if let Some(Tokens::Object(spec)) = config.get_mut(name) {
            spec.set(DISK_SIZE_GB, disk_size_gb.clone());
        }
    }
    config
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn convert(input: &str) -> String {
        advanced_cluster_to_v2(input).expect("conversion succeeds")
    }

    fn convert_err(input: &str) -> Issue {
        advanced_cluster_to_v2(input)
            .expect_err("conversion fails")
            .issue()
            .cloned()
            .expect("validation error")
    }

    fn parsed(input: &str) -> hcl::Body {
        hcl::parse(input).expect("configuration must be valid")
    }

    const CLUSTER: &str = r#"
resource "mongodbatlas_advanced_cluster" "this" {
  project_id   = var.project_id
  name         = "cluster"
  cluster_type = "REPLICASET"
  disk_size_gb = 100

  replication_specs {
    region_configs {
      priority      = 6
      provider_name = "AWS"
      region_name   = "US_WEST_2"
      read_only_specs {
        node_count    = 1
        instance_size = "M10"
      }
    }
    region_configs {
      priority      = 7
      provider_name = "AWS"
      region_name   = "US_EAST_1"
      electable_specs {
        node_count    = 3
        instance_size = "M10"
      }
      auto_scaling {
        disk_gb_enabled = true
      }
    }
  }

  tags {
    key   = "environment"
    value = "dev"
  }

  timeouts {
    create = "60m"
  }
}
"#;

    #[test]
    fn blocks_become_attributes() {
        let output = convert(CLUSTER);

        assert_eq!(
            parsed(&output),
            parsed(
                r#"
resource "mongodbatlas_advanced_cluster" "this" {
  project_id   = var.project_id
  name         = "cluster"
  cluster_type = "REPLICASET"
  replication_specs = [
    {
      region_configs = [
        {
          priority      = 7
          provider_name = "AWS"
          region_name   = "US_EAST_1"
          electable_specs = {
            node_count    = 3
            instance_size = "M10"
            disk_size_gb  = 100
          }
          auto_scaling = {
            disk_gb_enabled = true
          }
        },
        {
          priority      = 6
          provider_name = "AWS"
          region_name   = "US_WEST_2"
          read_only_specs = {
            node_count    = 1
            instance_size = "M10"
            disk_size_gb  = 100
          }
        }
      ]
    }
  ]
  tags = {
    environment = "dev"
  }
  timeouts = {
    create = "60m"
  }
}
"#
            )
        );
        assert!(output.contains("# Updated by atlas-tf, please review the changes."));
    }

    #[test]
    fn updated_resources_are_skipped() {
        let output = convert(CLUSTER);
        assert_eq!(convert(&output), output);
    }

    #[test]
    fn shards_are_listed_individually() {
        let output = convert(
            r#"
resource "mongodbatlas_advanced_cluster" "this" {
  cluster_type = "GEOSHARDED"
  replication_specs {
    zone_name  = "zone 1"
    num_shards = 2
    region_configs {
      priority      = 7
      provider_name = "AWS"
      region_name   = "US_EAST_1"
    }
  }
  replication_specs {
    zone_name = "zone 2"
    region_configs {
      priority      = 7
      provider_name = "AWS"
      region_name   = "EU_WEST_1"
    }
  }
}
"#,
        );

        let shard = |zone: &str, region: &str| {
            format!(
                "{{\n zone_name = \"{zone}\"\n region_configs = [{{\n priority = 7\n provider_name = \"AWS\"\n region_name = \"{region}\"\n }}]\n }}"
            )
        };
        let expected = format!(
            "resource \"mongodbatlas_advanced_cluster\" \"this\" {{\n cluster_type = \"GEOSHARDED\"\n replication_specs = [\n{},\n{},\n{}\n]\n}}\n",
            shard("zone 1", "US_EAST_1"),
            shard("zone 1", "US_EAST_1"),
            shard("zone 2", "EU_WEST_1"),
        );
        assert_eq!(parsed(&output), parsed(&expected));
    }

    #[test]
    fn symbolic_shards_use_comprehensions() {
        let output = convert(
            r#"
resource "mongodbatlas_advanced_cluster" "this" {
  replication_specs {
    num_shards = var.shards
    region_configs {
      priority      = 7
      provider_name = "AWS"
      region_name   = "US_EAST_1"
    }
  }
}
"#,
        );

        assert!(output.contains("for i in range(var.shards) :"), "{output}");
        assert!(!output.contains("num_shards"), "{output}");
    }

    #[test]
    fn dynamic_region_configs() {
        let output = convert(
            r#"
resource "mongodbatlas_advanced_cluster" "this" {
  disk_size_gb = var.disk
  replication_specs {
    zone_name = "zone"
    dynamic "region_configs" {
      for_each = var.regions
      content {
        region_name   = region_configs.value.name
        provider_name = "AWS"
        priority      = region_configs.value.priority
        electable_specs {
          node_count    = region_configs.value.nodes
          instance_size = "M10"
        }
      }
    }
  }
}
"#,
        );

        assert_eq!(
            parsed(&output),
            parsed(
                r#"
resource "mongodbatlas_advanced_cluster" "this" {
  replication_specs = [
    {
      zone_name = "zone"
      region_configs = [
        for region in var.regions : {
          electable_specs = {
            disk_size_gb  = var.disk
            instance_size = "M10"
            node_count    = region.nodes
          }
          priority      = region.priority
          provider_name = "AWS"
          region_name   = region.name
        }
      ]
    }
  ]
}
"#
            )
        );
    }

    #[test]
    fn dynamic_replication_specs() {
        let output = convert(
            r#"
resource "mongodbatlas_advanced_cluster" "this" {
  dynamic "replication_specs" {
    for_each = var.replication_specs
    content {
      zone_name  = replication_specs.value.zone_name
      num_shards = replication_specs.value.num_shards
      dynamic "region_configs" {
        for_each = replication_specs.value.region_configs
        content {
          priority      = region_configs.value.priority
          provider_name = region_configs.value.provider_name
          region_name   = region_configs.value.region_name
        }
      }
    }
  }
}
"#,
        );

        assert_eq!(
            parsed(&output),
            parsed(
                r#"
resource "mongodbatlas_advanced_cluster" "this" {
  replication_specs = flatten([
    for spec in var.replication_specs : [
      for i in range(spec.num_shards) : {
        zone_name = spec.zone_name
        region_configs = [
          for region in spec.region_configs : {
            priority      = region.priority
            provider_name = region.provider_name
            region_name   = region.region_name
          }
        ]
      }
    ]
  ])
}
"#
            )
        );
    }

    #[test]
    fn replication_specs_are_required() {
        let issue = convert_err(
            "resource \"mongodbatlas_advanced_cluster\" \"this\" {\n  name = \"cluster\"\n}\n",
        );

        assert_eq!(
            issue.to_string(),
            "resource must have at least one replication_specs"
        );
    }

    #[test]
    fn region_configs_are_required() {
        let issue = convert_err(
            r#"
resource "mongodbatlas_advanced_cluster" "this" {
  replication_specs {
    zone_name = "zone"
  }
}
"#,
        );

        assert_eq!(
            issue.to_string(),
            "replication_specs must have at least one region_configs"
        );
    }

    #[test]
    fn dynamic_regions_config_excludes_region_configs() {
        let issue = convert_err(
            r#"
resource "mongodbatlas_advanced_cluster" "this" {
  replication_specs {
    region_configs {
      region_name   = "US_EAST_1"
      provider_name = "AWS"
      priority      = 7
    }
    dynamic "regions_config" {
      for_each = var.regions
      content {
        region_name = regions_config.value.name
      }
    }
  }
}
"#,
        );

        assert_eq!(
            issue,
            Issue::MixedDynamicBlock(REGIONS_CONFIG.to_owned())
        );
    }

    #[test]
    fn other_resources_are_untouched() {
        let input = r#"
resource "mongodbatlas_cluster" "legacy" {
  replication_specs {
    num_shards = 1
  }
}

data "mongodbatlas_advanced_cluster" "this" {
  name = "cluster"
}
"#;
        assert_eq!(convert(input), input);
    }
}
