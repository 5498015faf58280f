//! names of the block kinds, resource types, attributes and nested blocks we read or write

pub const RESOURCE: &str = "resource";
pub const DATA: &str = "data";
pub const DYNAMIC: &str = "dynamic";
pub const MOVED: &str = "moved";

pub const CLUSTER: &str = "mongodbatlas_cluster";
pub const CLUSTERS: &str = "mongodbatlas_clusters";
pub const ADVANCED_CLUSTER: &str = "mongodbatlas_advanced_cluster";
pub const ADVANCED_CLUSTERS: &str = "mongodbatlas_advanced_clusters";

pub const REPLICA_SET: &str = "\"REPLICASET\"";

// dynamic block
pub const FOR_EACH: &str = "for_each";
pub const CONTENT: &str = "content";
pub const KEY: &str = "key";
pub const VALUE: &str = "value";

// comprehension variables
pub const SPEC: &str = "spec";
pub const REGION: &str = "region";

// topology
pub const REPLICATION_SPECS: &str = "replication_specs";
pub const REGION_CONFIGS: &str = "region_configs";
pub const REGIONS_CONFIG: &str = "regions_config";
pub const NUM_SHARDS: &str = "num_shards";
pub const ZONE_NAME: &str = "zone_name";
pub const CLUSTER_TYPE: &str = "cluster_type";
pub const PRIORITY: &str = "priority";
pub const REGION_NAME: &str = "region_name";
pub const PROVIDER_REGION_NAME: &str = "provider_region_name";
pub const PROVIDER_NAME: &str = "provider_name";
pub const BACKING_PROVIDER_NAME: &str = "backing_provider_name";

/// Region priorities are in `MIN_PRIORITY..=MAX_PRIORITY`, higher is preferred
pub const MAX_PRIORITY: i64 = 7;
pub const MIN_PRIORITY: i64 = 1;

// node specs
pub const ELECTABLE_NODES: &str = "electable_nodes";
pub const READ_ONLY_NODES: &str = "read_only_nodes";
pub const ANALYTICS_NODES: &str = "analytics_nodes";
pub const ELECTABLE_SPECS: &str = "electable_specs";
pub const READ_ONLY_SPECS: &str = "read_only_specs";
pub const ANALYTICS_SPECS: &str = "analytics_specs";
pub const AUTO_SCALING: &str = "auto_scaling";
pub const NODE_COUNT: &str = "node_count";
pub const INSTANCE_SIZE: &str = "instance_size";
pub const PROVIDER_INSTANCE_SIZE_NAME: &str = "provider_instance_size_name";
pub const DISK_SIZE_GB: &str = "disk_size_gb";
pub const PROVIDER_VOLUME_TYPE: &str = "provider_volume_type";
pub const EBS_VOLUME_TYPE: &str = "ebs_volume_type";
pub const PROVIDER_DISK_IOPS: &str = "provider_disk_iops";
pub const DISK_IOPS: &str = "disk_iops";

/// legacy top-level auto scaling attributes and their names inside `auto_scaling`
pub const AUTO_SCALING_RENAMES: [(&str, &str); 5] = [
    ("auto_scaling_disk_gb_enabled", "disk_gb_enabled"),
    ("auto_scaling_compute_enabled", "compute_enabled"),
    (
        "provider_auto_scaling_compute_min_instance_size",
        "compute_min_instance_size",
    ),
    (
        "provider_auto_scaling_compute_max_instance_size",
        "compute_max_instance_size",
    ),
    (
        "auto_scaling_compute_scale_down_enabled",
        "compute_scale_down_enabled",
    ),
];

// optional blocks
pub const CLOUD_BACKUP: &str = "cloud_backup";
pub const BACKUP_ENABLED: &str = "backup_enabled";
pub const TAGS: &str = "tags";
pub const LABELS: &str = "labels";
pub const ADVANCED_CONFIGURATION: &str = "advanced_configuration";
pub const BI_CONNECTOR_CONFIG: &str = "bi_connector_config";
pub const PINNED_FCV: &str = "pinned_fcv";
pub const TIMEOUTS: &str = "timeouts";

/// `advanced_configuration` attributes the advanced cluster no longer accepts
pub const DEPRECATED_ADVANCED_CONFIGURATION: [&str; 2] =
    ["fail_index_key_too_long", "default_read_concern"];
