//! atlas-tf cli interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; atlas-tf ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert mongodbatlas_cluster to mongodbatlas_advanced_cluster
    #[command(name = "clusterToAdvancedCluster", alias = "clu2adv")]
    ClusterToAdvancedCluster(ClusterToAdvancedClusterCommand),

    /// Convert mongodbatlas_advanced_cluster blocks to attributes
    ///
    /// Resources already using attributes are left unchanged.
    #[command(name = "advancedClusterToV2", alias = "adv2v2")]
    AdvancedClusterToV2(FileArgs),
}

#[derive(Parser, Debug)]
pub struct ClusterToAdvancedClusterCommand {
    #[clap(flatten)]
    pub files: FileArgs,

    /// Add moved blocks so terraform keeps the existing clusters
    #[clap(short = 'm', long = "includeMoved")]
    pub include_moved: bool,
}

#[derive(Parser, Debug)]
pub struct FileArgs {
    /// Input file
    #[clap(short = 'f', long = "file")]
    pub file: PathBuf,

    /// Output file
    #[clap(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Overwrite the output file if it exists
    #[clap(short = 'r', long = "replaceOutput")]
    pub replace_output: bool,

    /// Keep running and convert again whenever the input file changes
    ///
    /// Conversion errors are written to the output file as a comment instead of stopping.
    #[clap(short = 'w', long = "watch")]
    pub watch: bool,
}
