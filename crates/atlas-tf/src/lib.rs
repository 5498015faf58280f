//! # atlas-tf - MongoDB Atlas terraform migrations
//!
//! Rewrites terraform configurations using the MongoDB Atlas provider:
//! - [cluster_to_advanced_cluster] converts `mongodbatlas_cluster` resources and data sources to
//!   `mongodbatlas_advanced_cluster`
//! - [advanced_cluster_to_v2] converts `mongodbatlas_advanced_cluster` resources from nested blocks to the
//!   attribute based schema of provider version 2
//!
//! Both take the configuration as text and return the rewritten text. Everything that is not converted keeps its
//! formatting and comments.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `atlas-tf` works internally.
//!
//! ### HCL Terms
//!
//! Quick introduction to terms used to describe elements of HCL documents.
//!
//! In hcl terms...
//! - a file gets parsed as a `body`
//! - ...which is just a list of `structures`
//! - ...where there are two kinds:
//!   - `attribute`: a "key = value" pair
//!   - or `block`:
//!     - 1 `identifier`
//!     - followed by 0 or more `labels`
//!     - and a `body` enclosed in `{` and `}`
//!
//! A terraform resource is a block with the identifier `resource` and two labels, its type and its name:
//! ```hcl
//! resource "mongodbatlas_cluster" "this" {
//!   name = "cluster"
//!
//!   replication_specs {
//!     num_shards = 1
//!   }
//! }
//! ```
//!
//! ### Parsing
//!
//! A configuration is parsed into a [document::Document] which wraps an [hcl_edit::structure::Body]. `hcl_edit` keeps
//! whitespace and comments (its "decor") so untouched parts of the file are written back exactly as they were read.
//! [document::BodyExt] and [document::BlockExt] add the lookups and edits the conversions need.
//!
//! ### Converting
//!
//! Each conversion walks the top level blocks ([document::Document::update_blocks]) and rewrites the ones it is
//! responsible for. A rewrite takes attributes and blocks out of the resource body and puts new attributes back.
//!
//! New attribute values are built as [tokens::Tokens], a small tree of objects, arrays, function calls and `for`
//! expressions holding the source text of the original expressions. Expressions are never evaluated, references to
//! variables and other resources are copied verbatim. The tree is rendered to text and parsed again into an
//! [hcl_edit::expr::Expression], so every generated value is known to be valid HCL.
//!
//! Whether an expression is a literal (a shard count of `2` vs. `var.shards`) is decided by folding it with
//! [hcl::eval] in an empty context: anything referencing a variable fails to evaluate and stays symbolic.
//!
//! ### Dynamic blocks
//!
//! `dynamic` blocks generate blocks from a collection. They are converted into `for` expressions over the same
//! collection, references to the iteration variable (`replication_specs.value.x`) are renamed to the variable of the
//! generated expression (`spec.x`).
//!
//! ### Errors
//!
//! A conversion fails as a whole with a [ConvertError], either because the input is not valid HCL or because a
//! resource it should convert is missing something it needs. Resources of other types are never an error.
//!
pub mod advanced_to_v2;
pub mod cluster_to_advanced;
pub mod document;
mod dynamic;
pub mod error;
mod literal;
mod promote;
mod schema;
mod shards;
pub mod tokens;
mod visit;

pub use advanced_to_v2::advanced_cluster_to_v2;
pub use cluster_to_advanced::cluster_to_advanced_cluster;
pub use error::{ConvertError, Issue};
