//! # Statetree
//!
//! The attribute-tree side of a declarative resource: ordered trees of
//! typed values, dotted attribute paths, prior/planned change detection and
//! the patch compiler that turns changed fields into JSON-patch operations.
//!
//! ## Core Concepts
//!
//! - **Tree / Value**: Ordered fields. Absent means unset, never zero
//! - **AttrPath**: `containers.0.image` style addressing
//! - **AttributeStore**: Planned values plus "did this path change"
//! - **Flatten / Expand**: Per-entity codec between external types and trees
//! - **compile**: Changed fields to ordered [`PatchOperation`]s
//!
//! ## Example
//!
//! ```ignore
//! use statetree::{Expand, Flatten, ResourceData};
//!
//! let observed = pod.spec.flatten();
//! let data = ResourceData::new(id, observed, desired_tree);
//! let ops = podspec::patch_pod_spec(&data, &"spec.0".parse()?, "/spec")?;
//! ```

pub mod codec;
pub mod error;
pub mod patch;
pub mod path;
pub mod store;
pub mod tree;

pub use codec::{Expand, Fields, Flatten};
pub use error::{Error, Result};
pub use patch::{
    FieldDescriptor, OpKind, PatchOperation, PatchOperations, Transform, compile, to_json,
};
pub use path::{AttrPath, Segment};
pub use store::{AttributeStore, ResourceData};
pub use tree::{Tree, Value};
