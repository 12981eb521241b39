//! Annotation session core
//!
//! The session state machine, the persisted record types and the checks and
//! lookups that surround them.

pub(crate) mod compat;
pub(crate) mod reference;
pub(crate) mod scan;
pub(crate) mod schema;
pub(crate) mod session;
pub(crate) mod types;

pub(crate) use compat::{Incompatibility, check_compatibility};
pub(crate) use reference::{ReferenceResolver, missing_references};
pub(crate) use scan::{find_images, shuffle};
pub(crate) use schema::AnnotationSchema;
pub(crate) use session::{FileState, Moved, Progress, Session};
pub(crate) use types::{CheckState, CheckValue, RatedStatus, Rotation, SessionRecord};
