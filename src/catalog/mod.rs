/// Closed-set enumerations: categories and statuses.
pub mod enums;

/// Canonical book and member entities.
pub mod model;

/// Parsed rows and the per-kind field tables.
pub mod record;

/// Cart-style selection of book ids.
pub mod selection;

/// Record to entity conversion and the import processors.
pub mod transformer;

/// Field-level checks on parsed rows.
pub mod validator;

pub use enums::{BookStatus, Category, MemberStatus};
pub use model::{Book, Member};
pub use record::{EntityKind, RawRecord};
pub use selection::Selection;
pub use transformer::{BookProcessor, MemberProcessor};
