// ============================================================================
// Additional Properties
// ============================================================================
//
// `bag`         - in-memory key/value overlay on top of native attributes
// `row`/`store` - persisted property rows and their storage
// `persistence` - keeps the bag in sync with the rows
//
// ============================================================================

pub mod bag;
pub mod persistence;
pub mod row;
pub mod store;

pub use bag::{AdditionalProperties, HasAdditionalProperties};
pub use persistence::{HasProperties, PropertyCache};
pub use row::PropertyRow;
pub use store::{MemoryPropertyStore, PropertyStore};
