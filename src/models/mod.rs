pub mod attachment;
pub mod loaders;
pub mod prompt;
pub mod record;
pub mod schema;
pub mod summary;

pub use attachment::{Attachment, AttachmentKind};
pub use loaders::{load_prompt_catalog, PromptCatalog};
pub use prompt::{OutputMode, PromptSpec};
pub use record::{ExtractedRecord, GenericDocument, PlantType, WasteItem, WasteManifest};
pub use schema::SchemaKind;
pub use summary::{AggregationRow, ErrorRow};
