pub mod attachment_kind;
pub mod attachment_tables;

pub use attachment_kind::Attachment;
pub use attachment_tables::AttachmentTable;
