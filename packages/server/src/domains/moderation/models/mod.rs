pub mod code;
pub mod content_block;
pub mod control_record;
pub mod verdict;

pub use code::{generate_mcode, McodeSize, ModerationCode, DEFAULT_MCODE_LENGTH, MAX_MCODE_LENGTH};
pub use content_block::ContentBlock;
pub use control_record::{BlockEntry, ModerationControlRecord, Report};
pub use verdict::Verdict;
