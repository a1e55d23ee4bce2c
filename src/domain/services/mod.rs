pub mod actions;
pub mod archive;
mod celebrations;
mod honey_ledger;
mod level_tracker;
mod partial_parser;
pub mod prompts;
mod reconciler;
pub mod render;
mod segments;
mod sessions;

pub use celebrations::*;
pub use honey_ledger::*;
pub use level_tracker::*;
pub use partial_parser::*;
pub use reconciler::*;
pub use segments::*;
pub use sessions::*;
