mod action;
mod backend;
mod cefr;
mod error;
mod event;
mod language;
mod level;
mod notification;
mod segment;
mod session;
mod slash_commands;
mod turn;
mod tutor_response;

pub use action::*;
pub use backend::*;
pub use cefr::*;
pub use error::*;
pub use event::*;
pub use language::*;
pub use level::*;
pub use notification::*;
pub use segment::*;
pub use session::*;
pub use slash_commands::*;
pub use turn::*;
pub use tutor_response::*;
