//! Commands of an Opus, each turning one [`CommandExecutionContext`] into the next.

pub mod factory;
pub mod insert;
pub mod mapstylesheet;

use crate::context::CommandExecutionContext;
use crate::error::NovellaError;
use crate::problem::Location;
use std::fmt::Debug;

pub use factory::{create_command, create_commands};
pub use insert::{find_last_level, InsertCommand};
pub use mapstylesheet::MapstylesheetCommand;

pub trait Command: Debug + Send + Sync {
    /// Where the command was written.
    fn location(&self) -> &Location;

    /// Gives the context after this command. Failures the user can fix are recorded as
    /// problems of the returned context; an `Err` aborts the whole assembly.
    fn evaluate(&self, context: CommandExecutionContext)
        -> Result<CommandExecutionContext, NovellaError>;
}

/// What happens to the head of an inserted Novella.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelHead {
    /// Wraps the inserted content into a level titled after the file.
    CreateLevel,
    /// Inlines the content of a lone inserted level.
    NoHead,
}
