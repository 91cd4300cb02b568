//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod alias;
pub mod config_cmd;
pub mod lists;
pub mod moves;
pub mod normalize;
pub mod simulate;
pub mod status;
pub mod util;

use macgate_core::{Controller, ListKind};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Allow(args) => lists::handle(controller, ListKind::Allow, args, global).await,
        Command::Deny(args) => lists::handle(controller, ListKind::Deny, args, global).await,
        Command::Move(args) => moves::handle(controller, args, global).await,
        Command::Alias(args) => alias::handle(controller, args, global).await,
        Command::Status => status::handle(controller, global).await,
        // Handled before a controller is started
        Command::Normalize { .. }
        | Command::Simulate(_)
        | Command::Config(_)
        | Command::Completions(_) => Err(CliError::Internal(
            "command does not run against the list store".into(),
        )),
    }
}
