//! Move command handlers.

use macgate_core::Controller;

use crate::cli::{GlobalOpts, MoveArgs, MoveCommand};
use crate::commands::util::{self, MutationReport};
use crate::error::CliError;

pub async fn handle(
    controller: &Controller,
    args: MoveArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (mac, report, sentence) = match args.command {
        MoveCommand::ToAllow { mac } => {
            let mac = util::parse_mac(&mac)?;
            let durability = controller.move_to_allow(mac.as_str()).await?;
            let sentence = format!("Moved {mac} to the allow list.");
            (mac.clone(), MutationReport::new(&mac, "move-to-allow", durability), sentence)
        }
        MoveCommand::ToDeny { mac } => {
            let mac = util::parse_mac(&mac)?;
            let durability = controller.move_to_deny(mac.as_str()).await?;
            let sentence = format!("Moved {mac} to the deny list.");
            (mac.clone(), MutationReport::new(&mac, "move-to-deny", durability), sentence)
        }
    };
    tracing::debug!(%mac, action = report.action, "move applied");
    util::report_mutation(&report, &sentence, global);
    Ok(())
}
