//! Allow / deny list command handlers.

use macgate_core::{Controller, ListKind};

use crate::cli::{GlobalOpts, ListArgs, ListCommand};
use crate::commands::util::{self, ListedRow, MutationReport};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    controller: &Controller,
    kind: ListKind,
    args: ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ListCommand::List => {
            let snap = controller.query_state().await?;
            let entries = match kind {
                ListKind::Allow => &snap.allowed,
                ListKind::Deny => &snap.denied,
            };
            let out = output::render_list(
                &global.output,
                entries,
                ListedRow::new,
                |a| a.mac.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ListCommand::Add { mac } => {
            let mac = util::parse_mac(&mac)?;
            let durability = match kind {
                ListKind::Allow => controller.allow_add(mac.as_str()).await?,
                ListKind::Deny => controller.deny_add(mac.as_str()).await?,
            };
            let report = MutationReport::new(&mac, "add", durability);
            util::report_mutation(&report, &format!("Added {mac} to the {kind} list."), global);
            Ok(())
        }

        ListCommand::Remove { mac } => {
            let mac = util::parse_mac(&mac)?;
            if !util::confirm(
                &format!("Remove {mac} from the {kind} list?"),
                &format!("{kind} remove"),
                global.yes,
            )? {
                return Ok(());
            }
            let durability = match kind {
                ListKind::Allow => controller.allow_remove(mac.as_str()).await?,
                ListKind::Deny => controller.deny_remove(mac.as_str()).await?,
            };
            let report = MutationReport::new(&mac, "remove", durability);
            util::report_mutation(
                &report,
                &format!("Removed {mac} from the {kind} list."),
                global,
            );
            Ok(())
        }
    }
}
