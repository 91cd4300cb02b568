//! Alias command handlers.

use serde::Serialize;

use macgate_core::Controller;

use crate::cli::{AliasArgs, AliasCommand, GlobalOpts};
use crate::commands::util::{self, MutationReport};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AliasView {
    mac: String,
    alias: Option<String>,
}

pub async fn handle(
    controller: &Controller,
    args: AliasArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AliasCommand::Set { mac, alias } => {
            let mac = util::parse_mac(&mac)?;
            let durability = controller.set_alias(mac.as_str(), Some(&alias)).await?;
            let report = MutationReport::new(&mac, "alias-set", durability);
            util::report_mutation(&report, &format!("{mac} is now \"{}\".", alias.trim()), global);
        }

        AliasCommand::Clear { mac } => {
            let mac = util::parse_mac(&mac)?;
            let durability = controller.set_alias(mac.as_str(), None).await?;
            let report = MutationReport::new(&mac, "alias-clear", durability);
            util::report_mutation(&report, &format!("Cleared the alias for {mac}."), global);
        }

        AliasCommand::Get { mac } => {
            let mac = util::parse_mac(&mac)?;
            let view = AliasView {
                alias: controller.get_alias(mac.as_str()).await?,
                mac: mac.to_string(),
            };
            let out = output::render_single(
                &global.output,
                &view,
                |v| match &v.alias {
                    Some(alias) => format!("{}  {alias}", v.mac),
                    None => format!("{}  (no alias)", v.mac),
                },
                |v| v.alias.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
