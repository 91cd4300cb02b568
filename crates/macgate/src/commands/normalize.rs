//! `normalize`: canonicalize an address without touching the store.

use serde::Serialize;

use macgate_core::normalize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Normalized<'a> {
    input: &'a str,
    mac: String,
}

pub fn handle(text: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let mac = normalize(text)?;
    let view = Normalized {
        input: text,
        mac: mac.to_string(),
    };
    let out = output::render_single(&global.output, &view, |v| v.mac.clone(), |v| v.mac.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
