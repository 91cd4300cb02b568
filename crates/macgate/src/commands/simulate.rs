//! `simulate`: drive the gating engine from a line-oriented script.
//!
//! The script plays the part of the radio and the administrator. Each
//! line is one step; decisions and query results go to stdout, per-line
//! failures go to stderr and the run continues.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use macgate_core::{
    Controller, Durability, LinkId, ListStore, LoopbackRadio, MacAddress, MemoryStore,
    RadioEvent, SignalSample,
};

use crate::cli::{GlobalOpts, SimulateArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::status;

// ── Script parsing ──────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Assoc { mac: MacAddress, link: LinkId },
    Disassoc { mac: MacAddress },
    Signal { mac: MacAddress, dbm: i8 },
    Approve { mac: MacAddress },
    Block { mac: MacAddress },
    Allow { mac: MacAddress },
    Deny { mac: MacAddress },
    Unallow { mac: MacAddress },
    Undeny { mac: MacAddress },
    ToAllow { mac: MacAddress },
    ToDeny { mac: MacAddress },
    Alias { mac: MacAddress, alias: Option<String> },
    Kick { mac: MacAddress },
    Sweep,
    Wait { duration: Duration },
    State,
    Log,
}

fn usage(reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: "script".into(),
        reason: reason.into(),
    }
}

fn mac_arg(args: &[&str], verb: &str) -> Result<MacAddress, CliError> {
    let raw = args
        .first()
        .ok_or_else(|| usage(format!("`{verb}` needs a MAC address")))?;
    Ok(MacAddress::parse(raw)?)
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
fn parse_step(line: &str) -> Result<Option<Step>, CliError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let step = match verb {
        "assoc" => {
            let mac = mac_arg(&args, verb)?;
            let link = args
                .get(1)
                .ok_or_else(|| usage("`assoc` needs a link id"))?
                .parse::<u16>()
                .map_err(|e| usage(format!("bad link id: {e}")))?;
            Step::Assoc {
                mac,
                link: LinkId(link),
            }
        }
        "disassoc" => Step::Disassoc {
            mac: mac_arg(&args, verb)?,
        },
        "signal" => {
            let mac = mac_arg(&args, verb)?;
            let dbm = args
                .get(1)
                .ok_or_else(|| usage("`signal` needs a dBm value"))?
                .parse::<i8>()
                .map_err(|e| usage(format!("bad signal level: {e}")))?;
            Step::Signal { mac, dbm }
        }
        "approve" => Step::Approve {
            mac: mac_arg(&args, verb)?,
        },
        "block" => Step::Block {
            mac: mac_arg(&args, verb)?,
        },
        "allow" => Step::Allow {
            mac: mac_arg(&args, verb)?,
        },
        "deny" => Step::Deny {
            mac: mac_arg(&args, verb)?,
        },
        "unallow" => Step::Unallow {
            mac: mac_arg(&args, verb)?,
        },
        "undeny" => Step::Undeny {
            mac: mac_arg(&args, verb)?,
        },
        "to-allow" => Step::ToAllow {
            mac: mac_arg(&args, verb)?,
        },
        "to-deny" => Step::ToDeny {
            mac: mac_arg(&args, verb)?,
        },
        "alias" => {
            let mac = mac_arg(&args, verb)?;
            let text = args[1..].join(" ");
            Step::Alias {
                mac,
                alias: (!text.is_empty()).then_some(text),
            }
        }
        "kick" => Step::Kick {
            mac: mac_arg(&args, verb)?,
        },
        "sweep" => Step::Sweep,
        "wait" => {
            let secs = args
                .first()
                .ok_or_else(|| usage("`wait` needs a number of seconds"))?
                .parse::<f64>()
                .map_err(|e| usage(format!("bad wait: {e}")))?;
            let duration = Duration::try_from_secs_f64(secs)
                .map_err(|e| usage(format!("bad wait: {e}")))?;
            Step::Wait { duration }
        }
        "state" => Step::State,
        "log" => Step::Log,
        other => return Err(usage(format!("unknown step `{other}`"))),
    };
    Ok(Some(step))
}

// ── Runner ──────────────────────────────────────────────────────────

struct Simulator<'a> {
    controller: Controller,
    radio: Arc<LoopbackRadio>,
    signals: Vec<SignalSample>,
    global: &'a GlobalOpts,
    color: bool,
}

impl Simulator<'_> {
    fn say(&self, line: &str) {
        output::print_output(line, self.global.quiet);
    }

    fn applied(&self, mac: &MacAddress, what: &str, durability: &Durability) {
        match durability {
            Durability::Persisted => self.say(&format!("{mac} {what}")),
            Durability::Degraded { reason } => {
                self.say(&format!("{mac} {what}"));
                output::print_warning(&format!("not saved: {reason}"), self.color);
            }
        }
    }

    async fn run(&mut self, step: Step) -> Result<(), CliError> {
        let c = &self.controller;
        match step {
            Step::Assoc { mac, link } => {
                c.radio_events().send(RadioEvent::Associated {
                    mac: mac.clone(),
                    link_id: link,
                })?;
                // Events queued before a command are applied first, so this
                // query observes the decision.
                let snap = c.query_state().await?;
                let line = if snap.is_allowed(&mac) {
                    output::good("admit", self.color)
                } else {
                    output::bad("quarantine", self.color)
                };
                self.say(&format!("{mac} {line}"));
            }
            Step::Disassoc { mac } => {
                c.radio_events().send(RadioEvent::Disassociated { mac })?;
                c.query_state().await?;
            }
            Step::Signal { mac, dbm } => {
                self.signals.retain(|s| s.mac != mac);
                self.signals.push(SignalSample {
                    mac,
                    signal_dbm: dbm,
                });
                self.radio.set_signals(self.signals.clone());
            }
            Step::Approve { mac } => {
                let d = c.approve(mac.as_str()).await?;
                self.applied(&mac, "approved", &d);
            }
            Step::Block { mac } => {
                let d = c.block(mac.as_str()).await?;
                self.applied(&mac, "blocked", &d);
            }
            Step::Allow { mac } => {
                let d = c.allow_add(mac.as_str()).await?;
                self.applied(&mac, "allowed", &d);
            }
            Step::Deny { mac } => {
                let d = c.deny_add(mac.as_str()).await?;
                self.applied(&mac, "denied", &d);
            }
            Step::Unallow { mac } => {
                let d = c.allow_remove(mac.as_str()).await?;
                self.applied(&mac, "removed from allow list", &d);
            }
            Step::Undeny { mac } => {
                let d = c.deny_remove(mac.as_str()).await?;
                self.applied(&mac, "removed from deny list", &d);
            }
            Step::ToAllow { mac } => {
                let d = c.move_to_allow(mac.as_str()).await?;
                self.applied(&mac, "moved to allow list", &d);
            }
            Step::ToDeny { mac } => {
                let d = c.move_to_deny(mac.as_str()).await?;
                self.applied(&mac, "moved to deny list", &d);
            }
            Step::Alias { mac, alias } => {
                let d = c.set_alias(mac.as_str(), alias.as_deref()).await?;
                self.applied(&mac, "alias updated", &d);
            }
            Step::Kick { mac } => {
                c.force_disconnect(mac.as_str()).await?;
                self.say(&format!("{mac} kicked"));
            }
            Step::Sweep => {
                let expired = c.sweep().await?;
                self.say(&format!("expired {expired}"));
            }
            Step::Wait { duration } => tokio::time::sleep(duration).await,
            Step::State => {
                let snap = c.query_state().await?;
                self.say(&status::render_snapshot(&snap, &self.global.output));
            }
            Step::Log => {
                let records = c.query_log().await?;
                self.say(&status::render_log(&records, &self.global.output));
            }
        }
        Ok(())
    }
}

fn read_script(args: &SimulateArgs) -> Result<String, CliError> {
    match &args.script {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

pub async fn handle(args: SimulateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let gate_config = config::gate_config(&cfg)?;
    let store: Arc<dyn ListStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        config::open_store(global, &cfg)?
    };
    let script = read_script(&args)?;

    let radio = Arc::new(LoopbackRadio::new());
    let controller = Controller::start(gate_config, store, radio.clone())?;
    let mut sim = Simulator {
        controller: controller.clone(),
        radio,
        signals: Vec::new(),
        global,
        color: output::should_color(&global.color),
    };

    let mut failures = 0usize;
    for (idx, line) in script.lines().enumerate() {
        let outcome = match parse_step(line) {
            Ok(Some(step)) => sim.run(step).await,
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            failures += 1;
            eprintln!("line {}: {e}", idx + 1);
            if matches!(e, CliError::EngineStopped) {
                break;
            }
        }
    }
    controller.shutdown().await;

    if failures > 0 {
        return Err(usage(format!("{failures} step(s) failed")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mac(s: &str) -> MacAddress {
        MacAddress::parse(s).unwrap()
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert!(parse_step("").unwrap().is_none());
        assert!(parse_step("   ").unwrap().is_none());
        assert!(parse_step("# assoc aa:bb:cc:dd:ee:ff 1").unwrap().is_none());
    }

    #[test]
    fn assoc_takes_mac_and_link() {
        let step = parse_step("assoc aabbccddeeff 7").unwrap().unwrap();
        assert_eq!(
            step,
            Step::Assoc {
                mac: mac("AA:BB:CC:DD:EE:FF"),
                link: LinkId(7)
            }
        );
    }

    #[test]
    fn alias_joins_remaining_words() {
        let step = parse_step("alias aa-bb-cc-dd-ee-ff Kitchen tablet")
            .unwrap()
            .unwrap();
        assert_eq!(
            step,
            Step::Alias {
                mac: mac("AA:BB:CC:DD:EE:FF"),
                alias: Some("Kitchen tablet".into())
            }
        );
        let cleared = parse_step("alias aa-bb-cc-dd-ee-ff").unwrap().unwrap();
        assert!(matches!(cleared, Step::Alias { alias: None, .. }));
    }

    #[test]
    fn wait_accepts_fractions() {
        let step = parse_step("wait 0.25").unwrap().unwrap();
        assert_eq!(
            step,
            Step::Wait {
                duration: Duration::from_millis(250)
            }
        );
    }

    #[test]
    fn bad_lines_are_rejected() {
        assert!(parse_step("assoc").is_err());
        assert!(parse_step("assoc aa:bb:cc:dd:ee:ff").is_err());
        assert!(parse_step("assoc zz:bb:cc:dd:ee:ff 1").is_err());
        assert!(parse_step("signal aa:bb:cc:dd:ee:ff loud").is_err());
        assert!(parse_step("teleport").is_err());
    }
}
