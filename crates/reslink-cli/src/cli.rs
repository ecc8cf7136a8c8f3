//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use reslink_core::{EntityRef, LinkData};
use std::path::PathBuf;
use std::str::FromStr;

/// Snapshot used when neither `--store` nor a configured path is given
pub(crate) const DEFAULT_STORE: &str = "links.json";

fn entity_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name("KIND:ID")
        .value_parser(EntityRef::from_str)
        .required(true)
        .help(help)
}

fn name_arg() -> Arg {
    Arg::new("name")
        .long("name")
        .required(true)
        .help("Link name")
}

fn data_arg() -> Arg {
    Arg::new("data")
        .long("data")
        .value_name("JSON")
        .value_parser(parse_data)
        .help("Link metadata as a JSON object")
}

fn parse_data(text: &str) -> Result<LinkData, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    LinkData::try_from(value).map_err(|e| e.to_string())
}

pub(crate) fn command() -> Command {
    Command::new("reslink")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit named links between entities")
        .subcommand_required(true)
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Link snapshot file (default: configured path or links.json)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("link")
                .about("Add one link, keeping existing ones")
                .arg(entity_arg("from", "Source entity"))
                .arg(entity_arg("to", "Destination entity"))
                .arg(name_arg())
                .arg(data_arg()),
        )
        .subcommand(
            Command::new("replace")
                .about("Set the links of an entity under a name to exactly the given targets")
                .arg(entity_arg("from", "Source entity"))
                .arg(name_arg())
                .arg(
                    entity_arg("to", "Target entity (repeatable; none clears the links)")
                        .required(false)
                        .action(ArgAction::Append),
                )
                .arg(data_arg()),
        )
        .subcommand(
            Command::new("unlink")
                .about("Remove every link of an entity under a name")
                .arg(entity_arg("from", "Source entity"))
                .arg(name_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("List stored links touching an entity")
                .arg(entity_arg("entity", "Entity to inspect"))
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Only links with this name"),
                )
                .arg(
                    Arg::new("direction")
                        .long("direction")
                        .value_parser(["out", "in", "both"])
                        .default_value("both")
                        .help("Outbound, inbound or both"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Load the entities of one kind linked to or from an entity")
                .arg(entity_arg("entity", "Entity to resolve from"))
                .arg(name_arg())
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .help("Resource kind to load"),
                )
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .required(true)
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON object mapping kind to an array of records with an \"id\""),
                ),
        )
}
