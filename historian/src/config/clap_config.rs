use clap::{crate_version, Arg, Command};

use super::{LogFormat, LogLevel};

/// Low-level `clap` command, so that `value_source` can tell whether an option was set by the
/// user (cli/env) or by its default value.
///
/// This covers everything that can be configured from the cli and env. The options that can
/// also come from the TOML file are global, so they may appear before or after the subcommand
pub(super) fn command() -> Command {
    Command::new("historian")
        .about("Replays a ledger's append events into a local history tree, and proves votes")
        .version(crate_version!()) // pick the version from `Cargo.toml`
        .propagate_version(true)
        .subcommand(
            Command::new("commit")
                .about("Print the digests a value and salt are committed under")
                .arg(value_arg())
                .arg(salt_arg()),
        )
        .subcommand(Command::new("replay").about("Replay the event log and print the root"))
        .subcommand(
            Command::new("prove")
                .about("Replay the event log and prove a committed value is included")
                .arg(value_arg())
                .arg(salt_arg())
                .arg(
                    Arg::new("root")
                        .help("Root to prove against, defaults to the replayed root")
                        .long("root")
                        .value_name("ROOT")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Check a proof produced by `prove`")
                .arg(
                    Arg::new("proof")
                        .help("Path to the JSON proof")
                        .long("proof")
                        .value_name("PROOF")
                        .required(true)
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .arg(
            Arg::new("root-dir")
                .help("Root directory where configuration is stored")
                .short('r')
                .long("root-dir")
                .value_name("ROOT_DIR")
                .env("HISTORIAN_ROOT_DIR")
                .global(true)
                .value_parser(clap::value_parser!(String))
                .default_value("~/.historian"),
        )
        .arg(
            Arg::new("log-level")
                .help("Log level")
                .long("log-level")
                .value_name("LOG_LEVEL")
                .env("HISTORIAN_LOG_LEVEL")
                .global(true)
                .value_parser(clap::builder::EnumValueParser::<LogLevel>::new())
                .default_value("INFO"),
        )
        .arg(
            Arg::new("log-format")
                .help("Log format")
                .long("log-format")
                .value_name("LOG_FORMAT")
                .env("HISTORIAN_LOG_FORMAT")
                .global(true)
                .value_parser(clap::builder::EnumValueParser::<LogFormat>::new())
                .default_value("PRETTY"),
        )
        .arg(
            Arg::new("events")
                .help("Path to the append event log, as JSON")
                .short('e')
                .long("events")
                .value_name("EVENTS")
                .env("HISTORIAN_EVENTS")
                .global(true)
                .value_parser(clap::value_parser!(String)),
        )
}

fn value_arg() -> Arg {
    Arg::new("value")
        .help("The value voted for")
        .long("value")
        .value_name("VALUE")
        .required(true)
        .value_parser(clap::value_parser!(String))
}

fn salt_arg() -> Arg {
    Arg::new("salt")
        .help("The salt the value was committed with, as a number, 0x-prefixed hex or text")
        .long("salt")
        .value_name("SALT")
        .required(true)
        .value_parser(clap::value_parser!(String))
}
