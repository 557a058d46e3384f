use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("titlesync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep a cached title fresh from a slow remote source")
        .long_about("titlesync refreshes a locally cached title from a remote source under a fixed deadline. A timed-out or failed refresh never replaces the cached title.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Read configuration from this file instead of ~/.titlesync/config.toml")
                .value_name("PATH")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}

pub fn config_command() -> Command {
    Command::new("config").about("Show the effective configuration").arg(
        Arg::new("json")
            .long("json")
            .help("Output as JSON")
            .action(ArgAction::SetTrue),
    )
}
