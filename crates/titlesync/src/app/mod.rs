mod global;
mod refresh;


use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(refresh::refresh_command())
        .subcommand(refresh::run_command())
        .subcommand(global::config_command())
}
