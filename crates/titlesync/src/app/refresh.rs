use clap::{Arg, ArgAction, Command};

fn latency_arg() -> Arg {
    Arg::new("latency-ms")
        .long("latency-ms")
        .help("Simulated remote latency in milliseconds")
        .value_name("MS")
        .value_parser(clap::value_parser!(u64))
        .default_value("200")
}

fn timeout_arg() -> Arg {
    Arg::new("timeout-ms")
        .long("timeout-ms")
        .help("Override the fetch deadline in milliseconds")
        .value_name("MS")
        .value_parser(clap::value_parser!(u64).range(1..))
}

pub fn refresh_command() -> Command {
    Command::new("refresh")
        .about("Refresh the title once and report the outcome")
        .arg(latency_arg())
        .arg(timeout_arg())
        .arg(
            Arg::new("fail")
                .long("fail")
                .help("Make the simulated remote report an error")
                .action(ArgAction::SetTrue),
        )
}

pub fn run_command() -> Command {
    Command::new("run")
        .about("Run the background refresh loop and tap counter until interrupted")
        .arg(latency_arg())
        .arg(timeout_arg())
        .arg(
            Arg::new("fail-every")
                .long("fail-every")
                .help("Make every Nth simulated fetch fail")
                .value_name("N")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("taps")
                .long("taps")
                .help("Start the tap counter right away")
                .action(ArgAction::SetTrue),
        )
}
