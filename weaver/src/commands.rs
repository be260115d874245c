use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;
use weaver_scanner::config::{MAX_DEPTH, MIN_DEPTH};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("weaver")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("weaver")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress and log output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Emit debug diagnostics on stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Breadth-first crawl of a single site, bounded by depth and host scope. \
                Prints or saves the visited URLs.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed URL to start crawling from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth; the seed is depth 1")
                        .value_parser(
                            clap::value_parser!(u32)
                                .range(i64::from(MIN_DEPTH)..=i64::from(MAX_DEPTH)),
                        )
                        .default_value("3"),
                )
                .arg(
                    arg!(--"include-subdomains")
                        .required(false)
                        .help("Also follow links to subdomains of the seed host (default: same host only)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the report to a file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                ),
        )
}
