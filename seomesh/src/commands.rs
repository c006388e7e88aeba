use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("seomesh")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("seomesh")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Enable debug logging")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-d --"data-dir" <PATH>)
                .required(false)
                .help("Directory holding seomesh.db and seomesh.toml")
                .default_value("~/.config/seomesh/")
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the seomesh database and default config")
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing database and config at the location")
                        .required(false),
                ),
        )
        .subcommand(
            command!("import")
                .about("Imports catalog pages (and optional schemas) from a JSON file")
                .arg(
                    arg!(<FILE>)
                        .help("JSON array of pages, or an object with `pages` and `schemas`")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("suggest")
                .about("Suggests internal links for one page without saving them")
                .arg(arg!(<PAGE>).help("Path of the source page, e.g. /job-detail/42"))
                .arg(
                    arg!(-l --"limit" <COUNT>)
                        .required(false)
                        .help("Maximum number of suggestions")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"seed" <SEED>)
                        .required(false)
                        .help("Seed for anchor text selection")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"accept")
                        .required(false)
                        .help("Save the suggestions at or above the accept threshold")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("analyze")
                .about("Reports link graph health: orphans, density and authority")
                .arg(
                    arg!(--"page-rank" <TOP>)
                        .required(false)
                        .help("Also list the TOP pages by iterative PageRank")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            command!("profile")
                .about("Shows the inbound/outbound link profile of a page")
                .arg(arg!(<PAGE>).help("Path of the page")),
        )
        .subcommand(
            command!("score")
                .about("Scores and audits a single page, saving the score")
                .arg(arg!(<PAGE>).help("Path of the page"))
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the audit as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("audit")
                .about("Scores a sample of the active catalog")
                .arg(
                    arg!(-s --"sample" <COUNT>)
                        .required(false)
                        .help("Number of active pages to sample (default from config)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                ),
        )
        .subcommand(command!("quick-wins").about("Lists the cheapest high-impact fixes"))
        .subcommand(
            command!("full-audit")
                .about("Runs the technical, content, semantic and performance audits")
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("build-network")
                .about("Generates and saves links for every active page")
                .arg(
                    arg!(--"seed" <SEED>)
                        .required(false)
                        .help("Seed for anchor text selection")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-l --"limit" <COUNT>)
                        .required(false)
                        .help("Only process the first COUNT active pages")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            command!("validate")
                .about("Marks links to or from inactive pages as broken")
                .arg(
                    arg!(--"rescore")
                        .required(false)
                        .help("Also recompute relevance of the remaining links")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("history")
                .about("Lists recent full-site audits")
                .arg(
                    arg!(-n --"limit" <COUNT>)
                        .required(false)
                        .help("Number of audits to list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                ),
        )
}
