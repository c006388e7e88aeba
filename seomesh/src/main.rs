use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use seomesh::handlers::*;
use tracing_subscriber::EnvFilter;

mod commands;

fn print_banner() {
    println!(
        "{}",
        r#"
   ___  ___  ___  _ __ ___   ___  ___| |__
  / __|/ _ \/ _ \| '_ ` _ \ / _ \/ __| '_ \
  \__ \  __/ (_) | | | | | |  __/\__ \ | | |
  |___/\___|\___/|_| |_| |_|\___||___/_| |_|
"#
        .bright_cyan()
        .bold()
    );
    println!(
        "  {} {}\n",
        "internal linking and SEO audits".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("init", sub)) => handle_init(sub),
        Some(("import", sub)) => handle_import(sub),
        Some(("suggest", sub)) => handle_suggest(sub),
        Some(("analyze", sub)) => handle_analyze(sub),
        Some(("profile", sub)) => handle_profile(sub),
        Some(("score", sub)) => handle_score(sub),
        Some(("audit", sub)) => handle_audit(sub).await,
        Some(("quick-wins", sub)) => handle_quick_wins(sub),
        Some(("full-audit", sub)) => handle_full_audit(sub),
        Some(("build-network", sub)) => handle_build_network(sub).await,
        Some(("validate", sub)) => handle_validate(sub),
        Some(("history", sub)) => handle_history(sub),
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    let quiet = chosen_command.get_flag("quiet");
    init_tracing(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    if let Err(e) = dispatch(&chosen_command).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
