//! `melt-playground` — credential-gated local session for the toolkit UI.
//!
//! Prompts for the playground credential pair at startup, then hands the
//! terminal over to the same `acestep` UI the experience role runs, bound
//! to loopback unless `--listen` is given. The child inherits stdio and
//! this process mirrors its exit status.

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

mod auth;

#[derive(Parser)]
#[command(
    name = "melt-playground",
    about = "Local ACE-Step playground session",
    version,
)]
struct Cli {
    /// Port for the playground UI, distinct from the deployed role ports
    #[arg(long, default_value_t = 7862)]
    port: u16,
    /// Ask the UI to create a public share link
    #[arg(long)]
    share: bool,
    /// Listen on all interfaces instead of loopback
    #[arg(long)]
    listen: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("melt_playground=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    cliclack::intro("ACE-Step Playground")?;
    let username: String = cliclack::input("Username").interact()?;
    let password = cliclack::password("Password").mask('▪').interact()?;

    if !auth::authenticate(&username, &password) {
        // One message for every rejection, no hint about which half was wrong.
        eprintln!("access denied");
        std::process::exit(1);
    }

    let addr = bind_addr(cli.listen);
    info!(addr, port = cli.port, share = cli.share, "starting playground UI");

    run_ui(&ui_command(addr, cli.port, cli.share))
}

fn bind_addr(listen: bool) -> &'static str {
    if listen { "0.0.0.0" } else { "127.0.0.1" }
}

/// The toolkit UI invocation, argv-style.
fn ui_command(addr: &str, port: u16, share: bool) -> Vec<String> {
    let mut argv = vec![
        "uv".to_string(),
        "run".to_string(),
        "acestep".to_string(),
        "--server-name".to_string(),
        addr.to_string(),
        "--server-port".to_string(),
        port.to_string(),
    ];
    if share {
        argv.push("--share".to_string());
    }
    argv
}

/// Run the UI attached to the terminal and mirror its exit status.
fn run_ui(argv: &[String]) -> Result<()> {
    let (program, args) = argv.split_first().context("empty UI command")?;

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .context("Failed to execute 'uv'. Is uv installed? Install from https://docs.astral.sh/uv/")?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => std::process::exit(code),
        None => bail!("playground UI terminated by signal"),
    }
}
