//! adminswap - main entry point
//!
//! Parses the command line, runs pre-flight checks, and hands the operator's
//! terminal to the workflow.

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use adminswap::cli::{Cli, Commands};
use adminswap::decommission::{DecommissionOutcome, SkipReason};
use adminswap::platform::{PlatformProfile, SESSION_HINT_VAR, resolve_default_account};
use adminswap::provision::SshOutcome;
use adminswap::{
    AdminSwapError, Console, Host, SystemAccounts, SystemRunner, WorkflowConfig, WorkflowReport,
    process_guard, sanity, workflow,
};

/// Initialize logging on stderr; RUST_LOG overrides `default_level`
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.log_level());
    info!("adminswap starting up");

    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    let code = match execute(&cli) {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<AdminSwapError>()
                .map_or(1, AdminSwapError::exit_code)
        }
    };
    std::process::exit(code);
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    match cli.command() {
        Commands::Run { shell, dry_run } => run(cli, shell, dry_run),
        Commands::Detect { json } => detect(cli, json),
    }
}

fn default_account(cli: &Cli) -> String {
    let hint = std::env::var(SESSION_HINT_VAR).ok();
    resolve_default_account(cli.default_user.as_deref(), hint.as_deref())
}

fn run(cli: &Cli, shell: String, dry_run: bool) -> anyhow::Result<()> {
    sanity::ensure_root()?;

    let profile = PlatformProfile::load(&cli.os_release)
        .with_context(|| format!("cannot determine platform from {}", cli.os_release.display()))?;
    sanity::run_preflight_checks(&profile)?;

    let config = WorkflowConfig {
        default_account: default_account(cli),
        shell,
    };
    if dry_run {
        info!("Dry run: destructive commands will be skipped");
        println!("[dry run] No accounts will be created or removed.");
    }

    let mut runner = SystemRunner::new(dry_run);
    let accounts = SystemAccounts;
    let mut console = Console::stdio();
    let mut host = Host {
        runner: &mut runner,
        accounts: &accounts,
        prompter: &mut console,
    };

    let report = workflow::run(&mut host, &profile, &config)?;
    print_summary(&report, &config);
    Ok(())
}

#[derive(Serialize)]
struct Detection<'a> {
    profile: &'a PlatformProfile,
    default_account: String,
}

fn detect(cli: &Cli, json: bool) -> anyhow::Result<()> {
    let profile = PlatformProfile::load(&cli.os_release)?;
    let detection = Detection {
        profile: &profile,
        default_account: default_account(cli),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&detection).map_err(AdminSwapError::from)?
        );
    } else {
        println!("Platform:        {}", profile);
        println!("Admin group:     {}", profile.admin_group);
        println!("Removal command: {}", profile.delete_mechanism.program());
        println!("Default account: {}", detection.default_account);
    }
    Ok(())
}

fn print_summary(report: &WorkflowReport, config: &WorkflowConfig) {
    let user = &report.provisioned.username;
    println!();
    println!("Summary");
    println!(
        "  New admin:       {} (group '{}')",
        user, report.provisioned.admin_group
    );
    let ssh = match &report.provisioned.ssh {
        SshOutcome::Migrated { files } => format!("copied ({} file(s))", files),
        SshOutcome::NoSource => "no keys to copy".to_string(),
        SshOutcome::DryRun => "skipped (dry run)".to_string(),
        SshOutcome::Failed(reason) => format!("FAILED: {}", reason),
    };
    println!("  SSH keys:        {}", ssh);

    let target = &config.default_account;
    let disposition = match &report.decommission {
        DecommissionOutcome::Removed { home, .. } => {
            format!("'{}' removed, home {} kept", target, home.display())
        }
        DecommissionOutcome::AlreadyAbsent => format!("'{}' did not exist", target),
        DecommissionOutcome::Skipped(reason) => {
            let why = match reason {
                SkipReason::AccessNotVerified => "access not verified",
                SkipReason::RemovalDeclined => "removal declined",
                SkipReason::StillLoggedIn => "still logged in",
            };
            format!("'{}' kept ({})", target, why)
        }
    };
    println!("  Default account: {}", disposition);
}
