use dialoguer::Confirm;
use pipguard::checks::{default_checkers, CheckExecutor, CheckOutcome, PackageCheckResults};
use pipguard::config::Config;
use pipguard::core::{PipguardError, PipguardResult};
use pipguard::pip::{PipCommand, ResolvedPackage};
use pipguard::progress::{spinner, TerminalProgress};
use pipguard::report::print_report;
use pipguard::services::ServiceClients;
use std::future::Future;

/// Exit status when the user declines the installation
const DECLINED_EXIT_CODE: i32 = 2;

/// Flags for which pip does not install anything, so there is nothing to check
const PASS_THROUGH_FLAGS: &[&str] = &["-h", "--help", "--version", "--dry-run", "--report"];

/// Whether this pip invocation installs packages and should be checked first
pub fn needs_checks(pip_args: &[String]) -> bool {
    match pip_args.split_first() {
        Some((command, rest)) if command == "install" => !rest
            .iter()
            .any(|arg| PASS_THROUGH_FLAGS.contains(&arg.as_str()) || arg.starts_with("--report=")),
        _ => false,
    }
}

/// Resolve what pip would install, check it, and run pip if the user agrees.
///
/// Returns the process exit status.
pub async fn run(pip_args: Vec<String>) -> PipguardResult<i32> {
    let pip = PipCommand::from_env()?;
    if !needs_checks(&pip_args) {
        return pip.pass_through(&pip_args).await;
    }

    let config = Config::load()?;

    let install_args = &pip_args[1..];
    let packages = match resolve(&pip, install_args, false).await {
        Err(PipguardError::SourceBuildRequired(details)) => {
            tracing::info!("Binary-only resolution failed:\n{}", details);
            println!("Some packages are only available as source distributions.");
            println!("Resolving them runs their build code before any check.");
            if !confirm("Would you like to allow building packages from source?")? {
                println!("Aborted by user.");
                return Ok(DECLINED_EXIT_CODE);
            }
            resolve(&pip, install_args, true).await?
        }
        resolved => resolved?,
    };
    tracing::info!("pip would install {} package(s)", packages.len());

    let Some(results) = check_packages(&config, &packages).await? else {
        println!("No new packages to install");
        return pip.pass_through(&pip_args).await;
    };

    print_report(&results);
    println!();

    if !confirm("Would you like to continue installing package(s)?")? {
        println!("Aborted by user.");
        return Ok(DECLINED_EXIT_CODE);
    }
    tracing::info!("Installation confirmed; running pip");
    pip.pass_through(&pip_args).await
}

async fn resolve(
    pip: &PipCommand,
    install_args: &[String],
    allow_source_builds: bool,
) -> PipguardResult<Vec<ResolvedPackage>> {
    let resolving = spinner("Resolving dependencies...");
    let report = interruptible(pip.install_report(install_args, allow_source_builds)).await;
    resolving.finish_and_clear();
    Ok(report??.into_resolved_packages())
}

/// `None` when no package was directly requested
async fn check_packages(
    config: &Config,
    packages: &[ResolvedPackage],
) -> PipguardResult<Option<Vec<PackageCheckResults>>> {
    // Clients live for this run only
    let clients = ServiceClients::from_config(config)?;
    let executor = CheckExecutor::new(
        clients.registry.clone(),
        default_checkers(&clients, &config.thresholds),
    );
    drop(clients);

    let progress = TerminalProgress::new();
    match interruptible(executor.execute(packages, &progress)).await? {
        CheckOutcome::NothingToCheck => Ok(None),
        CheckOutcome::Completed(results) => Ok(Some(results)),
    }
}

/// Run `future` unless Ctrl-C arrives first; the future is dropped on interrupt
async fn interruptible<F: Future>(future: F) -> PipguardResult<F::Output> {
    tokio::select! {
        output = future => Ok(output),
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("Interrupted; cancelling in-flight work");
            Err(PipguardError::Interrupted)
        }
    }
}

fn confirm(prompt: &str) -> PipguardResult<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| match e {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => PipguardError::Interrupted,
            dialoguer::Error::IO(e) => PipguardError::Io(e),
        })
}
