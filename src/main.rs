use clap::Parser;
use pipguard::core::{format_error_with_help, PipguardError};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "pipguard")]
#[command(about = "Check packages before pip installs them")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Arguments passed to pip, e.g. `install requests`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pip_args: Vec<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let filter = EnvFilter::try_from_env("PIPGUARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli::install::run(cli.pip_args).await {
        Ok(code) => code,
        Err(PipguardError::Interrupted) => {
            println!("\nAborted by user.");
            PipguardError::Interrupted.exit_code()
        }
        Err(e) => {
            // Display error with helpful suggestions
            eprintln!("\n{}", format_error_with_help(&e));
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}
