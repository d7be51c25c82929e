// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use pkgbump::cli::{self, Cli, EXIT_OK, EXIT_RECOVERY, exit_code_for, render_error, render_outcome};
use pkgbump::prompt::TerminalConfirmer;
use pkgbump::tracing::{TracingConfig, TracingFormat};
use pkgbump_release::{Error, ReleaseOrchestrator, SystemRunner};
use tracing::instrument;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let exit_code = run_with_tokio(cli);
    std::process::exit(exit_code);
}

fn run_with_tokio(cli: Cli) -> i32 {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return EXIT_RECOVERY;
        }
    };

    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> i32 {
    let tracing_config = TracingConfig {
        format: if cli.json {
            TracingFormat::Json
        } else {
            TracingFormat::Compact
        },
        level: cli.level.into(),
        ..Default::default()
    };
    if let Err(e) = pkgbump::tracing::init_tracing(tracing_config) {
        eprintln!("{e:?}");
        return EXIT_RECOVERY;
    }

    match release(&cli).await {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    }
}

#[instrument(skip_all, fields(cwd = %cli.cwd.display()))]
async fn release(cli: &Cli) -> Result<(), Error> {
    // Usage problems are reported before the core is involved.
    let release_type = cli.release_type().ok_or_else(Error::missing_release_type)?;
    let config = cli.release_config()?;

    let orchestrator = ReleaseOrchestrator::new(
        SystemRunner::new(&cli.cwd),
        TerminalConfirmer::new(),
        &cli.cwd,
    );
    let outcome = orchestrator.perform_release(&config, release_type).await?;
    render_outcome(&outcome, cli.json);
    Ok(())
}
