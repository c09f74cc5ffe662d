use colored::*;
use detective::config::Config;
use detective::error::{DetectiveError, Result as DetectiveResult};
use detective::{frame_style, request_from_cli, Cli, ConsoleErrors, ConsoleReporter, Parser, Searcher};
use env_logger::{Builder, Env, Target};
use is_terminal::IsTerminal;
use log::info;
use std::fs;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("Error: {e}").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> DetectiveResult<()> {
    setup_logging(cli)?;
    info!("Application started: {cli:?}");

    let config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.write_config {
        config.save(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let color = config.display.color && !cli.no_color && io::stdout().is_terminal();
    colored::control::set_override(color);

    let request = request_from_cli(cli, &config)?;
    let mut reporter = ConsoleReporter::new(io::stdout().lock(), frame_style(&config, color));
    let mut errors = ConsoleErrors {
        color: color && io::stderr().is_terminal(),
    };

    Searcher::from(cli.search_type).search(&request, &mut reporter, &mut errors)?;
    Ok(())
}

fn setup_logging(cli: &Cli) -> DetectiveResult<()> {
    let level = if cli.verbose { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        let log_file = fs::File::create(log_path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| DetectiveError::Config(format!("failed to initialise logging: {e}")))?;
    Ok(())
}
