use clap::Parser;
use perktrack::{App, Command, DataDirectory, init_logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "perktrack")]
#[command(about = "Track card benefits, reset cycles, and minimum spends")]
struct Args {
    /// Path to the data directory (default: ~/.perktrack/)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Reference date to evaluate against (default: today). Useful for
    /// previewing what a future load would do.
    #[arg(long)]
    today: Option<jiff::civil::Date>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(DataDirectory::default_path);

    init_logging(&data_dir, &args.log_level)?;

    let today = args
        .today
        .unwrap_or_else(|| jiff::Zoned::now().date());
    tracing::info!(%today, "loading");

    let mut app = App::load(DataDirectory::new(data_dir), today)?;
    perktrack::commands::run(&mut app, args.command, today)?;

    Ok(())
}
