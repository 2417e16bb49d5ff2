use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tessera_wm::common::config::{Config, config_file};
use tessera_wm::common::log;
use tessera_wm::container::collaborators::{ChannelEventSink, WindowEvent};
use tessera_wm::container::replay::{self, ContainerEvent};
use tessera_wm::{Collaborators, WmResult};

#[derive(Parser)]
#[command(about = "Diagnostics for the tessera window layout engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session, printing every outbound event as JSON.
    Replay {
        file: PathBuf,

        /// Also print events whose request failed.
        #[arg(long)]
        show_errors: bool,
    },
    /// Replay a recorded session and print the resulting window tree.
    Dump { file: PathBuf },
    /// Check whether the configuration file can be loaded.
    CheckConfig {
        /// Path to configuration file to use (overrides default).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

fn main() {
    sigpipe::reset();
    let opt = Cli::parse();
    log::init_logging();

    let result = match opt.command {
        Commands::Replay { file, show_errors } => replay_session(&file, show_errors),
        Commands::Dump { file } => dump_session(&file),
        Commands::CheckConfig { config } => check_config(config),
    };
    if let Err(err) = result {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn replay_session(file: &Path, show_errors: bool) -> anyhow::Result<()> {
    let (tx, rx) = crossbeam_channel::unbounded::<WindowEvent>();
    let collab = Collaborators::detached().with_events(ChannelEventSink::new(tx));
    let mut failed = 0usize;
    let container = replay::replay(file, collab, |event: &ContainerEvent, result: &WmResult<()>| {
        if let Err(err) = result {
            failed += 1;
            if show_errors {
                eprintln!("{event:?}: {err}");
            }
        }
        for out in rx.try_iter() {
            match serde_json::to_string(&out) {
                Ok(line) => println!("{line}"),
                Err(err) => eprintln!("cannot serialize {out:?}: {err}"),
            }
        }
    })?;
    let order: Vec<String> = container.z_ordered_windows().iter().map(ToString::to_string).collect();
    println!("z-order (bottom to top): {}", order.join(" "));
    if failed > 0 {
        eprintln!("{failed} request(s) failed");
    }
    Ok(())
}

fn dump_session(file: &Path) -> anyhow::Result<()> {
    let container = replay::replay(file, Collaborators::detached(), |_, _| {})?;
    print!("{}", container.dump_tree());
    Ok(())
}

fn check_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file);
    let config = Config::read(&path)?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("Config validation passed");
        return Ok(());
    }
    for issue in &issues {
        eprintln!("{issue}");
    }
    anyhow::bail!("{} issue(s) in {}", issues.len(), path.display())
}
