mod cli;

use std::fs::File;
use std::io;
use std::io::BufReader;

use clap::Parser;
use cli::Cli;
use sim_fs::SimFileSystem;
use sim_fs_shell::Shell;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = cli.config()?;
    log::info!("config={config:?}");
    let mut shell = Shell::new(SimFileSystem::new(config));

    match &cli.script {
        Some(script) => {
            let script = BufReader::new(File::open(script)?);
            shell.run(script, &mut io::stdout().lock(), false)
        }
        None => {
            println!(
                "disk={} KiB, type `help` for commands",
                config.disk_bytes() / 1024
            );
            shell.run(io::stdin().lock(), &mut io::stdout().lock(), true)
        }
    }
}
