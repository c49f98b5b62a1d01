use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use xshell::{cmd, Shell};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "lynx developer tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tests for the IPv6 build and the IPv4-only build
    Test,
    /// Run the loopback echo demo for both address families
    Demo,
    /// Clean build artifacts
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    let project_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| anyhow!("xtask must live two levels below the workspace root"))?;
    sh.change_dir(project_root);

    match cli.command {
        Commands::Test => {
            println!("Testing the IPv6 layout...");
            cmd!(sh, "cargo test --workspace").run()?;

            println!("Testing the IPv4-only layout...");
            cmd!(sh, "cargo test -p lynx-abi --no-default-features --features std").run()?;
            cmd!(sh, "cargo test -p lynx-sys --no-default-features").run()?;
        }
        Commands::Demo => {
            cmd!(sh, "cargo build -p lynx-cli").run()?;
            for family in ["v4", "v6"] {
                println!("Running echo over {}...", family);
                cmd!(sh, "cargo run -q -p lynx-cli -- echo --family {family}").run()?;
            }
        }
        Commands::Clean => {
            cmd!(sh, "cargo clean").run()?;
        }
    }

    Ok(())
}
