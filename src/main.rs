// Sercon - interactive serial-port console
use clap::Parser;

use sercon::cli::{print_ports, Args};
use sercon::infrastructure::config::ConfigManager;
use sercon::infrastructure::logging::init_logging;
use sercon::infrastructure::serial::list_ports;
use sercon::{Console, SerconResult};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> SerconResult<()> {
    if args.list_ports {
        print_ports(&list_ports()?);
        return Ok(());
    }

    let manager = ConfigManager::new();
    if args.init_config {
        let path = manager.init_project_config(&std::env::current_dir()?)?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let mut config = manager.load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_logging(&config.log)?;
    Console::new(config).run().await
}
