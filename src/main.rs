use clap::Parser;
use foodlog::cli::{Cli, Commands};
use foodlog::{Config, run};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::InitConfig => {
            if Config::create_default_if_missing()? {
                println!("Created config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }
        Commands::Serve => {
            let config = Config::load()?;
            let worker_threads = config.general.worker_threads;

            let mut builder = tokio::runtime::Builder::new_multi_thread();
            builder.enable_all();

            if worker_threads > 0 {
                builder.worker_threads(worker_threads);
            }

            let runtime = builder.build()?;
            runtime.block_on(run(config))
        }
    }
}
