use clap::Parser;
use colored::Colorize;

use reqmeter::cli::{Cli, Commands, ConfigCommands};
use reqmeter::config::AppConfig;
use reqmeter::errors::ReqmeterError;
use reqmeter::runtime;
use reqmeter::system::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        // 优先使用结构化错误的彩色输出
        match e.downcast_ref::<ReqmeterError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = AppConfig::load(config_path)?;
            // guard 需要存活到进程结束，保证日志刷盘
            let _guard = init_logging(&config.logging)?;
            tracing::info!("Reqmeter v{} starting", env!("CARGO_PKG_VERSION"));
            runtime::run_server(config).await
        }
        Commands::Config { action } => match action {
            ConfigCommands::Generate { output_path } => {
                runtime::generate_config(output_path)?;
                Ok(())
            }
            ConfigCommands::Validate => {
                runtime::validate_config(config_path)?;
                Ok(())
            }
        },
        Commands::ScrapeConfig { output } => {
            let config = AppConfig::load(config_path)?;
            runtime::write_scrape_config(&config, output.as_deref())?;
            Ok(())
        }
    }
}
