use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ftpsync_lib::commands::{self, Direction, Side};
use ftpsync_lib::config::{default_config_dir, default_config_file};
use ftpsync_lib::{logging, AppConfig, PathEntry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ftpsync")]
#[command(about = "Compare a local asset tree against an FTP server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: <config dir>/ftpsync/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase console logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    #[arg(short, long, global = true)]
    user: Option<String>,

    #[arg(long, env = "FTPSYNC_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Remote root directory
    #[arg(long, global = true)]
    remote_root: Option<String>,

    /// Local root directory
    #[arg(long, global = true)]
    local_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare local and remote trees
    Diff {
        /// Subdirectory to compare, relative to both roots
        #[arg(default_value = "")]
        root: String,

        /// Which side is the source of truth for ADDED/DELETED
        #[arg(short, long, value_enum, default_value_t = Direction::Upload)]
        direction: Direction,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_color: bool,
    },

    /// List one side's tree
    Ls {
        #[arg(default_value = "")]
        root: String,

        #[arg(short, long, value_enum, default_value_t = Side::Remote)]
        side: Side,
    },

    /// Test the FTP connection
    Check,
}

impl Cli {
    /// 命令行参数覆盖配置文件
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.remote.host = host.clone();
        }
        if let Some(port) = self.port {
            config.remote.port = port;
        }
        if let Some(user) = &self.user {
            config.remote.username = user.clone();
        }
        if let Some(password) = &self.password {
            config.remote.password = password.clone();
        }
        if let Some(root) = &self.remote_root {
            config.remote.root = root.clone();
        }
        if let Some(root) = &self.local_root {
            config.local_root = root.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_file = cli.config.clone().unwrap_or_else(default_config_file);
    let mut config = AppConfig::load(&config_file)?;
    cli.apply_overrides(&mut config);

    let log_dir = config_file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_dir);
    let _log_guard = logging::init(&config.log, &log_dir, cli.verbose);
    tracing::debug!("配置文件: {:?}", config_file);

    match cli.command {
        Commands::Diff {
            root,
            direction,
            json,
            no_color,
        } => {
            let root = PathEntry::new(&root);
            let result = tokio::task::spawn_blocking(move || commands::run_diff(&config, &root))
                .await
                .context("对比任务异常退出")??;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.is_empty() {
                println!("No differences.");
            } else {
                let lines = commands::report_lines(&result, direction);
                print!("{}", commands::render(&lines, !no_color));
            }
        }
        Commands::Ls { root, side } => {
            let root = PathEntry::new(&root);
            let lines = tokio::task::spawn_blocking(move || commands::run_ls(&config, side, &root))
                .await
                .context("列表任务异常退出")??;
            for line in lines {
                println!("{}", line);
            }
        }
        Commands::Check => {
            let remote = config.remote.clone();
            let result = tokio::task::spawn_blocking(move || commands::test_connection(&remote))
                .await
                .context("连接测试异常退出")?;
            println!("{}", result.message);
            if let Some(details) = &result.details {
                println!("  {}", details);
            }
            if !result.success {
                drop(_log_guard);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
