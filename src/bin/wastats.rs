//! wastats CLI: 集計済み統計からレポートを出力する

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use wastats::analytics::export::{
    suggested_file_name, ColorTheme, ExportFormat, ExportManager, GroupRef, RankingDisplay,
    ReportPeriod, ReportRequest, ReportTemplate,
};
use wastats::analytics::{InsightSummarizer, JsonStatsSource, StatsSource, StatsSourceError};
use wastats::config::{AppConfig, ConfigManager};
use wastats::logging::{self, LogFormat, LogLevel};

#[derive(Parser)]
#[command(name = "wastats")]
#[command(about = "Group chat statistics reports (CSV / PDF / PNG)", long_about = None)]
#[command(version)]
struct Cli {
    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    /// ログをJSON形式で出力
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report from a stats JSON file.
    Export(ExportArgs),
    /// Print the insight lines for a stats JSON file.
    Insights {
        #[arg(short, long)]
        stats: PathBuf,
    },
    /// Show, reset or locate the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct ExportArgs {
    /// DetailedStats を含むJSONファイル
    #[arg(short, long)]
    stats: PathBuf,
    #[arg(long)]
    group_name: String,
    #[arg(long, default_value = "local")]
    group_id: String,
    /// YYYY-MM-DD
    #[arg(long)]
    start: NaiveDate,
    /// YYYY-MM-DD
    #[arg(long)]
    end: NaiveDate,
    /// csv, pdf or png
    #[arg(short, long)]
    format: ExportFormat,
    /// complete or members
    #[arg(short, long, default_value = "complete")]
    template: ReportTemplate,
    /// blue, green, purple or orange
    #[arg(long)]
    theme: Option<ColorTheme>,
    /// Negative value keeps every member.
    #[arg(long, allow_negative_numbers = true)]
    max_members: Option<i32>,
    /// table or cards
    #[arg(long)]
    ranking_display: Option<RankingDisplay>,
    #[arg(long)]
    no_insights: bool,
    /// 出力先（省略時は設定の output_dir に既定名で保存）
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Reset,
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    let initial_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let logging = logging::init_logging(initial_level, format)?;

    let config_manager = ConfigManager::new()?;
    let config = config_manager.load_config().unwrap_or_else(|e| {
        tracing::warn!("⚠️ Failed to load config, using defaults: {:#}", e);
        AppConfig::default()
    });

    // --verbose は設定ファイルのレベルより優先
    if !cli.verbose {
        logging.set_level(config.log.level())?;
    }

    match cli.command {
        Commands::Export(args) => handle_export(args, &config),
        Commands::Insights { stats } => handle_insights(stats),
        Commands::Config { action } => handle_config(action, &config_manager, &config),
    }
}

fn handle_export(args: ExportArgs, config: &AppConfig) -> Result<()> {
    let period = ReportPeriod::new(args.start, args.end);
    let source = JsonStatsSource::new(&args.stats);

    let stats = match source.fetch_stats(&args.group_id, &period) {
        Ok(stats) => stats,
        Err(StatsSourceError::Empty { .. }) => {
            anyhow::bail!("Não há dados para exportar no período selecionado");
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to load stats from {}", source.path().display())
            })
        }
    };

    let mut options = config.default_options.clone();
    if let Some(theme) = args.theme {
        options.color_theme = theme;
    }
    if let Some(max_members) = args.max_members {
        options.max_members_in_ranking = max_members;
    }
    if let Some(display) = args.ranking_display {
        options.ranking_display = display;
    }
    if args.no_insights {
        options.include_insights = false;
    }

    let request = ReportRequest {
        group: GroupRef {
            id: args.group_id,
            name: args.group_name,
        },
        period,
        template: args.template,
        format: args.format,
        options,
        stats,
        generated_at: Some(Utc::now()),
    };

    let artifact = ExportManager::new()
        .generate(&request)
        .context("Failed to generate report")?;

    let output = args
        .output
        .unwrap_or_else(|| config.output_dir.join(suggested_file_name(&request)));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    let size = artifact.len();
    fs::write(&output, artifact.into_bytes())
        .with_context(|| format!("Failed to write report: {}", output.display()))?;

    tracing::info!(
        path = %output.display(),
        size_bytes = size,
        mime = request.format.mime_type(),
        "💾 Report saved"
    );
    println!("{}", output.display());

    Ok(())
}

fn handle_insights(stats_path: PathBuf) -> Result<()> {
    let source = JsonStatsSource::new(stats_path);
    let stats = source
        .load()
        .with_context(|| format!("Failed to load stats from {}", source.path().display()))?;

    for line in InsightSummarizer::new().summarize(&stats) {
        println!("• {}", line);
    }

    Ok(())
}

fn handle_config(
    action: ConfigAction,
    manager: &ConfigManager,
    config: &AppConfig,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content =
                toml::to_string_pretty(config).context("Failed to serialize config")?;
            print!("{}", content);
        }
        ConfigAction::Reset => manager.reset_config()?,
        ConfigAction::Path => println!("{}", manager.config_file_path().display()),
    }
    Ok(())
}
