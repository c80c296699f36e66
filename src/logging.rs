//! ログ初期化

use anyhow::Context;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// 設定ファイルの文字列から変換（不明な値は `Info`）
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }
}

/// 出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// 1行1イベントのJSON
    Json,
}

/// 初期化後にログレベルを差し替えるためのハンドル
pub struct LoggingHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    env_override: bool,
}

impl LoggingHandle {
    /// ログレベルを変更する。`RUST_LOG` 指定時は何もしない
    pub fn set_level(&self, level: LogLevel) -> anyhow::Result<()> {
        if self.env_override {
            return Ok(());
        }
        let filter = filter_for(level)?;
        self.filter
            .reload(filter)
            .context("Failed to update log level")?;
        tracing::debug!(level = level.as_filter(), "🔧 Log level updated");
        Ok(())
    }
}

fn filter_for(level: LogLevel) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(level.as_filter())
        .with_context(|| format!("Invalid log level: {}", level.as_filter()))
}

/// tracing サブスクライバーを初期化
///
/// `RUST_LOG` が設定されていればそちらを優先する。設定ファイルを読む前に呼び、
/// 読み込み後のレベルは返したハンドルで反映する。
pub fn init_logging(level: LogLevel, format: LogFormat) -> anyhow::Result<LoggingHandle> {
    let (env_filter, env_override) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (filter_for(level)?, false),
    };
    let (filter_layer, filter) = reload::Layer::new(env_filter);

    let json_layer = match format {
        LogFormat::Json => Some(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_current_span(false),
        ),
        LogFormat::Compact => None,
    };
    let compact_layer = match format {
        LogFormat::Compact => Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        ),
        LogFormat::Json => None,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingHandle {
        filter,
        env_override,
    })
}
