//! クライアントエントリポイント
//!
//! タッチスクリプトをエミュレータへ中継するコマンドラインツール

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use touch_relay_client::app::App;
use touch_relay_common::utils::logging::{self, LogLevel};
use touch_relay_common::{ClientConfig, GameMode, VERSION};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "touch-relay", version, about = "タッチ入力をエミュレータへ中継します")]
struct Args {
    /// 設定ファイル（.toml / .json）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 接続先の WebSocket URL
    #[arg(long)]
    url: Option<String>,

    /// スクリプトファイル（省略時または "-" で標準入力）
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// 起動時のモード（rizline / musedash / osu）
    #[arg(short, long)]
    mode: Option<String>,

    /// 接続せずに送信イベントを標準出力へ書き出す
    #[arg(long)]
    dry_run: bool,

    /// ログレベル
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("設定ファイルを読み込めません: {}", path.display()))?,
        None => ClientConfig::load_or_default(ClientConfig::default_path())?,
    };

    config.apply_env();
    config.apply_overrides(args.url.clone(), args.log_level.clone());
    if let Some(mode) = &args.mode {
        config.initial_mode = mode.parse::<GameMode>()?;
    }
    config.validate()?;
    Ok(config)
}

fn open_script(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn BufRead + Send>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path)
                .with_context(|| format!("スクリプトを開けません: {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // ロガーを初期化
    let level = LogLevel::parse(&config.log_level).unwrap_or(LogLevel::Info);
    logging::init_logger(level);
    logging::set_panic_hook();

    log::info!("touch-relay v{} を起動します", VERSION);

    let input = open_script(args.script.as_ref())?;
    let mut app = App::new(config);

    if args.dry_run {
        app.run_dry(input, io::stdout().lock())
    } else {
        log::info!("接続先: {}", app.config().server.url);
        let dropped = app.run(input)?;
        if dropped > 0 {
            log::warn!("{} 個のイベントを送信できませんでした", dropped);
        }
        Ok(())
    }
}
