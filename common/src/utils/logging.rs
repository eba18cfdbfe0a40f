//! ロギング機能
//!
//! `log` ファサードのバックエンドとして `env_logger` を初期化します。

/// ログレベル
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// トレース情報
    Trace = 0,
    /// デバッグ情報
    Debug = 1,
    /// 一般情報
    Info = 2,
    /// 警告
    Warn = 3,
    /// エラー
    Error = 4,
}

impl LogLevel {
    /// ログレベルを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// 文字列からログレベルを解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" | "ERR" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// グローバルロガーを初期化
///
/// `RUST_LOG` が設定されている場合はそちらが優先されます。
/// 2回目以降の呼び出しは何もしません。
pub fn init_logger(level: LogLevel) {
    let result = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.as_str()),
    )
    .format_timestamp_millis()
    .try_init();

    if result.is_ok() {
        log::debug!("ロガーを初期化しました (既定レベル: {})", level.as_str());
    }
}

/// パニック時のログ記録ハンドラーを設定
pub fn set_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.as_str(),
                None => "Unknown panic payload",
            },
        };

        let location = match panic_info.location() {
            Some(loc) => format!(" at {}:{}", loc.file(), loc.line()),
            None => String::new(),
        };

        eprintln!("パニックが発生しました: {}{}", message, location);
        log::error!("Panic: {}{}", message, location);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse(" Debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_init_logger_twice_is_harmless() {
        init_logger(LogLevel::Info);
        init_logger(LogLevel::Debug);
    }
}
