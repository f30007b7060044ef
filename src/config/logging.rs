//! # 日志初始化
//!
//! 库本身不初始化日志系统，由应用或测试按需调用

use crate::config::core::LoggingConfig;
use crate::error::DocSyncResult;
use rat_logger::LoggerBuilder;
use rat_logger::handler::term::TermConfig;

/// 按配置初始化 rat_logger
///
/// `console` 为 false 时不安装任何处理器。
pub fn init_logging(config: &LoggingConfig) -> DocSyncResult<()> {
    if !config.console {
        return Ok(());
    }

    LoggerBuilder::new()
        .with_level(config.level.to_level_filter())
        .add_terminal_with_config(TermConfig::default())
        .init()
        .map_err(|e| crate::docsync_error!(config, format!("初始化日志系统失败: {}", e)))?;
    Ok(())
}
