//! 多模式扫描器
//! 对完整字符串做多模式匹配，按可配置的选择/边界/重叠策略经回调上报命中

pub mod scanner;

pub use scanner::{PatternScanner, PatternScannerBuilder, ScanMatch};
