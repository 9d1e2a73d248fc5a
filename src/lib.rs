//! rsrewriter - 高性能流式多模式查找替换引擎
//!
//! 核心能力：
//! 1. 规则集一次编译为字典树，多个引擎/扫描器实例只读共享
//! 2. 流式最左最长替换：前瞻内存以最长规则Key为界，与输入长度无关
//! 3. 完整字符串多模式扫描：可配置选择策略/边界约束/重叠跳过

// 核心公共结构体+枚举
pub mod core;
// 有界前瞻环形缓冲
pub mod buffer;
// 规则字典树
pub mod trie;
// 流式替换引擎（变体编译+执行）
pub mod engine;
// 多模式扫描器
pub mod scanner;
// 规则源解析 (扁平JSON)
pub mod source;
// 全局错误类型
pub mod error;
// 日志预览等通用工具
pub mod utils;

// 导出全局错误类型
pub use self::error::{CoreError, CoreResult};

// 导出规则模型与策略枚举
pub use self::core::{MatchPolicy, Rule, RuleSet, StrategyKind};

// 导出环形缓冲
pub use self::buffer::{CapacityLimit, CharRingBuffer};

// 导出字典树核心接口
pub use self::trie::{PrefixMatch, RuleTrie, TrieNode};

// 导出替换引擎核心接口
pub use self::engine::{
    BufferConfig, CharSink, CharSource, IoSink, ReaderSource, Rewriter, RewritingSource,
    StrSource, Strategy,
};

// 导出扫描器核心接口
pub use self::scanner::{PatternScanner, PatternScannerBuilder, ScanMatch};

// 导出规则源解析接口
pub use self::source::load_rules_json;
