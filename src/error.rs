//! rsrewriter 内核错误定义
//! 封装替换引擎与扫描器所有核心错误，基于thiserror实现类型安全处理
use thiserror::Error;

use regex::Error as RegexError;
use std::io::Error as IoError;

/// 内核核心错误枚举
/// 失败即中止当前调用：不重试、不吞错、不降级，已写入下游的输出不回滚
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================== 规则校验错误 =====================
    /// 规则Key为空（零宽匹配会破坏扫描推进保证，编译期拒绝）
    #[error("Rule key must not be empty")]
    EmptyRuleKey,

    /// 前瞻容量不足（maxCapacity小于最长规则Key，结构上必然失败，编译期拒绝）
    #[error("Lookahead capacity {configured} is smaller than the longest rule key length {required}")]
    InsufficientLookahead {
        /// 最长规则Key的字符数
        required: usize,
        /// 调用方配置的缓冲区容量上限
        configured: usize,
    },

    // ===================== 缓冲区错误 =====================
    /// 入队超出容量上限（调用方/引擎容量配置错误，立即上抛）
    #[error("Buffer overflow: enqueue would exceed max capacity {capacity}")]
    BufferOverflow {
        /// 缓冲区容量上限
        capacity: usize,
    },

    /// 读取越过缓冲区现有内容（dequeue/peek/charAt越界）
    #[error("Buffer empty: requested offset {offset}, buffered size {size}")]
    EmptyBuffer {
        /// 请求的偏移量
        offset: usize,
        /// 当前缓冲的字符数
        size: usize,
    },

    // ===================== 编译相关错误 =====================
    /// 分词器正则编译失败（正则语法错误/不支持的特性）
    #[error("Regex compilation failed: {0}")]
    RegexCompileError(#[from] RegexError),

    // ===================== 内核基础错误 =====================
    /// 无效输入参数（内核层输入校验失败）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 规则源解析失败（规则JSON语法/格式错误）
    #[error("Rule parse failed: {0}")]
    RuleParseError(#[from] serde_json::Error),

    /// 内核逻辑不变量被破坏（核心算法约束违反，属于严重错误）
    #[error("Core invariant violation: {0}")]
    InvariantViolation(&'static str),

    // ===================== IO错误 =====================
    /// 底层字符源/输出端IO错误（原样上抛，内核不重试不吞错）
    #[error("I/O failure: {0}")]
    IoError(#[from] IoError),
}

/// 内核层全局Result类型别名
/// 统一使用CoreError作为内核层错误类型
pub type CoreResult<T> = Result<T, CoreError>;
