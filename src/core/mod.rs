//! 核心公共结构体+枚举
//! 规则模型与策略/匹配选择枚举，供替换引擎与模式扫描器共用

pub mod enums;
pub mod rule;

pub use enums::{MatchPolicy, StrategyKind};
pub use rule::{Rule, RuleSet};
