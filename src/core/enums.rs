use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::rule::RuleSet;

/// 替换引擎策略枚举，标记规则集编译后选用的执行变体
/// 选择器按规则集的Key/Value长度形态分类，一次规则集对应一次分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// 参考实现（逐位置暴力尝试全部规则Key，仅用于校验优化变体，选择器永不选中）
    Baseline,
    /// 单字符Key + 单字符Value：字符直查表，O(1)、无字典树、无缓冲
    CharTable,
    /// 单字符Key + 变长Value：字符→字符串查表，O(1)分发，替换值逐字符排队输出
    CharSeqTable,
    /// 通用情形（存在长度>1的Key）：字典树 + 有界前瞻环形缓冲
    Trie,
}

impl StrategyKind {
    /// 选择器：检查一遍完整规则集，按Key/Value长度形态分类
    ///
    /// # 分类规则（互斥，恰好命中一类）
    /// 1. 所有Key长度=1 且 所有Value长度=1 → `CharTable`
    /// 2. 所有Key长度=1（Value长度任意，可为空/多字符） → `CharSeqTable`
    /// 3. 存在Key长度>1 → `Trie`
    ///
    /// 纯函数、确定性、无副作用；空规则集按第1类处理（空表=原样透传）
    pub fn select(rules: &RuleSet) -> StrategyKind {
        let all_single_key = rules
            .iter()
            .all(|rule| rule.key.chars().count() == 1);

        if !all_single_key {
            return StrategyKind::Trie;
        }

        let all_single_value = rules
            .iter()
            .all(|rule| rule.value.chars().count() == 1);

        if all_single_value {
            StrategyKind::CharTable
        } else {
            StrategyKind::CharSeqTable
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Baseline => write!(f, "baseline"),
            StrategyKind::CharTable => write!(f, "char_table"),
            StrategyKind::CharSeqTable => write!(f, "char_seq_table"),
            StrategyKind::Trie => write!(f, "trie"),
        }
    }
}

/// 匹配选择策略枚举
/// 同一起始偏移存在多个前缀匹配时，扫描器按该策略决定上报哪些匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// 仅上报最短匹配
    Shortest,
    /// 仅上报最长匹配
    Longest,
    /// 上报全部匹配（默认）
    #[default]
    All,
}

impl Display for MatchPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Shortest => write!(f, "shortest"),
            MatchPolicy::Longest => write!(f, "longest"),
            MatchPolicy::All => write!(f, "all"),
        }
    }
}
