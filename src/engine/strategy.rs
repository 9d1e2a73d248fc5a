//! 替换策略编译
//! 把规则集一次性编译为四种可执行变体之一（带标签联合，构建后只读共享）

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{RuleSet, StrategyKind};
use crate::error::{CoreError, CoreResult};
use crate::trie::RuleTrie;

/// 编译后的替换策略（可执行变体）
/// 全部成员以Arc包裹：克隆仅增加引用计数，多个引擎实例共享同一份编译产物
#[derive(Debug, Clone)]
pub enum Strategy {
    /// 参考实现：按注册次序持有(Key字符序列, Value)对，逐位置暴力尝试
    Baseline {
        rules: Arc<Vec<(Vec<char>, String)>>,
    },
    /// 单字符Key + 单字符Value：字符直查表
    CharTable { table: Arc<FxHashMap<char, char>> },
    /// 单字符Key + 变长Value：字符→字符串查表
    CharSeqTable {
        table: Arc<FxHashMap<char, String>>,
    },
    /// 通用情形：共享字典树 + 有界前瞻
    Trie { trie: Arc<RuleTrie<String>> },
}

impl Strategy {
    /// 把规则集编译为指定变体
    ///
    /// # 参数
    /// - `rules`: 保序、后写覆盖已完成的规则集
    /// - `kind`: 目标变体（调用方强制指定时做形态校验，形态不符报InvalidInput）
    pub fn compile(rules: &RuleSet, kind: StrategyKind) -> CoreResult<Strategy> {
        match kind {
            StrategyKind::Baseline => {
                let compiled: Vec<(Vec<char>, String)> = rules
                    .iter()
                    .map(|rule| (rule.key.chars().collect(), rule.value.clone()))
                    .collect();
                Ok(Strategy::Baseline {
                    rules: Arc::new(compiled),
                })
            }
            StrategyKind::CharTable => {
                let mut table = FxHashMap::default();
                for rule in rules.iter() {
                    let (key, value) = Self::single_char_pair(rule.key.as_str(), rule.value.as_str())?;
                    table.insert(key, value);
                }
                Ok(Strategy::CharTable {
                    table: Arc::new(table),
                })
            }
            StrategyKind::CharSeqTable => {
                let mut table = FxHashMap::default();
                for rule in rules.iter() {
                    let key = Self::single_char_key(rule.key.as_str())?;
                    table.insert(key, rule.value.clone());
                }
                Ok(Strategy::CharSeqTable {
                    table: Arc::new(table),
                })
            }
            StrategyKind::Trie => {
                let mut trie = RuleTrie::new();
                for rule in rules.iter() {
                    trie.insert(rule.key.as_str(), rule.value.clone())?;
                }
                Ok(Strategy::Trie {
                    trie: Arc::new(trie),
                })
            }
        }
    }

    /// 当前策略的变体标签
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Baseline { .. } => StrategyKind::Baseline,
            Strategy::CharTable { .. } => StrategyKind::CharTable,
            Strategy::CharSeqTable { .. } => StrategyKind::CharSeqTable,
            Strategy::Trie { .. } => StrategyKind::Trie,
        }
    }

    /// 校验并提取单字符Key
    fn single_char_key(key: &str) -> CoreResult<char> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => Err(CoreError::InvalidInput(format!(
                "strategy requires single-char keys, got {key:?}"
            ))),
        }
    }

    /// 校验并提取单字符Key/Value对
    fn single_char_pair(key: &str, value: &str) -> CoreResult<(char, char)> {
        let key_ch = Self::single_char_key(key)?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok((key_ch, ch)),
            _ => Err(CoreError::InvalidInput(format!(
                "strategy requires single-char values, got {value:?}"
            ))),
        }
    }
}
