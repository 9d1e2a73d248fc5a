use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 单条替换/匹配规则
/// Key为逐字面量字符串（非正则），Value为替换文本或透传载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// 规则Key（非空，逐字面量匹配）
    pub key: String,
    /// 替换值（可为空串，表示删除匹配文本）
    #[serde(default)]
    pub value: String,
}

/// 规则集：保序插入、重复Key后写覆盖
/// 编译后视为不可变；所有引擎/扫描器实例从同一规则集构建
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    /// Key → rules下标索引（插入/覆盖O(1)）
    index: FxHashMap<String, usize>,
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

impl Eq for RuleSet {}

impl RuleSet {
    /// 创建空规则集
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一条规则
    ///
    /// # 参数
    /// - `key`: 规则Key，必须非空（空Key产生零宽匹配，编译期拒绝）
    /// - `value`: 替换值，允许为空串
    ///
    /// # 语义
    /// 重复Key以最后一次注册为准（后写覆盖，保持首次注册的位置）
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> CoreResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(CoreError::EmptyRuleKey);
        }

        let value = value.into();
        // 重复Key：经索引定位原条目，原位覆盖Value，保持插入次序
        if let Some(&pos) = self.index.get(&key) {
            self.rules[pos].value = value;
        } else {
            self.index.insert(key.clone(), self.rules.len());
            self.rules.push(Rule { key, value });
        }
        Ok(())
    }

    /// 批量注册规则（任一Key非法则整体失败，已注册部分不回滚）
    pub fn add_all<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> CoreResult<()>
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.add(key, value)?;
        }
        Ok(())
    }

    /// 规则条数
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 是否为空规则集
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按插入次序遍历规则
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// 最长规则Key的字符数（空规则集为0）
    /// 该值即流式替换所需的前瞻字符数下限
    pub fn longest_key_len(&self) -> usize {
        self.rules
            .iter()
            .map(|rule| rule.key.chars().count())
            .max()
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_insertion_order() {
        // 测试场景：保序插入，遍历次序与注册次序一致
        let mut rules = RuleSet::new();
        rules.add("b", "2").unwrap();
        rules.add("a", "1").unwrap();
        rules.add("c", "3").unwrap();

        let keys: Vec<&str> = rules.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_add_duplicate_key_last_write_wins() {
        // 测试场景：重复Key后写覆盖，条数不变、位置不变
        let mut rules = RuleSet::new();
        rules.add("a", "old").unwrap();
        rules.add("b", "keep").unwrap();
        rules.add("a", "new").unwrap();

        assert_eq!(rules.len(), 2);
        let first = rules.iter().next().unwrap();
        assert_eq!(first.key, "a");
        assert_eq!(first.value, "new");
    }

    #[test]
    fn test_add_empty_key_rejected() {
        // 测试场景：空Key编译期拒绝，已注册内容不受影响
        let mut rules = RuleSet::new();
        rules.add("a", "1").unwrap();
        assert!(matches!(rules.add("", "x"), Err(CoreError::EmptyRuleKey)));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_longest_key_len_in_chars() {
        // 测试场景：最长Key按字符数统计（多字节字符计1）
        let mut rules = RuleSet::new();
        rules.add("東京都", "Tokyo").unwrap();
        rules.add("ab", "x").unwrap();
        assert_eq!(rules.longest_key_len(), 3);
    }

    #[test]
    fn test_bulk_add_with_interleaved_duplicates() {
        // 测试场景：批量注册中穿插重复Key，索引与条目保持一致
        let mut rules = RuleSet::new();
        for i in 0..100 {
            rules.add(format!("key-{i}"), "v").unwrap();
        }
        rules.add("key-0", "first").unwrap();
        rules.add("key-99", "last").unwrap();

        assert_eq!(rules.len(), 100);
        let entries: Vec<&Rule> = rules.iter().collect();
        assert_eq!(entries[0].key, "key-0");
        assert_eq!(entries[0].value, "first");
        assert_eq!(entries[99].value, "last");

        // 克隆体的索引独立有效：覆盖仍原位生效
        let mut cloned = rules.clone();
        cloned.add("key-50", "patched").unwrap();
        assert_eq!(cloned.len(), 100);
        assert_eq!(cloned.iter().nth(50).unwrap().value, "patched");
    }

    #[test]
    fn test_empty_rule_set() {
        // 测试场景：空规则集的边界值
        let rules = RuleSet::new();
        assert!(rules.is_empty());
        assert_eq!(rules.longest_key_len(), 0);
    }
}
