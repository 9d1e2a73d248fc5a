use crate::error::{CoreError, CoreResult};
use crate::trie::node::TrieNode;

/// 单条前缀匹配结果
/// `len`为匹配Key的字符数，`value`借用树内终端载荷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch<'a, V> {
    /// 匹配Key的字符数
    pub len: usize,
    /// 匹配Key对应的载荷
    pub value: &'a V,
}

/// 规则字典树
/// 一次构建（insert阶段）后只读；用Arc包裹即可跨线程只读共享，
/// 多个引擎/扫描器实例分摊同一次构建成本（构建与使用为互不重叠的两个阶段）
#[derive(Debug, Clone)]
pub struct RuleTrie<V> {
    root: TrieNode<V>,
    /// 已注册规则条数（覆盖写不计入）
    rule_count: usize,
    /// 最长规则Key的字符数
    max_key_len: usize,
}

impl<V> Default for RuleTrie<V> {
    fn default() -> Self {
        Self {
            root: TrieNode::default(),
            rule_count: 0,
            max_key_len: 0,
        }
    }
}

impl<V> RuleTrie<V> {
    /// 创建空字典树
    pub fn new() -> Self {
        Self::default()
    }

    /// 已注册规则条数
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// 最长规则Key的字符数（即流式替换所需前瞻下限）
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// 是否为空树
    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// 插入一条规则
    ///
    /// # 参数
    /// - `key`: 规则Key（空Key报EmptyRuleKey：零宽匹配破坏扫描推进保证）
    /// - `value`: 终端载荷，重复Key后写覆盖
    pub fn insert(&mut self, key: &str, value: V) -> CoreResult<()> {
        if key.is_empty() {
            return Err(CoreError::EmptyRuleKey);
        }

        let mut node = &mut self.root;
        let mut key_len = 0;
        for ch in key.chars() {
            node = node.child_or_create(ch);
            key_len += 1;
        }

        if node.set_value(value).is_none() {
            self.rule_count += 1;
        }
        self.max_key_len = self.max_key_len.max(key_len);
        Ok(())
    }

    /// 前缀匹配查询：`text[start..]`的所有规则Key前缀命中
    ///
    /// # 返回值
    /// 按Key长度升序排列的命中集合（沿树路径自然有序）
    pub fn prefix_matches<'a>(&'a self, text: &[char], start: usize) -> Vec<PrefixMatch<'a, V>> {
        let mut matches = Vec::new();
        let mut node = &self.root;

        for (depth, &ch) in text.iter().skip(start).enumerate() {
            match node.child(ch) {
                Some(next) => {
                    node = next;
                    if let Some(value) = node.value() {
                        matches.push(PrefixMatch {
                            len: depth + 1,
                            value,
                        });
                    }
                }
                None => break,
            }
        }
        matches
    }

    /// 最长前缀匹配：`text[start..]`命中的最长规则Key
    pub fn longest_match_at<'a>(&'a self, text: &[char], start: usize) -> Option<PrefixMatch<'a, V>> {
        self.prefix_matches(text, start).pop()
    }

    /// 按下标peek闭包做最长前缀匹配（替换引擎对环形缓冲免拷贝探测）
    ///
    /// # 参数
    /// - `peek`: 逻辑下标 → 字符，返回None表示越过可用内容
    pub fn longest_match_in<'a>(
        &'a self,
        mut peek: impl FnMut(usize) -> Option<char>,
    ) -> Option<PrefixMatch<'a, V>> {
        let mut best: Option<PrefixMatch<'a, V>> = None;
        let mut node = &self.root;
        let mut depth = 0;

        while let Some(ch) = peek(depth) {
            match node.child(ch) {
                Some(next) => {
                    node = next;
                    depth += 1;
                    if let Some(value) = node.value() {
                        best = Some(PrefixMatch { len: depth, value });
                    }
                }
                None => break,
            }
        }
        best
    }

    /// Key路径节点查询（自省用）
    pub fn get_node(&self, key: &str) -> Option<&TrieNode<V>> {
        let mut node = &self.root;
        for ch in key.chars() {
            node = node.child(ch)?;
        }
        Some(node)
    }

    /// Key路径可变节点查询（构建用）
    ///
    /// # 参数
    /// - `auto_create`: true时沿路创建缺失的中间节点，必定返回Some
    pub fn get_node_mut(&mut self, key: &str, auto_create: bool) -> Option<&mut TrieNode<V>> {
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = if auto_create {
                node.child_or_create(ch)
            } else {
                node.child_mut(ch)?
            };
        }
        Some(node)
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trie() -> RuleTrie<String> {
        let mut trie = RuleTrie::new();
        trie.insert("a", "1".to_string()).unwrap();
        trie.insert("ab", "2".to_string()).unwrap();
        trie.insert("abcd", "4".to_string()).unwrap();
        trie.insert("bx", "b".to_string()).unwrap();
        trie
    }

    #[test]
    fn test_prefix_matches_ordered_by_length() {
        // 测试场景：同一起点的全部前缀命中，按Key长度升序
        let trie = sample_trie();
        let text: Vec<char> = "abcdz".chars().collect();

        let matches = trie.prefix_matches(&text, 0);
        let lens: Vec<usize> = matches.iter().map(|m| m.len).collect();
        assert_eq!(lens, vec![1, 2, 4]);
        assert_eq!(matches[2].value, "4");
    }

    #[test]
    fn test_prefix_matches_at_offset() {
        // 测试场景：startOffset偏移处查询
        let trie = sample_trie();
        let text: Vec<char> = "zzbx".chars().collect();
        let matches = trie.prefix_matches(&text, 2);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].len, 2);
        assert_eq!(matches[0].value, "b");
    }

    #[test]
    fn test_longest_match() {
        // 测试场景：最长前缀命中（中间无终端的路径不计入）
        let trie = sample_trie();
        let text: Vec<char> = "abc".chars().collect();
        // "abc"非终端，最长命中应为"ab"
        let best = trie.longest_match_at(&text, 0).unwrap();
        assert_eq!(best.len, 2);
        assert_eq!(best.value, "2");
    }

    #[test]
    fn test_longest_match_in_peek_closure() {
        // 测试场景：peek闭包探测与切片探测结果一致
        let trie = sample_trie();
        let text: Vec<char> = "abcd".chars().collect();
        let best = trie
            .longest_match_in(|i| text.get(i).copied())
            .unwrap();
        assert_eq!(best.len, 4);
        assert_eq!(best.value, "4");
    }

    #[test]
    fn test_insert_empty_key_rejected() {
        // 测试场景：空Key插入报EmptyRuleKey
        let mut trie: RuleTrie<String> = RuleTrie::new();
        assert!(matches!(
            trie.insert("", "x".to_string()),
            Err(CoreError::EmptyRuleKey)
        ));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_insert_duplicate_key_last_write_wins() {
        // 测试场景：重复Key后写覆盖，rule_count不重复计数
        let mut trie = RuleTrie::new();
        trie.insert("key", "old").unwrap();
        trie.insert("key", "new").unwrap();
        assert_eq!(trie.rule_count(), 1);

        let text: Vec<char> = "key".chars().collect();
        assert_eq!(*trie.longest_match_at(&text, 0).unwrap().value, "new");
    }

    #[test]
    fn test_max_key_len_tracking() {
        // 测试场景：max_key_len按字符数跟踪
        let trie = sample_trie();
        assert_eq!(trie.max_key_len(), 4);
    }

    #[test]
    fn test_get_node_auto_create() {
        // 测试场景：auto_create=true创建缺失中间节点，false则返回None
        let mut trie: RuleTrie<u32> = RuleTrie::new();
        assert!(trie.get_node_mut("ab", false).is_none());

        let node = trie.get_node_mut("ab", true).unwrap();
        node.set_value(7);

        let found = trie.get_node("ab").unwrap();
        assert_eq!(found.value(), Some(&7));
        // 中间节点"a"已创建且非终端
        let mid = trie.get_node("a").unwrap();
        assert!(!mid.is_terminal());
        assert_eq!(mid.child_count(), 1);
    }

    #[test]
    fn test_no_match_returns_empty() {
        // 测试场景：无命中返回空集合/None
        let trie = sample_trie();
        let text: Vec<char> = "zzz".chars().collect();
        assert!(trie.prefix_matches(&text, 0).is_empty());
        assert!(trie.longest_match_at(&text, 0).is_none());
    }
}
