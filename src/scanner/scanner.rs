//! 模式扫描执行核心
//! 自持字典树 + 构建期配置；扫描间无状态，同一实例可对任意数量字符串复用

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::MatchPolicy;
use crate::error::CoreResult;
use crate::trie::{RuleTrie, TrieNode};
use crate::utils::preview_compact;

/// 全局预编译空白分词正则（零拷贝全局复用）
static WHITESPACE_DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// 单条扫描命中
/// 偏移以字符计；`text`借用原始输入的命中片段，`payload`借用规则载荷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMatch<'a, V> {
    /// 命中起始字符偏移
    pub start: usize,
    /// 命中结束字符偏移（不含）
    pub end: usize,
    /// 命中文本片段
    pub text: &'a str,
    /// 规则载荷
    pub payload: &'a V,
}

/// 扫描器配置构建器
/// 链式设置策略后`build`；分词正则在build时编译，语法错误即刻上抛
#[derive(Debug, Clone, Default)]
pub struct PatternScannerBuilder {
    policy: MatchPolicy,
    skip_overlap: bool,
    leading_boundary: Option<char>,
    trailing_boundary: Option<char>,
    token_delimiter: Option<String>,
}

impl PatternScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同一起始偏移多个命中时的选择策略（默认All）
    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 重叠跳过策略（默认false）
    /// true：接受命中后扫描游标越过整个命中，抑制嵌套/重叠命中
    /// false：游标始终推进到下一扫描偏移，嵌套命中同样上报
    pub fn skip_overlap(mut self, skip: bool) -> Self {
        self.skip_overlap = skip;
        self
    }

    /// 前导边界字符（默认无约束）
    /// 命中仅当其紧前字符等于该字符、或命中起于偏移0时才接受
    pub fn leading_boundary(mut self, boundary: char) -> Self {
        self.leading_boundary = Some(boundary);
        self
    }

    /// 尾随边界字符（默认无约束，语义与前导边界对称）
    pub fn trailing_boundary(mut self, boundary: char) -> Self {
        self.trailing_boundary = Some(boundary);
        self
    }

    /// 分词正则（与边界字符相互独立的约束轴）
    /// 设置后扫描起点仅限偏移0与每个极大分隔符连续段之后的偏移；
    /// 锚定在该起点的命中内部仍可越过分隔符字符
    pub fn token_delimiter(mut self, pattern: impl Into<String>) -> Self {
        self.token_delimiter = Some(pattern.into());
        self
    }

    /// 便捷：以空白连续段作为分词（复用全局预编译正则）
    pub fn whitespace_delimiter(mut self) -> Self {
        self.token_delimiter = Some(WHITESPACE_DELIMITER.as_str().to_string());
        self
    }

    /// 构建扫描器（分词正则在此编译，失败报RegexCompileError）
    pub fn build<V>(self) -> CoreResult<PatternScanner<V>> {
        let token_delimiter = match self.token_delimiter {
            Some(pattern) => Some(Regex::new(&pattern)?),
            None => None,
        };

        Ok(PatternScanner {
            trie: RuleTrie::new(),
            policy: self.policy,
            skip_overlap: self.skip_overlap,
            leading_boundary: self.leading_boundary,
            trailing_boundary: self.trailing_boundary,
            token_delimiter,
        })
    }
}

/// 多模式扫描器
/// 自持一棵规则字典树；规则注册（构建阶段）须在任何扫描开始前完成，
/// 两阶段不重叠即可跨线程只读共享扫描
#[derive(Debug, Clone)]
pub struct PatternScanner<V> {
    trie: RuleTrie<V>,
    policy: MatchPolicy,
    skip_overlap: bool,
    leading_boundary: Option<char>,
    trailing_boundary: Option<char>,
    token_delimiter: Option<Regex>,
}

impl<V> Default for PatternScanner<V> {
    fn default() -> Self {
        Self {
            trie: RuleTrie::new(),
            policy: MatchPolicy::default(),
            skip_overlap: false,
            leading_boundary: None,
            trailing_boundary: None,
            token_delimiter: None,
        }
    }
}

impl<V> PatternScanner<V> {
    /// 默认配置扫描器（All策略、不跳过重叠、无边界/分词约束）
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一条规则（空Key报EmptyRuleKey；重复Key后写覆盖）
    pub fn add_rule(&mut self, key: impl AsRef<str>, payload: V) -> CoreResult<()> {
        self.trie.insert(key.as_ref(), payload)
    }

    /// 批量注册规则
    pub fn add_rules<K: AsRef<str>>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> CoreResult<()> {
        for (key, payload) in pairs {
            self.add_rule(key, payload)?;
        }
        Ok(())
    }

    /// 已注册规则条数
    pub fn rule_count(&self) -> usize {
        self.trie.rule_count()
    }

    /// 批量注册仅Key规则（载荷取默认值）
    pub fn add_keys<K: AsRef<str>>(&mut self, keys: impl IntoIterator<Item = K>) -> CoreResult<()>
    where
        V: Default,
    {
        for key in keys {
            self.add_rule(key, V::default())?;
        }
        Ok(())
    }

    /// Key路径节点自省
    pub fn get_node(&self, key: &str) -> Option<&TrieNode<V>> {
        self.trie.get_node(key)
    }

    /// Key路径可变节点（auto_create=true时沿路创建缺失中间节点）
    pub fn get_node_mut(&mut self, key: &str, auto_create: bool) -> Option<&mut TrieNode<V>> {
        self.trie.get_node_mut(key, auto_create)
    }

    /// 扫描完整字符串，按配置策略经回调上报命中
    ///
    /// # 参数
    /// - `text`: 完整输入字符串
    /// - `on_match`: 每条被接受的命中回调一次
    ///
    /// # 返回值
    /// 被接受的命中总数
    pub fn scan<'a, F>(&'a self, text: &'a str, mut on_match: F) -> usize
    where
        F: FnMut(ScanMatch<'a, V>),
    {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() || self.trie.is_empty() {
            return 0;
        }

        // 字符偏移 → 字节偏移（末尾追加总长，便于切片）
        let mut byte_offsets: Vec<usize> = Vec::with_capacity(chars.len() + 1);
        byte_offsets.extend(text.char_indices().map(|(b, _)| b));
        byte_offsets.push(text.len());

        let offsets = self.scan_start_offsets(text, &byte_offsets, chars.len());
        log::debug!(
            "Scan start | rules: {} | policy: {} | skip_overlap: {} | offsets: {} | input: {}",
            self.trie.rule_count(),
            self.policy,
            self.skip_overlap,
            offsets.len(),
            preview_compact(text, 80)
        );

        let mut accepted_total = 0;
        let mut i = 0;
        while i < offsets.len() {
            let offset = offsets[i];

            // 1. 前导边界：与候选无关，先行短路
            if let Some(lead) = self.leading_boundary {
                if offset > 0 && chars[offset - 1] != lead {
                    i += 1;
                    continue;
                }
            }

            // 2. 字典树前缀查询 + 尾随边界过滤（候选按Key长度升序）
            let candidates: Vec<_> = self
                .trie
                .prefix_matches(&chars, offset)
                .into_iter()
                .filter(|m| match self.trailing_boundary {
                    Some(trail) => {
                        offset + m.len == chars.len() || chars[offset + m.len] == trail
                    }
                    None => true,
                })
                .collect();

            // 3. 按策略选择上报集合
            let selected: &[_] = match self.policy {
                MatchPolicy::Shortest => candidates.first().map(std::slice::from_ref).unwrap_or(&[]),
                MatchPolicy::Longest => candidates.last().map(std::slice::from_ref).unwrap_or(&[]),
                MatchPolicy::All => &candidates,
            };

            let mut accepted_max_len = 0;
            for m in selected {
                accepted_max_len = accepted_max_len.max(m.len);
                accepted_total += 1;
                on_match(ScanMatch {
                    start: offset,
                    end: offset + m.len,
                    text: &text[byte_offsets[offset]..byte_offsets[offset + m.len]],
                    payload: m.value,
                });
            }

            // 4. 游标推进：skip_overlap时越过已接受的最长命中，否则取下一扫描偏移
            i += 1;
            if self.skip_overlap && accepted_max_len > 0 {
                let resume = offset + accepted_max_len;
                while i < offsets.len() && offsets[i] < resume {
                    i += 1;
                }
            }
        }

        accepted_total
    }

    /// 便捷入口：收集全部被接受的命中
    pub fn find_all<'a>(&'a self, text: &'a str) -> Vec<ScanMatch<'a, V>> {
        let mut matches = Vec::new();
        self.scan(text, |m| matches.push(m));
        matches
    }

    /// 计算扫描起点集合（字符偏移，升序）
    /// 无分词约束：全部偏移；有分词约束：偏移0 + 每个极大分隔符连续段之后的偏移
    fn scan_start_offsets(
        &self,
        text: &str,
        byte_offsets: &[usize],
        char_count: usize,
    ) -> Vec<usize> {
        let Some(delimiter) = &self.token_delimiter else {
            return (0..char_count).collect();
        };

        let mut offsets = vec![0];

        // 相邻/毗连的正则命中合并为极大连续段（零宽命中丢弃，保证推进）
        let mut run_end: Option<usize> = None;
        for m in delimiter.find_iter(text) {
            if m.start() == m.end() {
                continue;
            }
            match run_end {
                Some(end) if m.start() <= end => run_end = Some(end.max(m.end())),
                Some(end) => {
                    self.push_token_offset(&mut offsets, end, byte_offsets, text);
                    run_end = Some(m.end());
                }
                None => run_end = Some(m.end()),
            }
        }
        if let Some(end) = run_end {
            self.push_token_offset(&mut offsets, end, byte_offsets, text);
        }

        offsets.dedup();
        offsets
    }

    /// 字节偏移处的连续段结尾换算为字符偏移并记入起点集合
    fn push_token_offset(
        &self,
        offsets: &mut Vec<usize>,
        byte_end: usize,
        byte_offsets: &[usize],
        text: &str,
    ) {
        if byte_end >= text.len() {
            return;
        }
        if let Ok(char_offset) = byte_offsets.binary_search(&byte_end) {
            offsets.push(char_offset);
        }
    }
}
