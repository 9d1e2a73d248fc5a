//! 流式替换执行核心
//! `Rewriter`为规则集的一次性编译产物（可克隆、可跨线程只读共享）；
//! `RewritingSource`为按输入流创建的引擎实例，自身实现`CharSource`，
//! 拉取即得到替换后的字符流。
//!
//! 共享契约：最左、最长优先、不重叠；未命中字符原样透传、输出保序；
//! 前瞻缓冲不超过最长规则Key的字符数，内存与输入长度无关。

use std::collections::VecDeque;

use crate::buffer::CharRingBuffer;
use crate::core::{RuleSet, StrategyKind};
use crate::engine::source::{CharSink, CharSource, StrSource};
use crate::engine::strategy::Strategy;
use crate::error::{CoreError, CoreResult};

/// 前瞻缓冲容量配置（构建期）
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    /// 初始存储槽数（惰性增长起点）
    pub initial_capacity: usize,
    /// 容量上限；None表示取最长规则Key的字符数（最小前瞻需求）
    pub max_capacity: Option<usize>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            max_capacity: None,
        }
    }
}

/// 编译后的替换器
/// 一个规则集编译一次；更换规则集须新建实例（分类/编译均为构建期一次性动作）
#[derive(Debug, Clone)]
pub struct Rewriter {
    strategy: Strategy,
    /// 最长规则Key的字符数（前瞻需求）
    max_key_len: usize,
    /// 缓冲初始槽数
    initial_capacity: usize,
    /// 缓冲容量上限
    max_capacity: usize,
}

impl Rewriter {
    /// 按规则形态自动选择变体并编译
    pub fn new(rules: &RuleSet) -> CoreResult<Self> {
        Self::build(rules, None, BufferConfig::default())
    }

    /// 强制指定变体编译（一致性测试/基准对照用）
    pub fn with_kind(rules: &RuleSet, kind: StrategyKind) -> CoreResult<Self> {
        Self::build(rules, Some(kind), BufferConfig::default())
    }

    /// 自定义缓冲容量编译
    pub fn with_config(rules: &RuleSet, config: BufferConfig) -> CoreResult<Self> {
        Self::build(rules, None, config)
    }

    /// 编译入口
    ///
    /// # 校验
    /// 容量上限小于最长规则Key时前瞻结构上必然不足，构建期即报
    /// InsufficientLookahead，不留到运行期
    pub fn build(
        rules: &RuleSet,
        kind: Option<StrategyKind>,
        config: BufferConfig,
    ) -> CoreResult<Self> {
        let max_key_len = rules.longest_key_len();
        let kind = kind.unwrap_or_else(|| StrategyKind::select(rules));
        let strategy = Strategy::compile(rules, kind)?;

        // 空规则集也保留1个前瞻槽位，保证透传路径可推进
        let required = max_key_len.max(1);
        let max_capacity = config.max_capacity.unwrap_or(required);
        if max_capacity < required {
            return Err(CoreError::InsufficientLookahead {
                required,
                configured: max_capacity,
            });
        }

        log::debug!(
            "Rewriter compiled | rules: {} | longest_key: {} | strategy: {} | lookahead_capacity: {}",
            rules.len(),
            max_key_len,
            kind,
            max_capacity
        );

        Ok(Self {
            strategy,
            max_key_len,
            initial_capacity: config.initial_capacity.min(max_capacity),
            max_capacity,
        })
    }

    /// 选中的变体标签
    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// 最长规则Key的字符数
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// 为一个输入流创建引擎实例（编译产物零拷贝共享）
    pub fn wrap<S: CharSource>(&self, source: S) -> RewritingSource<S> {
        let state = match &self.strategy {
            Strategy::CharTable { .. } | Strategy::CharSeqTable { .. } => EngineState::Direct,
            Strategy::Trie { .. } => EngineState::Buffered {
                buffer: CharRingBuffer::new(self.initial_capacity, self.max_capacity),
            },
            Strategy::Baseline { .. } => EngineState::Materialized {
                text: Vec::new(),
                pos: 0,
                loaded: false,
            },
        };

        RewritingSource {
            strategy: self.strategy.clone(),
            inner: source,
            pending: VecDeque::new(),
            state,
            lookahead: self.max_key_len.max(1),
            exhausted: false,
            replaced: 0,
        }
    }

    /// 驱动器：把source完整替换写入sink
    ///
    /// # 返回值
    /// 执行的替换次数；出错即中止，已写入sink的内容不回滚
    pub fn rewrite<S: CharSource, K: CharSink>(
        &self,
        source: S,
        sink: &mut K,
    ) -> CoreResult<u64> {
        let mut engine = self.wrap(source);
        while let Some(ch) = engine.next_char()? {
            sink.write_char(ch)?;
        }
        Ok(engine.replacements())
    }

    /// 便捷入口：对完整字符串执行替换
    pub fn rewrite_str(&self, input: &str) -> CoreResult<String> {
        let mut out = String::with_capacity(input.len());
        self.rewrite(StrSource::new(input), &mut out)?;
        Ok(out)
    }
}

/// 引擎实例的变体专属工作区
#[derive(Debug)]
enum EngineState {
    /// 查表变体：无工作区
    Direct,
    /// 字典树变体：有界前瞻环形缓冲
    Buffered { buffer: CharRingBuffer },
    /// 参考变体：整体物化输入（仅校验用途，不受流式内存界约束）
    Materialized {
        text: Vec<char>,
        pos: usize,
        loaded: bool,
    },
}

/// 流式替换引擎实例
/// 独占一个前瞻缓冲与待输出队列，持有编译产物的共享引用；
/// 自身实现`CharSource`，逐字符拉出替换后的输出
pub struct RewritingSource<S: CharSource> {
    strategy: Strategy,
    inner: S,
    /// 待输出队列（替换值逐字符排队输出）
    pending: VecDeque<char>,
    state: EngineState,
    /// 前瞻字符数（= 最长Key字符数，最小1）
    lookahead: usize,
    /// 输入源是否已耗尽
    exhausted: bool,
    /// 已执行替换次数（当前输入流）
    replaced: u64,
}

impl<S: CharSource> RewritingSource<S> {
    /// 当前输入流已执行的替换次数
    pub fn replacements(&self) -> u64 {
        self.replaced
    }

    /// 前瞻缓冲历史峰值（有界性验证；查表/参考变体恒为0）
    pub fn buffer_high_water(&self) -> usize {
        match &self.state {
            EngineState::Buffered { buffer } => buffer.high_water(),
            _ => 0,
        }
    }

    /// 重定向到新输入源
    /// 重置缓冲/游标/待输出队列与替换计数，编译产物（字典树/查表）原样保留，
    /// 以便同一编译成本分摊到多个输入流
    pub fn retarget(&mut self, source: S) {
        self.inner = source;
        self.pending.clear();
        self.exhausted = false;
        self.replaced = 0;
        match &mut self.state {
            EngineState::Direct => {}
            EngineState::Buffered { buffer } => buffer.clear(),
            EngineState::Materialized { text, pos, loaded } => {
                text.clear();
                *pos = 0;
                *loaded = false;
            }
        }
    }

    /// 查表变体（单字符Key/单字符Value）推进一步
    /// 步进结果约定（四个变体一致）：
    /// - `Ok(Some(Some(ch)))`: 产出一个输出字符
    /// - `Ok(Some(None))`: 输入耗尽，整体结束
    /// - `Ok(None)`: 本步完成一次替换，替换值已入待输出队列，需继续循环
    fn step_char_table(&mut self) -> CoreResult<Option<Option<char>>> {
        let Strategy::CharTable { table } = &self.strategy else {
            return Err(CoreError::InvariantViolation("char-table step without char-table strategy"));
        };

        match self.inner.next_char()? {
            Some(ch) => match table.get(&ch) {
                Some(&replacement) => {
                    self.replaced += 1;
                    Ok(Some(Some(replacement)))
                }
                None => Ok(Some(Some(ch))),
            },
            None => Ok(Some(None)),
        }
    }

    /// 查表变体（单字符Key/变长Value）推进一步
    fn step_seq_table(&mut self) -> CoreResult<Option<Option<char>>> {
        let Strategy::CharSeqTable { table } = &self.strategy else {
            return Err(CoreError::InvariantViolation("seq-table step without seq-table strategy"));
        };

        match self.inner.next_char()? {
            Some(ch) => match table.get(&ch) {
                Some(replacement) => {
                    // 替换值可为空串（删除语义），统一走排队路径
                    self.replaced += 1;
                    self.pending.extend(replacement.chars());
                    Ok(None)
                }
                None => Ok(Some(Some(ch))),
            },
            None => Ok(Some(None)),
        }
    }

    /// 字典树变体推进一步
    fn step_trie(&mut self) -> CoreResult<Option<Option<char>>> {
        let Strategy::Trie { trie } = &self.strategy else {
            return Err(CoreError::InvariantViolation("trie step without trie strategy"));
        };
        let EngineState::Buffered { buffer } = &mut self.state else {
            return Err(CoreError::InvariantViolation("trie step without lookahead buffer"));
        };

        // 1. 补满前瞻窗口（最多lookahead个字符）
        while buffer.len() < self.lookahead && !self.exhausted {
            match self.inner.next_char()? {
                Some(ch) => buffer.enqueue(ch)?,
                None => self.exhausted = true,
            }
        }

        // 2. 输入耗尽且缓冲排空 → 整体结束
        if buffer.is_empty() {
            return Ok(Some(None));
        }

        // 3. 从缓冲队首探测最长规则Key
        let hit = trie
            .longest_match_in(|i| buffer.peek(i).ok())
            .map(|m| (m.len, m.value.clone()));

        match hit {
            Some((len, value)) => {
                // 命中：精确消费Key长度的缓冲字符，替换值排队输出
                for _ in 0..len {
                    buffer.dequeue()?;
                }
                self.replaced += 1;
                self.pending.extend(value.chars());
                Ok(None)
            }
            // 未命中：放行最老的一个缓冲字符
            None => Ok(Some(Some(buffer.dequeue()?))),
        }
    }

    /// 参考变体推进一步（语义同step_trie，逐位置暴力尝试全部规则Key）
    fn step_baseline(&mut self) -> CoreResult<Option<Option<char>>> {
        let Strategy::Baseline { rules } = &self.strategy else {
            return Err(CoreError::InvariantViolation("baseline step without baseline strategy"));
        };
        let EngineState::Materialized { text, pos, loaded } = &mut self.state else {
            return Err(CoreError::InvariantViolation("baseline step without materialized input"));
        };

        // 参考实现整体物化输入（仅用作一致性校验基准）
        if !*loaded {
            while let Some(ch) = self.inner.next_char()? {
                text.push(ch);
            }
            *loaded = true;
        }

        let chars = &*text;
        if *pos >= chars.len() {
            return Ok(Some(None));
        }

        // 逐条规则直接比对当前位置，取最长命中
        let mut best: Option<(usize, &String)> = None;
        for (key, value) in rules.iter() {
            let key_len = key.len();
            if key_len > chars.len() - *pos {
                continue;
            }
            if chars[*pos..*pos + key_len] == key[..] {
                match best {
                    Some((best_len, _)) if best_len >= key_len => {}
                    _ => best = Some((key_len, value)),
                }
            }
        }

        match best {
            Some((key_len, value)) => {
                *pos += key_len;
                self.replaced += 1;
                self.pending.extend(value.chars());
                Ok(None)
            }
            None => {
                let ch = chars[*pos];
                *pos += 1;
                Ok(Some(Some(ch)))
            }
        }
    }
}

impl<S: CharSource> CharSource for RewritingSource<S> {
    fn next_char(&mut self) -> CoreResult<Option<char>> {
        loop {
            // 替换值逐字符排队输出，优先排空
            if let Some(ch) = self.pending.pop_front() {
                return Ok(Some(ch));
            }

            let step = match self.strategy.kind() {
                StrategyKind::CharTable => self.step_char_table()?,
                StrategyKind::CharSeqTable => self.step_seq_table()?,
                StrategyKind::Trie => self.step_trie()?,
                StrategyKind::Baseline => self.step_baseline()?,
            };
            if let Some(out) = step {
                return Ok(out);
            }
        }
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source::{IoSink, ReaderSource};
    use std::io::BufReader;

    /// 测试日志初始化（RUST_LOG=debug可观察编译统计）
    fn init_test_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rule_set(pairs: &[(&str, &str)]) -> RuleSet {
        let mut rules = RuleSet::new();
        for (key, value) in pairs {
            rules.add(*key, *value).unwrap();
        }
        rules
    }

    /// 规则形态适用的全部变体（供一致性套件复用）
    fn applicable_kinds(rules: &RuleSet) -> Vec<StrategyKind> {
        match StrategyKind::select(rules) {
            StrategyKind::CharTable => vec![
                StrategyKind::Baseline,
                StrategyKind::CharTable,
                StrategyKind::CharSeqTable,
                StrategyKind::Trie,
            ],
            StrategyKind::CharSeqTable => vec![
                StrategyKind::Baseline,
                StrategyKind::CharSeqTable,
                StrategyKind::Trie,
            ],
            _ => vec![StrategyKind::Baseline, StrategyKind::Trie],
        }
    }

    /// 一致性断言：所有适用变体对同一(规则集, 输入)产出逐字节一致
    fn assert_all_variants(rules: &RuleSet, input: &str, expected: &str) {
        for kind in applicable_kinds(rules) {
            let rewriter = Rewriter::with_kind(rules, kind).unwrap();
            let output = rewriter.rewrite_str(input).unwrap();
            assert_eq!(output, expected, "variant {kind} diverged on {input:?}");
        }
    }

    #[test]
    fn test_empty_rule_set_identity() {
        // 测试场景：空规则集下任意输入（含空串）原样透传，全变体一致
        let rules = RuleSet::new();
        assert_all_variants(&rules, "", "");
        assert_all_variants(&rules, "hello world", "hello world");
        assert_all_variants(&rules, "中文mixed", "中文mixed");
    }

    #[test]
    fn test_longest_match_priority() {
        // 测试场景：{"a"→"foo","aa"→"bar"}，输入"aaa" → "barfoo"
        let rules = rule_set(&[("a", "foo"), ("aa", "bar")]);
        assert_all_variants(&rules, "aaa", "barfoo");
    }

    #[test]
    fn test_three_level_priority() {
        // 测试场景：再加"aaa"→"zoo"后，输入"aaa" → "zoo"
        let rules = rule_set(&[("a", "foo"), ("aa", "bar"), ("aaa", "zoo")]);
        assert_all_variants(&rules, "aaa", "zoo");
        // 第四个a回落到"a"规则
        assert_all_variants(&rules, "aaaa", "zoofoo");
    }

    #[test]
    fn test_cross_variant_single_char_rules() {
        // 测试场景：单字符规则，四个变体逐字节一致
        let rules = rule_set(&[("a", "x"), ("b", "y")]);
        assert_all_variants(&rules, "abcab", "xycxy");
    }

    #[test]
    fn test_cross_variant_variable_length_values() {
        // 测试场景：单字符Key配空串/多字符Value
        let rules = rule_set(&[("a", ""), ("b", "long-replacement")]);
        assert_all_variants(&rules, "aba", "long-replacement");
        assert_all_variants(&rules, "ccc", "ccc");
    }

    #[test]
    fn test_cross_variant_overlapping_prefix_rules() {
        // 测试场景：公共前缀多字符规则（"ab"/"abc"/"b"），最左最长不重叠
        let rules = rule_set(&[("ab", "1"), ("abc", "2"), ("b", "3")]);
        assert_all_variants(&rules, "ababc", "12");
        assert_all_variants(&rules, "aabba", "a13a");
        assert_all_variants(&rules, "abcb", "23");
    }

    #[test]
    fn test_empty_value_removes_match() {
        // 测试场景：空替换值=删除匹配文本，含行尾命中
        let rules = rule_set(&[("ab", "")]);
        assert_all_variants(&rules, "xabz", "xz");
        assert_all_variants(&rules, "abab", "");
    }

    #[test]
    fn test_no_match_pure_copy_through() {
        // 测试场景：规则永不命中 → 纯透传
        let rules = rule_set(&[("zzz", "!")]);
        assert_all_variants(&rules, "hello world", "hello world");
    }

    #[test]
    fn test_short_input_flush() {
        // 测试场景：输入短于最长Key，结尾缓冲字符原样冲出
        let rules = rule_set(&[("abcdef", "X")]);
        assert_all_variants(&rules, "abc", "abc");
        // 结尾差一个字符的部分匹配同样冲出
        assert_all_variants(&rules, "zabcde", "zabcde");
    }

    #[test]
    fn test_match_at_end_of_input() {
        // 测试场景：命中恰好贴在输入末尾
        let rules = rule_set(&[("end", "END")]);
        assert_all_variants(&rules, "the end", "the END");
    }

    #[test]
    fn test_multibyte_rules() {
        // 测试场景：多字节字符规则（字符粒度而非字节粒度）
        let rules = rule_set(&[("東京", "Tokyo"), ("京", "K")]);
        assert_all_variants(&rules, "東京と京", "TokyoとK");
    }

    #[test]
    fn test_streaming_boundedness() {
        // 测试场景：≥10000字符输入，前瞻缓冲峰值不超过最长Key字符数
        init_test_logs();
        let rules = rule_set(&[("ab", "X"), ("abcde", "Y")]);
        let rewriter = Rewriter::new(&rules).unwrap();
        assert_eq!(rewriter.kind(), StrategyKind::Trie);

        let input: String = "abcdxq".repeat(2000); // 12000字符
        let mut engine = rewriter.wrap(StrSource::new(&input));
        let mut out = String::new();
        while let Some(ch) = engine.next_char().unwrap() {
            out.push(ch);
        }

        // "abcde"从未出现，逐块命中"ab"
        assert_eq!(out, "Xcdxq".repeat(2000));
        assert!(engine.buffer_high_water() <= rewriter.max_key_len());
        assert_eq!(engine.buffer_high_water(), 5);
    }

    #[test]
    fn test_rewrite_returns_replacement_count() {
        // 测试场景：rewrite返回替换次数
        let rules = rule_set(&[("ab", "x")]);
        let rewriter = Rewriter::new(&rules).unwrap();
        let mut out = String::new();
        let count = rewriter
            .rewrite(StrSource::new("ababzab"), &mut out)
            .unwrap();
        assert_eq!(out, "xxzx");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_retarget_reuses_compiled_trie() {
        // 测试场景：重定向到新输入源，缓冲/游标/计数重置，编译产物复用
        let rules = rule_set(&[("aa", "bar"), ("a", "foo")]);
        let rewriter = Rewriter::new(&rules).unwrap();

        let first = "aaa".to_string();
        let second = "za".to_string();
        let mut engine = rewriter.wrap(StrSource::new(&first));
        let mut out = String::new();
        while let Some(ch) = engine.next_char().unwrap() {
            out.push(ch);
        }
        assert_eq!(out, "barfoo");
        assert_eq!(engine.replacements(), 2);

        engine.retarget(StrSource::new(&second));
        let mut out = String::new();
        while let Some(ch) = engine.next_char().unwrap() {
            out.push(ch);
        }
        assert_eq!(out, "zfoo");
        assert_eq!(engine.replacements(), 1);
    }

    #[test]
    fn test_insufficient_lookahead_rejected_at_build() {
        // 测试场景：容量上限小于最长Key，构建期报InsufficientLookahead
        let rules = rule_set(&[("abc", "x")]);
        let config = BufferConfig {
            initial_capacity: 1,
            max_capacity: Some(2),
        };
        assert!(matches!(
            Rewriter::with_config(&rules, config),
            Err(CoreError::InsufficientLookahead {
                required: 3,
                configured: 2,
            })
        ));
    }

    #[test]
    fn test_custom_capacity_accepted() {
        // 测试场景：上限≥最长Key即可，富余容量不影响语义
        let rules = rule_set(&[("abc", "x")]);
        let config = BufferConfig {
            initial_capacity: 1,
            max_capacity: Some(64),
        };
        let rewriter = Rewriter::with_config(&rules, config).unwrap();
        assert_eq!(rewriter.rewrite_str("zabcz").unwrap(), "zxz");
    }

    #[test]
    fn test_io_source_and_sink_end_to_end() {
        // 测试场景：BufRead源 + Write输出端整链替换
        let rules = rule_set(&[("東京", "Tokyo")]);
        let rewriter = Rewriter::new(&rules).unwrap();

        let input = "訪問東京！".as_bytes();
        let source = ReaderSource::new(BufReader::new(input));
        let mut sink = IoSink::new(Vec::new());
        let count = rewriter.rewrite(source, &mut sink).unwrap();

        assert_eq!(count, 1);
        assert_eq!(sink.into_inner(), "訪問Tokyo！".as_bytes());
    }

    #[test]
    fn test_last_write_wins_applies_to_engine() {
        // 测试场景：重复Key后写覆盖对引擎生效
        let rules = rule_set(&[("ab", "old"), ("ab", "new")]);
        assert_all_variants(&rules, "ab", "new");
    }
}
