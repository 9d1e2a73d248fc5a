use rustc_hash::FxHashMap;

/// 字典树节点
/// 由所属字典树独占持有，仅能沿root的字符路径到达；构建完成后只读
#[derive(Debug, Clone)]
pub struct TrieNode<V> {
    /// 下一字符 → 子节点
    children: FxHashMap<char, TrieNode<V>>,
    /// 终端载荷（Some表示从root到此节点的字符路径是一条完整规则Key）
    value: Option<V>,
}

impl<V> Default for TrieNode<V> {
    fn default() -> Self {
        Self {
            children: FxHashMap::default(),
            value: None,
        }
    }
}

impl<V> TrieNode<V> {
    /// 按字符取子节点
    #[inline(always)]
    pub fn child(&self, ch: char) -> Option<&TrieNode<V>> {
        self.children.get(&ch)
    }

    /// 按字符取可变子节点
    #[inline(always)]
    pub fn child_mut(&mut self, ch: char) -> Option<&mut TrieNode<V>> {
        self.children.get_mut(&ch)
    }

    /// 取子节点，缺失时创建空节点（构建期使用）
    #[inline(always)]
    pub fn child_or_create(&mut self, ch: char) -> &mut TrieNode<V> {
        self.children.entry(ch).or_default()
    }

    /// 终端载荷
    #[inline(always)]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// 设置终端载荷（重复Key后写覆盖即发生在这里）
    #[inline(always)]
    pub fn set_value(&mut self, value: V) -> Option<V> {
        self.value.replace(value)
    }

    /// 是否为终端节点
    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        self.value.is_some()
    }

    /// 子节点数量
    #[inline(always)]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}
