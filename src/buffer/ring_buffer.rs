//! 有界增长环形字符缓冲
//! 核心不变量：
//! - `0 <= size <= max_capacity`，超限入队立即报BufferOverflow且现有内容原封不动
//! - 存储从initial_capacity惰性增长到max_capacity，达到上限后不再分配
//! - 逻辑下标i的字符位于物理槽 `(head + i) % storage_len`
//! - `sub_sequence`视图与父缓冲共享同一容量上限（共享引用，非值拷贝）
//!
//! 线程模型：单实例单线程使用，无内部同步

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};

/// 共享容量上限
/// 父缓冲与其sub_sequence视图持有同一个Arc实例，写入视图同样受该上限约束
#[derive(Debug)]
pub struct CapacityLimit {
    max: usize,
}

impl CapacityLimit {
    /// 容量上限值
    #[inline(always)]
    pub fn max(&self) -> usize {
        self.max
    }
}

/// 有界前瞻环形字符缓冲
/// O(1)入队/出队/随机peek；`index_of`与批量拷出为O(size)
#[derive(Debug)]
pub struct CharRingBuffer {
    /// 物理存储（长度即当前已分配容量，惰性增长）
    buf: Vec<char>,
    /// 逻辑队首的物理下标
    head: usize,
    /// 当前缓冲的字符数
    len: usize,
    /// 容量上限（Arc共享给sub_sequence视图）
    limit: Arc<CapacityLimit>,
    /// 历史最大缓冲字符数（有界性验证/调试统计用）
    high_water: usize,
}

impl CharRingBuffer {
    /// 创建缓冲区
    ///
    /// # 参数
    /// - `initial_capacity`: 初始存储槽数（会被钳制到不超过max_capacity）
    /// - `max_capacity`: 容量上限，缓冲字符数永不超过该值
    pub fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        let initial = initial_capacity.min(max_capacity);
        Self {
            buf: vec!['\0'; initial],
            head: 0,
            len: 0,
            limit: Arc::new(CapacityLimit { max: max_capacity }),
            high_water: 0,
        }
    }

    /// 创建与父缓冲共享容量上限的空缓冲（sub_sequence内部使用）
    fn with_shared_limit(initial_capacity: usize, limit: Arc<CapacityLimit>) -> Self {
        let initial = initial_capacity.min(limit.max);
        Self {
            buf: vec!['\0'; initial],
            head: 0,
            len: 0,
            limit,
            high_water: 0,
        }
    }

    /// 当前缓冲的字符数
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否为空
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 容量上限
    #[inline(always)]
    pub fn max_capacity(&self) -> usize {
        self.limit.max
    }

    /// 历史最大缓冲字符数
    #[inline(always)]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// 逻辑下标 → 物理槽下标
    #[inline(always)]
    fn slot(&self, index: usize) -> usize {
        (self.head + index) % self.buf.len()
    }

    /// 存储增长：倍增且不超过上限，按FIFO次序重排到新存储头部
    fn grow(&mut self, required: usize) {
        let target = required
            .max(self.buf.len().saturating_mul(2))
            .max(1)
            .min(self.limit.max);

        let mut new_buf = vec!['\0'; target];
        for i in 0..self.len {
            new_buf[i] = self.buf[self.slot(i)];
        }
        self.buf = new_buf;
        self.head = 0;
    }

    /// 追加单个字符
    /// 超出容量上限报BufferOverflow，缓冲内容保持不变
    pub fn enqueue(&mut self, ch: char) -> CoreResult<()> {
        if self.len >= self.limit.max {
            return Err(CoreError::BufferOverflow {
                capacity: self.limit.max,
            });
        }
        if self.len == self.buf.len() {
            self.grow(self.len + 1);
        }

        let tail = self.slot(self.len);
        self.buf[tail] = ch;
        self.len += 1;
        self.high_water = self.high_water.max(self.len);
        Ok(())
    }

    /// 追加整个字符串（全有或全无：先按总量校验，超限则一个字符都不写入）
    pub fn enqueue_str(&mut self, text: &str) -> CoreResult<()> {
        let incoming = text.chars().count();
        if self.len + incoming > self.limit.max {
            return Err(CoreError::BufferOverflow {
                capacity: self.limit.max,
            });
        }
        for ch in text.chars() {
            self.enqueue(ch)?;
        }
        Ok(())
    }

    /// 移除并返回最老的字符
    pub fn dequeue(&mut self) -> CoreResult<char> {
        if self.len == 0 {
            return Err(CoreError::EmptyBuffer { offset: 0, size: 0 });
        }
        let ch = self.buf[self.head];
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        Ok(ch)
    }

    /// 非破坏读取：队首向前offset处的字符（offset=0即最老字符）
    pub fn peek(&self, offset: usize) -> CoreResult<char> {
        if offset >= self.len {
            return Err(CoreError::EmptyBuffer {
                offset,
                size: self.len,
            });
        }
        Ok(self.buf[self.slot(offset)])
    }

    /// 只读下标访问（与peek同语义，对齐CharSequence契约命名）
    #[inline(always)]
    pub fn char_at(&self, index: usize) -> CoreResult<char> {
        self.peek(index)
    }

    /// 截取`[start, end)`只读视图
    /// 返回的新缓冲持有字符拷贝，但与父缓冲共享同一容量上限：
    /// 视图自身的size达到该共享上限时追加即失败，即使视图比父缓冲短
    pub fn sub_sequence(&self, start: usize, end: usize) -> CoreResult<CharRingBuffer> {
        if start > end || end > self.len {
            return Err(CoreError::InvalidInput(format!(
                "sub_sequence range [{start}, {end}) out of bounds for size {size}",
                size = self.len
            )));
        }

        let mut view = Self::with_shared_limit(end - start, Arc::clone(&self.limit));
        for i in start..end {
            view.enqueue(self.buf[self.slot(i)])?;
        }
        Ok(view)
    }

    /// 查找子串首次出现的逻辑偏移（线性扫描）
    ///
    /// # 返回值
    /// - `Some(offset)`: 首次出现处相对队首的偏移
    /// - `None`: 未找到（空模式串约定命中偏移0）
    pub fn index_of(&self, needle: &str) -> Option<usize> {
        let pattern: Vec<char> = needle.chars().collect();
        if pattern.is_empty() {
            return Some(0);
        }
        if pattern.len() > self.len {
            return None;
        }

        'outer: for start in 0..=(self.len - pattern.len()) {
            for (i, &expected) in pattern.iter().enumerate() {
                if self.buf[self.slot(start + i)] != expected {
                    continue 'outer;
                }
            }
            return Some(start);
        }
        None
    }

    /// 非破坏批量拷出：按FIFO次序复制最多n个字符
    pub fn copy_front(&self, n: usize) -> String {
        let count = n.min(self.len);
        let mut out = String::with_capacity(count);
        for i in 0..count {
            out.push(self.buf[self.slot(i)]);
        }
        out
    }

    /// 破坏性批量取出：按FIFO次序移除并返回最多n个字符
    pub fn drain_front(&mut self, n: usize) -> String {
        let count = n.min(self.len);
        let mut out = String::with_capacity(count);
        for _ in 0..count {
            // count <= len 已保证非空
            match self.dequeue() {
                Ok(ch) => out.push(ch),
                Err(_) => break,
            }
        }
        out
    }

    /// 清空内容，保留已分配存储与容量上限
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
