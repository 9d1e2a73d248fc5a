//! 字符源/输出端抽象
//! 拉取式顺序字符源（内存字符串/任意BufRead）与推送式字符输出端（String/任意Write）
//! 底层IO错误原样上抛，内核不重试不吞错

use std::io::{BufRead, Write};

use crate::error::{CoreError, CoreResult};

/// 拉取式顺序字符源
/// `next_char`返回None表示源已耗尽；错误直接中止当前调用
pub trait CharSource {
    /// 拉取下一个字符
    fn next_char(&mut self) -> CoreResult<Option<char>>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    #[inline(always)]
    fn next_char(&mut self) -> CoreResult<Option<char>> {
        (**self).next_char()
    }
}

/// 字符输出端
/// 写入即落盘语义由下游决定；失败时已写入部分不回滚
pub trait CharSink {
    /// 写入单个字符
    fn write_char(&mut self, ch: char) -> CoreResult<()>;

    /// 写入整个字符串（默认逐字符写入）
    fn write_str(&mut self, text: &str) -> CoreResult<()> {
        for ch in text.chars() {
            self.write_char(ch)?;
        }
        Ok(())
    }
}

impl<S: CharSink + ?Sized> CharSink for &mut S {
    #[inline(always)]
    fn write_char(&mut self, ch: char) -> CoreResult<()> {
        (**self).write_char(ch)
    }
}

impl CharSink for String {
    #[inline(always)]
    fn write_char(&mut self, ch: char) -> CoreResult<()> {
        self.push(ch);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> CoreResult<()> {
        self.push_str(text);
        Ok(())
    }
}

/// 内存字符串字符源
pub struct StrSource<'a> {
    chars: std::str::Chars<'a>,
}

impl<'a> StrSource<'a> {
    /// 包装一个完整字符串为拉取式字符源
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
        }
    }
}

impl CharSource for StrSource<'_> {
    #[inline(always)]
    fn next_char(&mut self) -> CoreResult<Option<char>> {
        Ok(self.chars.next())
    }
}

/// BufRead字符源：增量UTF-8解码，不整体物化输入
/// 适配文件/网络响应体等任意字节流
pub struct ReaderSource<R: BufRead> {
    inner: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// 包装一个BufRead为拉取式字符源
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// 交还内部reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> CharSource for ReaderSource<R> {
    fn next_char(&mut self) -> CoreResult<Option<char>> {
        // 1. 读首字节（EOF → None）
        let mut lead = [0u8; 1];
        let n = self.inner.read(&mut lead)?;
        if n == 0 {
            return Ok(None);
        }

        // 2. 按UTF-8首字节判定编码长度
        let width = match lead[0] {
            b if b < 0x80 => 1,
            b if (0xC0..0xE0).contains(&b) => 2,
            b if (0xE0..0xF0).contains(&b) => 3,
            b if (0xF0..0xF8).contains(&b) => 4,
            b => {
                return Err(CoreError::InvalidInput(format!(
                    "invalid UTF-8 lead byte 0x{b:02X}"
                )))
            }
        };
        if width == 1 {
            return Ok(Some(lead[0] as char));
        }

        // 3. 补齐续字节并解码（截断的续字节以UnexpectedEof上抛）
        let mut bytes = [0u8; 4];
        bytes[0] = lead[0];
        self.inner.read_exact(&mut bytes[1..width])?;

        match std::str::from_utf8(&bytes[..width]) {
            Ok(s) => Ok(s.chars().next()),
            Err(_) => Err(CoreError::InvalidInput(format!(
                "invalid UTF-8 sequence {:02X?}",
                &bytes[..width]
            ))),
        }
    }
}

/// Write字符输出端：UTF-8编码写出
pub struct IoSink<W: Write> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    /// 包装一个Write为字符输出端
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// 冲刷内部writer（包装BufWriter等带缓冲下游时保证送达）
    pub fn flush(&mut self) -> CoreResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// 交还内部writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> CharSink for IoSink<W> {
    fn write_char(&mut self, ch: char) -> CoreResult<()> {
        let mut utf8 = [0u8; 4];
        self.inner.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> CoreResult<()> {
        self.inner.write_all(text.as_bytes())?;
        Ok(())
    }
}
