//! 流式替换引擎
//! 编译一次规则集（Rewriter），按输入流创建可重定向的引擎实例（RewritingSource）

pub mod rewriter;
pub mod source;
pub mod strategy;

pub use rewriter::{BufferConfig, Rewriter, RewritingSource};
pub use source::{CharSink, CharSource, IoSink, ReaderSource, StrSource};
pub use strategy::Strategy;
