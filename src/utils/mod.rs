//! 通用工具模块

pub mod preview;

pub use preview::preview_compact;
