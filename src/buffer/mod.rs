//! 有界前瞻环形缓冲
//! 流式替换引擎唯一的堆内存工作区，容量上限与输入长度无关

pub mod ring_buffer;

pub use ring_buffer::{CapacityLimit, CharRingBuffer};
