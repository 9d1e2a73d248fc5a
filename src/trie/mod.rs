//! 规则字典树
//! 一次构建、只读共享的前缀树；同一个编译产物同时服务替换引擎与模式扫描器

pub mod node;
pub mod rule_trie;

pub use node::TrieNode;
pub use rule_trie::{PrefixMatch, RuleTrie};
