//! 规则源解析
//! 把外部规则文档（扁平JSON规则列表）解析为内部RuleSet

pub mod json;

pub use json::load_rules_json;
