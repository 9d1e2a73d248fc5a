//! 扁平JSON规则源解析器
//! 文档格式为规则对象数组：`[{"key": "...", "value": "..."}, ...]`，
//! `value`缺省为空串（删除语义）。仅做规则列表反序列化，
//! 不对被扫描/替换的输入文本做任何结构化理解。

use crate::core::{Rule, RuleSet};
use crate::error::CoreResult;

/// 从JSON文档解析规则集
///
/// # 语义
/// - 文档内次序即注册次序，重复Key后写覆盖
/// - 空Key报EmptyRuleKey（与编程方式注册同一校验路径）
/// - JSON语法/格式错误报RuleParseError
pub fn load_rules_json(document: &str) -> CoreResult<RuleSet> {
    let entries: Vec<Rule> = serde_json::from_str(document)?;

    let mut rules = RuleSet::new();
    for entry in entries {
        rules.add(entry.key, entry.value)?;
    }

    log::debug!(
        "Rule source loaded | rules: {} | longest_key: {}",
        rules.len(),
        rules.longest_key_len()
    );
    Ok(rules)
}
