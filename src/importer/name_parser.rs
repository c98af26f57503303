// ==========================================
// 会员组织管理系统 - 姓名解析
// ==========================================
// 规则:
// - 按空白切分，丢弃空 token
// - ≥2 个 token: 最后一个为姓，其余以单空格拼接为名
// - 1 个 token: 只有名，姓为空串
// - 0 个 token: 解析失败
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub first_name: String,
    pub last_name: String,
}

pub struct NameParser;

impl NameParser {
    pub fn parse(&self, raw: &str) -> Option<ParsedName> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();

        match tokens.split_last() {
            None => None,
            Some((only, [])) => Some(ParsedName {
                first_name: only.to_string(),
                last_name: String::new(),
            }),
            Some((last, rest)) => Some(ParsedName {
                first_name: rest.join(" "),
                last_name: last.to_string(),
            }),
        }
    }
}
