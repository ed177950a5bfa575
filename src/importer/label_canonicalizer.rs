// ==========================================
// 人员目录批量导入 - 列名规范化
// ==========================================
// 职责: 自由文本列名/字段 label → 规范键
// 用途: CSV 表头与 Schema 的匹配；组装载荷时 label → 字段键
// 红线: 纯函数，全域定义，幂等
// ==========================================
//
// 处理顺序:
// 1. 去除 BOM
// 2. 整体被一对双引号包裹时拆包，内部 "" → "
// 3. 去除末尾括号注释，如 "Fachsemester (Zahl)"
// 4. 折叠空白、TRIM、小写
// 5. NFD 分解并去除变音符号
// 6. 去除所有非字母数字字符
// 7. 同义词表
// 8. 单复数启发式：去 "en"，否则去 "s"（重复直到不再变化，且不剥成空串）

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const BOM: char = '\u{feff}';

/// 同义词表（键已是第 6 步之后的形式；目标值必须映射到自身）
const SYNONYMS: &[(&str, &str)] = &[
    // 名
    ("firstname", "firstname"),
    ("vorname", "firstname"),
    ("vornamen", "firstname"),
    ("givenname", "firstname"),
    // 姓
    ("lastname", "lastname"),
    ("nachname", "lastname"),
    ("familienname", "lastname"),
    ("surname", "lastname"),
    // 邮箱
    ("email", "email"),
    ("mail", "email"),
    ("emailadresse", "email"),
    ("emailaddress", "email"),
    // 角色
    ("roles", "roles"),
    ("role", "roles"),
    ("rolle", "roles"),
    ("rollen", "roles"),
    // 联系方式
    ("telefon", "telefon"),
    ("telefonnummer", "telefon"),
    ("phone", "telefon"),
    ("strasse", "strasse"),
    ("straße", "strasse"),
    ("street", "strasse"),
    ("ort", "ort"),
    ("stadt", "ort"),
    ("wohnort", "ort"),
    ("city", "ort"),
    ("plz", "plz"),
    ("postleitzahl", "plz"),
    ("zip", "plz"),
];

/// 规范化列名
///
/// # 示例
/// ```
/// use sau_import::importer::label_canonicalizer::canonicalize;
/// assert_eq!(canonicalize("\u{feff}\"Vorname\""), "firstname");
/// assert_eq!(canonicalize("E-Mail"), "email");
/// assert_eq!(canonicalize("Fachsemester (Zahl)"), "fachsemester");
/// ```
pub fn canonicalize(raw_label: &str) -> String {
    let label = raw_label.strip_prefix(BOM).unwrap_or(raw_label);
    let label = unwrap_quotes(label);
    let label = strip_parenthetical_suffix(&label);

    let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
    let lowered = collapsed.to_lowercase();

    let folded: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let key: String = folded.chars().filter(|c| c.is_alphanumeric()).collect();

    resolve_key(key)
}

/// 同义词键查找
pub fn lookup_synonym(key: &str) -> Option<&'static str> {
    SYNONYMS
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
}

/// 两个 label 是否指向同一字段
pub fn same_field(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}

fn unwrap_quotes(label: &str) -> String {
    if label.len() >= 2 && label.starts_with('"') && label.ends_with('"') {
        label[1..label.len() - 1].replace("\"\"", "\"")
    } else {
        label.to_string()
    }
}

fn strip_parenthetical_suffix(label: &str) -> String {
    let trimmed = label.trim_end();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            return trimmed[..open].to_string();
        }
    }
    label.to_string()
}

fn resolve_key(mut key: String) -> String {
    loop {
        if let Some(mapped) = lookup_synonym(&key) {
            return mapped.to_string();
        }
        if key.len() > 2 && key.ends_with("en") {
            key.truncate(key.len() - 2);
        } else if key.len() > 1 && key.ends_with('s') {
            key.truncate(key.len() - 1);
        } else {
            return key;
        }
    }
}
