use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 难度范围
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

/// 单道练习题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "deserialize_difficulty")]
    pub difficulty: u8,
    #[serde(default, deserialize_with = "deserialize_keywords")]
    pub keywords: Vec<String>,
    /// HTML + LaTeX 原文，渲染时原样嵌入
    pub content: String,
}

impl Exercise {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        difficulty: u8,
        keywords: Vec<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            difficulty: clamp_difficulty(i64::from(difficulty)),
            keywords,
            content: content.into(),
        }
    }

    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }
}

/// 还没有 id 的练习（手动录入或图片识别的结果）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDraft {
    pub title: String,
    pub difficulty: u8,
    #[serde(default, deserialize_with = "deserialize_keywords")]
    pub keywords: Vec<String>,
    pub content: String,
}

impl ExerciseDraft {
    pub fn into_exercise(self, id: impl Into<String>) -> Exercise {
        Exercise::new(id, self.title, self.difficulty, self.keywords, self.content)
    }
}

/// 练习文档（有序的练习集合）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub class_name: String,
    pub school_year: String,
    /// 创建日期
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        class_name: impl Into<String>,
        school_year: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            class_name: class_name.into(),
            school_year: school_year.into(),
            date,
            last_modified: None,
            last_saved: None,
            exercises: Vec::new(),
        }
    }

    /// 未保存：从未保存过，或最后修改时间晚于最后保存时间
    pub fn is_dirty(&self) -> bool {
        match (self.last_modified, self.last_saved) {
            (_, None) => true,
            (Some(modified), Some(saved)) => modified > saved,
            (None, Some(_)) => false,
        }
    }
}

/// 把任意整数收敛到 1..=5
pub fn clamp_difficulty(value: i64) -> u8 {
    value.clamp(i64::from(MIN_DIFFICULTY), i64::from(MAX_DIFFICULTY)) as u8
}

/// 把逗号分隔的关键词输入拆成列表
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

// 导入文件和 LLM 返回的难度可能是任意整数，统一收敛
fn deserialize_difficulty<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_difficulty(raw))
}

// 关键词既可以是列表，也可以是表单里的逗号分隔文本
fn deserialize_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawKeywords {
        List(Vec<String>),
        Text(String),
    }

    Ok(match RawKeywords::deserialize(deserializer)? {
        RawKeywords::List(items) => items
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        RawKeywords::Text(text) => parse_keywords(&text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_doc() -> Document {
        Document::new(
            "doc_1",
            "Algebra",
            "Grade 11",
            "2024-2025",
            Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn never_saved_document_is_dirty() {
        let doc = sample_doc();
        assert!(doc.is_dirty());
    }

    #[test]
    fn dirty_when_modified_after_save() {
        let mut doc = sample_doc();
        let saved = Utc.with_ymd_and_hms(2024, 9, 3, 8, 0, 0).unwrap();
        doc.last_saved = Some(saved);
        doc.last_modified = Some(saved);
        assert!(!doc.is_dirty());

        doc.last_modified = Some(saved + chrono::Duration::seconds(1));
        assert!(doc.is_dirty());
    }

    #[test]
    fn deserializes_camel_case_and_clamps_difficulty() {
        let json = r#"{
            "id": "doc_9",
            "title": "Geometry",
            "className": "Grade 10",
            "schoolYear": "2023-2024",
            "date": "2024-01-15T10:00:00Z",
            "exercises": [
                {"id": "ex_1", "title": "Angles", "difficulty": 9, "keywords": [], "content": "<p>x</p>"},
                {"id": "ex_2", "title": "Lines", "difficulty": 0, "content": "<p>y</p>"}
            ]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.class_name, "Grade 10");
        assert_eq!(doc.exercises[0].difficulty, 5);
        assert_eq!(doc.exercises[1].difficulty, 1);
        assert!(doc.exercises[1].keywords.is_empty());
        assert!(doc.last_saved.is_none());
    }

    #[test]
    fn keyword_input_is_split_and_trimmed() {
        assert_eq!(
            parse_keywords(" algebra, , equations ,fractions"),
            vec!["algebra", "equations", "fractions"]
        );
        assert!(parse_keywords("  ").is_empty());
    }

    #[test]
    fn comma_separated_keywords_are_accepted_on_import() {
        let exercise: Exercise = serde_json::from_str(
            r#"{"id": "ex_1", "title": "Angles", "difficulty": 2, "keywords": "geometry, angles,", "content": "<p>x</p>"}"#,
        )
        .unwrap();
        assert_eq!(exercise.keywords, vec!["geometry", "angles"]);

        let draft: ExerciseDraft = serde_json::from_str(
            r#"{"title": "Lines", "difficulty": 1, "keywords": [" lines ", ""], "content": "<p>y</p>"}"#,
        )
        .unwrap();
        assert_eq!(draft.keywords, vec!["lines"]);
    }
}
