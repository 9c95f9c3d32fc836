use serde::{Deserialize, Serialize};

use crate::i18n::{Language, Translator};

/// 界面主题（渲染不使用，只随设置一起保存）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiTheme {
    Light,
    Dark,
    #[default]
    System,
}

/// 应用设置，渲染时只读
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    #[serde(default)]
    pub theme: UiTheme,
}

impl AppSettings {
    pub fn translator(&self) -> Translator {
        Translator::new(self.language)
    }

    /// 页眉上显示的名字：教师名为空时用班级名
    pub fn header_name<'a>(&'a self, class_name: &'a str) -> &'a str {
        match self.teacher_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => class_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_name_falls_back_to_class() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.header_name("Grade 11"), "Grade 11");

        settings.teacher_name = Some("   ".into());
        assert_eq!(settings.header_name("Grade 11"), "Grade 11");

        settings.teacher_name = Some("M. Dupont".into());
        assert_eq!(settings.header_name("Grade 11"), "M. Dupont");
    }
}
