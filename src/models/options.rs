//! 导出选项
//!
//! 用封闭的枚举代替任意键值对，非法值在解析阶段就被拒绝。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 栏数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Columns {
    #[default]
    One,
    Two,
}

impl Columns {
    pub fn count(self) -> u8 {
        match self {
            Columns::One => 1,
            Columns::Two => 2,
        }
    }
}

impl TryFrom<u8> for Columns {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Columns::One),
            2 => Ok(Columns::Two),
            other => Err(format!("columns must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Columns> for u8 {
    fn from(value: Columns) -> Self {
        value.count()
    }
}

impl FromStr for Columns {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s.trim().parse().map_err(|_| format!("invalid columns: {}", s))?;
        Columns::try_from(n)
    }
}

/// 字号（pt）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn points(self) -> u8 {
        match self {
            FontSize::Small => 10,
            FontSize::Medium => 12,
            FontSize::Large => 14,
        }
    }
}

impl TryFrom<u8> for FontSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(FontSize::Small),
            12 => Ok(FontSize::Medium),
            14 => Ok(FontSize::Large),
            other => Err(format!("font size must be 10, 12 or 14, got {}", other)),
        }
    }
}

impl From<FontSize> for u8 {
    fn from(value: FontSize) -> Self {
        value.points()
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s.trim().parse().map_err(|_| format!("invalid font size: {}", s))?;
        FontSize::try_from(n)
    }
}

/// 打印主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportTheme {
    #[default]
    Default,
    InkSaver,
    HighContrast,
}

impl ExportTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportTheme::Default => "default",
            ExportTheme::InkSaver => "ink-saver",
            ExportTheme::HighContrast => "high-contrast",
        }
    }
}

impl fmt::Display for ExportTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" => Ok(ExportTheme::Default),
            "ink-saver" => Ok(ExportTheme::InkSaver),
            "high-contrast" => Ok(ExportTheme::HighContrast),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// 一次导出会话的选项，不随文档持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub columns: Columns,
    pub font_size: FontSize,
    pub theme: ExportTheme,
    /// 保留字段，目前渲染不区分答案
    pub include_solutions: bool,
    pub show_difficulty: bool,
    pub show_keywords: bool,
    pub show_titles: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            columns: Columns::One,
            font_size: FontSize::Medium,
            theme: ExportTheme::Default,
            include_solutions: false,
            show_difficulty: true,
            show_keywords: true,
            show_titles: true,
        }
    }
}
