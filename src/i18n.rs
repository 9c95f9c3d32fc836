//! 界面文案翻译
//!
//! 翻译表在编译期通过 `phf` 生成，`Translator` 作为普通值显式传递，不存在全局状态。

use std::fmt;
use std::str::FromStr;

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 界面语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    /// BCP 47 语言标签，用于 `<html lang>`
    pub fn tag(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Language::En),
            "fr" | "fr-fr" => Ok(Language::Fr),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

static EN: phf::Map<&'static str, &'static str> = phf_map! {
    "toasts.popupError" => "Could not open print window. Check your browser's popup blocker.",
    "toasts.importSuccess" => "Documents imported successfully.",
    "toasts.importError" => "Failed to import documents. Please check the file format.",
    "toasts.documentSaved" => "\"{title}\" has been saved.",
    "toasts.exercisesAdded" => "{count} exercise(s) added to the document.",
    "toasts.exportSuccess" => "\"{title}\" exported ({pages} page(s)).",
    "toasts.exportSuccessNoPages" => "\"{title}\" exported.",
    "modals.export.pageBreak" => "Page {page}",
    "modals.imageUpload.error" => "An error occurred during analysis.",
};

static FR: phf::Map<&'static str, &'static str> = phf_map! {
    "toasts.popupError" => "Impossible d'ouvrir la fenêtre d'impression. Vérifiez le bloqueur de pop-ups de votre navigateur.",
    "toasts.importSuccess" => "Documents importés avec succès.",
    "toasts.importError" => "Échec de l'importation. Veuillez vérifier le format du fichier.",
    "toasts.documentSaved" => "« {title} » a été enregistré.",
    "toasts.exercisesAdded" => "{count} exercice(s) ajouté(s) au document.",
    "toasts.exportSuccess" => "« {title} » exporté ({pages} page(s)).",
    "toasts.exportSuccessNoPages" => "« {title} » exporté.",
    "modals.export.pageBreak" => "Page {page}",
    "modals.imageUpload.error" => "Une erreur est survenue pendant l'analyse.",
};

/// 翻译器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// 查找文案，当前语言缺失时回退到英文，仍然缺失则原样返回 key
    pub fn t(&self, key: &str) -> String {
        self.lookup(key).to_string()
    }

    /// 查找文案并替换 `{name}` 占位符
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut text = self.lookup(key).to_string();
        for (name, value) in params {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    fn lookup<'a>(&self, key: &'a str) -> &'a str {
        let table = match self.language {
            Language::En => &EN,
            Language::Fr => &FR,
        };
        table
            .get(key)
            .or_else(|| EN.get(key))
            .copied()
            .unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_tags() {
        assert_eq!("fr".parse::<Language>().unwrap(), Language::Fr);
        assert_eq!("EN-us".parse::<Language>().unwrap(), Language::En);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn interpolates_placeholders() {
        let t = Translator::new(Language::En);
        assert_eq!(
            t.t_with("toasts.documentSaved", &[("title", "Algebra")]),
            "\"Algebra\" has been saved."
        );
        assert_eq!(t.t_with("modals.export.pageBreak", &[("page", "3")]), "Page 3");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let t = Translator::new(Language::Fr);
        assert_eq!(t.t("missing.key"), "missing.key");
    }
}
