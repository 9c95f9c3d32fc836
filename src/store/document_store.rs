//! 文档存储
//!
//! 持有全部文档，负责增删改、复制、导入和保存。
//! 每次修改都会刷新 `last_modified`，只有保存操作会刷新 `last_saved`。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::ImportError;
use crate::models::{
    load_documents_file, parse_import, save_documents_file, Document, Exercise, ExerciseDraft,
};

const COPY_SUFFIX: &str = " (copy)";

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 生成唯一 id：`<前缀>_<毫秒时间戳>_<序号>`
pub fn generate_id(prefix: &str) -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), seq)
}

/// 文档元信息的局部修改
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub class_name: Option<String>,
    pub school_year: Option<String>,
}

/// 文档存储
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    documents: Vec<Document>,
}

impl DocumentStore {
    /// 内存中的存储，`flush` 时写入 `path`
    pub fn new(path: impl Into<PathBuf>, documents: Vec<Document>) -> Self {
        Self {
            path: path.into(),
            documents,
        }
    }

    /// 从文件加载；文件不存在时得到空存储
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let documents = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            load_documents_file(&path).await?
        } else {
            info!("📁 文档文件 {} 不存在，使用空存储", path.display());
            Vec::new()
        };
        Ok(Self::new(path, documents))
    }

    /// 把全部文档写回文件
    pub async fn flush(&self) -> Result<()> {
        save_documents_file(&self.path, &self.documents).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    /// 新建空文档，返回新 id
    pub fn add_document(
        &mut self,
        title: impl Into<String>,
        class_name: impl Into<String>,
        school_year: impl Into<String>,
    ) -> String {
        let now = Utc::now();
        let mut doc = Document::new(generate_id("doc"), title, class_name, school_year, now);
        doc.last_modified = Some(now);
        let id = doc.id.clone();
        debug!("新建文档 {} ({})", doc.title, id);
        self.documents.push(doc);
        id
    }

    /// 修改文档元信息；文档不存在时返回 false
    pub fn update_document(&mut self, id: &str, patch: DocumentPatch) -> bool {
        let Some(doc) = self.get_mut(id) else {
            return false;
        };
        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(class_name) = patch.class_name {
            doc.class_name = class_name;
        }
        if let Some(school_year) = patch.school_year {
            doc.school_year = school_year;
        }
        touch(doc);
        true
    }

    /// 删除文档，返回被删除的文档
    pub fn delete_document(&mut self, id: &str) -> Option<Document> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        let removed = self.documents.remove(index);
        debug!("删除文档 {} ({})", removed.title, removed.id);
        Some(removed)
    }

    /// 复制文档，副本紧跟在原文档之后，返回副本 id
    ///
    /// 副本和其中的练习都换成新 id，标题加 " (copy)"，且视为未保存。
    pub fn duplicate_document(&mut self, id: &str) -> Option<String> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        let now = Utc::now();

        let mut copy = self.documents[index].clone();
        copy.id = generate_id("doc");
        copy.title.push_str(COPY_SUFFIX);
        copy.date = now;
        copy.last_modified = Some(now);
        copy.last_saved = None;
        for exercise in &mut copy.exercises {
            exercise.id = generate_id("ex");
        }

        let new_id = copy.id.clone();
        self.documents.insert(index + 1, copy);
        Some(new_id)
    }

    /// 在文档末尾追加练习，返回练习 id
    pub fn add_exercise(&mut self, doc_id: &str, draft: ExerciseDraft) -> Option<String> {
        let doc = self.get_mut(doc_id)?;
        let exercise = draft.into_exercise(generate_id("ex"));
        let id = exercise.id.clone();
        doc.exercises.push(exercise);
        touch(doc);
        Some(id)
    }

    /// 用新内容替换练习，id 不变
    pub fn update_exercise(&mut self, doc_id: &str, exercise_id: &str, draft: ExerciseDraft) -> bool {
        let Some(doc) = self.get_mut(doc_id) else {
            return false;
        };
        let Some(slot) = doc.exercises.iter_mut().find(|e| e.id == exercise_id) else {
            return false;
        };
        *slot = draft.into_exercise(exercise_id);
        touch(doc);
        true
    }

    pub fn delete_exercise(&mut self, doc_id: &str, exercise_id: &str) -> Option<Exercise> {
        let doc = self.get_mut(doc_id)?;
        let index = doc.exercises.iter().position(|e| e.id == exercise_id)?;
        let removed = doc.exercises.remove(index);
        touch(doc);
        Some(removed)
    }

    /// 把 `from` 位置的练习移动到 `to`；下标越界时不做任何修改
    pub fn reorder_exercises(&mut self, doc_id: &str, from: usize, to: usize) -> bool {
        let Some(doc) = self.get_mut(doc_id) else {
            return false;
        };
        let len = doc.exercises.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let exercise = doc.exercises.remove(from);
            doc.exercises.insert(to, exercise);
        }
        touch(doc);
        true
    }

    /// 合并导入的文档：id 相同则替换，否则追加。返回导入数量
    pub fn import_documents(&mut self, imported: Vec<Document>) -> usize {
        let count = imported.len();
        for doc in imported {
            match self.documents.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => *existing = doc,
                None => self.documents.push(doc),
            }
        }
        count
    }

    /// 解析并导入 JSON 文本；解析失败时存储保持不变
    pub fn import_from_text(&mut self, text: &str, source_name: &str) -> Result<usize, ImportError> {
        let imported = parse_import(text, source_name)?;
        Ok(self.import_documents(imported))
    }

    /// 标记文档已保存
    pub fn save_document(&mut self, id: &str) -> Option<DateTime<Utc>> {
        let doc = self.get_mut(id)?;
        let now = Utc::now();
        // 保存时间不早于修改时间
        let saved = doc.last_modified.map_or(now, |m| m.max(now));
        doc.last_saved = Some(saved);
        Some(saved)
    }
}

fn touch(doc: &mut Document) {
    doc.last_modified = Some(Utc::now());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> ExerciseDraft {
        ExerciseDraft {
            title: title.to_string(),
            difficulty: 3,
            keywords: vec!["algebra".to_string()],
            content: format!("<p>{}</p>", title),
        }
    }

    fn store_with_doc() -> (DocumentStore, String) {
        let mut store = DocumentStore::new("documents.json", Vec::new());
        let id = store.add_document("Algebra", "Grade 11", "2024-2025");
        (store, id)
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_id("ex");
        let b = generate_id("ex");
        assert_ne!(a, b);
        assert!(a.starts_with("ex_"));
    }

    #[test]
    fn new_document_is_unsaved() {
        let (store, id) = store_with_doc();
        let doc = store.get(&id).unwrap();
        assert!(doc.is_dirty());
        assert!(doc.last_modified.is_some());
        assert!(doc.exercises.is_empty());
    }

    #[test]
    fn update_patches_only_given_fields() {
        let (mut store, id) = store_with_doc();
        assert!(store.update_document(
            &id,
            DocumentPatch {
                title: Some("Algebra II".to_string()),
                ..Default::default()
            }
        ));
        let doc = store.get(&id).unwrap();
        assert_eq!(doc.title, "Algebra II");
        assert_eq!(doc.class_name, "Grade 11");
        assert!(!store.update_document("missing", DocumentPatch::default()));
    }

    #[test]
    fn save_then_modify_marks_dirty_again() {
        let (mut store, id) = store_with_doc();
        store.save_document(&id).unwrap();
        assert!(!store.get(&id).unwrap().is_dirty());

        std::thread::sleep(std::time::Duration::from_millis(2));
        store.add_exercise(&id, draft("Fractions")).unwrap();
        assert!(store.get(&id).unwrap().is_dirty());
    }

    #[test]
    fn duplicate_gets_new_ids_and_copy_suffix() {
        let (mut store, id) = store_with_doc();
        store.add_exercise(&id, draft("Fractions")).unwrap();
        store.save_document(&id).unwrap();

        let copy_id = store.duplicate_document(&id).unwrap();
        assert_ne!(copy_id, id);
        assert_eq!(store.documents()[1].id, copy_id);

        let original = store.get(&id).unwrap().clone();
        let copy = store.get(&copy_id).unwrap();
        assert_eq!(copy.title, "Algebra (copy)");
        assert!(copy.last_saved.is_none());
        assert_eq!(copy.exercises.len(), 1);
        assert_ne!(copy.exercises[0].id, original.exercises[0].id);
        assert_eq!(copy.exercises[0].content, original.exercises[0].content);
    }

    #[test]
    fn exercise_crud_keeps_order() {
        let (mut store, id) = store_with_doc();
        let a = store.add_exercise(&id, draft("A")).unwrap();
        let b = store.add_exercise(&id, draft("B")).unwrap();
        let c = store.add_exercise(&id, draft("C")).unwrap();

        assert!(store.reorder_exercises(&id, 2, 0));
        let order: Vec<_> = store.get(&id).unwrap().exercises.iter().map(|e| e.id.clone()).collect();
        assert_eq!(order, vec![c.clone(), a.clone(), b.clone()]);

        assert!(!store.reorder_exercises(&id, 5, 0));

        assert!(store.update_exercise(&id, &a, draft("A2")));
        let updated = store.get(&id).unwrap().exercises.iter().find(|e| e.id == a).unwrap().clone();
        assert_eq!(updated.title, "A2");

        let removed = store.delete_exercise(&id, &b).unwrap();
        assert_eq!(removed.title, "B");
        assert_eq!(store.get(&id).unwrap().exercises.len(), 2);
    }

    #[test]
    fn import_replaces_by_id_and_appends_new() {
        let (mut store, id) = store_with_doc();
        let json = format!(
            r#"[
                {{"id": "{}", "title": "Replaced", "className": "G", "schoolYear": "Y", "date": "2024-01-01T00:00:00Z"}},
                {{"id": "doc_new", "title": "New", "className": "G", "schoolYear": "Y", "date": "2024-01-01T00:00:00Z"}}
            ]"#,
            id
        );
        assert_eq!(store.import_from_text(&json, "backup.json").unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&id).unwrap().title, "Replaced");
        assert!(store.get("doc_new").is_some());
    }

    #[test]
    fn malformed_import_leaves_store_untouched() {
        let (mut store, id) = store_with_doc();
        let before = store.documents().to_vec();
        assert!(store.import_from_text("42", "bad.json").is_err());
        assert!(store.import_from_text("{not json", "bad.json").is_err());
        assert_eq!(store.documents(), before.as_slice());
        assert!(store.get(&id).is_some());
    }

    #[tokio::test]
    async fn open_missing_file_then_flush_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.json");

        let mut store = DocumentStore::open(&path).await.unwrap();
        assert!(store.is_empty());

        let id = store.add_document("Geometry", "Grade 10", "2024-2025");
        store.add_exercise(&id, draft("Angles")).unwrap();
        store.flush().await.unwrap();

        let reloaded = DocumentStore::open(&path).await.unwrap();
        assert_eq!(reloaded.documents(), store.documents());
    }
}
