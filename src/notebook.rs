use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::{fs, path::Path};

/// An nbformat v4 notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(serialize_with = "write_lines", deserialize_with = "read_lines")]
    pub source: String,
    /// `outputs`, `execution_count`, `attachments` and anything else we don't touch.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
    Code,
    Raw,
}

impl Default for Notebook {
    fn default() -> Self {
        let metadata = json!({
            "kernelspec": {
                "display_name": "Python 3",
                "language": "python",
                "name": "python3"
            },
            "language_info": {
                "name": "python"
            }
        });
        Self {
            cells: vec![],
            metadata: match metadata {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            nbformat: 4,
            nbformat_minor: 4,
        }
    }
}

impl Cell {
    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Markdown,
            id: None,
            metadata: Map::new(),
            source: source.into(),
            extra: Map::new(),
        }
    }

    pub fn code(source: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("execution_count".to_string(), Value::Null);
        extra.insert("outputs".to_string(), Value::Array(vec![]));
        Self {
            cell_type: CellType::Code,
            id: None,
            metadata: Map::new(),
            source: source.into(),
            extra,
        }
    }
}

impl Notebook {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read notebook {}", path.display()))?;
        let notebook = serde_json::from_str(&content)
            .with_context(|| format!("invalid notebook {}", path.display()))?;
        Ok(notebook)
    }

    /// Load the template at `path`, or the built-in empty notebook when there is none.
    pub fn template(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Write in nbformat's on-disk style: one-space indentation and a trailing newline.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');

        fs::write(path, buf)
            .with_context(|| format!("failed to write notebook {}", path.display()))?;
        Ok(())
    }

    /// Append a cell, giving it an id when the notebook format requires one.
    pub fn push(&mut self, mut cell: Cell) {
        if self.nbformat_minor >= 5 && cell.id.is_none() {
            let mut n = self.cells.len();
            let id = loop {
                let candidate = format!("cell-{n}");
                if !self.cells.iter().any(|c| c.id.as_deref() == Some(&candidate)) {
                    break candidate;
                }
                n += 1;
            };
            cell.id = Some(id);
        }
        self.cells.push(cell);
    }
}

/// Start a fresh document at `path` from the template, replacing any previous file.
pub fn create_from_template(path: impl AsRef<Path>, template: &Notebook) -> Result<()> {
    template.save(path)
}

/// Append a problem summary and its code to the notebook at `path`.
///
/// The whole file is re-read and re-written on every call.
pub fn append_problem(
    path: impl AsRef<Path>,
    template: &Notebook,
    summary: &str,
    code: &str,
) -> Result<()> {
    let path = path.as_ref();
    let mut notebook = if path.exists() {
        Notebook::load(path)?
    } else {
        template.clone()
    };
    notebook.push(Cell::markdown(summary));
    notebook.push(Cell::code(code));
    notebook.save(path)
}

fn write_lines<S: Serializer>(source: &str, serializer: S) -> Result<S::Ok, S::Error> {
    let lines = source.split_inclusive('\n').collect::<Vec<_>>();
    lines.serialize(serializer)
}

fn read_lines<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Source {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Source::deserialize(deserializer)? {
        Source::Text(text) => text,
        Source::Lines(lines) => lines.concat(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r##"{
 "cells": [
  {
   "cell_type": "markdown",
   "metadata": {},
   "source": ["# LeetCode\n", "Practice notebook"]
  },
  {
   "cell_type": "code",
   "execution_count": 1,
   "metadata": {"collapsed": true},
   "outputs": [{"output_type": "stream", "name": "stdout", "text": ["hi\n"]}],
   "source": "from IPython.display import HTML"
  }
 ],
 "metadata": {"kernelspec": {"name": "python3"}},
 "nbformat": 4,
 "nbformat_minor": 2
}"##;

    #[test]
    fn load_should_accept_string_and_line_sources() {
        let notebook: Notebook = serde_json::from_str(TEMPLATE).unwrap();
        assert_eq!(notebook.cells.len(), 2);
        assert_eq!(notebook.cells[0].source, "# LeetCode\nPractice notebook");
        assert_eq!(notebook.cells[1].source, "from IPython.display import HTML");
        assert_eq!(notebook.cells[1].extra["execution_count"], json!(1));
    }

    #[test]
    fn append_problem_should_preserve_existing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb/leetcode_easy_001-100.ipynb");
        let template: Notebook = serde_json::from_str(TEMPLATE).unwrap();

        create_from_template(&path, &template).unwrap();
        append_problem(&path, &template, "## 1. Two Sum", "class Solution:\n    pass").unwrap();
        append_problem(&path, &template, "## 7. Reverse Integer", "").unwrap();

        let notebook = Notebook::load(&path).unwrap();
        assert_eq!(notebook.cells.len(), 6);
        assert_eq!(notebook.cells[..2], template.cells[..]);
        assert_eq!(notebook.cells[2].cell_type, CellType::Markdown);
        assert_eq!(notebook.cells[2].source, "## 1. Two Sum");
        assert_eq!(notebook.cells[3].cell_type, CellType::Code);
        assert_eq!(notebook.cells[3].source, "class Solution:\n    pass");
        assert_eq!(notebook.cells[3].extra["outputs"], json!([]));
        assert_eq!(notebook.cells[4].source, "## 7. Reverse Integer");
        assert_eq!(notebook.metadata, template.metadata);
    }

    #[test]
    fn append_problem_should_create_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.ipynb");

        append_problem(&path, &Notebook::default(), "summary", "code").unwrap();

        let notebook = Notebook::load(&path).unwrap();
        assert_eq!(notebook.cells.len(), 2);
        assert_eq!(notebook.nbformat, 4);
    }

    #[test]
    fn create_from_template_should_replace_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb.ipynb");
        let template = Notebook::default();

        append_problem(&path, &template, "old", "old").unwrap();
        create_from_template(&path, &template).unwrap();

        assert!(Notebook::load(&path).unwrap().cells.is_empty());
    }

    #[test]
    fn save_should_write_source_as_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb.ipynb");
        let mut notebook = Notebook::default();
        notebook.push(Cell::markdown("a\nb\n"));
        notebook.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["cells"][0]["source"], json!(["a\n", "b\n"]));
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn push_should_assign_ids_for_recent_formats() {
        let mut notebook = Notebook {
            nbformat_minor: 5,
            ..Notebook::default()
        };
        let mut first = Cell::markdown("a");
        first.id = Some("cell-1".to_string());
        notebook.push(first);
        notebook.push(Cell::code("b"));

        assert_eq!(notebook.cells[1].id.as_deref(), Some("cell-2"));

        let mut old = Notebook::default();
        old.push(Cell::code("c"));
        assert_eq!(old.cells[0].id, None);
    }
}
