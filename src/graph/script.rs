//! Cypher query files: loading and statement splitting.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Directory of externally authored `.cypher` files.
///
/// Files are read on every call so edits take effect without a restart.
#[derive(Debug, Clone)]
pub struct QueryLibrary {
    dir: PathBuf,
}

impl QueryLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Read a single-statement query file.
    ///
    /// A trailing `;` is removed because the driver sends one statement per
    /// request.
    pub async fn load(&self, file: &str) -> Result<String> {
        let text = self.read(file).await?;
        let query = text.trim().trim_end_matches(';').trim_end().to_string();
        if query.is_empty() {
            return Err(Error::QueryFile {
                path: self.path_of(file),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "query file is empty"),
            });
        }
        Ok(query)
    }

    /// Read a script and split it into its statements
    pub async fn load_script(&self, file: &str) -> Result<Vec<String>> {
        let text = self.read(file).await?;
        Ok(split_statements(&text))
    }

    async fn read(&self, file: &str) -> Result<String> {
        let path = self.path_of(file);
        debug!("Loading query file {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| Error::QueryFile { path, source })
    }
}

/// Split a Cypher script on top-level `;`.
///
/// Semicolons inside string literals, backtick identifiers, `//` line comments
/// and `/* */` block comments do not terminate a statement. Comment-only and
/// empty statements are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            current.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // skip to end of line
                for next in chars.by_ref() {
                    if next == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                current.push(' ');
            }
            ';' => push_statement(&mut statements, &mut current),
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &mut current);

    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}
