//! Request-scoped storage for the documents users attach to a chat turn.
//!
//! A registry lives for a single request: the boundary registers the attached
//! file through a [`FileScope`], hands the registry to the agent by reference and
//! the scope removes the registration when it is dropped, whatever way the
//! request ends.
use chrono::Utc;
use std::collections::HashMap;

const ID_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// A document attached by the user, still base64 encoded
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub name: String,
    pub base64: String,
}

impl StoredFile {
    pub fn new<N: Into<String>, B: Into<String>>(name: N, base64: B) -> Self {
        Self {
            name: name.into(),
            base64: base64.into(),
        }
    }

    /// Size shown to the model, in KB of encoded payload
    pub fn size_kb(&self) -> u64 {
        (self.base64.len() as f64 / 1024.0).round() as u64
    }
}

/// Generate an identifier from the current time plus a random suffix
pub fn generate_file_id() -> String {
    format!(
        "file_{}_{}",
        Utc::now().timestamp_millis(),
        nanoid::nanoid!(9, &ID_ALPHABET)
    )
}

#[derive(Debug, Default)]
pub struct FileRegistry {
    files: HashMap<String, StoredFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<S: Into<String>>(&mut self, id: S, file: StoredFile) {
        self.files.insert(id.into(), file);
    }

    pub fn get(&self, id: &str) -> Option<&StoredFile> {
        self.files.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<StoredFile> {
        self.files.remove(id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The registered file when exactly one is registered.
    ///
    /// With several registrations there is no way to tell which one the model
    /// means, so nothing is returned.
    pub fn sole(&self) -> Option<&StoredFile> {
        if self.files.len() == 1 {
            self.files.values().next()
        } else {
            None
        }
    }

    /// Register `file` (if any) under a fresh id for the lifetime of the returned scope
    pub fn scope(&mut self, file: Option<StoredFile>) -> FileScope<'_> {
        let id = file.map(|file| {
            let id = generate_file_id();
            tracing::debug!(file_id = %id, name = %file.name, bytes = file.base64.len(), "registered file");
            self.put(id.clone(), file);
            id
        });
        FileScope { registry: self, id }
    }
}

/// Guard over a registration; dropping it removes the file from the registry
pub struct FileScope<'a> {
    registry: &'a mut FileRegistry,
    id: Option<String>,
}

impl FileScope<'_> {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn files(&self) -> &FileRegistry {
        self.registry
    }
}

impl Drop for FileScope<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.registry.remove(&id);
            tracing::debug!(file_id = %id, "removed file registration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let mut registry = FileRegistry::new();
        registry.put("X", StoredFile::new("irpf.pdf", "JVBERi0="));

        assert_eq!(registry.get("X").unwrap().base64, "JVBERi0=");
        assert_eq!(registry.get("X").unwrap().name, "irpf.pdf");

        let removed = registry.remove("X");
        assert!(removed.is_some());
        assert!(registry.get("X").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sole_requires_exactly_one() {
        let mut registry = FileRegistry::new();
        assert!(registry.sole().is_none());

        registry.put("a", StoredFile::new("a.pdf", "AAAA"));
        assert_eq!(registry.sole().unwrap().name, "a.pdf");

        registry.put("b", StoredFile::new("b.pdf", "BBBB"));
        assert!(registry.sole().is_none());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let first = generate_file_id();
        let second = generate_file_id();

        assert!(first.starts_with("file_"));
        assert_eq!(first.rsplit('_').next().unwrap().len(), 9);
        assert_ne!(first, second);
    }

    #[test]
    fn test_scope_removes_on_drop() {
        let mut registry = FileRegistry::new();
        {
            let scope = registry.scope(Some(StoredFile::new("irpf.pdf", "JVBERi0=")));
            let id = scope.id().unwrap().to_string();
            assert_eq!(scope.files().len(), 1);
            assert!(scope.files().get(&id).is_some());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_scope_without_file() {
        let mut registry = FileRegistry::new();
        let scope = registry.scope(None);
        assert!(scope.id().is_none());
        assert!(scope.files().is_empty());
    }

    #[test]
    fn test_size_kb_rounds() {
        assert_eq!(StoredFile::new("a.pdf", "A".repeat(1536)).size_kb(), 2);
        assert_eq!(StoredFile::new("a.pdf", "A".repeat(500)).size_kb(), 0);
    }
}
