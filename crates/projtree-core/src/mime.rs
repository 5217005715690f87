//! MIME lookup and file-kind classification.

use std::collections::HashMap;
use std::path::Path;

use compact_str::CompactString;

use crate::node::FileType;

/// MIME type names with a dedicated [`FileType`].
pub mod mime_types {
    pub const C_HEADER: &str = "text/x-chdr";
    pub const CPP_HEADER: &str = "text/x-c++hdr";
    pub const C_SOURCE: &str = "text/x-csrc";
    pub const CPP_SOURCE: &str = "text/x-c++src";
    pub const FORM: &str = "application/x-designer";
    pub const RESOURCE: &str = "application/vnd.qt.xml.resource";
    pub const SCXML: &str = "application/scxml+xml";
    pub const QML: &str = "text/x-qml";
}

/// Result of a MIME lookup. Invalid when the path could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeType {
    name: Option<CompactString>,
}

impl MimeType {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.name.is_some()
    }

    /// The MIME name, empty for an invalid type.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Resolves the MIME type of a file.
pub trait MimeDatabase: Send + Sync {
    fn mime_type_for_file(&self, path: &Path) -> MimeType;
}

/// Suffix-based MIME database covering common project files.
#[derive(Debug, Clone)]
pub struct ExtensionMimeDatabase {
    by_suffix: HashMap<CompactString, CompactString>,
}

const BUILTIN_SUFFIXES: &[(&str, &str)] = &[
    ("h", mime_types::C_HEADER),
    ("hh", mime_types::CPP_HEADER),
    ("hpp", mime_types::CPP_HEADER),
    ("hxx", mime_types::CPP_HEADER),
    ("h++", mime_types::CPP_HEADER),
    ("c", mime_types::C_SOURCE),
    ("cc", mime_types::CPP_SOURCE),
    ("cp", mime_types::CPP_SOURCE),
    ("cpp", mime_types::CPP_SOURCE),
    ("cxx", mime_types::CPP_SOURCE),
    ("c++", mime_types::CPP_SOURCE),
    ("ui", mime_types::FORM),
    ("qrc", mime_types::RESOURCE),
    ("scxml", mime_types::SCXML),
    ("qml", mime_types::QML),
    ("pro", "application/vnd.qt.qmakeprofile"),
    ("pri", "application/vnd.qt.qmakeproincludefile"),
    ("cmake", "text/x-cmake"),
    ("rs", "text/rust"),
    ("py", "text/x-python"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("md", "text/markdown"),
    ("txt", "text/plain"),
    ("toml", "application/toml"),
];

impl Default for ExtensionMimeDatabase {
    fn default() -> Self {
        let by_suffix = BUILTIN_SUFFIXES
            .iter()
            .map(|(suffix, mime)| (CompactString::new(suffix), CompactString::new(mime)))
            .collect();
        Self { by_suffix }
    }
}

impl ExtensionMimeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or override the MIME type of a suffix (without the dot).
    pub fn with_mapping(
        mut self,
        suffix: impl Into<CompactString>,
        mime: impl Into<CompactString>,
    ) -> Self {
        let suffix: CompactString = suffix.into();
        self.by_suffix
            .insert(CompactString::from(suffix.to_lowercase()), mime.into());
        self
    }
}

impl MimeDatabase for ExtensionMimeDatabase {
    fn mime_type_for_file(&self, path: &Path) -> MimeType {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .and_then(|ext| self.by_suffix.get(ext.as_str()))
            .map(|mime| MimeType::new(mime.clone()))
            .unwrap_or_default()
    }
}

impl FileType {
    /// Map a MIME type onto a file kind.
    ///
    /// Recognized names get their kind, any other valid type is a source
    /// file, an invalid type is unknown.
    pub fn for_mime_type(mime_type: &MimeType) -> Self {
        if !mime_type.is_valid() {
            return Self::Unknown;
        }
        match mime_type.name() {
            mime_types::C_HEADER | mime_types::CPP_HEADER => Self::Header,
            mime_types::FORM => Self::Form,
            mime_types::RESOURCE => Self::Resource,
            mime_types::SCXML => Self::StateChart,
            mime_types::QML => Self::QML,
            _ => Self::Source,
        }
    }

    /// Classify a path through `database`.
    pub fn for_file_name(path: &Path, database: &dyn MimeDatabase) -> Self {
        Self::for_mime_type(&database.mime_type_for_file(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_validity() {
        assert!(!MimeType::invalid().is_valid());
        assert_eq!(MimeType::invalid().name(), "");
        assert!(MimeType::new("text/plain").is_valid());
    }

    #[test]
    fn test_for_mime_type() {
        assert_eq!(FileType::for_mime_type(&MimeType::new(mime_types::CPP_HEADER)), FileType::Header);
        assert_eq!(FileType::for_mime_type(&MimeType::new(mime_types::FORM)), FileType::Form);
        assert_eq!(FileType::for_mime_type(&MimeType::new(mime_types::SCXML)), FileType::StateChart);
        assert_eq!(FileType::for_mime_type(&MimeType::new("text/x-python")), FileType::Source);
        assert_eq!(FileType::for_mime_type(&MimeType::invalid()), FileType::Unknown);
    }

    #[test]
    fn test_extension_database_is_case_insensitive() {
        let database = ExtensionMimeDatabase::new();
        assert_eq!(
            database.mime_type_for_file(Path::new("/p/MAIN.CPP")).name(),
            mime_types::CPP_SOURCE
        );
    }

    #[test]
    fn test_with_mapping_overrides() {
        let database = ExtensionMimeDatabase::new().with_mapping("INL", mime_types::CPP_HEADER);
        assert_eq!(
            FileType::for_file_name(Path::new("/p/vec.inl"), &database),
            FileType::Header
        );
    }
}
