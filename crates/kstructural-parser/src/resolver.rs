//! Import and include resolution.
//!
//! A [`ParseSession`] lives for one top-level parse. It fixes the base
//! directory every referenced file must live under, tracks the files whose
//! parse is in progress to detect import cycles, and reads referenced files.
//!
//! References are resolved relative to the directory of the file containing
//! them and normalized lexically: `..` and `.` are folded without consulting
//! the file system, so no file outside the base directory is ever touched,
//! not even to resolve a symbolic link.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use log::{debug, info, trace};

use kstructural_core::{
    annotation::{ImportEdge, ImportLink, Include, Meta, Parse},
    block::{Block, Import},
    inline::Text,
    span::Position,
};

use crate::{
    driver,
    error::{Diagnostic, DriverError, ErrorCode},
};

/// What a reference is used for; selects the wording of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Import,
    Include,
}

impl Access {
    fn verb(&self) -> &'static str {
        match self {
            Access::Import => "import",
            Access::Include => "include",
        }
    }

    fn refusal(&self) -> &'static str {
        match self {
            Access::Import => "Refusing to import file outside of the base directory.",
            Access::Include => "Refusing to include a file outside of the base directory.",
        }
    }
}

/// Per-parse state for resolving file references.
#[derive(Debug)]
pub struct ParseSession {
    base: PathBuf,
    in_progress: Vec<PathBuf>,
}

impl ParseSession {
    /// Create a session rooted at `base`. Relative bases are taken relative
    /// to the current directory.
    pub fn new(base: impl AsRef<Path>) -> io::Result<Self> {
        let base = normalize(&std::path::absolute(base.as_ref())?);
        debug!(base = base.display().to_string(); "Created parse session");
        Ok(Self {
            base,
            in_progress: Vec::new(),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve `reference`, found in `from` (or in no file), to an absolute
    /// path inside the base directory.
    pub(crate) fn resolve(
        &self,
        from: Option<&Path>,
        reference: &str,
        position: &Position,
        access: Access,
    ) -> Result<PathBuf, Diagnostic> {
        let directory = from
            .and_then(Path::parent)
            .map(|parent| self.base.join(parent))
            .unwrap_or_else(|| self.base.clone());
        let resolved = normalize(&directory.join(reference));
        let label = format!("{} refers to {reference:?}", access.verb());
        self.check_inside(&resolved, position, label, access)?;

        trace!(reference = reference, resolved = resolved.display().to_string(); "Resolved reference");
        Ok(resolved)
    }

    /// Admit the top-level input file, which must also live under the base
    /// directory. Returns its normalized absolute path.
    pub(crate) fn admit(&self, path: &Path) -> Result<PathBuf, Diagnostic> {
        let resolved = normalize(&self.base.join(path));
        self.check_inside(&resolved, &Position::unknown(), "input file", Access::Import)?;
        Ok(resolved)
    }

    fn check_inside(
        &self,
        resolved: &Path,
        position: &Position,
        label: impl Into<String>,
        access: Access,
    ) -> Result<(), Diagnostic> {
        if resolved.starts_with(&self.base) {
            return Ok(());
        }
        info!(
            base = self.base.display().to_string(),
            file = resolved.display().to_string();
            "Rejected reference outside base directory"
        );
        Err(Diagnostic::error(access.refusal())
            .with_code(ErrorCode::E106)
            .with_label(position.clone(), label)
            .with_help(format!(
                "Base: {}\nFile: {}",
                self.base.display(),
                resolved.display()
            )))
    }

    /// Mark `path` as being parsed. Fails if it already is, which means the
    /// import graph has a cycle.
    pub(crate) fn enter(&mut self, path: &Path, position: &Position) -> Result<(), Diagnostic> {
        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let chain = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(&path.to_path_buf()))
                .map(|p| format!("  {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(Diagnostic::error("Cyclic import detected.")
                .with_code(ErrorCode::E107)
                .with_label(position.clone(), "this import closes the cycle")
                .with_help(format!("Import chain:\n{chain}")));
        }
        self.in_progress.push(path.to_path_buf());
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.in_progress.pop();
    }

    /// The file currently being parsed, if any.
    pub(crate) fn current_file(&self) -> Option<&Path> {
        self.in_progress.last().map(PathBuf::as_path)
    }

    /// Resolve an `import` directive to the root block of the imported file.
    ///
    /// The returned block's annotation records the directive and the file
    /// edge it crossed.
    pub(crate) fn import(&mut self, directive: Import<Parse>) -> Result<Block<Parse>, DriverError> {
        let position = directive.meta.position().clone();
        let from = position
            .file()
            .map(Path::to_path_buf)
            .or_else(|| self.current_file().map(Path::to_path_buf));
        let target = self.resolve(
            from.as_deref(),
            &directive.file.text,
            &position,
            Access::Import,
        )?;

        info!(file = target.display().to_string(); "Importing file");
        let mut block = driver::parse_block_file_at(self, &target, &position)?;

        let from = from.unwrap_or_else(|| self.base.clone());
        let edge = ImportEdge::new(from, target);
        *block.meta_mut().data_mut() = Parse::imported(ImportLink::new(directive, edge));
        Ok(block)
    }

    /// Resolve an `include` directive to a text node holding the file's
    /// contents.
    pub(crate) fn include(
        &mut self,
        position: &Position,
        file: &str,
    ) -> Result<Text<Parse>, DriverError> {
        let from = position
            .file()
            .map(Path::to_path_buf)
            .or_else(|| self.current_file().map(Path::to_path_buf));
        let target = self.resolve(from.as_deref(), file, position, Access::Include)?;

        debug!(file = target.display().to_string(); "Including file");
        let text = fs::read_to_string(&target).map_err(|err| DriverError::io(&target, err))?;

        let include = Include::new(position.clone(), file, target);
        Ok(Text {
            meta: Meta::new(position.clone(), false, Parse::included(include)),
            text,
            quoted: true,
        })
    }
}

/// Fold `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn test_resolve_relative_to_importing_file() {
        let session = ParseSession::new("/docs").unwrap();
        let resolved = session
            .resolve(
                Some(Path::new("/docs/book/main.sd")),
                "chapters/one.sd",
                &Position::unknown(),
                Access::Import,
            )
            .unwrap();

        assert_eq!(resolved, PathBuf::from("/docs/book/chapters/one.sd"));
    }

    #[test]
    fn test_resolve_outside_base_rejected() {
        let session = ParseSession::new("/docs").unwrap();
        let err = session
            .resolve(
                Some(Path::new("/docs/main.sd")),
                "../../etc/passwd",
                &Position::unknown(),
                Access::Import,
            )
            .unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E106));
        assert_eq!(
            err.message(),
            "Refusing to import file outside of the base directory."
        );
        assert_eq!(err.help(), Some("Base: /docs\nFile: /etc/passwd"));
    }

    #[test]
    fn test_resolve_sibling_prefix_rejected() {
        let session = ParseSession::new("/docs").unwrap();
        let err = session
            .resolve(None, "../docs-private/x.sd", &Position::unknown(), Access::Include)
            .unwrap_err();

        assert_eq!(
            err.message(),
            "Refusing to include a file outside of the base directory."
        );
    }

    #[test]
    fn test_admit_input_file() {
        let session = ParseSession::new("/docs").unwrap();
        assert_eq!(
            session.admit(Path::new("/docs/book/../main.sd")).unwrap(),
            PathBuf::from("/docs/main.sd")
        );

        let err = session.admit(Path::new("/elsewhere/main.sd")).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E106));
        assert_eq!(
            err.message(),
            "Refusing to import file outside of the base directory."
        );
        assert_eq!(err.help(), Some("Base: /docs\nFile: /elsewhere/main.sd"));
    }

    #[test]
    fn test_enter_detects_cycle() {
        let mut session = ParseSession::new("/docs").unwrap();
        session.enter(Path::new("/docs/a.sd"), &Position::unknown()).unwrap();
        session.enter(Path::new("/docs/b.sd"), &Position::unknown()).unwrap();

        let err = session
            .enter(Path::new("/docs/a.sd"), &Position::unknown())
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E107));
        assert_eq!(
            err.help(),
            Some("Import chain:\n  /docs/a.sd\n  /docs/b.sd\n  /docs/a.sd")
        );

        session.leave();
        assert_eq!(session.current_file(), Some(Path::new("/docs/a.sd")));
    }
}
