use std::path::{Path, PathBuf};

/// Returns the first of `start` and its ancestors for which `found` holds. If `start` is a file,
/// the search begins at its directory.
pub(crate) fn find_in_ancestors<F>(start: &Path, found: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let start = if start.is_file() { start.parent()? } else { start };
    start.ancestors().find(|dir| found(dir)).map(Path::to_path_buf)
}

/// True if `dir` holds an entry named `name`.
pub(crate) fn contains(dir: &Path, name: &str) -> bool {
    dir.join(name).exists()
}
