use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where an engine run writes its files.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OutputTarget<'a> {
    pub(crate) input: &'a Path,
    pub(crate) output: Option<&'a Path>,
    pub(crate) output_dir: Option<&'a Path>,
}

impl OutputTarget<'_> {
    /// Path of destination `dest` of transform `transform`.
    pub(crate) fn path_for(
        &self,
        transform: usize,
        dest: usize,
        file_name: Option<&Path>,
        extension: &str,
    ) -> PathBuf {
        if let Some(name) = file_name {
            return match self.output_dir {
                Some(dir) => dir.join(name),
                None => name.to_path_buf(),
            };
        }
        if let Some(dir) = self.output_dir {
            return dir.join(format!("t{transform}d{dest}.{extension}"));
        }
        if let Some(output) = self.output {
            if transform == 0 && dest == 0 {
                return output.to_path_buf();
            }
            return with_suffix(output, transform, dest, None);
        }
        with_suffix(self.input, transform, dest, Some(extension))
    }
}

/// `dir/name.ext` → `dir/name_t{i}d{j}.ext`, optionally swapping the extension.
fn with_suffix(path: &Path, transform: usize, dest: usize, extension: Option<&str>) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    let mut name = OsString::from(stem);
    if !stem.is_empty() {
        name.push("_");
    }
    name.push(format!("t{transform}d{dest}"));
    if let Some(ext) = extension
        .map(OsString::from)
        .or_else(|| path.extension().map(OsString::from))
    {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "../../tests/unit/dropframes/paths.rs"]
mod tests;
