//! Local path resolution for transfers.

use camino::Utf8PathBuf;

use crate::parameter::{self, MissingParameterError};

/// Joins `dir` and `name` as `dir + "/" + name`, first stripping one
/// trailing `/` from `dir`.
///
/// # Errors
///
/// Returns [`MissingParameterError`] naming `dir_field` when `dir` is empty
/// and `name` when the object name is blank.
pub fn object_path(
    dir_field: &str,
    dir: &str,
    name: &str,
) -> Result<Utf8PathBuf, MissingParameterError> {
    if dir.is_empty() {
        return Err(MissingParameterError::new(dir_field));
    }
    parameter::require("name", name)?;
    let normalised = dir.strip_suffix('/').unwrap_or(dir);
    Ok(Utf8PathBuf::from(format!("{normalised}/{name}")))
}
