//! Username list loading.

use crate::error::InputError;
use crate::models::is_valid_username;
use std::path::Path;

/// Read one username per line.
///
/// Blank lines are skipped and surrounding whitespace is trimmed. A name
/// with characters outside `[A-Za-z0-9_-]` rejects the whole list before
/// anything is fetched.
pub fn load_usernames(path: &Path) -> Result<Vec<String>, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    parse_usernames(&content, path)
}

fn parse_usernames(content: &str, path: &Path) -> Result<Vec<String>, InputError> {
    let mut usernames = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let name = line.trim();
        if name.is_empty() {
            continue;
        }

        if !is_valid_username(name) {
            return Err(InputError::InvalidUsername {
                path: path.to_path_buf(),
                line: index + 1,
                name: name.to_string(),
            });
        }

        usernames.push(name.to_string());
    }

    if usernames.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }

    Ok(usernames)
}
