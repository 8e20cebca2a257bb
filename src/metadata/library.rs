use serde::Deserialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("no libraries provided")]
    NoLibraries,
    #[error("expected exactly one library, found {0}")]
    TooManyLibraries(usize),
}

/// Library reference as it appears in workflow run events. Other keys are ignored
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryRef {
    pub library_id: String,
}

/// Workflow runs are expected to carry a single library
pub fn select_library(libraries: &[LibraryRef]) -> Result<&str, LibraryError> {
    match libraries {
        [] => Err(LibraryError::NoLibraries),
        [library] => Ok(&library.library_id),
        _ => Err(LibraryError::TooManyLibraries(libraries.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(id: &str) -> LibraryRef {
        LibraryRef { library_id: id.to_string() }
    }

    #[test]
    fn exactly_one_library() {
        assert_eq!(select_library(&[library("L2400161")]), Ok("L2400161"));
        assert_eq!(select_library(&[]), Err(LibraryError::NoLibraries));
        assert_eq!(select_library(&[library("L2400161"), library("L2400162")]), Err(LibraryError::TooManyLibraries(2)));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let libraries: Vec<LibraryRef> = serde_json::from_str(r#"[{"libraryId": "L2400161", "orcabusId": "lib.01J"}]"#).unwrap();
        assert_eq!(select_library(&libraries), Ok("L2400161"));
    }
}
