use std::path::PathBuf;

use url::Url;

use crate::Error;
use crate::variant::Results;

const URIS_KEY: &str = "uris";

/// Extract the destination path from SaveFile results.
///
/// `uris` must hold exactly one `file://` URI; its percent-decoded path is
/// returned.
pub fn parse_file_chooser_results(results: &Results) -> Result<PathBuf, Error> {
    let uris: Vec<String> = results
        .get(URIS_KEY)
        .cloned()
        .ok_or(Error::MissingKey(URIS_KEY))?
        .try_into()?;

    let [uri] = uris.as_slice() else {
        return Err(Error::Cardinality(uris.len()));
    };

    uri_to_path(uri)
}

/// Convert a `file://` URI to a local path
fn uri_to_path(uri: &str) -> Result<PathBuf, Error> {
    let invalid = |reason: String| Error::UriParse {
        uri: uri.to_string(),
        reason,
    };

    let url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "file" {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    url.to_file_path()
        .map_err(|()| invalid("not a local file path".to_string()))
}
