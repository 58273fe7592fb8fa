use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;

/// 讀取原始檔時可能發生的錯誤。 / Errors raised while loading a source file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("content of {0} could not be decoded as {1}")]
    InvalidEncoding(PathBuf, &'static str),
}

/// 解碼後的文字與偵測到的編碼。 / Decoded text plus the encoding it was read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSource {
    pub text: String,
    pub encoding: &'static str,
    pub has_bom: bool,
}

/// 讀取並解碼檔案。 / Reads and decodes a file from disk.
pub fn read_source(path: impl AsRef<Path>) -> Result<DecodedSource, SourceError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes).map_err(|encoding| SourceError::InvalidEncoding(path.to_path_buf(), encoding))
}

/// 依 BOM、UTF-8、編碼偵測的順序解碼。 / Decodes by BOM, then strict UTF-8, then a detected legacy encoding.
///
/// On failure the name of the encoding that was attempted is returned.
pub fn decode(bytes: &[u8]) -> Result<DecodedSource, &'static str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..], true);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(DecodedSource {
            text: text.to_owned(),
            encoding: UTF_8.name(),
            has_bom: false,
        });
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);
    decode_with(guess, bytes, false)
}

fn decode_with(
    encoding: &'static Encoding,
    bytes: &[u8],
    has_bom: bool,
) -> Result<DecodedSource, &'static str> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(encoding.name());
    }
    Ok(DecodedSource {
        text: text.into_owned(),
        encoding: encoding.name(),
        has_bom,
    })
}
