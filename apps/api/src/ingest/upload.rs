//! Upload plumbing shared by the resume and JD endpoints: multipart reading,
//! ingestion-scoped temp files, and raw-byte persistence to object storage.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use axum::extract::Multipart;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use crate::errors::AppError;

pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Bytes,
}

pub struct MultipartUpload {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedDocument>,
}

/// Drains a multipart body: the field named `file_field` becomes the
/// uploaded document, everything else is collected as text fields.
pub async fn read_multipart(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<MultipartUpload, AppError> {
    let mut fields = HashMap::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let filename = field
                .file_name()
                .ok_or_else(|| {
                    AppError::Validation(format!("field '{file_field}' must be a file"))
                })?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            file = Some(UploadedDocument { filename, bytes });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read field: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok(MultipartUpload { fields, file })
}

/// Writes the upload to a temp file carrying the original extension so the
/// extractor can dispatch on it. The file is removed on drop, on every exit
/// path including failure.
pub fn write_temp_file(doc: &UploadedDocument) -> Result<tempfile::NamedTempFile, AppError> {
    let suffix = Path::new(&doc.filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut tmp = tempfile::Builder::new()
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| AppError::Internal(e.into()))?;
    tmp.write_all(&doc.bytes)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(tmp)
}

/// Persists the raw uploaded bytes under the document's stable id and
/// returns the object key.
pub async fn store_raw_document(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    document_id: &str,
    doc: &UploadedDocument,
) -> Result<String, AppError> {
    let key = format!("uploads/{document_id}/{}", doc.filename);
    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(doc.bytes.clone()))
        .send()
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_file_carries_original_extension() {
        let doc = UploadedDocument {
            filename: "resume.PDF".to_string(),
            bytes: Bytes::from_static(b"%PDF-"),
        };
        let tmp = write_temp_file(&doc).unwrap();
        let ext = tmp.path().extension().and_then(|e| e.to_str()).unwrap();
        assert_eq!(ext, "PDF");
        assert_eq!(std::fs::read(tmp.path()).unwrap(), b"%PDF-");
    }

    #[test]
    fn test_temp_file_without_extension() {
        let doc = UploadedDocument {
            filename: "resume".to_string(),
            bytes: Bytes::from_static(b"text"),
        };
        let tmp = write_temp_file(&doc).unwrap();
        assert!(tmp.path().extension().is_none());
    }

    #[test]
    fn test_temp_file_is_removed_on_drop() {
        let doc = UploadedDocument {
            filename: "resume.txt".to_string(),
            bytes: Bytes::from_static(b"text"),
        };
        let tmp = write_temp_file(&doc).unwrap();
        let path = tmp.path().to_owned();
        assert!(path.exists());
        drop(tmp);
        assert!(!path.exists());
    }
}
