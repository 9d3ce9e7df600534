//! Reconstructing the original bytes from a root schema.

use bytes::Bytes;
use cask_types::{BlobRef, Part, Schema, SchemaError};
use tracing::debug;

use crate::client::BlobClient;
use crate::error::ClientError;

/// One in-progress parts list during the walk.
struct Frame {
    parts: std::vec::IntoIter<Part>,
    /// The `bytesRef` part that opened this frame; `None` for the root.
    bytes_ref: Option<BlobRef>,
    /// Declared size of the range this frame covers.
    declared: u64,
    /// Output length when the frame was opened.
    start: usize,
}

/// Reassembles a byte stream from its root schema.
///
/// Walks the parts strictly in order, depth-first: a `bytesRef` part is
/// resolved into a nested frame, a `blobRef` part is fetched and
/// emitted. No reordering, caching, or skipping — the output is a pure
/// function of the schema tree, byte-for-byte equal to the original
/// stream.
pub struct StreamAssembler {
    client: BlobClient,
}

impl StreamAssembler {
    /// Assembler over the given client.
    pub fn new(client: BlobClient) -> Self {
        Self { client }
    }

    /// Resolve a root schema ref (Bytes or File) into the original bytes.
    ///
    /// A truncated or inconsistent schema fails explicitly: an absent
    /// blob is [`ClientError::NotFound`], an undecodable schema is
    /// [`ClientError::MalformedSchema`], and a part that resolves to
    /// fewer bytes than it declares is [`ClientError::ShortRead`].
    pub async fn assemble(&self, root: BlobRef) -> Result<Bytes, ClientError> {
        let schema = self.fetch_schema(root).await?;
        debug!(%root, kind = schema.type_name(), "assembling stream");

        let mut out: Vec<u8> = Vec::new();
        let mut stack = vec![Frame {
            parts: schema.into_parts().into_iter(),
            bytes_ref: None,
            declared: 0,
            start: 0,
        }];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.parts.next(),
                None => break,
            };
            match next {
                Some(Part::Blob { blob_ref, size }) => {
                    let data = self.fetch_blob(blob_ref).await?;
                    if (data.len() as u64) < size {
                        return Err(ClientError::ShortRead {
                            blob_ref,
                            declared: size,
                            got: data.len() as u64,
                        });
                    }
                    out.extend_from_slice(&data);
                }
                Some(Part::Bytes { bytes_ref, size }) => {
                    let nested = self.fetch_schema(bytes_ref).await?;
                    let kind = nested.type_name();
                    let Schema::Bytes(nested) = nested else {
                        return Err(ClientError::MalformedSchema(SchemaError::UnexpectedType(
                            kind.to_string(),
                        )));
                    };
                    stack.push(Frame {
                        parts: nested.parts.into_iter(),
                        bytes_ref: Some(bytes_ref),
                        declared: size,
                        start: out.len(),
                    });
                }
                None => {
                    if let Some(frame) = stack.pop() {
                        if let Some(bytes_ref) = frame.bytes_ref {
                            let got = (out.len() - frame.start) as u64;
                            if got < frame.declared {
                                return Err(ClientError::ShortRead {
                                    blob_ref: bytes_ref,
                                    declared: frame.declared,
                                    got,
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(Bytes::from(out))
    }

    async fn fetch_blob(&self, blob_ref: BlobRef) -> Result<Bytes, ClientError> {
        self.client
            .get_blob(blob_ref)
            .await?
            .ok_or(ClientError::NotFound(blob_ref))
    }

    async fn fetch_schema(&self, blob_ref: BlobRef) -> Result<Schema, ClientError> {
        let raw = self.fetch_blob(blob_ref).await?;
        Ok(Schema::decode(&raw)?)
    }
}
