use serde::de::DeserializeOwned;
use serde_json::de::{SliceRead, StreamDeserializer};
use thiserror::Error;

/// A malformed message inside a JSON message stream.
#[derive(Debug, Error)]
#[error("malformed message at byte {offset}: {source}")]
pub struct DecodeError {
    /// Byte offset where the malformed message starts.
    pub offset: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Forward-only reader over a buffer holding zero or more whitespace
/// separated JSON values, as emitted by the node's streaming endpoints.
///
/// End of input ends the iteration. A malformed value yields one `Err`
/// and then the iterator is exhausted.
pub struct JsonStream<'a, T> {
    inner: StreamDeserializer<'a, SliceRead<'a>, T>,
    failed: bool,
}

impl<'a, T: DeserializeOwned> JsonStream<'a, T> {
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            inner: serde_json::Deserializer::from_slice(body).into_iter::<T>(),
            failed: false,
        }
    }

    /// Decode every message, failing on the first malformed one.
    pub fn collect_all(body: &'a [u8]) -> Result<Vec<T>, DecodeError> {
        Self::new(body).collect()
    }
}

impl<T: DeserializeOwned> Iterator for JsonStream<'_, T> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let offset = self.inner.byte_offset();
        match self.inner.next()? {
            Ok(value) => Some(Ok(value)),
            Err(source) => {
                self.failed = true;
                Some(Err(DecodeError { offset, source }))
            }
        }
    }
}

impl<T: DeserializeOwned> std::iter::FusedIterator for JsonStream<'_, T> {}
