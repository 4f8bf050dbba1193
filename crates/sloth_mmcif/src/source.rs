//! Source text that deferred items keep spans into.

use std::fs::File;
use std::io;
use std::sync::Arc;

use memmap2::Mmap;

use crate::token::Span;

#[derive(Clone)]
pub(crate) enum SourceText {
    Shared(Arc<str>),
    Mapped(Arc<Mmap>),
}

impl SourceText {
    /// Map `file` read-only. An empty file cannot be mapped on every
    /// platform and is kept as empty text instead.
    ///
    /// The file must not be truncated while the mapping is alive.
    #[allow(unsafe_code)]
    pub(crate) fn map_file(file: &File) -> io::Result<Self> {
        if file.metadata()?.len() == 0 {
            return Ok(SourceText::Shared(Arc::from("")));
        }
        let mmap = unsafe { Mmap::map(file)? };
        Ok(SourceText::Mapped(Arc::new(mmap)))
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            SourceText::Shared(text) => text.as_bytes(),
            SourceText::Mapped(mmap) => mmap,
        }
    }

    /// Text of `span`. Out-of-range spans decode to an empty string.
    pub(crate) fn decode(&self, span: Span) -> String {
        self.bytes()
            .get(span.start..span.end)
            .map_or_else(String::new, |bytes| {
                String::from_utf8_lossy(bytes).into_owned()
            })
    }
}

impl From<Arc<str>> for SourceText {
    fn from(text: Arc<str>) -> Self {
        SourceText::Shared(text)
    }
}
