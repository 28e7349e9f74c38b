//! Byte sources for the lexer.
//!
//! Parsing consumes either a borrowed in-memory buffer or a caller-supplied
//! chunk callback. Chunks are pulled on demand, in order, and cached for the
//! duration of the parse; an empty chunk signals end of input.

/// A position-addressable byte source.
pub(crate) struct Input<'a> {
    source: Source<'a>,
}

enum Source<'a> {
    Slice(&'a [u8]),
    Chunks {
        read: Box<dyn FnMut(usize) -> Vec<u8> + 'a>,
        buffer: Vec<u8>,
        exhausted: bool,
    },
}

impl<'a> Input<'a> {
    pub(crate) fn slice(bytes: &'a [u8]) -> Self {
        Input {
            source: Source::Slice(bytes),
        }
    }

    pub(crate) fn chunks(read: Box<dyn FnMut(usize) -> Vec<u8> + 'a>) -> Self {
        Input {
            source: Source::Chunks {
                read,
                buffer: Vec::new(),
                exhausted: false,
            },
        }
    }

    /// The byte at `offset`, or `None` past end of input.
    pub(crate) fn byte(&mut self, offset: usize) -> Option<u8> {
        match &mut self.source {
            Source::Slice(bytes) => bytes.get(offset).copied(),
            Source::Chunks {
                read,
                buffer,
                exhausted,
            } => {
                while buffer.len() <= offset && !*exhausted {
                    let chunk = read(buffer.len());
                    if chunk.is_empty() {
                        *exhausted = true;
                    } else {
                        buffer.extend_from_slice(&chunk);
                    }
                }
                buffer.get(offset).copied()
            }
        }
    }

    /// Total length. Forces the remaining chunks, so call only when the
    /// whole input is needed (end of parse, partial-result wrapping).
    pub(crate) fn len(&mut self) -> usize {
        match &mut self.source {
            Source::Slice(bytes) => bytes.len(),
            Source::Chunks {
                read,
                buffer,
                exhausted,
            } => {
                while !*exhausted {
                    let chunk = read(buffer.len());
                    if chunk.is_empty() {
                        *exhausted = true;
                    } else {
                        buffer.extend_from_slice(&chunk);
                    }
                }
                buffer.len()
            }
        }
    }
}
