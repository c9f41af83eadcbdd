//! A parser combinator over a byte cursor.
//!
//! A [`Decoder<A>`] is a pure function from a buffer to either an error or
//! the leftover buffer plus an `A`. The cursor is threaded as a value
//! ([`Bytes`] slices are cheap), so decoders compose without shared state:
//! [`map`], [`and_then`], the bounded sub-parser [`take`], and the
//! accumulate-until-empty [`repeated`].
//!
//! Decoders are short-lived: the schema dispatcher builds them per call
//! and drops them with the call.
//!
//! [`map`]: Decoder::map
//! [`and_then`]: Decoder::and_then
//! [`take`]: Decoder::take
//! [`repeated`]: Decoder::repeated

use std::rc::Rc;

use bytes::{Bytes, BytesMut};

use crate::error::DecodeError;

type Run<A> = dyn Fn(Bytes) -> Result<(Bytes, A), DecodeError>;

/// A pure parser: `Bytes -> Result<(leftover, A), DecodeError>`.
pub struct Decoder<A> {
    inner: Rc<Run<A>>,
}

impl<A> Clone for Decoder<A> {
    fn clone(&self) -> Self {
        Decoder {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> Decoder<A> {
    /// Wraps a raw parsing function.
    pub fn new(run: impl Fn(Bytes) -> Result<(Bytes, A), DecodeError> + 'static) -> Self {
        Decoder {
            inner: Rc::new(run),
        }
    }

    /// Runs the decoder over `bytes`.
    pub fn run(&self, bytes: Bytes) -> Result<(Bytes, A), DecodeError> {
        (self.inner)(bytes)
    }

    /// Produces `value` without consuming anything.
    pub fn succeed(value: A) -> Self
    where
        A: Clone,
    {
        Decoder::new(move |bytes| Ok((bytes, value.clone())))
    }

    /// Fails with `error` on any input.
    pub fn fail(error: DecodeError) -> Self {
        Decoder::new(move |_| Err(error.clone()))
    }

    /// Applies `f` to the decoded value.
    pub fn map<B: 'static>(self, f: impl Fn(A) -> B + 'static) -> Decoder<B> {
        Decoder::new(move |bytes| {
            let (leftover, value) = self.run(bytes)?;
            Ok((leftover, f(value)))
        })
    }

    /// Sequences a decoder chosen from the decoded value.
    ///
    /// Fails up front when the incoming buffer is already empty: a
    /// continuation always needs at least the bytes its prefix left behind.
    pub fn and_then<B: 'static>(self, f: impl Fn(A) -> Decoder<B> + 'static) -> Decoder<B> {
        Decoder::new(move |bytes: Bytes| {
            if bytes.is_empty() {
                return Err(DecodeError::UnexpectedEndOfBytes);
            }
            let (leftover, value) = self.run(bytes)?;
            f(value).run(leftover)
        })
    }

    /// Bounds the decoder to the first `n` bytes of the buffer.
    ///
    /// The remaining suffix is appended back onto whatever the bounded run
    /// leaves over, restoring the outer cursor. This is how sub-parsers for
    /// length-delimited frames are framed.
    pub fn take(self, n: usize) -> Decoder<A> {
        Decoder::new(move |mut bytes: Bytes| {
            if bytes.len() < n {
                return Err(DecodeError::UnexpectedEndOfBytes);
            }
            let prefix = bytes.split_to(n);
            let (leftover, value) = self.run(prefix)?;
            let remainder = if leftover.is_empty() {
                bytes
            } else {
                let mut joined = BytesMut::with_capacity(leftover.len() + bytes.len());
                joined.extend_from_slice(&leftover);
                joined.extend_from_slice(&bytes);
                joined.freeze()
            };
            Ok((remainder, value))
        })
    }

    /// Runs the decoder repeatedly until the buffer is empty, collecting
    /// every value.
    pub fn repeated(self) -> Decoder<Vec<A>> {
        Decoder::new(move |mut bytes: Bytes| {
            let mut values = Vec::new();
            while !bytes.is_empty() {
                let (leftover, value) = self.run(bytes)?;
                values.push(value);
                bytes = leftover;
            }
            Ok((bytes, values))
        })
    }
}

/// Consumes the entire remaining buffer as raw bytes.
///
/// Only meaningful inside a [`Decoder::take`] envelope.
pub fn binary() -> Decoder<Bytes> {
    Decoder::new(|bytes: Bytes| Ok((Bytes::new(), bytes)))
}

/// Consumes the entire remaining buffer as UTF-8.
///
/// Only meaningful inside a [`Decoder::take`] envelope.
pub fn string() -> Decoder<String> {
    Decoder::new(|bytes: Bytes| {
        let text = String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok((Bytes::new(), text))
    })
}
