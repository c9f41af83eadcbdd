//! Schema-driven codec for Google's Protocol Buffers wire format, aka
//! [protobuf](https://protobuf.dev).
//!
//! There is no `.proto` compiler and no generated code here: a [`Schema`] is
//! an ordinary runtime value describing the shape of a data type, and
//! [`encode`]/[`decode`] walk that value to produce or consume wire bytes.
//!
//! ```
//! use schemabuf::{decode, encode, Schema, Value};
//!
//! let schema = Schema::record([("value", Schema::int())]);
//! let value = Value::record([("value", Value::Int(150))]);
//!
//! let bytes = encode(&schema, &value);
//! assert_eq!(&bytes[..], &[0x08, 0x96, 0x01]);
//! assert_eq!(decode(&schema, &bytes).unwrap(), value);
//! ```

pub mod codec;
pub mod decoder;
pub mod error;
pub mod leb128;
pub mod schema;
pub mod value;
pub mod wire;

pub use codec::{can_be_packed, decode, encode};
pub use error::DecodeError;
pub use schema::{OneofCase, ProductField, Schema, StandardType};
pub use value::Value;
