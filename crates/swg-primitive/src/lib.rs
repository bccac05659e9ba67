//! # swg-primitive: Typed Values From Raw Input
//!
//! A [`PrimitiveFactory`] maps `(type, format)` pairs to [`Handler`]s and
//! drives production: raw JSON input plus a schema node in, a
//! [`PrimitiveValue`] out. Schemas are composed on the way through a
//! [`Composer`](swg_schema::Composer), so `$ref` and `allOf` are transparent
//! to handlers.
//!
//! The factory is owned by the caller. Registering a handler on one factory
//! never affects another.
//!
//! ## Built-in handlers
//!
//! | type      | formats                                                  |
//! |-----------|----------------------------------------------------------|
//! | `integer` | (none), `int32`, `int64`                                 |
//! | `number`  | (none), `float`, `double`                                |
//! | `string`  | (none), `password`, `email`, `uuid`, `byte`, `date`, `date-time` |
//! | `boolean` | (none)                                                   |
//! | `array`   | (none)                                                   |
//! | `object`  | (none)                                                   |
//! | `file`    | (none)                                                   |

mod array;
mod builtin;
pub mod context;
pub mod factory;
mod model;
pub mod value;

pub use context::{Direction, ProductionContext};
pub use factory::{Handler, PrimitiveFactory, Producer, Production, Validator};
pub use value::{ArrayValue, FileValue, Model, ModelEntry, PrimitiveValue, WireEncoding};
