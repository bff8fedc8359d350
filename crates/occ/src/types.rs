//! Mapping of Overcast types onto backend types.
//!
//! | Overcast | backend |
//! |----------|---------|
//! | `void`   | void    |
//! | `int`    | i32     |
//! | `int64`  | i64     |
//! | `string` | i8*     |
//! | `float`  | float   |
//! | `bool`   | i1      |
//! | struct   | the declared aggregate |
//! | `T*`     | pointer to `T` |

use std::collections::HashMap;

use overcast_ast::OcType;

use crate::backend::{Backend, BackendResult};
use crate::error::CodeGenError;

/// Resolves `ty` against the built-ins and the declared struct types.
pub fn to_backend_type<B: Backend>(
    backend: &mut B,
    structs: &HashMap<String, B::Type>,
    ty: &OcType,
) -> BackendResult<B::Type> {
    match ty {
        OcType::Pointer(inner) => {
            let pointee = to_backend_type(backend, structs, inner)?;
            Ok(backend.pointer_type(pointee))
        }
        OcType::Identifier(name) => Ok(match name.as_str() {
            "void" => backend.void_type(),
            "int" => backend.int_type(32),
            "int64" => backend.int_type(64),
            "string" => {
                let byte = backend.int_type(8);
                backend.pointer_type(byte)
            }
            "float" => backend.float_type(),
            "bool" => backend.int_type(1),
            other => match structs.get(other) {
                Some(ty) => *ty,
                None => return Err(CodeGenError::UnknownType(other.to_string())),
            },
        }),
    }
}
