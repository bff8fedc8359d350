use std::collections::HashMap;

use overcast_ast::OcType;

use super::symbols::VariableSymbol;
use crate::error::BindError;

/// Locals of one function body. Blocks inside the body share it.
#[derive(Debug, Default)]
pub struct Scope {
    locals: HashMap<String, VariableSymbol>,
}

impl Scope {
    pub fn declare(&mut self, name: &str, ty: OcType) -> Result<(), BindError> {
        if self.locals.contains_key(name) {
            return Err(BindError::new(format!(
                "Attempt to redeclare an already declared variable {name}."
            )));
        }
        self.locals.insert(
            name.to_string(),
            VariableSymbol {
                name: name.to_string(),
                ty,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&VariableSymbol> {
        self.locals.get(name)
    }
}
