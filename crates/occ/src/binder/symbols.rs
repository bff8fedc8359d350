use overcast_ast::{OcType, StructLayout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: OcType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub name: String,
    pub params: Vec<VariableSymbol>,
    pub return_type: OcType,
    /// Extra arguments past `params` are accepted unchecked.
    pub is_variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructSymbol {
    pub name: String,
    pub layout: StructLayout,
}

impl StructSymbol {
    pub fn member_type(&self, member: &str) -> Option<&OcType> {
        self.layout.member(member).map(|m| &m.ty)
    }
}
