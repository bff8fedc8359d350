use std::collections::HashSet;

/// Names of the locals declared so far in one function body.
///
/// The parser only needs names: whether an identifier is a known local
/// decides between assignment, member access and call productions.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    variables: HashSet<String>,
}

impl Scope {
    pub fn declare(&mut self, name: &str) {
        self.variables.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains(name)
    }
}
