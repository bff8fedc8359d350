use overcast_ast::OcType;

use crate::tokenizer::TokenKind;
use crate::{ParseError, Parser};

impl Parser {
    /// `Ident` followed by zero or more `*`.
    pub(crate) fn parse_type(&mut self) -> Result<OcType, ParseError> {
        let name = self.consume(TokenKind::Identifier)?.text;
        let base = OcType::Identifier(name);
        if self.check(TokenKind::Symbol, "*") {
            Ok(self.parse_pointer_suffix(base))
        } else {
            Ok(base)
        }
    }

    /// Consumes one `*` and recurses on the rest, so `int**` becomes
    /// `Pointer(Pointer(int))`.
    fn parse_pointer_suffix(&mut self, pointee: OcType) -> OcType {
        self.advance();
        if self.check(TokenKind::Symbol, "*") {
            OcType::pointer(self.parse_pointer_suffix(pointee))
        } else {
            OcType::pointer(pointee)
        }
    }
}
