use cssparser::{
    AtRuleParser, CowRcStr, DeclarationListParser, DeclarationParser, ParseError, Parser,
    ParserInput, ToCss, TokenSerializationType,
};
use log::debug;

/// One `property: value` pair from a `style` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct CssDeclaration {
    pub property: String,
    pub value: String,
}

#[derive(Debug)]
pub enum CssError {}

pub type CssParseError<'i> = ParseError<'i, CssError>;

/// Parses the declaration list of a `style` attribute. Invalid
/// declarations are dropped, matching the tolerant posture of the rest
/// of the pipeline.
pub fn parse_style_attribute(css: &str) -> Vec<CssDeclaration> {
    let mut parser_input = ParserInput::new(css);
    let mut parser = Parser::new(&mut parser_input);

    let mut declarations = Vec::new();
    for result in DeclarationListParser::new(&mut parser, CssDeclarationParser) {
        match result {
            Ok(declaration) => declarations.push(declaration),
            Err((error, text)) => {
                debug!("style declaration dropped: {:?} at {:?}", error, text);
            }
        }
    }
    declarations
}

/// Serializes declarations back into a `style` attribute value,
/// without trailing separators.
pub fn serialize_css_declarations(declarations: &[CssDeclaration]) -> String {
    declarations
        .iter()
        .map(|declaration| format!("{}:{}", declaration.property, declaration.value))
        .collect::<Vec<_>>()
        .join(";")
}

struct CssDeclarationParser;

impl<'i> DeclarationParser<'i> for CssDeclarationParser {
    type Declaration = CssDeclaration;
    type Error = CssError;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, CssParseError<'i>> {
        let mut value = String::new();
        let mut previous_token = TokenSerializationType::nothing();
        while let Ok(token) = input.next_including_whitespace_and_comments() {
            let token_type = token.serialization_type();
            if previous_token.needs_separator_when_before(token_type) {
                value.push_str("/**/");
            }
            previous_token = token_type;
            // Writing into a String cannot fail.
            token.to_css(&mut value).unwrap();
        }

        Ok(CssDeclaration {
            property: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl<'i> AtRuleParser<'i> for CssDeclarationParser {
    type PreludeBlock = ();
    type PreludeNoBlock = ();
    type AtRule = CssDeclaration;
    type Error = CssError;
}
