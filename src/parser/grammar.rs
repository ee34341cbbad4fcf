//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::formatter::{FormatterDecl, FormatterKind, WILDCARD_TYPE};
use crate::parser::ast::{Document, Identifier, Spanned};
use crate::parser::lexer::Token;

/// One attribute from a declaration's bracket block
#[derive(Debug, Clone)]
enum Attr {
    Type(String),
    MinWidth(i32),
    MaxWidth(i32),
    Template(String),
    Preview,
}

impl Attr {
    fn key(&self) -> &'static str {
        match self {
            Attr::Type(_) => "type",
            Attr::MinWidth(_) => "min_width",
            Attr::MaxWidth(_) => "max_width",
            Attr::Template(_) => "template",
            Attr::Preview => "preview",
        }
    }
}

/// Untyped attribute value, checked against its key after parsing
#[derive(Debug, Clone)]
enum AttrValue {
    Str(String),
    Word(String),
    Num(i32),
    Wildcard,
}

/// Parse catalog source code into an AST
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => Identifier::new(s),
    };

    let attr_value = choice((
        just(Token::Star).to(AttrValue::Wildcard),
        select! {
            Token::String(s) => AttrValue::Str(s),
            Token::Ident(s) => AttrValue::Word(s),
            Token::Number(n) => AttrValue::Num(n),
        },
    ));

    // key: value attributes, with the value shape checked per key
    let keyed_attr = select! { Token::Ident(key) => key }
        .then_ignore(just(Token::Colon))
        .then(attr_value)
        .try_map(|(key, value), span| match (key.as_str(), value) {
            ("type", AttrValue::Wildcard) => Ok(Attr::Type(WILDCARD_TYPE.to_string())),
            ("type", AttrValue::Str(s)) | ("type", AttrValue::Word(s)) => Ok(Attr::Type(s)),
            ("type", AttrValue::Num(_)) => Err(Rich::custom(
                span,
                "type must be an identifier, a quoted string, or *",
            )),
            ("min_width", AttrValue::Num(n)) => Ok(Attr::MinWidth(n)),
            ("min_width", _) => Err(Rich::custom(span, "min_width must be a number")),
            ("max_width", AttrValue::Num(n)) => Ok(Attr::MaxWidth(n)),
            ("max_width", _) => Err(Rich::custom(span, "max_width must be a number")),
            ("template", AttrValue::Str(s)) => Ok(Attr::Template(s)),
            ("template", _) => Err(Rich::custom(span, "template must be a quoted path")),
            (other, _) => Err(Rich::custom(
                span,
                format!("unknown formatter attribute '{}'", other),
            )),
        });

    let attribute = choice((just(Token::Preview).to(Attr::Preview), keyed_attr));

    let attribute_block = attribute
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose));

    // Formatter declaration: formatter <name> [attributes]
    let formatter_decl = just(Token::Formatter)
        .ignore_then(identifier)
        .then(attribute_block)
        .try_map(|(name, attrs), span| {
            let decl = build_declaration(&name, attrs, span)?;
            Ok(Spanned::new(decl, span.into_range()))
        });

    // Document is a list of formatter declarations
    formatter_decl
        .repeated()
        .collect()
        .then_ignore(end())
        .map(|formatters| Document { formatters })
}

/// Fold a declaration's attributes into a `FormatterDecl`, rejecting
/// duplicate attributes and contradictory or incomplete bindings.
fn build_declaration<'a>(
    name: &Identifier,
    attrs: Vec<Attr>,
    span: SimpleSpan,
) -> Result<FormatterDecl, Rich<'a, Token>> {
    let mut container_type: Option<String> = None;
    let mut min_width: Option<i32> = None;
    let mut max_width: Option<i32> = None;
    let mut template: Option<String> = None;
    let mut preview = false;

    for attr in attrs {
        let key = attr.key();
        let duplicate = match attr {
            Attr::Type(t) => container_type.replace(t).is_some(),
            Attr::MinWidth(n) => min_width.replace(n).is_some(),
            Attr::MaxWidth(n) => max_width.replace(n).is_some(),
            Attr::Template(t) => template.replace(t).is_some(),
            Attr::Preview => std::mem::replace(&mut preview, true),
        };
        if duplicate {
            return Err(Rich::custom(
                span,
                format!("duplicate attribute '{}' in formatter '{}'", key, name),
            ));
        }
    }

    // A declaration carrying both a container type and width bounds binds
    // by type.
    let kind = if let Some(container_type) = container_type {
        FormatterKind::Type { container_type }
    } else if let Some(min) = min_width {
        FormatterKind::Width {
            min_width: min,
            max_width: max_width.unwrap_or(i32::MAX),
        }
    } else if max_width.is_some() {
        return Err(Rich::custom(
            span,
            format!("formatter '{}' has max_width but no min_width", name),
        ));
    } else {
        return Err(Rich::custom(
            span,
            format!("formatter '{}' needs a type or a width range", name),
        ));
    };

    let Some(template) = template else {
        return Err(Rich::custom(
            span,
            format!("formatter '{}' is missing a template", name),
        ));
    };

    Ok(FormatterDecl {
        name: Some(name.as_str().to_string()),
        kind,
        template,
        template_id: None,
        preview,
        location: String::new(),
    })
}
