use crate::{
    params::{ParseError, ParseErrorKind},
    Algorithm, Component, SignatureParams,
};
use logos::{Logos, Span, SpannedIter};
use std::iter::Peekable;

#[derive(Clone, Copy, Debug, Logos, PartialEq)]
#[logos(skip r"[ \t]+")]
enum TokenTy {
    #[regex(r"[a-z*][a-z0-9_\-.*]*")]
    Key,

    #[regex(r#""([^"\\]|\\["\\])*""#)]
    String,

    #[regex(r"-?[0-9]+")]
    Integer,

    #[regex(r":[A-Za-z0-9+/=]*:")]
    ByteSequence,

    #[token("=")]
    Equals,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

struct Parser<'a> {
    tokens: Peekable<SpannedIter<'a, TokenTy>>,
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokens: TokenTy::lexer(input).spanned().peekable(),
            input,
        }
    }

    fn whole(&self) -> Span {
        0..self.input.len()
    }

    fn next(&mut self) -> Result<(TokenTy, Span), ParseError> {
        match self.tokens.next() {
            Some((Ok(ty), span)) => Ok((ty, span)),
            Some((Err(()), span)) => Err(ParseError::new(ParseErrorKind::UnexpectedToken, span)),
            None => {
                let end = self.input.len();
                Err(ParseError::new(ParseErrorKind::UnexpectedEnd, end..end))
            }
        }
    }

    fn peek(&mut self) -> Option<TokenTy> {
        self.tokens
            .peek()
            .and_then(|(ty, _span)| ty.as_ref().ok().copied())
    }

    fn expect(&mut self, expected: TokenTy) -> Result<Span, ParseError> {
        let (ty, span) = self.next()?;
        if ty == expected {
            Ok(span)
        } else {
            Err(ParseError::new(ParseErrorKind::UnexpectedToken, span))
        }
    }

    /// Ensure the current dictionary member is over
    fn end_of_member(&mut self) -> Result<bool, ParseError> {
        match self.tokens.next() {
            None => Ok(true),
            Some((Ok(TokenTy::Comma), _span)) => Ok(false),
            Some((_ty, span)) => Err(ParseError::new(ParseErrorKind::UnexpectedToken, span)),
        }
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.input[span]
    }
}

const KNOWN_PARAMETERS: [&str; 5] = ["keyid", "alg", "created", "expires", "nonce"];

fn unescape(raw: &str) -> String {
    let inner = raw.trim_start_matches('"').trim_end_matches('"');
    let mut unescaped = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            unescaped.extend(chars.next());
        } else {
            unescaped.push(ch);
        }
    }
    unescaped
}

fn number(value: &str, span: Span) -> Result<u64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber, span))
}

/// Parse the first member of a `Signature-Input` header value
///
/// Returns the label alongside the parameters. The signature of the returned parameters is empty.
/// Parameters other than `keyid`, `alg`, `created`, `expires` and `nonce` are ignored.
pub fn parse_input(input: &str) -> Result<(String, SignatureParams), ParseError> {
    let mut parser = Parser::new(input);

    let label_span = parser.expect(TokenTy::Key)?;
    let label = parser.slice(label_span).to_owned();
    parser.expect(TokenTy::Equals)?;
    parser.expect(TokenTy::OpenParen)?;

    let mut components = Vec::new();
    loop {
        let (ty, span) = parser.next()?;
        match ty {
            TokenTy::String => {
                let name = unescape(parser.slice(span.clone()));
                let component =
                    Component::parse(&name).map_err(|error| ParseError::new(error, span))?;
                components.push(component);
            }
            TokenTy::CloseParen => break,
            _ => return Err(ParseError::new(ParseErrorKind::UnexpectedToken, span)),
        }
    }

    let mut key_id = None;
    let mut algorithm = None;
    let mut created = None;
    let mut expires = None;
    let mut nonce = None;

    while parser.peek() == Some(TokenTy::Semicolon) {
        parser.next()?;
        let key_span = parser.expect(TokenTy::Key)?;
        let key = parser.slice(key_span.clone());

        // Bare parameters are booleans
        if parser.peek() != Some(TokenTy::Equals) {
            if KNOWN_PARAMETERS.contains(&key) {
                return Err(ParseError::new(ParseErrorKind::UnexpectedToken, key_span));
            }
            continue;
        }
        parser.next()?;

        let (ty, value_span) = parser.next()?;
        let span = key_span.start..value_span.end;
        let raw = parser.slice(value_span.clone());

        match (key, ty) {
            ("keyid", TokenTy::String) => key_id = Some(unescape(raw)),
            ("alg", TokenTy::String) => {
                algorithm = Some(
                    Algorithm::parse(&unescape(raw))
                        .map_err(|error| ParseError::new(error, span))?,
                );
            }
            ("created", TokenTy::Integer) => created = Some(number(raw, span)?),
            ("expires", TokenTy::Integer) => expires = Some(number(raw, span)?),
            ("nonce", TokenTy::String) => nonce = Some(unescape(raw)),
            (key, _) if KNOWN_PARAMETERS.contains(&key) => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    value_span,
                ));
            }
            _ => {}
        }
    }

    parser.end_of_member()?;

    let whole = parser.whole();
    let params = SignatureParams {
        key_id: key_id.ok_or_else(|| {
            ParseError::new(ParseErrorKind::MissingParameter("keyid"), whole.clone())
        })?,
        algorithm,
        created,
        expires,
        nonce,
        components,
        signature: Vec::new(),
    };
    params
        .validate()
        .map_err(|error| ParseError::new(error, whole))?;

    Ok((label, params))
}

/// Pick the signature with the given label out of a `Signature` header value
pub fn parse_signature(input: &str, label: &str) -> Result<Vec<u8>, ParseError> {
    let mut parser = Parser::new(input);

    loop {
        let key_span = parser.expect(TokenTy::Key)?;
        parser.expect(TokenTy::Equals)?;
        let value_span = parser.expect(TokenTy::ByteSequence)?;

        while parser.peek() == Some(TokenTy::Semicolon) {
            parser.next()?;
            parser.expect(TokenTy::Key)?;
            if parser.peek() == Some(TokenTy::Equals) {
                parser.next()?;
                parser.next()?;
            }
        }

        if parser.slice(key_span) == label {
            let encoded = parser.slice(value_span.clone()).trim_matches(':');
            return base64_simd::STANDARD
                .decode_to_vec(encoded)
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidBase64, value_span));
        }

        if parser.end_of_member()? {
            return Err(ParseError::new(
                ParseErrorKind::MissingLabel(label.to_owned()),
                parser.whole(),
            ));
        }
    }
}

#[cfg(test)]
mod test {
    use super::{parse_input, parse_signature};
    use crate::{params::ParseErrorKind, Algorithm, Component};
    use http::header::CONTENT_TYPE;

    #[test]
    fn input() {
        let (label, params) = parse_input(
            r#"sig1=("@method" "@path" "@query" "content-type");created=1618884475;keyid="test-key-rsa-pss";alg="rsa-v1_5-sha256";nonce="0123456789""#,
        )
        .unwrap();

        assert_eq!(label, "sig1");
        assert_eq!(params.key_id, "test-key-rsa-pss");
        assert_eq!(params.algorithm, Some(Algorithm::RsaSha256));
        assert_eq!(params.created, Some(1_618_884_475));
        assert_eq!(params.expires, None);
        assert_eq!(params.nonce.as_deref(), Some("0123456789"));
        assert_eq!(
            params.components,
            [
                Component::Method,
                Component::Path,
                Component::Query,
                Component::Header(CONTENT_TYPE)
            ]
        );
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let (_label, params) =
            parse_input(r#"sig-b21=("@authority");keyid="k1";tag="app-123""#).unwrap();
        assert_eq!(params.key_id, "k1");
    }

    #[test]
    fn bare_parameters_are_ignored() {
        let (_label, params) =
            parse_input(r#"sig1=("@method");keyid="k1";tag;created=1618884475"#).unwrap();
        assert_eq!(params.key_id, "k1");
        assert_eq!(params.created, Some(1_618_884_475));

        let (_label, params) = parse_input(r#"sig1=("@method");keyid="k1";tag"#).unwrap();
        assert_eq!(params.key_id, "k1");
    }

    #[test]
    fn bare_known_parameter() {
        let error = parse_input(r#"sig1=("@method");keyid"#).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::UnexpectedToken));
        assert_eq!(error.span.offset(), 17);
    }

    #[test]
    fn only_first_member() {
        let (label, _params) =
            parse_input(r#"sig1=("@method");keyid="k1", sig2=("@path");keyid="k2""#).unwrap();
        assert_eq!(label, "sig1");
    }

    #[test]
    fn missing_key_id() {
        let error = parse_input(r#"sig1=("@method");created=1"#).unwrap_err();
        assert!(matches!(
            error.kind,
            ParseErrorKind::MissingParameter("keyid")
        ));
    }

    #[test]
    fn negative_created() {
        let error = parse_input(r#"sig1=("@method");keyid="k1";created=-5"#).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::InvalidNumber));
    }

    #[test]
    fn unknown_component() {
        let error = parse_input(r#"sig1=("@status");keyid="k1""#).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::UnknownComponent(..)));
        assert_eq!(error.span.offset(), 6);
    }

    #[test]
    fn unterminated_list() {
        let error = parse_input(r#"sig1=("@method""#).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::UnexpectedEnd));
    }

    #[test]
    fn signature() {
        let signature = parse_signature("sig0=:AAAA:, sig1=:AAEC:;foo=1", "sig1").unwrap();
        assert_eq!(signature, [0, 1, 2]);
    }

    #[test]
    fn missing_label() {
        let error = parse_signature("sig0=:AAAA:", "sig1").unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::MissingLabel(..)));
    }
}
