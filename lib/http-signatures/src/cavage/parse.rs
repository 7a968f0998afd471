use crate::{
    params::{ParseError, ParseErrorKind},
    Algorithm, Component, SignatureParams,
};
use logos::{Lexer, Logos, Span};

#[derive(Debug, Logos)]
#[logos(skip r"[ \t]+")]
enum TokenTy {
    #[regex(r"[A-Za-z][A-Za-z0-9_\-]*")]
    Key,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#)]
    Value,

    #[regex(r"[0-9]+")]
    Number,

    #[token(",")]
    Comma,
}

#[derive(Debug)]
struct Token {
    pub ty: TokenTy,
    pub span: Span,
}

impl Token {
    pub fn parse(input: &str) -> impl Iterator<Item = Result<Token, Span>> + '_ {
        Lexer::<'_, TokenTy>::new(input)
            .spanned()
            .map(|(ty, span)| match ty {
                Ok(ty) => Ok(Token { ty, span }),
                Err(()) => Err(span),
            })
    }
}

macro_rules! ensure {
    ($self:expr, $value:expr, $pattern:pat) => {{
        let value = match $value {
            Some(Ok(value)) => value,
            Some(Err(span)) => {
                $self.is_broken = true;
                return Some(Err(ParseError::new(ParseErrorKind::UnexpectedToken, span)));
            }
            None => {
                $self.is_broken = true;
                let end = $self.input.len();
                return Some(Err(ParseError::new(ParseErrorKind::UnexpectedEnd, end..end)));
            }
        };

        if !matches!(value.ty, $pattern) {
            $self.is_broken = true;
            return Some(Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                value.span,
            )));
        }

        value
    }};
}

struct ParseIter<'a, I> {
    /// Stream of tokens wrapped into a result
    inner: I,

    /// Reference to the original input that was fed to the lexer
    input: &'a str,

    /// Marker whether we encountered any error or illegal token
    ///
    /// If we did, the iterator will stop yielding any results
    is_broken: bool,
}

impl<'a, I> Iterator for ParseIter<'a, I>
where
    I: Iterator<Item = Result<Token, Span>>,
{
    type Item = Result<(&'a str, &'a str, Span), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_broken {
            return None;
        }

        let first = self.inner.next()?;
        let key = ensure!(self, Some(first), TokenTy::Key);
        ensure!(self, self.inner.next(), TokenTy::Equals);
        let value = ensure!(self, self.inner.next(), TokenTy::Value | TokenTy::Number);

        if let Some(next) = self.inner.next() {
            ensure!(self, Some(next), TokenTy::Comma);
        }

        let span = key.span.start..value.span.end;
        let key = &self.input[key.span];
        let value = self.input[value.span].trim_matches('"');

        Some(Ok((key, value, span)))
    }
}

fn number(value: &str, span: Span) -> Result<u64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber, span))
}

/// Parse a cavage `Signature` header value
///
/// When the `headers` parameter is absent, the signature covers `(created)` only
#[inline]
pub fn parse(input: &str) -> Result<SignatureParams, ParseError> {
    let kv_iter = ParseIter {
        inner: Token::parse(input),
        input,
        is_broken: false,
    };

    let mut key_id = None;
    let mut algorithm = None;
    let mut signature = None;
    let mut components = None;
    let mut created = None;
    let mut expires = None;
    let mut nonce = None;

    for kv in kv_iter {
        let (key, value, span) = kv?;

        match key {
            "keyId" => key_id = Some(value.to_owned()),
            "algorithm" => {
                algorithm = Some(
                    Algorithm::parse(value).map_err(|error| ParseError::new(error, span))?,
                );
            }
            "signature" => {
                signature = Some(
                    base64_simd::STANDARD
                        .decode_to_vec(value)
                        .map_err(|_| ParseError::new(ParseErrorKind::InvalidBase64, span))?,
                );
            }
            "headers" => {
                components = Some(
                    value
                        .split_whitespace()
                        .map(Component::parse)
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|error| ParseError::new(error, span))?,
                );
            }
            "created" => created = Some(number(value, span)?),
            "expires" => expires = Some(number(value, span)?),
            "nonce" => nonce = Some(value.to_owned()),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::UnknownParameter(key.to_owned()),
                    span,
                ))
            }
        }
    }

    let whole = 0..input.len();
    let missing = |name| ParseError::new(ParseErrorKind::MissingParameter(name), whole.clone());

    let params = SignatureParams {
        key_id: key_id.ok_or_else(|| missing("keyId"))?,
        algorithm,
        created,
        expires,
        nonce,
        components: components.unwrap_or_else(|| vec![Component::Created]),
        signature: signature.ok_or_else(|| missing("signature"))?,
    };
    params
        .validate()
        .map_err(|error| ParseError::new(error, whole.clone()))?;

    Ok(params)
}

#[cfg(test)]
mod test {
    use super::parse;
    use crate::{params::ParseErrorKind, Algorithm, Component};
    use http::header::{DATE, HOST};

    const HEADER: &str = r#"keyId="Test",algorithm="rsa-sha256",headers="(request-target) host date",signature="qdx+H7PHHDZgy4y/Ahn9Tny9V3GP6YgBPyUXMmoxWtLbHpUnXS2mg2+SbrQDMCJypxBLSPQR2aAjn7ndmw2iicw3HMbe8VfEdKFYRqzic+efkb3nndiv/x1xSHDJWeSWkx3ButlYSuBskLu6kd9Fswtemr3lgdDEmn04swr2Os0=""#;

    #[test]
    fn parse_header() {
        let header = parse(HEADER).unwrap();

        assert_eq!(header.created, None);
        assert_eq!(header.expires, None);
        assert_eq!(header.key_id, "Test");
        assert_eq!(header.algorithm, Some(Algorithm::RsaSha256));
        assert_eq!(header.signature.len(), 128);
        assert_eq!(
            header.components,
            [
                Component::RequestTarget,
                Component::Header(HOST),
                Component::Header(DATE)
            ]
        );
    }

    #[test]
    fn bare_numbers_and_whitespace() {
        let header = parse(
            r#"keyId="Test", created=1402170695, expires=1402170699, headers="(created) (expires)", signature="""#,
        )
        .unwrap();

        assert_eq!(header.created, Some(1_402_170_695));
        assert_eq!(header.expires, Some(1_402_170_699));
        assert!(header.signature.is_empty());
    }

    #[test]
    fn default_components() {
        let header = parse(r#"keyId="Test",signature="AAAA""#).unwrap();
        assert_eq!(header.components, [Component::Created]);
    }

    #[test]
    fn missing_key_id() {
        let error = parse(r#"signature="AAAA""#).unwrap_err();
        assert!(matches!(
            error.kind,
            ParseErrorKind::MissingParameter("keyId")
        ));
    }

    #[test]
    fn truncated() {
        let error = parse(r#"keyId="Test",signature="#).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::UnexpectedEnd));
    }

    #[test]
    fn unknown_parameter() {
        let error = parse(r#"keyId="Test",colour="blue",signature="AAAA""#).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::UnknownParameter(..)));
        assert_eq!(error.span.offset(), 13);
    }

    #[test]
    fn expires_before_created() {
        let error =
            parse(r#"keyId="Test",created=10,expires=5,signature="AAAA""#).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::InvalidParameters(..)));
    }
}
