use crate::{
    args::{ParseHeaderArgs, SignatureScheme},
    util::{error_kaomoji, success_kaomoji},
};
use http_signatures::{cavage, rfc9421, ParseError, SignatureParams};

fn with_source(error: ParseError, source: String) -> miette::Report {
    miette::Error::new(error).with_source_code(source)
}

fn parse(args: ParseHeaderArgs) -> miette::Result<SignatureParams> {
    match args.scheme {
        SignatureScheme::Cavage => {
            if args.signature.is_some() {
                miette::bail!(
                    "The Cavage scheme only uses a single header {}",
                    error_kaomoji()
                );
            }

            cavage::parse_header_value(&args.header)
                .map_err(|error| with_source(error, args.header))
        }
        SignatureScheme::Rfc9421 => {
            let (label, mut params) = rfc9421::parse_input(&args.header)
                .map_err(|error| with_source(error, args.header))?;

            if let Some(signature) = args.signature {
                params.signature = rfc9421::parse_signature(&signature, &label)
                    .map_err(|error| with_source(error, signature))?;
            }

            Ok(params)
        }
    }
}

pub fn do_it(args: ParseHeaderArgs) -> miette::Result<()> {
    let params = parse(args)?;

    println!("✅ Header is valid! {}", success_kaomoji());
    println!("key ID: {}", params.key_id);
    if let Some(algorithm) = params.algorithm {
        println!("algorithm: {algorithm}");
    }

    let components: Vec<_> = params
        .components
        .iter()
        .map(|component| component.as_str())
        .collect();
    println!("components: {}", components.join(" "));

    Ok(())
}
