use std::io;
use std::process;

use log::warn;

use ampify::{default_converters, ConversionPolicy, Converter, AMP_ALLOWLIST};

fn main() {
    env_logger::init();

    let policy = ConversionPolicy {
        add_noscript_fallback: true,
        ..Default::default()
    };
    let converter = Converter::new(&policy, default_converters(), &AMP_ALLOWLIST);
    match converter.convert_fragment(&mut io::stdin(), &mut io::stdout()) {
        Ok(conversion) => {
            for reported in &conversion.errors {
                warn!(
                    "{:?} on {} ({})",
                    reported.error.kind,
                    reported.error.node_name,
                    if reported.sanitized { "removed" } else { "kept" }
                );
            }
        }
        Err(error) => {
            eprintln!("ampify: {}", error);
            process::exit(1);
        }
    }
}
