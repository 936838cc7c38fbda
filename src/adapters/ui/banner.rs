//! Startup banner: app title plus the context every estimate depends on.

use crate::domain::LocationCatalog;
use crossterm::style::Stylize;
use figlet_rs::FIGfont;

fn title_art() -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("PROP-VALUATOR").map(|figure| figure.to_string()))
        .unwrap_or_else(|| "PROP-VALUATOR\n".to_string())
}

/// Lines under the title: version, currency, dataset.
fn context_lines(currency: &str, catalog: &LocationCatalog) -> Vec<String> {
    let mut lines = vec![
        format!(
            "v{}  ·  property price estimates for Tunisia",
            env!("CARGO_PKG_VERSION")
        ),
        format!(
            "Amounts in {}  ·  location dataset {} ({} governorates)",
            currency,
            catalog.version(),
            catalog.len()
        ),
    ];
    if catalog.has_placeholder_region_codes() {
        lines.push("Region codes are placeholders: set PROPVAL_CATALOG_PATH for real estimates".into());
    }
    lines
}

pub fn print_welcome(currency: &str, catalog: &LocationCatalog) {
    print!("{}", title_art().cyan().bold());
    for (i, line) in context_lines(currency, catalog).into_iter().enumerate() {
        match i {
            0 => println!("{}", line.dim()),
            1 => println!("{}", line),
            _ => println!("{}", line.yellow()),
        }
    }
    println!();
}
