//! `shopbot stores`: list the configured store profiles.

use std::fmt::Write as _;

use shopbot_core::{PriceRule, SiteRegistry};

pub(crate) fn print_stores(registry: &SiteRegistry) {
    print!("{}", render_stores(registry));
}

pub(crate) fn render_stores(registry: &SiteRegistry) -> String {
    let mut out = String::new();
    for profile in registry.profiles() {
        let units = match profile.price_rule {
            PriceRule::MinorUnits { .. } => "minor",
            PriceRule::MajorUnits { .. } => "major",
        };
        let _ = writeln!(
            out,
            "{:<12} {:<14} {:<6} {}",
            profile.store_id.as_str(), profile.display_name, units, profile.base_url
        );
    }
    out
}
