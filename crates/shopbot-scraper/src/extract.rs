//! Pure text-to-field conversions: price text, product names and product URLs.
//!
//! Nothing here touches a browser. The orchestrator feeds in whatever text the
//! page produced and gets back a [`FieldValue`]; every malformed input becomes
//! `Unavailable` rather than an error.

use std::str::FromStr;

use rust_decimal::Decimal;
use shopbot_core::{FieldValue, PriceRule, SiteProfile, UrlRewrite};

/// Converts raw price text into a decimal amount using the store's rule.
///
/// Only the first non-empty line is considered; promotional text underneath
/// (`"R1999\nper unit"`) is ignored.
///
/// - [`PriceRule::MinorUnits`]: every digit on the line, read as cents.
///   `"R1999"` → `19.99`.
/// - [`PriceRule::MajorUnits`]: the amount after the last currency token,
///   with whitespace and thousands separators removed. `"R 1,299.50"` → `1299.50`.
///
/// The result is rounded to two decimals so that [`PriceRule::render`] reads
/// back to the same value.
#[must_use]
pub fn extract_price(raw_text: &str, rule: &PriceRule) -> FieldValue<Decimal> {
    let line = first_line(raw_text);
    let amount = match rule {
        PriceRule::MinorUnits { currency } => parse_minor_units(line, currency),
        PriceRule::MajorUnits { currency } => parse_major_units(line, currency),
    };
    amount
        .filter(|value| !value.is_sign_negative())
        .map(|value| value.round_dp(2))
        .into()
}

fn first_line(raw: &str) -> &str {
    raw.trim_start().lines().next().unwrap_or("").trim()
}

fn parse_minor_units(line: &str, currency: &str) -> Option<Decimal> {
    let digits: String = line
        .replace(currency, "")
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    let cents = i64::from_str(&digits).ok()?;
    Some(Decimal::new(cents, 2))
}

fn parse_major_units(line: &str, currency: &str) -> Option<Decimal> {
    let tail = line
        .rfind(currency)
        .map_or(line, |idx| &line[idx + currency.len()..]);
    let cleaned: String = tail
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Derives a product name from the page title, falling back to the text of
/// the store's name element.
///
/// The title candidate is the part before the first `separator`. It is
/// rejected when empty or when it merely echoes the page URL, which some
/// stores do before the product page has finished rendering. The chosen
/// text is title-cased; an empty result is `Unavailable`.
#[must_use]
pub fn extract_name(
    title: &str,
    fallback_text: &str,
    current_url: &str,
    separator: &str,
) -> FieldValue<String> {
    let from_title = title.split(separator).next().unwrap_or("").trim();
    let chosen = if from_title.is_empty() || echoes_url(from_title, current_url) {
        first_line(fallback_text)
    } else {
        from_title
    };
    if chosen.is_empty() {
        FieldValue::Unavailable
    } else {
        FieldValue::Present(title_case(chosen))
    }
}

fn echoes_url(candidate: &str, url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    let candidate = candidate.to_lowercase();
    let url = url.to_lowercase();
    if url.contains(&candidate) {
        return true;
    }
    let path = url_path(&url).trim_matches('/');
    !path.is_empty() && candidate.contains(path)
}

/// Path component of `url`, without query string or fragment.
fn url_path(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = after_scheme
        .find('/')
        .map_or("", |idx| &after_scheme[idx..]);
    path.split(['?', '#']).next().unwrap_or("")
}

/// Upper-cases the first letter of every run of letters and lower-cases the
/// rest, so `"JUNGLE oats 1kg"` becomes `"Jungle Oats 1Kg"`.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Canonicalises the product page URL according to the profile's rewrite rule.
///
/// With [`UrlRewrite::ProductPath`], everything from the last occurrence of
/// the marker onward is kept (minus query string and fragment) and re-rooted
/// on the store's base URL. URLs without the marker are returned unchanged.
#[must_use]
pub fn rewrite_url(current_url: &str, profile: &SiteProfile) -> String {
    match &profile.url_rewrite {
        UrlRewrite::Unchanged => current_url.to_string(),
        UrlRewrite::ProductPath { marker } => match current_url.rfind(marker.as_str()) {
            Some(idx) => {
                let tail = &current_url[idx + marker.len()..];
                let tail = tail.split(['?', '#']).next().unwrap_or("");
                format!(
                    "{}{}{}",
                    profile.base_url.trim_end_matches('/'),
                    marker,
                    tail
                )
            }
            None => current_url.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
