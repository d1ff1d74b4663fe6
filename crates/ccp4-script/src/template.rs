//! `{{NAME}}` placeholder substitution.

use std::collections::BTreeMap;

use ccp4_core::errors::{Ccp4Error, ErrorInfo};

/// Values substituted into a template, keyed by placeholder name.
pub type TemplateValues = BTreeMap<String, String>;

/// Replaces every `{{NAME}}` in `template` with `values[NAME]`.
///
/// A placeholder without a value, or an unterminated `{{`, is an error;
/// nothing is ever left unsubstituted in the output.
pub fn render(template: &str, values: &TemplateValues) -> Result<String, Ccp4Error> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or_else(|| {
            Ccp4Error::Template(
                ErrorInfo::new("ccp4_script.unterminated", "unterminated placeholder")
                    .with_context("at", after.chars().take(24).collect::<String>()),
            )
        })?;
        let name = after[..close].trim();
        let value = values.get(name).ok_or_else(|| {
            Ccp4Error::Template(
                ErrorInfo::new(
                    "ccp4_script.missing_value",
                    format!("no value for placeholder {name}"),
                )
                .with_context("placeholder", name),
            )
        })?;
        out.push_str(value);
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Convenience for building [`TemplateValues`] from literal pairs.
pub fn values<K, V, I>(pairs: I) -> TemplateValues
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}
