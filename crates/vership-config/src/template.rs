//! `{{placeholder}}` rendering for messages, tag names and titles.

/// Values available to templates.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// Substituted for `{{version}}`.
    pub version: &'a str,
    /// Substituted for `{{name}}`.
    pub name: &'a str,
}

/// Replaces every `{{version}}` and `{{name}}` placeholder.
///
/// Unknown placeholders are left untouched.
#[must_use]
pub fn render(template: &str, vars: TemplateVars<'_>) -> String {
    template
        .replace("{{version}}", vars.version)
        .replace("{{name}}", vars.name)
}
