//! CloudFormation dynamic references
//!
//! `{{resolve:ssm:/path}}` and friends use the same delimiters as template
//! output tags. CloudFormation resolves them at deploy time, so they must pass
//! through rendering untouched. Only the opening delimiter needs escaping: the
//! closing `}}` is plain text outside a tag, and template tags inside the
//! reference (`{{resolve:ssm:/{{ env }}/db}}`) still render.

use std::borrow::Cow;

const OPENING: &str = "{{resolve:";
const ESCAPED_OPENING: &str = "{{ '{{resolve:' }}";

/// Turn the opening of every dynamic reference into a string literal tag
///
/// No newlines are inserted, so line numbers of template errors still match
/// the original document.
pub fn protect(source: &str) -> Cow<'_, str> {
    if source.contains(OPENING) {
        Cow::Owned(source.replace(OPENING, ESCAPED_OPENING))
    } else {
        Cow::Borrowed(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reference_openings() {
        assert_eq!(
            protect("Pw: '{{resolve:ssm:/db/password}}'"),
            "Pw: '{{ '{{resolve:' }}ssm:/db/password}}'"
        );
    }

    #[test]
    fn leaves_other_text_borrowed() {
        let source = "Name: {{ var.env }}\nSub: !Sub '${AWS::StackName}'\n";
        assert!(matches!(protect(source), Cow::Borrowed(_)));
    }

    #[test]
    fn spaced_tags_are_template_output() {
        assert!(matches!(protect("{{ resolve }}"), Cow::Borrowed(_)));
    }
}
