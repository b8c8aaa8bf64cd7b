//! Output module
//!
//! Renders policy documents and writes them out without ever leaving a
//! partially written file behind.

pub mod writer;

pub use writer::PolicyWriter;

use crate::error::PolicyError;
use crate::policy::PolicyDocument;

/// Header prepended to generated policies
pub fn header(command: &str) -> String {
    format!(
        "# This file is generated by {command}.\n# Do not edit directly. Run \"make .policy.yml\" to update\n"
    )
}

/// Serialize a policy, optionally preceded by the generated-file header
pub fn render_document(doc: &PolicyDocument, command: Option<&str>) -> Result<String, PolicyError> {
    let body = doc.to_yaml()?;
    Ok(match command {
        Some(command) => format!("{}{}", header(command), body),
        None => body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ApprovalRule, FALLBACK_RULE_NAME};

    #[test]
    fn test_render_with_header() {
        let doc = PolicyDocument {
            approval_rules: vec![ApprovalRule::named(FALLBACK_RULE_NAME)],
            ..Default::default()
        };
        let rendered = render_document(&doc, Some("test-command")).unwrap();
        assert!(rendered.starts_with("# This file is generated by test-command.\n"));
        assert_eq!(PolicyDocument::from_yaml(&rendered).unwrap(), doc);
    }

    #[test]
    fn test_render_without_header() {
        let rendered = render_document(&PolicyDocument::default(), None).unwrap();
        assert!(!rendered.starts_with('#'));
    }
}
