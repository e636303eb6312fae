use std::fmt::{Display, Formatter, Result};

use core_types::{AccessScope, DraftMetadata};

pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_TAG_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    TitleMissing,
    TitleTooLong { max: usize },
    DescriptionTooLong { max: usize },
    EmptyTag,
    TagTooLong { max: usize },
    RestrictedScopeWithoutOrganizations,
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ValidationIssue::TitleMissing => write!(f, "Title is required"),
            ValidationIssue::TitleTooLong { max } => {
                write!(f, "Title is longer than {} characters", max)
            }
            ValidationIssue::DescriptionTooLong { max } => {
                write!(f, "Description is longer than {} characters", max)
            }
            ValidationIssue::EmptyTag => write!(f, "Tags must not be empty"),
            ValidationIssue::TagTooLong { max } => {
                write!(f, "Tag is longer than {} characters", max)
            }
            ValidationIssue::RestrictedScopeWithoutOrganizations => {
                write!(f, "Restricted access requires at least one organization")
            }
        }
    }
}

/// Pure rule checks on a draft. No side effects; callers decide what a
/// non-empty result blocks.
pub fn validate_draft(draft: &DraftMetadata) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let title = draft.title.trim();
    if title.is_empty() {
        issues.push(ValidationIssue::TitleMissing);
    } else if title.chars().count() > MAX_TITLE_LEN {
        issues.push(ValidationIssue::TitleTooLong { max: MAX_TITLE_LEN });
    }

    if draft.description.chars().count() > MAX_DESCRIPTION_LEN {
        issues.push(ValidationIssue::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
        });
    }

    for tag in &draft.tags {
        if tag.trim().is_empty() {
            issues.push(ValidationIssue::EmptyTag);
        } else if tag.chars().count() > MAX_TAG_LEN {
            issues.push(ValidationIssue::TagTooLong { max: MAX_TAG_LEN });
        }
    }

    if draft.access_scope == AccessScope::Restricted && draft.organization_ids.is_empty() {
        issues.push(ValidationIssue::RestrictedScopeWithoutOrganizations);
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> DraftMetadata {
        DraftMetadata {
            title: "Launch briefing".to_string(),
            description: "Quarterly launch walkthrough".to_string(),
            tags: vec!["launch".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_draft_has_no_issues() {
        assert!(validate_draft(&valid_draft()).is_empty());
    }

    #[test]
    fn test_missing_title_is_reported() {
        let draft = DraftMetadata {
            title: "   ".to_string(),
            ..valid_draft()
        };
        assert_eq!(validate_draft(&draft), vec![ValidationIssue::TitleMissing]);
    }

    #[test]
    fn test_overlong_title_is_reported() {
        let draft = DraftMetadata {
            title: "x".repeat(MAX_TITLE_LEN + 1),
            ..valid_draft()
        };
        assert_eq!(
            validate_draft(&draft),
            vec![ValidationIssue::TitleTooLong { max: MAX_TITLE_LEN }]
        );
    }

    #[test]
    fn test_empty_tag_is_reported() {
        let draft = DraftMetadata {
            tags: vec!["ok".to_string(), "".to_string()],
            ..valid_draft()
        };
        assert_eq!(validate_draft(&draft), vec![ValidationIssue::EmptyTag]);
    }

    #[test]
    fn test_restricted_scope_requires_organizations() {
        let draft = DraftMetadata {
            access_scope: AccessScope::Restricted,
            organization_ids: vec![],
            ..valid_draft()
        };
        assert_eq!(
            validate_draft(&draft),
            vec![ValidationIssue::RestrictedScopeWithoutOrganizations]
        );

        let draft = DraftMetadata {
            access_scope: AccessScope::Restricted,
            organization_ids: vec!["org1".to_string()],
            ..valid_draft()
        };
        assert!(validate_draft(&draft).is_empty());
    }
}
