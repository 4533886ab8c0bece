//! Segment URL templates.

/// Placeholder substituted with the decimal segment id.
pub const DEFAULT_PLACEHOLDER: &str = "{seg}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("segment url template {template:?} does not contain placeholder {placeholder:?}")]
    MissingPlaceholder {
        template: String,
        placeholder: String,
    },
    #[error("segment url placeholder must not be empty")]
    EmptyPlaceholder,
}

/// A URL containing a placeholder for the segment id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentUrl {
    template: String,
    placeholder: String,
}

impl SegmentUrl {
    /// Template using [`DEFAULT_PLACEHOLDER`].
    pub fn new(template: impl Into<String>) -> Result<Self, TemplateError> {
        Self::with_placeholder(template, DEFAULT_PLACEHOLDER)
    }

    pub fn with_placeholder(
        template: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        let template = template.into();
        let placeholder = placeholder.into();
        if placeholder.is_empty() {
            return Err(TemplateError::EmptyPlaceholder);
        }
        if !template.contains(&placeholder) {
            return Err(TemplateError::MissingPlaceholder {
                template,
                placeholder,
            });
        }
        Ok(Self {
            template,
            placeholder,
        })
    }

    /// URL for segment `id`; every occurrence of the placeholder is replaced.
    pub fn for_id(&self, id: u64) -> String {
        self.template.replace(&self.placeholder, &id.to_string())
    }
}

impl std::fmt::Display for SegmentUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_every_occurrence() {
        let t = SegmentUrl::new("https://cdn.example.com/{seg}/seg-{seg}-v1-a1.ts").unwrap();
        assert_eq!(
            t.for_id(17),
            "https://cdn.example.com/17/seg-17-v1-a1.ts"
        );
    }

    #[test]
    fn custom_placeholder() {
        let t = SegmentUrl::with_placeholder("https://x/part_$N.ts", "$N").unwrap();
        assert_eq!(t.for_id(0), "https://x/part_0.ts");
    }

    #[test]
    fn missing_placeholder_rejected() {
        let err = SegmentUrl::new("https://x/video.mp4").unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder { .. }));
        assert_eq!(
            SegmentUrl::with_placeholder("https://x/{seg}", "").unwrap_err(),
            TemplateError::EmptyPlaceholder
        );
    }
}
