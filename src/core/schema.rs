use crate::config::AnnotationConfig;

/// A rating category with its labels rendered as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Category {
    pub(crate) title: String,
    pub(crate) labels: Vec<String>,
}

impl Category {
    pub(crate) fn label_index(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.labels.iter().position(|l| l == label)
    }

    pub(crate) fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }
}

/// What a session may record: the findings and categories of the active config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AnnotationSchema {
    pub(crate) findings: Vec<String>,
    pub(crate) categories: Vec<Category>,
    pub(crate) tristate: bool,
}

impl AnnotationSchema {
    pub(crate) fn from_config(config: &AnnotationConfig) -> Self {
        Self {
            findings: config.checkboxes.clone(),
            categories: config
                .rating_groups()
                .map(|group| Category {
                    title: group.title.clone(),
                    labels: group.labels.iter().map(ToString::to_string).collect(),
                })
                .collect(),
            tristate: config.tristate_checkboxes,
        }
    }

    pub(crate) fn has_finding(&self, name: &str) -> bool {
        self.findings.iter().any(|f| f == name)
    }

    pub(crate) fn category(&self, title: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.title == title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Label, RatingGroup};

    #[test]
    fn schema_flattens_both_pages() {
        let config = AnnotationConfig {
            checkboxes: vec!["Motion".to_string()],
            radiobuttons_page1: vec![RatingGroup {
                title: "Overall".to_string(),
                labels: vec![Label::Number(1), Label::Number(2)],
            }],
            radiobuttons_page2: vec![RatingGroup {
                title: "Noise".to_string(),
                labels: vec![Label::Text("low".to_string()), Label::Text("high".to_string())],
            }],
            ..AnnotationConfig::default()
        };
        let schema = AnnotationSchema::from_config(&config);
        assert!(schema.has_finding("Motion"));
        assert!(!schema.has_finding("motion"));
        assert_eq!(schema.categories.len(), 2);
        let noise = schema.category("Noise").unwrap();
        assert_eq!(noise.label_index("high"), Some(1));
        assert_eq!(noise.label(0), Some("low"));
        assert_eq!(schema.category("Overall").unwrap().label_index(" 2 "), Some(1));
    }
}
