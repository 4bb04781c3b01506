use crate::error::MetricsError;

/// Prometheus client default buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Naming and labels for a counter or gauge family.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub desc: String,
    /// Label names; every `with_labels` call must supply one value per tag.
    pub tags: Vec<String>,
}

impl Options {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// `namespace_subsystem_name`, skipping empty parts.
    pub fn full_name(&self) -> String {
        [
            self.namespace.as_str(),
            self.subsystem.as_str(),
            self.name.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
    }

    pub(crate) fn validate(&self) -> Result<String, MetricsError> {
        let full = self.full_name();
        if !is_valid_metric_name(&full) {
            return Err(MetricsError::InvalidName(full));
        }
        if let Some(bad) = self.tags.iter().find(|t| !is_valid_label_name(t)) {
            return Err(MetricsError::InvalidName(format!("{full}{{{bad}}}")));
        }
        Ok(full)
    }
}

/// [`Options`] plus bucket boundaries. Empty `buckets` means [`DEFAULT_BUCKETS`].
#[derive(Debug, Clone, Default)]
pub struct HistogramOptions {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub desc: String,
    pub tags: Vec<String>,
    pub buckets: Vec<f64>,
}

impl HistogramOptions {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = buckets;
        self
    }

    pub(crate) fn split(self) -> (Options, Vec<f64>) {
        let buckets = if self.buckets.is_empty() {
            DEFAULT_BUCKETS.to_vec()
        } else {
            self.buckets
        };
        let opts = Options {
            namespace: self.namespace,
            subsystem: self.subsystem,
            name: self.name,
            desc: self.desc,
            tags: self.tags,
        };
        (opts, buckets)
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_skips_empty_parts() {
        assert_eq!(Options::new("c", "d").namespace("a").subsystem("b").full_name(), "a_b_c");
        assert_eq!(Options::new("c", "d").subsystem("b").full_name(), "b_c");
        assert_eq!(Options::new("c", "d").full_name(), "c");
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(Options::new("", "d").validate().is_err());
        assert!(Options::new("9lives", "d").validate().is_err());
        assert!(Options::new("ok", "d").tags(["bad-label"]).validate().is_err());
        assert_eq!(Options::new("ok", "d").tags(["store"]).validate().unwrap(), "ok");
    }

    #[test]
    fn test_histogram_defaults_buckets() {
        let (opts, buckets) = HistogramOptions::new("lat", "d").namespace("x").split();
        assert_eq!(opts.full_name(), "x_lat");
        assert_eq!(buckets, DEFAULT_BUCKETS.to_vec());
    }
}
