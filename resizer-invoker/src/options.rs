//! Delegate options and command-line construction

use std::fmt;

/// Optional flags understood by the delegate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionName {
    MaxWidth,
    MaxHeight,
    Format,
    ResizeStrategy,
    JpegCompression,
    PngCompression,
    S3ReadMethod,
}

impl OptionName {
    /// All options, in the order their flags are emitted
    pub const ALL: [OptionName; 7] = [
        Self::MaxWidth,
        Self::MaxHeight,
        Self::Format,
        Self::ResizeStrategy,
        Self::JpegCompression,
        Self::PngCompression,
        Self::S3ReadMethod,
    ];

    pub fn as_flag(self) -> &'static str {
        match self {
            Self::MaxWidth => "max-width",
            Self::MaxHeight => "max-height",
            Self::Format => "format",
            Self::ResizeStrategy => "resize-strategy",
            Self::JpegCompression => "jpeg-compression",
            Self::PngCompression => "png-compression",
            Self::S3ReadMethod => "s3-read-method",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A single option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Number(u64),
    Text(String),
}

impl OptionValue {
    /// Zero and the empty string count as unset
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for OptionValue {
    fn from(n: u32) -> Self {
        Self::Number(u64::from(n))
    }
}

impl From<u64> for OptionValue {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Optional transformation parameters forwarded to the delegate.
///
/// Holds at most one value per [`OptionName`]. Setting a name twice keeps the
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    values: [Option<OptionValue>; 7],
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: OptionName, value: Option<impl Into<OptionValue>>) {
        self.values[name.index()] = value.map(Into::into);
    }

    /// Builder form of [`OptionSet::set`]
    #[must_use]
    pub fn with(mut self, name: OptionName, value: impl Into<OptionValue>) -> Self {
        self.set(name, Some(value));
        self
    }

    pub fn get(&self, name: OptionName) -> Option<&OptionValue> {
        self.values[name.index()].as_ref()
    }

    /// Present, truthy options in flag order
    pub fn flags(&self) -> impl Iterator<Item = (OptionName, &OptionValue)> + '_ {
        OptionName::ALL.into_iter().filter_map(move |name| {
            self.get(name)
                .filter(|value| value.is_truthy())
                .map(|value| (name, value))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.flags().next().is_none()
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.flags().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name.as_flag(), value)?;
        }
        f.write_str("}")
    }
}

/// Build the delegate's argument list.
///
/// Bucket and key always come first, followed by one `--<flag>=<value>` per
/// truthy option.
pub fn build_args(bucket: &str, key: &str, options: &OptionSet) -> Vec<String> {
    let mut args = vec![format!("--s3-bucket={bucket}"), format!("--s3-key={key}")];

    args.extend(
        options
            .flags()
            .map(|(name, value)| format!("--{}={}", name.as_flag(), value)),
    );

    args
}
