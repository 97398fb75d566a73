//!
//! # Markup Serialization
//!
//! Templates, component parameters, mask descriptions and simulation exports
//! all travel through one of the text formats enumerated by [SerializationFormat].
//!

// Std-lib
use std::path::Path;
use std::str::FromStr;

// Crates.io
use serde::de::DeserializeOwned;
use serde::Serialize;
use textwrap::dedent;

/// # Supported Markup Formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    Json,
    Yaml,
    Toml,
}
impl SerializationFormat {
    /// Infer the format from the extension of path `fname`.
    pub fn from_extension(fname: impl AsRef<Path>) -> Result<Self, Error> {
        let ext = fname
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        ext.parse()
    }
    /// Serialize `data` to a string
    pub fn to_string(&self, data: &impl Serialize) -> Result<String, Error> {
        match *self {
            Self::Json => Ok(serde_json::to_string_pretty(data)?),
            Self::Yaml => Ok(serde_yaml::to_string(data)?),
            Self::Toml => Ok(toml::to_string(data)?),
        }
    }
    /// Parse string `s`. Leading indentation common to all lines is removed first,
    /// so that markup can be written inline in indented source.
    pub fn from_str<T: DeserializeOwned>(&self, s: &str) -> Result<T, Error> {
        let s = dedent(s);
        match *self {
            Self::Json => Ok(serde_json::from_str(&s)?),
            Self::Yaml => Ok(serde_yaml::from_str(&s)?),
            Self::Toml => Ok(toml::from_str(&s)?),
        }
    }
    /// Write `data` to file `fname`
    pub fn save(&self, data: &impl Serialize, fname: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(fname, self.to_string(data)?)?;
        Ok(())
    }
    /// Read a `T` from file `fname`. No dedenting is applied.
    pub fn open<T: DeserializeOwned>(&self, fname: impl AsRef<Path>) -> Result<T, Error> {
        let text = std::fs::read_to_string(fname)?;
        let rv = match *self {
            Self::Json => serde_json::from_str(&text)?,
            Self::Yaml => serde_yaml::from_str(&text)?,
            Self::Toml => toml::from_str(&text)?,
        };
        Ok(rv)
    }
}
impl FromStr for SerializationFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::msg(format!(
                "Invalid format: `{}`. Must be one of (json, yaml, toml).",
                s
            ))),
        }
    }
}

/// # Markup Files
///
/// Adds `save` and `open` in any [SerializationFormat] to serde types.
/// Every method has a default; implementations are empty.
pub trait SerdeFile: Serialize + DeserializeOwned {
    fn save(&self, fmt: SerializationFormat, fname: impl AsRef<Path>) -> Result<(), Error> {
        fmt.save(self, fname)
    }
    fn open(fname: impl AsRef<Path>, fmt: SerializationFormat) -> Result<Self, Error> {
        fmt.open(fname)
    }
}

/// Any failure to read, write, or (de)serialize markup
#[derive(Debug)]
pub struct Error(Box<dyn std::error::Error + Send + Sync>);
impl Error {
    pub fn msg(s: impl Into<String>) -> Self {
        Self(s.into().into())
    }
}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
impl std::error::Error for Error {}

/// Wrap each of the underlying error types
macro_rules! wrap_errors {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Error {
                fn from(e: $t) -> Self {
                    Self(Box::new(e))
                }
            }
        )*
    };
}
wrap_errors!(
    std::io::Error,
    serde_json::Error,
    serde_yaml::Error,
    toml::ser::Error,
    toml::de::Error
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stack {
        name: String,
        thickness: Vec<f64>,
    }
    impl SerdeFile for Stack {}

    #[test]
    fn parse_formats() {
        assert_eq!("json".parse::<SerializationFormat>().unwrap(), SerializationFormat::Json);
        assert_eq!("YML".parse::<SerializationFormat>().unwrap(), SerializationFormat::Yaml);
        assert_eq!("toml".parse::<SerializationFormat>().unwrap(), SerializationFormat::Toml);
        assert!("gds".parse::<SerializationFormat>().is_err());
        assert_eq!(
            SerializationFormat::from_extension("mask.yaml").unwrap(),
            SerializationFormat::Yaml
        );
        assert!(SerializationFormat::from_extension("mask").is_err());
    }
    #[test]
    fn dedented_yaml() {
        let s: Stack = SerializationFormat::Yaml
            .from_str(
                "
                name: soi
                thickness: [1.0, 0.22, 1.0]
                ",
            )
            .unwrap();
        assert_eq!(s.name, "soi");
        assert_eq!(s.thickness.len(), 3);
    }
    #[test]
    fn save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let stack = Stack {
            name: "sin".into(),
            thickness: vec![2.0, 0.4],
        };
        for fmt in [
            SerializationFormat::Json,
            SerializationFormat::Yaml,
            SerializationFormat::Toml,
        ] {
            let path = dir.path().join("stack.txt");
            stack.save(fmt, &path).unwrap();
            assert_eq!(Stack::open(&path, fmt).unwrap(), stack);
        }
    }
}
