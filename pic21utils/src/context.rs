/// Enumerated conversion contexts.
/// Pushed and popped by exporters, and reported with their errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorContext {
    Library(String),
    Cell(String),
    Instance(String),
    Component(String),
    Layer(i16, i16),
    Geometry,
    Simulation,
    Units,
    Unknown,
}
impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Library(s) => write!(f, "library `{}`", s),
            Self::Cell(s) => write!(f, "cell `{}`", s),
            Self::Instance(s) => write!(f, "instance `{}`", s),
            Self::Component(s) => write!(f, "component `{}`", s),
            Self::Layer(l, d) => write!(f, "layer ({}, {})", l, d),
            Self::Geometry => write!(f, "geometry"),
            Self::Simulation => write!(f, "simulation"),
            Self::Units => write!(f, "units"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
